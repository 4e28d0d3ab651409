//! Form validation. A [`Validator`] collects the errors of one form submission
//! and is held by each form struct as a named field.
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

/// The outcome of validating a single form submission.
#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Validator {
    /// Errors tied to a specific field, keyed by field name. Only the first
    /// error for each field is kept.
    pub field_errors: BTreeMap<String, String>,
    /// Errors about the submission as a whole.
    pub non_field_errors: Vec<String>,
}

impl Validator {
    /// Whether no errors have been recorded.
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Record an error for `key` unless one is already present.
    pub fn add_field_error(&mut self, key: &str, message: &str) {
        self.field_errors
            .entry(key.to_owned())
            .or_insert_with(|| message.to_owned());
    }

    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_owned());
    }

    /// Record an error for `key` if `ok` is false.
    pub fn check_field(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_field_error(key, message);
        }
    }
}

/// True if the value contains something other than whitespace.
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True if the value has at most `n` characters.
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// True if the value has at least `n` characters.
pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

/// True if the value is one of the permitted values.
pub fn permitted<T: PartialEq>(value: &T, permitted_values: &[T]) -> bool {
    permitted_values.contains(value)
}

pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::email::EMAIL_REGEX;

    #[test]
    fn first_error_per_field_wins() {
        let mut validator = Validator::default();
        validator.check_field(false, "title", "must not be blank");
        validator.check_field(false, "title", "too long");
        validator.check_field(true, "content", "never recorded");
        assert!(!validator.valid());
        assert_eq!(validator.field_errors.len(), 1);
        assert_eq!(validator.field_errors["title"], "must not be blank");
    }

    #[test]
    fn non_field_errors_invalidate() {
        let mut validator = Validator::default();
        assert!(validator.valid());
        validator.add_non_field_error("Email or password is incorrect");
        assert!(!validator.valid());
    }

    #[test]
    fn checks() {
        assert!(!not_blank("  \t"));
        assert!(not_blank(" x "));
        assert!(max_chars("héllo", 5));
        assert!(!max_chars("héllo!", 5));
        assert!(min_chars("12345678", 8));
        assert!(!min_chars("1234567", 8));
        assert!(permitted(&7, &[1, 7, 365]));
        assert!(!permitted(&30, &[1, 7, 365]));
        assert!(matches("a@b.com", &EMAIL_REGEX));
        assert!(!matches("a@", &EMAIL_REGEX));
    }
}
