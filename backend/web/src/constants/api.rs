//! Constants related to the general configuration of the web server and its deployment.

use core::time::Duration;
use std::{env::var, sync::LazyLock};

/// The network address the HTTP server listens on.
pub static ADDR: LazyLock<String> =
    LazyLock::new(|| var("ADDR").unwrap_or_else(|_| String::from("0.0.0.0:4000")));

/// The number of snippets listed on the home page.
pub const LATEST_SNIPPETS_LIMIT: usize = 10;

/// How long a request may take, body included, before it is answered with a 408.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
