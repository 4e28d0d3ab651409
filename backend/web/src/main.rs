use snippetbox_web::{
    constants::api::ADDR,
    db,
    middleware::recover::install_panic_hook,
    routes,
    services::{
        sessions::store::Connection,
        snippets::PgSnippetStore,
        users::PgUserStore,
    },
    state::AppState,
    templates::Templates,
};
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    install_panic_hook();

    let db_conn = db::connect()
        .await
        .expect("Failed to connect to the database");
    let session_store = Connection::connect()
        .await
        .expect("Failed to connect to the session store");
    let templates = Templates::new().expect("Failed to parse templates");

    let state = AppState {
        snippets: Arc::new(PgSnippetStore::new(db_conn.clone())),
        users: Arc::new(PgUserStore::new(db_conn)),
        session_store: Arc::new(session_store),
        templates: Arc::new(templates),
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(ADDR.as_str())
        .await
        .expect("Failed to bind listener");
    tracing::info!(addr = %*ADDR, "Starting server");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to init Axum service");
}
