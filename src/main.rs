mod config;
mod error;
mod routes;
mod state;
mod storage;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env().expect("invalid configuration");
    let store = storage::build_store(&config);
    tracing::info!(storage_mode = store.mode().as_str(), "storage backend selected");

    let state = state::AppState::new(store);
    let app = routes::app(state, config.cors_origin.clone());
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, "uiforge listening");
    axum::serve(listener, app).await.expect("server failed");
}
