use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use tokio::net::TcpListener;

use devevent_server::assets::HttpAssetStore;
use devevent_server::config::Config;
use devevent_server::db::{ConnectionCache, PgConnector};
use devevent_server::routes::create_routes;
use devevent_server::state::AppState;
use devevent_server::store::PgEventStore;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("Configuration is incomplete");

    // The database connection itself is established lazily, on the first
    // request that needs it.
    let cache = ConnectionCache::new(PgConnector::new(&config));
    let store = PgEventStore::new(cache, config.query_timeout);
    let assets = HttpAssetStore::new(&config).expect("Failed to build asset host client");

    let state = AppState {
        store: Arc::new(store),
        assets: Arc::new(assets),
    };
    let app: Router = create_routes(state);

    let addr = config.bind_addr;
    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
