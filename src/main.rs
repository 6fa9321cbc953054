use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use pvpdex_backend::api::{self, AppState};
use pvpdex_backend::config::Config;
use pvpdex_backend::gamedata::{self, GameMaster};
use pvpdex_backend::metrics;
use pvpdex_backend::pvp::RankingIndex;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    metrics::register_metrics();

    let config = Config::load();

    let GameMaster {
        catalog,
        mut levels,
    } = GameMaster::load(&config.master_path());
    if levels.is_empty() {
        match gamedata::load_multiplier_list(&config.multipliers_path()) {
            Ok(table) => levels = table,
            Err(e) => tracing::warn!("no CP multipliers available, PVP features disabled: {e}"),
        }
    }
    let rankings = RankingIndex::load(&config.data_dir);

    let state = AppState::new(Arc::new(levels), Arc::new(rankings), Arc::new(catalog));

    let mut app = api::router(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CorsLayer::permissive());
    if let Some(static_dir) = &config.static_dir {
        tracing::info!("serving frontend from {}", static_dir.display());
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("PvPDex backend listening on port {}", config.port);
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
