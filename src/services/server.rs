use anyhow::Result;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::handlers::AppState;
use crate::api::routes::create_router;
use crate::config::settings::AppConfig;
use crate::fetchers::tmdb::TmdbClient;
use crate::services::state::EngineState;

pub struct ServerService {
    port: u16,
    config: AppConfig,
}

impl ServerService {
    pub fn new(port: u16, config: AppConfig) -> Self {
        Self { port, config }
    }

    pub async fn run(&self) -> Result<()> {
        let engine = EngineState::load(self.config.clone())?;
        info!(
            "Engine loaded: {} rated movies, {} recorded matches (source: {})",
            engine.store.len(),
            engine.store.history().len(),
            engine.source.as_ref().map(|s| s.as_str()).unwrap_or("none")
        );

        let tmdb = TmdbClient::new(&self.config.tmdb)?;
        if tmdb.is_none() {
            info!("No TMDb API key configured; poster lookups disabled");
        }
        let state = Arc::new(AppState::new(engine, tmdb));

        // The dashboard is a local static page; permissive CORS is fine
        let app = create_router(state).layer(CorsLayer::permissive());

        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));
        info!("Server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
