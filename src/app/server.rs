// HTTP API surface assembly for the monitor application.

use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::controller;
use crate::http::{Controller, Server};
use crate::registry::Registry;

/// API server wrapper that composes all controllers.
pub struct ApiServer {
    server: Arc<dyn Server>,
}

impl ApiServer {
    pub fn new(
        ctx: CancellationToken,
        cfg: Config,
        registry: Arc<dyn Registry>,
    ) -> Result<Self> {
        let server = crate::http::HttpServer::new(ctx, cfg.clone(), controllers(cfg, registry))?;
        Ok(Self { server })
    }

    /// Starts the HTTP server (blocking call).
    pub async fn listen_and_serve(&self) -> Result<()> {
        self.server.listen_and_serve().await
    }
}

/// Returns all HTTP controllers for the server.
fn controllers(cfg: Config, registry: Arc<dyn Registry>) -> Vec<Box<dyn Controller>> {
    vec![
        // Registration intake (register + deregister)
        Box::new(controller::RegisterController::new(
            cfg.clone(),
            registry.clone(),
        )),
        // Status queries (all + by name)
        Box::new(controller::HealthController::new(registry)),
        // Encodes and shows current config as json
        Box::new(controller::ShowConfigController::new(cfg)),
    ]
}

/// Builds the bare API router. Used directly by controller tests.
#[allow(dead_code)]
pub fn build_router(cfg: Config, registry: Arc<dyn Registry>) -> Router {
    let mut router = Router::new();
    for controller in controllers(cfg, registry) {
        router = controller.add_route(router);
    }
    router
}
