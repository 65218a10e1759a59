// Registration intake: register and deregister monitored services.

use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::config::{Config, ConfigTrait};
use crate::http::Controller;
use crate::model::{RegisterRequest, ServiceRecord};
use crate::registry::{Registry, RegistryError};

/// RegisterController handles service registration intake.
///
/// The registration pipeline owns endpoint/interval/recipients but
/// never status: re-registering a live service keeps its observed state.
pub struct RegisterController {
    cfg: Config,
    registry: Arc<dyn Registry>,
}

impl RegisterController {
    pub fn new(cfg: Config, registry: Arc<dyn Registry>) -> Self {
        Self { cfg, registry }
    }

    async fn register(&self, req: RegisterRequest) -> Response {
        if req.name.trim().is_empty() {
            return reject("service name is required");
        }
        if req.endpoint.trim().is_empty() {
            return reject("service endpoint is required");
        }
        match Url::parse(&req.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return reject("endpoint must use an http or https scheme"),
        }

        // Too-frequent polling is clamped, not rejected.
        let interval = self.cfg.checker().effective_interval(req.frequency_seconds);
        let record = ServiceRecord::new(req.name, req.endpoint, interval, req.recipients);

        match self.registry.register(record) {
            Ok(stored) => {
                info!(
                    component = "api",
                    event = "service_registered",
                    service = %stored.name,
                    endpoint = %stored.endpoint,
                    interval = ?stored.interval,
                    "service registered"
                );
                (
                    StatusCode::CREATED,
                    Json(json!({
                        "message": "service registered",
                        "service": stored,
                    })),
                )
                    .into_response()
            }
            Err(e @ RegistryError::InvalidRegistration(_)) => reject(&e.to_string()),
            Err(e) => {
                warn!(
                    component = "api",
                    event = "register_failed",
                    error = %e,
                    "failed to persist registration"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "failed to persist service"})),
                )
                    .into_response()
            }
        }
    }

    async fn deregister(&self, name: String) -> Response {
        match self.registry.remove(&name) {
            Ok(true) => {
                info!(
                    component = "api",
                    event = "service_deregistered",
                    service = %name,
                    "service deregistered"
                );
                Json(json!({"message": "service deregistered"})).into_response()
            }
            Ok(false) => {
                (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))).into_response()
            }
            Err(e) => {
                warn!(
                    component = "api",
                    event = "deregister_failed",
                    service = %name,
                    error = %e,
                    "failed to deregister service"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "failed to remove service"})),
                )
                    .into_response()
            }
        }
    }
}

fn reject(reason: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"error": reason}))).into_response()
}

impl Controller for RegisterController {
    fn add_route(&self, router: Router) -> Router {
        let register_controller = self.clone();
        let deregister_controller = self.clone();
        router
            .route(
                "/register",
                post(move |Json(req): Json<RegisterRequest>| {
                    let controller = register_controller.clone();
                    async move { controller.register(req).await }
                }),
            )
            .route(
                "/register/:name",
                delete(move |Path(name): Path<String>| {
                    let controller = deregister_controller.clone();
                    async move { controller.deregister(name).await }
                }),
            )
    }
}

impl Clone for RegisterController {
    fn clone(&self) -> Self {
        Self {
            cfg: self.cfg.clone(),
            registry: self.registry.clone(),
        }
    }
}
