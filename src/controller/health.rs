// Status query endpoints: all services and a single service by name.

use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::http::Controller;
use crate::registry::Registry;

/// HealthController serves the last observed state of monitored
/// services straight from the registry; it never triggers a probe.
pub struct HealthController {
    registry: Arc<dyn Registry>,
}

impl HealthController {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }

    async fn get_all(&self) -> Response {
        match self.registry.all() {
            Ok(records) => Json(records).into_response(),
            Err(e) => {
                warn!(
                    component = "api",
                    event = "read_all_failed",
                    error = %e,
                    "failed to read services"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "failed to read services"})),
                )
                    .into_response()
            }
        }
    }

    async fn get_one(&self, name: String) -> Response {
        match self.registry.get(&name) {
            Ok(Some(record)) => Json(record).into_response(),
            Ok(None) => {
                (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))).into_response()
            }
            Err(e) => {
                warn!(
                    component = "api",
                    event = "read_one_failed",
                    service = %name,
                    error = %e,
                    "failed to read service"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "failed to read service"})),
                )
                    .into_response()
            }
        }
    }
}

impl Controller for HealthController {
    fn add_route(&self, router: Router) -> Router {
        let all_controller = self.clone();
        let one_controller = self.clone();
        router
            .route(
                "/health",
                get(move || {
                    let controller = all_controller.clone();
                    async move { controller.get_all().await }
                }),
            )
            .route(
                "/health/:name",
                get(move |Path(name): Path<String>| {
                    let controller = one_controller.clone();
                    async move { controller.get_one(name).await }
                }),
            )
    }
}

impl Clone for HealthController {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}
