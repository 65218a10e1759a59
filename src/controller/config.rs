// Encodes and shows current config as json.

use axum::{routing::get, Json, Router};

use crate::config::Config;
use crate::http::Controller;

/// ShowConfigController exposes the effective configuration.
pub struct ShowConfigController {
    cfg: Config,
}

impl ShowConfigController {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }
}

impl Controller for ShowConfigController {
    fn add_route(&self, router: Router) -> Router {
        let cfg = self.cfg.clone();
        router.route(
            "/config",
            get(move || {
                let cfg = cfg.clone();
                async move { Json(cfg) }
            }),
        )
    }
}
