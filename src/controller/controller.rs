// HTTP controller trait for route registration.

use axum::Router;

/// One self-contained slice of the monitor's HTTP API: registration
/// intake, status queries, config exposure. The server folds every
/// controller's routes into a single router at startup.
pub trait Controller: Send + Sync {
    /// Mounts this controller's routes onto the shared router.
    ///
    /// Commonly may be represented as:
    /// ```rust
    /// # use axum::{Router, routing::get};
    /// # async fn all_statuses() -> &'static str { "[]" }
    /// let router: Router<()> = Router::new().route("/health", get(all_statuses));
    /// # let _ = router;
    /// ```
    fn add_route(&self, router: Router) -> Router;
}
