// HTTP API controllers for service registration and status queries.

pub mod config;
pub mod controller;
pub mod health;
pub mod register;

// Re-export controller types for convenience
pub use config::ShowConfigController;
pub use health::HealthController;
pub use register::RegisterController;
