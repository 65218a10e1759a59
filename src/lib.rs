#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;

pub mod app;
pub mod checker;
pub mod config;
pub mod controller;
pub mod http;
pub mod model;
pub mod notifier;
pub mod prober;
pub mod registry;
pub mod shutdown;
