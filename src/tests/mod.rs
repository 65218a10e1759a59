//! Integration tests for healthmon.
//!
//! End-to-end tests for the registry, prober classification, the
//! checker engine (supervisor + workers + transition notifications)
//! and the HTTP API controllers.

mod cases_api_test;

pub mod support;
