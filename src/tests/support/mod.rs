// Shared test support code for integration tests.
// This module provides common utilities that all test files can use.

pub mod common;
pub mod engine;
pub mod upstream;

pub use common::*;
pub use engine::{fast_checker_cfg, Engine};
pub use upstream::StubUpstream;
