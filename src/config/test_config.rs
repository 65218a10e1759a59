use super::{Checker, ClientErrorPolicy, Config, Monitor, MonitorBox};
use std::time::Duration;

/// Creates a new test configuration with intervals short enough for
/// integration tests to converge quickly.
pub fn new_test_config() -> Config {
    Monitor {
        monitor: MonitorBox {
            env: super::TEST.to_string(),
            logs: Some(super::Logs {
                level: Some("debug".to_string()),
            }),
            api: Some(super::Api {
                name: Some("healthmon-test".to_string()),
                port: Some("0".to_string()),
            }),
            checker: Some(Checker {
                reconcile_interval: Some(Duration::from_millis(50)),
                probe_timeout: Some(Duration::from_secs(1)),
                min_interval: Some(Duration::from_secs(10)),
                default_interval: Some(Duration::from_secs(30)),
                telemetry_interval: Some(Duration::from_secs(3600)),
                shutdown_timeout: Some(Duration::from_secs(5)),
                client_error_policy: Some(ClientErrorPolicy::Alarm),
            }),
            registry: None,
            shutdown: Some(super::Shutdown {
                graceful_timeout: Some(Duration::from_secs(5)),
            }),
            services: None,
        },
    }
}
