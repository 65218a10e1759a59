// Package shutdown provides graceful shutdown functionality.

use anyhow::Result;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
#[error("graceful shutdown timeout exceeded")]
pub struct TimeoutError;

/// Graceful shutdown handler: components register themselves with
/// `add`, signal completion with `done`, and the process waits for all
/// of them (bounded by a deadline) once a shutdown is triggered.
///
/// `registered` counts components that signed up; `done()` releases one
/// semaphore permit, so waiting means acquiring as many permits as were
/// registered. Components may finish before the wait even starts.
#[derive(Clone)]
pub struct GracefulShutdown {
    shutdown_token: CancellationToken,
    timeout: Arc<Mutex<Duration>>,
    registered: Arc<AtomicUsize>,
    counter: Arc<tokio::sync::Semaphore>,
}

impl GracefulShutdown {
    pub fn new(shutdown_token: CancellationToken) -> Self {
        Self {
            shutdown_token,
            timeout: Arc::new(Mutex::new(Duration::from_secs(10))),
            registered: Arc::new(AtomicUsize::new(0)),
            counter: Arc::new(tokio::sync::Semaphore::new(0)),
        }
    }

    /// Sets the graceful shutdown timeout.
    pub fn set_graceful_timeout(&self, timeout: Duration) {
        *self.timeout.lock() = timeout;
    }

    /// Registers `n` components to wait for.
    pub fn add(&self, n: usize) {
        self.registered.fetch_add(n, Ordering::SeqCst);
    }

    /// Marks one component as finished.
    pub fn done(&self) {
        self.counter.add_permits(1);
    }

    /// Waits for an OS signal or token cancellation, then waits for all
    /// registered components to finish within the configured timeout.
    pub async fn await_shutdown(&self) -> Result<()> {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!(
                    component = "graceful-shutdown",
                    event = "os_signal",
                    signal = "SIGINT",
                    "cancellation started"
                );
            }
            _ = self.shutdown_token.cancelled() => {
                info!(
                    component = "graceful-shutdown",
                    event = "ctx_done",
                    "cancellation started"
                );
            }
        }

        self.cancel_and_await_with_timeout().await
    }

    async fn cancel_and_await_with_timeout(&self) -> Result<()> {
        self.shutdown_token.cancel();

        let timeout_duration = *self.timeout.lock();
        match timeout(timeout_duration, self.wait_for_completion()).await {
            Ok(_) => {
                info!(
                    component = "graceful-shutdown",
                    event = "shutdown_success",
                    "service was gracefully shut down"
                );
                Ok(())
            }
            Err(_) => {
                warn!(
                    component = "graceful-shutdown",
                    event = "shutdown_timeout",
                    timeout_secs = timeout_duration.as_secs(),
                    "not all tasks were closed within timeout"
                );
                Err(TimeoutError.into())
            }
        }
    }

    async fn wait_for_completion(&self) {
        // done() releases one permit per finished component, so all
        // registered components are done once that many permits exist.
        let expected = self.registered.load(Ordering::SeqCst) as u32;
        if expected == 0 {
            return;
        }
        // Closed-semaphore errors cannot happen here, nothing closes it.
        let _ = self.counter.acquire_many(expected).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Instant};

    #[tokio::test]
    async fn shutdown_times_out_while_a_component_is_still_running() {
        let token = CancellationToken::new();
        let gsh = GracefulShutdown::new(token.clone());
        gsh.set_graceful_timeout(Duration::from_millis(200));

        gsh.add(1);
        token.cancel();

        // Nobody calls done(); the deadline must actually be reached.
        let started = Instant::now();
        assert!(gsh.await_shutdown().await.is_err());
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn shutdown_waits_for_every_registered_component() {
        let token = CancellationToken::new();
        let gsh = GracefulShutdown::new(token.clone());
        gsh.set_graceful_timeout(Duration::from_secs(2));

        gsh.add(2);
        let worker = gsh.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            worker.done();
            sleep(Duration::from_millis(50)).await;
            worker.done();
        });

        token.cancel();
        let started = Instant::now();
        assert!(gsh.await_shutdown().await.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn components_finished_before_the_wait_are_not_waited_for() {
        let token = CancellationToken::new();
        let gsh = GracefulShutdown::new(token.clone());
        gsh.set_graceful_timeout(Duration::from_secs(2));

        gsh.add(1);
        gsh.done();
        token.cancel();

        assert!(gsh.await_shutdown().await.is_ok());
    }
}
