// Scriptable upstream server for probe and checker tests.

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Router,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

struct StubState {
    status: AtomicU16,
    body: Mutex<Option<String>>,
    delay_ms: AtomicU64,
    hits: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Upstream whose response status, body and latency can be changed
/// mid-test. Tracks hit counts and concurrent in-flight requests so
/// tests can assert the no-overlap property.
pub struct StubUpstream {
    pub addr: SocketAddr,
    state: Arc<StubState>,
    handle: JoinHandle<()>,
}

impl StubUpstream {
    pub async fn spawn() -> Self {
        let state = Arc::new(StubState {
            status: AtomicU16::new(200),
            body: Mutex::new(None),
            delay_ms: AtomicU64::new(0),
            hits: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });

        let handler_state = state.clone();
        let app = Router::new().fallback(move || {
            let state = handler_state.clone();
            async move {
                state.hits.fetch_add(1, Ordering::SeqCst);
                let now_in_flight = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                state.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

                let delay = state.delay_ms.load(Ordering::SeqCst);
                if delay > 0 {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }

                let code = StatusCode::from_u16(state.status.load(Ordering::SeqCst))
                    .unwrap_or(StatusCode::OK);
                let body = state
                    .body
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| r#"{"ok":true}"#.to_string());

                state.in_flight.fetch_sub(1, Ordering::SeqCst);
                (code, [(header::CONTENT_TYPE, "application/json")], body).into_response()
            }
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/health", self.addr)
    }

    pub fn set_status(&self, code: u16) {
        self.state.status.store(code, Ordering::SeqCst);
    }

    pub fn set_body(&self, body: &str) {
        *self.state.body.lock().unwrap() = Some(body.to_string());
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Drop for StubUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
