//! Health probe execution and classification.
//!
//! One probe is one bounded GET against a service endpoint, classified
//! into a `Status`. The prober never retries; each worker tick is a
//! single attempt.

use async_trait::async_trait;
use http_body_util::{BodyExt, Empty};
use hyper::{Method, Request, StatusCode, Uri};
use bytes::Bytes;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::config::ClientErrorPolicy;
use crate::http::client::HyperClient;
use crate::model::Status;

/// Bodies larger than this are never inspected for a reported status.
const MAX_REPORT_BODY: usize = 64 << 10;

const USER_AGENT: &str = concat!("healthmon/", env!("CARGO_PKG_VERSION"));

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: Status,
    /// Raw `status` field value the remote side reported in a 2xx JSON
    /// body, when present. Kept for tracing even when unrecognized.
    pub reported: Option<String>,
}

impl ProbeOutcome {
    fn of(status: Status) -> Self {
        Self {
            status,
            reported: None,
        }
    }
}

/// Performs one health probe against an endpoint.
///
/// Purely functional given the endpoint: no retries, no state, no side
/// effects beyond the network call itself.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, endpoint: &str) -> ProbeOutcome;
}

pub struct HttpProber {
    client: HyperClient,
    timeout: Duration,
    client_error_policy: ClientErrorPolicy,
}

impl HttpProber {
    pub fn new(client: HyperClient, timeout: Duration, client_error_policy: ClientErrorPolicy) -> Self {
        Self {
            client,
            timeout,
            client_error_policy,
        }
    }

    /// Classification policy for completed responses:
    /// 2xx is Up (possibly overridden by a remote-reported status),
    /// 5xx is Alarm, everything else follows the client-error policy.
    fn classify(&self, code: StatusCode) -> Status {
        if code.is_success() {
            Status::Up
        } else if code.is_server_error() {
            Status::Alarm
        } else {
            match self.client_error_policy {
                ClientErrorPolicy::Alarm => Status::Alarm,
                ClientErrorPolicy::Down => Status::Down,
            }
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, endpoint: &str) -> ProbeOutcome {
        let uri: Uri = match endpoint.parse() {
            Ok(uri) => uri,
            Err(e) => {
                debug!(
                    component = "prober",
                    event = "bad_endpoint",
                    endpoint = %endpoint,
                    error = %e,
                    "endpoint is not a valid uri"
                );
                return ProbeOutcome::of(Status::Down);
            }
        };

        let req = match Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(hyper::header::USER_AGENT, USER_AGENT)
            .body(
                Empty::<Bytes>::new()
                    .map_err(|never: std::convert::Infallible| match never {})
                    .boxed(),
            ) {
            Ok(req) => req,
            Err(e) => {
                debug!(
                    component = "prober",
                    event = "request_build_failed",
                    endpoint = %endpoint,
                    error = %e,
                    "failed to build probe request"
                );
                return ProbeOutcome::of(Status::Down);
            }
        };

        let response = match timeout(self.timeout, self.client.request(req)).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                debug!(
                    component = "prober",
                    event = "probe_transport_failure",
                    endpoint = %endpoint,
                    error = %e,
                    "probe request failed"
                );
                return ProbeOutcome::of(Status::Down);
            }
            Err(_) => {
                debug!(
                    component = "prober",
                    event = "probe_timeout",
                    endpoint = %endpoint,
                    timeout = ?self.timeout,
                    "probe timed out"
                );
                return ProbeOutcome::of(Status::Down);
            }
        };

        let code = response.status();
        let classified = self.classify(code);
        if classified != Status::Up {
            debug!(
                component = "prober",
                event = "probe_completed",
                endpoint = %endpoint,
                http_status = code.as_u16(),
                status = %classified,
                "probe classified"
            );
            return ProbeOutcome::of(classified);
        }

        // 2xx: a small JSON body exposing a `status` field overrides the
        // plain Up classification with whatever the remote side reports.
        let body = match timeout(
            self.timeout,
            http_body_util::Limited::new(response.into_body(), MAX_REPORT_BODY).collect(),
        )
        .await
        {
            Ok(Ok(collected)) => collected.to_bytes(),
            // Oversized or interrupted body: the 2xx status already told
            // us the service answered, keep Up.
            Ok(Err(_)) | Err(_) => return ProbeOutcome::of(Status::Up),
        };

        match extract_reported_status(&body) {
            Some(reported) => {
                let status = Status::from_report(&reported).unwrap_or(Status::Up);
                if status != Status::Up {
                    debug!(
                        component = "prober",
                        event = "remote_status_override",
                        endpoint = %endpoint,
                        reported = %reported,
                        status = %status,
                        "remote-reported status overrides 2xx classification"
                    );
                }
                ProbeOutcome {
                    status,
                    reported: Some(reported),
                }
            }
            None => ProbeOutcome::of(Status::Up),
        }
    }
}

/// Duck-typed pass-through: a JSON object body with a non-empty string
/// `status` field. Anything else is ignored.
fn extract_reported_status(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let reported = value.as_object()?.get("status")?.as_str()?;
    if reported.is_empty() {
        return None;
    }
    Some(reported.to_string())
}
