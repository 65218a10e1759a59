//! Hyper HTTP client configuration for outbound health probes.
//!
//! Probes are small GET requests spread across many hosts, so the pool
//! keeps a handful of idle connections per host and aggressively times
//! out connection establishment; the per-probe deadline is enforced by
//! the prober itself.

use anyhow::{Context, Result};
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

pub const CONNS_PER_HOST: usize = 4;
pub const MAX_IDLE_CONN_DURATION: Duration = Duration::from_secs(30);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
pub const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

pub type HyperClient = Client<HttpsConnector<HttpConnector>, BoxBody<Bytes, hyper::Error>>;

/// Creates the shared probe client.
///
/// HTTP/1.1 only; health endpoints are plain request/response and
/// multiplexing buys nothing here. HTTPS endpoints are verified against
/// the native root store.
pub fn create_client() -> Result<HyperClient> {
    let mut http_connector = HttpConnector::new();
    http_connector.set_nodelay(true);
    http_connector.set_keepalive(Some(TCP_KEEPALIVE));
    http_connector.set_connect_timeout(Some(CONNECT_TIMEOUT));

    let tls = hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()
        .context("failed to load native root certificates")?
        .https_or_http()
        .enable_http1()
        .wrap_connector(http_connector);

    let client = Client::builder(TokioExecutor::new())
        .pool_max_idle_per_host(CONNS_PER_HOST)
        .pool_idle_timeout(MAX_IDLE_CONN_DURATION)
        .build(tls);

    Ok(client)
}
