//! Probe execution.
//!
//! A probe is a single check: TCP connect, HTTP GET expecting 2xx, or a
//! command run inside a service container expecting exit status 0.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use fastfood_core::ProbeKind;

/// Result of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// The target answered as expected.
    Healthy,
    /// The target answered, but not successfully (non-2xx, non-zero exit).
    Unhealthy,
    /// The probe could not be executed (connection error, timeout).
    Failed,
}

impl ProbeResult {
    pub fn is_healthy(self) -> bool {
        self == ProbeResult::Healthy
    }
}

/// Runs probes against services.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `service` once using `probe`.
    async fn probe(&self, service: &str, probe: &ProbeKind) -> ProbeResult;
}

/// Runs a command inside a service container.
///
/// Returns whether the command exited successfully.
#[async_trait]
pub trait Exec: Send + Sync {
    async fn exec_succeeds(&self, service: &str, command: &[String]) -> std::io::Result<bool>;
}

/// Prober that talks to the real services.
pub struct LiveProber<E> {
    exec: E,
    timeout: Duration,
}

impl<E: Exec> LiveProber<E> {
    pub fn new(exec: E) -> Self {
        Self {
            exec,
            timeout: Duration::from_secs(2),
        }
    }

    /// Per-probe timeout for TCP and HTTP probes.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl<E: Exec> Prober for LiveProber<E> {
    async fn probe(&self, service: &str, probe: &ProbeKind) -> ProbeResult {
        match probe {
            ProbeKind::Tcp { address } => tcp_probe(address, self.timeout).await,
            ProbeKind::Http { address, path } => http_probe(address, path, self.timeout).await,
            ProbeKind::Command { command } => match self.exec.exec_succeeds(service, command).await {
                Ok(true) => ProbeResult::Healthy,
                Ok(false) => ProbeResult::Unhealthy,
                Err(e) => {
                    debug!(%service, error = %e, "command probe could not run");
                    ProbeResult::Failed
                }
            },
        }
    }
}

/// Check that `address` accepts a TCP connection within `timeout`.
pub async fn tcp_probe(address: &str, timeout: Duration) -> ProbeResult {
    match tokio::time::timeout(timeout, tokio::net::TcpStream::connect(address)).await {
        Ok(Ok(_)) => ProbeResult::Healthy,
        Ok(Err(e)) => {
            debug!(error = %e, %address, "tcp probe connection failed");
            ProbeResult::Failed
        }
        Err(_) => {
            debug!(%address, "tcp probe timed out");
            ProbeResult::Failed
        }
    }
}

/// Perform an HTTP GET against `http://{address}{path}`.
///
/// Returns `Healthy` if the response is 2xx, `Unhealthy` for non-2xx,
/// or `Failed` if the connection fails or times out.
pub async fn http_probe(address: &str, path: &str, timeout: Duration) -> ProbeResult {
    let uri = format!("http://{address}{path}");

    let result = tokio::time::timeout(timeout, async {
        let stream = match tokio::net::TcpStream::connect(address).await {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, %uri, "health probe connection failed");
                return ProbeResult::Failed;
            }
        };

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = match hyper::client::conn::http1::handshake(io).await {
            Ok(pair) => pair,
            Err(e) => {
                debug!(error = %e, %uri, "health probe handshake failed");
                return ProbeResult::Failed;
            }
        };

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = match http::Request::builder()
            .method("GET")
            .uri(&uri)
            .header("host", address)
            .header("user-agent", "fastfood-ops/0.1")
            .body(http_body_util::Empty::<bytes::Bytes>::new())
        {
            Ok(req) => req,
            Err(e) => {
                debug!(error = %e, %uri, "invalid health probe request");
                return ProbeResult::Failed;
            }
        };

        match sender.send_request(req).await {
            Ok(resp) => {
                if resp.status().is_success() {
                    ProbeResult::Healthy
                } else {
                    debug!(status = %resp.status(), %uri, "health probe non-2xx");
                    ProbeResult::Unhealthy
                }
            }
            Err(e) => {
                debug!(error = %e, %uri, "health probe request failed");
                ProbeResult::Failed
            }
        }
    })
    .await;

    match result {
        Ok(probe) => probe,
        Err(_) => {
            debug!(%uri, "health probe timed out");
            ProbeResult::Failed
        }
    }
}
