use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};

/// Outcome of probing an HTTP endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Liveness {
    pub alive: bool,
    pub status: Option<u16>,
    pub latency: Duration,
}

fn counts_as_alive(code: StatusCode) -> bool {
    code.is_success() || code.is_redirection() || code == StatusCode::NOT_MODIFIED
}

/// Probes `url` with a GET using the caller's client (so its timeout applies).
///
/// Transport errors are reported as `alive: false` with no status rather than
/// an error; the probe is used to decide between backends, not to surface
/// failures.
pub async fn probe(client: &Client, url: &str) -> Liveness {
    let started = Instant::now();
    match client.get(url).send().await {
        Ok(resp) => {
            let code = resp.status();
            Liveness {
                alive: counts_as_alive(code),
                status: Some(code.as_u16()),
                latency: started.elapsed(),
            }
        }
        Err(err) => {
            tracing::debug!(url, error = %err, "liveness probe failed");
            Liveness {
                alive: false,
                status: None,
                latency: started.elapsed(),
            }
        }
    }
}
