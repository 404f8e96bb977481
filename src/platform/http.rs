use std::sync::OnceLock;
use std::time::Duration;

use anyhow::anyhow;
use log::warn;
use reqwest::StatusCode;
use reqwest::blocking::Client;

pub struct HttpClient;

impl HttpClient {
    pub fn shared() -> &'static Client {
        static CLIENT: OnceLock<Client> = OnceLock::new();
        CLIENT.get_or_init(|| {
            let timeout = resolve_timeout();
            reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|err| {
                    warn!("[platform-http] failed to build shared client: {err}");
                    reqwest::blocking::Client::new()
                })
        })
    }
}

fn resolve_timeout() -> Duration {
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    let timeout = std::env::var("CERTBIND_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout == 0 {
        warn!("[platform-http] invalid timeout value; using default");
        return Duration::from_secs(DEFAULT_TIMEOUT_SECS);
    }
    Duration::from_secs(timeout)
}

/// Maps a non-success control-plane response to an error, keeping the
/// response body intact when there is one.
pub fn status_error(status: StatusCode, body: Option<String>) -> anyhow::Error {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return anyhow!("control plane authentication failed");
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return anyhow!("control plane rate limit exceeded");
    }
    if let Some(body) = body.filter(|body| !body.trim().is_empty()) {
        return anyhow!("control plane returned {status}: {}", body.trim());
    }
    anyhow!("control plane returned {status}")
}
