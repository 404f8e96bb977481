//! Runtime configuration resolved from flags and environment.

use anyhow::{Result, anyhow};

/// Environment fallback for the control-plane base URL.
pub const TARGET_ENV: &str = "CERTBIND_TARGET";

#[derive(Debug, Clone)]
pub struct Config {
    /// Control-plane base URL, e.g. `https://paas.example.com`.
    pub target: String,
}

impl Config {
    /// Flag wins over `CERTBIND_TARGET`; having neither is an error.
    pub fn resolve(target_flag: Option<String>) -> Result<Self> {
        let target = target_flag
            .or_else(|| std::env::var(TARGET_ENV).ok())
            .map(|target| target.trim().trim_end_matches('/').to_string())
            .filter(|target| !target.is_empty())
            .ok_or_else(|| anyhow!("no control plane target: pass --target or set {TARGET_ENV}"))?;

        if !target.starts_with("http://") && !target.starts_with("https://") {
            return Err(anyhow!("target must be an http(s) URL, got {target:?}"));
        }

        Ok(Self { target })
    }

    /// Host portion of the target, used to key the stored token.
    pub fn target_host(&self) -> String {
        let stripped = self
            .target
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        stripped
            .split(['/', ':'])
            .next()
            .unwrap_or(stripped)
            .to_string()
    }
}
