use anyhow::{Context, Result};
use log::debug;
use zeroize::Zeroizing;

use super::CertificateIssuerApi;
use super::http::{self, HttpClient};
use super::types::{AppCertificates, CertIssuerSetData};

/// Blocking client for the control plane. One instance per target; the
/// underlying HTTP client is shared process-wide.
pub struct PlatformClient {
    base_url: String,
    token: Zeroizing<String>,
}

impl PlatformClient {
    pub fn new(base_url: impl Into<String>, token: String) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            token: Zeroizing::new(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token.as_str())
    }
}

impl CertificateIssuerApi for PlatformClient {
    fn set_cert_issuer(&self, app: &str, cname: &str, issuer: &str) -> Result<()> {
        debug!("[platform] set certissuer app={app} cname={cname} issuer={issuer}");
        let body = CertIssuerSetData {
            cname: cname.to_string(),
            issuer: issuer.to_string(),
        };
        let response = HttpClient::shared()
            .put(self.url(&format!("/1.0/apps/{app}/certissuer")))
            .header("Authorization", self.bearer())
            .json(&body)
            .send()
            .context("failed to reach the control plane")?;

        let status = response.status();
        if !status.is_success() {
            return Err(http::status_error(status, response.text().ok()));
        }
        Ok(())
    }

    fn unset_cert_issuer(&self, app: &str, cname: &str) -> Result<()> {
        debug!("[platform] unset certissuer app={app} cname={cname}");
        let response = HttpClient::shared()
            .delete(self.url(&format!("/1.0/apps/{app}/certissuer")))
            .header("Authorization", self.bearer())
            .query(&[("cname", cname)])
            .send()
            .context("failed to reach the control plane")?;

        let status = response.status();
        if !status.is_success() {
            return Err(http::status_error(status, response.text().ok()));
        }
        Ok(())
    }

    fn get_certificates(&self, app: &str) -> Result<AppCertificates> {
        debug!("[platform] get certificates app={app}");
        let response = HttpClient::shared()
            .get(self.url(&format!("/1.0/apps/{app}/certificate")))
            .header("Authorization", self.bearer())
            .send()
            .context("failed to reach the control plane")?;

        let status = response.status();
        if !status.is_success() {
            return Err(http::status_error(status, response.text().ok()));
        }
        response
            .json::<AppCertificates>()
            .context("failed to parse certificate listing")
    }
}

#[cfg(test)]
mod tests {
    use super::PlatformClient;

    #[test]
    fn base_url_loses_trailing_slash() {
        let client = PlatformClient::new("https://paas.example.com/", "tok".to_string());
        assert_eq!(
            client.url("/1.0/apps/blog/certissuer"),
            "https://paas.example.com/1.0/apps/blog/certissuer"
        );
    }

    #[test]
    fn bearer_header_carries_token() {
        let client = PlatformClient::new("https://paas.example.com", "tok".to_string());
        assert_eq!(client.bearer(), "Bearer tok");
    }
}
