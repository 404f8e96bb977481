//! Typed client for the control-plane certificate-issuer endpoints.

use anyhow::Result;

mod client;
pub(crate) mod http;
mod types;

pub use client::PlatformClient;
pub use types::{AppCertificates, CertIssuerSetData, CnameCertificate, RouterCertificates};

/// The three remote operations the binding lifecycle consumes. Kept as a
/// trait so binding logic can run against a fake control plane in tests.
pub trait CertificateIssuerApi: Send + Sync {
    /// Assigns `issuer` to `cname` on the application.
    fn set_cert_issuer(&self, app: &str, cname: &str, issuer: &str) -> Result<()>;

    /// Removes whatever issuer is assigned to `cname` on the application.
    fn unset_cert_issuer(&self, app: &str, cname: &str) -> Result<()>;

    /// Fetches the application's full certificate listing.
    fn get_certificates(&self, app: &str) -> Result<AppCertificates>;
}
