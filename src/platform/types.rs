use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Body of the assign-certificate-issuer call.
#[derive(Debug, Clone, Serialize)]
pub struct CertIssuerSetData {
    pub cname: String,
    pub issuer: String,
}

/// Full certificate listing for one application, keyed by router.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppCertificates {
    #[serde(default)]
    pub routers: HashMap<String, RouterCertificates>,
}

/// CNAME table of a single router.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterCertificates {
    #[serde(default)]
    pub cnames: HashMap<String, CnameCertificate>,
}

/// What one router reports for one CNAME. `certificate` stays empty until
/// the issuer has finished issuing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CnameCertificate {
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub certificate: String,
}
