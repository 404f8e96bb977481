//! Summaries parsed from the PEM chains a binding reconciles.
//!
//! The control plane hands back full chains; for status output and expiry
//! tracking only a few leaf fields matter.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use x509_parser::prelude::*;

#[derive(Debug, Clone, Serialize)]
pub struct CertificateSummary {
    /// Common name plus DNS SANs, deduplicated and sorted.
    pub subjects: Vec<String>,
    /// Serial number as uppercase hex.
    pub serial: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    /// SHA-256 over the leaf DER, colon-separated uppercase hex.
    pub fingerprint: String,
}

/// Parses the leaf (first) certificate of a PEM chain.
pub fn summarize_leaf(chain_pem: &str) -> Result<CertificateSummary> {
    let blocks = ::pem::parse_many(chain_pem).context("failed to decode PEM chain")?;
    let leaf = blocks
        .iter()
        .find(|block| block.tag() == "CERTIFICATE")
        .ok_or_else(|| anyhow!("no CERTIFICATE block in chain"))?;

    let der = leaf.contents();
    let (_, cert) =
        parse_x509_certificate(der).map_err(|err| anyhow!("failed to parse leaf: {err}"))?;

    let mut subjects: Vec<String> = Vec::new();
    if let Some(cn) = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
    {
        subjects.push(cn.to_string());
    }
    if let Ok(Some(san)) = cert.subject_alternative_name() {
        for name in &san.value.general_names {
            if let GeneralName::DNSName(dns) = name {
                subjects.push((*dns).to_string());
            }
        }
    }
    subjects.sort();
    subjects.dedup();

    let not_before = asn1_to_utc(&cert.validity().not_before)?;
    let not_after = asn1_to_utc(&cert.validity().not_after)?;

    Ok(CertificateSummary {
        subjects,
        serial: hex::encode_upper(cert.raw_serial()),
        not_before,
        not_after,
        fingerprint: fingerprint(der),
    })
}

/// Earliest leaf expiry across a binding's certificates. Chains that fail to
/// parse are skipped; `None` means nothing parseable was found.
pub fn earliest_expiry(chains: &[String]) -> Option<DateTime<Utc>> {
    chains
        .iter()
        .filter_map(|chain| summarize_leaf(chain).ok())
        .map(|summary| summary.not_after)
        .min()
}

fn asn1_to_utc(time: &ASN1Time) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| anyhow!("certificate validity out of range"))
}

fn fingerprint(der: &[u8]) -> String {
    Sha256::digest(der)
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}
