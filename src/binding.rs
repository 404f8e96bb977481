//! Certificate-issuer bindings.
//!
//! A binding attaches a certificate issuer to one CNAME of a platform
//! application. The platform decides which routers serve that CNAME; this
//! module reconciles the remote listing into a flat, deterministic view and
//! drives the set/unset/read lifecycle against the control plane.

use std::fmt;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::normalize_cname;
use crate::platform::{AppCertificates, CertificateIssuerApi};

const ID_SEPARATOR: &str = "::";

#[derive(Debug, Error)]
pub enum BindingIdError {
    #[error("malformed binding id {0:?}: expected app::cname::issuer")]
    Malformed(String),
    #[error("malformed binding id {0:?}: empty {1} segment")]
    EmptySegment(String, &'static str),
}

/// Composite key of a binding. The three fields are immutable; changing any
/// of them is an unset followed by a set, never an in-place update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingId {
    pub app: String,
    pub cname: String,
    pub issuer: String,
}

impl BindingId {
    /// Builds an identifier from operator input, normalizing the CNAME.
    pub fn new(app: &str, cname: &str, issuer: &str) -> Result<Self> {
        let app = app.trim();
        if app.is_empty() {
            return Err(anyhow!("application name is required"));
        }
        let issuer = issuer.trim();
        if issuer.is_empty() {
            return Err(anyhow!("issuer name is required"));
        }
        Ok(Self {
            app: app.to_string(),
            cname: normalize_cname(cname)?,
            issuer: issuer.to_string(),
        })
    }

    /// The persisted identifier: `app::cname::issuer`.
    pub fn compose(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.app,
            self.cname,
            self.issuer,
            sep = ID_SEPARATOR
        )
    }

    /// Decomposes a persisted identifier back into its three fields.
    pub fn parse(raw: &str) -> Result<Self, BindingIdError> {
        let parts: Vec<&str> = raw.split(ID_SEPARATOR).collect();
        let [app, cname, issuer] = parts[..] else {
            return Err(BindingIdError::Malformed(raw.to_string()));
        };
        for (segment, name) in [(app, "app"), (cname, "cname"), (issuer, "issuer")] {
            if segment.is_empty() {
                return Err(BindingIdError::EmptySegment(raw.to_string(), name));
            }
        }
        Ok(Self {
            app: app.to_string(),
            cname: cname.to_string(),
            issuer: issuer.to_string(),
        })
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compose())
    }
}

/// Remote state reconciled for one binding. Lists are always
/// lexicographically sorted so repeated reads of the same remote state
/// compare equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingState {
    pub routers: Vec<String>,
    pub certificates: Vec<String>,
    pub ready: bool,
}

/// Filters the application's certificate listing down to the routers that
/// serve `cname` under `issuer`. `ready` flips true once at least one of
/// them reports a non-empty certificate.
pub fn reconcile(listing: &AppCertificates, cname: &str, issuer: &str) -> BindingState {
    let mut routers = Vec::new();
    let mut certificates = Vec::new();

    for (router_name, router) in &listing.routers {
        let Some(entry) = router.cnames.get(cname) else {
            continue;
        };
        if entry.issuer != issuer {
            continue;
        }
        routers.push(router_name.clone());
        if !entry.certificate.is_empty() {
            certificates.push(entry.certificate.clone());
        }
    }

    routers.sort();
    certificates.sort();
    let ready = !certificates.is_empty();

    BindingState {
        routers,
        certificates,
        ready,
    }
}

/// Assigns the issuer to the CNAME, then immediately re-reads so the caller
/// gets the reconciled state the control plane now reports.
pub fn set_binding(api: &dyn CertificateIssuerApi, id: &BindingId) -> Result<BindingState> {
    api.set_cert_issuer(&id.app, &id.cname, &id.issuer)
        .context("unable to set certificate issuer")?;
    read_binding(api, id)
}

/// Removes the issuer assignment for the CNAME. The follow-up read finds no
/// matching router and naturally reports an empty, not-ready state.
pub fn unset_binding(api: &dyn CertificateIssuerApi, id: &BindingId) -> Result<BindingState> {
    api.unset_cert_issuer(&id.app, &id.cname)
        .context("unable to unset certificate issuer")?;
    read_binding(api, id)
}

/// Fetches the application's certificate listing and reconciles it for this
/// binding.
pub fn read_binding(api: &dyn CertificateIssuerApi, id: &BindingId) -> Result<BindingState> {
    let listing = api.get_certificates(&id.app)?;
    Ok(reconcile(&listing, &id.cname, &id.issuer))
}

/// Polls [`read_binding`] until the binding is ready or `timeout` passes.
/// Issuance is asynchronous on the platform side; this is the only place the
/// crate loops over a remote call.
pub fn wait_until_ready(
    api: &dyn CertificateIssuerApi,
    id: &BindingId,
    timeout: Duration,
    interval: Duration,
) -> Result<BindingState> {
    let started = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!("[binding-wait] readiness check attempt {attempt} for {id}");

        let state = read_binding(api, id)?;
        if state.ready {
            debug!(
                "[binding-wait] certificate ready after {}ms (attempt {attempt})",
                started.elapsed().as_millis()
            );
            return Ok(state);
        }

        if started.elapsed() >= timeout {
            warn!(
                "[binding-wait] timeout after {}ms (attempt {attempt}), routers: {:?}",
                started.elapsed().as_millis(),
                state.routers
            );
            return Err(anyhow!(
                "certificate for {id} not ready after {}s",
                started.elapsed().as_secs()
            ));
        }

        let remaining = timeout.saturating_sub(started.elapsed());
        debug!(
            "[binding-wait] not ready yet, waiting {}s before next check ({}s remaining)",
            interval.as_secs(),
            remaining.as_secs()
        );
        std::thread::sleep(interval);
    }
}
