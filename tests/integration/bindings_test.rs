use std::time::Duration;

use anyhow::{Result, anyhow};

use certbind::binding::{self, BindingId};
use certbind::platform::{CertificateIssuerApi, PlatformClient};

use super::test_utils::{binding_id, client, ensure_binding_cleanup, load_config};

#[test]
fn set_then_read_finds_router() -> Result<()> {
    let config = load_config()?;
    let _cleanup = ensure_binding_cleanup(config.clone());

    let client = client(&config);
    let id = binding_id(&config)?;

    let state = binding::set_binding(&client, &id)?;
    if state.routers.is_empty() {
        return Err(anyhow!(
            "expected at least one router serving {} after set",
            config.cname
        ));
    }

    let reread = binding::read_binding(&client, &id)?;
    if reread.routers != state.routers {
        return Err(anyhow!(
            "router list changed between reads: {:?} vs {:?}",
            state.routers,
            reread.routers
        ));
    }

    Ok(())
}

#[test]
fn router_and_certificate_lists_are_sorted() -> Result<()> {
    let config = load_config()?;
    let _cleanup = ensure_binding_cleanup(config.clone());

    let client = client(&config);
    let id = binding_id(&config)?;
    binding::set_binding(&client, &id)?;

    let state = binding::read_binding(&client, &id)?;
    let mut routers = state.routers.clone();
    routers.sort();
    if routers != state.routers {
        return Err(anyhow!("router list not sorted: {:?}", state.routers));
    }
    let mut certificates = state.certificates.clone();
    certificates.sort();
    if certificates != state.certificates {
        return Err(anyhow!("certificate list not sorted"));
    }

    Ok(())
}

#[test]
#[ignore = "issuance can take minutes; run manually"]
fn wait_reports_ready_once_issued() -> Result<()> {
    let config = load_config()?;
    let _cleanup = ensure_binding_cleanup(config.clone());

    let client = client(&config);
    let id = binding_id(&config)?;
    binding::set_binding(&client, &id)?;

    let state = binding::wait_until_ready(
        &client,
        &id,
        Duration::from_secs(600),
        Duration::from_secs(15),
    )?;
    if state.certificates.is_empty() {
        return Err(anyhow!("ready binding reported no certificates"));
    }

    Ok(())
}

#[test]
fn read_after_unset_is_empty_and_not_ready() -> Result<()> {
    let config = load_config()?;

    let client = client(&config);
    let id = binding_id(&config)?;
    binding::set_binding(&client, &id)?;

    let state = binding::unset_binding(&client, &id)?;
    if !state.routers.is_empty() || !state.certificates.is_empty() || state.ready {
        return Err(anyhow!("expected empty state after unset, got {state:?}"));
    }

    Ok(())
}

#[test]
fn invalid_token_is_an_auth_error() -> Result<()> {
    let config = load_config()?;

    let client = PlatformClient::new(config.target.clone(), "invalid-token".to_string());
    let err = client
        .get_certificates(&config.app)
        .expect_err("expected invalid token error");
    let message = err.to_string().to_lowercase();
    if !message.contains("authentication") && !message.contains("401") {
        return Err(anyhow!("unexpected error for invalid token: {message}"));
    }

    Ok(())
}

#[test]
fn unknown_app_error_is_surfaced() -> Result<()> {
    let config = load_config()?;

    let client = client(&config);
    let id = BindingId::new("certbind-no-such-app", &config.cname, &config.issuer)?;
    let err = binding::read_binding(&client, &id).expect_err("expected unknown app error");
    if err.to_string().is_empty() {
        return Err(anyhow!("remote error lost its message"));
    }

    Ok(())
}
