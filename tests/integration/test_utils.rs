use anyhow::{Context, Result};

use certbind::binding::{self, BindingId};
use certbind::platform::PlatformClient;

/// Connection details for a disposable test application on a real control
/// plane. The CNAME must already be registered for the application and the
/// issuer must exist on the platform.
#[derive(Clone)]
pub struct TestConfig {
    pub target: String,
    pub token: String,
    pub app: String,
    pub cname: String,
    pub issuer: String,
}

pub fn load_config() -> Result<TestConfig> {
    Ok(TestConfig {
        target: required("CERTBIND_TEST_TARGET")?,
        token: required("CERTBIND_TEST_TOKEN")?,
        app: required("CERTBIND_TEST_APP")?,
        cname: required("CERTBIND_TEST_CNAME")?,
        issuer: required("CERTBIND_TEST_ISSUER")?,
    })
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} must be set for integration tests"))
}

pub fn client(config: &TestConfig) -> PlatformClient {
    PlatformClient::new(config.target.clone(), config.token.clone())
}

pub fn binding_id(config: &TestConfig) -> Result<BindingId> {
    BindingId::new(&config.app, &config.cname, &config.issuer)
}

/// Unsets the binding on drop so a failed assertion does not leave the
/// issuer assigned to the test application.
pub struct BindingCleanup {
    config: TestConfig,
}

pub fn ensure_binding_cleanup(config: TestConfig) -> BindingCleanup {
    BindingCleanup { config }
}

impl Drop for BindingCleanup {
    fn drop(&mut self) {
        if let Ok(id) = binding_id(&self.config) {
            let client = client(&self.config);
            let _ = binding::unset_binding(&client, &id);
        }
    }
}
