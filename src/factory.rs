//! Client factories
//!
//! A factory is built for one settings scope. When the AWS plugin has usable
//! settings in that scope it becomes [`Factory::Configured`]; otherwise it is
//! [`Factory::Noop`], whose calls log and return nothing. Missing or invalid
//! configuration is never an error here.

use crate::aws::{ProfileCatalog, ServiceHandle, SessionBuilder};
use crate::error::Result;
use crate::settings::{AwsSettings, SettingsScope, SettingsStore, AWS_PLUGIN_NAME};
use tracing::{debug, info, warn};

const NOOP_MESSAGE: &str = "No operation available. Ensure plugin is configured correctly.";

/// Factory with settings loaded from a scope
#[derive(Debug, Clone)]
pub struct ConfiguredFactory {
    scope: SettingsScope,
    settings: AwsSettings,
}

impl ConfiguredFactory {
    pub fn new(scope: SettingsScope, settings: AwsSettings) -> Self {
        Self { scope, settings }
    }

    fn builder(&self, settings: Option<&AwsSettings>) -> SessionBuilder {
        SessionBuilder::from_settings(settings.unwrap_or(&self.settings))
    }
}

/// Fallback used when no usable settings exist
#[derive(Debug, Clone, Default)]
pub struct NoopFactory {
    scope: Option<SettingsScope>,
}

#[derive(Debug, Clone)]
pub enum Factory {
    Configured(ConfiguredFactory),
    Noop(NoopFactory),
}

impl Factory {
    /// Factory for user-level settings
    pub fn user(store: &dyn SettingsStore) -> Self {
        Self::for_scope(store, SettingsScope::User)
    }

    /// Factory for system-level settings
    pub fn system(store: &dyn SettingsStore) -> Self {
        Self::for_scope(store, SettingsScope::System)
    }

    pub fn for_scope(store: &dyn SettingsStore, scope: SettingsScope) -> Self {
        match load_settings(store, scope) {
            Some(settings) => {
                info!("AWS integration configured from {} settings", scope);
                if let Some(profile) = settings.profile_name() {
                    warn_if_unknown_profile(profile, ProfileCatalog::load());
                }
                Factory::Configured(ConfiguredFactory::new(scope, settings))
            }
            None => {
                info!(
                    "No AWS integration plugin found or failed to initialize ({} scope).",
                    scope
                );
                Factory::Noop(NoopFactory { scope: Some(scope) })
            }
        }
    }

    pub fn noop() -> Self {
        Factory::Noop(NoopFactory::default())
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Factory::Configured(_))
    }

    pub fn scope(&self) -> Option<SettingsScope> {
        match self {
            Factory::Configured(f) => Some(f.scope),
            Factory::Noop(f) => f.scope,
        }
    }

    /// Settings loaded at construction, if any
    pub fn settings(&self) -> Option<&AwsSettings> {
        match self {
            Factory::Configured(f) => Some(&f.settings),
            Factory::Noop(_) => None,
        }
    }

    /// Client handle for `service_name`; `settings` replaces the stored ones for this call
    pub async fn get_client(
        &self,
        service_name: &str,
        settings: Option<&AwsSettings>,
    ) -> Result<Option<ServiceHandle>> {
        match self {
            Factory::Configured(f) => {
                Ok(Some(f.builder(settings).build_client(service_name).await))
            }
            Factory::Noop(_) => {
                info!(service = service_name, "{}", NOOP_MESSAGE);
                Ok(None)
            }
        }
    }

    /// Resource handle for `service_name`; `settings` replaces the stored ones for this call
    pub async fn get_resource(
        &self,
        service_name: &str,
        settings: Option<&AwsSettings>,
    ) -> Result<Option<ServiceHandle>> {
        match self {
            Factory::Configured(f) => f
                .builder(settings)
                .build_resource(service_name)
                .await
                .map(Some),
            Factory::Noop(_) => {
                info!(service = service_name, "{}", NOOP_MESSAGE);
                Ok(None)
            }
        }
    }

    /// ARN of the configured principal, looked up through STS
    pub async fn caller_identity(&self, settings: Option<&AwsSettings>) -> Result<Option<String>> {
        match self {
            Factory::Configured(f) => {
                let session = f.builder(settings).build_session().await;
                session.caller_identity().await.map(Some)
            }
            Factory::Noop(_) => {
                info!("{}", NOOP_MESSAGE);
                Ok(None)
            }
        }
    }
}

/// Stored settings for a scope, or `None` when absent, empty or unusable
fn load_settings(store: &dyn SettingsStore, scope: SettingsScope) -> Option<AwsSettings> {
    let value = match store.get_setting(scope, AWS_PLUGIN_NAME) {
        Ok(Some(serde_json::Value::Null)) | Ok(None) => return None,
        Ok(Some(serde_json::Value::Object(map))) if map.is_empty() => {
            debug!("Stored {} settings for '{}' are empty", scope, AWS_PLUGIN_NAME);
            return None;
        }
        Ok(Some(value)) => value,
        Err(e) => {
            info!("Could not read {} settings for '{}': {}", scope, AWS_PLUGIN_NAME, e);
            return None;
        }
    };

    match AwsSettings::from_value(value) {
        Ok(settings) => Some(settings),
        Err(e) => {
            info!("Ignoring {} settings for '{}': {}", scope, AWS_PLUGIN_NAME, e);
            None
        }
    }
}

/// Warn once at load when the configured profile is missing from the shared
/// AWS files. The session is still built; the SDK has the final word.
/// Returns whether a warning was logged.
fn warn_if_unknown_profile(profile: &str, catalog: Result<ProfileCatalog>) -> bool {
    match catalog {
        Ok(catalog) if !catalog.contains(profile) => {
            warn!("AWS profile '{}' not found in the shared config files", profile);
            true
        }
        Ok(_) => false,
        Err(e) => {
            debug!("Could not read AWS shared files: {}", e);
            false
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::LogBuffer;
    use super::*;
    use crate::error::Error;
    use crate::settings::MemorySettingsStore;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    struct FailingStore;

    impl SettingsStore for FailingStore {
        fn get_setting(
            &self,
            _scope: SettingsScope,
            _plugin: &str,
        ) -> Result<Option<serde_json::Value>> {
            Err(Error::NoSettingsDir)
        }

        fn save_setting(
            &self,
            _scope: SettingsScope,
            _plugin: &str,
            _value: &serde_json::Value,
        ) -> Result<()> {
            Err(Error::NoSettingsDir)
        }
    }

    fn store_with(scope: SettingsScope, value: serde_json::Value) -> MemorySettingsStore {
        MemorySettingsStore::new().with_setting(scope, AWS_PLUGIN_NAME, value)
    }

    #[test]
    fn test_missing_settings_give_noop() {
        let store = MemorySettingsStore::new();
        let factory = Factory::user(&store);

        assert!(!factory.is_configured());
        assert_eq!(factory.scope(), Some(SettingsScope::User));
        assert!(factory.settings().is_none());
    }

    #[test]
    fn test_scopes_are_independent() {
        let store = store_with(SettingsScope::System, json!({"region_name": "eu-west-1"}));

        assert!(!Factory::user(&store).is_configured());

        let system = Factory::system(&store);
        assert!(system.is_configured());
        assert_eq!(system.settings().unwrap().region(), "eu-west-1");
    }

    #[test]
    fn test_invalid_settings_give_noop() {
        let store = store_with(SettingsScope::User, json!({"aws_access_key_id": "AKIA"}));
        assert!(!Factory::user(&store).is_configured());

        let store = store_with(SettingsScope::User, json!({"not_a_field": 1}));
        assert!(!Factory::user(&store).is_configured());
    }

    #[test]
    fn test_empty_settings_give_noop() {
        let logs = LogBuffer::default();
        let _guard = logs.install();

        let store = store_with(SettingsScope::User, json!({}));
        let factory = Factory::user(&store);
        assert!(!factory.is_configured());
        assert!(factory.settings().is_none());

        let store = store_with(SettingsScope::User, serde_json::Value::Null);
        assert!(!Factory::user(&store).is_configured());

        let output = logs.contents();
        assert!(output.contains("No AWS integration plugin found"), "logs: {}", output);
    }

    #[tokio::test]
    async fn test_custom_endpoint_settings_are_configured() {
        let store = store_with(
            SettingsScope::User,
            json!({
                "aws_access_key_id": "minioadmin",
                "aws_secret_access_key": "minioadmin",
                "endpoint_url": "http://127.0.0.1:9000",
            }),
        );
        let factory = Factory::user(&store);
        assert!(factory.is_configured());

        let client = factory.get_client("s3", None).await.unwrap().unwrap();
        assert_eq!(client.session().endpoint_url(), Some("http://127.0.0.1:9000"));
        assert_eq!(
            client.session().strategy(),
            &crate::aws::CredentialStrategy::StaticKeys {
                access_key_id: "minioadmin".to_string()
            }
        );

        let store = store_with(
            SettingsScope::System,
            json!({
                "region_name": "auto",
                "endpoint_url": "https://acct.r2.cloudflarestorage.com",
            }),
        );
        let factory = Factory::system(&store);
        assert!(factory.is_configured());
        let resource = factory.get_resource("s3", None).await.unwrap().unwrap();
        assert_eq!(resource.session().region(), Some("auto"));
    }

    #[test]
    fn test_unknown_profile_warns() {
        let logs = LogBuffer::default();
        let _guard = logs.install();

        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config");
        fs::write(&config, "[default]\n[profile analytics]\n").unwrap();
        let catalog = || ProfileCatalog::from_files(&config, &dir.path().join("credentials"));

        assert!(!warn_if_unknown_profile("analytics", catalog()));
        assert!(warn_if_unknown_profile("missing", catalog()));
        assert!(!warn_if_unknown_profile("any", Err(Error::NoSettingsDir)));

        let output = logs.contents();
        assert!(output.contains("AWS profile 'missing' not found"), "logs: {}", output);
        assert!(!output.contains("'analytics' not found"), "logs: {}", output);
    }

    #[test]
    fn test_store_failure_gives_noop() {
        assert!(!Factory::user(&FailingStore).is_configured());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_noop_returns_none_and_logs() {
        let logs = LogBuffer::default();
        let _guard = logs.install();

        let factory = Factory::user(&MemorySettingsStore::new());

        let client = factory.get_client("s3", None).await.unwrap();
        assert!(client.is_none());

        let resource = factory.get_resource("dynamodb", None).await.unwrap();
        assert!(resource.is_none());

        // Per-call settings do not wake a no-op factory up
        let settings = AwsSettings::default();
        assert!(factory.get_client("s3", Some(&settings)).await.unwrap().is_none());

        assert!(factory.caller_identity(None).await.unwrap().is_none());

        let output = logs.contents();
        assert!(output.contains("No AWS integration plugin found"), "logs: {}", output);
        assert!(output.contains(NOOP_MESSAGE), "logs: {}", output);
        assert!(output.contains("INFO"), "logs: {}", output);
    }

    #[tokio::test]
    async fn test_configured_uses_stored_settings() {
        let store = store_with(
            SettingsScope::User,
            json!({"region_name": "eu-central-1", "endpoint_url": "http://localhost:4566"}),
        );
        let factory = Factory::user(&store);

        let client = factory.get_client("s3", None).await.unwrap().unwrap();
        assert_eq!(client.session().region(), Some("eu-central-1"));
        assert_eq!(client.session().endpoint_url(), Some("http://localhost:4566"));

        let resource = factory.get_resource("s3", None).await.unwrap().unwrap();
        assert_eq!(resource.session().endpoint_url(), Some("http://localhost:4566"));
    }

    #[tokio::test]
    async fn test_per_call_settings_override() {
        let store = store_with(SettingsScope::User, json!({"region_name": "eu-central-1"}));
        let factory = Factory::user(&store);

        let override_settings = AwsSettings {
            region_name: "ap-northeast-1".to_string(),
            credentials_profile_name: "analytics".to_string(),
            ..Default::default()
        };

        let client = factory
            .get_client("sts", Some(&override_settings))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(client.session().region(), Some("ap-northeast-1"));
        assert_eq!(
            client.session().strategy(),
            &crate::aws::CredentialStrategy::Profile("analytics".to_string())
        );

        assert_eq!(factory.settings().unwrap().region(), "eu-central-1");
    }

    #[tokio::test]
    async fn test_resource_error_propagates() {
        let store = store_with(SettingsScope::User, json!({"region_name": "us-east-1"}));
        let factory = Factory::user(&store);

        let result = factory.get_resource("lambda", None).await;
        assert!(matches!(result, Err(Error::ResourceNotAvailable(_))));
    }
}
