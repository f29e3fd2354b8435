//! Entry point for other plugins
//!
//! [`AwsIntegration`] hides which factory is active. It prefers user-level
//! settings, falls back to system-level ones and degrades to a no-op factory
//! when neither scope is configured.

use crate::aws::ServiceHandle;
use crate::error::Result;
use crate::factory::Factory;
use crate::settings::{AwsSettings, SettingsStore};

#[derive(Debug, Clone)]
pub struct AwsIntegration {
    factory: Factory,
    settings: Option<AwsSettings>,
}

impl AwsIntegration {
    /// Pick the factory from the store: user scope, then system scope
    pub fn new(store: &dyn SettingsStore) -> Self {
        let factory = match Factory::user(store) {
            Factory::Noop(_) => Factory::system(store),
            configured => configured,
        };
        Self::with_factory(factory)
    }

    pub fn with_factory(factory: Factory) -> Self {
        Self { factory, settings: None }
    }

    /// Default settings for every call made through this facade
    pub fn with_settings(mut self, settings: AwsSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    pub fn settings(&self) -> Option<&AwsSettings> {
        self.settings.as_ref()
    }

    fn effective<'a>(&'a self, settings: Option<&'a AwsSettings>) -> Option<&'a AwsSettings> {
        settings.or(self.settings.as_ref())
    }

    pub async fn get_client(
        &self,
        service_name: &str,
        settings: Option<&AwsSettings>,
    ) -> Result<Option<ServiceHandle>> {
        self.factory.get_client(service_name, self.effective(settings)).await
    }

    pub async fn get_resource(
        &self,
        service_name: &str,
        settings: Option<&AwsSettings>,
    ) -> Result<Option<ServiceHandle>> {
        self.factory.get_resource(service_name, self.effective(settings)).await
    }

    pub async fn caller_identity(&self, settings: Option<&AwsSettings>) -> Result<Option<String>> {
        self.factory.caller_identity(self.effective(settings)).await
    }
}
