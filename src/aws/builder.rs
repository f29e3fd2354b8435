//! Session builder
//!
//! Picks exactly one credential source, in this order:
//! 1. IAM role assigned to the environment (ambient credentials)
//! 2. Named profile from the shared AWS files
//! 3. Explicit access key pair
//! 4. The SDK default chain (environment, shared files, instance metadata)
//!
//! Region and endpoint override are set on the session, so clients and
//! resources built from it see the same values. Nothing is cached: every
//! build loads a fresh session.

use crate::aws::service::{AwsService, ServiceHandle};
use crate::error::{Error, Result};
use crate::settings::{AwsSettings, DEFAULT_REGION};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use tracing::{debug, info};

/// Provider name attached to static credentials
const STATIC_PROVIDER_NAME: &str = "aws-integration-settings";

/// Credential source chosen for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStrategy {
    IamRole,
    Profile(String),
    /// Only the key ID is kept here; the secret stays in the builder
    StaticKeys { access_key_id: String },
    Default,
}

impl CredentialStrategy {
    /// First match wins: IAM role, profile, key pair, SDK default
    pub fn resolve(
        iam_role_assigned: bool,
        profile_name: Option<&str>,
        key_pair: Option<(&str, &str)>,
    ) -> Self {
        if iam_role_assigned {
            return CredentialStrategy::IamRole;
        }

        if let Some(profile) = profile_name.filter(|p| !p.is_empty()) {
            return CredentialStrategy::Profile(profile.to_string());
        }

        match key_pair {
            Some((id, secret)) if !id.is_empty() && !secret.is_empty() => {
                CredentialStrategy::StaticKeys {
                    access_key_id: id.to_string(),
                }
            }
            _ => CredentialStrategy::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialStrategy::IamRole => "IAM Role",
            CredentialStrategy::Profile(_) => "Profile",
            CredentialStrategy::StaticKeys { .. } => "Static Credentials",
            CredentialStrategy::Default => "Default",
        }
    }
}

/// A loaded AWS SDK config together with the strategy that produced it
#[derive(Debug, Clone)]
pub struct Session {
    config: SdkConfig,
    strategy: CredentialStrategy,
}

impl Session {
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn strategy(&self) -> &CredentialStrategy {
        &self.strategy
    }

    pub fn region(&self) -> Option<&str> {
        self.config.region().map(|r| r.as_ref())
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.config.endpoint_url()
    }

    /// Build any typed SDK client from this session
    pub fn client<C: AwsService>(&self) -> C {
        C::from_sdk_config(&self.config)
    }

    /// ARN of the principal behind this session's credentials
    pub async fn caller_identity(&self) -> Result<String> {
        let client = aws_sdk_sts::Client::new(&self.config);

        let response = client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| Error::Sts(Box::new(aws_sdk_sts::Error::from(e))))?;

        debug!(
            "Caller identity: account={:?}, user_id={:?}",
            response.account(),
            response.user_id()
        );

        response
            .arn()
            .map(|arn| arn.to_string())
            .ok_or(Error::MissingCallerArn)
    }
}

/// Collects connection parameters and builds sessions, clients and resources
#[derive(Clone, Default)]
pub struct SessionBuilder {
    region_name: String,
    service_name: Option<String>,
    profile_name: Option<String>,
    aws_access_key_id: Option<String>,
    aws_secret_access_key: Option<String>,
    endpoint_url: Option<String>,
    iam_role_assigned: bool,
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("region_name", &self.region_name)
            .field("service_name", &self.service_name)
            .field("profile_name", &self.profile_name)
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("endpoint_url", &self.endpoint_url)
            .field("iam_role_assigned", &self.iam_role_assigned)
            .finish_non_exhaustive()
    }
}

impl SessionBuilder {
    pub fn new(region_name: impl Into<String>) -> Self {
        Self {
            region_name: region_name.into(),
            ..Default::default()
        }
    }

    /// Builder carrying everything a settings object configures
    pub fn from_settings(settings: &AwsSettings) -> Self {
        let mut builder =
            Self::new(settings.region()).iam_role_assigned(settings.iam_role_assigned);

        if let Some(profile) = settings.profile_name() {
            builder.set_profile_name(profile);
        }
        if let Some((id, secret)) = settings.key_pair() {
            builder.set_credentials(id, secret);
        }
        if let Some(endpoint) = settings.endpoint_url() {
            builder.set_endpoint_url(endpoint);
        }

        builder
    }

    /// Fix the service name; it then wins over the name passed to `build_*`
    pub fn service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    pub fn iam_role_assigned(mut self, assigned: bool) -> Self {
        self.iam_role_assigned = assigned;
        self
    }

    pub fn set_profile_name(&mut self, profile_name: &str) {
        self.profile_name = Some(profile_name.to_string());
    }

    pub fn set_credentials(&mut self, aws_access_key_id: &str, aws_secret_access_key: &str) {
        self.aws_access_key_id = Some(aws_access_key_id.to_string());
        self.aws_secret_access_key = Some(aws_secret_access_key.to_string());
    }

    pub fn set_endpoint_url(&mut self, endpoint_url: &str) {
        self.endpoint_url = Some(endpoint_url.to_string());
    }

    fn region(&self) -> &str {
        if self.region_name.is_empty() {
            DEFAULT_REGION
        } else {
            &self.region_name
        }
    }

    pub fn strategy(&self) -> CredentialStrategy {
        let key_pair = match (&self.aws_access_key_id, &self.aws_secret_access_key) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        };
        CredentialStrategy::resolve(self.iam_role_assigned, self.profile_name.as_deref(), key_pair)
    }

    /// Load a new session with the chosen credential source
    pub async fn build_session(&self) -> Session {
        let strategy = self.strategy();
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region().to_string()));

        match &strategy {
            CredentialStrategy::IamRole | CredentialStrategy::Default => {}
            CredentialStrategy::Profile(profile) => {
                loader = loader.profile_name(profile);
            }
            CredentialStrategy::StaticKeys { access_key_id } => {
                let secret = self.aws_secret_access_key.clone().unwrap_or_default();
                loader = loader.credentials_provider(Credentials::new(
                    access_key_id.clone(),
                    secret,
                    None,
                    None,
                    STATIC_PROVIDER_NAME,
                ));
            }
        }

        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let config = loader.load().await;

        info!(
            "Built AWS session: strategy={}, region={}, endpoint={:?}",
            strategy.as_str(),
            self.region(),
            self.endpoint_url
        );

        Session { config, strategy }
    }

    fn effective_service<'a>(&'a self, service_name: &'a str) -> &'a str {
        self.service_name.as_deref().unwrap_or(service_name)
    }

    pub async fn build_client(&self, service_name: &str) -> ServiceHandle {
        let service = self.effective_service(service_name);
        debug!("Building {} client", service);
        ServiceHandle::client(service, self.build_session().await)
    }

    pub async fn build_resource(&self, service_name: &str) -> Result<ServiceHandle> {
        let service = self.effective_service(service_name);
        debug!("Building {} resource", service);
        ServiceHandle::resource(service, self.build_session().await)
    }
}
