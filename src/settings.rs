//! AWS plugin settings and their persistence
//!
//! Settings are stored per scope (user or system) and per plugin name. The
//! file-backed store keeps them in the platform-specific config folder:
//! - Linux: ~/.config/aws-integration/<scope>/<plugin>.json
//! - Windows: %APPDATA%/aws-integration/<scope>/<plugin>.json
//! - macOS: ~/Library/Application Support/aws-integration/<scope>/<plugin>.json

use crate::error::{Error, Result, ValidationError};
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::RwLock;
use url::Url;

/// Plugin name under which the AWS settings are stored
pub const AWS_PLUGIN_NAME: &str = "aws_integration";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const ACCESS_KEY_ID_LEN: usize = 20;
pub const SECRET_ACCESS_KEY_LEN: usize = 40;

/// Which settings layer a factory reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsScope {
    User,
    System,
}

impl SettingsScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsScope::User => "user",
            SettingsScope::System => "system",
        }
    }
}

impl fmt::Display for SettingsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingsScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(SettingsScope::User),
            "system" => Ok(SettingsScope::System),
            other => Err(format!("unknown settings scope '{}' (expected user or system)", other)),
        }
    }
}

/// AWS connection configuration as edited in the host's settings UI
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwsSettings {
    #[serde(deserialize_with = "trimmed")]
    pub aws_access_key_id: String,

    #[serde(deserialize_with = "trimmed")]
    pub aws_secret_access_key: String,

    #[serde(deserialize_with = "trimmed")]
    pub region_name: String,

    #[serde(deserialize_with = "trimmed")]
    pub credentials_profile_name: String,

    #[serde(deserialize_with = "trimmed")]
    pub endpoint_url: String,

    pub iam_role_assigned: bool,

    /// ARN of the authenticated principal, filled in by an explicit lookup
    #[serde(deserialize_with = "trimmed")]
    pub caller_identity: String,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            aws_access_key_id: String::new(),
            aws_secret_access_key: String::new(),
            region_name: DEFAULT_REGION.to_string(),
            credentials_profile_name: String::new(),
            endpoint_url: String::new(),
            iam_role_assigned: false,
            caller_identity: String::new(),
        }
    }
}

impl fmt::Debug for AwsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.aws_secret_access_key.is_empty() { "" } else { "***" };
        f.debug_struct("AwsSettings")
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &secret)
            .field("region_name", &self.region_name)
            .field("credentials_profile_name", &self.credentials_profile_name)
            .field("endpoint_url", &self.endpoint_url)
            .field("iam_role_assigned", &self.iam_role_assigned)
            .field("caller_identity", &self.caller_identity)
            .finish()
    }
}

fn trimmed<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

impl AwsSettings {
    /// Parse settings as returned by a store and run validation
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let settings: AwsSettings = serde_json::from_value(value)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Region to use, falling back to `us-east-1` when blank
    pub fn region(&self) -> &str {
        if self.region_name.is_empty() {
            DEFAULT_REGION
        } else {
            &self.region_name
        }
    }

    pub fn profile_name(&self) -> Option<&str> {
        non_empty(&self.credentials_profile_name)
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        non_empty(&self.endpoint_url)
    }

    /// Access key ID and secret, only when both are present
    pub fn key_pair(&self) -> Option<(&str, &str)> {
        match (non_empty(&self.aws_access_key_id), non_empty(&self.aws_secret_access_key)) {
            (Some(id), Some(secret)) => Some((id, secret)),
            _ => None,
        }
    }

    /// Check region, endpoint and key pair shape.
    ///
    /// With a custom endpoint (MinIO, R2, LocalStack) only the URL and a
    /// half-filled key pair are checked; region names and key lengths are
    /// whatever that service accepts. Without one, the region must look like
    /// an AWS region and, when the key pair is the credential source (no IAM
    /// role, no profile), keys must have AWS lengths. Settings with no
    /// credential source at all are accepted and use the SDK default chain.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let custom_endpoint = match self.endpoint_url() {
            Some(endpoint) => {
                validate_endpoint(endpoint)?;
                true
            }
            None => false,
        };

        if !custom_endpoint && !is_valid_region(self.region()) {
            return Err(ValidationError::InvalidRegion(self.region_name.clone()));
        }

        if self.iam_role_assigned || self.profile_name().is_some() {
            return Ok(());
        }

        match (
            self.aws_access_key_id.is_empty(),
            self.aws_secret_access_key.is_empty(),
        ) {
            (true, true) => Ok(()),
            (false, false) if custom_endpoint => Ok(()),
            (false, false) => {
                let actual = self.aws_access_key_id.chars().count();
                if actual != ACCESS_KEY_ID_LEN {
                    return Err(ValidationError::AccessKeyLength {
                        expected: ACCESS_KEY_ID_LEN,
                        actual,
                    });
                }
                let actual = self.aws_secret_access_key.chars().count();
                if actual != SECRET_ACCESS_KEY_LEN {
                    return Err(ValidationError::SecretKeyLength {
                        expected: SECRET_ACCESS_KEY_LEN,
                        actual,
                    });
                }
                Ok(())
            }
            _ => Err(ValidationError::IncompleteKeyPair),
        }
    }

    /// Field descriptions for the host's configuration UI
    pub fn schema() -> Vec<FieldSchema> {
        let defaults = AwsSettings::default();
        vec![
            FieldSchema::string(
                "aws_access_key_id",
                &defaults.aws_access_key_id,
                "AWS access key ID for authentication.",
            ),
            FieldSchema::string(
                "aws_secret_access_key",
                &defaults.aws_secret_access_key,
                "AWS secret access key for authentication.",
            )
            .secret(),
            FieldSchema::string(
                "region_name",
                &defaults.region_name,
                "Default AWS region for the client.",
            ),
            FieldSchema::string(
                "credentials_profile_name",
                &defaults.credentials_profile_name,
                "Name of the AWS credentials profile to use.",
            ),
            FieldSchema::string(
                "endpoint_url",
                &defaults.endpoint_url,
                "Custom endpoint URL, if using a non-standard AWS service endpoint.",
            ),
            FieldSchema {
                name: "iam_role_assigned",
                kind: FieldKind::Bool,
                default: serde_json::Value::Bool(defaults.iam_role_assigned),
                description: "Indicates if the required IAM role is assigned.",
                secret: false,
            },
            FieldSchema::string(
                "caller_identity",
                &defaults.caller_identity,
                "Amazon Resource Name (ARN) that uniquely identifies the caller \
                 based on the credentials provided.",
            ),
        ]
    }
}

fn validate_endpoint(endpoint: &str) -> std::result::Result<(), ValidationError> {
    let url = Url::parse(endpoint).map_err(|e| ValidationError::InvalidEndpoint {
        url: endpoint.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    Ok(())
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Offline shape check for region names such as `eu-west-1` or `us-gov-east-1`
pub fn is_valid_region(region: &str) -> bool {
    let parts: Vec<&str> = region.split('-').collect();
    if parts.len() < 3 {
        return false;
    }

    let area = parts[0];
    let number = parts[parts.len() - 1];
    let words = &parts[1..parts.len() - 1];

    area.len() == 2
        && area.chars().all(|c| c.is_ascii_lowercase())
        && !number.is_empty()
        && number.chars().all(|c| c.is_ascii_digit())
        && words
            .iter()
            .all(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_lowercase()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Bool,
}

/// One entry of the settings schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: serde_json::Value,
    pub description: &'static str,
    /// Render as a password field
    pub secret: bool,
}

impl FieldSchema {
    fn string(name: &'static str, default: &str, description: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::String,
            default: serde_json::Value::String(default.to_string()),
            description,
            secret: false,
        }
    }

    fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

/// Plugin settings storage keyed by scope and plugin name
pub trait SettingsStore: Send + Sync {
    /// Stored settings, or `None` when the plugin was never configured
    fn get_setting(&self, scope: SettingsScope, plugin: &str) -> Result<Option<serde_json::Value>>;

    fn save_setting(
        &self,
        scope: SettingsScope,
        plugin: &str,
        value: &serde_json::Value,
    ) -> Result<()>;
}

/// Settings stored as one JSON file per scope and plugin
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    root: PathBuf,
}

impl FileSettingsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted in the platform config directory
    pub fn platform_default() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("org", "github.n-orlov", "aws-integration")
            .ok_or(Error::NoSettingsDir)?;

        Ok(Self::new(proj_dirs.config_dir()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the path to a plugin's settings file
    pub fn settings_path(&self, scope: SettingsScope, plugin: &str) -> PathBuf {
        self.root.join(scope.as_str()).join(format!("{}.json", plugin))
    }
}

impl SettingsStore for FileSettingsStore {
    fn get_setting(&self, scope: SettingsScope, plugin: &str) -> Result<Option<serde_json::Value>> {
        let path = self.settings_path(scope, plugin);

        if !path.exists() {
            tracing::debug!("Settings file {:?} not found", path);
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(|source| Error::ReadSettings {
            path: path.clone(),
            source,
        })?;

        let value = serde_json::from_str(&contents)?;
        tracing::debug!("Loaded {} settings for '{}' from {:?}", scope, plugin, path);

        Ok(Some(value))
    }

    fn save_setting(
        &self,
        scope: SettingsScope,
        plugin: &str,
        value: &serde_json::Value,
    ) -> Result<()> {
        let path = self.settings_path(scope, plugin);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::WriteSettings {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(value)?;

        fs::write(&path, contents).map_err(|source| Error::WriteSettings {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("Saved {} settings for '{}' to {:?}", scope, plugin, path);

        Ok(())
    }
}

/// In-process settings store, for hosts that keep settings elsewhere
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    entries: RwLock<HashMap<(SettingsScope, String), serde_json::Value>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy when wiring a store up front
    pub fn with_setting(
        self,
        scope: SettingsScope,
        plugin: &str,
        value: serde_json::Value,
    ) -> Self {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((scope, plugin.to_string()), value);
        self
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_setting(&self, scope: SettingsScope, plugin: &str) -> Result<Option<serde_json::Value>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(&(scope, plugin.to_string())).cloned())
    }

    fn save_setting(
        &self,
        scope: SettingsScope,
        plugin: &str,
        value: &serde_json::Value,
    ) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((scope, plugin.to_string()), value.clone());
        Ok(())
    }
}
