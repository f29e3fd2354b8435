//! Named service handles and typed SDK clients

use crate::aws::builder::Session;
use crate::error::{Error, Result};
use aws_config::SdkConfig;

/// Services that offer the high-level resource interface
pub const RESOURCE_SERVICES: &[&str] = &[
    "cloudformation",
    "cloudwatch",
    "dynamodb",
    "ec2",
    "glacier",
    "iam",
    "s3",
    "sns",
    "sqs",
];

/// An SDK client that can be built from a shared session config
pub trait AwsService: Sized {
    /// Service name as used by `get_client` / `get_resource`
    const SERVICE_NAME: &'static str;

    fn from_sdk_config(config: &SdkConfig) -> Self;
}

impl AwsService for aws_sdk_s3::Client {
    const SERVICE_NAME: &'static str = "s3";

    fn from_sdk_config(config: &SdkConfig) -> Self {
        // Custom endpoints (MinIO, LocalStack) need path-style addressing
        let builder = aws_sdk_s3::config::Builder::from(config)
            .force_path_style(config.endpoint_url().is_some());
        aws_sdk_s3::Client::from_conf(builder.build())
    }
}

impl AwsService for aws_sdk_sts::Client {
    const SERVICE_NAME: &'static str = "sts";

    fn from_sdk_config(config: &SdkConfig) -> Self {
        aws_sdk_sts::Client::new(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Client,
    Resource,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Client => "client",
            ServiceKind::Resource => "resource",
        }
    }
}

/// A session bound to one service, as handed out to other plugins
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    service_name: String,
    kind: ServiceKind,
    session: Session,
}

impl ServiceHandle {
    pub fn client(service_name: &str, session: Session) -> Self {
        Self {
            service_name: service_name.to_string(),
            kind: ServiceKind::Client,
            session,
        }
    }

    pub fn resource(service_name: &str, session: Session) -> Result<Self> {
        ensure_resource_available(service_name)?;
        Ok(Self {
            service_name: service_name.to_string(),
            kind: ServiceKind::Resource,
            session,
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        self.session.sdk_config()
    }

    /// Build the typed SDK client for this handle's service
    pub fn sdk_client<C: AwsService>(&self) -> Result<C> {
        if C::SERVICE_NAME != self.service_name {
            return Err(Error::ServiceMismatch {
                requested: C::SERVICE_NAME.to_string(),
                actual: self.service_name.clone(),
            });
        }
        Ok(self.session.client::<C>())
    }
}

fn ensure_resource_available(service_name: &str) -> Result<()> {
    if RESOURCE_SERVICES.contains(&service_name) {
        Ok(())
    } else {
        Err(Error::ResourceNotAvailable(service_name.to_string()))
    }
}
