//! AWS session building
//!
//! This module turns plugin settings into AWS SDK sessions:
//! - [`builder::SessionBuilder`] - credential strategy selection and session loading
//! - [`service::ServiceHandle`] - named client/resource handles and typed SDK clients
//! - [`profiles::ProfileCatalog`] - named profiles from the shared AWS files

pub mod builder;
pub mod profiles;
pub mod service;

// Re-export commonly used types
pub use builder::{CredentialStrategy, Session, SessionBuilder};
pub use profiles::ProfileCatalog;
pub use service::{AwsService, ServiceHandle, ServiceKind, RESOURCE_SERVICES};
