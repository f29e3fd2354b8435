//! AWS Integration Library
//!
//! Hands AWS SDK clients to chat-assistant plugins. Credentials and region come
//! from the AWS plugin's user-level or system-level settings.
//!
//! ```no_run
//! # async fn demo() -> aws_integration::Result<()> {
//! use aws_integration::{AwsIntegration, FileSettingsStore};
//!
//! let store = FileSettingsStore::platform_default()?;
//! let aws = AwsIntegration::new(&store);
//! if let Some(handle) = aws.get_client("s3", None).await? {
//!     let s3: aws_sdk_s3::Client = handle.sdk_client()?;
//!     let _ = s3.list_buckets().send().await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod aws;
pub mod error;
pub mod facade;
pub mod factory;
pub mod settings;

pub use error::{Error, Result, ValidationError};
pub use facade::AwsIntegration;
pub use factory::Factory;
pub use settings::{
    AwsSettings, FileSettingsStore, MemorySettingsStore, SettingsScope, SettingsStore,
};
