//! AWS Integration CLI
//!
//! Operator tool for the AWS plugin settings: print the schema, inspect and
//! edit stored settings, list local profiles and check the caller identity.

use anyhow::{Context, Result};
use aws_integration::aws::ProfileCatalog;
use aws_integration::settings::AWS_PLUGIN_NAME;
use aws_integration::{
    AwsIntegration, AwsSettings, Factory, FileSettingsStore, SettingsScope, SettingsStore,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "aws-integration", version, about = "Manage AWS plugin settings")]
struct Cli {
    /// Settings scope (user or system); commands that read settings default to user, then system
    #[arg(long, global = true)]
    scope: Option<SettingsScope>,

    /// Root directory of the settings store
    #[arg(long, global = true, env = "AWS_INTEGRATION_SETTINGS_DIR")]
    settings_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the settings schema as JSON
    Schema,
    /// Print stored settings (secret masked)
    Show,
    /// Update stored settings
    Set(SetArgs),
    /// List profiles from the shared AWS files
    Profiles,
    /// Look up the caller identity with the configured credentials
    Whoami {
        /// Store the returned ARN as caller_identity
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args)]
struct SetArgs {
    #[arg(long)]
    access_key_id: Option<String>,
    #[arg(long)]
    secret_access_key: Option<String>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    profile: Option<String>,
    #[arg(long)]
    endpoint_url: Option<String>,
    #[arg(long)]
    iam_role_assigned: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let store = match &cli.settings_dir {
        Some(dir) => FileSettingsStore::new(dir),
        None => FileSettingsStore::platform_default()?,
    };
    tracing::debug!("Using settings store at {:?}", store.root());

    match cli.command {
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&AwsSettings::schema())?);
        }
        Command::Show => {
            let scope = cli.scope.unwrap_or(SettingsScope::User);
            match load(&store, scope)? {
                Some(settings) => {
                    println!("{}", serde_json::to_string_pretty(&masked(&settings))?);
                    match settings.validate() {
                        Ok(()) => eprintln!("{} settings are valid", scope),
                        Err(e) => eprintln!("{} settings are invalid: {}", scope, e),
                    }
                }
                None => eprintln!("No {} settings stored for '{}'", scope, AWS_PLUGIN_NAME),
            }
        }
        Command::Set(args) => {
            let scope = cli.scope.unwrap_or(SettingsScope::User);
            let mut settings = load(&store, scope)?.unwrap_or_default();
            apply(&mut settings, args);
            settings.validate().context("Refusing to store invalid settings")?;
            store.save_setting(scope, AWS_PLUGIN_NAME, &serde_json::to_value(&settings)?)?;
            eprintln!(
                "Saved {} settings to {:?}",
                scope,
                store.settings_path(scope, AWS_PLUGIN_NAME)
            );
        }
        Command::Profiles => {
            let catalog = ProfileCatalog::load()?;
            for name in catalog.names() {
                println!("{}", name);
            }
        }
        Command::Whoami { save } => {
            let aws = match cli.scope {
                Some(scope) => AwsIntegration::with_factory(Factory::for_scope(&store, scope)),
                None => AwsIntegration::new(&store),
            };

            let Some(arn) = aws.caller_identity(None).await? else {
                anyhow::bail!("AWS integration is not configured");
            };
            println!("{}", arn);

            if save {
                // A configured factory always knows its scope and settings
                let scope = aws.factory().scope().context("No settings scope in use")?;
                let mut settings = aws.factory().settings().cloned().context("No stored settings")?;
                settings.caller_identity = arn;
                store.save_setting(scope, AWS_PLUGIN_NAME, &serde_json::to_value(&settings)?)?;
                eprintln!("Stored caller identity in {} settings", scope);
            }
        }
    }

    Ok(())
}

/// Stored settings parsed without validation, so broken ones can be inspected and fixed
fn load(store: &FileSettingsStore, scope: SettingsScope) -> Result<Option<AwsSettings>> {
    let Some(value) = store.get_setting(scope, AWS_PLUGIN_NAME)? else {
        return Ok(None);
    };
    let settings = serde_json::from_value(value)
        .with_context(|| format!("Failed to parse {} settings", scope))?;
    Ok(Some(settings))
}

fn masked(settings: &AwsSettings) -> AwsSettings {
    let mut copy = settings.clone();
    if !copy.aws_secret_access_key.is_empty() {
        copy.aws_secret_access_key = "***".to_string();
    }
    copy
}

fn apply(settings: &mut AwsSettings, args: SetArgs) {
    if let Some(v) = args.access_key_id {
        settings.aws_access_key_id = v.trim().to_string();
    }
    if let Some(v) = args.secret_access_key {
        settings.aws_secret_access_key = v.trim().to_string();
    }
    if let Some(v) = args.region {
        settings.region_name = v.trim().to_string();
    }
    if let Some(v) = args.profile {
        settings.credentials_profile_name = v.trim().to_string();
    }
    if let Some(v) = args.endpoint_url {
        settings.endpoint_url = v.trim().to_string();
    }
    if let Some(v) = args.iam_role_assigned {
        settings.iam_role_assigned = v;
    }
}
