use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use kms_secrets_manager::cli::commands;
use kms_secrets_manager::utils::{obtain_passphrase, prompt_for_new_passphrase};
use kms_secrets_manager::{Cli, Commands, Config, SecretCommands, SecretRouter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.global)?;

    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(config.logging.level.as_str())
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting KMS secrets manager v{}", env!("CARGO_PKG_VERSION"));

    let needs_local_store = matches!(cli.command, Commands::Secret { .. });

    if config.local_store.encrypted && needs_local_store {
        let configured = config.local_store.passphrase.take();
        let passphrase = match (&cli.command, configured) {
            (
                Commands::Secret {
                    command: SecretCommands::Set { .. },
                },
                None,
            ) => prompt_for_new_passphrase("Enter passphrase for local secrets: ")?,
            (_, configured) => {
                obtain_passphrase(configured, "Enter passphrase for local secrets: ")?
            }
        };
        config.local_store.passphrase = Some(passphrase);
    }

    info!("📊 Configuration loaded:");
    info!("  KMS endpoint: {}", config.kms.server_url);
    info!("  Node name: {}", config.kms.name);
    info!("  Signature compat: {}", config.kms.signature_compat.as_str());
    if needs_local_store {
        info!("  Local store: {}", config.local_store.dir);
    }
    if !config.audit.enabled {
        warn!("⚠️  Audit logging disabled");
    }

    let router = if needs_local_store {
        SecretRouter::from_config(&config)?
    } else {
        SecretRouter::remote_from_config(&config)?
    };
    let output = commands::run(&router, cli.command).await?;
    println!("{output}");

    Ok(())
}
