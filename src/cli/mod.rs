use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::kms::SignatureCompat;
use crate::secrets::SecretName;

pub mod commands;

#[derive(Parser)]
#[command(name = "kms-secrets")]
#[command(about = "Validator secrets manager backed by a remote KMS signing service")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection and store settings shared by every command
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file path
    #[arg(short, long, env = "KMS_SECRETS_CONFIG", global = true)]
    pub config: Option<String>,

    /// KMS endpoint URL
    #[arg(long, env = "KMS_SERVER_URL", global = true)]
    pub server_url: Option<String>,

    /// Bearer token for the KMS
    /// Prefer the config file or environment over the command line
    #[arg(long, env = "KMS_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Node name, used as the KMS key id and local store namespace
    #[arg(id = "node_name", long = "name", value_name = "NAME", env = "KMS_NODE_NAME", global = true)]
    pub name: Option<String>,

    /// Per-request deadline in seconds
    #[arg(long, env = "KMS_REQUEST_TIMEOUT", global = true)]
    pub request_timeout: Option<u64>,

    /// Signature decoding mode: "strict" or "legacy"
    #[arg(long, env = "KMS_SIGNATURE_COMPAT", global = true)]
    pub compat: Option<SignatureCompat>,

    /// Directory for locally held secrets
    #[arg(long, env = "KMS_LOCAL_DIR", global = true)]
    pub local_dir: Option<String>,

    /// Encrypt locally held secrets with a passphrase
    #[arg(long, env = "KMS_ENCRYPT_LOCAL", global = true)]
    pub encrypt_local: bool,

    /// Passphrase for the encrypted local store (will be prompted securely if needed)
    /// Setting this via environment variable is NOT recommended for security
    #[arg(long, env = "KMS_LOCAL_PASSPHRASE", global = true, hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Append a JSON audit line for every KMS call to this file
    #[arg(long, env = "KMS_AUDIT_LOG", global = true)]
    pub audit_log: Option<String>,

    /// Log level
    #[arg(long, env = "RUST_LOG", global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the address and public key of the KMS-held validator key
    Info,
    /// Sign a payload with the KMS-held validator key
    Sign(SignArgs),
    /// Manage secrets by name
    Secret {
        #[command(subcommand)]
        command: SecretCommands,
    },
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("payload").required(true).args(["message", "hex"])))]
pub struct SignArgs {
    /// Text payload
    #[arg(long)]
    pub message: Option<String>,

    /// Hex payload (with or without 0x prefix)
    #[arg(long)]
    pub hex: Option<String>,

    /// Secret name the request is made for
    #[arg(long, default_value = "validator-key")]
    pub secret: SecretName,
}

#[derive(Subcommand, Debug)]
pub enum SecretCommands {
    /// Print a secret as hex
    Get { name: SecretName },
    /// Store a new secret (existing secrets are never overwritten)
    Set {
        name: SecretName,

        /// Secret value as hex (with or without 0x prefix)
        #[arg(long)]
        value: String,
    },
    /// Report whether a secret is present
    Has { name: SecretName },
    /// Delete a secret
    Remove {
        name: SecretName,

        /// Confirm deletion
        #[arg(long)]
        confirm: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sign_message() {
        let cli = Cli::parse_from([
            "kms-secrets",
            "--server-url",
            "http://kms.test",
            "sign",
            "--message",
            "hello",
        ]);

        assert_eq!(cli.global.server_url.as_deref(), Some("http://kms.test"));
        match cli.command {
            Commands::Sign(args) => {
                assert_eq!(args.message.as_deref(), Some("hello"));
                assert_eq!(args.secret, SecretName::ValidatorKey);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_sign_requires_exactly_one_payload() {
        assert!(Cli::try_parse_from(["kms-secrets", "sign"]).is_err());
        assert!(
            Cli::try_parse_from(["kms-secrets", "sign", "--message", "a", "--hex", "0x01"]).is_err()
        );
    }

    #[test]
    fn test_parse_secret_commands() {
        let cli = Cli::parse_from(["kms-secrets", "secret", "set", "network-key", "--value", "0xab"]);
        match cli.command {
            Commands::Secret {
                command: SecretCommands::Set { name, value },
            } => {
                assert_eq!(name, SecretName::NetworkKey);
                assert_eq!(value, "0xab");
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["kms-secrets", "secret", "get", "bogus-key"]).is_err());
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::parse_from(["kms-secrets", "info", "--compat", "legacy", "--name", "node7"]);
        assert_eq!(cli.global.compat, Some(SignatureCompat::Legacy));
        assert_eq!(cli.global.name.as_deref(), Some("node7"));
    }
}
