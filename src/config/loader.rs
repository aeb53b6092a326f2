use anyhow::Result;
use std::fs;

use super::types::*;
use crate::cli::GlobalArgs;
use crate::errors::SecretsError;

impl Config {
    /// Load configuration from the optional config file, then apply CLI/env overrides
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let config = match &args.config {
            Some(config_path) => Self::load_from_file(config_path)?,
            None => Self::default(),
        };

        Ok(Self::apply_overrides(config, args))
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(config_path: &str) -> Result<Self, SecretsError> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            SecretsError::Config(format!("Failed to read config file {config_path}: {e}"))
        })?;

        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self, SecretsError> {
        toml::from_str(content)
            .map_err(|e| SecretsError::Config(format!("Failed to parse config file: {e}")))
    }

    /// Explicit CLI arguments (or their environment variables) win over the file
    fn apply_overrides(mut config: Self, args: &GlobalArgs) -> Self {
        if let Some(server_url) = &args.server_url {
            config.kms.server_url = server_url.clone();
        }
        if let Some(token) = &args.token {
            config.kms.token = token.as_str().into();
        }
        if let Some(name) = &args.name {
            config.kms.name = name.clone();
        }
        if let Some(timeout) = args.request_timeout {
            config.kms.request_timeout_secs = timeout;
        }
        if let Some(compat) = args.compat {
            config.kms.signature_compat = compat;
        }

        if let Some(dir) = &args.local_dir {
            config.local_store.dir = dir.clone();
        }
        if args.encrypt_local {
            config.local_store.encrypted = true;
        }
        if let Some(passphrase) = &args.passphrase {
            config.local_store.passphrase = Some(passphrase.as_str().into());
        }

        if let Some(log_path) = &args.audit_log {
            config.audit.enabled = true;
            config.audit.log_path = log_path.clone();
        }
        if let Some(level) = &args.log_level {
            config.logging.level = level.clone();
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kms::SignatureCompat;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[kms]
server_url = "https://kms.internal:8443/api"
token = "file-token"
name = "validator-01"
signature_compat = "legacy"

[local_store]
dir = "/var/lib/node/secrets"
encrypted = true

[logging]
level = "debug"
"#;

    #[test]
    fn test_parse_toml() {
        let config = Config::from_toml(SAMPLE).unwrap();

        assert_eq!(config.kms.server_url, "https://kms.internal:8443/api");
        assert_eq!(config.kms.token.expose(), "file-token");
        assert_eq!(config.kms.name, "validator-01");
        assert_eq!(config.kms.signature_compat, SignatureCompat::Legacy);
        assert_eq!(config.kms.request_timeout_secs, 10);
        assert!(config.local_store.encrypted);
        assert!(!config.audit.enabled);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = GlobalArgs::parse_from([
            "kms-secrets",
            "--config",
            &path,
            "--name",
            "validator-02",
            "--compat",
            "strict",
        ]);
        let config = Config::load(&args).unwrap();

        assert_eq!(config.kms.name, "validator-02");
        assert_eq!(config.kms.signature_compat, SignatureCompat::Strict);
        assert_eq!(config.kms.token.expose(), "file-token");
        assert_eq!(config.local_store.dir, "/var/lib/node/secrets");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::load_from_file("/nonexistent/kms.toml").unwrap_err();
        assert!(matches!(err, SecretsError::Config(_)));
    }
}
