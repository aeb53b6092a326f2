use reqwest::Url;
use tracing::warn;

use super::types::{Config, KmsConfig};
use crate::errors::SecretsError;
use crate::kms::SignatureCompat;

impl Config {
    /// Validate the configuration settings
    pub fn validate(&self) -> Result<(), SecretsError> {
        self.kms.validate()?;

        self.validate_local_store()?;

        self.validate_audit()?;

        Ok(())
    }

    fn validate_local_store(&self) -> Result<(), SecretsError> {
        if self.local_store.dir.trim().is_empty() {
            return Err(SecretsError::Config(
                "Local store directory cannot be empty".to_string(),
            ));
        }

        if !self.local_store.encrypted {
            warn!("⚠️  Local secrets are stored unencrypted in {}", self.local_store.dir);
        }

        Ok(())
    }

    fn validate_audit(&self) -> Result<(), SecretsError> {
        if self.audit.enabled && self.audit.log_path.trim().is_empty() {
            return Err(SecretsError::Config(
                "Audit log path is required when audit logging is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

impl KmsConfig {
    /// Every value the KMS manager needs at construction; each one missing is fatal
    pub fn validate(&self) -> Result<(), SecretsError> {
        if self.token.is_empty() {
            return Err(SecretsError::Config(
                "no token specified for kms secrets manager".to_string(),
            ));
        }

        if self.server_url.trim().is_empty() {
            return Err(SecretsError::Config(
                "no server URL specified for kms secrets manager".to_string(),
            ));
        }

        let url = Url::parse(&self.server_url).map_err(|e| {
            SecretsError::Config(format!("Invalid KMS server URL '{}': {e}", self.server_url))
        })?;
        match url.scheme() {
            "https" => {}
            "http" => {
                warn!("⚠️  SECURITY WARNING: KMS endpoint {} is not using TLS", self.server_url);
            }
            other => {
                return Err(SecretsError::Config(format!(
                    "Unsupported KMS URL scheme '{other}', expected http or https"
                )));
            }
        }

        if self.name.trim().is_empty() {
            return Err(SecretsError::Config(
                "no node name specified for kms secrets manager".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(SecretsError::Config(
                "KMS request timeout must be at least 1 second".to_string(),
            ));
        }

        if self.max_idle_connections == 0 {
            warn!("⚠️  KMS connection pooling disabled (max_idle_connections = 0)");
        }

        if self.signature_compat == SignatureCompat::Legacy {
            warn!("⚠️  Legacy signature compatibility enabled: S is read from the r field");
            warn!("⚠️  and V is the most significant byte of the reported v value");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_kms() -> KmsConfig {
        KmsConfig {
            server_url: "https://kms.example:8443/api".to_string(),
            token: "token".into(),
            name: "node1".to_string(),
            ..KmsConfig::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let config = Config {
            kms: valid_kms(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_token() {
        let kms = KmsConfig {
            token: "".into(),
            ..valid_kms()
        };
        let err = kms.validate().unwrap_err();
        assert!(err.to_string().contains("no token specified"));
    }

    #[test]
    fn test_missing_server_url() {
        let kms = KmsConfig {
            server_url: String::new(),
            ..valid_kms()
        };
        let err = kms.validate().unwrap_err();
        assert!(err.to_string().contains("no server URL specified"));
    }

    #[test]
    fn test_missing_name() {
        let kms = KmsConfig {
            name: " ".to_string(),
            ..valid_kms()
        };
        let err = kms.validate().unwrap_err();
        assert!(err.to_string().contains("no node name specified"));
    }

    #[test]
    fn test_bad_url() {
        for server_url in ["not a url", "ftp://kms.example/api"] {
            let kms = KmsConfig {
                server_url: server_url.to_string(),
                ..valid_kms()
            };
            assert!(matches!(kms.validate().unwrap_err(), SecretsError::Config(_)));
        }
    }

    #[test]
    fn test_zero_timeout() {
        let kms = KmsConfig {
            request_timeout_secs: 0,
            ..valid_kms()
        };
        assert!(kms.validate().is_err());
    }

    #[test]
    fn test_audit_requires_path() {
        let mut config = Config {
            kms: valid_kms(),
            ..Config::default()
        };
        config.audit.enabled = true;
        config.audit.log_path = String::new();
        assert!(config.validate().is_err());
    }
}
