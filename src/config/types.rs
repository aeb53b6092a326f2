use serde::Deserialize;
use std::time::Duration;

use crate::constants::http::{IDLE_TIMEOUT, MAX_IDLE_CONNECTIONS, REQUEST_TIMEOUT};
use crate::constants::local::DEFAULT_DIR;
use crate::kms::{HttpClientOptions, SignatureCompat};
use crate::utils::SecretString;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub kms: KmsConfig,
    #[serde(default)]
    pub local_store: LocalStoreConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KmsConfig {
    /// KMS endpoint every request is POSTed to
    pub server_url: String,
    /// Bearer token for the KMS
    pub token: SecretString,
    /// Node name; doubles as the KMS key id and the local store namespace
    pub name: String,
    pub request_timeout_secs: u64,
    pub max_idle_connections: usize,
    pub idle_timeout_secs: u64,
    pub signature_compat: SignatureCompat,
}

impl Default for KmsConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            token: SecretString::default(),
            name: String::new(),
            request_timeout_secs: REQUEST_TIMEOUT.as_secs(),
            max_idle_connections: MAX_IDLE_CONNECTIONS,
            idle_timeout_secs: IDLE_TIMEOUT.as_secs(),
            signature_compat: SignatureCompat::default(),
        }
    }
}

impl KmsConfig {
    pub fn http_options(&self) -> HttpClientOptions {
        HttpClientOptions {
            max_idle_connections: self.max_idle_connections,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalStoreConfig {
    pub dir: String,
    /// Seal local secrets with a passphrase (JWE) instead of plain hex
    pub encrypted: bool,
    pub passphrase: Option<SecretString>,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            dir: DEFAULT_DIR.to_string(),
            encrypted: false,
            passphrase: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    pub log_path: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: "/var/log/kms-secrets/audit.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
