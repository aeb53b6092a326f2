use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::audit::{AuditLogger, KmsAuditEntry};
use crate::config::{Config, KmsConfig};
use crate::constants::protocol::{OPERATION_INFO, OPERATION_SIGN_RAW};
use crate::constants::MANAGER_TYPE;
use crate::errors::SecretsError;
use crate::keystore::{FileKeyStore, LocalKeyStore};
use crate::kms::{
    decode_info_response, decode_sign_response, encode_info_request, encode_sign_request,
    CanonicalSignature, HttpSigningClient, RemoteSigningClient, SignatureCompat,
};
use crate::secrets::{Backend, Operation, SecretInfo, SecretName};

/// Secrets manager facade: the validator key lives in the KMS, everything
/// else in the local store. Routing follows [`SecretName::capability`].
///
/// Holds no per-call state, so one instance can serve concurrent callers.
pub struct SecretRouter {
    server_url: String,
    key_id: String,
    compat: SignatureCompat,
    remote: Arc<dyn RemoteSigningClient>,
    local: Option<Arc<dyn LocalKeyStore>>,
    audit_logger: Option<Arc<AuditLogger>>,
}

impl SecretRouter {
    /// Create a router over the given backends; `config` is validated first
    pub fn new(
        config: &KmsConfig,
        remote: Arc<dyn RemoteSigningClient>,
        local: Arc<dyn LocalKeyStore>,
    ) -> Result<Self, SecretsError> {
        config.validate()?;
        Ok(Self::assemble(config, remote, Some(local)))
    }

    /// Build the HTTP client, file store and optional audit log from a full configuration
    pub fn from_config(config: &Config) -> Result<Self, SecretsError> {
        config.validate()?;

        let passphrase = if config.local_store.encrypted {
            let passphrase = config.local_store.passphrase.clone().ok_or_else(|| {
                SecretsError::Config("Passphrase required for encrypted local store".to_string())
            })?;
            Some(passphrase)
        } else {
            None
        };
        let local = FileKeyStore::new(&config.local_store.dir, &config.kms.name, passphrase)?;

        Self::build(config, Some(Arc::new(local)))
    }

    /// Like [`SecretRouter::from_config`] but without opening the local store,
    /// for callers that only sign or look up the validator identity.
    /// Local secret operations on the result fail with `Config`.
    pub fn remote_from_config(config: &Config) -> Result<Self, SecretsError> {
        config.kms.validate()?;
        Self::build(config, None)
    }

    fn build(
        config: &Config,
        local: Option<Arc<dyn LocalKeyStore>>,
    ) -> Result<Self, SecretsError> {
        let remote = HttpSigningClient::new(config.kms.token.clone(), &config.kms.http_options())?;
        let router = Self::assemble(&config.kms, Arc::new(remote), local);

        if config.audit.enabled {
            info!("📝 Audit logging enabled: {}", config.audit.log_path);
            let logger = AuditLogger::new(&config.audit.log_path)?;
            return Ok(router.with_audit_logger(Arc::new(logger)));
        }

        Ok(router)
    }

    /// `config` must already be validated
    fn assemble(
        config: &KmsConfig,
        remote: Arc<dyn RemoteSigningClient>,
        local: Option<Arc<dyn LocalKeyStore>>,
    ) -> Self {
        info!(
            "KMS secrets manager for '{}' using {} transport to {}, local store: {}",
            config.name,
            remote.client_type(),
            config.server_url,
            local.as_ref().map_or("not opened", |store| store.store_type())
        );

        Self {
            server_url: config.server_url.clone(),
            key_id: config.name.clone(),
            compat: config.signature_compat,
            remote,
            local,
            audit_logger: None,
        }
    }

    pub fn with_audit_logger(mut self, logger: Arc<AuditLogger>) -> Self {
        self.audit_logger = Some(logger);
        self
    }

    pub fn manager_type(&self) -> &'static str {
        MANAGER_TYPE
    }

    /// Node name, used as the KMS key id
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub async fn get_secret(&self, name: SecretName) -> Result<Vec<u8>, SecretsError> {
        self.require_local(name, Operation::Get)?.get(name.as_str()).await
    }

    pub async fn set_secret(&self, name: SecretName, value: &[u8]) -> Result<(), SecretsError> {
        self.require_local(name, Operation::Set)?
            .set(name.as_str(), value)
            .await
    }

    /// The validator key is reported present without asking the KMS; names
    /// this manager does not serve report `false`.
    pub async fn has_secret(&self, name: SecretName) -> bool {
        let capability = name.capability();
        if !capability.allows(Operation::Has) {
            return false;
        }

        match capability.backend {
            Backend::Remote => {
                debug!("Presence of {} assumed; the KMS is not queried", name);
                true
            }
            Backend::Local => match &self.local {
                Some(local) => local.has(name.as_str()).await,
                None => {
                    warn!("Presence of {} unknown; local store not opened", name);
                    false
                }
            },
            Backend::None => false,
        }
    }

    pub async fn remove_secret(&self, name: SecretName) -> Result<(), SecretsError> {
        self.require_local(name, Operation::Remove)?
            .remove(name.as_str())
            .await
    }

    /// Sign `data` with the KMS-held key. There is no other signing backend,
    /// so every name is served by the node's KMS key.
    pub async fn sign_by_secret(
        &self,
        name: SecretName,
        data: &[u8],
    ) -> Result<CanonicalSignature, SecretsError> {
        if name != SecretName::ValidatorKey {
            debug!("Signing request for {} served by the KMS validator key", name);
        }

        let mut entry = KmsAuditEntry::start(OPERATION_SIGN_RAW, &self.key_id, data.len());

        let result = async {
            let body = encode_sign_request(&self.key_id, data)?;
            let response = self.call_remote(body).await?;
            decode_sign_response(&response, self.compat)
        }
        .await;

        match &result {
            Ok(signature) => {
                debug!("KMS signature for '{}': {:?}", self.key_id, signature);
                entry.set_signature(signature);
            }
            Err(e) => {
                warn!("KMS signing for '{}' failed: {}", self.key_id, e);
                entry.set_error(e);
            }
        }
        self.record(entry).await;

        result
    }

    pub async fn get_secret_info(&self, name: SecretName) -> Result<SecretInfo, SecretsError> {
        name.capability().check(name, Operation::Info)?;

        let mut entry = KmsAuditEntry::start(OPERATION_INFO, &self.key_id, 0);

        let result = async {
            let body = encode_info_request(&self.key_id)?;
            let response = self.call_remote(body).await?;
            decode_info_response(&response)
        }
        .await;

        match &result {
            Ok(info) => {
                info!("KMS identity for '{}': address {}", self.key_id, info.address);
                entry.set_info(info);
            }
            Err(e) => {
                warn!("KMS info lookup for '{}' failed: {}", self.key_id, e);
                entry.set_error(e);
            }
        }
        self.record(entry).await;

        result
    }

    fn require_local(
        &self,
        name: SecretName,
        operation: Operation,
    ) -> Result<&Arc<dyn LocalKeyStore>, SecretsError> {
        match name.capability().check(name, operation)? {
            Backend::Local => self.local.as_ref().ok_or_else(|| {
                SecretsError::Config(format!(
                    "local store not opened; cannot {} {}",
                    operation.as_str(),
                    name
                ))
            }),
            backend => Err(SecretsError::OperationNotSupported(format!(
                "{} for {} is served by the {:?} backend",
                operation.as_str(),
                name,
                backend
            ))),
        }
    }

    async fn call_remote(&self, body: Vec<u8>) -> Result<Vec<u8>, SecretsError> {
        debug!("KMS request: {}", String::from_utf8_lossy(&body));
        self.remote.post(&self.server_url, body).await
    }

    async fn record(&self, mut entry: KmsAuditEntry) {
        if let Some(logger) = &self.audit_logger {
            if let Err(e) = logger.log(&mut entry).await {
                warn!("Failed to write audit entry: {}", e);
            }
        }
    }
}
