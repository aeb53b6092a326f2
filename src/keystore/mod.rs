use async_trait::async_trait;

use crate::errors::SecretsError;

pub mod encryption;
pub mod file;

pub use file::FileKeyStore;

/// Local storage for secrets that never go to the KMS (network keys and the like)
#[async_trait]
pub trait LocalKeyStore: Send + Sync {
    /// Read a secret; `SecretNotFound` when absent
    async fn get(&self, name: &str) -> Result<Vec<u8>, SecretsError>;

    /// Store a secret; existing secrets are never overwritten
    async fn set(&self, name: &str, value: &[u8]) -> Result<(), SecretsError>;

    async fn has(&self, name: &str) -> bool;

    /// Delete a secret; `SecretNotFound` when absent
    async fn remove(&self, name: &str) -> Result<(), SecretsError>;

    /// Short name of the store, for logs
    fn store_type(&self) -> &'static str;
}
