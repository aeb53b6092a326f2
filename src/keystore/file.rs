use async_trait::async_trait;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::constants::local::SECRET_FILE_EXTENSION;
use crate::errors::SecretsError;
use crate::keystore::encryption::{decrypt_secret, encrypt_secret};
use crate::keystore::LocalKeyStore;
use crate::utils::SecretString;

/// Directory-backed local store, one file per secret under `<dir>/<namespace>/`.
///
/// Without a passphrase secrets are written as hex text; with one they are
/// sealed as JWE tokens.
#[derive(Debug)]
pub struct FileKeyStore {
    root: PathBuf,
    passphrase: Option<SecretString>,
    write_lock: Mutex<()>,
}

impl FileKeyStore {
    pub fn new(
        dir: impl Into<PathBuf>,
        namespace: &str,
        passphrase: Option<SecretString>,
    ) -> Result<Self, SecretsError> {
        validate_component("namespace", namespace)?;

        Ok(Self {
            root: dir.into().join(namespace),
            passphrase,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_encrypted(&self) -> bool {
        self.passphrase.is_some()
    }

    fn secret_path(&self, name: &str) -> Result<PathBuf, SecretsError> {
        validate_component("secret name", name)?;
        Ok(self.root.join(format!("{name}.{SECRET_FILE_EXTENSION}")))
    }

    fn ensure_directory_exists(&self) -> Result<(), SecretsError> {
        if self.root.exists() {
            return Ok(());
        }

        fs::create_dir_all(&self.root)
            .map_err(|e| SecretsError::LocalStore(format!("Failed to create secrets directory: {e}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.root, fs::Permissions::from_mode(0o700)).map_err(|e| {
                SecretsError::LocalStore(format!("Failed to set directory permissions: {e}"))
            })?;
        }

        info!("Created secrets directory: {}", self.root.display());
        Ok(())
    }

    fn encode(&self, value: &[u8]) -> Result<String, SecretsError> {
        match &self.passphrase {
            Some(passphrase) => encrypt_secret(value, passphrase.expose()),
            None => Ok(hex::encode(value)),
        }
    }

    fn decode(&self, contents: &str) -> Result<Vec<u8>, SecretsError> {
        match &self.passphrase {
            Some(passphrase) => decrypt_secret(contents, passphrase.expose()),
            None => Ok(hex::decode(contents.trim())?),
        }
    }
}

#[async_trait]
impl LocalKeyStore for FileKeyStore {
    async fn get(&self, name: &str) -> Result<Vec<u8>, SecretsError> {
        let path = self.secret_path(name)?;

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SecretsError::SecretNotFound(name.to_string()))
            }
            Err(e) => {
                return Err(SecretsError::LocalStore(format!(
                    "Failed to read secret {name}: {e}"
                )))
            }
        };

        debug!("Read secret '{}' from {}", name, path.display());
        self.decode(&contents)
    }

    async fn set(&self, name: &str, value: &[u8]) -> Result<(), SecretsError> {
        let path = self.secret_path(name)?;
        let contents = self.encode(value)?;

        let _guard = self.write_lock.lock().await;
        self.ensure_directory_exists()?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    SecretsError::LocalStore(format!("Secret {name} already exists"))
                }
                _ => SecretsError::LocalStore(format!("Failed to create secret {name}: {e}")),
            })?;

        file.write_all(contents.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| SecretsError::LocalStore(format!("Failed to write secret {name}: {e}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                SecretsError::LocalStore(format!("Failed to set secret file permissions: {e}"))
            })?;
        }

        info!("Stored secret '{}' in local store", name);
        Ok(())
    }

    async fn has(&self, name: &str) -> bool {
        self.secret_path(name).map(|path| path.is_file()).unwrap_or(false)
    }

    async fn remove(&self, name: &str) -> Result<(), SecretsError> {
        let path = self.secret_path(name)?;

        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Removed secret '{}' from local store", name);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SecretsError::SecretNotFound(name.to_string()))
            }
            Err(e) => Err(SecretsError::LocalStore(format!(
                "Failed to remove secret {name}: {e}"
            ))),
        }
    }

    fn store_type(&self) -> &'static str {
        if self.is_encrypted() {
            "file (encrypted)"
        } else {
            "file"
        }
    }
}

/// Reject names that could escape the store directory
fn validate_component(kind: &str, value: &str) -> Result<(), SecretsError> {
    let valid = !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(SecretsError::LocalStore(format!("Invalid {kind}: '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_plain_set_get_has_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(temp_dir.path(), "node1", None).unwrap();

        assert!(!store.has("network-key").await);
        store.set("network-key", &[0xde, 0xad, 0xbe, 0xef]).await.unwrap();
        assert!(store.has("network-key").await);

        let on_disk = fs::read_to_string(temp_dir.path().join("node1/network-key.key")).unwrap();
        assert_eq!(on_disk, "deadbeef");

        assert_eq!(store.get("network-key").await.unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);

        store.remove("network-key").await.unwrap();
        assert!(!store.has("network-key").await);
    }

    #[tokio::test]
    async fn test_encrypted_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(
            temp_dir.path(),
            "node1",
            Some(SecretString::from("test_password_123")),
        )
        .unwrap();

        store.set("network-key", b"libp2p-secret").await.unwrap();

        let on_disk = fs::read_to_string(store.root().join("network-key.key")).unwrap();
        assert!(!on_disk.contains("libp2p-secret"));
        assert_eq!(store.get("network-key").await.unwrap(), b"libp2p-secret".to_vec());

        let wrong = FileKeyStore::new(
            temp_dir.path(),
            "node1",
            Some(SecretString::from("wrong_password")),
        )
        .unwrap();
        assert!(matches!(
            wrong.get("network-key").await.unwrap_err(),
            SecretsError::Crypto(_)
        ));
    }

    #[tokio::test]
    async fn test_set_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(temp_dir.path(), "node1", None).unwrap();

        store.set("network-key", b"first").await.unwrap();
        let err = store.set("network-key", b"second").await.unwrap_err();

        assert!(matches!(err, SecretsError::LocalStore(ref msg) if msg.contains("already exists")));
        assert_eq!(store.get("network-key").await.unwrap(), b"first".to_vec());
    }

    #[tokio::test]
    async fn test_missing_secret() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(temp_dir.path(), "node1", None).unwrap();

        assert!(matches!(
            store.get("network-key").await.unwrap_err(),
            SecretsError::SecretNotFound(_)
        ));
        assert!(matches!(
            store.remove("network-key").await.unwrap_err(),
            SecretsError::SecretNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let node1 = FileKeyStore::new(temp_dir.path(), "node1", None).unwrap();
        let node2 = FileKeyStore::new(temp_dir.path(), "node2", None).unwrap();

        node1.set("network-key", b"one").await.unwrap();
        assert!(!node2.has("network-key").await);
    }

    #[test]
    fn test_path_traversal_rejected() {
        let temp_dir = TempDir::new().unwrap();
        assert!(FileKeyStore::new(temp_dir.path(), "..", None).is_err());
        assert!(FileKeyStore::new(temp_dir.path(), "a/b", None).is_err());

        let store = FileKeyStore::new(temp_dir.path(), "node1", None).unwrap();
        assert!(store.secret_path("../escape").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_secret_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(temp_dir.path(), "node1", None).unwrap();
        store.set("network-key", b"secret").await.unwrap();

        let mode = fs::metadata(store.root().join("network-key.key"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
