use anyhow::Result;
use tracing::{info, warn};

use super::{Commands, SecretCommands, SignArgs};
use crate::router::SecretRouter;
use crate::secrets::SecretName;

/// Execute a command against the router and return what should be printed
pub async fn run(router: &SecretRouter, command: Commands) -> Result<String> {
    match command {
        Commands::Info => info(router).await,
        Commands::Sign(args) => sign(router, args).await,
        Commands::Secret { command } => secret(router, command).await,
    }
}

async fn info(router: &SecretRouter) -> Result<String> {
    let info = router.get_secret_info(SecretName::ValidatorKey).await?;
    let output = serde_json::json!({
        "manager_type": router.manager_type(),
        "key_id": router.key_id(),
        "address": info.address,
        "pubkey": info.pubkey,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

async fn sign(router: &SecretRouter, args: SignArgs) -> Result<String> {
    let payload = match (args.message, args.hex) {
        (Some(message), _) => message.into_bytes(),
        (None, Some(hex)) => decode_hex_arg(&hex)?,
        (None, None) => return Err(anyhow::anyhow!("Either --message or --hex is required")),
    };

    info!("✍️  Signing {} bytes for '{}'", payload.len(), router.key_id());
    let signature = router.sign_by_secret(args.secret, &payload).await?;
    Ok(signature.to_hex())
}

async fn secret(router: &SecretRouter, command: SecretCommands) -> Result<String> {
    match command {
        SecretCommands::Get { name } => {
            let value = router.get_secret(name).await?;
            Ok(format!("0x{}", hex::encode(value)))
        }
        SecretCommands::Set { name, value } => {
            let value = decode_hex_arg(&value)?;
            router.set_secret(name, &value).await?;
            Ok(format!("✅ Secret '{name}' stored"))
        }
        SecretCommands::Has { name } => Ok(router.has_secret(name).await.to_string()),
        SecretCommands::Remove { name, confirm } => {
            if !confirm {
                warn!("❌ Secret removal requires --confirm flag for safety");
                return Err(anyhow::anyhow!(
                    "Refusing to remove '{name}' without --confirm"
                ));
            }
            router.remove_secret(name).await?;
            Ok(format!("🗑️  Secret '{name}' removed"))
        }
    }
}

fn decode_hex_arg(value: &str) -> Result<Vec<u8>> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    hex::decode(digits).map_err(|e| anyhow::anyhow!("Invalid hex value: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KmsConfig;
    use crate::keystore::FileKeyStore;
    use crate::kms::{HttpClientOptions, HttpSigningClient};
    use crate::utils::SecretString;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn local_router(temp_dir: &TempDir) -> SecretRouter {
        let config = KmsConfig {
            server_url: "http://127.0.0.1:1/".to_string(),
            token: "token".into(),
            name: "node1".to_string(),
            ..KmsConfig::default()
        };
        let remote =
            HttpSigningClient::new(SecretString::from("token"), &HttpClientOptions::default())
                .unwrap();
        let local = FileKeyStore::new(temp_dir.path(), "node1", None).unwrap();
        SecretRouter::new(&config, Arc::new(remote), Arc::new(local)).unwrap()
    }

    #[test]
    fn test_decode_hex_arg() {
        assert_eq!(decode_hex_arg("0xdead").unwrap(), vec![0xde, 0xad]);
        assert_eq!(decode_hex_arg("beef").unwrap(), vec![0xbe, 0xef]);
        assert!(decode_hex_arg("0xzz").is_err());
    }

    #[tokio::test]
    async fn test_secret_commands() {
        let temp_dir = TempDir::new().unwrap();
        let router = local_router(&temp_dir);

        let out = secret(
            &router,
            SecretCommands::Set {
                name: SecretName::NetworkKey,
                value: "0x0102".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(out.contains("network-key"));

        let out = secret(&router, SecretCommands::Get { name: SecretName::NetworkKey })
            .await
            .unwrap();
        assert_eq!(out, "0x0102");

        let out = secret(&router, SecretCommands::Has { name: SecretName::ValidatorKey })
            .await
            .unwrap();
        assert_eq!(out, "true");
    }

    #[tokio::test]
    async fn test_remove_requires_confirm() {
        let temp_dir = TempDir::new().unwrap();
        let router = local_router(&temp_dir);
        router.set_secret(SecretName::NetworkKey, b"k").await.unwrap();

        let remove = |confirm| SecretCommands::Remove {
            name: SecretName::NetworkKey,
            confirm,
        };
        assert!(secret(&router, remove(false)).await.is_err());
        assert!(router.has_secret(SecretName::NetworkKey).await);

        secret(&router, remove(true)).await.unwrap();
        assert!(!router.has_secret(SecretName::NetworkKey).await);
    }

    #[tokio::test]
    async fn test_validator_get_fails() {
        let temp_dir = TempDir::new().unwrap();
        let router = local_router(&temp_dir);

        let err = secret(&router, SecretCommands::Get { name: SecretName::ValidatorKey })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Operation not supported"));
    }
}
