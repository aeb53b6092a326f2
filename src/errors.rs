use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecretsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported secret name: {0}")]
    UnsupportedName(String),

    #[error("Operation not supported: {0}")]
    OperationNotSupported(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("KMS returned HTTP status {0}")]
    RemoteStatus(u16),

    #[error("KMS signing error: {0}")]
    RemoteSigning(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    #[error("Local store error: {0}")]
    LocalStore(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for SecretsError {
    fn from(err: serde_json::Error) -> Self {
        SecretsError::Encoding(format!("JSON error: {err}"))
    }
}

impl From<hex::FromHexError> for SecretsError {
    fn from(err: hex::FromHexError) -> Self {
        SecretsError::Encoding(format!("Hex decode error: {err}"))
    }
}

impl From<reqwest::Error> for SecretsError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return SecretsError::RemoteStatus(status.as_u16());
        }
        SecretsError::Transport(err.to_string())
    }
}
