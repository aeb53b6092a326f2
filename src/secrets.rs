use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::SecretsError;

/// Names of the secrets a validator node asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecretName {
    /// Consensus signing key, held by the KMS
    ValidatorKey,
    /// BLS consensus key; known to the node but not served by this manager
    ValidatorBlsKey,
    /// libp2p transport key, held locally
    NetworkKey,
}

impl SecretName {
    pub const ALL: [SecretName; 3] = [
        SecretName::ValidatorKey,
        SecretName::ValidatorBlsKey,
        SecretName::NetworkKey,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecretName::ValidatorKey => "validator-key",
            SecretName::ValidatorBlsKey => "validator-bls-key",
            SecretName::NetworkKey => "network-key",
        }
    }

    /// Routing entry for this name
    pub fn capability(&self) -> Capability {
        match self {
            SecretName::ValidatorKey => Capability {
                backend: Backend::Remote,
                operations: &[Operation::Has, Operation::Info],
            },
            SecretName::NetworkKey => Capability {
                backend: Backend::Local,
                operations: &[
                    Operation::Get,
                    Operation::Set,
                    Operation::Has,
                    Operation::Remove,
                ],
            },
            SecretName::ValidatorBlsKey => Capability {
                backend: Backend::None,
                operations: &[],
            },
        }
    }
}

impl fmt::Display for SecretName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecretName {
    type Err = SecretsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SecretName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| SecretsError::UnsupportedName(s.to_string()))
    }
}

/// Operations routed through the capability table. Signing is not one of
/// them: every name signs with the KMS key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Set,
    Has,
    Remove,
    Info,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Set => "set",
            Operation::Has => "has",
            Operation::Remove => "remove",
            Operation::Info => "info",
        }
    }
}

/// Where a secret lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Remote KMS signing service
    Remote,
    /// Local key store
    Local,
    /// Not served by this manager
    None,
}

/// Backend plus the operations it permits for one secret name
#[derive(Debug, Clone, Copy)]
pub struct Capability {
    pub backend: Backend,
    pub operations: &'static [Operation],
}

impl Capability {
    pub fn allows(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    /// Resolve the backend for `operation`, or the error the caller should see.
    ///
    /// Names without a backend are `UnsupportedName`; a known backend that
    /// refuses the operation is `OperationNotSupported`.
    pub fn check(&self, name: SecretName, operation: Operation) -> Result<Backend, SecretsError> {
        match self.backend {
            Backend::None => Err(SecretsError::UnsupportedName(format!(
                "{} is not served by this secrets manager",
                name
            ))),
            _ if self.allows(operation) => Ok(self.backend),
            Backend::Remote => Err(SecretsError::OperationNotSupported(format!(
                "aws kms does not support {} for {}",
                operation.as_str(),
                name
            ))),
            Backend::Local => Err(SecretsError::UnsupportedName(format!(
                "{} does not support {}",
                name,
                operation.as_str()
            ))),
        }
    }
}

/// Externally visible identity of the validator key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretInfo {
    pub pubkey: String,
    pub address: String,
}
