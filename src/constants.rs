use std::time::Duration;

/// Backend identity reported by the secrets manager
pub const MANAGER_TYPE: &str = "aws-kms";

/// KMS wire protocol constants
pub mod protocol {
    /// Operation name for raw signing
    pub const OPERATION_SIGN_RAW: &str = "sign_raw";

    /// Operation name for identity lookup
    pub const OPERATION_INFO: &str = "info";

    /// Response code signalling success
    pub const CODE_SUCCESS: i64 = 0;

    /// Prefix carried by hex encoded big integers
    pub const HEX_PREFIX: &str = "0x";

    /// Width of R and S in the canonical encoding
    pub const SCALAR_SIZE: usize = 32;

    /// R || S || V
    pub const SIGNATURE_SIZE: usize = 2 * SCALAR_SIZE + 1;
}

/// HTTP client defaults
pub mod http {
    use super::Duration;

    pub const MAX_IDLE_CONNECTIONS: usize = 10;

    pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Local store layout
pub mod local {
    /// Extension of secret files
    pub const SECRET_FILE_EXTENSION: &str = "key";

    /// Default directory for local secrets
    pub const DEFAULT_DIR: &str = "./secrets";
}
