pub mod audit;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod keystore;
pub mod kms;
pub mod router;
pub mod secrets;
pub mod utils;

pub use config::Config;
pub use errors::SecretsError;
pub use kms::CanonicalSignature;
pub use router::SecretRouter;
pub use secrets::{SecretInfo, SecretName};

// Re-export CLI types for main.rs
pub use cli::*;
