use anyhow::Result;
use rpassword::prompt_password;
use tracing::{info, warn};

use super::SecretString;

/// Use the configured passphrase, or prompt for one on the terminal
pub fn obtain_passphrase(configured: Option<SecretString>, prompt_message: &str) -> Result<SecretString> {
    match configured {
        Some(passphrase) => {
            if passphrase.is_empty() {
                return Err(anyhow::anyhow!("Provided passphrase cannot be empty"));
            }
            warn!("⚠️  Local store passphrase supplied via argument, environment or config file");
            Ok(passphrase)
        }
        None => prompt(prompt_message),
    }
}

/// Prompt twice and require both entries to match
pub fn prompt_for_new_passphrase(prompt_message: &str) -> Result<SecretString> {
    let passphrase = prompt(prompt_message)?;
    let confirmation = SecretString::new(prompt_password("Confirm passphrase: ")?);

    if !passphrase.secure_eq(&confirmation) {
        return Err(anyhow::anyhow!("Passphrases do not match"));
    }

    info!("✅ Passphrase confirmed");
    Ok(passphrase)
}

fn prompt(prompt_message: &str) -> Result<SecretString> {
    let passphrase = SecretString::new(prompt_password(prompt_message)?);

    if passphrase.is_empty() {
        return Err(anyhow::anyhow!("Passphrase cannot be empty"));
    }

    if passphrase.len() < 8 {
        warn!("⚠️  Short passphrase detected. Consider using a longer, more secure passphrase.");
    }

    Ok(passphrase)
}
