use josekit::jwe::{JweHeader, PBES2_HS256_A128KW};

use crate::errors::SecretsError;

/// Seal a secret as a compact JWE: PBES2-HS256+A128KW key wrapping, A256GCM content
pub fn encrypt_secret(secret: &[u8], passphrase: &str) -> Result<String, SecretsError> {
    let mut header = JweHeader::new();
    header.set_algorithm("PBES2-HS256+A128KW");
    header.set_content_encryption("A256GCM");
    header.set_content_type("application/octet-stream");

    let encrypter = PBES2_HS256_A128KW
        .encrypter_from_bytes(passphrase.as_bytes())
        .map_err(|e| SecretsError::Crypto(format!("Failed to create encrypter: {e}")))?;

    josekit::jwe::serialize_compact(secret, &header, &encrypter)
        .map_err(|e| SecretsError::Crypto(format!("Encryption failed: {e}")))
}

/// Open a compact JWE produced by [`encrypt_secret`]
pub fn decrypt_secret(jwe_token: &str, passphrase: &str) -> Result<Vec<u8>, SecretsError> {
    let decrypter = PBES2_HS256_A128KW
        .decrypter_from_bytes(passphrase.as_bytes())
        .map_err(|e| SecretsError::Crypto(format!("Failed to create decrypter: {e}")))?;

    let (secret, _header) = josekit::jwe::deserialize_compact(jwe_token.trim(), &decrypter)
        .map_err(|e| SecretsError::Crypto(format!("Decryption failed: {e}")))?;

    Ok(secret)
}
