use k256::ecdsa::{RecoveryId, Signature};
use k256::FieldBytes;
use std::fmt;

use crate::constants::protocol::{SCALAR_SIZE, SIGNATURE_SIZE};
use crate::errors::SecretsError;

/// Recoverable secp256k1 signature in the chain's fixed layout
#[derive(Clone, PartialEq, Eq)]
pub struct CanonicalSignature {
    r: [u8; SCALAR_SIZE],
    s: [u8; SCALAR_SIZE],
    v: u8,
}

impl CanonicalSignature {
    /// Build a signature, rejecting values the chain would refuse to verify.
    ///
    /// R and S must be non-zero and below the curve order; V must be a
    /// recovery id of 0 or 1.
    pub fn new(r: [u8; SCALAR_SIZE], s: [u8; SCALAR_SIZE], v: u8) -> Result<Self, SecretsError> {
        Signature::from_scalars(FieldBytes::clone_from_slice(&r), FieldBytes::clone_from_slice(&s))
            .map_err(|_| {
                SecretsError::Encoding("R or S outside the secp256k1 scalar range".to_string())
            })?;

        let recovery_id = RecoveryId::from_byte(v)
            .filter(|id| !id.is_x_reduced())
            .ok_or_else(|| SecretsError::Encoding(format!("Invalid recovery byte: {v}")))?;

        Ok(Self {
            r,
            s,
            v: recovery_id.to_byte(),
        })
    }

    pub fn r(&self) -> &[u8; SCALAR_SIZE] {
        &self.r
    }

    pub fn s(&self) -> &[u8; SCALAR_SIZE] {
        &self.s
    }

    pub fn v(&self) -> u8 {
        self.v
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_SIZE] {
        let mut out = [0u8; SIGNATURE_SIZE];
        out[..SCALAR_SIZE].copy_from_slice(&self.r);
        out[SCALAR_SIZE..2 * SCALAR_SIZE].copy_from_slice(&self.s);
        out[2 * SCALAR_SIZE] = self.v;
        out
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

impl fmt::Debug for CanonicalSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanonicalSignature")
            .field("r", &format!("0x{}", hex::encode(self.r)))
            .field("s", &format!("0x{}", hex::encode(self.s)))
            .field("v", &self.v)
            .finish()
    }
}

/// Encode `(R, S, V)` into the 65-byte form used for verification
pub fn encode_canonical_signature(
    r: &[u8; SCALAR_SIZE],
    s: &[u8; SCALAR_SIZE],
    v: u8,
) -> Result<Vec<u8>, SecretsError> {
    Ok(CanonicalSignature::new(*r, *s, v)?.to_bytes().to_vec())
}
