use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::constants::protocol::{
    CODE_SUCCESS, HEX_PREFIX, OPERATION_INFO, OPERATION_SIGN_RAW, SCALAR_SIZE,
};
use crate::errors::SecretsError;
use crate::kms::signature::CanonicalSignature;
use crate::secrets::SecretInfo;

/// How a sign response is turned into `(R, S, V)`.
///
/// `Legacy` reproduces what deployed nodes have been doing: S is read from
/// the `r` field and V is the most significant byte of the 32-bit big-endian
/// encoding of `v` (zero for every small value). `Strict` reads `s` and takes
/// the low byte of `v`, mapping the 27/28 convention onto 0/1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureCompat {
    #[default]
    Strict,
    Legacy,
}

impl SignatureCompat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureCompat::Strict => "strict",
            SignatureCompat::Legacy => "legacy",
        }
    }
}

impl FromStr for SignatureCompat {
    type Err = SecretsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(SignatureCompat::Strict),
            "legacy" => Ok(SignatureCompat::Legacy),
            other => Err(SecretsError::Config(format!(
                "Unknown signature compatibility mode '{other}', expected 'strict' or 'legacy'"
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignRawParams {
    pub kms_key_id: String,
    pub data: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SigningRequest {
    pub operation: String,
    pub sign_raw: SignRawParams,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InfoParams {
    pub kms_key_id: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InfoRequest {
    pub operation: String,
    pub info: InfoParams,
}

/// Envelope shared by every KMS reply
#[derive(Debug, Deserialize)]
pub struct KmsResponse<T> {
    #[serde(default)]
    pub code: i64,
    /// Absent and `null` both read as no message
    #[serde(default)]
    pub msg: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignRawData {
    pub r: String,
    pub s: String,
    pub v: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InfoData {
    pub address: String,
    pub pub_key: String,
}

/// Build the `sign_raw` payload. The message travels as a string, not hex or
/// base64; bytes that are not valid UTF-8 are replaced with U+FFFD.
pub fn encode_sign_request(key_id: &str, data: &[u8]) -> Result<Vec<u8>, SecretsError> {
    let data = match String::from_utf8_lossy(data) {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(text) => {
            warn!(
                "Signing payload of {} bytes is not valid UTF-8; KMS will see a lossy conversion",
                data.len()
            );
            text
        }
    };

    let request = SigningRequest {
        operation: OPERATION_SIGN_RAW.to_string(),
        sign_raw: SignRawParams {
            kms_key_id: key_id.to_string(),
            data,
        },
    };

    Ok(serde_json::to_vec(&request)?)
}

pub fn encode_info_request(key_id: &str) -> Result<Vec<u8>, SecretsError> {
    let request = InfoRequest {
        operation: OPERATION_INFO.to_string(),
        info: InfoParams {
            kms_key_id: key_id.to_string(),
        },
    };

    Ok(serde_json::to_vec(&request)?)
}

pub fn decode_sign_response(
    body: &[u8],
    compat: SignatureCompat,
) -> Result<CanonicalSignature, SecretsError> {
    let data = unwrap_envelope::<SignRawData>(body, OPERATION_SIGN_RAW)?;

    let r = parse_hex_scalar("r", &data.r)?;
    let s = match compat {
        SignatureCompat::Strict => parse_hex_scalar("s", &data.s)?,
        SignatureCompat::Legacy => r,
    };
    let v = recovery_byte(data.v, compat);

    debug!(
        "Decoded KMS signature (compat: {}, raw v: {}, recovery byte: {})",
        compat.as_str(),
        data.v,
        v
    );

    CanonicalSignature::new(r, s, v)
}

pub fn decode_info_response(body: &[u8]) -> Result<SecretInfo, SecretsError> {
    let data = unwrap_envelope::<InfoData>(body, OPERATION_INFO)?;

    Ok(SecretInfo {
        pubkey: data.pub_key,
        address: data.address,
    })
}

/// Parse the envelope and hand back `data`, failing on a non-zero code
fn unwrap_envelope<T>(body: &[u8], operation: &str) -> Result<T, SecretsError>
where
    T: for<'de> Deserialize<'de>,
{
    let response: KmsResponse<T> = serde_json::from_slice(body)?;

    if response.code != CODE_SUCCESS {
        return Err(SecretsError::RemoteSigning(response.msg.unwrap_or_default()));
    }

    response.data.ok_or_else(|| {
        SecretsError::Encoding(format!("{operation} response is missing its data field"))
    })
}

/// Parse a `0x`-prefixed big-endian hex integer into a 32-byte scalar
pub(crate) fn parse_hex_scalar(field: &str, value: &str) -> Result<[u8; SCALAR_SIZE], SecretsError> {
    let digits = value
        .strip_prefix(HEX_PREFIX)
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| {
            SecretsError::Encoding(format!("{field} is not a 0x-prefixed hex string: '{value}'"))
        })?;

    if digits.is_empty() {
        return Err(SecretsError::Encoding(format!("{field} has no hex digits")));
    }

    let significant = digits.trim_start_matches('0');
    if significant.len() > 2 * SCALAR_SIZE {
        return Err(SecretsError::Encoding(format!(
            "{field} does not fit in {SCALAR_SIZE} bytes"
        )));
    }

    let padded = format!("{:0>width$}", significant, width = 2 * SCALAR_SIZE);
    let bytes = hex::decode(padded)
        .map_err(|e| SecretsError::Encoding(format!("{field} is not valid hex: {e}")))?;

    let mut scalar = [0u8; SCALAR_SIZE];
    scalar.copy_from_slice(&bytes);
    Ok(scalar)
}

fn recovery_byte(v: i64, compat: SignatureCompat) -> u8 {
    // v travels as a JSON int; both modes look at its 32-bit big-endian form
    let encoded = (v as i32).to_be_bytes();
    match compat {
        SignatureCompat::Legacy => encoded[0],
        SignatureCompat::Strict => match encoded[3] {
            27 | 28 => encoded[3] - 27,
            low => low,
        },
    }
}
