//! Client side of the KMS signing protocol.
//!
//! `codec` builds and parses the JSON payloads, `client` moves them over
//! HTTP, and `signature` holds the canonical `R || S || V` encoding that
//! the chain's verification code consumes.

pub mod client;
pub mod codec;
pub mod signature;

pub use client::{HttpClientOptions, HttpSigningClient, RemoteSigningClient};
pub use codec::{
    decode_info_response, decode_sign_response, encode_info_request, encode_sign_request,
    SignatureCompat,
};
pub use signature::{encode_canonical_signature, CanonicalSignature};
