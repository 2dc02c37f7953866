//! # Signing Engine
//!
//! Ed25519 signatures over canonical BLAKE3 digests, applied at two
//! independent layers of the envelope.
//!
//! ## Signature Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       TWO-LAYER SIGNING                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  OUTER layer: whole ShinkaiMessage                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  1. Clone message                                           │       │
//! │  │  2. Clear external_metadata.signature                       │       │
//! │  │  3. digest = BLAKE3(canonical JSON of the clone)            │       │
//! │  │  4. external_metadata.signature = hex(Ed25519(digest))      │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  INNER layer: ShinkaiBody                                              │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  Same algorithm over the body, clearing                     │       │
//! │  │  internal_metadata.signature instead                        │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both layers call the one canonical-hash primitive in
//! [`crate::crypto::hashing`]; keeping a single digest implementation is
//! what stops the two layers drifting into incompatible canonicalization.
//!
//! Signing touches only the target signature field; every other field is
//! bit-identical before and after. Verification recomputes the digest with
//! the signature field cleared and checks it against the stored signature
//! using a caller-supplied public key. It never trusts a key embedded in
//! the message. A well-formed but wrong signature returns `Ok(false)`, a
//! normal outcome callers must branch on explicitly.

use ed25519_dalek::{Signature as Ed25519Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::crypto::hashing::canonical_hash_bytes;
use crate::error::{Error, Result};
use crate::messaging::message::{ShinkaiBody, ShinkaiMessage};

/// Size of an Ed25519 signature in bytes
pub const SIGNATURE_SIZE: usize = 64;

// ============================================================================
// OUTER LAYER
// ============================================================================

/// Sign the outer layer of a message
///
/// Returns a new message whose `external_metadata.signature` holds the
/// hex-encoded signature; the input is untouched.
pub fn sign_outer_layer(
    secret_key: &SigningKey,
    message: &ShinkaiMessage,
) -> Result<ShinkaiMessage> {
    let mut signed = message.clone();
    signed.external_metadata.signature = String::new();

    let digest = canonical_hash_bytes(&signed)?;
    let signature = secret_key.sign(&digest);
    signed.external_metadata.signature = hex::encode(signature.to_bytes());

    Ok(signed)
}

/// Verify the outer-layer signature of a message
///
/// `Ok(false)` means a well-formed signature that does not verify under
/// the supplied key, or a message mutated after signing.
pub fn verify_outer_layer_signature(
    public_key: &VerifyingKey,
    message: &ShinkaiMessage,
) -> Result<bool> {
    let signature = decode_signature(&message.external_metadata.signature)?;

    let mut unsigned = message.clone();
    unsigned.external_metadata.signature = String::new();
    let digest = canonical_hash_bytes(&unsigned)?;

    Ok(public_key.verify(&digest, &signature).is_ok())
}

// ============================================================================
// INNER LAYER
// ============================================================================

/// Sign the inner layer of a body
///
/// Returns a new body whose `internal_metadata.signature` holds the
/// hex-encoded signature; the input is untouched.
pub fn sign_inner_layer(secret_key: &SigningKey, body: &ShinkaiBody) -> Result<ShinkaiBody> {
    let mut signed = body.clone();
    signed.internal_metadata.signature = String::new();

    let digest = canonical_hash_bytes(&signed)?;
    let signature = secret_key.sign(&digest);
    signed.internal_metadata.signature = hex::encode(signature.to_bytes());

    Ok(signed)
}

/// Verify the inner-layer signature of a body
pub fn verify_inner_layer_signature(
    public_key: &VerifyingKey,
    body: &ShinkaiBody,
) -> Result<bool> {
    let signature = decode_signature(&body.internal_metadata.signature)?;

    let mut unsigned = body.clone();
    unsigned.internal_metadata.signature = String::new();
    let digest = canonical_hash_bytes(&unsigned)?;

    Ok(public_key.verify(&digest, &signature).is_ok())
}

/// Decode a hex signature field, distinguishing absent from malformed
fn decode_signature(hex_signature: &str) -> Result<Ed25519Signature> {
    if hex_signature.is_empty() {
        return Err(Error::MissingSignature);
    }
    let bytes = hex::decode(hex_signature).map_err(|_| Error::MalformedSignature)?;
    let bytes: [u8; SIGNATURE_SIZE] = bytes.try_into().map_err(|_| Error::MalformedSignature)?;
    Ok(Ed25519Signature::from_bytes(&bytes))
}

// ============================================================================
// TESTS
// ============================================================================
