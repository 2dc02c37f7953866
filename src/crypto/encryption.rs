//! # Encryption Module
//!
//! ChaCha20-Poly1305 (IETF) authenticated encryption for the two envelope
//! layers and for passphrase-protected exports.
//!
//! ## Encryption Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      MESSAGE ENCRYPTION FLOW                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Step 1: Derive Shared Key (once per sender/recipient pair)            │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  BLAKE3( X25519(self_sk, peer_pk) )  →  key (32 bytes)      │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Step 2: Generate Nonce (unique per encryption)                        │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  Random 12 bytes from CSPRNG                                 │       │
//! │  │  (Never reuse a nonce with the same key!)                   │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Step 3: Encrypt                                                       │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  ChaCha20-Poly1305(key, nonce, plaintext)                   │       │
//! │  │  No associated data.                                        │       │
//! │  │           ↓                                                  │       │
//! │  │  Ciphertext + 16-byte Auth Tag                              │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Framings
//!
//! All three framings share the `"encrypted:"` prefix followed by lowercase
//! hex. The payload layout differs per use case:
//!
//! ```text
//! Body layer:        encrypted: | nonce(12) | ciphertext+tag
//!
//! Data layer:        encrypted: | content_len(8 LE) | schema_len(8 LE)
//!                               | nonce(12) | ciphertext+tag
//!
//! Passphrase export: encrypted: | salt(16) | nonce(12) | ciphertext+tag
//! ```
//!
//! The data layer carries length prefixes because its plaintext is the
//! concatenation `raw_content || schema` which must be split again on
//! decrypt. Only the low 4 bytes of each 8-byte length field are populated;
//! the counterpart node writes a 32-bit value into an 8-byte slot and both
//! sides must match bit-for-bit. The asymmetry between body and data
//! framing is part of the protocol, not an accident here.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::crypto::kdf::{
    derive_passphrase_key, shared_message_key, PASSPHRASE_SALT_SIZE, SYMMETRIC_KEY_SIZE,
};
use crate::crypto::keys::EncryptionKeyPair;
use crate::error::{Error, Result};

/// Size of the ChaCha20-Poly1305 nonce in bytes (96 bits, IETF variant)
pub const NONCE_SIZE: usize = 12;

/// Size of the Poly1305 authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Prefix marking an encrypted content string
pub const ENCRYPTED_PREFIX: &str = "encrypted:";

/// Width of each length field in the data-layer framing
const LENGTH_FIELD_SIZE: usize = 8;

/// Strip the `"encrypted:"` prefix, or fail with `NotEncrypted`
///
/// Consumers must check the prefix before attempting to split or decode a
/// payload; this is the single place that check lives.
pub fn strip_encrypted_prefix(content: &str) -> Result<&str> {
    content
        .strip_prefix(ENCRYPTED_PREFIX)
        .ok_or(Error::NotEncrypted)
}

/// Whether a content string carries the encrypted prefix
pub fn is_content_encrypted(content: &str) -> bool {
    content.starts_with(ENCRYPTED_PREFIX)
}

// ============================================================================
// AEAD CORE
// ============================================================================

fn seal(key: &[u8; SYMMETRIC_KEY_SIZE], nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| Error::EncryptionFailed("AEAD encryption failed".into()))
}

fn open(key: &[u8; SYMMETRIC_KEY_SIZE], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::DecryptionFailed)
}

fn random_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

// ============================================================================
// BODY LAYER
// ============================================================================

/// Encrypt a body-layer plaintext for a recipient
///
/// The plaintext is the JSON serialization of a `ShinkaiBody`. Framing:
/// `"encrypted:" + hex(nonce) + hex(ciphertext)`.
pub fn encrypt_message_body(
    plaintext: &str,
    local: &EncryptionKeyPair,
    peer_public: &[u8; 32],
) -> Result<String> {
    let key = shared_message_key(local, peer_public);
    let nonce = random_nonce();
    let ciphertext = seal(&key, &nonce, plaintext.as_bytes())?;

    Ok(format!(
        "{}{}{}",
        ENCRYPTED_PREFIX,
        hex::encode(nonce),
        hex::encode(ciphertext)
    ))
}

/// Decrypt a body-layer content string back to its plaintext
///
/// Fails with `NotEncrypted` when the prefix is missing and with the opaque
/// `DecryptionFailed` for any tampering, wrong keys, or corrupt framing.
pub fn decrypt_message_body(
    encrypted: &str,
    local: &EncryptionKeyPair,
    peer_public: &[u8; 32],
) -> Result<String> {
    let payload = strip_encrypted_prefix(encrypted)?;
    let raw = hex::decode(payload).map_err(|_| Error::DecryptionFailed)?;
    if raw.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::DecryptionFailed);
    }

    let key = shared_message_key(local, peer_public);
    let (nonce, ciphertext) = raw.split_at(NONCE_SIZE);
    let plaintext = open(&key, nonce, ciphertext)?;

    String::from_utf8(plaintext).map_err(|_| Error::DecryptionFailed)
}

// ============================================================================
// DATA LAYER
// ============================================================================

/// Encrypt a data-layer payload (raw content + schema tag) for a recipient
///
/// The plaintext is `content || schema`; byte lengths of both halves are
/// carried in front of the nonce so the decryptor can split them apart
/// again. Framing: `"encrypted:" + hex(content_len8) + hex(schema_len8) +
/// hex(nonce) + hex(ciphertext)`.
pub fn encrypt_message_data(
    content: &str,
    schema: &str,
    local: &EncryptionKeyPair,
    peer_public: &[u8; 32],
) -> Result<String> {
    if content.len() > u32::MAX as usize || schema.len() > u32::MAX as usize {
        return Err(Error::EncryptionFailed(
            "Data layer payload exceeds the 32-bit length field".into(),
        ));
    }

    let key = shared_message_key(local, peer_public);

    let mut combined = Vec::with_capacity(content.len() + schema.len());
    combined.extend_from_slice(content.as_bytes());
    combined.extend_from_slice(schema.as_bytes());

    // 32-bit length written into an 8-byte little-endian slot; the upper
    // four bytes stay zero on the wire.
    let mut content_len = [0u8; LENGTH_FIELD_SIZE];
    content_len[..4].copy_from_slice(&(content.len() as u32).to_le_bytes());
    let mut schema_len = [0u8; LENGTH_FIELD_SIZE];
    schema_len[..4].copy_from_slice(&(schema.len() as u32).to_le_bytes());

    let nonce = random_nonce();
    let ciphertext = seal(&key, &nonce, &combined)?;

    Ok(format!(
        "{}{}{}{}{}",
        ENCRYPTED_PREFIX,
        hex::encode(content_len),
        hex::encode(schema_len),
        hex::encode(nonce),
        hex::encode(ciphertext)
    ))
}

/// Decrypt a data-layer content string back into `(content, schema)`
pub fn decrypt_message_data(
    encrypted: &str,
    local: &EncryptionKeyPair,
    peer_public: &[u8; 32],
) -> Result<(String, String)> {
    let payload = strip_encrypted_prefix(encrypted)?;
    let raw = hex::decode(payload).map_err(|_| Error::DecryptionFailed)?;
    if raw.len() < 2 * LENGTH_FIELD_SIZE + NONCE_SIZE + TAG_SIZE {
        return Err(Error::DecryptionFailed);
    }

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&raw[..4]);
    let content_len = u32::from_le_bytes(len_bytes) as usize;

    let key = shared_message_key(local, peer_public);
    let remainder = &raw[2 * LENGTH_FIELD_SIZE..];
    let (nonce, ciphertext) = remainder.split_at(NONCE_SIZE);
    let plaintext = open(&key, nonce, ciphertext)?;

    if content_len > plaintext.len() {
        return Err(Error::DecryptionFailed);
    }
    let (content_bytes, schema_bytes) = plaintext.split_at(content_len);

    let content = String::from_utf8(content_bytes.to_vec()).map_err(|_| Error::DecryptionFailed)?;
    let schema = String::from_utf8(schema_bytes.to_vec()).map_err(|_| Error::DecryptionFailed)?;

    Ok((content, schema))
}

// ============================================================================
// PASSPHRASE EXPORTS
// ============================================================================

/// Encrypt a message under a passphrase (exported connection bundles)
///
/// Framing: `"encrypted:" + hex(salt) + hex(nonce) + hex(ciphertext)`.
/// The salt is regenerated per export, so encrypting the same bundle twice
/// yields unrelated ciphertexts.
pub fn encrypt_with_passphrase(message: &str, passphrase: &str) -> Result<String> {
    let mut salt = [0u8; PASSPHRASE_SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    let key = derive_passphrase_key(passphrase, &salt)?;

    let nonce = random_nonce();
    let ciphertext = seal(&key, &nonce, message.as_bytes())?;

    Ok(format!(
        "{}{}{}{}",
        ENCRYPTED_PREFIX,
        hex::encode(salt),
        hex::encode(nonce),
        hex::encode(ciphertext)
    ))
}

/// Decrypt a passphrase-protected export
///
/// A wrong passphrase or corrupted payload surfaces as `DecryptionFailed`;
/// callers present this to end users as "invalid file or passphrase".
pub fn decrypt_with_passphrase(encrypted: &str, passphrase: &str) -> Result<String> {
    let payload = strip_encrypted_prefix(encrypted)?;
    let raw = hex::decode(payload).map_err(|_| Error::DecryptionFailed)?;
    if raw.len() < PASSPHRASE_SALT_SIZE + NONCE_SIZE + TAG_SIZE {
        return Err(Error::DecryptionFailed);
    }

    let mut salt = [0u8; PASSPHRASE_SALT_SIZE];
    salt.copy_from_slice(&raw[..PASSPHRASE_SALT_SIZE]);
    let key = derive_passphrase_key(passphrase, &salt)?;

    let remainder = &raw[PASSPHRASE_SALT_SIZE..];
    let (nonce, ciphertext) = remainder.split_at(NONCE_SIZE);
    let plaintext = open(&key, nonce, ciphertext)?;

    String::from_utf8(plaintext).map_err(|_| Error::DecryptionFailed)
}

// ============================================================================
// TESTS
// ============================================================================
