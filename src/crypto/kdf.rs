//! # Key Derivation Functions
//!
//! Two derivations feed the AEAD engine:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      KEY DERIVATION PATHS                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Per-message (body and data layers)                                    │
//! │  ──────────────────────────────────                                     │
//! │                                                                         │
//! │  X25519(self_sk, peer_pk) ──► shared point (32 bytes)                  │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │                         BLAKE3(shared point)                           │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │                     ChaCha20-Poly1305 key (32 bytes)                   │
//! │                                                                         │
//! │  A single BLAKE3 invocation, NOT HKDF. The counterpart node derives    │
//! │  the key exactly this way; both sides must match bit-for-bit.          │
//! │                                                                         │
//! │  Passphrase (exported connection bundles)                              │
//! │  ────────────────────────────────────────                               │
//! │                                                                         │
//! │  Argon2id(passphrase, salt[16]) ──► ChaCha20-Poly1305 key (32 bytes)   │
//! │                                                                         │
//! │  Cost parameters are libsodium's INTERACTIVE tier (64 MiB, 2 passes,   │
//! │  1 lane), which is what the counterpart node uses for bundles.         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::{Algorithm, Argon2, Params, Version};

use crate::crypto::keys::EncryptionKeyPair;
use crate::error::{Error, Result};

/// Size of derived symmetric keys in bytes (256 bits)
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Size of the passphrase KDF salt in bytes
pub const PASSPHRASE_SALT_SIZE: usize = 16;

/// Argon2id memory cost in KiB (64 MiB, libsodium MEMLIMIT_INTERACTIVE)
const ARGON2_MEMORY_KIB: u32 = 65536;

/// Argon2id iteration count (libsodium OPSLIMIT_INTERACTIVE)
const ARGON2_ITERATIONS: u32 = 2;

/// Argon2id lane count (libsodium is single-lane)
const ARGON2_LANES: u32 = 1;

/// Derive the symmetric message key for a sender/recipient pair
///
/// `BLAKE3(X25519(self_sk, peer_pk))`. Both directions of a conversation
/// derive the identical key, so either party can encrypt or decrypt.
pub fn shared_message_key(
    local: &EncryptionKeyPair,
    peer_public: &[u8; 32],
) -> [u8; SYMMETRIC_KEY_SIZE] {
    let shared_point = local.diffie_hellman(peer_public);
    *blake3::hash(&shared_point).as_bytes()
}

/// Derive a symmetric key from a passphrase and salt
///
/// Memory-hard on purpose: these keys protect exported connection bundles
/// that may be attacked offline.
pub fn derive_passphrase_key(
    passphrase: &str,
    salt: &[u8; PASSPHRASE_SALT_SIZE],
) -> Result<[u8; SYMMETRIC_KEY_SIZE]> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_LANES,
        Some(SYMMETRIC_KEY_SIZE),
    )
    .map_err(|e| Error::KeyDerivationFailed(format!("Invalid Argon2 parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; SYMMETRIC_KEY_SIZE];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| Error::KeyDerivationFailed(format!("Argon2 hashing failed: {}", e)))?;

    Ok(key)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_message_key_symmetry() {
        let alice = EncryptionKeyPair::generate();
        let bob = EncryptionKeyPair::generate();

        let k1 = shared_message_key(&alice, &bob.public_bytes());
        let k2 = shared_message_key(&bob, &alice.public_bytes());

        assert_eq!(k1, k2);
    }

    #[test]
    fn test_shared_message_key_differs_per_peer() {
        let alice = EncryptionKeyPair::generate();
        let bob = EncryptionKeyPair::generate();
        let carol = EncryptionKeyPair::generate();

        let k1 = shared_message_key(&alice, &bob.public_bytes());
        let k2 = shared_message_key(&alice, &carol.public_bytes());

        assert_ne!(k1, k2);
    }

    #[test]
    fn test_passphrase_key_is_deterministic() {
        let salt = [9u8; PASSPHRASE_SALT_SIZE];

        let k1 = derive_passphrase_key("correct horse", &salt).unwrap();
        let k2 = derive_passphrase_key("correct horse", &salt).unwrap();

        assert_eq!(k1, k2);
    }

    #[test]
    fn test_passphrase_key_varies_with_salt_and_passphrase() {
        let salt_a = [1u8; PASSPHRASE_SALT_SIZE];
        let salt_b = [2u8; PASSPHRASE_SALT_SIZE];

        let base = derive_passphrase_key("passphrase", &salt_a).unwrap();
        assert_ne!(base, derive_passphrase_key("passphrase", &salt_b).unwrap());
        assert_ne!(base, derive_passphrase_key("other", &salt_a).unwrap());
    }
}
