//! # Cryptography Module
//!
//! This module provides all cryptographic primitives used by the Shinkai
//! Message core.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 ENCRYPTION SCHEME                               │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Layered Encryption (ChaCha20-Poly1305)                        │   │
//! │  │  ───────────────────────────────────────                        │   │
//! │  │                                                                 │   │
//! │  │  1. Key Exchange: X25519 ECDH                                  │   │
//! │  │     self_secret × peer_public = shared point                   │   │
//! │  │                                                                 │   │
//! │  │  2. Key Derivation: single BLAKE3 invocation                   │   │
//! │  │     key = BLAKE3(shared point)                                 │   │
//! │  │                                                                 │   │
//! │  │  3. Encryption: ChaCha20-Poly1305 (IETF)                       │   │
//! │  │     • 256-bit key                                              │   │
//! │  │     • 96-bit nonce (random per encryption)                     │   │
//! │  │     • 128-bit authentication tag, no associated data           │   │
//! │  │                                                                 │   │
//! │  │  Applied independently at the body layer and the data layer.   │   │
//! │  │  Passphrase exports swap step 1-2 for Argon2id.                │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 SIGNATURE SCHEME                                │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Canonical-Hash-Then-Sign (Ed25519 + BLAKE3)                   │   │
//! │  │  ────────────────────────────────────────────                   │   │
//! │  │                                                                 │   │
//! │  │  • Pre-image: BLAKE3 of recursively key-sorted compact JSON    │   │
//! │  │  • Target signature field cleared before hashing               │   │
//! │  │  • Two independent layers: envelope and body                   │   │
//! │  │  • Signature size: 64 bytes, hex-encoded on the wire           │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: secret keys are zeroized when dropped
//! 2. **Constant-Time Operations**: dalek crates for constant-time crypto
//! 3. **Secure Random**: `rand::rngs::OsRng` for nonces, salts, and seeds
//! 4. **No Nonce Reuse**: a fresh random nonce for every encryption

pub mod encryption;
pub mod hashing;
pub mod kdf;
pub mod keys;
pub mod signing;

pub use encryption::{
    decrypt_message_body, decrypt_message_data, decrypt_with_passphrase, encrypt_message_body,
    encrypt_message_data, encrypt_with_passphrase, is_content_encrypted, ENCRYPTED_PREFIX,
    NONCE_SIZE,
};
pub use hashing::{canonical_hash, canonical_json};
pub use kdf::{derive_passphrase_key, shared_message_key, PASSPHRASE_SALT_SIZE};
pub use keys::{
    encryption_public_key_from_hex, generate_encryption_keys, generate_signature_keys,
    signature_public_key_from_hex, EncryptionKeyPair, SigningKeyPair, KEY_SIZE,
};
pub use signing::{
    sign_inner_layer, sign_outer_layer, verify_inner_layer_signature,
    verify_outer_layer_signature, SIGNATURE_SIZE,
};
