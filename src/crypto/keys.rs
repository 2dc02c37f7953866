//! # Key Management
//!
//! This module handles cryptographic key generation and the hex string
//! boundary used to exchange key material with callers.
//!
//! ## Key Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          KEY TYPES                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SigningKeyPair (Ed25519)                                       │   │
//! │  │  ─────────────────────────                                       │   │
//! │  │                                                                  │   │
//! │  │  Purpose:                                                       │   │
//! │  │  • Signing the outer envelope layer                             │   │
//! │  │  • Signing the inner body layer                                 │   │
//! │  │  • Verifying signatures on received messages                    │   │
//! │  │                                                                  │   │
//! │  │  Format:                                                        │   │
//! │  │  • Private key: 32 bytes (kept secret, zeroized on drop)       │   │
//! │  │  • Public key: 32 bytes (shared freely)                        │   │
//! │  │                                                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  EncryptionKeyPair (X25519)                                     │   │
//! │  │  ─────────────────────────────                                   │   │
//! │  │                                                                  │   │
//! │  │  Purpose:                                                       │   │
//! │  │  • Key exchange with peers (ECDH)                               │   │
//! │  │  • Deriving shared secrets for body/data layer encryption       │   │
//! │  │                                                                  │   │
//! │  │  Format:                                                        │   │
//! │  │  • Private key: 32 bytes (kept secret, zeroized on drop)       │   │
//! │  │  • Public key: 32 bytes (published in the identity registry)   │   │
//! │  │                                                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Hex Boundary
//!
//! Every key crosses the API boundary as a lowercase hex string: callers
//! store and transmit hex, this crate operates on fixed-length byte buffers.
//! A hex string that does not decode to the expected length for its role is
//! rejected with `InvalidKey`.

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::ZeroizeOnDrop;

use crate::error::{Error, Result};

/// Size of encryption and signing keys in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// X25519 encryption keypair for key exchange
#[derive(Clone, ZeroizeOnDrop)]
pub struct EncryptionKeyPair {
    /// Private encryption key (secret)
    #[zeroize(skip)] // x25519_dalek handles its own zeroization
    secret: StaticSecret,
    /// Public encryption key (derived from secret)
    #[zeroize(skip)]
    public: X25519PublicKey,
}

impl EncryptionKeyPair {
    /// Generate a new random encryption keypair from the OS CSPRNG
    pub fn generate() -> Self {
        let mut seed = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut seed);
        Self::from_seed(&seed)
    }

    /// Create a keypair from a 32-byte seed
    ///
    /// This is deterministic: the same seed always produces the same keys.
    pub fn from_seed(seed: &[u8; KEY_SIZE]) -> Self {
        let secret = StaticSecret::from(*seed);
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Create a keypair from a hex-encoded secret key
    pub fn from_secret_hex(hex_str: &str) -> Result<Self> {
        let seed = decode_key_hex(hex_str, "X25519 secret key")?;
        Ok(Self::from_seed(&seed))
    }

    /// Get the secret key bytes (for backup/storage)
    ///
    /// ## Security Warning
    ///
    /// Only use this for secure storage. Never log or transmit these bytes.
    pub fn secret_bytes(&self) -> [u8; KEY_SIZE] {
        self.secret.to_bytes()
    }

    /// Get the public key bytes
    pub fn public_bytes(&self) -> [u8; KEY_SIZE] {
        self.public.to_bytes()
    }

    /// Hex-encode the secret key
    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret_bytes())
    }

    /// Hex-encode the public key
    pub fn public_hex(&self) -> String {
        hex::encode(self.public_bytes())
    }

    /// Perform Diffie-Hellman key exchange
    ///
    /// Returns a shared secret that both parties can compute:
    /// - Alice: alice_secret × bob_public
    /// - Bob: bob_secret × alice_public
    ///
    /// Both computations produce the same shared secret.
    pub fn diffie_hellman(&self, their_public: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
        let their_public = X25519PublicKey::from(*their_public);
        self.secret.diffie_hellman(&their_public).to_bytes()
    }
}

/// Ed25519 signing keypair
#[derive(Clone, ZeroizeOnDrop)]
pub struct SigningKeyPair {
    /// Private signing key (secret)
    #[zeroize(skip)] // ed25519_dalek::SigningKey handles its own zeroization
    secret: SigningKey,
}

impl SigningKeyPair {
    /// Generate a new random signing keypair from the OS CSPRNG
    pub fn generate() -> Self {
        let secret = SigningKey::generate(&mut OsRng);
        Self { secret }
    }

    /// Create a keypair from a 32-byte seed
    ///
    /// Deterministic: the public key is the standard Ed25519 curve point
    /// derived from the seed.
    pub fn from_seed(seed: &[u8; KEY_SIZE]) -> Self {
        let secret = SigningKey::from_bytes(seed);
        Self { secret }
    }

    /// Create a keypair from a hex-encoded secret key
    pub fn from_secret_hex(hex_str: &str) -> Result<Self> {
        let seed = decode_key_hex(hex_str, "Ed25519 secret key")?;
        Ok(Self::from_seed(&seed))
    }

    /// Get the secret key bytes (for backup/storage)
    ///
    /// ## Security Warning
    ///
    /// Only use this for secure storage. Never log or transmit these bytes.
    pub fn secret_bytes(&self) -> [u8; KEY_SIZE] {
        self.secret.to_bytes()
    }

    /// Get the public key bytes
    pub fn public_bytes(&self) -> [u8; KEY_SIZE] {
        self.secret.verifying_key().to_bytes()
    }

    /// Hex-encode the secret key
    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret_bytes())
    }

    /// Hex-encode the public key
    pub fn public_hex(&self) -> String {
        hex::encode(self.public_bytes())
    }

    /// Get the verifying key for signature verification
    pub fn verifying_key(&self) -> VerifyingKey {
        self.secret.verifying_key()
    }

    /// Get reference to the signing key
    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.secret
    }
}

// ============================================================================
// HEX BOUNDARY HELPERS
// ============================================================================

/// Generate an X25519 keypair, returned as `(secret_hex, public_hex)`
///
/// If a seed is supplied the result is deterministic; otherwise key material
/// is drawn from the OS CSPRNG.
pub fn generate_encryption_keys(seed: Option<[u8; KEY_SIZE]>) -> (String, String) {
    let pair = match seed {
        Some(seed) => EncryptionKeyPair::from_seed(&seed),
        None => EncryptionKeyPair::generate(),
    };
    (pair.secret_hex(), pair.public_hex())
}

/// Generate an Ed25519 keypair, returned as `(secret_hex, public_hex)`
///
/// If a seed is supplied the result is deterministic; otherwise key material
/// is drawn from the OS CSPRNG.
pub fn generate_signature_keys(seed: Option<[u8; KEY_SIZE]>) -> (String, String) {
    let pair = match seed {
        Some(seed) => SigningKeyPair::from_seed(&seed),
        None => SigningKeyPair::generate(),
    };
    (pair.secret_hex(), pair.public_hex())
}

/// Decode a hex-encoded X25519 public key
pub fn encryption_public_key_from_hex(hex_str: &str) -> Result<[u8; KEY_SIZE]> {
    decode_key_hex(hex_str, "X25519 public key")
}

/// Decode a hex-encoded Ed25519 public key into a verifying key
pub fn signature_public_key_from_hex(hex_str: &str) -> Result<VerifyingKey> {
    let bytes = decode_key_hex(hex_str, "Ed25519 public key")?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|e| Error::InvalidKey(format!("Invalid Ed25519 public key: {}", e)))
}

/// Decode a hex key string, checking the length for its role
fn decode_key_hex(hex_str: &str, role: &str) -> Result<[u8; KEY_SIZE]> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| Error::InvalidKey(format!("{} is not valid hex: {}", role, e)))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        Error::InvalidKey(format!(
            "{} must be {} bytes, got {}",
            role,
            KEY_SIZE,
            bytes.len()
        ))
    })
}

// ============================================================================
// TESTS
// ============================================================================
