//! # Error Handling
//!
//! This module provides the error types for the Shinkai Message core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Key Material Errors                                               │
//! │  │   ├── InvalidKey            - Bad hex, wrong length, bad point      │
//! │  │   └── KeyDerivationFailed   - KDF could not produce a key           │
//! │  │                                                                      │
//! │  ├── Encryption Errors                                                 │
//! │  │   ├── AlreadyEncrypted      - Encrypting an encrypted layer         │
//! │  │   ├── NotEncrypted          - Decrypting a plaintext layer          │
//! │  │   ├── EncryptionFailed      - AEAD encryption failed                │
//! │  │   └── DecryptionFailed      - Tag mismatch or corrupt framing       │
//! │  │                                                                      │
//! │  ├── Signing Errors                                                    │
//! │  │   ├── SigningFailed         - Signing operation failed              │
//! │  │   ├── MissingSignature      - Signature field empty at verify time  │
//! │  │   ├── MalformedSignature    - Signature hex does not decode         │
//! │  │   └── VerificationFailed    - Signature verification failed         │
//! │  │                                                                      │
//! │  ├── Naming Errors                                                     │
//! │  │   ├── InvalidNameFormat     - ShinkaiName grammar violation         │
//! │  │   └── InvalidInboxFormat    - InboxName grammar violation           │
//! │  │                                                                      │
//! │  ├── Builder Errors                                                    │
//! │  │   ├── BuilderIncomplete     - Required field missing at build()     │
//! │  │   └── AmbiguousEncryptionTarget                                     │
//! │  │                              - Double encryption, no secondary key  │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      └── SerializationError    - JSON encode/decode failure            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation Policy
//!
//! Naming and builder errors are surfaced with the specific rule that was
//! violated so callers can show precise diagnostics. Cryptographic failures
//! are deliberately opaque: `DecryptionFailed` never reports which internal
//! check failed, and a well-formed but cryptographically invalid signature
//! verifies to `false` rather than an error.

use thiserror::Error;

/// Result type alias for Shinkai Message core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Shinkai Message core
///
/// All errors are categorized by module/domain to make error handling
/// clearer and to provide meaningful error messages to users.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Key Material Errors (100-199)
    // ========================================================================

    /// Invalid key format or length
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Key derivation failed
    #[error("Failed to derive key: {0}")]
    KeyDerivationFailed(String),

    // ========================================================================
    // Encryption Errors (200-299)
    // ========================================================================

    /// Tried to encrypt a layer that is already encrypted
    #[error("Layer is already encrypted.")]
    AlreadyEncrypted,

    /// Tried to decrypt a layer that is not encrypted
    #[error("Layer is not encrypted.")]
    NotEncrypted,

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed: authentication tag mismatch or corrupt framing.
    /// Intentionally carries no detail about which check failed.
    #[error("Decryption failure!")]
    DecryptionFailed,

    // ========================================================================
    // Signing Errors (300-399)
    // ========================================================================

    /// Signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Signature field was empty at verification time
    #[error("Signature is missing.")]
    MissingSignature,

    /// Signature field did not decode to a 64-byte Ed25519 signature
    #[error("Signature is malformed.")]
    MalformedSignature,

    /// Signature verification failed
    #[error("Signature verification failed")]
    VerificationFailed,

    // ========================================================================
    // Naming Errors (400-499)
    // ========================================================================

    /// Shinkai name grammar violation, with the rule that was broken
    #[error("Invalid name '{name}': {rule}")]
    InvalidNameFormat {
        /// The offending raw name
        name: String,
        /// Which validation rule failed
        rule: String,
    },

    /// Inbox name grammar violation
    #[error("Invalid inbox name format: {0}")]
    InvalidInboxFormat(String),

    // ========================================================================
    // Builder Errors (500-599)
    // ========================================================================

    /// A required field was missing when `build()` was called
    #[error("Message builder is missing a required field: {0}")]
    BuilderIncomplete(&'static str),

    /// Body-level and data-level encryption both requested without a
    /// secondary receiver public key to disambiguate the targets
    #[error("Encryption should not be set on both body and internal metadata simultaneously without a second receiver public key.")]
    AmbiguousEncryptionTarget,

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Get the numeric error code for FFI-style consumers
    ///
    /// Error codes are organized by category:
    /// - 100-199: Key material
    /// - 200-299: Encryption
    /// - 300-399: Signing
    /// - 400-499: Naming
    /// - 500-599: Builder
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Key material (100-199)
            Error::InvalidKey(_) => 100,
            Error::KeyDerivationFailed(_) => 101,

            // Encryption (200-299)
            Error::AlreadyEncrypted => 200,
            Error::NotEncrypted => 201,
            Error::EncryptionFailed(_) => 202,
            Error::DecryptionFailed => 203,

            // Signing (300-399)
            Error::SigningFailed(_) => 300,
            Error::MissingSignature => 301,
            Error::MalformedSignature => 302,
            Error::VerificationFailed => 303,

            // Naming (400-499)
            Error::InvalidNameFormat { .. } => 400,
            Error::InvalidInboxFormat(_) => 401,

            // Builder (500-599)
            Error::BuilderIncomplete(_) => 500,
            Error::AmbiguousEncryptionTarget => 501,

            // Internal (900-999)
            Error::SerializationError(_) => 900,
        }
    }

    /// Check whether this error is a caller input (validation) error
    ///
    /// Validation errors carry the specific rule that was violated and are
    /// meant to be shown to users. Cryptographic errors are opaque.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidKey(_)
                | Error::InvalidNameFormat { .. }
                | Error::InvalidInboxFormat(_)
                | Error::BuilderIncomplete(_)
                | Error::AmbiguousEncryptionTarget
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::InvalidKey("test".into()).code(), 100);
        assert_eq!(Error::AlreadyEncrypted.code(), 200);
        assert_eq!(Error::DecryptionFailed.code(), 203);
        assert_eq!(Error::MissingSignature.code(), 301);
        assert_eq!(
            Error::InvalidNameFormat {
                name: "x".into(),
                rule: "y".into()
            }
            .code(),
            400
        );
        assert_eq!(Error::BuilderIncomplete("inbox").code(), 500);
        assert_eq!(Error::SerializationError("test".into()).code(), 900);
    }

    #[test]
    fn test_validation_classification() {
        assert!(Error::InvalidInboxFormat("bad".into()).is_validation());
        assert!(Error::AmbiguousEncryptionTarget.is_validation());
        assert!(!Error::DecryptionFailed.is_validation());
        assert!(!Error::VerificationFailed.is_validation());
    }

    #[test]
    fn test_decryption_error_is_opaque() {
        // The message shown to users must not leak which check failed.
        assert_eq!(Error::DecryptionFailed.to_string(), "Decryption failure!");
    }
}
