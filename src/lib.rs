//! # Shinkai Message Core
//!
//! The Shinkai Message protocol layer: hierarchical identity naming, layered
//! encryption and signing, and deterministic inbox addressing for messages
//! exchanged between nodes and their subidentities.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    SHINKAI MESSAGE CORE MODULES                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │    Identity      │   │    Messaging     │   │      Crypto      │    │
//! │  │                  │   │                  │   │                  │    │
//! │  │ - ShinkaiName    │   │ - Envelope model │   │ - Keys (X/Ed)    │    │
//! │  │ - InboxName      │   │ - Schema tags    │   │ - Canonical hash │    │
//! │  │ - Containment    │   │ - Builder        │   │ - AEAD + KDF     │    │
//! │  └────────┬─────────┘   └────────┬─────────┘   │ - Two-layer sign │    │
//! │           │                      │             └────────┬─────────┘    │
//! │           └──────────────────────┴──────────────────────┘              │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │              ShinkaiMessage (JSON wire format, hex payloads)           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Cryptographic primitives (keys, hashing, encryption, signing)
//! - [`identity`] - Naming and addressing (`ShinkaiName`, `InboxName`)
//! - [`messaging`] - Envelope model, schema payloads, message builder
//!
//! ## Security Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SECURITY LAYERS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Layer 1: Body Encryption (X25519 + BLAKE3 + ChaCha20-Poly1305)        │
//! │  ──────────────────────────────────────────────────────────────         │
//! │  The whole body can be encrypted node-to-node, hiding the inner        │
//! │  metadata and payload from intermediaries.                             │
//! │                                                                         │
//! │  Layer 2: Data Encryption (same scheme, inner scope)                   │
//! │  ───────────────────────────────────────────────────                    │
//! │  The payload alone can be encrypted subidentity-to-subidentity,        │
//! │  keeping it opaque even to the routing node.                           │
//! │                                                                         │
//! │  Layer 3: Two-Layer Authentication (Ed25519 over canonical BLAKE3)     │
//! │  ─────────────────────────────────────────────────────────────────      │
//! │  The envelope and the body are independently signed; verifiers         │
//! │  supply expected public keys out-of-band and never trust keys          │
//! │  embedded in the message.                                              │
//! │                                                                         │
//! │  Layer 4: Deterministic Addressing (sorted inbox derivation)           │
//! │  ───────────────────────────────────────────────────────────            │
//! │  Inbox identifiers are recomputed, never negotiated, so peers          │
//! │  converge on the same conversation address bit-for-bit.                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All operations are synchronous, pure CPU-bound transforms over owned
//! buffers; any call can run from any thread with no coordination.
//! Transport, storage, and UI live outside this crate.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod crypto;
pub mod error;
pub mod identity;
pub mod messaging;
/// Time utilities for message scheduling metadata.
pub mod time;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use crypto::{EncryptionKeyPair, SigningKeyPair};
pub use error::{Error, Result};
pub use identity::{InboxName, ShinkaiName, ShinkaiSubidentityType};
pub use messaging::{
    EncryptionMethod, MessageSchemaType, ShinkaiMessage, ShinkaiMessageBuilder, ShinkaiVersion,
};
