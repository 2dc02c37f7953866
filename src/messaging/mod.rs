//! # Messaging Module
//!
//! The message envelope: its nested layered structure, the schema tags and
//! typed payloads it carries, and the builder that assembles it.
//!
//! ## Outbound Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        OUTBOUND MESSAGE FLOW                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Caller                                                                │
//! │  ──────                                                                 │
//! │  raw content + schema tag + routing identities                         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ShinkaiMessageBuilder                                                 │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  fill internal/external metadata, derive inbox              │       │
//! │  │  encrypt data layer (optional)                              │       │
//! │  │  sign inner layer (always)                                  │       │
//! │  │  encrypt body layer (optional)                              │       │
//! │  │  sign outer layer (always)                                  │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ShinkaiMessage ──► JSON ──► transport (out of scope)                  │
//! │                                                                         │
//! │  Inbound runs the inverse: verify outer ──► decrypt body ──►           │
//! │  verify inner ──► decrypt data.                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod builder;
pub mod message;
pub mod schemas;

pub use builder::ShinkaiMessageBuilder;
pub use message::{
    EncryptedShinkaiBody, EncryptedShinkaiData, EncryptionMethod, ExternalMetadata,
    InternalMetadata, MessageBody, MessageData, ShinkaiBody, ShinkaiData, ShinkaiMessage,
    ShinkaiVersion,
};
pub use schemas::MessageSchemaType;
