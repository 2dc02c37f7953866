//! # Message Envelope Model
//!
//! The `ShinkaiMessage` envelope and its nested layers, with the encryption
//! state of each layer made explicit in the type system.
//!
//! ## Envelope Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SHINKAI MESSAGE ENVELOPE                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ShinkaiMessage                                                        │
//! │  ├── body: MessageBody                        ◄── outer layer          │
//! │  │   ├── Encrypted { content: hex string }                             │
//! │  │   └── Unencrypted(ShinkaiBody)                                      │
//! │  │       ├── message_data: MessageData        ◄── inner layer          │
//! │  │       │   ├── Encrypted { content: hex string }                     │
//! │  │       │   └── Unencrypted(ShinkaiData)                              │
//! │  │       │       ├── message_raw_content                               │
//! │  │       │       └── message_content_schema                            │
//! │  │       └── internal_metadata                                         │
//! │  │           ├── sender_subidentity / recipient_subidentity            │
//! │  │           ├── inbox                                                 │
//! │  │           ├── signature                    ◄── inner signature      │
//! │  │           └── encryption                                            │
//! │  ├── external_metadata                                                 │
//! │  │   ├── sender / recipient                                            │
//! │  │   ├── scheduled_time                                                │
//! │  │   ├── signature                            ◄── outer signature      │
//! │  │   ├── other / intra_sender                                          │
//! │  ├── encryption                                                        │
//! │  └── version                                                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each layer is a tagged union, so a partially-encrypted envelope is not
//! representable. Encrypting an already-encrypted layer fails with
//! `AlreadyEncrypted`; decrypting a plaintext layer fails with
//! `NotEncrypted`. Every transition returns a new value; existing messages
//! are never mutated in place.

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::crypto::encryption::{
    decrypt_message_body, decrypt_message_data, encrypt_message_body, encrypt_message_data,
};
use crate::crypto::keys::EncryptionKeyPair;
use crate::crypto::signing;
use crate::error::{Error, Result};
use crate::messaging::schemas::MessageSchemaType;

/// How a layer is (or is to be) encrypted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionMethod {
    /// No encryption; the layer is signed plaintext
    None,
    /// X25519 Diffie-Hellman + BLAKE3 key derivation + ChaCha20-Poly1305
    DiffieHellmanChaChaPoly1305,
}

impl EncryptionMethod {
    /// The wire spelling of this method
    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionMethod::None => "None",
            EncryptionMethod::DiffieHellmanChaChaPoly1305 => "DiffieHellmanChaChaPoly1305",
        }
    }

    /// Whether this is the no-encryption marker
    pub fn is_none(&self) -> bool {
        matches!(self, EncryptionMethod::None)
    }
}

/// Protocol version of the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShinkaiVersion {
    /// The only version currently spoken
    V1_0,
}

/// The message envelope exchanged between nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShinkaiMessage {
    /// The (possibly encrypted) body
    pub body: MessageBody,
    /// Routing metadata visible to every hop
    pub external_metadata: ExternalMetadata,
    /// Encryption method of the body layer
    pub encryption: EncryptionMethod,
    /// Envelope version
    pub version: ShinkaiVersion,
}

/// Outer-layer state: the body is either ciphertext or a `ShinkaiBody`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageBody {
    /// Body encrypted for the recipient node
    #[serde(rename = "encrypted")]
    Encrypted(EncryptedShinkaiBody),
    /// Body in the clear (still inner-signed)
    #[serde(rename = "unencrypted")]
    Unencrypted(ShinkaiBody),
}

/// Ciphertext of an encrypted body layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedShinkaiBody {
    /// `"encrypted:" + hex(nonce) + hex(ciphertext)`
    pub content: String,
}

/// The decrypted body: message data plus inner routing metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShinkaiBody {
    /// The (possibly encrypted) message data
    pub message_data: MessageData,
    /// Metadata scoped to the sender/recipient subidentities
    pub internal_metadata: InternalMetadata,
}

/// Inner-layer state: the data is either ciphertext or a `ShinkaiData`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageData {
    /// Data encrypted end-to-end between subidentities
    #[serde(rename = "encrypted")]
    Encrypted(EncryptedShinkaiData),
    /// Data in the clear
    #[serde(rename = "unencrypted")]
    Unencrypted(ShinkaiData),
}

/// Ciphertext of an encrypted data layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedShinkaiData {
    /// `"encrypted:" + hex(len8) + hex(len8) + hex(nonce) + hex(ciphertext)`
    pub content: String,
}

/// The actual message payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShinkaiData {
    /// Raw content; JSON for structured intents, plain text otherwise
    pub message_raw_content: String,
    /// Schema tag describing how to interpret the raw content
    pub message_content_schema: MessageSchemaType,
}

/// Metadata scoped to the inner (body) layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalMetadata {
    /// Sender subidentity path, e.g. `main/device/phone1`; empty for the node
    pub sender_subidentity: String,
    /// Recipient subidentity path; empty for the node
    pub recipient_subidentity: String,
    /// Inbox this message belongs to
    pub inbox: String,
    /// Inner-layer Ed25519 signature (hex), empty until signed
    pub signature: String,
    /// Encryption method of the data layer
    pub encryption: EncryptionMethod,
}

/// Metadata scoped to the outer (envelope) layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalMetadata {
    /// Sender node identity
    pub sender: String,
    /// Recipient node identity
    pub recipient: String,
    /// RFC 3339 UTC timestamp chosen by the sender
    pub scheduled_time: String,
    /// Outer-layer Ed25519 signature (hex), empty until signed
    pub signature: String,
    /// Free-form side channel; carries a hex encryption key during registration
    pub other: String,
    /// Subidentity of the sender inside its own node
    pub intra_sender: String,
}

// ============================================================================
// OUTER LAYER TRANSITIONS
// ============================================================================

impl ShinkaiMessage {
    /// Encrypt the body layer for `peer_public`
    ///
    /// Fails with `AlreadyEncrypted` when the body is already ciphertext.
    /// The `encryption` field must already announce an encryption method.
    pub fn encrypt_outer_layer(
        &self,
        local: &EncryptionKeyPair,
        peer_public: &[u8; 32],
    ) -> Result<ShinkaiMessage> {
        let body = match &self.body {
            MessageBody::Encrypted(_) => return Err(Error::AlreadyEncrypted),
            MessageBody::Unencrypted(body) => body,
        };
        if self.encryption.is_none() {
            return Err(Error::EncryptionFailed(
                "Message encryption method is None".into(),
            ));
        }

        let plaintext = serde_json::to_string(body)?;
        let content = encrypt_message_body(&plaintext, local, peer_public)?;

        let mut encrypted = self.clone();
        encrypted.body = MessageBody::Encrypted(EncryptedShinkaiBody { content });
        encrypted.encryption = EncryptionMethod::DiffieHellmanChaChaPoly1305;
        Ok(encrypted)
    }

    /// Decrypt the body layer using our secret key and the sender's public key
    ///
    /// Fails with `NotEncrypted` when the body is already plaintext.
    pub fn decrypt_outer_layer(
        &self,
        local: &EncryptionKeyPair,
        peer_public: &[u8; 32],
    ) -> Result<ShinkaiMessage> {
        let encrypted = match &self.body {
            MessageBody::Unencrypted(_) => return Err(Error::NotEncrypted),
            MessageBody::Encrypted(encrypted) => encrypted,
        };

        let plaintext = decrypt_message_body(&encrypted.content, local, peer_public)?;
        let body: ShinkaiBody =
            serde_json::from_str(&plaintext).map_err(|_| Error::DecryptionFailed)?;

        let mut decrypted = self.clone();
        decrypted.body = MessageBody::Unencrypted(body);
        decrypted.encryption = EncryptionMethod::None;
        Ok(decrypted)
    }

    /// Sign the outer layer, returning a new message with the signature set
    pub fn sign_outer_layer(&self, secret_key: &SigningKey) -> Result<ShinkaiMessage> {
        signing::sign_outer_layer(secret_key, self)
    }

    /// Verify the outer signature against a caller-supplied public key
    ///
    /// The key comes from prior registration, never from the message itself.
    /// A well-formed but cryptographically invalid signature yields
    /// `Ok(false)`, not an error.
    pub fn verify_outer_layer_signature(&self, public_key: &VerifyingKey) -> Result<bool> {
        signing::verify_outer_layer_signature(public_key, self)
    }

    /// Borrow the body if it is unencrypted
    pub fn body_unencrypted(&self) -> Result<&ShinkaiBody> {
        match &self.body {
            MessageBody::Unencrypted(body) => Ok(body),
            MessageBody::Encrypted(_) => Err(Error::AlreadyEncrypted),
        }
    }

    /// Serialize to the JSON wire form
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a message from its JSON wire form
    pub fn from_json_str(json: &str) -> Result<ShinkaiMessage> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// INNER LAYER TRANSITIONS
// ============================================================================

impl ShinkaiBody {
    /// Encrypt the data layer for `peer_public`
    ///
    /// Fails with `AlreadyEncrypted` when the data is already ciphertext.
    pub fn encrypt_data_layer(
        &self,
        local: &EncryptionKeyPair,
        peer_public: &[u8; 32],
    ) -> Result<ShinkaiBody> {
        let data = match &self.message_data {
            MessageData::Encrypted(_) => return Err(Error::AlreadyEncrypted),
            MessageData::Unencrypted(data) => data,
        };

        let content = encrypt_message_data(
            &data.message_raw_content,
            data.message_content_schema.as_str(),
            local,
            peer_public,
        )?;

        Ok(ShinkaiBody {
            message_data: MessageData::Encrypted(EncryptedShinkaiData { content }),
            internal_metadata: self.internal_metadata.clone(),
        })
    }

    /// Decrypt the data layer using our secret key and the sender's public key
    ///
    /// Fails with `NotEncrypted` when the data is already plaintext.
    pub fn decrypt_data_layer(
        &self,
        local: &EncryptionKeyPair,
        peer_public: &[u8; 32],
    ) -> Result<ShinkaiBody> {
        let encrypted = match &self.message_data {
            MessageData::Unencrypted(_) => return Err(Error::NotEncrypted),
            MessageData::Encrypted(encrypted) => encrypted,
        };

        let (content, schema) = decrypt_message_data(&encrypted.content, local, peer_public)?;
        let schema = MessageSchemaType::from_wire(&schema).ok_or(Error::DecryptionFailed)?;

        Ok(ShinkaiBody {
            message_data: MessageData::Unencrypted(ShinkaiData {
                message_raw_content: content,
                message_content_schema: schema,
            }),
            internal_metadata: self.internal_metadata.clone(),
        })
    }

    /// Sign the inner layer, returning a new body with the signature set
    pub fn sign_inner_layer(&self, secret_key: &SigningKey) -> Result<ShinkaiBody> {
        signing::sign_inner_layer(secret_key, self)
    }

    /// Verify the inner signature against a caller-supplied public key
    pub fn verify_inner_layer_signature(&self, public_key: &VerifyingKey) -> Result<bool> {
        signing::verify_inner_layer_signature(public_key, self)
    }

    /// Borrow the data if it is unencrypted
    pub fn data_unencrypted(&self) -> Result<&ShinkaiData> {
        match &self.message_data {
            MessageData::Unencrypted(data) => Ok(data),
            MessageData::Encrypted(_) => Err(Error::AlreadyEncrypted),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_body() -> ShinkaiBody {
        ShinkaiBody {
            message_data: MessageData::Unencrypted(ShinkaiData {
                message_raw_content: "hey!".into(),
                message_content_schema: MessageSchemaType::TextContent,
            }),
            internal_metadata: InternalMetadata {
                sender_subidentity: "main/device/main_device".into(),
                recipient_subidentity: String::new(),
                inbox: "inbox::@@node1.shinkai/main/device/main_device::@@node2.shinkai::false"
                    .into(),
                signature: String::new(),
                encryption: EncryptionMethod::None,
            },
        }
    }

    fn sample_message(encryption: EncryptionMethod) -> ShinkaiMessage {
        ShinkaiMessage {
            body: MessageBody::Unencrypted(sample_body()),
            external_metadata: ExternalMetadata {
                sender: "@@node1.shinkai".into(),
                recipient: "@@node2.shinkai".into(),
                scheduled_time: "2023-08-25T22:44:01.132Z".into(),
                signature: String::new(),
                other: String::new(),
                intra_sender: "main".into(),
            },
            encryption,
            version: ShinkaiVersion::V1_0,
        }
    }

    #[test]
    fn test_wire_shape() {
        let message = sample_message(EncryptionMethod::None);
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["encryption"], "None");
        assert_eq!(value["version"], "V1_0");
        assert_eq!(
            value["body"]["unencrypted"]["message_data"]["unencrypted"]["message_raw_content"],
            "hey!"
        );
        assert_eq!(
            value["body"]["unencrypted"]["internal_metadata"]["encryption"],
            "None"
        );
        assert_eq!(value["external_metadata"]["sender"], "@@node1.shinkai");
    }

    #[test]
    fn test_wire_round_trip() {
        let message = sample_message(EncryptionMethod::None);
        let json = message.to_json_string().unwrap();
        let parsed = ShinkaiMessage::from_json_str(&json).unwrap();
        assert_eq!(message, parsed);
    }

    #[test]
    fn test_outer_layer_round_trip() {
        let alice = EncryptionKeyPair::generate();
        let bob = EncryptionKeyPair::generate();

        let message = sample_message(EncryptionMethod::DiffieHellmanChaChaPoly1305);
        let encrypted = message
            .encrypt_outer_layer(&alice, &bob.public_bytes())
            .unwrap();

        assert!(matches!(encrypted.body, MessageBody::Encrypted(_)));
        assert_eq!(
            encrypted.encryption,
            EncryptionMethod::DiffieHellmanChaChaPoly1305
        );

        let decrypted = encrypted
            .decrypt_outer_layer(&bob, &alice.public_bytes())
            .unwrap();
        assert_eq!(decrypted.encryption, EncryptionMethod::None);
        assert_eq!(decrypted.body, message.body);
    }

    #[test]
    fn test_encrypting_twice_fails() {
        let alice = EncryptionKeyPair::generate();
        let bob = EncryptionKeyPair::generate();

        let message = sample_message(EncryptionMethod::DiffieHellmanChaChaPoly1305);
        let encrypted = message
            .encrypt_outer_layer(&alice, &bob.public_bytes())
            .unwrap();
        let result = encrypted.encrypt_outer_layer(&alice, &bob.public_bytes());

        assert!(matches!(result, Err(Error::AlreadyEncrypted)));
    }

    #[test]
    fn test_decrypting_plaintext_fails() {
        let alice = EncryptionKeyPair::generate();
        let bob = EncryptionKeyPair::generate();

        let message = sample_message(EncryptionMethod::None);
        let result = message.decrypt_outer_layer(&bob, &alice.public_bytes());

        assert!(matches!(result, Err(Error::NotEncrypted)));
    }

    #[test]
    fn test_encrypt_outer_requires_announced_method() {
        let alice = EncryptionKeyPair::generate();
        let bob = EncryptionKeyPair::generate();

        let message = sample_message(EncryptionMethod::None);
        let result = message.encrypt_outer_layer(&alice, &bob.public_bytes());

        assert!(matches!(result, Err(Error::EncryptionFailed(_))));
    }

    #[test]
    fn test_data_layer_round_trip() {
        let alice = EncryptionKeyPair::generate();
        let bob = EncryptionKeyPair::generate();

        let body = sample_body();
        let encrypted = body.encrypt_data_layer(&alice, &bob.public_bytes()).unwrap();
        assert!(matches!(encrypted.message_data, MessageData::Encrypted(_)));
        // Metadata rides along untouched
        assert_eq!(encrypted.internal_metadata, body.internal_metadata);

        let decrypted = encrypted
            .decrypt_data_layer(&bob, &alice.public_bytes())
            .unwrap();
        let data = decrypted.data_unencrypted().unwrap();
        assert_eq!(data.message_raw_content, "hey!");
        assert_eq!(data.message_content_schema, MessageSchemaType::TextContent);
    }

    #[test]
    fn test_data_layer_state_guards() {
        let alice = EncryptionKeyPair::generate();
        let bob = EncryptionKeyPair::generate();

        let body = sample_body();
        assert!(matches!(
            body.decrypt_data_layer(&bob, &alice.public_bytes()),
            Err(Error::NotEncrypted)
        ));

        let encrypted = body.encrypt_data_layer(&alice, &bob.public_bytes()).unwrap();
        assert!(matches!(
            encrypted.encrypt_data_layer(&alice, &bob.public_bytes()),
            Err(Error::AlreadyEncrypted)
        ));
    }
}
