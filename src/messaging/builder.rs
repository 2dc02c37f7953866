//! # Message Builder
//!
//! A fluent accumulator that assembles well-formed, signed, optionally
//! encrypted messages, plus the prebuilt intents every caller goes through.
//!
//! ## Build Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         BUILD PIPELINE                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  1. Validate        internal and external metadata must be set;        │
//! │                     body + data encryption together require an         │
//! │                     explicit second receiver key                       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  2. Derive inbox    empty inbox ──► deterministic regular inbox from   │
//! │                     sender/recipient + subidentities                   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  3. Data layer      encrypt when internal encryption is requested      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  4. Inner signature always                                             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  5. Body layer      encrypt when body encryption is requested,         │
//! │                     using the second receiver key when present         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  6. Outer signature always ──► ShinkaiMessage ready for transport      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The builder is an owned-by-value struct; setters chain via move
//! semantics and `build` borrows, cloning the key material it works on, so
//! concurrent builds never alias mutable buffers. Prebuilt intents are thin
//! wrappers that pin a schema tag and field mapping and then run the same
//! pipeline; new intents must do the same rather than hand-rolling
//! envelopes.

use serde::Serialize;

use crate::crypto::keys::{EncryptionKeyPair, SigningKeyPair};
use crate::error::{Error, Result};
use crate::identity::inbox::InboxName;
use crate::messaging::message::{
    EncryptionMethod, ExternalMetadata, InternalMetadata, MessageBody, MessageData, ShinkaiBody,
    ShinkaiData, ShinkaiMessage, ShinkaiVersion,
};
use crate::messaging::schemas::{
    APIAddAgentRequest, APIGetMessagesFromInboxRequest, APIReadUpToTimeRequest, JobCreation,
    JobMessage, JobScope, MessageSchemaType, RegistrationCode, RegistrationCodeRequest,
    SerializedAgent,
};
use crate::time::now_scheduled_time;

/// Fluent builder for [`ShinkaiMessage`]
///
/// Construct with the caller's key material, chain setters, then call
/// [`build`](ShinkaiMessageBuilder::build).
#[derive(Clone)]
pub struct ShinkaiMessageBuilder {
    message_raw_content: String,
    message_content_schema: MessageSchemaType,
    internal_metadata: Option<InternalMetadata>,
    external_metadata: Option<ExternalMetadata>,
    encryption: EncryptionMethod,
    my_encryption_keys: EncryptionKeyPair,
    my_signing_keys: SigningKeyPair,
    receiver_public_key: [u8; 32],
    version: ShinkaiVersion,
    optional_second_public_key_receiver_node: Option<[u8; 32]>,
}

impl ShinkaiMessageBuilder {
    /// Start a builder with the sender's keys and the receiver's public key
    pub fn new(
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
    ) -> Self {
        Self {
            message_raw_content: String::new(),
            message_content_schema: MessageSchemaType::Empty,
            internal_metadata: None,
            external_metadata: None,
            encryption: EncryptionMethod::None,
            my_encryption_keys,
            my_signing_keys,
            receiver_public_key,
            version: ShinkaiVersion::V1_0,
            optional_second_public_key_receiver_node: None,
        }
    }

    /// Request body-layer encryption with the given method
    pub fn set_body_encryption(mut self, encryption: EncryptionMethod) -> Self {
        self.encryption = encryption;
        self
    }

    /// Leave the body layer as signed plaintext
    pub fn set_no_body_encryption(mut self) -> Self {
        self.encryption = EncryptionMethod::None;
        self
    }

    /// Set the raw message content
    pub fn set_message_raw_content(mut self, message_raw_content: impl Into<String>) -> Self {
        self.message_raw_content = message_raw_content.into();
        self
    }

    /// Set the schema tag for the data layer
    pub fn set_message_schema_type(mut self, schema: MessageSchemaType) -> Self {
        self.message_content_schema = schema;
        self
    }

    /// Set internal metadata with an empty inbox (derived at build time)
    pub fn set_internal_metadata(
        mut self,
        sender_subidentity: impl Into<String>,
        recipient_subidentity: impl Into<String>,
        encryption: EncryptionMethod,
    ) -> Self {
        self.internal_metadata = Some(InternalMetadata {
            sender_subidentity: sender_subidentity.into(),
            recipient_subidentity: recipient_subidentity.into(),
            inbox: String::new(),
            signature: String::new(),
            encryption,
        });
        self
    }

    /// Set internal metadata with an explicit inbox
    pub fn set_internal_metadata_with_inbox(
        mut self,
        sender_subidentity: impl Into<String>,
        recipient_subidentity: impl Into<String>,
        inbox: impl Into<String>,
        encryption: EncryptionMethod,
    ) -> Self {
        self.internal_metadata = Some(InternalMetadata {
            sender_subidentity: sender_subidentity.into(),
            recipient_subidentity: recipient_subidentity.into(),
            inbox: inbox.into(),
            signature: String::new(),
            encryption,
        });
        self
    }

    /// Set internal metadata, an explicit inbox, and the schema tag at once
    pub fn set_internal_metadata_with_schema(
        mut self,
        sender_subidentity: impl Into<String>,
        recipient_subidentity: impl Into<String>,
        inbox: impl Into<String>,
        message_schema: MessageSchemaType,
        encryption: EncryptionMethod,
    ) -> Self {
        self.message_content_schema = message_schema;
        self.set_internal_metadata_with_inbox(
            sender_subidentity,
            recipient_subidentity,
            inbox,
            encryption,
        )
    }

    /// Empty internal metadata requesting data-layer encryption
    pub fn set_empty_encrypted_internal_metadata(self) -> Self {
        self.set_internal_metadata("", "", EncryptionMethod::DiffieHellmanChaChaPoly1305)
    }

    /// Empty internal metadata with no data-layer encryption
    pub fn set_empty_non_encrypted_internal_metadata(self) -> Self {
        self.set_internal_metadata("", "", EncryptionMethod::None)
    }

    /// Set external metadata, stamping the current time
    pub fn set_external_metadata(
        self,
        recipient: impl Into<String>,
        sender: impl Into<String>,
    ) -> Self {
        self.external_metadata_inner(recipient, sender, now_scheduled_time(), "", "")
    }

    /// Set external metadata with the free-form `other` field
    pub fn set_external_metadata_with_other(
        self,
        recipient: impl Into<String>,
        sender: impl Into<String>,
        other: impl Into<String>,
    ) -> Self {
        self.external_metadata_inner(recipient, sender, now_scheduled_time(), other, "")
    }

    /// Set external metadata with both `other` and `intra_sender`
    pub fn set_external_metadata_with_other_and_intra_sender(
        self,
        recipient: impl Into<String>,
        sender: impl Into<String>,
        other: impl Into<String>,
        intra_sender: impl Into<String>,
    ) -> Self {
        self.external_metadata_inner(recipient, sender, now_scheduled_time(), other, intra_sender)
    }

    /// Set external metadata with `intra_sender`
    pub fn set_external_metadata_with_intra_sender(
        self,
        recipient: impl Into<String>,
        sender: impl Into<String>,
        intra_sender: impl Into<String>,
    ) -> Self {
        self.external_metadata_inner(recipient, sender, now_scheduled_time(), "", intra_sender)
    }

    /// Set external metadata with an explicit scheduled time
    pub fn set_external_metadata_with_schedule(
        self,
        recipient: impl Into<String>,
        sender: impl Into<String>,
        scheduled_time: impl Into<String>,
    ) -> Self {
        self.external_metadata_inner(recipient, sender, scheduled_time.into(), "", "")
    }

    fn external_metadata_inner(
        mut self,
        recipient: impl Into<String>,
        sender: impl Into<String>,
        scheduled_time: String,
        other: impl Into<String>,
        intra_sender: impl Into<String>,
    ) -> Self {
        self.external_metadata = Some(ExternalMetadata {
            sender: sender.into(),
            recipient: recipient.into(),
            scheduled_time,
            signature: String::new(),
            other: other.into(),
            intra_sender: intra_sender.into(),
        });
        self
    }

    /// Replace `intra_sender` on already-set external metadata
    pub fn update_intra_sender(mut self, intra_sender: impl Into<String>) -> Self {
        if let Some(external) = self.external_metadata.as_mut() {
            external.intra_sender = intra_sender.into();
        }
        self
    }

    /// Set the second receiver key used for the body layer when the data
    /// layer is encrypted for a different recipient
    pub fn set_optional_second_public_key_receiver_node(
        mut self,
        second_public_key: [u8; 32],
    ) -> Self {
        self.optional_second_public_key_receiver_node = Some(second_public_key);
        self
    }

    /// Run the build pipeline and produce a signed message
    ///
    /// Borrows the builder, so the same configured builder can produce
    /// several messages (each with fresh nonces and signatures).
    pub fn build(&self) -> Result<ShinkaiMessage> {
        let mut internal_metadata = self
            .internal_metadata
            .clone()
            .ok_or(Error::BuilderIncomplete("internal_metadata"))?;
        let external_metadata = self
            .external_metadata
            .clone()
            .ok_or(Error::BuilderIncomplete("external_metadata"))?;

        if !self.encryption.is_none()
            && !internal_metadata.encryption.is_none()
            && self.optional_second_public_key_receiver_node.is_none()
        {
            return Err(Error::AmbiguousEncryptionTarget);
        }

        if internal_metadata.inbox.is_empty() {
            let inbox = InboxName::get_regular_inbox_name_from_params(
                &external_metadata.sender,
                &internal_metadata.sender_subidentity,
                &external_metadata.recipient,
                &internal_metadata.recipient_subidentity,
                !internal_metadata.encryption.is_none(),
            )?;
            internal_metadata.inbox = inbox.get_value().to_string();
        }

        let data_encryption = internal_metadata.encryption;
        let body = ShinkaiBody {
            message_data: MessageData::Unencrypted(ShinkaiData {
                message_raw_content: self.message_raw_content.clone(),
                message_content_schema: self.message_content_schema,
            }),
            internal_metadata,
        };
        let body = if data_encryption.is_none() {
            body
        } else {
            body.encrypt_data_layer(&self.my_encryption_keys, &self.receiver_public_key)?
        };
        let body = body.sign_inner_layer(self.my_signing_keys.signing_key())?;

        let message = ShinkaiMessage {
            body: MessageBody::Unencrypted(body),
            external_metadata,
            encryption: self.encryption,
            version: self.version,
        };
        let message = if self.encryption.is_none() {
            message
        } else {
            let body_peer = self
                .optional_second_public_key_receiver_node
                .unwrap_or(self.receiver_public_key);
            message.encrypt_outer_layer(&self.my_encryption_keys, &body_peer)?
        };

        message.sign_outer_layer(self.my_signing_keys.signing_key())
    }

    // ========================================================================
    // PREBUILT INTENTS
    // ========================================================================

    /// An ACK reply to a node
    pub fn ack_message(
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        sender: &str,
        receiver: &str,
    ) -> Result<ShinkaiMessage> {
        Self::new(my_encryption_keys, my_signing_keys, receiver_public_key)
            .set_message_raw_content("ACK")
            .set_internal_metadata("", "", EncryptionMethod::None)
            .set_no_body_encryption()
            .set_external_metadata_with_intra_sender(receiver, sender, "")
            .build()
    }

    /// A terminate notice to a node
    pub fn terminate_message(
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        sender: &str,
        receiver: &str,
    ) -> Result<ShinkaiMessage> {
        Self::new(my_encryption_keys, my_signing_keys, receiver_public_key)
            .set_message_raw_content("terminate")
            .set_internal_metadata("", "", EncryptionMethod::None)
            .set_no_body_encryption()
            .set_external_metadata_with_intra_sender(receiver, sender, "")
            .build()
    }

    /// An error report with the data layer encrypted for the receiver
    pub fn error_message(
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        sender: &str,
        receiver: &str,
        error_msg: &str,
    ) -> Result<ShinkaiMessage> {
        Self::new(my_encryption_keys, my_signing_keys, receiver_public_key)
            .set_message_raw_content(format!("{{error: \"{error_msg}\"}}"))
            .set_empty_encrypted_internal_metadata()
            .set_external_metadata(receiver, sender)
            .set_no_body_encryption()
            .build()
    }

    /// A request to create a job over `scope`
    pub fn job_creation(
        scope: JobScope,
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        sender: &str,
        sender_subidentity: &str,
        node_receiver: &str,
        node_receiver_subidentity: &str,
    ) -> Result<ShinkaiMessage> {
        let body = serde_json::to_string(&JobCreation { scope })?;

        Self::new(my_encryption_keys, my_signing_keys, receiver_public_key)
            .set_message_raw_content(body)
            .set_internal_metadata(
                sender_subidentity,
                node_receiver_subidentity,
                EncryptionMethod::None,
            )
            .set_message_schema_type(MessageSchemaType::JobCreationSchema)
            .set_body_encryption(EncryptionMethod::None)
            .set_external_metadata_with_intra_sender(node_receiver, sender, sender_subidentity)
            .build()
    }

    /// A message on an existing job's inbox
    #[allow(clippy::too_many_arguments)]
    pub fn job_message(
        job_id: &str,
        content: &str,
        files_inbox: &str,
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        node_sender: &str,
        sender_subidentity: &str,
        node_receiver: &str,
        node_receiver_subidentity: &str,
    ) -> Result<ShinkaiMessage> {
        let body = serde_json::to_string(&JobMessage {
            job_id: job_id.to_string(),
            content: content.to_string(),
            files_inbox: files_inbox.to_string(),
        })?;
        let inbox = InboxName::get_job_inbox_name_from_params(job_id)?;

        Self::new(my_encryption_keys, my_signing_keys, receiver_public_key)
            .set_message_raw_content(body)
            .set_internal_metadata_with_inbox(
                sender_subidentity,
                node_receiver_subidentity,
                inbox.get_value(),
                EncryptionMethod::None,
            )
            .set_message_schema_type(MessageSchemaType::JobMessageSchema)
            .set_body_encryption(EncryptionMethod::None)
            .set_external_metadata_with_intra_sender(node_receiver, node_sender, sender_subidentity)
            .build()
    }

    /// A job message emitted by an agent
    ///
    /// Agents never encrypt, so placeholder encryption keys stand in for
    /// the real ones.
    pub fn job_message_from_agent(
        job_id: &str,
        content: &str,
        my_signing_keys: SigningKeyPair,
        node_sender: &str,
        node_receiver: &str,
    ) -> Result<ShinkaiMessage> {
        let body = serde_json::to_string(&JobMessage {
            job_id: job_id.to_string(),
            content: content.to_string(),
            files_inbox: String::new(),
        })?;
        let inbox = InboxName::get_job_inbox_name_from_params(job_id)?;

        let placeholder_encryption_keys = EncryptionKeyPair::from_seed(&[0u8; 32]);
        let placeholder_receiver_public_key = [0u8; 32];

        Self::new(
            placeholder_encryption_keys,
            my_signing_keys,
            placeholder_receiver_public_key,
        )
        .set_message_raw_content(body)
        .set_internal_metadata_with_schema(
            "",
            "",
            inbox.get_value(),
            MessageSchemaType::JobMessageSchema,
            EncryptionMethod::None,
        )
        .set_no_body_encryption()
        .set_external_metadata_with_intra_sender(node_receiver, node_sender, "")
        .build()
    }

    /// A body-encrypted message carrying an arbitrary JSON payload to a node
    ///
    /// The sender's encryption public key rides in `external_metadata.other`
    /// so the node can decrypt the body before it knows the sender's
    /// registered identity. Most API request intents delegate here.
    #[allow(clippy::too_many_arguments)]
    pub fn custom_message_to_node<T: Serialize>(
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        data: &T,
        sender_subidentity: &str,
        sender: &str,
        receiver: &str,
        schema: MessageSchemaType,
    ) -> Result<ShinkaiMessage> {
        let body = serde_json::to_string(data)?;
        let other = my_encryption_keys.public_hex();

        Self::new(my_encryption_keys, my_signing_keys, receiver_public_key)
            .set_message_raw_content(body)
            .set_body_encryption(EncryptionMethod::DiffieHellmanChaChaPoly1305)
            .set_internal_metadata_with_schema(
                sender_subidentity,
                "",
                "",
                schema,
                EncryptionMethod::None,
            )
            .set_external_metadata_with_other(receiver, sender, other)
            .build()
    }

    /// Redeem a registration code for a new profile
    #[allow(clippy::too_many_arguments)]
    pub fn use_code_registration_for_profile(
        profile_encryption_keys: EncryptionKeyPair,
        profile_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        code: &str,
        identity_type: &str,
        permission_type: &str,
        registration_name: &str,
        sender_subidentity: &str,
        sender: &str,
        receiver: &str,
    ) -> Result<ShinkaiMessage> {
        let registration_code = RegistrationCode {
            code: code.to_string(),
            registration_name: registration_name.to_string(),
            device_identity_pk: String::new(),
            device_encryption_pk: String::new(),
            profile_identity_pk: profile_signing_keys.public_hex(),
            profile_encryption_pk: profile_encryption_keys.public_hex(),
            identity_type: identity_type.to_string(),
            permission_type: permission_type.to_string(),
        };

        Self::custom_message_to_node(
            profile_encryption_keys,
            profile_signing_keys,
            receiver_public_key,
            &registration_code,
            sender_subidentity,
            sender,
            receiver,
            MessageSchemaType::UseRegistrationCode,
        )
    }

    /// Redeem a registration code for a new device
    #[allow(clippy::too_many_arguments)]
    pub fn use_code_registration_for_device(
        my_device_encryption_keys: EncryptionKeyPair,
        my_device_signing_keys: SigningKeyPair,
        profile_encryption_keys: &EncryptionKeyPair,
        profile_signing_keys: &SigningKeyPair,
        receiver_public_key: [u8; 32],
        code: &str,
        identity_type: &str,
        permission_type: &str,
        registration_name: &str,
        sender_subidentity: &str,
        sender: &str,
        receiver: &str,
    ) -> Result<ShinkaiMessage> {
        let registration_code = RegistrationCode {
            code: code.to_string(),
            registration_name: registration_name.to_string(),
            device_identity_pk: my_device_signing_keys.public_hex(),
            device_encryption_pk: my_device_encryption_keys.public_hex(),
            profile_identity_pk: profile_signing_keys.public_hex(),
            profile_encryption_pk: profile_encryption_keys.public_hex(),
            identity_type: identity_type.to_string(),
            permission_type: permission_type.to_string(),
        };

        Self::custom_message_to_node(
            my_device_encryption_keys,
            my_device_signing_keys,
            receiver_public_key,
            &registration_code,
            sender_subidentity,
            sender,
            receiver,
            MessageSchemaType::UseRegistrationCode,
        )
    }

    /// First-boot device registration against a local node, no code needed
    ///
    /// The node does not know our keys yet, so nothing is encrypted; the
    /// device's encryption public key travels in `external_metadata.other`.
    #[allow(clippy::too_many_arguments)]
    pub fn initial_registration_with_no_code_for_device(
        my_device_encryption_keys: EncryptionKeyPair,
        my_device_signing_keys: SigningKeyPair,
        profile_encryption_keys: &EncryptionKeyPair,
        profile_signing_keys: &SigningKeyPair,
        registration_name: &str,
        sender_subidentity: &str,
        sender: &str,
        receiver: &str,
    ) -> Result<ShinkaiMessage> {
        let other = my_device_encryption_keys.public_hex();
        let registration_code = RegistrationCode {
            code: String::new(),
            registration_name: registration_name.to_string(),
            device_identity_pk: my_device_signing_keys.public_hex(),
            device_encryption_pk: other.clone(),
            profile_identity_pk: profile_signing_keys.public_hex(),
            profile_encryption_pk: profile_encryption_keys.public_hex(),
            identity_type: "device".to_string(),
            permission_type: "admin".to_string(),
        };
        let body = serde_json::to_string(&registration_code)?;
        let receiver_public_key = my_device_encryption_keys.public_bytes();

        Self::new(
            my_device_encryption_keys,
            my_device_signing_keys,
            receiver_public_key,
        )
        .set_message_raw_content(body)
        .set_body_encryption(EncryptionMethod::None)
        .set_internal_metadata_with_schema(
            sender_subidentity,
            "",
            "",
            MessageSchemaType::UseRegistrationCode,
            EncryptionMethod::None,
        )
        .set_external_metadata_with_other(receiver, sender, other)
        .build()
    }

    /// Hand a files-inbox symmetric key to the node, body-encrypted
    #[allow(clippy::too_many_arguments)]
    pub fn create_files_inbox_with_sym_key(
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        inbox: &str,
        symmetric_key_sk: &str,
        sender_subidentity: &str,
        sender: &str,
        receiver: &str,
    ) -> Result<ShinkaiMessage> {
        Self::new(my_encryption_keys, my_signing_keys, receiver_public_key)
            .set_message_raw_content(symmetric_key_sk)
            .set_body_encryption(EncryptionMethod::DiffieHellmanChaChaPoly1305)
            .set_internal_metadata_with_schema(
                sender_subidentity,
                "",
                inbox,
                MessageSchemaType::SymmetricKeyExchange,
                EncryptionMethod::None,
            )
            .set_external_metadata_with_intra_sender(receiver, sender, sender_subidentity)
            .build()
    }

    /// Ask the node for every inbox a profile participates in
    pub fn get_all_inboxes_for_profile(
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        full_profile: &str,
        sender_subidentity: &str,
        sender: &str,
        receiver: &str,
    ) -> Result<ShinkaiMessage> {
        Self::new(my_encryption_keys, my_signing_keys, receiver_public_key)
            .set_message_raw_content(full_profile)
            .set_internal_metadata_with_schema(
                sender_subidentity,
                "",
                "",
                MessageSchemaType::TextContent,
                EncryptionMethod::None,
            )
            .set_body_encryption(EncryptionMethod::DiffieHellmanChaChaPoly1305)
            .set_external_metadata_with_intra_sender(receiver, sender, sender_subidentity)
            .build()
    }

    /// Page through the most recent messages of an inbox
    #[allow(clippy::too_many_arguments)]
    pub fn get_last_messages_from_inbox(
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        inbox: &str,
        count: usize,
        offset: Option<String>,
        sender_subidentity: &str,
        sender: &str,
        receiver: &str,
    ) -> Result<ShinkaiMessage> {
        let request = APIGetMessagesFromInboxRequest {
            inbox: inbox.to_string(),
            count,
            offset,
        };

        Self::custom_message_to_node(
            my_encryption_keys,
            my_signing_keys,
            receiver_public_key,
            &request,
            sender_subidentity,
            sender,
            receiver,
            MessageSchemaType::APIGetMessagesFromInboxRequest,
        )
    }

    /// Page through the most recent unread messages of an inbox
    #[allow(clippy::too_many_arguments)]
    pub fn get_last_unread_messages_from_inbox(
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        inbox: &str,
        count: usize,
        offset: Option<String>,
        sender_subidentity: &str,
        sender: &str,
        receiver: &str,
    ) -> Result<ShinkaiMessage> {
        let request = APIGetMessagesFromInboxRequest {
            inbox: inbox.to_string(),
            count,
            offset,
        };

        Self::custom_message_to_node(
            my_encryption_keys,
            my_signing_keys,
            receiver_public_key,
            &request,
            sender_subidentity,
            sender,
            receiver,
            MessageSchemaType::APIGetMessagesFromInboxRequest,
        )
    }

    /// Register an agent under the sender's profile
    pub fn request_add_agent(
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        agent: SerializedAgent,
        sender_subidentity: &str,
        sender: &str,
        receiver: &str,
    ) -> Result<ShinkaiMessage> {
        let request = APIAddAgentRequest { agent };

        Self::custom_message_to_node(
            my_encryption_keys,
            my_signing_keys,
            receiver_public_key,
            &request,
            sender_subidentity,
            sender,
            receiver,
            MessageSchemaType::APIAddAgentRequest,
        )
    }

    /// Ask the node to generate a registration code
    #[allow(clippy::too_many_arguments)]
    pub fn request_code_registration(
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        permissions: &str,
        code_type: &str,
        sender_subidentity: &str,
        sender: &str,
        receiver: &str,
    ) -> Result<ShinkaiMessage> {
        let request = RegistrationCodeRequest {
            permissions: permissions.to_string(),
            code_type: code_type.to_string(),
        };

        Self::custom_message_to_node(
            my_encryption_keys,
            my_signing_keys,
            receiver_public_key,
            &request,
            sender_subidentity,
            sender,
            receiver,
            MessageSchemaType::CreateRegistrationCode,
        )
    }

    /// Mark an inbox read up to a point in time
    #[allow(clippy::too_many_arguments)]
    pub fn read_up_to_time(
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        inbox: &str,
        up_to_time: &str,
        sender_subidentity: &str,
        sender: &str,
        receiver: &str,
    ) -> Result<ShinkaiMessage> {
        let request = APIReadUpToTimeRequest {
            inbox: inbox.to_string(),
            up_to_time: up_to_time.to_string(),
        };

        Self::custom_message_to_node(
            my_encryption_keys,
            my_signing_keys,
            receiver_public_key,
            &request,
            sender_subidentity,
            sender,
            receiver,
            MessageSchemaType::APIReadUpToTimeRequest,
        )
    }

    /// Rename an inbox, body-encrypted for the node
    #[allow(clippy::too_many_arguments)]
    pub fn update_inbox_name(
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        sender: &str,
        sender_subidentity: &str,
        receiver: &str,
        receiver_subidentity: &str,
        inbox: &str,
        inbox_name: &str,
    ) -> Result<ShinkaiMessage> {
        Self::new(my_encryption_keys, my_signing_keys, receiver_public_key)
            .set_message_raw_content(inbox_name)
            .set_message_schema_type(MessageSchemaType::TextContent)
            .set_body_encryption(EncryptionMethod::DiffieHellmanChaChaPoly1305)
            .set_internal_metadata_with_inbox(
                sender_subidentity,
                receiver_subidentity,
                inbox,
                EncryptionMethod::None,
            )
            .set_external_metadata_with_intra_sender(receiver, sender, sender_subidentity)
            .build()
    }

    /// Send a text message into an explicit inbox, body-encrypted
    #[allow(clippy::too_many_arguments)]
    pub fn send_text_message_with_inbox(
        my_encryption_keys: EncryptionKeyPair,
        my_signing_keys: SigningKeyPair,
        receiver_public_key: [u8; 32],
        sender: &str,
        sender_subidentity: &str,
        receiver: &str,
        receiver_subidentity: &str,
        inbox: &str,
        text_message: &str,
    ) -> Result<ShinkaiMessage> {
        Self::new(my_encryption_keys, my_signing_keys, receiver_public_key)
            .set_message_raw_content(text_message)
            .set_message_schema_type(MessageSchemaType::TextContent)
            .set_body_encryption(EncryptionMethod::DiffieHellmanChaChaPoly1305)
            .set_internal_metadata_with_inbox(
                sender_subidentity,
                receiver_subidentity,
                inbox,
                EncryptionMethod::None,
            )
            .set_external_metadata_with_intra_sender(receiver, sender, sender_subidentity)
            .build()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn alice_keys() -> (EncryptionKeyPair, SigningKeyPair) {
        (
            EncryptionKeyPair::from_seed(&[1u8; 32]),
            SigningKeyPair::from_seed(&[2u8; 32]),
        )
    }

    fn bob_keys() -> (EncryptionKeyPair, SigningKeyPair) {
        (
            EncryptionKeyPair::from_seed(&[3u8; 32]),
            SigningKeyPair::from_seed(&[4u8; 32]),
        )
    }

    #[test]
    fn test_ack_message() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let message = ShinkaiMessageBuilder::ack_message(
            alice_enc,
            alice_sig.clone(),
            bob_enc.public_bytes(),
            "@@alice.shinkai",
            "@@bob.shinkai",
        )
        .unwrap();

        let body = message.body_unencrypted().unwrap();
        let data = body.data_unencrypted().unwrap();
        assert_eq!(data.message_raw_content, "ACK");
        assert_eq!(message.encryption, EncryptionMethod::None);
        assert_eq!(message.external_metadata.sender, "@@alice.shinkai");
        assert_eq!(message.external_metadata.recipient, "@@bob.shinkai");

        assert!(message
            .verify_outer_layer_signature(&alice_sig.verifying_key())
            .unwrap());
    }

    #[test]
    fn test_missing_metadata_is_rejected() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let builder = ShinkaiMessageBuilder::new(
            alice_enc.clone(),
            alice_sig.clone(),
            bob_enc.public_bytes(),
        )
        .set_message_raw_content("hello");
        assert!(matches!(
            builder.build(),
            Err(Error::BuilderIncomplete("internal_metadata"))
        ));

        let builder = ShinkaiMessageBuilder::new(alice_enc, alice_sig, bob_enc.public_bytes())
            .set_message_raw_content("hello")
            .set_empty_non_encrypted_internal_metadata();
        assert!(matches!(
            builder.build(),
            Err(Error::BuilderIncomplete("external_metadata"))
        ));
    }

    #[test]
    fn test_double_encryption_needs_second_receiver_key() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let builder = ShinkaiMessageBuilder::new(
            alice_enc.clone(),
            alice_sig.clone(),
            bob_enc.public_bytes(),
        )
        .set_message_raw_content("secret")
        .set_empty_encrypted_internal_metadata()
        .set_body_encryption(EncryptionMethod::DiffieHellmanChaChaPoly1305)
        .set_external_metadata("@@bob.shinkai", "@@alice.shinkai");

        assert!(matches!(
            builder.build(),
            Err(Error::AmbiguousEncryptionTarget)
        ));

        // With an explicit second receiver key the same build succeeds
        let node_enc = EncryptionKeyPair::from_seed(&[5u8; 32]);
        let message = builder
            .clone()
            .set_optional_second_public_key_receiver_node(node_enc.public_bytes())
            .build()
            .unwrap();
        assert!(matches!(message.body, MessageBody::Encrypted(_)));
    }

    #[test]
    fn test_empty_inbox_is_derived_deterministically() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let message = ShinkaiMessageBuilder::new(alice_enc, alice_sig, bob_enc.public_bytes())
            .set_message_raw_content("hi")
            .set_message_schema_type(MessageSchemaType::TextContent)
            .set_internal_metadata("main", "", EncryptionMethod::None)
            .set_no_body_encryption()
            .set_external_metadata_with_intra_sender("@@bob.shinkai", "@@alice.shinkai", "main")
            .build()
            .unwrap();

        let body = message.body_unencrypted().unwrap();
        assert_eq!(
            body.internal_metadata.inbox,
            "inbox::@@alice.shinkai/main::@@bob.shinkai::false"
        );
    }

    #[test]
    fn test_explicit_inbox_is_kept() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let message = ShinkaiMessageBuilder::new(alice_enc, alice_sig, bob_enc.public_bytes())
            .set_message_raw_content("hi")
            .set_internal_metadata_with_inbox(
                "",
                "",
                "inbox::@@alice.shinkai::@@bob.shinkai::false",
                EncryptionMethod::None,
            )
            .set_no_body_encryption()
            .set_external_metadata("@@bob.shinkai", "@@alice.shinkai")
            .build()
            .unwrap();

        let body = message.body_unencrypted().unwrap();
        assert_eq!(
            body.internal_metadata.inbox,
            "inbox::@@alice.shinkai::@@bob.shinkai::false"
        );
    }

    #[test]
    fn test_inner_signature_is_always_present() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let message = ShinkaiMessageBuilder::new(alice_enc, alice_sig.clone(), bob_enc.public_bytes())
            .set_message_raw_content("hi")
            .set_empty_non_encrypted_internal_metadata()
            .set_no_body_encryption()
            .set_external_metadata("@@bob.shinkai", "@@alice.shinkai")
            .build()
            .unwrap();

        let body = message.body_unencrypted().unwrap();
        assert!(!body.internal_metadata.signature.is_empty());
        assert!(body
            .verify_inner_layer_signature(&alice_sig.verifying_key())
            .unwrap());
    }

    #[test]
    fn test_body_encrypted_build_round_trips() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let message = ShinkaiMessageBuilder::new(
            alice_enc.clone(),
            alice_sig.clone(),
            bob_enc.public_bytes(),
        )
        .set_message_raw_content("for bob only")
        .set_message_schema_type(MessageSchemaType::TextContent)
        .set_empty_non_encrypted_internal_metadata()
        .set_body_encryption(EncryptionMethod::DiffieHellmanChaChaPoly1305)
        .set_external_metadata("@@bob.shinkai", "@@alice.shinkai")
        .build()
        .unwrap();

        assert!(matches!(message.body, MessageBody::Encrypted(_)));
        // The outer signature covers the encrypted body
        assert!(message
            .verify_outer_layer_signature(&alice_sig.verifying_key())
            .unwrap());

        let decrypted = message
            .decrypt_outer_layer(&bob_enc, &alice_enc.public_bytes())
            .unwrap();
        let body = decrypted.body_unencrypted().unwrap();
        assert!(body
            .verify_inner_layer_signature(&alice_sig.verifying_key())
            .unwrap());
        assert_eq!(
            body.data_unencrypted().unwrap().message_raw_content,
            "for bob only"
        );
    }

    #[test]
    fn test_data_encrypted_build_round_trips() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let message = ShinkaiMessageBuilder::new(
            alice_enc.clone(),
            alice_sig.clone(),
            bob_enc.public_bytes(),
        )
        .set_message_raw_content("subidentity secret")
        .set_message_schema_type(MessageSchemaType::TextContent)
        .set_empty_encrypted_internal_metadata()
        .set_no_body_encryption()
        .set_external_metadata("@@bob.shinkai", "@@alice.shinkai")
        .build()
        .unwrap();

        let body = message.body_unencrypted().unwrap();
        assert!(matches!(body.message_data, MessageData::Encrypted(_)));
        // Inner signature covers the encrypted data
        assert!(body
            .verify_inner_layer_signature(&alice_sig.verifying_key())
            .unwrap());

        let decrypted_body = body
            .decrypt_data_layer(&bob_enc, &alice_enc.public_bytes())
            .unwrap();
        let data = decrypted_body.data_unencrypted().unwrap();
        assert_eq!(data.message_raw_content, "subidentity secret");
        assert_eq!(data.message_content_schema, MessageSchemaType::TextContent);
    }

    #[test]
    fn test_builder_can_build_twice() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let builder = ShinkaiMessageBuilder::new(alice_enc, alice_sig, bob_enc.public_bytes())
            .set_message_raw_content("hi")
            .set_empty_non_encrypted_internal_metadata()
            .set_no_body_encryption()
            .set_external_metadata_with_schedule(
                "@@bob.shinkai",
                "@@alice.shinkai",
                "2024-01-18T22:05:17.185Z",
            );

        let first = builder.build().unwrap();
        let second = builder.build().unwrap();
        // Same inputs, same fixed schedule: identical signed plaintext messages
        assert_eq!(first, second);
    }

    #[test]
    fn test_job_message_targets_the_job_inbox() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let message = ShinkaiMessageBuilder::job_message(
            "job123",
            "run it",
            "",
            alice_enc,
            alice_sig,
            bob_enc.public_bytes(),
            "@@alice.shinkai",
            "main",
            "@@bob.shinkai",
            "",
        )
        .unwrap();

        let body = message.body_unencrypted().unwrap();
        assert_eq!(body.internal_metadata.inbox, "job_inbox::job123::false");

        let data = body.data_unencrypted().unwrap();
        assert_eq!(
            data.message_content_schema,
            MessageSchemaType::JobMessageSchema
        );
        let payload: JobMessage = serde_json::from_str(&data.message_raw_content).unwrap();
        assert_eq!(payload.job_id, "job123");
        assert_eq!(payload.content, "run it");
    }

    #[test]
    fn test_job_message_from_agent_is_plaintext() {
        let (_, alice_sig) = alice_keys();

        let message = ShinkaiMessageBuilder::job_message_from_agent(
            "job123",
            "done",
            alice_sig.clone(),
            "@@alice.shinkai",
            "@@bob.shinkai",
        )
        .unwrap();

        assert_eq!(message.encryption, EncryptionMethod::None);
        let body = message.body_unencrypted().unwrap();
        assert_eq!(body.internal_metadata.inbox, "job_inbox::job123::false");
        assert!(message
            .verify_outer_layer_signature(&alice_sig.verifying_key())
            .unwrap());
    }

    #[test]
    fn test_custom_message_carries_sender_encryption_key_in_other() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let message = ShinkaiMessageBuilder::custom_message_to_node(
            alice_enc.clone(),
            alice_sig,
            bob_enc.public_bytes(),
            &serde_json::json!({"k": "v"}),
            "main",
            "@@alice.shinkai",
            "@@bob.shinkai",
            MessageSchemaType::TextContent,
        )
        .unwrap();

        assert_eq!(message.external_metadata.other, alice_enc.public_hex());
        assert!(matches!(message.body, MessageBody::Encrypted(_)));

        // The node decrypts using the key announced in `other`
        let sender_pk =
            crate::crypto::keys::encryption_public_key_from_hex(&message.external_metadata.other)
                .unwrap();
        let decrypted = message.decrypt_outer_layer(&bob_enc, &sender_pk).unwrap();
        let data = decrypted
            .body_unencrypted()
            .unwrap()
            .data_unencrypted()
            .unwrap();
        assert_eq!(data.message_raw_content, r#"{"k":"v"}"#);
    }

    #[test]
    fn test_read_up_to_time_payload() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let message = ShinkaiMessageBuilder::read_up_to_time(
            alice_enc.clone(),
            alice_sig,
            bob_enc.public_bytes(),
            "inbox::@@alice.shinkai::@@bob.shinkai::false",
            "2024-01-01T00:00:00.000Z",
            "main",
            "@@alice.shinkai",
            "@@bob.shinkai",
        )
        .unwrap();

        let decrypted = message
            .decrypt_outer_layer(&bob_enc, &alice_enc.public_bytes())
            .unwrap();
        let data = decrypted
            .body_unencrypted()
            .unwrap()
            .data_unencrypted()
            .unwrap();
        assert_eq!(
            data.message_content_schema,
            MessageSchemaType::APIReadUpToTimeRequest
        );
        let payload: serde_json::Value = serde_json::from_str(&data.message_raw_content).unwrap();
        assert_eq!(payload["upToTime"], "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_initial_registration_is_plaintext_and_self_addressed() {
        let (device_enc, device_sig) = alice_keys();
        let profile_enc = EncryptionKeyPair::from_seed(&[7u8; 32]);
        let profile_sig = SigningKeyPair::from_seed(&[8u8; 32]);

        let message = ShinkaiMessageBuilder::initial_registration_with_no_code_for_device(
            device_enc.clone(),
            device_sig.clone(),
            &profile_enc,
            &profile_sig,
            "main_device",
            "main_device",
            "@@localhost.shinkai",
            "@@localhost.shinkai",
        )
        .unwrap();

        assert_eq!(message.encryption, EncryptionMethod::None);
        assert_eq!(message.external_metadata.other, device_enc.public_hex());

        let data = message
            .body_unencrypted()
            .unwrap()
            .data_unencrypted()
            .unwrap();
        assert_eq!(
            data.message_content_schema,
            MessageSchemaType::UseRegistrationCode
        );
        let code: RegistrationCode = serde_json::from_str(&data.message_raw_content).unwrap();
        assert_eq!(code.code, "");
        assert_eq!(code.registration_name, "main_device");
        assert_eq!(code.identity_type, "device");
        assert_eq!(code.permission_type, "admin");
        assert_eq!(code.device_identity_pk, device_sig.public_hex());
        assert_eq!(code.profile_encryption_pk, profile_enc.public_hex());
    }

    #[test]
    fn test_error_message_encrypts_the_data_layer() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let message = ShinkaiMessageBuilder::error_message(
            alice_enc.clone(),
            alice_sig,
            bob_enc.public_bytes(),
            "@@alice.shinkai",
            "@@bob.shinkai",
            "boom",
        )
        .unwrap();

        assert_eq!(message.encryption, EncryptionMethod::None);
        let body = message.body_unencrypted().unwrap();
        assert!(matches!(body.message_data, MessageData::Encrypted(_)));

        let decrypted = body
            .decrypt_data_layer(&bob_enc, &alice_enc.public_bytes())
            .unwrap();
        assert_eq!(
            decrypted.data_unencrypted().unwrap().message_raw_content,
            "{error: \"boom\"}"
        );
    }

    #[test]
    fn test_job_creation_payload() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let scope = JobScope {
            local: vec!["doc1".into()],
            database: vec![],
        };
        let message = ShinkaiMessageBuilder::job_creation(
            scope.clone(),
            alice_enc,
            alice_sig,
            bob_enc.public_bytes(),
            "@@alice.shinkai",
            "main",
            "@@bob.shinkai",
            "",
        )
        .unwrap();

        let data = message
            .body_unencrypted()
            .unwrap()
            .data_unencrypted()
            .unwrap();
        assert_eq!(
            data.message_content_schema,
            MessageSchemaType::JobCreationSchema
        );
        let payload: JobCreation = serde_json::from_str(&data.message_raw_content).unwrap();
        assert_eq!(payload.scope, scope);
        assert_eq!(message.external_metadata.intra_sender, "main");
    }

    #[test]
    fn test_send_text_message_with_inbox() {
        let (alice_enc, alice_sig) = alice_keys();
        let (bob_enc, _) = bob_keys();

        let message = ShinkaiMessageBuilder::send_text_message_with_inbox(
            alice_enc.clone(),
            alice_sig,
            bob_enc.public_bytes(),
            "@@alice.shinkai",
            "main",
            "@@bob.shinkai",
            "",
            "inbox::@@alice.shinkai/main::@@bob.shinkai::false",
            "hello bob",
        )
        .unwrap();

        assert!(matches!(message.body, MessageBody::Encrypted(_)));
        let decrypted = message
            .decrypt_outer_layer(&bob_enc, &alice_enc.public_bytes())
            .unwrap();
        let body = decrypted.body_unencrypted().unwrap();
        assert_eq!(
            body.internal_metadata.inbox,
            "inbox::@@alice.shinkai/main::@@bob.shinkai::false"
        );
        assert_eq!(
            body.data_unencrypted().unwrap().message_raw_content,
            "hello bob"
        );
    }
}
