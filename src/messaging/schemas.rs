//! # Message Schemas
//!
//! The schema tag carried by every data layer, plus the typed payloads the
//! prebuilt message intents serialize into `message_raw_content`.
//!
//! The tag's serialized spelling is its variant name (`"TextContent"`,
//! `"JobMessageSchema"`, ...); the spelling is part of the wire contract
//! and also travels inside the data-layer ciphertext framing.

use serde::{Deserialize, Serialize};

/// Content schema tag for a message's data layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageSchemaType {
    /// No schema; plain control payloads such as ACK
    Empty,
    /// Free-form text content
    TextContent,
    /// Job creation request payload ([`JobCreation`])
    JobCreationSchema,
    /// Job conversation payload ([`JobMessage`])
    JobMessageSchema,
    /// Registration code creation request ([`RegistrationCodeRequest`])
    CreateRegistrationCode,
    /// Registration code redemption ([`RegistrationCode`])
    UseRegistrationCode,
    /// Symmetric key handoff for a files inbox
    SymmetricKeyExchange,
    /// Inbox message listing request ([`APIGetMessagesFromInboxRequest`])
    APIGetMessagesFromInboxRequest,
    /// Read-up-to-time request ([`APIReadUpToTimeRequest`])
    APIReadUpToTimeRequest,
    /// Agent registration request ([`APIAddAgentRequest`])
    APIAddAgentRequest,
}

impl MessageSchemaType {
    /// The wire spelling of this schema tag
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSchemaType::Empty => "Empty",
            MessageSchemaType::TextContent => "TextContent",
            MessageSchemaType::JobCreationSchema => "JobCreationSchema",
            MessageSchemaType::JobMessageSchema => "JobMessageSchema",
            MessageSchemaType::CreateRegistrationCode => "CreateRegistrationCode",
            MessageSchemaType::UseRegistrationCode => "UseRegistrationCode",
            MessageSchemaType::SymmetricKeyExchange => "SymmetricKeyExchange",
            MessageSchemaType::APIGetMessagesFromInboxRequest => "APIGetMessagesFromInboxRequest",
            MessageSchemaType::APIReadUpToTimeRequest => "APIReadUpToTimeRequest",
            MessageSchemaType::APIAddAgentRequest => "APIAddAgentRequest",
        }
    }

    /// Parse a wire spelling back into a schema tag
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "Empty" => Some(MessageSchemaType::Empty),
            "TextContent" => Some(MessageSchemaType::TextContent),
            "JobCreationSchema" => Some(MessageSchemaType::JobCreationSchema),
            "JobMessageSchema" => Some(MessageSchemaType::JobMessageSchema),
            "CreateRegistrationCode" => Some(MessageSchemaType::CreateRegistrationCode),
            "UseRegistrationCode" => Some(MessageSchemaType::UseRegistrationCode),
            "SymmetricKeyExchange" => Some(MessageSchemaType::SymmetricKeyExchange),
            "APIGetMessagesFromInboxRequest" => {
                Some(MessageSchemaType::APIGetMessagesFromInboxRequest)
            }
            "APIReadUpToTimeRequest" => Some(MessageSchemaType::APIReadUpToTimeRequest),
            "APIAddAgentRequest" => Some(MessageSchemaType::APIAddAgentRequest),
            _ => None,
        }
    }
}

impl Default for MessageSchemaType {
    fn default() -> Self {
        MessageSchemaType::Empty
    }
}

// ============================================================================
// INTENT PAYLOADS
// ============================================================================

/// Resource scope a job operates over
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobScope {
    /// Local resource identifiers
    pub local: Vec<String>,
    /// Database resource identifiers
    pub database: Vec<String>,
}

/// Payload for `JobCreationSchema` messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCreation {
    /// Scope the new job may read from
    pub scope: JobScope,
}

/// Payload for `JobMessageSchema` messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMessage {
    /// Job this message belongs to
    pub job_id: String,
    /// Message content
    pub content: String,
    /// Files inbox attached to the message, empty when none
    pub files_inbox: String,
}

/// Payload for `UseRegistrationCode` messages
///
/// All key material is hex-encoded; device fields are empty when a profile
/// (not a device) redeems the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCode {
    /// The registration code being redeemed; empty for no-code registration
    pub code: String,
    /// Name the new identity registers under
    pub registration_name: String,
    /// Device Ed25519 public key (hex), empty for profile registration
    pub device_identity_pk: String,
    /// Device X25519 public key (hex), empty for profile registration
    pub device_encryption_pk: String,
    /// Profile Ed25519 public key (hex)
    pub profile_identity_pk: String,
    /// Profile X25519 public key (hex)
    pub profile_encryption_pk: String,
    /// Identity type being registered ("device", "profile", ...)
    pub identity_type: String,
    /// Permission tier requested ("admin", "standard", ...)
    pub permission_type: String,
}

/// Payload for `CreateRegistrationCode` messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCodeRequest {
    /// Permission tier the generated code will grant
    pub permissions: String,
    /// Kind of identity the code registers
    pub code_type: String,
}

/// An agent definition as exchanged with the node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedAgent {
    /// Agent identifier, unique per profile
    pub id: String,
    /// Full Shinkai name of the agent
    pub full_identity_name: String,
    /// Whether the agent runs on the local node
    pub perform_locally: bool,
    /// Endpoint of the backing model provider
    pub external_url: String,
    /// Provider API key
    pub api_key: String,
    /// Provider-specific model descriptor, e.g. `{"OpenAI":{"model_type":"gpt-3"}}`
    pub model: serde_json::Value,
    /// Toolkits the agent may invoke
    pub toolkit_permissions: Vec<String>,
    /// Storage buckets the agent may touch
    pub storage_bucket_permissions: Vec<String>,
    /// Identities allowed to message this agent
    pub allowed_message_senders: Vec<String>,
}

/// Payload for `APIAddAgentRequest` messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct APIAddAgentRequest {
    /// The agent to register
    pub agent: SerializedAgent,
}

/// Payload for `APIGetMessagesFromInboxRequest` messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct APIGetMessagesFromInboxRequest {
    /// Inbox to read from
    pub inbox: String,
    /// Maximum number of messages to return
    pub count: usize,
    /// Pagination offset (message hash), `None` for the newest page
    pub offset: Option<String>,
}

/// Payload for `APIReadUpToTimeRequest` messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct APIReadUpToTimeRequest {
    /// Inbox to mark as read
    pub inbox: String,
    /// Everything at or before this time is marked read
    #[serde(rename = "upToTime")]
    pub up_to_time: String,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_wire_spelling_round_trip() {
        let all = [
            MessageSchemaType::Empty,
            MessageSchemaType::TextContent,
            MessageSchemaType::JobCreationSchema,
            MessageSchemaType::JobMessageSchema,
            MessageSchemaType::CreateRegistrationCode,
            MessageSchemaType::UseRegistrationCode,
            MessageSchemaType::SymmetricKeyExchange,
            MessageSchemaType::APIGetMessagesFromInboxRequest,
            MessageSchemaType::APIReadUpToTimeRequest,
            MessageSchemaType::APIAddAgentRequest,
        ];
        for schema in all {
            assert_eq!(MessageSchemaType::from_wire(schema.as_str()), Some(schema));
        }
        assert_eq!(MessageSchemaType::from_wire("NoSuchSchema"), None);
    }

    #[test]
    fn test_schema_serde_matches_wire_spelling() {
        let json = serde_json::to_string(&MessageSchemaType::TextContent).unwrap();
        assert_eq!(json, "\"TextContent\"");

        let parsed: MessageSchemaType = serde_json::from_str("\"JobMessageSchema\"").unwrap();
        assert_eq!(parsed, MessageSchemaType::JobMessageSchema);
    }

    #[test]
    fn test_job_message_payload_shape() {
        let payload = JobMessage {
            job_id: "job123".into(),
            content: "hello".into(),
            files_inbox: String::new(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"job_id":"job123","content":"hello","files_inbox":""})
        );
    }

    #[test]
    fn test_read_up_to_time_uses_camel_case_key() {
        let payload = APIReadUpToTimeRequest {
            inbox: "inbox_name".into(),
            up_to_time: "2022-01-01T00:00:00Z".into(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("upToTime").is_some());
        assert!(value.get("up_to_time").is_none());
    }
}
