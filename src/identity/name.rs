//! # Shinkai Names
//!
//! The hierarchical identity grammar used to address nodes and their
//! subidentities.
//!
//! ## Name Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SHINKAI NAME FORMAT                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Example: @@alice.shinkai/main/device/phone1                           │
//! │                                                                         │
//! │  ┌───────────────────┬──────────┬──────────────┬───────────────────┐   │
//! │  │       node        │ profile  │     type     │ subidentity name  │   │
//! │  ├───────────────────┼──────────┼──────────────┼───────────────────┤   │
//! │  │ @@alice.shinkai   │   main   │    device    │      phone1       │   │
//! │  └───────────────────┴──────────┴──────────────┴───────────────────┘   │
//! │                                                                         │
//! │  Segment rules:                                                        │
//! │  ┌─────────┬──────────────────────────────────────────────────────┐    │
//! │  │  node   │  @@<label>.shinkai; label is [a-zA-Z0-9_.]           │    │
//! │  ├─────────┼──────────────────────────────────────────────────────┤    │
//! │  │ profile │  alphanumeric/underscore                             │    │
//! │  ├─────────┼──────────────────────────────────────────────────────┤    │
//! │  │  type   │  closed set: "device" | "agent"                      │    │
//! │  ├─────────┼──────────────────────────────────────────────────────┤    │
//! │  │  name   │  alphanumeric/underscore; MANDATORY when type given  │    │
//! │  └─────────┴──────────────────────────────────────────────────────┘    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Construction canonicalizes: a bare label gains the `@@` prefix and
//! `.shinkai` suffix, and the whole name is lowercased. Canonicalization is
//! idempotent, so re-parsing a name's `get_value()` yields the same name.
//! Validation runs a fixed ordered rule set and fails fast with the first
//! violated rule; `InvalidNameFormat` carries both the offending string and
//! the rule.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::messaging::message::ShinkaiMessage;

/// Kinds of leaf subidentities a name can address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShinkaiSubidentityType {
    /// A physical or virtual device belonging to a profile
    Device,
    /// An AI agent belonging to a profile
    Agent,
}

impl ShinkaiSubidentityType {
    /// The segment spelling of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            ShinkaiSubidentityType::Device => "device",
            ShinkaiSubidentityType::Agent => "agent",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "device" => Some(ShinkaiSubidentityType::Device),
            "agent" => Some(ShinkaiSubidentityType::Agent),
            _ => None,
        }
    }
}

impl fmt::Display for ShinkaiSubidentityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated, canonicalized hierarchical identity
///
/// Immutable once constructed; all accessors borrow.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShinkaiName {
    full_name: String,
    node_name: String,
    profile_name: Option<String>,
    subidentity_type: Option<ShinkaiSubidentityType>,
    subidentity_name: Option<String>,
}

impl ShinkaiName {
    /// Parse and canonicalize a raw name
    ///
    /// The node segment is auto-prefixed with `@@` and auto-suffixed with
    /// `.shinkai` when missing, then the whole name is validated and
    /// lowercased.
    pub fn new(raw_name: &str) -> Result<Self> {
        let corrected = Self::correct_node_name(raw_name);
        Self::validate_name(&corrected)?;

        let full_name = corrected.to_lowercase();
        let mut parts = full_name.split('/');

        // validate_name guarantees 1-4 segments and a leading node segment
        let node_name = parts.next().unwrap_or_default().to_string();
        let profile_name = parts.next().map(str::to_string);
        let subidentity_type = parts.next().and_then(ShinkaiSubidentityType::from_segment);
        let subidentity_name = parts.next().map(str::to_string);

        Ok(Self {
            full_name,
            node_name,
            profile_name,
            subidentity_type,
            subidentity_name,
        })
    }

    /// Validate a name against the grammar without canonicalizing it
    ///
    /// Rules run in a fixed order and the first violation wins.
    pub fn validate_name(raw_name: &str) -> Result<()> {
        let parts: Vec<&str> = raw_name.split('/').collect();

        if parts.is_empty() || parts.len() > 4 {
            return Self::rule_violation(
                raw_name,
                "name must have one to four parts: node, profile, type (device or agent), and name",
            );
        }

        let node = parts[0];
        if !node.starts_with("@@") || !node.ends_with(".shinkai") {
            return Self::rule_violation(
                raw_name,
                "node part must start with '@@' and end with '.shinkai'",
            );
        }
        let label = &node[2..node.len() - ".shinkai".len()];
        if label.is_empty() || !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
            return Self::rule_violation(raw_name, "node part contains invalid characters");
        }

        for (index, part) in parts.iter().enumerate().skip(1) {
            if index == 2 {
                if ShinkaiSubidentityType::from_segment(part).is_none() {
                    return Self::rule_violation(
                        raw_name,
                        "the third part must be either 'agent' or 'device'",
                    );
                }
            } else if !part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                || part.contains(".shinkai")
            {
                return Self::rule_violation(
                    raw_name,
                    "name parts must be alphanumeric or underscore and must not contain '.shinkai'",
                );
            }
        }

        if parts.len() == 3 && ShinkaiSubidentityType::from_segment(parts[2]).is_some() {
            return Self::rule_violation(
                raw_name,
                "a type part of 'agent' or 'device' requires a fourth part",
            );
        }

        Ok(())
    }

    fn rule_violation(raw_name: &str, rule: &str) -> Result<()> {
        tracing::debug!(name = raw_name, rule, "rejected shinkai name");
        Err(Error::InvalidNameFormat {
            name: raw_name.to_string(),
            rule: rule.to_string(),
        })
    }

    /// Whether a raw name passes validation as-is, with no canonicalization
    pub fn is_fully_valid(raw_name: &str) -> bool {
        Self::validate_name(raw_name).is_ok()
    }

    /// Add the `@@` prefix and `.shinkai` suffix to the node segment when missing
    ///
    /// Segments after the node ride along untouched.
    pub fn correct_node_name(raw_name: &str) -> String {
        let (node, rest) = match raw_name.split_once('/') {
            Some((node, rest)) => (node, Some(rest)),
            None => (raw_name, None),
        };

        let mut node = node.to_string();
        if !node.starts_with("@@") {
            node = format!("@@{node}");
        }
        if !node.ends_with(".shinkai") {
            node = format!("{node}.shinkai");
        }

        match rest {
            Some(rest) => format!("{node}/{rest}"),
            None => node,
        }
    }

    /// Whether `name` is a bare, already-canonical node identity
    pub fn is_valid_node_identity_name_and_no_subidentities(name: &str) -> bool {
        name.starts_with("@@") && name.ends_with(".shinkai") && !name.contains('/')
    }

    // ------------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------------

    /// Build a name from a bare node identity (no subidentities allowed)
    pub fn from_node_name(node_name: &str) -> Result<Self> {
        if node_name.contains('/') {
            return Err(Error::InvalidNameFormat {
                name: node_name.to_string(),
                rule: "a node name must not contain '/'".to_string(),
            });
        }
        Self::new(node_name)
    }

    /// Build a `node/profile` name
    pub fn from_node_and_profile(node_name: &str, profile_name: &str) -> Result<Self> {
        let node_name = Self::correct_node_name(node_name);
        Self::new(&format!(
            "{}/{}",
            node_name.to_lowercase(),
            profile_name.to_lowercase()
        ))
    }

    /// Build a full four-segment `node/profile/type/name` identity
    pub fn from_node_and_profile_and_type_and_name(
        node_name: &str,
        profile_name: &str,
        subidentity_type: ShinkaiSubidentityType,
        subidentity_name: &str,
    ) -> Result<Self> {
        let node_name = Self::correct_node_name(node_name);
        Self::new(&format!(
            "{}/{}/{}/{}",
            node_name.to_lowercase(),
            profile_name.to_lowercase(),
            subidentity_type,
            subidentity_name.to_lowercase()
        ))
    }

    /// The sender node identity of a message
    pub fn from_message_sender(message: &ShinkaiMessage) -> Result<Self> {
        Self::new(&message.external_metadata.sender)
    }

    /// The recipient node identity of a message
    pub fn from_message_recipient(message: &ShinkaiMessage) -> Result<Self> {
        Self::new(&message.external_metadata.recipient)
    }

    /// The sender identity extended with `external_metadata.intra_sender`
    ///
    /// Works on encrypted messages too, since both fields live in the
    /// envelope.
    pub fn from_message_using_sender_and_intra_sender(message: &ShinkaiMessage) -> Result<Self> {
        Self::new(&format!(
            "{}/{}",
            message.external_metadata.sender, message.external_metadata.intra_sender
        ))
    }

    /// The full sender identity of a message, including its subidentity
    ///
    /// Requires the body to be unencrypted, since the subidentity lives in
    /// the internal metadata.
    pub fn from_message_using_sender_subidentity(message: &ShinkaiMessage) -> Result<Self> {
        let body = message.body_unencrypted()?;
        let node = Self::new(&message.external_metadata.sender)?;

        let sender_subidentity = &body.internal_metadata.sender_subidentity;
        if sender_subidentity.is_empty() {
            Ok(node)
        } else {
            Self::new(&format!("{}/{}", node, sender_subidentity))
        }
    }

    /// The full recipient identity of a message, including its subidentity
    pub fn from_message_using_recipient_subidentity(message: &ShinkaiMessage) -> Result<Self> {
        let body = message.body_unencrypted()?;
        let node = Self::new(&message.external_metadata.recipient)?;

        let recipient_subidentity = &body.internal_metadata.recipient_subidentity;
        if recipient_subidentity.is_empty() {
            Ok(node)
        } else {
            Self::new(&format!("{}/{}", node, recipient_subidentity))
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// The canonical full name
    pub fn get_value(&self) -> &str {
        &self.full_name
    }

    /// The node segment
    pub fn get_node_name(&self) -> &str {
        &self.node_name
    }

    /// The profile segment, when present
    pub fn get_profile_name(&self) -> Option<&str> {
        self.profile_name.as_deref()
    }

    /// The device name, when this addresses a device
    pub fn get_device_name(&self) -> Option<&str> {
        if self.has_device() {
            self.subidentity_name.as_deref()
        } else {
            None
        }
    }

    /// The agent name, when this addresses an agent
    pub fn get_agent_name(&self) -> Option<&str> {
        if self.has_agent() {
            self.subidentity_name.as_deref()
        } else {
            None
        }
    }

    /// The subidentity type segment, when present
    pub fn get_subidentity_type(&self) -> Option<ShinkaiSubidentityType> {
        self.subidentity_type
    }

    /// Whether this name includes a profile segment
    pub fn has_profile(&self) -> bool {
        self.profile_name.is_some()
    }

    /// Whether this name addresses a device
    pub fn has_device(&self) -> bool {
        self.subidentity_type == Some(ShinkaiSubidentityType::Device)
    }

    /// Whether this name addresses an agent
    pub fn has_agent(&self) -> bool {
        self.subidentity_type == Some(ShinkaiSubidentityType::Agent)
    }

    /// Whether this is a bare node identity
    pub fn has_no_subidentities(&self) -> bool {
        self.profile_name.is_none() && self.subidentity_type.is_none()
    }

    /// Project this name down to `node/profile`
    pub fn extract_profile(&self) -> Result<ShinkaiName> {
        match &self.profile_name {
            Some(profile) => Self::new(&format!("{}/{}", self.node_name, profile)),
            None => Err(Error::InvalidNameFormat {
                name: self.full_name.clone(),
                rule: "this name does not include a profile".to_string(),
            }),
        }
    }

    /// Project this name down to its node identity
    pub fn extract_node(&self) -> ShinkaiName {
        Self {
            full_name: self.node_name.clone(),
            node_name: self.node_name.clone(),
            profile_name: None,
            subidentity_type: None,
            subidentity_name: None,
        }
    }

    /// Structural containment, used for authorization checks
    ///
    /// `@@a.shinkai` contains `@@a.shinkai/main`, which contains
    /// `@@a.shinkai/main/device/phone1`. A name contains itself.
    pub fn contains(&self, other: &ShinkaiName) -> bool {
        let self_parts: Vec<&str> = self.full_name.split('/').collect();
        let other_parts: Vec<&str> = other.full_name.split('/').collect();

        if self_parts.len() > other_parts.len() {
            return false;
        }
        self_parts
            .iter()
            .zip(other_parts.iter())
            .all(|(a, b)| a == b)
    }
}

impl fmt::Display for ShinkaiName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}

impl FromStr for ShinkaiName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for ShinkaiName {
    fn as_ref(&self) -> &str {
        &self.full_name
    }
}

impl Serialize for ShinkaiName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.full_name)
    }
}

impl<'de> Deserialize<'de> for ShinkaiName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ShinkaiName::new(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_four_segment_name() {
        let name = ShinkaiName::new("@@alice.shinkai/main/device/phone1").unwrap();

        assert_eq!(name.get_value(), "@@alice.shinkai/main/device/phone1");
        assert_eq!(name.get_node_name(), "@@alice.shinkai");
        assert_eq!(name.get_profile_name(), Some("main"));
        assert_eq!(
            name.get_subidentity_type(),
            Some(ShinkaiSubidentityType::Device)
        );
        assert_eq!(name.get_device_name(), Some("phone1"));
        assert_eq!(name.get_agent_name(), None);
    }

    #[test]
    fn test_bare_label_is_canonicalized() {
        let name = ShinkaiName::new("alice").unwrap();
        assert_eq!(name.get_value(), "@@alice.shinkai");
        assert!(name.has_no_subidentities());
    }

    #[test]
    fn test_canonicalization_is_idempotent() {
        for raw in [
            "alice",
            "@@Alice.shinkai",
            "@@alice.shinkai/Main",
            "@@alice.shinkai/main/agent/Helper",
        ] {
            let once = ShinkaiName::new(raw).unwrap();
            let twice = ShinkaiName::new(once.get_value()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_lowercasing() {
        let name = ShinkaiName::new("@@Alice.shinkai/MAIN").unwrap();
        assert_eq!(name.get_value(), "@@alice.shinkai/main");
        assert_eq!(name.get_profile_name(), Some("main"));
    }

    #[test]
    fn test_too_many_segments_rejected() {
        let err = ShinkaiName::new("@@a.shinkai/p/device/d/extra").unwrap_err();
        match err {
            Error::InvalidNameFormat { rule, .. } => {
                assert!(rule.contains("one to four parts"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bad_node_charset_rejected() {
        assert!(!ShinkaiName::is_fully_valid("@@al ice.shinkai"));
        assert!(!ShinkaiName::is_fully_valid("@@al-ice.shinkai"));
        assert!(!ShinkaiName::is_fully_valid("@@.shinkai"));
    }

    #[test]
    fn test_bad_profile_charset_rejected() {
        assert!(!ShinkaiName::is_fully_valid("@@alice.shinkai/ma in"));
        assert!(!ShinkaiName::is_fully_valid("@@alice.shinkai/ma.in"));
        assert!(!ShinkaiName::is_fully_valid(
            "@@alice.shinkai/profile.shinkai"
        ));
    }

    #[test]
    fn test_type_segment_is_a_closed_set() {
        assert!(ShinkaiName::is_fully_valid("@@a.shinkai/p/device/d"));
        assert!(ShinkaiName::is_fully_valid("@@a.shinkai/p/agent/a"));
        assert!(!ShinkaiName::is_fully_valid("@@a.shinkai/p/robot/r"));
    }

    #[test]
    fn test_type_without_fourth_segment_rejected() {
        let err = ShinkaiName::new("@@alice.shinkai/main/device").unwrap_err();
        match err {
            Error::InvalidNameFormat { rule, .. } => {
                assert!(rule.contains("requires a fourth part"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_node_and_profile() {
        let name = ShinkaiName::from_node_and_profile("alice", "main").unwrap();
        assert_eq!(name.get_value(), "@@alice.shinkai/main");
    }

    #[test]
    fn test_from_node_name_rejects_subidentities() {
        assert!(ShinkaiName::from_node_name("@@alice.shinkai/main").is_err());
        assert!(ShinkaiName::from_node_name("@@alice.shinkai").is_ok());
    }

    #[test]
    fn test_from_type_and_name_constructor() {
        let name = ShinkaiName::from_node_and_profile_and_type_and_name(
            "alice",
            "main",
            ShinkaiSubidentityType::Agent,
            "Helper",
        )
        .unwrap();
        assert_eq!(name.get_value(), "@@alice.shinkai/main/agent/helper");
        assert!(name.has_agent());
    }

    #[test]
    fn test_contains() {
        let node = ShinkaiName::new("@@alice.shinkai").unwrap();
        let profile = ShinkaiName::new("@@alice.shinkai/main").unwrap();
        let device = ShinkaiName::new("@@alice.shinkai/main/device/phone1").unwrap();
        let other = ShinkaiName::new("@@bob.shinkai/main").unwrap();

        assert!(node.contains(&profile));
        assert!(node.contains(&device));
        assert!(profile.contains(&device));
        assert!(node.contains(&node));

        assert!(!profile.contains(&node));
        assert!(!node.contains(&other));
    }

    #[test]
    fn test_extract_profile_and_node() {
        let device = ShinkaiName::new("@@alice.shinkai/main/device/phone1").unwrap();

        let profile = device.extract_profile().unwrap();
        assert_eq!(profile.get_value(), "@@alice.shinkai/main");

        let node = device.extract_node();
        assert_eq!(node.get_value(), "@@alice.shinkai");

        let bare = ShinkaiName::new("@@alice.shinkai").unwrap();
        assert!(bare.extract_profile().is_err());
    }

    #[test]
    fn test_node_identity_predicate() {
        assert!(ShinkaiName::is_valid_node_identity_name_and_no_subidentities(
            "@@alice.shinkai"
        ));
        assert!(!ShinkaiName::is_valid_node_identity_name_and_no_subidentities(
            "@@alice.shinkai/main"
        ));
        assert!(!ShinkaiName::is_valid_node_identity_name_and_no_subidentities(
            "alice.shinkai"
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let name = ShinkaiName::new("@@alice.shinkai/main").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"@@alice.shinkai/main\"");

        let restored: ShinkaiName = serde_json::from_str(&json).unwrap();
        assert_eq!(name, restored);

        assert!(serde_json::from_str::<ShinkaiName>("\"@@bad name.shinkai\"").is_err());
    }
}
