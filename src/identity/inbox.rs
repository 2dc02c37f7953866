//! # Inbox Names
//!
//! Deterministic identifiers for conversation channels, derived rather than
//! persisted: every participant recomputes the same inbox name from the same
//! inputs without coordination.
//!
//! ## Inbox Name Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         INBOX NAME FORMAT                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Regular inbox (two or more participants):                             │
//! │                                                                         │
//! │    inbox::<identity>::<identity>[::<identity>...]::<is_e2e>            │
//! │                                                                         │
//! │    inbox::@@alice.shinkai/main::@@bob.shinkai::false                   │
//! │    ──┬── ────────┬──────────── ──────┬─────── ──┬──                     │
//! │    kind     participant         participant   e2e flag                 │
//! │                                                                         │
//! │  Job inbox (per-job channel):                                          │
//! │                                                                         │
//! │    job_inbox::<unique_id>::false                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! 3 to 101 `::`-delimited parts; the trailing part is a literal `"true"` or
//! `"false"`; every middle part of a regular inbox must be a fully-valid
//! [`ShinkaiName`]; a job inbox is never E2E and its id is never empty.
//!
//! Two-party inbox names sort the participant names lexicographically before
//! joining. The ordering is load-bearing: both peers derive the identical
//! inbox name independently, so `(A, B)` and `(B, A)` collapse to one inbox.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::identity::name::ShinkaiName;
use crate::messaging::message::ShinkaiMessage;

/// Minimum number of `::`-delimited parts in an inbox name
const MIN_PARTS: usize = 3;

/// Maximum number of `::`-delimited parts in an inbox name
const MAX_PARTS: usize = 101;

/// A parsed inbox identifier
///
/// The two variants are a tagged union over the wire string: a regular
/// conversation between identities, or a per-job channel. Both keep the
/// canonical (lowercased) string they were parsed from, so constructed and
/// re-parsed inbox names compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InboxName {
    /// A conversation channel between two or more identities
    RegularInbox {
        /// The canonical inbox string
        value: String,
        /// Whether the participant set is end-to-end-only
        is_e2e: bool,
        /// The participant identities, in the order they appear in `value`
        identities: Vec<ShinkaiName>,
    },
    /// A channel scoped to a single job
    JobInbox {
        /// The canonical inbox string
        value: String,
        /// The job id this inbox belongs to
        unique_id: String,
        /// Always `false`; kept so both variants expose the flag uniformly
        is_e2e: bool,
    },
}

impl InboxName {
    /// Parse and validate a raw inbox name
    ///
    /// Input is lowercased first, so parsing is case-insensitive and the
    /// stored value is canonical.
    pub fn parse(raw: &str) -> Result<InboxName> {
        let inbox_name = raw.to_lowercase();
        let parts: Vec<&str> = inbox_name.split("::").collect();

        if parts.len() < MIN_PARTS || parts.len() > MAX_PARTS {
            return Self::format_violation(&inbox_name);
        }

        let is_e2e = match parts[parts.len() - 1] {
            "true" => true,
            "false" => false,
            other => {
                tracing::debug!(inbox = %inbox_name, flag = other, "rejected inbox e2e flag");
                return Err(Error::InvalidInboxFormat(inbox_name.clone()));
            }
        };

        match parts[0] {
            "inbox" => {
                let mut identities = Vec::with_capacity(parts.len() - 2);
                for part in &parts[1..parts.len() - 1] {
                    if !ShinkaiName::is_fully_valid(part) {
                        return Self::format_violation(&inbox_name);
                    }
                    identities.push(ShinkaiName::new(part)?);
                }
                Ok(InboxName::RegularInbox {
                    value: inbox_name,
                    is_e2e,
                    identities,
                })
            }
            "job_inbox" => {
                if is_e2e {
                    return Self::format_violation(&inbox_name);
                }
                let unique_id = parts[1];
                if unique_id.is_empty() {
                    return Self::format_violation(&inbox_name);
                }
                let unique_id = unique_id.to_string();
                Ok(InboxName::JobInbox {
                    value: inbox_name,
                    unique_id,
                    is_e2e,
                })
            }
            _ => Self::format_violation(&inbox_name),
        }
    }

    fn format_violation(inbox_name: &str) -> Result<InboxName> {
        tracing::debug!(inbox = %inbox_name, "rejected inbox name");
        Err(Error::InvalidInboxFormat(inbox_name.to_string()))
    }

    /// Derive the inbox name a message belongs to
    ///
    /// Reads `internal_metadata.inbox`, so the body must be unencrypted.
    pub fn from_message(message: &ShinkaiMessage) -> Result<InboxName> {
        let body = message.body_unencrypted()?;
        Self::parse(&body.internal_metadata.inbox)
    }

    /// The canonical inbox string
    pub fn get_value(&self) -> &str {
        match self {
            InboxName::RegularInbox { value, .. } => value,
            InboxName::JobInbox { value, .. } => value,
        }
    }

    /// Whether this inbox is flagged end-to-end-only
    pub fn is_e2e(&self) -> bool {
        match self {
            InboxName::RegularInbox { is_e2e, .. } => *is_e2e,
            InboxName::JobInbox { is_e2e, .. } => *is_e2e,
        }
    }

    /// Whether `identity` may create messages in this inbox
    ///
    /// An identity has access when any participant structurally contains it
    /// (a node contains its profiles, a profile its devices). Job inboxes
    /// have no participant list, so the check is an error there.
    pub fn has_creation_access(&self, identity: &ShinkaiName) -> Result<bool> {
        match self {
            InboxName::RegularInbox { identities, .. } => {
                Ok(identities.iter().any(|i| i.contains(identity)))
            }
            InboxName::JobInbox { value, .. } => Err(Error::InvalidInboxFormat(format!(
                "has_creation_access is not applicable for job inbox {value}"
            ))),
        }
    }

    /// Whether a message's sender may create messages in the inbox it names
    ///
    /// Any failure along the way (encrypted body, malformed names, job
    /// inbox) is an access denial, not an error.
    pub fn has_sender_creation_access(message: &ShinkaiMessage) -> bool {
        let Ok(sender) = ShinkaiName::from_message_using_sender_subidentity(message) else {
            return false;
        };
        let Ok(inbox) = Self::from_message(message) else {
            return false;
        };
        inbox.has_creation_access(&sender).unwrap_or(false)
    }

    /// Deterministically build a two-party regular inbox name
    ///
    /// Each side's full name is `node[/subidentity]`; the two full names are
    /// sorted lexicographically before joining, so either peer computes the
    /// identical inbox string. The result is re-parsed through [`parse`],
    /// guaranteeing constructed and parsed names are representationally
    /// identical.
    ///
    /// [`parse`]: InboxName::parse
    pub fn get_regular_inbox_name_from_params(
        sender: &str,
        sender_subidentity: &str,
        recipient: &str,
        recipient_subidentity: &str,
        is_e2e: bool,
    ) -> Result<InboxName> {
        let sender_full = if sender_subidentity.is_empty() {
            sender.to_string()
        } else {
            format!("{sender}/{sender_subidentity}")
        };
        let recipient_full = if recipient_subidentity.is_empty() {
            recipient.to_string()
        } else {
            format!("{recipient}/{recipient_subidentity}")
        };

        let sender_name = ShinkaiName::new(&sender_full)?;
        let recipient_name = ShinkaiName::new(&recipient_full)?;

        let mut participants = [sender_name.get_value(), recipient_name.get_value()];
        participants.sort_unstable();

        let inbox_name = format!(
            "inbox::{}::{}::{}",
            participants[0], participants[1], is_e2e
        );
        Self::parse(&inbox_name)
    }

    /// Build the inbox name for a job
    pub fn get_job_inbox_name_from_params(unique_id: &str) -> Result<InboxName> {
        Self::parse(&format!("job_inbox::{unique_id}::false"))
    }
}

impl fmt::Display for InboxName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get_value())
    }
}

impl FromStr for InboxName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for InboxName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.get_value())
    }
}

impl<'de> Deserialize<'de> for InboxName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        InboxName::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// TESTS
// ============================================================================
