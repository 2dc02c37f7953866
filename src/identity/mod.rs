//! # Identity Module
//!
//! Naming and addressing: who a message is from, who it is for, and which
//! conversation channel it belongs to.
//!
//! ## Addressing Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       IDENTITY & ADDRESSING                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  ShinkaiName — hierarchical identity                            │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  @@alice.shinkai                        (node)                  │   │
//! │  │  @@alice.shinkai/main                   (profile)               │   │
//! │  │  @@alice.shinkai/main/device/phone1     (device)                │   │
//! │  │  @@alice.shinkai/main/agent/helper      (agent)                 │   │
//! │  │                                                                 │   │
//! │  │  Parents structurally contain their children; containment      │   │
//! │  │  is the authorization primitive for inbox access.              │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  InboxName — derived conversation address                       │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  inbox::@@alice.shinkai::@@bob.shinkai::false                  │   │
//! │  │  job_inbox::<job id>::false                                    │   │
//! │  │                                                                 │   │
//! │  │  Participants are sorted before joining, so both peers         │   │
//! │  │  derive the identical inbox address with no coordination.      │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod inbox;
pub mod name;

pub use inbox::InboxName;
pub use name::{ShinkaiName, ShinkaiSubidentityType};
