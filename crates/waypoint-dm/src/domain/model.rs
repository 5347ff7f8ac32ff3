//! Thread and message models.
//!
//! These mirror what the backend serves; the store is never the source of
//! truth and any of it may be replaced wholesale by a directory or detail
//! reload.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::domain::types::{CorrelationId, MessageBody, MessageId, ParticipantId, ThreadId};

/// A reference to a user as it appears in thread participant lists and
/// message sender slots. Identity for comparison is always the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRef {
    pub id: ParticipantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
}

impl ParticipantRef {
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: ParticipantId::from_string(id),
            display_name: None,
            username: None,
            avatar_ref: None,
        }
    }

    /// Best available human-readable name, falling back to the id.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or_else(|| self.id.as_str())
    }
}

/// One conversation as listed in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: ThreadId,
    /// Never empty once persisted; unique by participant id.
    pub participants: Vec<ParticipantRef>,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Thread {
    pub fn has_participant(&self, participant_id: &ParticipantId) -> bool {
        self.participants.iter().any(|p| &p.id == participant_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The fixed reaction vocabulary. Keys outside this set are ignored by the
/// toggle coordinator rather than rejected.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Laugh,
    Heart,
    Surprised,
    Sad,
}

impl ReactionKind {
    /// Parse a wire key; `None` for anything outside the vocabulary.
    pub fn from_key(key: &str) -> Option<Self> {
        key.parse().ok()
    }
}

/// Aggregate reaction state on one message: per-key counts across all
/// viewers plus the set of keys the current viewer has applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionState {
    /// Keys with a count of zero are pruned, never stored.
    #[serde(default)]
    pub counts: BTreeMap<ReactionKind, u32>,
    #[serde(default)]
    pub viewer_reactions: BTreeSet<ReactionKind>,
}

impl ReactionState {
    pub fn count(&self, kind: ReactionKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn viewer_has(&self, kind: ReactionKind) -> bool {
        self.viewer_reactions.contains(&kind)
    }

    /// Legacy singular view: the first of the viewer's reactions.
    pub fn viewer_reaction(&self) -> Option<ReactionKind> {
        self.viewer_reactions.iter().next().copied()
    }

    /// The state after the viewer toggles `kind`: present means remove and
    /// decrement (floor zero), absent means add and increment. Zero counts
    /// are pruned from the map.
    pub fn toggled(&self, kind: ReactionKind) -> Self {
        let mut next = self.clone();
        if next.viewer_reactions.remove(&kind) {
            let remaining = next.count(kind).saturating_sub(1);
            if remaining == 0 {
                next.counts.remove(&kind);
            } else {
                next.counts.insert(kind, remaining);
            }
        } else {
            next.viewer_reactions.insert(kind);
            *next.counts.entry(kind).or_insert(0) += 1;
        }
        next
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<ParticipantRef>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    /// Set on locally synthesized placeholders awaiting reconciliation.
    #[serde(default)]
    pub optimistic: bool,
    #[serde(default)]
    pub reactions: ReactionState,
}

impl Message {
    /// Synthesize the optimistic placeholder inserted ahead of a send.
    pub fn optimistic(
        correlation_id: CorrelationId,
        body: &MessageBody,
        sender: Option<ParticipantRef>,
        attachments: Vec<Attachment>,
    ) -> Self {
        Self {
            id: correlation_id.message_id(),
            body: body.as_str().to_string(),
            sender,
            attachments,
            created_at: Utc::now(),
            optimistic: true,
            reactions: ReactionState::default(),
        }
    }
}

/// Full message history for one thread, messages ordered newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDetail {
    pub id: ThreadId,
    pub participants: Vec<ParticipantRef>,
    pub messages: Vec<Message>,
}

impl ThreadDetail {
    pub fn message(&self, message_id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == message_id)
    }

    pub fn message_mut(&mut self, message_id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| &m.id == message_id)
    }

    pub fn optimistic_count(&self) -> usize {
        self.messages.iter().filter(|m| m.optimistic).count()
    }
}
