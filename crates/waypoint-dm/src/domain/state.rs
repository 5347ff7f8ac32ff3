//! The store: one owned snapshot of everything the conversation view
//! renders. Mutated only through [`crate::domain::reduce::reduce`].

use serde::{Deserialize, Serialize};

use crate::domain::model::{ParticipantRef, Thread, ThreadDetail};
use crate::domain::types::ThreadId;

/// Tri-state messaging-privilege flag shared by every coordinator.
///
/// Writes happen only at defined transition points: success completions
/// grant, denial observations deny. A failed retry does not clear a
/// denial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl AccessState {
    pub fn is_denied(self) -> bool {
        self == AccessState::Denied
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Success,
    Error,
    Info,
    Warning,
}

/// Terminal status of one unit of work, surfaced to the view for feedback.
/// The view owns auto-clearing after its display duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStatus {
    pub kind: StatusKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionStatus {
    pub fn success() -> Self {
        Self {
            kind: StatusKind::Success,
            message: None,
        }
    }

    pub fn success_with(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

/// The authoritative in-memory snapshot: directory, selected thread
/// detail, per-family loading flags and statuses, and the access flag.
///
/// Created when the conversation view mounts, discarded when it unmounts.
/// Subordinate to the remote authority; reloads replace it wholesale.
#[derive(Debug, Clone, Default)]
pub struct DmState {
    pub viewer: Option<ParticipantRef>,
    pub threads: Vec<Thread>,
    pub selected_thread_id: Option<ThreadId>,
    pub thread_detail: Option<ThreadDetail>,

    pub is_loading_threads: bool,
    pub directory_status: Option<ActionStatus>,
    pub is_loading_detail: bool,
    pub detail_status: Option<ActionStatus>,
    pub is_sending: bool,
    pub send_status: Option<ActionStatus>,
    pub is_toggling_reaction: bool,
    pub reaction_status: Option<ActionStatus>,
    pub is_creating: bool,
    pub create_status: Option<ActionStatus>,

    pub access: AccessState,
    /// Most recent remote failure, cleared by the next success.
    pub last_error: Option<ActionStatus>,
}

impl DmState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The loaded detail, but only when it belongs to `thread_id`.
    pub fn detail_for(&self, thread_id: &ThreadId) -> Option<&ThreadDetail> {
        self.thread_detail.as_ref().filter(|d| &d.id == thread_id)
    }

    pub(crate) fn detail_for_mut(&mut self, thread_id: &ThreadId) -> Option<&mut ThreadDetail> {
        self.thread_detail.as_mut().filter(|d| &d.id == thread_id)
    }

    pub fn thread(&self, thread_id: &ThreadId) -> Option<&Thread> {
        self.threads.iter().find(|t| &t.id == thread_id)
    }
}
