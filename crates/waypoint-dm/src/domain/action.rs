//! One variant per store transition. Coordinators never touch state
//! fields directly; every mutation goes through [`super::reduce::reduce`]
//! with one of these.

use crate::domain::model::{Message, ParticipantRef, ReactionState, Thread, ThreadDetail};
use crate::domain::types::{CorrelationId, MessageId, ThreadId};

#[derive(Debug, Clone)]
pub enum Action {
    DirectoryPending,
    DirectoryLoaded {
        viewer: Option<ParticipantRef>,
        threads: Vec<Thread>,
    },
    DirectoryFailed {
        message: String,
        denied: bool,
    },

    ThreadSelected {
        thread_id: ThreadId,
    },
    DetailPending,
    /// Carries the thread id the load was issued for; the reducer discards
    /// it if the selection has moved on since.
    DetailLoaded {
        thread_id: ThreadId,
        detail: ThreadDetail,
    },
    DetailFailed {
        message: String,
        denied: bool,
    },
    /// Synchronous refusal before any remote call was issued. Records a
    /// status for its family only; `last_error` and the access flag are
    /// reserved for remote observations.
    DetailRejected {
        message: String,
    },

    OptimisticMessageInserted {
        thread_id: ThreadId,
        message: Message,
    },
    OptimisticMessageRemoved {
        thread_id: ThreadId,
        correlation_id: CorrelationId,
    },
    SendPending,
    SendCompleted {
        message: String,
    },
    SendFailed {
        message: String,
        denied: bool,
    },
    SendRejected {
        message: String,
    },
    SendStatusCleared,

    ReactionPending,
    /// Applies a computed reaction state to one message: the optimistic
    /// toggle on the way out, the captured snapshot on rollback.
    ReactionApplied {
        thread_id: ThreadId,
        message_id: MessageId,
        reactions: ReactionState,
    },
    /// Canonical replacement from the backend; wins over the optimistic
    /// guess verbatim.
    MessageReplaced {
        thread_id: ThreadId,
        message: Message,
    },
    ReactionCompleted,
    ReactionFailed {
        message: String,
        denied: bool,
    },
    ReactionRejected {
        message: String,
    },

    CreatePending,
    CreateCompleted {
        message: String,
        selected_thread_id: Option<ThreadId>,
    },
    CreateFailed {
        message: String,
        denied: bool,
    },
    CreateRejected {
        message: String,
    },
    CreateStatusCleared,
}
