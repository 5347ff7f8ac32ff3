pub mod action;
pub mod model;
pub mod reduce;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;

pub use action::Action;
pub use model::{
    Attachment, Message, ParticipantRef, ReactionKind, ReactionState, Thread, ThreadDetail,
};
pub use reduce::reduce;
pub use state::{AccessState, ActionStatus, DmState, StatusKind};
pub use types::{CorrelationId, MessageBody, MessageId, ParticipantId, ThreadId};
