//! Direct-conversation synchronization engine for the Waypoint client.
//!
//! Holds the in-memory snapshot of the conversation directory and the
//! selected thread, applies user intents optimistically, reconciles them
//! against the remote authority, and rolls back cleanly on failure. The
//! remote side is an injected [`api::ConversationApi`] implementation;
//! transport and auth live behind that boundary.

pub mod api;
pub mod domain;
pub mod engine;
pub mod error;

pub use api::{
    ApiError, ConversationApi, CreateThreadOutcome, CreateThreadRequest, DirectoryPayload,
    SendMessageRequest, SendMessageResponse, ToggleReactionResponse,
};
pub use domain::model::{
    Attachment, Message, ParticipantRef, ReactionKind, ReactionState, Thread, ThreadDetail,
};
pub use domain::state::{AccessState, ActionStatus, DmState, StatusKind};
pub use domain::types::{CorrelationId, MessageBody, MessageId, ParticipantId, ThreadId};
pub use engine::{CreateThreadInput, DmEngine, EngineConfig, SendMessageInput};
pub use error::{Error, Result};
