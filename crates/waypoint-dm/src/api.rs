//! The remote-operation port.
//!
//! The engine treats the backend as five opaque request/response
//! operations. Implementations own transport, token attachment and
//! retry-on-network-error; the engine only cares whether a failure is the
//! authorization-denial signal or a generic remote error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::model::{
    Attachment, Message, ParticipantRef, ReactionKind, Thread, ThreadDetail,
};
use crate::domain::types::{MessageId, ParticipantId, ThreadId};

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend reported the caller lacks privilege for the operation.
    /// Treated specially: it downgrades the engine's access state and
    /// short-circuits future mutating calls.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("remote call failed: {0}")]
    Remote(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, ApiError::PermissionDenied(_))
    }
}

/// Payload of the directory listing: the viewer's own identity plus every
/// conversation they participate in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryPayload {
    pub viewer: Option<ParticipantRef>,
    pub threads: Vec<Thread>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadRequest {
    pub participant_ids: Vec<ParticipantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_message: Option<String>,
}

/// Some backends omit the created thread's id from the response; the
/// engine then falls back to scanning the refreshed directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadOutcome {
    pub thread_id: Option<ThreadId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleReactionResponse {
    /// The canonical message after the toggle, when the backend returns
    /// one. The source of truth wins over the optimistic guess.
    pub message: Option<Message>,
}

#[async_trait]
pub trait ConversationApi: Send + Sync {
    async fn list_threads(&self) -> Result<DirectoryPayload, ApiError>;

    async fn get_thread(&self, thread_id: &ThreadId) -> Result<ThreadDetail, ApiError>;

    async fn send_message(
        &self,
        thread_id: &ThreadId,
        request: SendMessageRequest,
    ) -> Result<SendMessageResponse, ApiError>;

    async fn create_thread(
        &self,
        request: CreateThreadRequest,
    ) -> Result<CreateThreadOutcome, ApiError>;

    async fn toggle_reaction(
        &self,
        thread_id: &ThreadId,
        message_id: &MessageId,
        reaction: ReactionKind,
    ) -> Result<ToggleReactionResponse, ApiError>;
}
