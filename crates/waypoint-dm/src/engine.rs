//! Coordinators: the imperative intents the view dispatches.
//!
//! `DmEngine` owns the store and the remote port. Every intent takes
//! `&mut self`, so all store mutations are serialized on one logical
//! thread of execution; suspension happens only at remote-call
//! boundaries. Mutating intents consult the access state before issuing
//! any network call and fail synchronously while privileges are denied.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{ConversationApi, CreateThreadRequest, SendMessageRequest};
use crate::domain::action::Action;
use crate::domain::model::{
    Attachment, Message, ParticipantRef, ReactionKind, ReactionState, Thread, ThreadDetail,
};
use crate::domain::reduce::reduce;
use crate::domain::state::{AccessState, DmState};
use crate::domain::types::{CorrelationId, MessageBody, MessageId, ParticipantId, ThreadId};
use crate::error::{Error, Result};

const PRIVILEGES_REQUIRED: &str = "Messaging privileges required.";
const SELECT_THREAD_FIRST: &str = "Select a conversation before loading messages.";
const EMPTY_BODY: &str = "Message body cannot be empty.";
const NO_PARTICIPANTS: &str = "Add at least one participant.";

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Perform the initial directory load during construction.
    pub auto_load: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { auto_load: true }
    }
}

#[derive(Debug, Clone)]
pub struct SendMessageInput {
    pub thread_id: ThreadId,
    pub body: String,
    pub attachments: Vec<Attachment>,
    /// Defaults to the store's viewer when absent.
    pub sender: Option<ParticipantRef>,
}

#[derive(Debug, Clone)]
pub struct CreateThreadInput {
    pub participant_ids: Vec<ParticipantId>,
    pub topic: Option<String>,
    pub initial_message: Option<String>,
}

pub struct DmEngine<A> {
    state: DmState,
    api: Arc<A>,
}

impl<A: ConversationApi> DmEngine<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            state: DmState::new(),
            api,
        }
    }

    /// Construct and, unless configured otherwise, perform the initial
    /// directory load. A failed initial load is surfaced through the
    /// directory status, not as a construction failure.
    pub async fn bootstrap(api: Arc<A>, config: EngineConfig) -> Self {
        let mut engine = Self::new(api);
        if config.auto_load {
            let _ = engine.refresh_threads().await;
        }
        engine
    }

    pub fn state(&self) -> &DmState {
        &self.state
    }

    pub fn viewer(&self) -> Option<&ParticipantRef> {
        self.state.viewer.as_ref()
    }

    pub fn threads(&self) -> &[Thread] {
        &self.state.threads
    }

    pub fn selected_thread_id(&self) -> Option<&ThreadId> {
        self.state.selected_thread_id.as_ref()
    }

    pub fn thread_detail(&self) -> Option<&ThreadDetail> {
        self.state.thread_detail.as_ref()
    }

    pub fn access(&self) -> AccessState {
        self.state.access
    }

    fn dispatch(&mut self, action: Action) {
        reduce(&mut self.state, action);
    }

    /// Fetch the conversation directory and the viewer identity.
    pub async fn refresh_threads(&mut self) -> Result<()> {
        self.dispatch(Action::DirectoryPending);
        match self.api.list_threads().await {
            Ok(payload) => {
                debug!(count = payload.threads.len(), "conversation directory loaded");
                self.dispatch(Action::DirectoryLoaded {
                    viewer: payload.viewer,
                    threads: payload.threads,
                });
                Ok(())
            }
            Err(err) => {
                let denied = err.is_permission_denied();
                if denied {
                    warn!("directory load denied; messaging access revoked");
                }
                self.dispatch(Action::DirectoryFailed {
                    message: err.to_string(),
                    denied,
                });
                Err(err.into())
            }
        }
    }

    /// Make `thread_id` the selected thread and load its message history.
    /// Loaded detail is always treated as potentially stale, so a fresh
    /// load is issued even when re-selecting the current thread.
    pub async fn select_thread(&mut self, thread_id: ThreadId) -> Result<()> {
        if thread_id.is_empty() {
            self.dispatch(Action::DetailRejected {
                message: SELECT_THREAD_FIRST.to_string(),
            });
            return Err(Error::Validation(SELECT_THREAD_FIRST.to_string()));
        }
        self.dispatch(Action::ThreadSelected {
            thread_id: thread_id.clone(),
        });
        self.load_detail(thread_id).await
    }

    async fn load_detail(&mut self, thread_id: ThreadId) -> Result<()> {
        self.dispatch(Action::DetailPending);
        match self.api.get_thread(&thread_id).await {
            Ok(detail) => {
                debug!(thread_id = %thread_id, messages = detail.messages.len(), "thread detail loaded");
                self.dispatch(Action::DetailLoaded { thread_id, detail });
                Ok(())
            }
            Err(err) => {
                let denied = err.is_permission_denied();
                self.dispatch(Action::DetailFailed {
                    message: err.to_string(),
                    denied,
                });
                Err(err.into())
            }
        }
    }

    /// Optimistically insert the message, send it, then reconcile: on
    /// success the placeholder is removed and a full detail reload fetches
    /// the canonical list; on failure the placeholder is removed and an
    /// error status recorded. Either way exactly the placeholder this call
    /// inserted is removed, matched by correlation id.
    pub async fn send_message(&mut self, input: SendMessageInput) -> Result<()> {
        if input.thread_id.is_empty() {
            return Err(self.send_validation_failure(SELECT_THREAD_FIRST));
        }
        let Some(body) = MessageBody::new(&input.body) else {
            return Err(self.send_validation_failure(EMPTY_BODY));
        };
        if self.state.access.is_denied() {
            self.dispatch(Action::SendRejected {
                message: PRIVILEGES_REQUIRED.to_string(),
            });
            return Err(Error::AccessDenied);
        }

        let correlation_id = CorrelationId::new();
        let sender = input.sender.or_else(|| self.state.viewer.clone());
        let optimistic =
            Message::optimistic(correlation_id, &body, sender, input.attachments.clone());
        self.dispatch(Action::OptimisticMessageInserted {
            thread_id: input.thread_id.clone(),
            message: optimistic,
        });
        self.dispatch(Action::SendPending);

        let request = SendMessageRequest {
            body: body.into_string(),
            attachments: input.attachments,
        };
        match self.api.send_message(&input.thread_id, request).await {
            Ok(_) => {
                self.dispatch(Action::OptimisticMessageRemoved {
                    thread_id: input.thread_id.clone(),
                    correlation_id,
                });
                self.dispatch(Action::SendCompleted {
                    message: "Message sent.".to_string(),
                });
                info!(thread_id = %input.thread_id, "message sent");
                // Canonical list (real id, server timestamp, server-side
                // transformations) comes from the reload; its failure is
                // surfaced through the detail status.
                let _ = self.load_detail(input.thread_id).await;
                Ok(())
            }
            Err(err) => {
                let denied = err.is_permission_denied();
                self.dispatch(Action::OptimisticMessageRemoved {
                    thread_id: input.thread_id.clone(),
                    correlation_id,
                });
                self.dispatch(Action::SendFailed {
                    message: err.to_string(),
                    denied,
                });
                Err(err.into())
            }
        }
    }

    /// Toggle the viewer's reaction on one message. The local mutation is
    /// applied before the remote call and rolled back to the pre-toggle
    /// snapshot on failure. Keys outside the vocabulary are a no-op.
    pub async fn toggle_reaction(
        &mut self,
        thread_id: ThreadId,
        message_id: MessageId,
        reaction_key: &str,
    ) -> Result<()> {
        if thread_id.is_empty() || message_id.is_empty() {
            let message = "Thread and message ids are required to react.".to_string();
            self.dispatch(Action::ReactionRejected {
                message: message.clone(),
            });
            return Err(Error::Validation(message));
        }
        if self.state.access.is_denied() {
            self.dispatch(Action::ReactionRejected {
                message: PRIVILEGES_REQUIRED.to_string(),
            });
            return Err(Error::AccessDenied);
        }
        let Some(kind) = ReactionKind::from_key(reaction_key) else {
            debug!(key = reaction_key, "ignoring reaction outside vocabulary");
            return Ok(());
        };

        // Snapshot for rollback: a full restore, not a re-toggle, so a
        // failure cannot double-toggle state that changed in between.
        let snapshot: Option<ReactionState> = self
            .state
            .detail_for(&thread_id)
            .and_then(|detail| detail.message(&message_id))
            .map(|message| message.reactions.clone());
        if let Some(previous) = &snapshot {
            self.dispatch(Action::ReactionApplied {
                thread_id: thread_id.clone(),
                message_id: message_id.clone(),
                reactions: previous.toggled(kind),
            });
        }
        self.dispatch(Action::ReactionPending);

        match self.api.toggle_reaction(&thread_id, &message_id, kind).await {
            Ok(response) => {
                match response.message {
                    Some(canonical) => {
                        self.dispatch(Action::MessageReplaced {
                            thread_id: thread_id.clone(),
                            message: canonical,
                        });
                    }
                    None if snapshot.is_none() => {
                        // Nothing local to reconcile against; fetch the
                        // authoritative list instead.
                        let _ = self.load_detail(thread_id.clone()).await;
                    }
                    None => {}
                }
                self.dispatch(Action::ReactionCompleted);
                Ok(())
            }
            Err(err) => {
                if let Some(previous) = snapshot {
                    self.dispatch(Action::ReactionApplied {
                        thread_id: thread_id.clone(),
                        message_id,
                        reactions: previous,
                    });
                }
                let denied = err.is_permission_denied();
                self.dispatch(Action::ReactionFailed {
                    message: err.to_string(),
                    denied,
                });
                Err(err.into())
            }
        }
    }

    /// Create a thread, refresh the directory, resolve the new thread's
    /// id (falling back to a participant-set scan when the create
    /// response omits it), load its detail and select it.
    pub async fn create_thread(&mut self, input: CreateThreadInput) -> Result<Option<ThreadId>> {
        if input.participant_ids.is_empty() {
            self.dispatch(Action::CreateRejected {
                message: NO_PARTICIPANTS.to_string(),
            });
            return Err(Error::Validation(NO_PARTICIPANTS.to_string()));
        }
        if self.state.access.is_denied() {
            self.dispatch(Action::CreateRejected {
                message: PRIVILEGES_REQUIRED.to_string(),
            });
            return Err(Error::AccessDenied);
        }

        self.dispatch(Action::CreatePending);
        let request = CreateThreadRequest {
            participant_ids: input.participant_ids.clone(),
            topic: input.topic,
            initial_message: input.initial_message,
        };
        let outcome = match self.api.create_thread(request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let denied = err.is_permission_denied();
                self.dispatch(Action::CreateFailed {
                    message: err.to_string(),
                    denied,
                });
                return Err(err.into());
            }
        };

        // The directory refresh is its own independent load; a failure
        // here fails the creation intent as observed by the caller even
        // though the thread may exist remotely.
        if let Err(err) = self.refresh_threads().await {
            self.dispatch(Action::CreateFailed {
                message: err.to_string(),
                denied: false,
            });
            return Err(err);
        }

        let resolved = outcome
            .thread_id
            .or_else(|| self.find_thread_by_participants(&input.participant_ids));
        if let Some(thread_id) = &resolved {
            info!(thread_id = %thread_id, "conversation created");
            self.dispatch(Action::ThreadSelected {
                thread_id: thread_id.clone(),
            });
            let _ = self.load_detail(thread_id.clone()).await;
        } else {
            warn!("created conversation could not be resolved in the refreshed directory");
        }
        self.dispatch(Action::CreateCompleted {
            message: "Conversation created.".to_string(),
            selected_thread_id: resolved.clone(),
        });
        Ok(resolved)
    }

    /// First directory entry whose participant set contains every
    /// requested participant. Used when the create response omits the new
    /// thread's id.
    fn find_thread_by_participants(&self, participant_ids: &[ParticipantId]) -> Option<ThreadId> {
        self.state
            .threads
            .iter()
            .find(|thread| participant_ids.iter().all(|p| thread.has_participant(p)))
            .map(|thread| thread.id.clone())
    }

    pub fn clear_send_status(&mut self) {
        self.dispatch(Action::SendStatusCleared);
    }

    pub fn clear_create_status(&mut self) {
        self.dispatch(Action::CreateStatusCleared);
    }

    fn send_validation_failure(&mut self, message: &str) -> Error {
        self.dispatch(Action::SendRejected {
            message: message.to_string(),
        });
        Error::Validation(message.to_string())
    }
}

impl<A> std::fmt::Debug for DmEngine<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DmEngine")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
