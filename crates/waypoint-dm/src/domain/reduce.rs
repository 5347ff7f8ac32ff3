//! The state transition function.
//!
//! `reduce` is the only place `DmState` is mutated. It is pure with
//! respect to the outside world: no I/O, no clocks, no id generation.
//! Coordinators synthesize those and pass them in through the action.

use crate::domain::action::Action;
use crate::domain::model::{Message, ReactionState};
use crate::domain::state::{AccessState, ActionStatus, DmState};
use crate::domain::types::{CorrelationId, MessageId, ThreadId};

pub fn reduce(state: &mut DmState, action: Action) {
    match action {
        Action::DirectoryPending => {
            state.is_loading_threads = true;
            state.directory_status = None;
            state.last_error = None;
        }
        Action::DirectoryLoaded { viewer, threads } => {
            state.is_loading_threads = false;
            state.directory_status = Some(ActionStatus::success());
            state.viewer = viewer;
            state.threads = threads;
            note_success(state);
        }
        Action::DirectoryFailed { message, denied } => {
            state.is_loading_threads = false;
            // Prior directory data stays: a stale list beats a blank one.
            state.directory_status = Some(note_failure(state, &message, denied));
        }

        Action::ThreadSelected { thread_id } => handle_thread_selected(state, thread_id),
        Action::DetailPending => {
            state.is_loading_detail = true;
            state.detail_status = None;
        }
        Action::DetailLoaded { thread_id, detail } => handle_detail_loaded(state, thread_id, detail),
        Action::DetailFailed { message, denied } => {
            state.is_loading_detail = false;
            state.detail_status = Some(note_failure(state, &message, denied));
        }
        Action::DetailRejected { message } => {
            state.detail_status = Some(ActionStatus::error(message));
        }

        Action::OptimisticMessageInserted { thread_id, message } => {
            if let Some(detail) = state.detail_for_mut(&thread_id) {
                detail.messages.insert(0, message);
            }
        }
        Action::OptimisticMessageRemoved {
            thread_id,
            correlation_id,
        } => handle_optimistic_removed(state, &thread_id, correlation_id),
        Action::SendPending => {
            state.is_sending = true;
            state.send_status = None;
        }
        Action::SendCompleted { message } => {
            state.is_sending = false;
            state.send_status = Some(ActionStatus::success_with(message));
            note_success(state);
        }
        Action::SendFailed { message, denied } => {
            state.is_sending = false;
            state.send_status = Some(note_failure(state, &message, denied));
        }
        Action::SendRejected { message } => {
            state.send_status = Some(ActionStatus::error(message));
        }
        Action::SendStatusCleared => {
            state.send_status = None;
        }

        Action::ReactionPending => {
            state.is_toggling_reaction = true;
            state.reaction_status = None;
        }
        Action::ReactionApplied {
            thread_id,
            message_id,
            reactions,
        } => handle_reaction_applied(state, &thread_id, &message_id, reactions),
        Action::MessageReplaced { thread_id, message } => {
            handle_message_replaced(state, &thread_id, message);
        }
        Action::ReactionCompleted => {
            state.is_toggling_reaction = false;
            state.reaction_status = Some(ActionStatus::success());
            note_success(state);
        }
        Action::ReactionFailed { message, denied } => {
            state.is_toggling_reaction = false;
            state.reaction_status = Some(note_failure(state, &message, denied));
        }
        Action::ReactionRejected { message } => {
            state.reaction_status = Some(ActionStatus::error(message));
        }

        Action::CreatePending => {
            state.is_creating = true;
            state.create_status = None;
        }
        Action::CreateCompleted {
            message,
            selected_thread_id,
        } => {
            state.is_creating = false;
            state.create_status = Some(ActionStatus::success_with(message));
            if selected_thread_id.is_some() {
                state.selected_thread_id = selected_thread_id;
            }
            note_success(state);
        }
        Action::CreateFailed { message, denied } => {
            state.is_creating = false;
            state.create_status = Some(note_failure(state, &message, denied));
        }
        Action::CreateRejected { message } => {
            state.create_status = Some(ActionStatus::error(message));
        }
        Action::CreateStatusCleared => {
            state.create_status = None;
        }
    }
}

/// A completed privileged call clears a sticky denial.
fn note_success(state: &mut DmState) {
    state.access = AccessState::Granted;
    state.last_error = None;
}

/// Remote-failure bookkeeping: every remote failure lands in `last_error`
/// and a denial downgrades access. Local rejections bypass this.
fn note_failure(state: &mut DmState, message: &str, denied: bool) -> ActionStatus {
    if denied {
        state.access = AccessState::Denied;
    }
    let status = ActionStatus::error(message);
    state.last_error = Some(status.clone());
    status
}

fn handle_thread_selected(state: &mut DmState, thread_id: ThreadId) {
    state.detail_status = None;
    // Keep the detail only while it belongs to the re-selected thread; a
    // fresh load always follows, so it is at most a brief stale render.
    if state
        .thread_detail
        .as_ref()
        .is_none_or(|detail| detail.id != thread_id)
    {
        state.thread_detail = None;
    }
    state.selected_thread_id = Some(thread_id);
}

fn handle_detail_loaded(
    state: &mut DmState,
    thread_id: ThreadId,
    detail: crate::domain::model::ThreadDetail,
) {
    // A load that resolved after the selection moved on is stale; drop its
    // result instead of letting the last resolver win.
    if state.selected_thread_id.as_ref() != Some(&thread_id) {
        return;
    }
    state.is_loading_detail = false;
    state.detail_status = Some(ActionStatus::success());
    state.thread_detail = Some(detail);
    note_success(state);
}

fn handle_optimistic_removed(
    state: &mut DmState,
    thread_id: &ThreadId,
    correlation_id: CorrelationId,
) {
    let placeholder_id = correlation_id.message_id();
    if let Some(detail) = state.detail_for_mut(thread_id) {
        detail.messages.retain(|m| m.id != placeholder_id);
    }
}

fn handle_reaction_applied(
    state: &mut DmState,
    thread_id: &ThreadId,
    message_id: &MessageId,
    reactions: ReactionState,
) {
    if let Some(message) = state
        .detail_for_mut(thread_id)
        .and_then(|detail| detail.message_mut(message_id))
    {
        message.reactions = reactions;
    }
}

fn handle_message_replaced(state: &mut DmState, thread_id: &ThreadId, message: Message) {
    if let Some(slot) = state
        .detail_for_mut(thread_id)
        .and_then(|detail| detail.message_mut(&message.id))
    {
        *slot = message;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Message, ParticipantRef, Thread, ThreadDetail};
    use crate::domain::types::MessageBody;
    use chrono::Utc;

    fn thread(id: &str, participant_ids: &[&str]) -> Thread {
        Thread {
            id: ThreadId::from_string(id),
            participants: participant_ids
                .iter()
                .map(|p| ParticipantRef::from_id(*p))
                .collect(),
            message_count: 0,
            last_message_at: None,
        }
    }

    fn detail(id: &str, messages: Vec<Message>) -> crate::domain::model::ThreadDetail {
        ThreadDetail {
            id: ThreadId::from_string(id),
            participants: vec![ParticipantRef::from_id("user-1")],
            messages,
        }
    }

    fn server_message(id: &str, body: &str) -> Message {
        Message {
            id: MessageId::from_string(id),
            body: body.to_string(),
            sender: None,
            attachments: Vec::new(),
            created_at: Utc::now(),
            optimistic: false,
            reactions: ReactionState::default(),
        }
    }

    fn loaded_state(thread_id: &str) -> DmState {
        let mut state = DmState::new();
        reduce(
            &mut state,
            Action::DirectoryLoaded {
                viewer: Some(ParticipantRef::from_id("viewer-1")),
                threads: vec![thread(thread_id, &["viewer-1", "user-2"])],
            },
        );
        reduce(
            &mut state,
            Action::ThreadSelected {
                thread_id: ThreadId::from_string(thread_id),
            },
        );
        reduce(
            &mut state,
            Action::DetailLoaded {
                thread_id: ThreadId::from_string(thread_id),
                detail: detail(thread_id, vec![server_message("msg-1", "hi")]),
            },
        );
        state
    }

    #[test]
    fn directory_load_grants_access_and_replaces_list() {
        let mut state = DmState::new();
        assert_eq!(state.access, AccessState::Unknown);

        reduce(
            &mut state,
            Action::DirectoryLoaded {
                viewer: None,
                threads: vec![thread("thread-1", &["user-1"])],
            },
        );

        assert_eq!(state.access, AccessState::Granted);
        assert_eq!(state.threads.len(), 1);
        assert!(state.directory_status.as_ref().is_some_and(|s| !s.is_error()));
    }

    #[test]
    fn directory_failure_keeps_stale_list() {
        let mut state = loaded_state("thread-1");

        reduce(
            &mut state,
            Action::DirectoryFailed {
                message: "boom".to_string(),
                denied: false,
            },
        );

        assert_eq!(state.threads.len(), 1, "stale list beats a blank one");
        assert!(state.directory_status.as_ref().is_some_and(ActionStatus::is_error));
        assert_eq!(state.access, AccessState::Granted);
    }

    #[test]
    fn denial_is_sticky_until_a_success() {
        let mut state = DmState::new();
        reduce(
            &mut state,
            Action::SendFailed {
                message: "no".to_string(),
                denied: true,
            },
        );
        assert_eq!(state.access, AccessState::Denied);

        // A failed retry does not clear it.
        reduce(
            &mut state,
            Action::SendFailed {
                message: "still no".to_string(),
                denied: false,
            },
        );
        assert_eq!(state.access, AccessState::Denied);

        reduce(
            &mut state,
            Action::DirectoryLoaded {
                viewer: None,
                threads: Vec::new(),
            },
        );
        assert_eq!(state.access, AccessState::Granted);
    }

    #[test]
    fn selecting_same_thread_keeps_detail_other_clears_it() {
        let mut state = loaded_state("thread-1");
        assert!(state.thread_detail.is_some());

        reduce(
            &mut state,
            Action::ThreadSelected {
                thread_id: ThreadId::from_string("thread-1"),
            },
        );
        assert!(state.thread_detail.is_some(), "same id keeps loaded detail");

        reduce(
            &mut state,
            Action::ThreadSelected {
                thread_id: ThreadId::from_string("thread-2"),
            },
        );
        assert!(state.thread_detail.is_none(), "different id clears it");
    }

    #[test]
    fn stale_detail_result_is_discarded() {
        let mut state = loaded_state("thread-1");
        reduce(
            &mut state,
            Action::ThreadSelected {
                thread_id: ThreadId::from_string("thread-2"),
            },
        );

        // The slow load for thread-1 resolves after the selection moved on.
        reduce(
            &mut state,
            Action::DetailLoaded {
                thread_id: ThreadId::from_string("thread-1"),
                detail: detail("thread-1", Vec::new()),
            },
        );

        assert!(state.thread_detail.is_none());
        assert_eq!(
            state.selected_thread_id,
            Some(ThreadId::from_string("thread-2"))
        );
    }

    #[test]
    fn optimistic_insert_goes_to_head_and_removal_matches_correlation() {
        let mut state = loaded_state("thread-1");
        let thread_id = ThreadId::from_string("thread-1");
        let body = MessageBody::new("hello").unwrap();

        let first = CorrelationId::new();
        let second = CorrelationId::new();
        for correlation in [first, second] {
            reduce(
                &mut state,
                Action::OptimisticMessageInserted {
                    thread_id: thread_id.clone(),
                    message: Message::optimistic(correlation, &body, None, Vec::new()),
                },
            );
        }

        let detail = state.thread_detail.as_ref().unwrap();
        assert_eq!(detail.optimistic_count(), 2);
        assert_eq!(detail.messages[0].id, second.message_id(), "newest first");

        // Removing the first send's placeholder must not touch the second's.
        reduce(
            &mut state,
            Action::OptimisticMessageRemoved {
                thread_id: thread_id.clone(),
                correlation_id: first,
            },
        );
        let detail = state.thread_detail.as_ref().unwrap();
        assert_eq!(detail.optimistic_count(), 1);
        assert!(detail.message(&second.message_id()).is_some());
        assert!(detail.message(&first.message_id()).is_none());
    }

    #[test]
    fn optimistic_insert_is_a_noop_without_matching_detail() {
        let mut state = loaded_state("thread-1");
        let body = MessageBody::new("hello").unwrap();

        reduce(
            &mut state,
            Action::OptimisticMessageInserted {
                thread_id: ThreadId::from_string("thread-9"),
                message: Message::optimistic(CorrelationId::new(), &body, None, Vec::new()),
            },
        );

        assert_eq!(state.thread_detail.as_ref().unwrap().optimistic_count(), 0);
    }

    #[test]
    fn reaction_applied_targets_one_message() {
        let mut state = loaded_state("thread-1");
        let thread_id = ThreadId::from_string("thread-1");
        let message_id = MessageId::from_string("msg-1");
        let reactions = ReactionState::default().toggled(crate::domain::model::ReactionKind::Like);

        reduce(
            &mut state,
            Action::ReactionApplied {
                thread_id,
                message_id: message_id.clone(),
                reactions: reactions.clone(),
            },
        );

        let detail = state.thread_detail.as_ref().unwrap();
        assert_eq!(detail.message(&message_id).unwrap().reactions, reactions);
    }

    #[test]
    fn canonical_replacement_wins_verbatim() {
        let mut state = loaded_state("thread-1");
        let mut canonical = server_message("msg-1", "hi (edited by server)");
        canonical.reactions = ReactionState::default()
            .toggled(crate::domain::model::ReactionKind::Like)
            .toggled(crate::domain::model::ReactionKind::Heart);

        reduce(
            &mut state,
            Action::MessageReplaced {
                thread_id: ThreadId::from_string("thread-1"),
                message: canonical.clone(),
            },
        );

        let detail = state.thread_detail.as_ref().unwrap();
        assert_eq!(detail.message(&canonical.id), Some(&canonical));
    }

    #[test]
    fn create_completion_selects_resolved_thread() {
        let mut state = loaded_state("thread-1");

        reduce(
            &mut state,
            Action::CreateCompleted {
                message: "Conversation created.".to_string(),
                selected_thread_id: Some(ThreadId::from_string("thread-2")),
            },
        );
        assert_eq!(
            state.selected_thread_id,
            Some(ThreadId::from_string("thread-2"))
        );

        // An unresolved id leaves the selection alone.
        reduce(
            &mut state,
            Action::CreateCompleted {
                message: "Conversation created.".to_string(),
                selected_thread_id: None,
            },
        );
        assert_eq!(
            state.selected_thread_id,
            Some(ThreadId::from_string("thread-2"))
        );
    }

    #[test]
    fn rejections_never_touch_last_error_or_access() {
        let mut state = DmState::new();
        reduce(
            &mut state,
            Action::SendRejected {
                message: "Message body cannot be empty.".to_string(),
            },
        );
        assert!(state.send_status.as_ref().is_some_and(ActionStatus::is_error));
        assert!(state.last_error.is_none());
        assert_eq!(state.access, AccessState::Unknown);

        // A remote denial lands in last_error; a later local rejection
        // must not overwrite it or disturb the sticky denial.
        reduce(
            &mut state,
            Action::SendFailed {
                message: "forbidden".to_string(),
                denied: true,
            },
        );
        let remote = state.last_error.clone();
        assert!(remote.is_some());

        reduce(
            &mut state,
            Action::CreateRejected {
                message: "Add at least one participant.".to_string(),
            },
        );
        assert_eq!(state.last_error, remote);
        assert_eq!(state.access, AccessState::Denied);
        assert!(state.create_status.as_ref().is_some_and(ActionStatus::is_error));
    }

    #[test]
    fn status_clear_actions_only_touch_their_slot() {
        let mut state = DmState::new();
        reduce(
            &mut state,
            Action::SendCompleted {
                message: "Message sent.".to_string(),
            },
        );
        reduce(
            &mut state,
            Action::CreateFailed {
                message: "nope".to_string(),
                denied: false,
            },
        );

        reduce(&mut state, Action::SendStatusCleared);
        assert!(state.send_status.is_none());
        assert!(state.create_status.is_some());

        reduce(&mut state, Action::CreateStatusCleared);
        assert!(state.create_status.is_none());
    }
}
