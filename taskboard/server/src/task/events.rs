//! In-process change feed backing the live task views.
//!
//! The task service publishes one [`TaskChange`] per successful mutation. The events endpoint
//! forwards the caller's own changes to connected clients as server-sent events.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use std::convert::Infallible;
use taskboard_core::{OwnerId, TaskId};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Changes buffered per subscriber before it is told to resync.
const CHANNEL_CAPACITY: usize = 256;

/// Event name sent to a subscriber that missed changes.
pub const RESYNC_EVENT: &str = "resync";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Removed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
            ChangeKind::Removed => "removed",
        }
    }
}

/// One change to one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChange {
    pub owner_id: OwnerId,
    pub task_id: TaskId,
    pub kind: ChangeKind,
}

/// Broadcast channel of task changes, shared by every request.
#[derive(Clone)]
pub struct TaskEvents {
    sender: broadcast::Sender<TaskChange>,
}

impl Default for TaskEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publishes a change. Having no subscribers is not an error.
    pub fn publish(&self, change: TaskChange) {
        let _ = self.sender.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskChange> {
        self.sender.subscribe()
    }

    /// Streams the changes made to `owner_id`'s tasks from now on.
    pub fn owner_stream(&self, owner_id: OwnerId) -> impl Stream<Item = TaskChangeEvent> + use<> {
        futures::stream::unfold(
            (self.subscribe(), owner_id),
            |(mut receiver, owner_id)| async move {
                loop {
                    match receiver.recv().await {
                        Ok(change) if change.owner_id == owner_id => {
                            return Some((TaskChangeEvent::Change(change), (receiver, owner_id)));
                        }
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(
                                "Subscriber for '{}' lagged behind by {} changes",
                                owner_id,
                                skipped
                            );
                            return Some((TaskChangeEvent::Resync, (receiver, owner_id)));
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            },
        )
    }
}

/// What a subscriber receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChangeEvent {
    Change(TaskChange),
    /// Some changes were dropped; the subscriber should reload everything.
    Resync,
}

impl From<TaskChangeEvent> for Event {
    fn from(event: TaskChangeEvent) -> Self {
        match event {
            TaskChangeEvent::Change(change) => Event::default()
                .event(change.kind.as_str())
                .data(change.task_id.to_string()),
            TaskChangeEvent::Resync => Event::default().event(RESYNC_EVENT).data(""),
        }
    }
}

/// Wraps an owner stream as a server-sent events response.
pub fn sse_response(
    stream: impl Stream<Item = TaskChangeEvent> + Send + 'static,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    use futures::StreamExt;

    Sse::new(stream.map(|event| Ok(Event::from(event)))).keep_alive(KeepAlive::default())
}
