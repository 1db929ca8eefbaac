//! Background persistence queue.
//!
//! Turn persistence happens off the reply path: the orchestrator
//! enqueues a write job and returns, and a worker task drains the
//! queue against the state manager. Failures are logged, not
//! surfaced to the user. The in-flight counter lets tests wait for
//! the queue to drain deterministically.

use crate::state::StateManager;
use caremind_core::message::{ConversationId, Message};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::error;

const QUEUE_CAPACITY: usize = 64;

/// One turn write: the messages to append and the title to set.
#[derive(Debug)]
pub struct TurnWrite {
    pub conversation_id: ConversationId,
    pub user_id: String,
    pub messages: Vec<Message>,
    pub title: Option<String>,
}

/// Handle to the persistence worker. Cloneable; dropping every handle
/// closes the queue and lets the worker exit after draining.
#[derive(Clone)]
pub struct PersistQueue {
    tx: mpsc::Sender<TurnWrite>,
    in_flight: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl PersistQueue {
    /// Spawn the worker task and return its handle.
    pub fn spawn(state: StateManager) -> Self {
        let (tx, mut rx) = mpsc::channel::<TurnWrite>(QUEUE_CAPACITY);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let drained = Arc::new(Notify::new());

        let worker_in_flight = in_flight.clone();
        let worker_drained = drained.clone();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let result = state
                    .append_turn(
                        &job.conversation_id,
                        &job.user_id,
                        job.messages,
                        job.title.as_deref(),
                    )
                    .await;
                if let Err(e) = result {
                    error!(
                        conversation = %job.conversation_id,
                        error = %e,
                        "Failed to persist turn"
                    );
                }
                worker_in_flight.fetch_sub(1, Ordering::SeqCst);
                worker_drained.notify_waiters();
            }
        });

        Self {
            tx,
            in_flight,
            drained,
        }
    }

    /// Enqueue a turn write. Awaits queue capacity so jobs are never
    /// silently dropped under load.
    pub async fn enqueue(&self, job: TurnWrite) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(job).await.is_err() {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            error!("Persistence queue is closed; dropping turn write");
        }
    }

    /// Wait until every enqueued job has been processed.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.drained.notified();
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caremind_store::InMemoryStore;

    #[tokio::test]
    async fn enqueued_turn_is_persisted() {
        let store = Arc::new(InMemoryStore::new());
        let state = StateManager::new(store.clone());
        let queue = PersistQueue::spawn(state.clone());

        let id = ConversationId::new();
        queue
            .enqueue(TurnWrite {
                conversation_id: id.clone(),
                user_id: "user-1".into(),
                messages: vec![Message::user("hi"), Message::assistant("hello")],
                title: Some("Greeting".into()),
            })
            .await;
        queue.wait_idle().await;

        let history = state.get_history(&id).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn wait_idle_returns_immediately_when_empty() {
        let state = StateManager::new(Arc::new(InMemoryStore::new()));
        let queue = PersistQueue::spawn(state);
        queue.wait_idle().await;
    }

    #[tokio::test]
    async fn sequential_writes_preserve_order() {
        let store = Arc::new(InMemoryStore::new());
        let state = StateManager::new(store);
        let queue = PersistQueue::spawn(state.clone());

        let id = ConversationId::new();
        for i in 0..3 {
            queue
                .enqueue(TurnWrite {
                    conversation_id: id.clone(),
                    user_id: "user-1".into(),
                    messages: vec![Message::user(format!("turn {i}"))],
                    title: None,
                })
                .await;
        }
        queue.wait_idle().await;

        let history = state.get_history(&id).await.unwrap();
        let texts: Vec<String> = history.iter().map(|m| m.content.flatten()).collect();
        assert_eq!(texts, vec!["turn 0", "turn 1", "turn 2"]);
    }
}
