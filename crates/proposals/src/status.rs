//! Transient transaction status shown to the user

use std::sync::Arc;
use std::time::Duration;
use polis_common::NotificationConfig;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNotice {
    pub status: TransactionStatus,
    pub message: String,
}

#[derive(Debug, Default)]
struct BoardState {
    notice: Option<StatusNotice>,
    generation: u64,
}

/// Holds the notice for the operation in flight.
///
/// Terminal notices clear themselves after the configured delay unless a
/// newer notice has replaced them in the meantime.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    state: Arc<Mutex<BoardState>>,
    config: NotificationConfig,
}

impl StatusBoard {
    pub fn new(config: NotificationConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(BoardState::default())),
            config,
        }
    }

    pub async fn current(&self) -> Option<StatusNotice> {
        self.state.lock().await.notice.clone()
    }

    pub async fn pending(&self, message: impl Into<String>) {
        self.show(TransactionStatus::Pending, message.into()).await;
    }

    pub async fn succeed(&self, message: impl Into<String>) {
        let generation = self.show(TransactionStatus::Success, message.into()).await;
        self.schedule_clear(generation, self.config.success_delay());
    }

    pub async fn fail(&self, message: impl Into<String>) {
        let generation = self.show(TransactionStatus::Error, message.into()).await;
        self.schedule_clear(generation, self.config.error_delay());
    }

    async fn show(&self, status: TransactionStatus, message: String) -> u64 {
        let mut state = self.state.lock().await;
        state.generation += 1;
        debug!("Status {:?}: {}", status, message);
        state.notice = Some(StatusNotice { status, message });
        state.generation
    }

    fn schedule_clear(&self, generation: u64, delay: Duration) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = state.lock().await;
            if state.generation == generation {
                state.notice = None;
            }
        });
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new(NotificationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn success_clears_after_delay() {
        let board = StatusBoard::default();
        board.pending("Submitting").await;
        assert_eq!(board.current().await.unwrap().status, TransactionStatus::Pending);

        board.succeed("Done").await;
        assert_eq!(board.current().await.unwrap().message, "Done");

        sleep(Duration::from_millis(1900)).await;
        assert!(board.current().await.is_some());

        sleep(Duration::from_millis(200)).await;
        assert!(board.current().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn error_lingers_longer() {
        let board = StatusBoard::default();
        board.fail("Voting failed").await;

        sleep(Duration::from_millis(2500)).await;
        assert_eq!(board.current().await.unwrap().status, TransactionStatus::Error);

        sleep(Duration::from_millis(600)).await;
        assert!(board.current().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_notice_is_not_cleared_by_older_timer() {
        let board = StatusBoard::default();
        board.succeed("First").await;

        sleep(Duration::from_millis(1500)).await;
        board.pending("Second").await;

        sleep(Duration::from_millis(1000)).await;
        let notice = board.current().await.unwrap();
        assert_eq!(notice.message, "Second");
        assert_eq!(notice.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn pending_never_clears_itself() {
        let board = StatusBoard::new(NotificationConfig { success_clear_ms: 1, error_clear_ms: 1 });
        board.pending("Waiting").await;
        sleep(Duration::from_millis(20)).await;
        assert!(board.current().await.is_some());
    }
}
