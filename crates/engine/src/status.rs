use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Point-in-time view of a batch run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub run_id: Option<Uuid>,
    pub state: RunState,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub emitted: usize,
}

/// Cloneable progress handle. The caller creates one, hands it to
/// [`BatchRunner::run`](crate::BatchRunner::run), and may poll any clone
/// while the run is in flight.
#[derive(Debug, Clone, Default)]
pub struct BatchStatus {
    inner: Arc<RwLock<StatusSnapshot>>,
}

impl BatchStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        self.inner.read().await.clone()
    }

    pub async fn is_running(&self) -> bool {
        self.inner.read().await.state == RunState::Running
    }

    pub(crate) async fn begin(&self, run_id: Uuid, total: usize) {
        *self.inner.write().await = StatusSnapshot {
            run_id: Some(run_id),
            state: RunState::Running,
            started_at: Some(Utc::now()),
            completed_at: None,
            total,
            ..StatusSnapshot::default()
        };
    }

    pub(crate) async fn record_verdict(&self, emitted: bool) {
        let mut s = self.inner.write().await;
        s.processed += 1;
        s.succeeded += 1;
        if emitted {
            s.emitted += 1;
        }
    }

    pub(crate) async fn record_failure(&self) {
        let mut s = self.inner.write().await;
        s.processed += 1;
        s.failed += 1;
    }

    pub(crate) async fn finish(&self, cancelled: bool) {
        let mut s = self.inner.write().await;
        s.state = if cancelled {
            RunState::Cancelled
        } else {
            RunState::Completed
        };
        s.completed_at = Some(Utc::now());
    }
}
