use crate::domain::error::ProviderErrorKind;
use crate::usecase::stats::{RunStats, TreeStats};
use serde::Serialize;
use tokio::sync::mpsc;

pub type EventSink = Option<mpsc::Sender<AppEvent>>;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    PhaseStarted {
        name: String,
    },
    PhaseFinished {
        name: String,
    },

    FileStarted {
        path: String,
        stats: TreeStats,
    },

    BatchStarted {
        index: usize,
        total: usize,
        size: usize,
    },
    RetryScheduled {
        attempt: usize,
        max_retries: usize,
        delay_ms: u64,
        kind: ProviderErrorKind,
    },
    BatchFailed {
        index: usize,
        size: usize,
        reason: String,
    },
    ClassificationAborted {
        reason: String,
        remaining_batches: usize,
    },

    CategoriesCreated {
        requested: usize,
        created: usize,
    },
    GroupingSkipped {
        reason: String,
    },

    PathFlattened {
        original: String,
        flattened: String,
    },
    BookmarksDropped {
        unclassified: usize,
        unresolved: usize,
    },

    FileWritten {
        path: String,
        stats: TreeStats,
    },
    FileSkipped {
        path: String,
        reason: String,
    },

    Finished {
        stats: RunStats,
    },
}

pub async fn emit(sink: &EventSink, ev: AppEvent) {
    if let Some(tx) = sink {
        let _ = tx.send(ev).await;
    }
}
