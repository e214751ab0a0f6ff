//! Build phase reporting and cancellation.
//!
//! The builder emits one [`BuildProgress`] per phase boundary and one per
//! embedding batch; any front-end (CLI, RPC worker) renders them however it
//! likes. Cancellation is a shared flag honored between phases and between
//! embedding batches.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Build phases, in order of occurrence. `Cloning` only occurs for git
/// sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildPhase {
    Initializing,
    Cloning,
    LoadingModel,
    Chunking,
    Embedding,
    CreatingDatabase,
    Complete,
}

/// One progress update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildProgress {
    pub phase: BuildPhase,
    /// Overall progress, 0–100.
    pub progress: u8,
    pub message: String,
    /// Items done in the current phase, when countable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<usize>,
    /// Items total in the current phase, when countable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

/// Progress callback signature.
pub type ProgressCallback = dyn Fn(BuildProgress) + Send + Sync;

/// Cooperative cancellation flag for one build.
///
/// Clones share the flag; cancelling any clone cancels the build at its
/// next phase boundary or embedding batch.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
