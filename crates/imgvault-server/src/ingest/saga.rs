//! Compensating transaction bookkeeping for one ingestion attempt
//!
//! The object store and the metadata database share no transaction. Each
//! forward step that leaves a side effect registers an undo step; when a later
//! step fails the registered undo steps run newest-first. Undo failures are
//! logged and swallowed so the caller always sees the original error.

use tracing::{debug, error, info, warn};

use super::key::StoreKey;
use crate::storage::{ObjectStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaState {
    Started,
    BlobWritten,
    Described,
    Persisted,
    Committed,
    /// A later step failed and every undo step succeeded.
    RolledBack,
    /// Failed with nothing to undo, or an undo step itself failed.
    Failed,
}

impl SagaState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SagaState::Committed | SagaState::RolledBack | SagaState::Failed)
    }

    fn allows(self, next: SagaState) -> bool {
        use SagaState::*;
        match (self, next) {
            (Started, BlobWritten)
            | (BlobWritten, Described)
            | (Described, Persisted)
            | (Persisted, Committed) => true,
            (from, RolledBack | Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Undo step for a completed side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    DeleteBlob(StoreKey),
}

impl Compensation {
    async fn run(&self, store: &dyn ObjectStore) -> Result<(), StoreError> {
        match self {
            Compensation::DeleteBlob(key) => store.delete(key.as_str()).await,
        }
    }
}

/// An undo step that could not be completed. Logged, never returned to callers.
#[derive(Debug, thiserror::Error)]
#[error("compensation {step:?} failed: {source}")]
pub struct CompensationError {
    pub step: Compensation,
    #[source]
    pub source: StoreError,
}

#[derive(Debug)]
pub struct Saga {
    key: StoreKey,
    state: SagaState,
    undo: Vec<Compensation>,
    history: Vec<SagaState>,
}

impl Saga {
    pub fn new(key: StoreKey) -> Self {
        Self {
            key,
            state: SagaState::Started,
            undo: Vec::new(),
            history: vec![SagaState::Started],
        }
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Every state visited so far, oldest first.
    pub fn history(&self) -> &[SagaState] {
        &self.history
    }

    pub fn pending_compensations(&self) -> &[Compensation] {
        &self.undo
    }

    /// Record that a forward step completed.
    pub fn advance(&mut self, next: SagaState) {
        debug_assert!(
            self.state.allows(next),
            "invalid saga transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(key = %self.key, from = ?self.state, to = ?next, "Saga transition");
        self.state = next;
        self.history.push(next);
    }

    /// Register the undo step for the side effect that was just performed.
    pub fn register(&mut self, compensation: Compensation) {
        self.undo.push(compensation);
    }

    /// Finish successfully; registered undo steps are discarded.
    pub fn commit(&mut self) {
        self.undo.clear();
        self.advance(SagaState::Committed);
        info!(key = %self.key, "Ingestion committed");
    }

    /// Run registered undo steps newest-first and move to a terminal state.
    ///
    /// Returns the undo steps that failed; the caller only logs them.
    pub async fn abort(&mut self, store: &dyn ObjectStore) -> Vec<CompensationError> {
        let had_undo = !self.undo.is_empty();
        let mut failures = Vec::new();

        while let Some(step) = self.undo.pop() {
            match step.run(store).await {
                Ok(()) => debug!(key = %self.key, step = ?step, "Compensation applied"),
                Err(source) => {
                    let failure = CompensationError { step, source };
                    error!(key = %self.key, error = %failure, "Compensation failed; blob may be orphaned");
                    failures.push(failure);
                },
            }
        }

        let terminal = if had_undo && failures.is_empty() {
            SagaState::RolledBack
        } else {
            SagaState::Failed
        };
        warn!(key = %self.key, state = ?terminal, "Ingestion aborted");
        self.advance(terminal);

        failures
    }
}
