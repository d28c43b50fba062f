//! Guarded lazily-initialized model resource
//!
//! Replaces ambient global model state with an explicit manager. The first
//! caller on a cold start runs the loader (with the lock released, so the
//! expensive load does not serialize unrelated work); callers racing during
//! that window block on a condvar and observe the outcome of that one
//! attempt, success or failure. A failed attempt does not poison the process:
//! the next call that arrives after the failure retries the load. Once ready,
//! the handle is never reconstructed.

use std::sync::{Arc, Condvar, Mutex};

use tracing::{info, warn};

use crate::error::{Result, WorkerError};
use crate::model::backend::ReconstructionModel;

type Loader = Box<dyn Fn() -> Result<Arc<dyn ReconstructionModel>> + Send + Sync>;

enum State {
    Idle,
    Initializing,
    Ready(Arc<dyn ReconstructionModel>),
    Failed(Arc<WorkerError>),
}

struct Inner {
    state: State,
    /// Bumped when an initialization attempt completes. Lets a caller tell a
    /// failure it waited on apart from a stale failure that predates it.
    generation: u64,
}

/// Process-wide handle to the loaded model, initialized at most once per
/// cold-start window.
pub struct ModelResource {
    inner: Mutex<Inner>,
    cond: Condvar,
    loader: Loader,
}

impl ModelResource {
    pub fn new(loader: Loader) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: State::Idle,
                generation: 0,
            }),
            cond: Condvar::new(),
            loader,
        }
    }

    /// Get the ready model handle, loading it first if necessary.
    pub fn get_or_init(&self) -> Result<Arc<dyn ReconstructionModel>> {
        let mut guard = self.inner.lock().expect("model resource mutex poisoned");
        let entered_at = guard.generation;

        loop {
            match &guard.state {
                State::Ready(model) => return Ok(Arc::clone(model)),
                State::Failed(err) if guard.generation > entered_at => {
                    // The attempt this caller waited on failed; share its outcome.
                    return Err(shared_failure(err));
                }
                State::Failed(_) | State::Idle => {
                    guard.state = State::Initializing;
                    break;
                }
                State::Initializing => {
                    guard = self
                        .cond
                        .wait(guard)
                        .expect("model resource mutex poisoned");
                }
            }
        }
        drop(guard);

        let outcome = (self.loader)();

        let mut guard = self.inner.lock().expect("model resource mutex poisoned");
        guard.generation += 1;
        let result = match outcome {
            Ok(model) => {
                info!(backend = model.name(), "model initialized");
                guard.state = State::Ready(Arc::clone(&model));
                Ok(model)
            }
            Err(err) => {
                warn!(error = %err, "model initialization failed");
                let err = Arc::new(err);
                guard.state = State::Failed(Arc::clone(&err));
                Err(shared_failure(&err))
            }
        };
        self.cond.notify_all();
        result
    }

    /// Whether the handle is currently initialized.
    pub fn is_ready(&self) -> bool {
        matches!(
            self.inner.lock().expect("model resource mutex poisoned").state,
            State::Ready(_)
        )
    }
}

/// Reproduce a stored initialization failure for one observer.
///
/// Configuration errors keep their variant so the caller can distinguish
/// operator action from a retryable load failure; everything else surfaces as
/// an initialization error.
fn shared_failure(err: &WorkerError) -> WorkerError {
    match err {
        WorkerError::MissingCredential { variable } => WorkerError::MissingCredential {
            variable: variable.clone(),
        },
        WorkerError::Bootstrap { reason } => WorkerError::Bootstrap {
            reason: reason.clone(),
        },
        other => WorkerError::Initialization {
            reason: other.to_string(),
        },
    }
}
