//! Worker configuration
//!
//! Built from CLI arguments with environment-variable fallbacks, the same way
//! the bridge endpoint and timeouts are resolved elsewhere in the stack.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the checkpoint-download access token.
pub const TOKEN_ENV_VAR: &str = "HF_TOKEN";

/// File whose presence marks a checkpoint tree as fully relocated and usable.
pub const READY_MARKER: &str = "pipeline.yaml";

/// Which inference backend the worker talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// Deterministic in-process backend, no checkpoints or GPU required.
    Mock,
    /// HTTP bridge in front of the real reconstruction model.
    Bridge { url: String },
}

/// Configuration for one worker process.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root directory holding checkpoint trees, one subdirectory per tag.
    pub checkpoint_root: PathBuf,

    /// Checkpoint tag; the ready tree lives at `<checkpoint_root>/<tag>/`.
    pub model_tag: String,

    /// Hub repository the checkpoints are downloaded from on cold start.
    pub checkpoint_repo: String,

    /// Timeout applied to image and mask fetches.
    pub fetch_timeout: Duration,

    /// Timeout applied to one bridge inference call.
    pub inference_timeout: Duration,

    /// Inference backend.
    pub backend: BackendKind,
}

impl WorkerConfig {
    /// Defaults, with `RECON3D_BRIDGE_URL` selecting the bridge backend when set.
    pub fn from_env() -> Self {
        let backend = match env::var("RECON3D_BRIDGE_URL") {
            Ok(url) if !url.trim().is_empty() => BackendKind::Bridge { url },
            _ => BackendKind::Mock,
        };

        let fetch_timeout_secs = env::var("RECON3D_FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        let inference_timeout_secs = env::var("RECON3D_INFERENCE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300); // 5 minutes default

        Self {
            checkpoint_root: env::var("RECON3D_CHECKPOINT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("checkpoints")),
            model_tag: env::var("RECON3D_MODEL_TAG").unwrap_or_else(|_| "hf".to_string()),
            checkpoint_repo: env::var("RECON3D_CHECKPOINT_REPO")
                .unwrap_or_else(|_| "facebook/sam-3d-objects".to_string()),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            inference_timeout: Duration::from_secs(inference_timeout_secs),
            backend,
        }
    }

    /// Expected location of the ready checkpoint tree.
    pub fn checkpoint_dir(&self) -> PathBuf {
        self.checkpoint_root.join(&self.model_tag)
    }

    /// Pipeline config file whose presence marks the checkpoints as ready.
    pub fn pipeline_config(&self) -> PathBuf {
        self.checkpoint_dir().join(READY_MARKER)
    }
}
