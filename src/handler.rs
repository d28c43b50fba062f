//! Job handler
//!
//! Drives one job through the pipeline: validate, ensure the model resource
//! is ready (bootstrapping checkpoints if needed), fetch assets, infer,
//! encode, respond. Every failure is converted into `{"error": ...}` at this
//! boundary; nothing propagates to the host runtime.

use std::env;
use std::sync::Arc;

use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::assets::AssetFetcher;
use crate::checkpoint;
use crate::config::{BackendKind, WorkerConfig, TOKEN_ENV_VAR};
use crate::encoder;
use crate::error::{Result, WorkerError};
use crate::job::{JobRequest, JobResponse};
use crate::model::{BridgeModel, MockModel, ModelResource, ReconstructionModel};

/// Handles jobs for one worker process.
pub struct JobHandler {
    fetcher: AssetFetcher,
    resource: Arc<ModelResource>,
}

impl JobHandler {
    /// Build a handler whose model resource loads lazily on first use.
    ///
    /// The bridge backend bootstraps checkpoints inside the guarded loader,
    /// so racing cold-start jobs trigger at most one download. The mock
    /// backend needs neither checkpoints nor a credential.
    pub fn new(config: WorkerConfig) -> Result<Self> {
        let loader_config = config.clone();
        let resource = Arc::new(ModelResource::new(Box::new(move || {
            match &loader_config.backend {
                BackendKind::Mock => {
                    Ok(Arc::new(MockModel::new()) as Arc<dyn ReconstructionModel>)
                }
                BackendKind::Bridge { url } => {
                    let token = env::var(TOKEN_ENV_VAR).ok();
                    checkpoint::ensure_checkpoints(&loader_config, token.as_deref())?;
                    let bridge = BridgeModel::new(url, loader_config.inference_timeout)?;
                    Ok(Arc::new(bridge) as Arc<dyn ReconstructionModel>)
                }
            }
        })));
        Self::with_resource(&config, resource)
    }

    /// Build a handler around an existing model resource.
    pub fn with_resource(config: &WorkerConfig, resource: Arc<ModelResource>) -> Result<Self> {
        Ok(Self {
            fetcher: AssetFetcher::new(config.fetch_timeout)?,
            resource,
        })
    }

    /// Handle one job. Always returns a response, never panics or propagates.
    pub fn handle(&self, job: &JobRequest) -> JobResponse {
        let job_id = Uuid::new_v4();
        let span = info_span!("job", id = %job_id);
        let _guard = span.enter();

        match self.run(job) {
            Ok(response) => {
                info!(
                    mesh = response.mesh_base64.is_some(),
                    point_cloud = response.point_cloud_base64.is_some(),
                    "job complete"
                );
                response
            }
            Err(err) => {
                warn!(code = err.error_code(), error = %err, "job failed");
                JobResponse::failure(user_message(&err))
            }
        }
    }

    fn run(&self, job: &JobRequest) -> Result<JobResponse> {
        // Received -> Validated
        let image_ref = job.validate()?;

        // Validated -> ResourceReady (bootstrap + load happen in the loader)
        let model = self.resource.get_or_init()?;

        // ResourceReady -> AssetsLoaded
        info!(image = image_ref, "fetching assets");
        let image = self.fetcher.fetch_image(image_ref)?;
        let mask = job
            .mask_url
            .as_deref()
            .map(|reference| self.fetcher.fetch_mask(reference))
            .transpose()?;

        // AssetsLoaded -> Inferred
        info!(seed = job.seed, backend = model.name(), "running inference");
        let output = model.infer(&image, mask.as_ref(), job.seed)?;

        // Inferred -> Encoded; a missing mesh is not an error, and a mesh
        // with no geometry counts as missing.
        let mut response = JobResponse::empty();
        if let Some(mesh) = output.mesh.as_ref().filter(|mesh| !mesh.is_empty()) {
            let asset = encoder::encode_mesh(mesh, job.format)?;
            response.format = Some(asset.format.to_string());
            response.mesh_base64 = Some(asset.base64);
        }
        if job.include_point_cloud {
            if let Some(cloud) = &output.point_cloud {
                let asset = encoder::encode_point_cloud(cloud)?;
                response.point_cloud_format = Some(asset.format.to_string());
                response.point_cloud_base64 = Some(asset.base64);
            }
        }
        Ok(response)
    }
}

/// User-facing message for a failed job. The handler, not the encoder, owns
/// the fallback suggestion wording.
fn user_message(err: &WorkerError) -> String {
    match err {
        WorkerError::UnsupportedFormat { .. } | WorkerError::Export { .. } => {
            format!("{err}. Try 'glb' or 'obj'.")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use std::path::PathBuf;

    fn mock_config() -> WorkerConfig {
        WorkerConfig {
            checkpoint_root: PathBuf::from("checkpoints"),
            model_tag: "hf".to_string(),
            checkpoint_repo: "example/recon-model".to_string(),
            fetch_timeout: Duration::from_secs(5),
            inference_timeout: Duration::from_secs(5),
            backend: BackendKind::Mock,
        }
    }

    #[test]
    fn test_unsupported_format_message_suggests_fallback() {
        let message = user_message(&WorkerError::UnsupportedFormat {
            format: "fbx".to_string(),
        });
        assert_eq!(message, "Unsupported output format: fbx. Try 'glb' or 'obj'.");
    }

    #[test]
    fn test_other_errors_pass_through() {
        let message = user_message(&WorkerError::Inference {
            reason: "CUDA out of memory".to_string(),
        });
        assert_eq!(message, "Inference failed: CUDA out of memory");
    }

    #[test]
    fn test_missing_image_url_fails_validation() {
        let handler = JobHandler::new(mock_config()).unwrap();
        let job: JobRequest = serde_json::from_str("{}").unwrap();

        let response = handler.handle(&job);
        assert!(response.is_error());
        assert!(response.error.unwrap().contains("image_url"));
    }
}
