//! Reconstruction model trait and inference output types

use crate::assets::{MaskBuffer, PixelImage};
use crate::error::Result;
use crate::geometry::{Mesh, PointCloud};

/// Structured inference output.
///
/// Depending on the pipeline's decode configuration either representation,
/// both, or neither may be present. Absence means "not produced", never an
/// error.
#[derive(Debug, Clone, Default)]
pub struct InferenceResult {
    pub mesh: Option<Mesh>,
    pub point_cloud: Option<PointCloud>,
}

/// Interface to the external image-to-3D reconstruction model.
///
/// Implementations are `Send + Sync` and `infer` takes `&self`, so calls may
/// overlap; a backend that is not internally thread-safe must serialize its
/// own critical section. Given a fixed `(image, mask, seed)` the model output
/// is deterministic; implementations must not mutate shared state between
/// calls.
pub trait ReconstructionModel: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Run one reconstruction.
    fn infer(
        &self,
        image: &PixelImage,
        mask: Option<&MaskBuffer>,
        seed: u64,
    ) -> Result<InferenceResult>;
}
