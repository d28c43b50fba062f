//! Mock reconstruction backend
//!
//! No real model behind it: produces a deterministic seed-derived mesh and
//! point cloud so the full pipeline can be exercised without checkpoints, a
//! GPU, or the inference bridge. Used by tests and by local runs.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::assets::{MaskBuffer, PixelImage};
use crate::error::{Result, WorkerError};
use crate::geometry::{Mesh, PointCloud};
use crate::model::backend::{InferenceResult, ReconstructionModel};

const DEFAULT_VERTEX_COUNT: usize = 100;
const DEFAULT_POINT_COUNT: usize = 256;

/// Deterministic stand-in for the reconstruction model.
pub struct MockModel {
    vertex_count: usize,
    produce_mesh: bool,
    produce_point_cloud: bool,
    fail_with: Option<String>,
    invocations: AtomicUsize,
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            vertex_count: DEFAULT_VERTEX_COUNT,
            produce_mesh: true,
            produce_point_cloud: true,
            fail_with: None,
            invocations: AtomicUsize::new(0),
        }
    }

    /// Simulate a pipeline configured without mesh decoding.
    pub fn without_mesh(mut self) -> Self {
        self.produce_mesh = false;
        self
    }

    pub fn without_point_cloud(mut self) -> Self {
        self.produce_point_cloud = false;
        self
    }

    /// Make every inference call fail with the given reason.
    pub fn failing(mut self, reason: &str) -> Self {
        self.fail_with = Some(reason.to_string());
        self
    }

    pub fn with_vertex_count(mut self, count: usize) -> Self {
        self.vertex_count = count.max(3);
        self
    }

    /// How many times `infer` has been called on this instance.
    pub fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Triangle fan around a seed-perturbed center: `vertex_count` vertices,
    /// `vertex_count - 2` faces.
    fn build_mesh(&self, seed: u64) -> Mesh {
        let mut rng = SplitMix64::new(seed);
        let center_z = rng.next_unit();

        let ring = self.vertex_count - 1;
        let mut vertices = Vec::with_capacity(self.vertex_count);
        vertices.push([0.0, 0.0, center_z]);
        for i in 0..ring {
            let angle = (i as f32 / ring as f32) * std::f32::consts::TAU;
            let radius = 1.0 + 0.1 * rng.next_unit();
            vertices.push([radius * angle.cos(), radius * angle.sin(), 0.0]);
        }

        let mut faces = Vec::with_capacity(ring - 1);
        for i in 1..ring as u32 {
            faces.push([0, i, i + 1]);
        }
        Mesh::new(vertices, faces)
    }

    fn build_point_cloud(&self, seed: u64) -> PointCloud {
        let mut rng = SplitMix64::new(seed ^ 0x9e37_79b9);
        let mut points = Vec::with_capacity(DEFAULT_POINT_COUNT);
        let mut colors = Vec::with_capacity(DEFAULT_POINT_COUNT);
        for _ in 0..DEFAULT_POINT_COUNT {
            points.push([rng.next_unit(), rng.next_unit(), rng.next_unit()]);
            colors.push([rng.next_byte(), rng.next_byte(), rng.next_byte()]);
        }
        PointCloud::new(points).with_colors(colors)
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconstructionModel for MockModel {
    fn name(&self) -> &str {
        "mock"
    }

    fn infer(
        &self,
        _image: &PixelImage,
        _mask: Option<&MaskBuffer>,
        seed: u64,
    ) -> Result<InferenceResult> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.fail_with {
            return Err(WorkerError::Inference {
                reason: reason.clone(),
            });
        }

        Ok(InferenceResult {
            mesh: self.produce_mesh.then(|| self.build_mesh(seed)),
            point_cloud: self
                .produce_point_cloud
                .then(|| self.build_point_cloud(seed)),
        })
    }
}

/// Small deterministic generator (SplitMix64) for seed-derived geometry.
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform value in [0, 1).
    fn next_unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    fn next_byte(&mut self) -> u8 {
        (self.next_u64() >> 56) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_image() -> PixelImage {
        PixelImage {
            width: 2,
            height: 2,
            data: vec![0; 12],
        }
    }

    #[test]
    fn test_default_mesh_has_100_vertices() {
        let model = MockModel::new();
        let output = model.infer(&blank_image(), None, 42).unwrap();

        let mesh = output.mesh.unwrap();
        assert_eq!(mesh.vertices.len(), 100);
        assert_eq!(mesh.faces.len(), 98);
        assert!(output.point_cloud.is_some());
    }

    #[test]
    fn test_deterministic_under_fixed_seed() {
        let model = MockModel::new();
        let a = model.infer(&blank_image(), None, 7).unwrap();
        let b = model.infer(&blank_image(), None, 7).unwrap();
        let c = model.infer(&blank_image(), None, 8).unwrap();

        assert_eq!(a.mesh, b.mesh);
        assert_eq!(a.point_cloud, b.point_cloud);
        assert_ne!(a.mesh, c.mesh);
    }

    #[test]
    fn test_invocation_counting() {
        let model = MockModel::new();
        assert_eq!(model.invocation_count(), 0);
        model.infer(&blank_image(), None, 1).unwrap();
        model.infer(&blank_image(), None, 2).unwrap();
        assert_eq!(model.invocation_count(), 2);
    }

    #[test]
    fn test_failing_mock() {
        let model = MockModel::new().failing("CUDA out of memory");
        let err = model.infer(&blank_image(), None, 42).unwrap_err();
        assert_eq!(err.error_code(), "INFERENCE_ERROR");
        assert_eq!(model.invocation_count(), 1);
    }

    #[test]
    fn test_no_mesh_configuration() {
        let model = MockModel::new().without_mesh();
        let output = model.infer(&blank_image(), None, 42).unwrap();
        assert!(output.mesh.is_none());
        assert!(output.point_cloud.is_some());
    }
}
