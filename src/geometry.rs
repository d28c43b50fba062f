//! 3D output representations produced by the model
//!
//! These mirror what the reconstruction pipeline hands back: a surface mesh
//! and/or a point cloud. The worker only serializes them, it never edits
//! geometry.

use serde::{Deserialize, Serialize};

/// Triangle mesh: vertex positions plus indexed faces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<[f32; 3]>,
    /// Triangle indices into `vertices`, zero-based.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new(vertices: Vec<[f32; 3]>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Axis-aligned bounds of the vertex positions, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for v in &self.vertices[1..] {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
        }
        Some((min, max))
    }
}

/// Point cloud, the model's alternative output representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub points: Vec<[f32; 3]>,
    /// Optional per-point RGB colors, same length as `points` when present.
    #[serde(default)]
    pub colors: Option<Vec<[u8; 3]>>,
}

impl PointCloud {
    pub fn new(points: Vec<[f32; 3]>) -> Self {
        Self {
            points,
            colors: None,
        }
    }

    pub fn with_colors(mut self, colors: Vec<[u8; 3]>) -> Self {
        self.colors = Some(colors);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_bounds() {
        let mesh = Mesh::new(
            vec![[0.0, -1.0, 2.0], [1.0, 0.5, -3.0], [0.5, 0.0, 0.0]],
            vec![[0, 1, 2]],
        );

        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, [0.0, -1.0, -3.0]);
        assert_eq!(max, [1.0, 0.5, 2.0]);
    }

    #[test]
    fn test_empty_mesh_has_no_bounds() {
        let mesh = Mesh::new(vec![], vec![]);
        assert!(mesh.is_empty());
        assert!(mesh.bounds().is_none());
    }
}
