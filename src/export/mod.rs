//! Built-in mesh and point-cloud writers
//!
//! Minimal serializers for the formats the worker returns: Wavefront OBJ,
//! binary glTF, and ASCII PLY for point clouds. FBX has no built-in writer;
//! requesting it surfaces `UnsupportedFormat` so the caller can suggest a
//! fallback.

pub mod glb;
pub mod obj;
pub mod ply;

use crate::error::{Result, WorkerError};
use crate::geometry::Mesh;

/// Reject meshes with no geometry, or whose faces index past the vertex
/// table, before any bytes are written.
pub(crate) fn validate_mesh(mesh: &Mesh, format: &str) -> Result<()> {
    if mesh.vertices.is_empty() {
        return Err(WorkerError::Export {
            format: format.to_string(),
            reason: "mesh has no vertices".to_string(),
        });
    }
    let vertex_count = mesh.vertices.len() as u32;
    for face in &mesh.faces {
        if face.iter().any(|&i| i >= vertex_count) {
            return Err(WorkerError::Export {
                format: format.to_string(),
                reason: format!(
                    "face references vertex {} but mesh has {} vertices",
                    face.iter().max().copied().unwrap_or(0),
                    vertex_count
                ),
            });
        }
    }
    Ok(())
}
