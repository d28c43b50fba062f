//! Binary glTF 2.0 writer
//!
//! One buffer, two buffer views (positions, indices), one triangle primitive.
//! Layout: 12-byte header, space-padded JSON chunk, zero-padded BIN chunk.

use std::io::Write;

use crate::error::Result;
use crate::geometry::Mesh;

const MAGIC: u32 = 0x4654_6C67; // "glTF"
const VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
const CHUNK_BIN: u32 = 0x004E_4942; // "BIN\0"

const COMPONENT_F32: u32 = 5126;
const COMPONENT_U32: u32 = 5125;
const TARGET_ARRAY_BUFFER: u32 = 34962;
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;
const MODE_TRIANGLES: u32 = 4;

/// Write a mesh as a binary glTF container.
pub fn write<W: Write>(mesh: &Mesh, writer: &mut W) -> Result<()> {
    super::validate_mesh(mesh, "glb")?;

    let mut bin = Vec::with_capacity(mesh.vertices.len() * 12 + mesh.faces.len() * 12);
    for vertex in &mesh.vertices {
        for component in vertex {
            bin.extend_from_slice(&component.to_le_bytes());
        }
    }
    let position_len = bin.len();
    for face in &mesh.faces {
        for index in face {
            bin.extend_from_slice(&index.to_le_bytes());
        }
    }
    let index_len = bin.len() - position_len;
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let (min, max) = mesh.bounds().unwrap_or(([0.0; 3], [0.0; 3]));
    let json = serde_json::json!({
        "asset": { "version": "2.0", "generator": "recon3d" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{
            "primitives": [{
                "attributes": { "POSITION": 0 },
                "indices": 1,
                "mode": MODE_TRIANGLES
            }]
        }],
        "accessors": [
            {
                "bufferView": 0,
                "componentType": COMPONENT_F32,
                "count": mesh.vertices.len(),
                "type": "VEC3",
                "min": min,
                "max": max
            },
            {
                "bufferView": 1,
                "componentType": COMPONENT_U32,
                "count": mesh.faces.len() * 3,
                "type": "SCALAR"
            }
        ],
        "bufferViews": [
            {
                "buffer": 0,
                "byteOffset": 0,
                "byteLength": position_len,
                "target": TARGET_ARRAY_BUFFER
            },
            {
                "buffer": 0,
                "byteOffset": position_len,
                "byteLength": index_len,
                "target": TARGET_ELEMENT_ARRAY_BUFFER
            }
        ],
        "buffers": [{ "byteLength": bin.len() }]
    });
    let mut json_bytes = serde_json::to_vec(&json)?;
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }

    let total = 12 + 8 + json_bytes.len() + 8 + bin.len();
    writer.write_all(&MAGIC.to_le_bytes())?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&(total as u32).to_le_bytes())?;

    writer.write_all(&(json_bytes.len() as u32).to_le_bytes())?;
    writer.write_all(&CHUNK_JSON.to_le_bytes())?;
    writer.write_all(&json_bytes)?;

    writer.write_all(&(bin.len() as u32).to_le_bytes())?;
    writer.write_all(&CHUNK_BIN.to_le_bytes())?;
    writer.write_all(&bin)?;
    Ok(())
}
