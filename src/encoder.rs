//! Output encoder
//!
//! Serializes inference output into a transport-safe payload: export to a
//! scoped temporary file, read the bytes back, base64-encode. The temp file's
//! lifetime is exactly the encode call -- the `NamedTempFile` guard removes
//! it on every exit path, so no export artifact outlives the call and no
//! filesystem path ever reaches the caller.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::debug;

use crate::error::{Result, WorkerError};
use crate::export;
use crate::geometry::{Mesh, PointCloud};
use crate::job::OutputFormat;

/// Transport-safe encoded asset: base64 payload plus a format tag.
#[derive(Debug, Clone)]
pub struct EncodedAsset {
    pub base64: String,
    pub format: &'static str,
}

/// Encode a mesh in the requested format.
pub fn encode_mesh(mesh: &Mesh, format: OutputFormat) -> Result<EncodedAsset> {
    encode_mesh_in(mesh, format, &std::env::temp_dir())
}

/// Encode a point cloud as PLY.
pub fn encode_point_cloud(cloud: &PointCloud) -> Result<EncodedAsset> {
    encode_point_cloud_in(cloud, &std::env::temp_dir())
}

pub(crate) fn encode_mesh_in(
    mesh: &Mesh,
    format: OutputFormat,
    temp_dir: &Path,
) -> Result<EncodedAsset> {
    // Checked before any file is created; there is no fbx writer.
    if format == OutputFormat::Fbx {
        return Err(WorkerError::UnsupportedFormat {
            format: format.to_string(),
        });
    }

    let file = scoped_file(format.extension(), temp_dir)?;
    {
        let mut writer = BufWriter::new(file.as_file());
        match format {
            OutputFormat::Glb => export::glb::write(mesh, &mut writer)?,
            OutputFormat::Obj => export::obj::write(mesh, &mut writer)?,
            OutputFormat::Fbx => unreachable!("rejected above"),
        }
        writer.flush()?;
    }
    read_back(file, format.as_str())
}

pub(crate) fn encode_point_cloud_in(cloud: &PointCloud, temp_dir: &Path) -> Result<EncodedAsset> {
    let file = scoped_file("ply", temp_dir)?;
    {
        let mut writer = BufWriter::new(file.as_file());
        export::ply::write(cloud, &mut writer)?;
        writer.flush()?;
    }
    read_back(file, "ply")
}

fn scoped_file(extension: &str, temp_dir: &Path) -> Result<tempfile::NamedTempFile> {
    Ok(tempfile::Builder::new()
        .prefix("recon3d-")
        .suffix(&format!(".{extension}"))
        .tempfile_in(temp_dir)?)
}

fn read_back(file: tempfile::NamedTempFile, format: &'static str) -> Result<EncodedAsset> {
    let bytes = fs::read(file.path())?;
    debug!(format, size = bytes.len(), "encoded asset");
    Ok(EncodedAsset {
        base64: BASE64.encode(&bytes),
        format,
    })
    // `file` drops here and removes the export artifact.
}
