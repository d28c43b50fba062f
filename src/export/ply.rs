//! ASCII PLY writer for point clouds

use std::io::Write;

use crate::error::{Result, WorkerError};
use crate::geometry::PointCloud;

/// Write a point cloud as ASCII PLY. Per-point colors are emitted when
/// present and must match the point count.
pub fn write<W: Write>(cloud: &PointCloud, writer: &mut W) -> Result<()> {
    if let Some(colors) = &cloud.colors {
        if colors.len() != cloud.points.len() {
            return Err(WorkerError::Export {
                format: "ply".to_string(),
                reason: format!(
                    "{} colors for {} points",
                    colors.len(),
                    cloud.points.len()
                ),
            });
        }
    }

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "element vertex {}", cloud.points.len())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    if cloud.colors.is_some() {
        writeln!(writer, "property uchar red")?;
        writeln!(writer, "property uchar green")?;
        writeln!(writer, "property uchar blue")?;
    }
    writeln!(writer, "end_header")?;

    match &cloud.colors {
        Some(colors) => {
            for ([x, y, z], [r, g, b]) in cloud.points.iter().zip(colors) {
                writeln!(writer, "{x} {y} {z} {r} {g} {b}")?;
            }
        }
        None => {
            for [x, y, z] in &cloud.points {
                writeln!(writer, "{x} {y} {z}")?;
            }
        }
    }
    Ok(())
}
