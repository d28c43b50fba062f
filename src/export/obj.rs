//! Wavefront OBJ writer

use std::io::Write;

use crate::error::Result;
use crate::geometry::Mesh;

/// Write a mesh as OBJ text. Face indices are 1-based per the format.
pub fn write<W: Write>(mesh: &Mesh, writer: &mut W) -> Result<()> {
    super::validate_mesh(mesh, "obj")?;

    for [x, y, z] in &mesh.vertices {
        writeln!(writer, "v {x} {y} {z}")?;
    }
    for [a, b, c] in &mesh.faces {
        writeln!(writer, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_obj_output() {
        let mesh = Mesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.5]],
            vec![[0, 1, 2]],
        );

        let mut out = Vec::new();
        write(&mesh, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "v 0 0 0\nv 1 0 0\nv 0 1 0.5\nf 1 2 3\n");
    }
}
