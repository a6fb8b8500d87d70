//! Wavefront OBJ support.
//!
//! Only geometry is read and written: `v` positions and `f` faces. Texture coordinate
//! and normal indices on faces are ignored, and polygons with more than three
//! corners are split into a triangle fan around their first corner.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::Point3;
use obj::ObjData;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh};

/// Load a mesh from an OBJ file.
///
/// Vertex `i` of the mesh is the `i`-th `v` line of the file.
///
/// # Example
///
/// ```no_run
/// use meshlens::io::obj;
///
/// let mesh = obj::load("model.obj").unwrap();
/// println!("{} vertices", mesh.num_vertices());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<HalfEdgeMesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let (vertices, faces) = read_triangles(BufReader::new(file)).map_err(|e| match e {
        MeshError::LoadError { message, .. } => MeshError::load(path, message),
        other => other,
    })?;
    build_from_triangles(&vertices, &faces)
}

/// Load a mesh from OBJ text.
pub fn load_from_reader<R: Read>(reader: R) -> Result<HalfEdgeMesh> {
    let (vertices, faces) = read_triangles(reader)?;
    build_from_triangles(&vertices, &faces)
}

/// Positions and fan-triangulated faces of an OBJ stream, in file order.
fn read_triangles<R: Read>(reader: R) -> Result<(Vec<Point3<f64>>, Vec<[usize; 3]>)> {
    let data = ObjData::load_buf(reader).map_err(|e| MeshError::load("<obj>", e))?;

    let vertices: Vec<Point3<f64>> = data
        .position
        .iter()
        .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
        .collect();

    let mut faces: Vec<[usize; 3]> = Vec::new();
    for group in data.objects.iter().flat_map(|o| o.groups.iter()) {
        for poly in &group.polys {
            let corners: Vec<usize> = poly.0.iter().map(|t| t.0).collect();
            if corners.len() < 3 {
                continue;
            }
            for i in 1..corners.len() - 1 {
                faces.push([corners[0], corners[i], corners[i + 1]]);
            }
        }
    }

    if faces.is_empty() {
        return Err(MeshError::load("<obj>", "OBJ data contains no faces"));
    }

    Ok((vertices, faces))
}

/// Save a mesh to an OBJ file with `v` and `f` lines only.
pub fn save<P: AsRef<Path>>(mesh: &HalfEdgeMesh, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_obj(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn write_obj<W: Write>(mesh: &HalfEdgeMesh, writer: &mut W) -> Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "# Generated by meshlens")?;
    for v in &vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    // OBJ indices are 1-based
    for f in &faces {
        writeln!(writer, "f {} {} {}", f[0] + 1, f[1] + 1, f[2] + 1)?;
    }
    Ok(())
}
