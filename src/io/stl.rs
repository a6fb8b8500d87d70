//! STL (stereolithography) format support.
//!
//! STL stores three corners per triangle with no shared vertices. On load,
//! corners with bit-identical coordinates are welded into one vertex.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh};

/// Load a mesh from an STL file, binary or ASCII.
pub fn load<P: AsRef<Path>>(path: P) -> Result<HalfEdgeMesh> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    load_from_reader(&mut file).map_err(|e| match e {
        MeshError::LoadError { message, .. } => MeshError::load(path, message),
        other => other,
    })
}

fn load_from_reader<R: Read + Seek>(reader: &mut R) -> Result<HalfEdgeMesh> {
    let stl = stl_io::read_stl(reader).map_err(|e| MeshError::load("<stl>", e))?;

    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut welded: HashMap<[u32; 3], usize> = HashMap::new();
    let mut remap: Vec<usize> = Vec::with_capacity(stl.vertices.len());
    for v in &stl.vertices {
        let key = [v[0].to_bits(), v[1].to_bits(), v[2].to_bits()];
        let index = *welded.entry(key).or_insert_with(|| {
            vertices.push(Point3::new(v[0] as f64, v[1] as f64, v[2] as f64));
            vertices.len() - 1
        });
        remap.push(index);
    }

    let faces: Vec<[usize; 3]> = stl
        .faces
        .iter()
        .map(|tri| tri.vertices.map(|i| remap[i]))
        // Welding can collapse slivers
        .filter(|[a, b, c]| a != b && b != c && a != c)
        .collect();

    if faces.is_empty() {
        return Err(MeshError::load("<stl>", "STL file contains no valid triangles"));
    }

    build_from_triangles(&vertices, &faces)
}

/// Save a mesh to a binary STL file.
pub fn save<P: AsRef<Path>>(mesh: &HalfEdgeMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_stl(mesh, &mut writer).map_err(|e| MeshError::save(path, e))?;
    writer.flush()?;
    Ok(())
}

fn write_stl<W: Write>(mesh: &HalfEdgeMesh, writer: &mut W) -> std::io::Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);
    let to_f32 = |p: &Point3<f64>| [p.x as f32, p.y as f32, p.z as f32];

    let triangles: Vec<stl_io::Triangle> = faces
        .iter()
        .map(|f| {
            let [p0, p1, p2] = f.map(|i| &vertices[i]);
            let n = (p1 - p0)
                .cross(&(p2 - p0))
                .try_normalize(f64::EPSILON)
                .unwrap_or_else(nalgebra::Vector3::zeros);

            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new(to_f32(p0)),
                    stl_io::Vertex::new(to_f32(p1)),
                    stl_io::Vertex::new(to_f32(p2)),
                ],
            }
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter())
}
