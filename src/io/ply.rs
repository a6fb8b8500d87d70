//! PLY (Stanford polygon) format support.
//!
//! Loading goes through `ply-rs` and accepts ASCII and binary files. Saving
//! writes ASCII, optionally with extra per-vertex float properties so that
//! computed fields can be inspected in other tools.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh};

/// A named group of per-vertex float properties.
///
/// Each variant expands to one or more PLY `property float` lines.
#[derive(Debug, Clone, Copy)]
pub enum VertexProperty<'a> {
    /// A scalar written as `quality`.
    Quality(&'a [f64]),
    /// Vectors written as `nx`, `ny`, `nz`.
    Normal(&'a [nalgebra::Vector3<f64>]),
    /// 2D coordinates written as `u`, `v`.
    TexCoord(&'a [nalgebra::Point2<f64>]),
}

impl VertexProperty<'_> {
    fn len(&self) -> usize {
        match self {
            VertexProperty::Quality(values) => values.len(),
            VertexProperty::Normal(values) => values.len(),
            VertexProperty::TexCoord(values) => values.len(),
        }
    }

    fn names(&self) -> &'static [&'static str] {
        match self {
            VertexProperty::Quality(_) => &["quality"],
            VertexProperty::Normal(_) => &["nx", "ny", "nz"],
            VertexProperty::TexCoord(_) => &["u", "v"],
        }
    }

    fn write_values<W: Write>(&self, writer: &mut W, i: usize) -> std::io::Result<()> {
        match self {
            VertexProperty::Quality(values) => write!(writer, " {}", values[i]),
            VertexProperty::Normal(values) => {
                let n = values[i];
                write!(writer, " {} {} {}", n.x, n.y, n.z)
            }
            VertexProperty::TexCoord(values) => {
                let uv = values[i];
                write!(writer, " {} {}", uv.x, uv.y)
            }
        }
    }
}

/// Load a mesh from a PLY file.
///
/// Polygons are fan-triangulated. Extra vertex properties are ignored.
pub fn load<P: AsRef<Path>>(path: P) -> Result<HalfEdgeMesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| MeshError::load(path, e))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| MeshError::load(path, "PLY file has no vertex element"))?;

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    for vertex in vertex_element {
        let coord = |name: &str| {
            get_float_property(vertex, name)
                .ok_or_else(|| MeshError::load(path, format!("vertex missing {} coordinate", name)))
        };
        vertices.push(Point3::new(coord("x")?, coord("y")?, coord("z")?));
    }

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| MeshError::load(path, "PLY file has no face element"))?;

    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| MeshError::load(path, "face missing vertex_indices property"))?;

        if indices.len() >= 3 {
            for i in 1..indices.len() - 1 {
                faces.push([indices[0], indices[i], indices[i + 1]]);
            }
        }
    }

    if faces.is_empty() {
        return Err(MeshError::load(path, "PLY file contains no faces"));
    }

    build_from_triangles(&vertices, &faces)
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a mesh to an ASCII PLY file.
pub fn save<P: AsRef<Path>>(mesh: &HalfEdgeMesh, path: P) -> Result<()> {
    save_with_quantities(mesh, &[], path)
}

/// Save a mesh to an ASCII PLY file with extra per-vertex properties.
///
/// # Errors
///
/// [`MeshError::QuantityLength`] if a property does not have one entry per
/// vertex. Nothing is written in that case.
///
/// # Example
///
/// ```no_run
/// use meshlens::algo::curvature::gaussian_curvature;
/// use meshlens::io::ply::{save_with_quantities, VertexProperty};
///
/// let mesh = meshlens::io::load("model.obj").unwrap();
/// let k = gaussian_curvature(&mesh);
/// save_with_quantities(&mesh, &[VertexProperty::Quality(&k)], "curvature.ply").unwrap();
/// ```
pub fn save_with_quantities<P: AsRef<Path>>(
    mesh: &HalfEdgeMesh,
    properties: &[VertexProperty<'_>],
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    for property in properties {
        if property.len() != mesh.num_vertices() {
            return Err(MeshError::QuantityLength {
                name: property.names().join("/"),
                expected: mesh.num_vertices(),
                actual: property.len(),
            });
        }
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_ply(mesh, properties, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn write_ply<W: Write>(
    mesh: &HalfEdgeMesh,
    properties: &[VertexProperty<'_>],
    writer: &mut W,
) -> Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by meshlens")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    for name in ["x", "y", "z"]
        .iter()
        .chain(properties.iter().flat_map(|p| p.names().iter()))
    {
        writeln!(writer, "property float {}", name)?;
    }
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for (i, v) in vertices.iter().enumerate() {
        write!(writer, "{} {} {}", v.x, v.y, v.z)?;
        for property in properties {
            property.write_values(writer, i)?;
        }
        writeln!(writer)?;
    }

    for f in &faces {
        writeln!(writer, "3 {} {} {}", f[0], f[1], f[2])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures;
    use nalgebra::Vector3;

    #[test]
    fn test_header_lists_extra_properties() {
        let mesh = fixtures::grid(1);
        let quality = vec![0.5; 4];
        let normals = vec![Vector3::z(); 4];

        let mut buffer = Vec::new();
        write_ply(
            &mesh,
            &[VertexProperty::Quality(&quality), VertexProperty::Normal(&normals)],
            &mut buffer,
        )
        .unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let header: Vec<&str> = text.lines().take_while(|l| *l != "end_header").collect();
        assert!(header.contains(&"element vertex 4"));
        assert!(header.contains(&"property float quality"));
        assert!(header.contains(&"property float nz"));
        assert!(header.contains(&"element face 2"));

        let first_vertex = text.lines().nth(header.len() + 1).unwrap();
        assert_eq!(first_vertex.split_whitespace().count(), 3 + 1 + 3);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let mesh = fixtures::grid(1);
        let short = vec![1.0; 3];
        let path = std::env::temp_dir().join("meshlens_ply_mismatch.ply");

        let result = save_with_quantities(&mesh, &[VertexProperty::Quality(&short)], &path);
        assert!(matches!(
            result,
            Err(MeshError::QuantityLength { expected: 4, actual: 3, .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_save_and_load() {
        let mesh = fixtures::grid(2);
        let uv: Vec<_> = mesh
            .positions()
            .map(|p| nalgebra::Point2::new(p.x, p.y))
            .collect();
        let path = std::env::temp_dir().join("meshlens_ply_roundtrip.ply");

        save_with_quantities(&mesh, &[VertexProperty::TexCoord(&uv)], &path).unwrap();
        let loaded = load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.num_vertices(), mesh.num_vertices());
        assert_eq!(loaded.num_faces(), mesh.num_faces());
        assert!((loaded.surface_area() - mesh.surface_area()).abs() < 1e-6);
    }
}
