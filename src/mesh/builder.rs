//! Mesh construction from face-vertex lists.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and triangle faces.
///
/// Vertices keep their input order, so vertex `i` of the result is
/// `vertices[i]`. Vertices no face refers to are kept as isolated vertices.
///
/// # Errors
/// * [`MeshError::EmptyMesh`] if `faces` is empty
/// * [`MeshError::InvalidVertexIndex`] for an out-of-range index
/// * [`MeshError::DegenerateFace`] for a face that repeats a vertex
/// * [`MeshError::NonManifoldEdge`] when two faces use the same directed edge
/// * [`MeshError::NonManifold`] when the faces around a vertex form more
///   than one fan, as in two triangles that touch only at a corner
///
/// # Example
/// ```
/// use meshlens::mesh::build_from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> Result<HalfEdgeMesh> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        if let Some(&vi) = face.iter().find(|&&vi| vi >= vertices.len()) {
            return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());
    for &pos in vertices {
        mesh.add_vertex(pos);
    }

    // Directed edge (from, to) -> interior half-edge
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId> = HashMap::with_capacity(faces.len() * 3);

    for (fi, face) in faces.iter().enumerate() {
        let face_id = FaceId::new(fi);
        let base = mesh.num_halfedges();
        let ids = [
            HalfEdgeId::new(base),
            HalfEdgeId::new(base + 1),
            HalfEdgeId::new(base + 2),
        ];
        mesh.faces.push(Face { halfedge: ids[0] });

        for k in 0..3 {
            let from = face[k];
            let to = face[(k + 1) % 3];
            if edge_map.insert((from, to), ids[k]).is_some() {
                return Err(MeshError::NonManifoldEdge { v0: from, v1: to });
            }
            mesh.halfedges.push(HalfEdge {
                origin: VertexId::new(from),
                twin: HalfEdgeId::invalid(),
                next: ids[(k + 1) % 3],
                prev: ids[(k + 2) % 3],
                face: face_id,
            });
            mesh.vertices[from].halfedge = ids[k];
        }
    }

    // Link twins in face order so boundary half-edge ids are deterministic
    let num_interior = mesh.num_halfedges();
    for i in 0..num_interior {
        let he = HalfEdgeId::new(i);
        if mesh.twin(he).is_valid() {
            continue;
        }
        let from = mesh.origin(he).index();
        let to = mesh.origin(mesh.next(he)).index();

        if let Some(&twin) = edge_map.get(&(to, from)) {
            mesh.halfedge_mut(he).twin = twin;
            mesh.halfedge_mut(twin).twin = he;
        } else {
            let boundary = HalfEdgeId::new(mesh.num_halfedges());
            mesh.halfedges.push(HalfEdge {
                origin: VertexId::new(to),
                twin: he,
                ..HalfEdge::default()
            });
            mesh.halfedge_mut(he).twin = boundary;
        }
    }

    link_boundary_loops(&mut mesh, num_interior)?;
    fix_boundary_vertex_halfedges(&mut mesh);
    check_single_fans(&mesh, faces)?;

    Ok(mesh)
}

/// Chain the boundary half-edges (stored after `first`) into loops.
fn link_boundary_loops(mesh: &mut HalfEdgeMesh, first: usize) -> Result<()> {
    let boundary: Vec<HalfEdgeId> = (first..mesh.num_halfedges()).map(HalfEdgeId::new).collect();

    let mut outgoing: HashMap<VertexId, HalfEdgeId> = HashMap::with_capacity(boundary.len());
    for &he in &boundary {
        let v = mesh.origin(he);
        if outgoing.insert(v, he).is_some() {
            return Err(MeshError::NonManifold {
                details: format!("vertex {} lies on two boundary fans", v.index()),
            });
        }
    }

    for &he in &boundary {
        // The next boundary half-edge starts where this one ends
        let dest = mesh.origin(mesh.twin(he));
        if let Some(&next) = outgoing.get(&dest) {
            mesh.halfedge_mut(he).next = next;
            mesh.halfedge_mut(next).prev = he;
        }
    }
    Ok(())
}

/// Point every boundary vertex at an outgoing boundary half-edge.
fn fix_boundary_vertex_halfedges(mesh: &mut HalfEdgeMesh) {
    for vi in 0..mesh.num_vertices() {
        let start = mesh.vertices[vi].halfedge;
        if !start.is_valid() {
            continue;
        }

        let mut he = start;
        loop {
            if mesh.is_boundary_halfedge(he) {
                mesh.vertices[vi].halfedge = he;
                break;
            }
            he = mesh.next(mesh.twin(he));
            if he == start || !he.is_valid() {
                break;
            }
        }
    }
}

/// Check that walking around each vertex reaches every face that uses it.
///
/// Closed fans that share only a vertex pass the boundary check, but the
/// walk from the vertex's half-edge stays inside one of them.
fn check_single_fans(mesh: &HalfEdgeMesh, faces: &[[usize; 3]]) -> Result<()> {
    let mut valence = vec![0usize; mesh.num_vertices()];
    for face in faces {
        for &v in face {
            valence[v] += 1;
        }
    }

    for v in mesh.vertex_ids() {
        let expected = valence[v.index()];
        if expected == 0 {
            continue;
        }
        let reached = mesh
            .vertex_halfedges(v)
            .take(expected + 1)
            .filter(|&he| !mesh.is_boundary_halfedge(he))
            .count();
        if reached != expected {
            return Err(MeshError::NonManifold {
                details: format!(
                    "vertex {} joins {} faces but only {} form a fan around it",
                    v.index(),
                    expected,
                    reached
                ),
            });
        }
    }
    Ok(())
}

/// Convert a half-edge mesh back to vertex positions and triangles.
pub fn to_face_vertex(mesh: &HalfEdgeMesh) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let vertices: Vec<Point3<f64>> = mesh.positions().copied().collect();

    let faces: Vec<[usize; 3]> = mesh
        .face_ids()
        .map(|f| {
            let [v0, v1, v2] = mesh.face_triangle(f);
            [v0.index(), v1.index(), v2.index()]
        })
        .collect();

    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        (vertices, faces)
    }

    fn tetrahedron() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(-1.0, -1.0, 1.0),
        ];
        let faces = vec![[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];
        (vertices, faces)
    }

    #[test]
    fn test_single_triangle() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        // 3 interior half-edges + 3 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 6);
        assert!(mesh.is_valid());
        assert!(mesh.vertex_ids().all(|v| mesh.is_boundary_vertex(v)));
    }

    #[test]
    fn test_two_triangles() {
        let (vertices, faces) = two_triangles();
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_faces(), 2);
        // 6 interior half-edges + 4 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 10);
        assert!(mesh.is_valid());
        assert!(mesh.has_boundary());
    }

    #[test]
    fn test_closed_mesh() {
        let (vertices, faces) = tetrahedron();
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_halfedges(), 12);
        assert!(mesh.is_valid());
        assert!(!mesh.has_boundary());
        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v));
            assert_eq!(mesh.vertex_neighbors(v).count(), 3);
        }
    }

    #[test]
    fn test_isolated_vertex_is_kept() {
        let (mut vertices, faces) = two_triangles();
        vertices.push(Point3::new(5.0, 5.0, 5.0));
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 5);
        assert!(mesh.is_isolated(VertexId::new(4)));
        assert_eq!(mesh.vertex_neighbors(VertexId::new(4)).count(), 0);
    }

    #[test]
    fn test_roundtrip() {
        let (vertices, faces) = two_triangles();
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        let (out_verts, out_faces) = to_face_vertex(&mesh);
        assert_eq!(out_faces, faces);
        for (v_in, v_out) in vertices.iter().zip(out_verts.iter()) {
            assert!((v_in - v_out).norm() < 1e-12);
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        let (vertices, _) = two_triangles();

        assert!(matches!(
            build_from_triangles(&vertices, &[]),
            Err(MeshError::EmptyMesh)
        ));
        assert!(matches!(
            build_from_triangles(&vertices, &[[0, 1, 9]]),
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 9 })
        ));
        assert!(matches!(
            build_from_triangles(&vertices, &[[0, 1, 2], [2, 2, 3]]),
            Err(MeshError::DegenerateFace { face: 1 })
        ));
    }

    #[test]
    fn test_rejects_flipped_neighbor() {
        let (vertices, _) = two_triangles();
        // Second face uses edge 0->1 in the same direction as the first
        let result = build_from_triangles(&vertices, &[[0, 1, 2], [0, 1, 3]]);
        assert!(matches!(
            result,
            Err(MeshError::NonManifoldEdge { v0: 0, v1: 1 })
        ));
    }

    #[test]
    fn test_rejects_bowtie_vertex() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
        ];
        let result = build_from_triangles(&vertices, &[[0, 1, 2], [0, 3, 4]]);
        match result {
            Err(MeshError::NonManifold { details }) => assert!(details.contains("vertex 0")),
            other => panic!("expected NonManifold, got {:?}", other.map(|m| m.num_faces())),
        }
    }

    #[test]
    fn test_rejects_closed_fans_sharing_a_vertex() {
        let (mut vertices, mut faces) = tetrahedron();
        vertices.extend([
            Point3::new(3.0, 3.0, 3.0),
            Point3::new(3.0, 1.0, 1.0),
            Point3::new(1.0, 3.0, 1.0),
        ]);
        // Second tetrahedron reuses vertex 0 as its apex
        faces.extend([[0, 4, 5], [0, 6, 4], [0, 5, 6], [4, 6, 5]]);

        let result = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::NonManifold { .. })));
    }
}
