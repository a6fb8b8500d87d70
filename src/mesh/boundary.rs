//! Boundary loop extraction.

use super::halfedge::HalfEdgeMesh;
use super::index::{HalfEdgeId, VertexId};

/// Find all boundary loops of a mesh.
///
/// Each loop starts at its smallest vertex index and lists the vertices in
/// the order the adjacent faces traverse them, so the surface lies to the
/// left. Loops are sorted by their first vertex. A closed mesh has none.
pub fn boundary_loops(mesh: &HalfEdgeMesh) -> Vec<Vec<VertexId>> {
    let mut visited = vec![false; mesh.num_halfedges()];
    let mut loops = Vec::new();

    for start in mesh.halfedge_ids() {
        if visited[start.index()] || !mesh.is_boundary_halfedge(start) {
            continue;
        }

        // Boundary half-edges run against the faces, so walking `prev`
        // yields the face orientation.
        let mut halfedges: Vec<HalfEdgeId> = Vec::new();
        let mut he = start;
        loop {
            visited[he.index()] = true;
            halfedges.push(he);
            he = mesh.prev(he);
            if he == start || !he.is_valid() || visited[he.index()] {
                break;
            }
        }

        let mut vertices: Vec<VertexId> = halfedges.iter().map(|&he| mesh.origin(he)).collect();
        if let Some(min_pos) = vertices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| **v)
            .map(|(i, _)| i)
        {
            vertices.rotate_left(min_pos);
        }
        loops.push(vertices);
    }

    loops.sort_by_key(|l| l[0]);
    loops
}

/// The longest boundary loop (the first one on ties), empty for closed meshes.
pub fn boundary_loop(mesh: &HalfEdgeMesh) -> Vec<VertexId> {
    let mut best: Vec<VertexId> = Vec::new();
    for l in boundary_loops(mesh) {
        if l.len() > best.len() {
            best = l;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use nalgebra::Point3;

    /// A 3x3 vertex grid in the xy-plane, counter-clockwise triangles.
    fn grid() -> crate::mesh::HalfEdgeMesh {
        let mut vertices = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let mut faces = Vec::new();
        for j in 0..2 {
            for i in 0..2 {
                let v = j * 3 + i;
                faces.push([v, v + 1, v + 4]);
                faces.push([v, v + 4, v + 3]);
            }
        }
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn ids(loop_: &[VertexId]) -> Vec<usize> {
        loop_.iter().map(|v| v.index()).collect()
    }

    #[test]
    fn test_grid_boundary_order() {
        let mesh = grid();
        let loops = boundary_loops(&mesh);
        assert_eq!(loops.len(), 1);
        // Counter-clockwise around the square, starting at vertex 0
        assert_eq!(ids(&loops[0]), vec![0, 1, 2, 5, 8, 7, 6, 3]);
        assert_eq!(boundary_loop(&mesh), loops[0]);
    }

    #[test]
    fn test_closed_mesh_has_no_loop() {
        let vertices = vec![
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(-1.0, -1.0, 1.0),
        ];
        let faces = [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        assert!(boundary_loops(&mesh).is_empty());
        assert!(boundary_loop(&mesh).is_empty());
    }

    #[test]
    fn test_longest_loop_wins() {
        // A lone triangle next to a quad strip, two separate components
        let vertices = vec![
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(11.0, 0.0, 0.0),
            Point3::new(10.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = [[0, 1, 2], [3, 4, 5], [3, 5, 6]];
        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        let loops = boundary_loops(&mesh);
        assert_eq!(loops.len(), 2);
        assert_eq!(ids(&loops[0]), vec![0, 1, 2]);
        assert_eq!(ids(&boundary_loop(&mesh)), vec![3, 4, 5, 6]);
    }
}
