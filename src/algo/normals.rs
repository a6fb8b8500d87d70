//! Per-vertex normals.
//!
//! A vertex normal is a weighted average of the unit normals of the incident
//! faces, renormalized to unit length.

use nalgebra::Vector3;
use rayon::prelude::*;

use crate::mesh::{HalfEdgeMesh, VertexId};

/// Weighting of incident face normals in [`per_vertex_normals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalWeighting {
    /// Every incident face counts the same.
    Uniform,
    /// Faces are weighted by their area.
    #[default]
    Area,
    /// Faces are weighted by the interior angle at the vertex.
    Angle,
}

/// Compute a unit normal for every vertex.
///
/// Vertices without incident faces, or whose weighted face normals cancel
/// out, get the zero vector.
///
/// # Example
///
/// ```no_run
/// use meshlens::algo::normals::{per_vertex_normals, NormalWeighting};
///
/// let mesh = meshlens::io::load("mesh.obj").unwrap();
/// let normals = per_vertex_normals(&mesh, NormalWeighting::Area);
/// assert_eq!(normals.len(), mesh.num_vertices());
/// ```
pub fn per_vertex_normals(mesh: &HalfEdgeMesh, weighting: NormalWeighting) -> Vec<Vector3<f64>> {
    (0..mesh.num_vertices())
        .into_par_iter()
        .map(|i| vertex_normal(mesh, VertexId::new(i), weighting))
        .collect()
}

fn vertex_normal(mesh: &HalfEdgeMesh, v: VertexId, weighting: NormalWeighting) -> Vector3<f64> {
    let mut sum = Vector3::zeros();

    for he in mesh.vertex_halfedges(v) {
        let f = mesh.face_of(he);
        if !f.is_valid() {
            continue;
        }
        let weight = match weighting {
            NormalWeighting::Uniform => 1.0,
            NormalWeighting::Area => mesh.face_area(f),
            NormalWeighting::Angle => {
                // Angle between the outgoing edge and the incoming one
                let p = mesh.position(v);
                let a = mesh.position(mesh.dest(he)) - p;
                let b = mesh.position(mesh.origin(mesh.prev(he))) - p;
                a.cross(&b).norm().atan2(a.dot(&b))
            }
        };
        sum += weight * mesh.face_normal(f);
    }

    sum.try_normalize(1e-300).unwrap_or_else(Vector3::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use crate::mesh::fixtures::{cube, grid, icosphere};
    use nalgebra::Point3;

    #[test]
    fn test_flat_grid_points_up() {
        let mesh = grid(3);
        for weighting in [NormalWeighting::Uniform, NormalWeighting::Area, NormalWeighting::Angle] {
            for n in per_vertex_normals(&mesh, weighting) {
                assert!((n - Vector3::z()).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_sphere_normals_are_radial() {
        let mesh = icosphere(2);
        let normals = per_vertex_normals(&mesh, NormalWeighting::default());
        for (p, n) in mesh.positions().zip(&normals) {
            assert!((n.norm() - 1.0).abs() < 1e-12);
            assert!(n.dot(&p.coords) > 0.99);
        }
    }

    #[test]
    fn test_cube_corner_weighting() {
        let mesh = cube();
        // Vertex 0 sits at the origin; the diagonal split makes the three
        // sides contribute unevenly under uniform weighting
        let uniform = per_vertex_normals(&mesh, NormalWeighting::Uniform)[0];
        let area = per_vertex_normals(&mesh, NormalWeighting::Area)[0];
        let angle = per_vertex_normals(&mesh, NormalWeighting::Angle)[0];

        let diagonal = -Vector3::new(1.0, 1.0, 1.0).normalize();
        assert!((angle - diagonal).norm() < 1e-12);
        assert!(area.dot(&diagonal) > 0.9);
        assert!(uniform.dot(&diagonal) > 0.9);
        assert!((uniform - diagonal).norm() > 1e-6);
    }

    #[test]
    fn test_isolated_vertex_gets_zero() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 2.0, 2.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let normals = per_vertex_normals(&mesh, NormalWeighting::Area);
        assert_eq!(normals[3], Vector3::zeros());
        assert!((normals[0] - Vector3::z()).norm() < 1e-12);
    }
}
