//! Discrete Gaussian curvature and lumped mass matrices.
//!
//! The pointwise Gaussian curvature of a triangle mesh is concentrated at the
//! vertices as the angle defect `2π - Σθ`. Dividing by a per-vertex area
//! (the diagonal of a lumped mass matrix) turns this integrated quantity into
//! a curvature density that can be compared across vertices.
//!
//! # Example
//!
//! ```no_run
//! use meshlens::algo::curvature::{angle_defect, invert_diag, mass_matrix, MassMatrixType};
//!
//! let mesh = meshlens::io::load("mesh.obj").unwrap();
//! let k = angle_defect(&mesh);
//! let minv = invert_diag(&mass_matrix(&mesh, MassMatrixType::Voronoi));
//! let density: Vec<f64> = k.iter().zip(&minv).map(|(k, m)| k * m).collect();
//! ```
//!
//! # References
//!
//! - Meyer, M., et al. (2003). "Discrete Differential-Geometry Operators for
//!   Triangulated 2-Manifolds." Visualization and Mathematics III.

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::Point3;
use rayon::prelude::*;

use crate::mesh::{FaceId, HalfEdgeMesh, VertexId};

/// How per-vertex areas are assigned by [`mass_matrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MassMatrixType {
    /// One third of each incident triangle.
    Barycentric,
    /// Mixed Voronoi area: true Voronoi cells for non-obtuse triangles,
    /// a fixed split for obtuse ones.
    #[default]
    Voronoi,
}

/// Compute the angle at vertex `a` in triangle (a, b, c).
fn triangle_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    // atan2 stays accurate for angles near 0 and π
    ab.cross(&ac).norm().atan2(ab.dot(&ac))
}

/// Compute the cotangent of the angle at vertex `a` in triangle (a, b, c).
fn cotangent_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let cross_norm = ab.cross(&ac).norm();
    if cross_norm < 1e-12 {
        0.0
    } else {
        ab.dot(&ac) / cross_norm
    }
}

/// Corner positions of `f` rotated so that `v` comes first.
fn corners_from(mesh: &HalfEdgeMesh, f: FaceId, v: VertexId) -> (usize, [Point3<f64>; 3]) {
    let verts = mesh.face_triangle(f);
    let [p0, p1, p2] = mesh.face_positions(f);
    if verts[0] == v {
        (0, [p0, p1, p2])
    } else if verts[1] == v {
        (1, [p1, p2, p0])
    } else {
        (2, [p2, p0, p1])
    }
}

/// Mixed Voronoi area of the corner of `f` at `v`.
fn voronoi_corner_area(mesh: &HalfEdgeMesh, f: FaceId, v: VertexId) -> f64 {
    let (local, [p, q, r]) = corners_from(mesh, f, v);
    let [p0, p1, p2] = mesh.face_positions(f);
    let angles = [
        triangle_angle(&p0, &p1, &p2),
        triangle_angle(&p1, &p2, &p0),
        triangle_angle(&p2, &p0, &p1),
    ];

    match angles.iter().position(|&a| a > FRAC_PI_2) {
        None => {
            // (1/8) (|pr|² cot(q) + |pq|² cot(r))
            let cot_q = cotangent_angle(&q, &r, &p);
            let cot_r = cotangent_angle(&r, &p, &q);
            0.125 * ((r - p).norm_squared() * cot_q + (q - p).norm_squared() * cot_r)
        }
        Some(obtuse) if obtuse == local => mesh.face_area(f) / 2.0,
        Some(_) => mesh.face_area(f) / 4.0,
    }
}

fn angle_sum(mesh: &HalfEdgeMesh, v: VertexId) -> f64 {
    mesh.vertex_faces(v)
        .map(|f| {
            let (_, [p, q, r]) = corners_from(mesh, f, v);
            triangle_angle(&p, &q, &r)
        })
        .sum()
}

/// Angle defect `2π - Σθ` at every vertex.
///
/// Boundary vertices are treated like interior ones. A vertex without
/// incident faces has defect `2π`.
pub fn angle_defect(mesh: &HalfEdgeMesh) -> Vec<f64> {
    (0..mesh.num_vertices())
        .into_par_iter()
        .map(|i| 2.0 * PI - angle_sum(mesh, VertexId::new(i)))
        .collect()
}

/// Diagonal of the lumped mass matrix.
pub fn mass_matrix(mesh: &HalfEdgeMesh, kind: MassMatrixType) -> Vec<f64> {
    mass_matrix_impl(mesh, kind, true)
}

fn mass_matrix_impl(mesh: &HalfEdgeMesh, kind: MassMatrixType, parallel: bool) -> Vec<f64> {
    let vertex_mass = |i: usize| -> f64 {
        let v = VertexId::new(i);
        match kind {
            MassMatrixType::Barycentric => {
                mesh.vertex_faces(v).map(|f| mesh.face_area(f) / 3.0).sum()
            }
            MassMatrixType::Voronoi => mesh
                .vertex_faces(v)
                .map(|f| voronoi_corner_area(mesh, f, v))
                .sum(),
        }
    };

    if parallel {
        (0..mesh.num_vertices()).into_par_iter().map(vertex_mass).collect()
    } else {
        (0..mesh.num_vertices()).map(vertex_mass).collect()
    }
}

/// Invert a diagonal matrix entry by entry. Zero entries stay zero.
pub fn invert_diag(diag: &[f64]) -> Vec<f64> {
    diag.iter()
        .map(|&d| if d == 0.0 { 0.0 } else { 1.0 / d })
        .collect()
}

/// Gaussian curvature density `M⁻¹ (2π - Σθ)` with the Voronoi mass matrix.
///
/// Vertices with zero area get zero. Runs in parallel; see
/// [`gaussian_curvature_sequential`] for the single-threaded variant.
pub fn gaussian_curvature(mesh: &HalfEdgeMesh) -> Vec<f64> {
    gaussian_curvature_impl(mesh, true)
}

/// Compute Gaussian curvature density (sequential version).
///
/// Useful for benchmarking.
pub fn gaussian_curvature_sequential(mesh: &HalfEdgeMesh) -> Vec<f64> {
    gaussian_curvature_impl(mesh, false)
}

fn gaussian_curvature_impl(mesh: &HalfEdgeMesh, parallel: bool) -> Vec<f64> {
    let minv = invert_diag(&mass_matrix_impl(mesh, MassMatrixType::Voronoi, parallel));
    let density = |i: usize| (2.0 * PI - angle_sum(mesh, VertexId::new(i))) * minv[i];

    if parallel {
        (0..mesh.num_vertices()).into_par_iter().map(density).collect()
    } else {
        (0..mesh.num_vertices()).map(density).collect()
    }
}
