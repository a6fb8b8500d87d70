//! Least Squares Conformal Maps (LSCM) parameterization.
//!
//! LSCM finds the piecewise-linear map to the plane that is as close to
//! conformal as possible. For each triangle the map is conformal exactly when
//! the gradient of `v` is the gradient of `u` rotated by 90 degrees; the
//! squared violation, weighted by area, is a quadratic energy in the unknown
//! coordinates. Two pinned vertices remove the similarity ambiguity.
//!
//! # References
//!
//! - Lévy, B., Petitjean, S., Ray, N., & Maillot, J. (2002). "Least squares
//!   conformal maps for automatic texture atlas generation." ACM SIGGRAPH.

use nalgebra::{DVector, Point2};

use crate::error::{MeshError, Result};
use crate::mesh::{boundary_loop, HalfEdgeMesh, VertexId};

use super::sparse::{conjugate_gradient, CsrMatrix};
use super::uv::UVMap;

/// Options for LSCM parameterization.
#[derive(Debug, Clone)]
pub struct LSCMOptions {
    /// Strategy for selecting pinned (fixed) vertices.
    pub pin_strategy: PinStrategy,

    /// Maximum iterations for the conjugate gradient solver.
    pub max_iterations: usize,

    /// Relative residual at which the solver stops.
    pub tolerance: f64,

    /// Rescale the result into the unit square.
    pub normalize: bool,
}

impl Default for LSCMOptions {
    fn default() -> Self {
        Self {
            pin_strategy: PinStrategy::Automatic,
            max_iterations: 20_000,
            tolerance: 1e-10,
            normalize: true,
        }
    }
}

impl LSCMOptions {
    /// Create options with automatic pin selection (farthest boundary vertices).
    pub fn automatic() -> Self {
        Self::default()
    }

    /// Create options with manually specified pinned vertices.
    pub fn with_pins(pin0: PinnedVertex, pin1: PinnedVertex) -> Self {
        Self {
            pin_strategy: PinStrategy::Manual(pin0, pin1),
            ..Default::default()
        }
    }

    /// Set the maximum CG iterations.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Enable or disable rescaling into the unit square.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

/// Strategy for selecting which vertices to pin during parameterization.
#[derive(Debug, Clone)]
pub enum PinStrategy {
    /// Pin the two boundary vertices farthest apart to `(0, 0)` and `(1, 0)`.
    Automatic,

    /// Use the given vertices and UV coordinates.
    Manual(PinnedVertex, PinnedVertex),
}

/// A vertex pinned to a specific UV coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinnedVertex {
    /// The vertex index to pin.
    pub vertex: usize,
    /// The fixed U coordinate.
    pub u: f64,
    /// The fixed V coordinate.
    pub v: f64,
}

impl PinnedVertex {
    /// Create a new pinned vertex.
    pub fn new(vertex: usize, u: f64, v: f64) -> Self {
        Self { vertex, u, v }
    }
}

/// Compute a least squares conformal map.
///
/// Pinned vertices keep their UV coordinates exactly. Vertices that no face
/// uses are placed at the origin. With `normalize` enabled the result is
/// scaled uniformly into `[0, 1]²` afterwards.
///
/// # Errors
///
/// * [`MeshError::EmptyMesh`] for a mesh without faces
/// * [`MeshError::NoBoundary`] for a closed mesh
/// * [`MeshError::InvalidParameter`] for pins that are out of range or coincide
/// * [`MeshError::ConvergenceFailed`] if the solver runs out of iterations
///
/// # Example
///
/// ```no_run
/// use meshlens::algo::parameterize::{lscm, LSCMOptions, PinnedVertex};
///
/// let mesh = meshlens::io::load("disk.obj").unwrap();
/// let options = LSCMOptions::with_pins(
///     PinnedVertex::new(0, 0.0, 0.0),
///     PinnedVertex::new(10, 1.0, 0.0),
/// )
/// .with_normalize(false);
/// let uv_map = lscm(&mesh, &options).unwrap();
/// ```
pub fn lscm(mesh: &HalfEdgeMesh, options: &LSCMOptions) -> Result<UVMap> {
    if mesh.num_faces() == 0 {
        return Err(MeshError::EmptyMesh);
    }
    if !mesh.has_boundary() {
        return Err(MeshError::NoBoundary);
    }

    let n = mesh.num_vertices();
    let (pin0, pin1) = match &options.pin_strategy {
        PinStrategy::Automatic => farthest_boundary_pair(mesh),
        PinStrategy::Manual(p0, p1) => (*p0, *p1),
    };
    for pin in [&pin0, &pin1] {
        if pin.vertex >= n {
            return Err(MeshError::invalid_param(
                "pin",
                pin.vertex,
                "vertex index out of range",
            ));
        }
    }
    if pin0.vertex == pin1.vertex {
        return Err(MeshError::invalid_param(
            "pin",
            pin1.vertex,
            "the two pinned vertices must differ",
        ));
    }

    // Known values for pinned and unreferenced vertices, unknown index for the rest
    let mut fixed: Vec<Option<Point2<f64>>> = mesh
        .vertex_ids()
        .map(|v| mesh.is_isolated(v).then(Point2::origin))
        .collect();
    fixed[pin0.vertex] = Some(Point2::new(pin0.u, pin0.v));
    fixed[pin1.vertex] = Some(Point2::new(pin1.u, pin1.v));

    let mut free_index = vec![usize::MAX; n];
    let mut num_free = 0;
    for (i, f) in fixed.iter().enumerate() {
        if f.is_none() {
            free_index[i] = num_free;
            num_free += 1;
        }
    }

    let (matrix, rhs) = build_reduced_system(mesh, &fixed, &free_index, num_free);
    let (solution, iterations) =
        conjugate_gradient(&matrix, &rhs, options.max_iterations, options.tolerance)?;
    log::debug!(
        "lscm: {} unknowns, {} nonzeros, converged after {} iterations",
        2 * num_free,
        matrix.nnz(),
        iterations
    );

    let coords: Vec<Point2<f64>> = (0..n)
        .map(|i| match fixed[i] {
            Some(p) => p,
            None => {
                let k = free_index[i];
                Point2::new(solution[k], solution[num_free + k])
            }
        })
        .collect();

    let mut uv_map = UVMap::new(coords);
    if options.normalize {
        uv_map.normalize();
    }
    Ok(uv_map)
}

/// Pins for [`PinStrategy::Automatic`]: the farthest pair on the longest boundary loop.
fn farthest_boundary_pair(mesh: &HalfEdgeMesh) -> (PinnedVertex, PinnedVertex) {
    let boundary: Vec<VertexId> = boundary_loop(mesh);

    let mut best = (0, 0);
    let mut max_dist = -1.0;
    for (i, &a) in boundary.iter().enumerate() {
        for &b in &boundary[i + 1..] {
            let d = (mesh.position(b) - mesh.position(a)).norm_squared();
            if d > max_dist {
                max_dist = d;
                best = (a.index(), b.index());
            }
        }
    }

    (
        PinnedVertex::new(best.0, 0.0, 0.0),
        PinnedVertex::new(best.1, 1.0, 0.0),
    )
}

/// Per-corner gradient coefficients of a triangle's linear interpolant.
///
/// The triangle is laid out in its own plane with the first corner at the
/// origin and the second on the positive x-axis. Returns `None` for
/// degenerate triangles, otherwise the coefficients and the area.
fn gradient_coefficients(mesh: &HalfEdgeMesh, corners: [VertexId; 3]) -> Option<([[f64; 2]; 3], f64)> {
    let [pi, pj, pk] = corners.map(|v| *mesh.position(v));
    let e1 = pj - pi;
    let e2 = pk - pi;

    let normal = e1.cross(&e2);
    let area = 0.5 * normal.norm();
    let e1_len = e1.norm();
    if area < 1e-14 || e1_len < 1e-14 {
        return None;
    }

    let x_axis = e1 / e1_len;
    let y_axis = normal.cross(&e1).normalize();
    let q = [
        [0.0, 0.0],
        [e1_len, 0.0],
        [e2.dot(&x_axis), e2.dot(&y_axis)],
    ];

    // ∇φ_a = (y_b - y_c, x_c - x_b) / 2A for corners (a, b, c) in order
    let inv_2a = 1.0 / (2.0 * area);
    let mut grads = [[0.0; 2]; 3];
    for a in 0..3 {
        let b = (a + 1) % 3;
        let c = (a + 2) % 3;
        grads[a] = [(q[b][1] - q[c][1]) * inv_2a, (q[c][0] - q[b][0]) * inv_2a];
    }
    Some((grads, area))
}

/// Assemble the conformal energy restricted to the free unknowns.
///
/// Unknowns are ordered `[u_free; v_free]`. Terms that couple a free unknown
/// to a fixed one move to the right-hand side.
fn build_reduced_system(
    mesh: &HalfEdgeMesh,
    fixed: &[Option<Point2<f64>>],
    free_index: &[usize],
    num_free: usize,
) -> (CsrMatrix, DVector<f64>) {
    let m = num_free;
    let mut triplets: Vec<(usize, usize, f64)> = Vec::with_capacity(mesh.num_faces() * 36);
    let mut rhs = DVector::zeros(2 * m);

    for f in mesh.face_ids() {
        let corners = mesh.face_triangle(f);
        let Some((grads, area)) = gradient_coefficients(mesh, corners) else {
            continue;
        };

        for a in 0..3 {
            let row = corners[a].index();
            if fixed[row].is_some() {
                continue;
            }
            let ri = free_index[row];

            for b in 0..3 {
                let [gx_a, gy_a] = grads[a];
                let [gx_b, gy_b] = grads[b];
                // u-u and v-v blocks share the same weight, the mixed block is antisymmetric
                let same = (gx_a * gx_b + gy_a * gy_b) * area;
                let mixed = (gy_a * gx_b - gx_a * gy_b) * area;

                let col = corners[b].index();
                match fixed[col] {
                    None => {
                        let ci = free_index[col];
                        triplets.push((ri, ci, same));
                        triplets.push((m + ri, m + ci, same));
                        triplets.push((ri, m + ci, mixed));
                        triplets.push((m + ri, ci, -mixed));
                    }
                    Some(p) => {
                        rhs[ri] -= same * p.x + mixed * p.y;
                        rhs[m + ri] -= -mixed * p.x + same * p.y;
                    }
                }
            }
        }
    }

    (CsrMatrix::from_triplets(2 * m, 2 * m, &triplets), rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use crate::mesh::fixtures::{disk, grid, tetrahedron};
    use nalgebra::Point3;

    /// Fit `uv ≈ s R p + t` and return the largest residual.
    fn similarity_residual(mesh: &HalfEdgeMesh, uv: &UVMap, a: usize, b: usize) -> f64 {
        let pa = mesh.position(VertexId::new(a)).xy();
        let pb = mesh.position(VertexId::new(b)).xy();
        let ua = uv.get(VertexId::new(a));
        let ub = uv.get(VertexId::new(b));

        // Complex ratio (ub - ua) / (pb - pa)
        let (dx, dy) = (pb.x - pa.x, pb.y - pa.y);
        let (ex, ey) = (ub.x - ua.x, ub.y - ua.y);
        let den = dx * dx + dy * dy;
        let (sr, si) = ((ex * dx + ey * dy) / den, (ey * dx - ex * dy) / den);

        mesh.vertex_ids()
            .map(|v| {
                let p = mesh.position(v).xy() - pa;
                let expected = Point2::new(ua.x + sr * p.x - si * p.y, ua.y + si * p.x + sr * p.y);
                (uv.get(v) - expected).norm()
            })
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_planar_grid_is_similarity() {
        let mesh = grid(4);
        let options = LSCMOptions::with_pins(
            PinnedVertex::new(0, 0.0, 0.0),
            PinnedVertex::new(4, 1.0, 0.0),
        )
        .with_normalize(false);
        let uv = lscm(&mesh, &options).unwrap();

        assert!(similarity_residual(&mesh, &uv, 0, 4) < 1e-6);
        // Vertex (2, 3) maps to (0.5, 0.75)
        let p = uv.get(VertexId::new(3 * 5 + 2));
        assert!((p - Point2::new(0.5, 0.75)).norm() < 1e-6);
    }

    #[test]
    fn test_pins_are_exact() {
        let mesh = disk(3, 12);
        let options = LSCMOptions::with_pins(
            PinnedVertex::new(25, 0.0, 0.0),
            PinnedVertex::new(31, 1.0, 0.0),
        )
        .with_normalize(false);
        let uv = lscm(&mesh, &options).unwrap();

        assert_eq!(uv.get(VertexId::new(25)), Point2::new(0.0, 0.0));
        assert_eq!(uv.get(VertexId::new(31)), Point2::new(1.0, 0.0));
        assert!(similarity_residual(&mesh, &uv, 25, 31) < 1e-6);
    }

    #[test]
    fn test_curved_patch_keeps_orientation() {
        // Half of a bumpy disk: lift the flat disk onto a paraboloid
        let flat = disk(4, 16);
        let (vertices, faces) = crate::mesh::to_face_vertex(&flat);
        let lifted: Vec<Point3<f64>> = vertices
            .iter()
            .map(|p| Point3::new(p.x, p.y, 0.5 * (p.x * p.x + p.y * p.y)))
            .collect();
        let mesh = build_from_triangles(&lifted, &faces).unwrap();

        let uv = lscm(&mesh, &LSCMOptions::default()).unwrap();
        let (min, max) = uv.bounding_box().unwrap();
        assert!(min.x > -1e-9 && min.y > -1e-9);
        assert!(max.x < 1.0 + 1e-9 && max.y < 1.0 + 1e-9);

        // No face flips
        for f in mesh.face_ids() {
            let [a, b, c] = mesh.face_triangle(f).map(|v| uv.get(v));
            let signed = (b - a).perp(&(c - a));
            assert!(signed > 0.0, "face {:?} flipped", f);
        }
    }

    #[test]
    fn test_automatic_pins() {
        let mesh = grid(3);
        let (p0, p1) = farthest_boundary_pair(&mesh);
        // Opposite corners of the square
        let mut pair = [p0.vertex, p1.vertex];
        pair.sort_unstable();
        assert!(pair == [0, 15] || pair == [3, 12]);

        let uv = lscm(&mesh, &LSCMOptions::default()).unwrap();
        assert_eq!(uv.len(), 16);
    }

    #[test]
    fn test_isolated_vertex_at_origin() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(9.0, 9.0, 9.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 3], [0, 3, 2]]).unwrap();
        let options = LSCMOptions::with_pins(
            PinnedVertex::new(0, 0.0, 0.0),
            PinnedVertex::new(1, 1.0, 0.0),
        )
        .with_normalize(false);
        let uv = lscm(&mesh, &options).unwrap();

        assert_eq!(uv.get(VertexId::new(4)), Point2::origin());
        assert!((uv.get(VertexId::new(3)) - Point2::new(1.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_closed_mesh_fails() {
        let result = lscm(&tetrahedron(), &LSCMOptions::default());
        assert!(matches!(result, Err(MeshError::NoBoundary)));
    }

    #[test]
    fn test_bad_pins() {
        let mesh = grid(2);
        let same = LSCMOptions::with_pins(PinnedVertex::new(1, 0.0, 0.0), PinnedVertex::new(1, 1.0, 0.0));
        assert!(matches!(lscm(&mesh, &same), Err(MeshError::InvalidParameter { .. })));

        let out = LSCMOptions::with_pins(PinnedVertex::new(0, 0.0, 0.0), PinnedVertex::new(99, 1.0, 0.0));
        assert!(matches!(lscm(&mesh, &out), Err(MeshError::InvalidParameter { .. })));
    }

    #[test]
    fn test_solver_limits() {
        let mesh = disk(3, 12);

        let starved = LSCMOptions::automatic()
            .with_max_iterations(1)
            .with_tolerance(1e-14);
        assert!(matches!(
            lscm(&mesh, &starved),
            Err(MeshError::ConvergenceFailed { iterations: 1 })
        ));

        let loose = LSCMOptions::automatic()
            .with_max_iterations(5_000)
            .with_tolerance(1e-6);
        assert!(matches!(loose.pin_strategy, PinStrategy::Automatic));
        let uv = lscm(&mesh, &loose).unwrap();
        assert_eq!(uv.len(), mesh.num_vertices());
    }
}
