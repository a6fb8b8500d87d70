//! # meshlens
//!
//! Load a triangle mesh and look at it through four lenses: Gaussian
//! curvature, vertex normals, an LSCM parameterization and exact geodesic
//! distance from a chosen vertex.
//!
//! The crate is split into a small geometry kernel and a demo layer:
//!
//! - [`mesh`]: half-edge triangle mesh with typed indices and boundary loops
//! - [`algo`]: curvature, normals, exact geodesics, LSCM
//! - [`io`]: OBJ, STL and PLY loading, PLY export of per-vertex quantities
//! - [`viz`]: a GUI-agnostic scene of named meshes and vertex quantities
//! - [`demo`]: the four user actions wired to a scene
//!
//! ## Quick Start
//!
//! ```no_run
//! use meshlens::demo::Demo;
//!
//! let mut demo = Demo::load("bunny.obj").unwrap();
//! demo.add_curvature_scalar().unwrap();
//! demo.compute_distance_from().unwrap();
//!
//! let mesh = demo.scene().get_surface_mesh("input mesh").unwrap();
//! for q in mesh.quantities() {
//!     println!("{}", q.name());
//! }
//! ```
//!
//! ## Using the Kernel Directly
//!
//! ```
//! use meshlens::prelude::*;
//! use meshlens::algo::curvature::angle_defect;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//!
//! let mesh = build_from_triangles(&vertices, &faces).unwrap();
//! let total: f64 = angle_defect(&mesh).iter().sum();
//! // Gauss-Bonnet for a sphere-like surface
//! assert!((total - 4.0 * std::f64::consts::PI).abs() < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod demo;
pub mod error;
pub mod io;
pub mod mesh;
pub mod viz;

/// Prelude module for convenient imports.
///
/// ```
/// use meshlens::prelude::*;
/// ```
pub mod prelude {
    pub use crate::demo::{Action, Demo};
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        boundary_loop, build_from_triangles, to_face_vertex, FaceId, HalfEdgeId, HalfEdgeMesh,
        VertexId,
    };
    pub use crate::viz::{DataType, Scene, SurfaceMesh};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_tetrahedron() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];

        let mesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_halfedges(), 12);
        assert!(mesh.is_valid());
        assert!(boundary_loop(&mesh).is_empty());
    }
}
