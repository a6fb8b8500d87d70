//! Core mesh data structures.
//!
//! The primary type is [`HalfEdgeMesh`], a triangle mesh stored as a
//! half-edge (doubly-connected edge list) structure with O(1) adjacency
//! queries. Elements are addressed by [`VertexId`], [`HalfEdgeId`] and
//! [`FaceId`].
//!
//! ```
//! use meshlens::mesh::{boundary_loop, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//! assert_eq!(boundary_loop(&mesh).len(), 3);
//! ```

mod boundary;
mod builder;
mod halfedge;
mod index;

#[cfg(test)]
pub(crate) mod fixtures;

pub use boundary::{boundary_loop, boundary_loops};
pub use builder::{build_from_triangles, to_face_vertex};
pub use halfedge::{Face, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{FaceId, HalfEdgeId, VertexId};
