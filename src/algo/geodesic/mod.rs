//! Geodesic distance computation on meshes.
//!
//! [`exact_geodesic`] computes the length of the shortest path over the
//! surface from a source vertex to every vertex. Paths may cross faces
//! anywhere, so the result is exact for the polyhedron rather than an
//! edge-graph approximation.
//!
//! # Example
//!
//! ```no_run
//! use meshlens::prelude::*;
//! use meshlens::algo::geodesic::{exact_geodesic, ExactGeodesicOptions};
//!
//! let mesh = meshlens::io::load("mesh.obj").unwrap();
//! let result = exact_geodesic(&mesh, VertexId::new(0), &ExactGeodesicOptions::default()).unwrap();
//! println!("distance to v10: {}", result.distance(VertexId::new(10)));
//! ```

mod exact;

pub use exact::{exact_geodesic, exact_geodesic_multiple, ExactGeodesicOptions};

use crate::mesh::VertexId;

/// Distances from the source vertex/vertices to all vertices.
#[derive(Debug, Clone)]
pub struct GeodesicResult {
    /// `f64::INFINITY` for unreachable vertices.
    distances: Vec<f64>,
}

impl GeodesicResult {
    pub(crate) fn new(distances: Vec<f64>) -> Self {
        Self { distances }
    }

    /// Get the distance to a vertex.
    ///
    /// Returns `f64::INFINITY` if the vertex is unreachable from the source(s).
    #[inline]
    pub fn distance(&self, v: VertexId) -> f64 {
        self.distances[v.index()]
    }

    /// Get all distances as a slice.
    #[inline]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Take ownership of the distances.
    pub fn into_distances(self) -> Vec<f64> {
        self.distances
    }

    /// Get the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Find the vertex with the maximum finite distance from the source(s).
    pub fn farthest_vertex(&self) -> Option<(VertexId, f64)> {
        self.distances
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_finite())
            .fold(None, |best: Option<(usize, f64)>, (i, &d)| match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((i, d)),
            })
            .map(|(i, d)| (VertexId::new(i), d))
    }

    /// Check if a vertex is reachable from the source(s).
    #[inline]
    pub fn is_reachable(&self, v: VertexId) -> bool {
        self.distances[v.index()].is_finite()
    }

    /// Count the number of reachable vertices.
    pub fn reachable_count(&self) -> usize {
        self.distances.iter().filter(|d| d.is_finite()).count()
    }
}
