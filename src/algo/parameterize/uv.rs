//! UV coordinate storage.

use nalgebra::Point2;

use crate::mesh::{HalfEdgeMesh, VertexId};

/// UV coordinates for mesh vertices, indexed like the vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct UVMap {
    coords: Vec<Point2<f64>>,
}

impl UVMap {
    /// Create a new UV map with the given coordinates.
    pub fn new(coords: Vec<Point2<f64>>) -> Self {
        Self { coords }
    }

    /// Get the UV coordinates for a vertex.
    #[inline]
    pub fn get(&self, v: VertexId) -> Point2<f64> {
        self.coords[v.index()]
    }

    /// Set the UV coordinates for a vertex.
    #[inline]
    pub fn set(&mut self, v: VertexId, uv: Point2<f64>) {
        self.coords[v.index()] = uv;
    }

    /// Get the number of UV coordinates.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Iterate over all UV coordinates with their vertex IDs.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, Point2<f64>)> + '_ {
        self.coords
            .iter()
            .enumerate()
            .map(|(i, &uv)| (VertexId::new(i), uv))
    }

    /// Get the raw coordinates slice.
    pub fn as_slice(&self) -> &[Point2<f64>] {
        &self.coords
    }

    /// Compute the bounding box of the UV coordinates.
    ///
    /// Returns `None` if the UV map is empty.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let first = *self.coords.first()?;
        Some(self.coords.iter().fold((first, first), |(min, max), uv| {
            (
                Point2::new(min.x.min(uv.x), min.y.min(uv.y)),
                Point2::new(max.x.max(uv.x), max.y.max(uv.y)),
            )
        }))
    }

    /// Move the map into `[0, 1]²` with its larger side spanning the unit interval.
    ///
    /// Scales uniformly, so angles are kept.
    pub fn normalize(&mut self) {
        if let Some((min, max)) = self.bounding_box() {
            let scale = (max.x - min.x).max(max.y - min.y);
            if scale > 1e-12 {
                for uv in &mut self.coords {
                    *uv = Point2::from((*uv - min) / scale);
                }
            }
        }
    }

    /// Total unsigned area of the mesh faces in UV space.
    pub fn total_area(&self, mesh: &HalfEdgeMesh) -> f64 {
        mesh.face_ids()
            .map(|f| {
                let [a, b, c] = mesh.face_triangle(f).map(|v| self.get(v));
                let (e1, e2) = (b - a, c - a);
                0.5 * (e1.x * e2.y - e1.y * e2.x).abs()
            })
            .sum()
    }
}
