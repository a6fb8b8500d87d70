//! Viewer scene: named surface meshes with per-vertex quantities.
//!
//! The scene is independent of any windowing or GPU code. Actions register
//! quantities on a [`SurfaceMesh`]; a front end reads them back, turns them
//! into colors with [`colormap`] and draws them. User-facing warnings are
//! collected in the scene's message log.
//!
//! # Example
//!
//! ```
//! use meshlens::viz::{DataType, Scene};
//! use nalgebra::Point3;
//!
//! let mut scene = Scene::new();
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh = scene
//!     .register_surface_mesh("triangle", positions, vec![[0, 1, 2]])
//!     .unwrap();
//! mesh.add_vertex_scalar_quantity("height", vec![0.0, 1.0, 2.0], DataType::Standard)
//!     .unwrap();
//!
//! let enabled = mesh.enabled_color_quantity().unwrap();
//! assert_eq!(enabled.name(), "height");
//! ```

pub mod colormap;

use nalgebra::{Point3, Vector3};

use crate::algo::parameterize::UVMap;
use crate::error::{MeshError, Result};
use crate::mesh::{to_face_vertex, HalfEdgeMesh};

/// How a scalar quantity is mapped to colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    /// Values spread over their own range.
    #[default]
    Standard,
    /// Signed values centered on zero.
    Symmetric,
    /// Non-negative magnitudes starting at zero.
    Magnitude,
}

/// The values carried by a [`Quantity`].
#[derive(Debug, Clone)]
pub enum QuantityData {
    /// One scalar per vertex.
    Scalar {
        /// The values.
        values: Vec<f64>,
        /// Colormap selection.
        data_type: DataType,
    },
    /// One distance per vertex. Unreached vertices are infinite.
    Distance {
        /// The distances.
        values: Vec<f64>,
    },
    /// 2D coordinates per vertex.
    Parameterization {
        /// The coordinates.
        coords: UVMap,
    },
    /// One 3D vector per vertex.
    Vector {
        /// The vectors.
        vectors: Vec<Vector3<f64>>,
    },
}

impl QuantityData {
    fn len(&self) -> usize {
        match self {
            QuantityData::Scalar { values, .. } => values.len(),
            QuantityData::Distance { values } => values.len(),
            QuantityData::Parameterization { coords } => coords.len(),
            QuantityData::Vector { vectors } => vectors.len(),
        }
    }
}

/// A named per-vertex quantity on a surface mesh.
#[derive(Debug, Clone)]
pub struct Quantity {
    name: String,
    data: QuantityData,
    enabled: bool,
}

impl Quantity {
    /// The quantity's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The quantity's values.
    pub fn data(&self) -> &QuantityData {
        &self.data
    }

    /// Whether the quantity is currently displayed.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the quantity is drawn by coloring the surface.
    ///
    /// Everything except vector quantities is.
    pub fn is_color(&self) -> bool {
        !matches!(self.data, QuantityData::Vector { .. })
    }

    /// Per-vertex scalar values, for scalar and distance quantities.
    pub fn values(&self) -> Option<&[f64]> {
        match &self.data {
            QuantityData::Scalar { values, .. } | QuantityData::Distance { values } => {
                Some(values)
            }
            _ => None,
        }
    }

    /// UV coordinates, for parameterization quantities.
    pub fn uv_map(&self) -> Option<&UVMap> {
        match &self.data {
            QuantityData::Parameterization { coords } => Some(coords),
            _ => None,
        }
    }

    /// Vectors, for vector quantities.
    pub fn vectors(&self) -> Option<&[Vector3<f64>]> {
        match &self.data {
            QuantityData::Vector { vectors } => Some(vectors),
            _ => None,
        }
    }

    /// Per-vertex surface colors, `None` for vector quantities.
    ///
    /// Distance fields get ten stripes across their finite range.
    pub fn colors(&self) -> Option<Vec<[f32; 3]>> {
        match &self.data {
            QuantityData::Scalar { values, data_type } => {
                Some(colormap::scalar_colors(values, *data_type))
            }
            QuantityData::Distance { values } => {
                let max = values
                    .iter()
                    .copied()
                    .filter(|d| d.is_finite())
                    .fold(0.0f64, f64::max);
                Some(colormap::distance_colors(values, max / 10.0))
            }
            QuantityData::Parameterization { coords } => Some(colormap::uv_colors(coords)),
            QuantityData::Vector { .. } => None,
        }
    }
}

/// A triangle mesh registered in a [`Scene`].
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    name: String,
    positions: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
    quantities: Vec<Quantity>,
    revision: u64,
}

impl SurfaceMesh {
    /// The structure's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vertex positions.
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Triangles as vertex index triples.
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// All quantities in registration order.
    pub fn quantities(&self) -> &[Quantity] {
        &self.quantities
    }

    /// Look up a quantity by name.
    pub fn quantity(&self, name: &str) -> Option<&Quantity> {
        self.quantities.iter().find(|q| q.name == name)
    }

    /// Counter that changes whenever a quantity or its display state does.
    ///
    /// Front ends compare it to decide when to rebuild GPU buffers.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Register a scalar quantity.
    pub fn add_vertex_scalar_quantity(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
        data_type: DataType,
    ) -> Result<&Quantity> {
        self.add_quantity(name.into(), QuantityData::Scalar { values, data_type })
    }

    /// Register a distance quantity.
    pub fn add_vertex_distance_quantity(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<&Quantity> {
        self.add_quantity(name.into(), QuantityData::Distance { values })
    }

    /// Register a parameterization quantity.
    pub fn add_vertex_parameterization_quantity(
        &mut self,
        name: impl Into<String>,
        coords: UVMap,
    ) -> Result<&Quantity> {
        self.add_quantity(name.into(), QuantityData::Parameterization { coords })
    }

    /// Register a vector quantity.
    pub fn add_vertex_vector_quantity(
        &mut self,
        name: impl Into<String>,
        vectors: Vec<Vector3<f64>>,
    ) -> Result<&Quantity> {
        self.add_quantity(name.into(), QuantityData::Vector { vectors })
    }

    /// Insert or replace a quantity and enable it.
    ///
    /// Enabling a color quantity disables the previously enabled one.
    fn add_quantity(&mut self, name: String, data: QuantityData) -> Result<&Quantity> {
        if data.len() != self.num_vertices() {
            return Err(MeshError::QuantityLength {
                name,
                expected: self.num_vertices(),
                actual: data.len(),
            });
        }

        let quantity = Quantity {
            name,
            data,
            enabled: true,
        };
        if quantity.is_color() {
            for q in self.quantities.iter_mut().filter(|q| q.is_color()) {
                q.enabled = false;
            }
        }

        log::debug!("{}: registered quantity \"{}\"", self.name, quantity.name);
        self.revision += 1;

        let index = match self.quantities.iter().position(|q| q.name == quantity.name) {
            Some(i) => {
                self.quantities[i] = quantity;
                i
            }
            None => {
                self.quantities.push(quantity);
                self.quantities.len() - 1
            }
        };
        Ok(&self.quantities[index])
    }

    /// Remove a quantity. Returns whether it existed.
    pub fn remove_quantity(&mut self, name: &str) -> bool {
        let before = self.quantities.len();
        self.quantities.retain(|q| q.name != name);
        let removed = self.quantities.len() != before;
        if removed {
            self.revision += 1;
        }
        removed
    }

    /// The color quantity currently drawn on the surface, if any.
    pub fn enabled_color_quantity(&self) -> Option<&Quantity> {
        self.quantities.iter().find(|q| q.is_color() && q.enabled)
    }

    /// Vector quantities that are currently drawn.
    pub fn enabled_vector_quantities(&self) -> impl Iterator<Item = &Quantity> + '_ {
        self.quantities
            .iter()
            .filter(|q| !q.is_color() && q.enabled)
    }

    /// Move the enabled color quantity to the next one in registration order.
    ///
    /// After the last one the plain surface is shown. Returns the name of
    /// the newly enabled quantity.
    pub fn cycle_enabled_color_quantity(&mut self) -> Option<&str> {
        let colors: Vec<usize> = (0..self.quantities.len())
            .filter(|&i| self.quantities[i].is_color())
            .collect();
        if colors.is_empty() {
            return None;
        }

        let current = colors.iter().position(|&i| self.quantities[i].enabled);
        let next = match current {
            None => Some(colors[0]),
            Some(k) if k + 1 < colors.len() => Some(colors[k + 1]),
            Some(_) => None,
        };

        for &i in &colors {
            self.quantities[i].enabled = Some(i) == next;
        }
        self.revision += 1;
        next.map(|i| self.quantities[i].name.as_str())
    }

    /// Toggle all vector quantities together. Returns whether they are now shown.
    pub fn toggle_vector_quantities(&mut self) -> bool {
        let show = self.enabled_vector_quantities().next().is_none();
        let mut any = false;
        for q in self.quantities.iter_mut().filter(|q| !q.is_color()) {
            q.enabled = show;
            any = true;
        }
        self.revision += 1;
        show && any
    }
}

/// Registry of surface meshes plus a log of user-facing messages.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    structures: Vec<SurfaceMesh>,
    messages: Vec<String>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a surface mesh, replacing any structure with the same name.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidVertexIndex`] if a face refers past `positions`.
    pub fn register_surface_mesh(
        &mut self,
        name: impl Into<String>,
        positions: Vec<Point3<f64>>,
        faces: Vec<[usize; 3]>,
    ) -> Result<&mut SurfaceMesh> {
        for (face, tri) in faces.iter().enumerate() {
            if let Some(&vertex) = tri.iter().find(|&&v| v >= positions.len()) {
                return Err(MeshError::InvalidVertexIndex { face, vertex });
            }
        }
        Ok(self.insert(name.into(), positions, faces))
    }

    /// Register a half-edge mesh, keeping its vertex order.
    pub fn register_halfedge_mesh(
        &mut self,
        name: impl Into<String>,
        mesh: &HalfEdgeMesh,
    ) -> &mut SurfaceMesh {
        let (positions, faces) = to_face_vertex(mesh);
        self.insert(name.into(), positions, faces)
    }

    fn insert(
        &mut self,
        name: String,
        positions: Vec<Point3<f64>>,
        faces: Vec<[usize; 3]>,
    ) -> &mut SurfaceMesh {
        log::debug!(
            "registering surface mesh \"{}\" ({} vertices, {} faces)",
            name,
            positions.len(),
            faces.len()
        );
        let mesh = SurfaceMesh {
            name,
            positions,
            faces,
            quantities: Vec::new(),
            revision: 0,
        };

        let index = match self.structures.iter().position(|s| s.name == mesh.name) {
            Some(i) => {
                self.structures[i] = mesh;
                i
            }
            None => {
                self.structures.push(mesh);
                self.structures.len() - 1
            }
        };
        &mut self.structures[index]
    }

    /// Look up a surface mesh by name.
    pub fn get_surface_mesh(&self, name: &str) -> Option<&SurfaceMesh> {
        self.structures.iter().find(|s| s.name == name)
    }

    /// Look up a surface mesh by name, mutably.
    pub fn get_surface_mesh_mut(&mut self, name: &str) -> Option<&mut SurfaceMesh> {
        self.structures.iter_mut().find(|s| s.name == name)
    }

    /// Remove a structure. Returns whether it existed.
    pub fn remove_structure(&mut self, name: &str) -> bool {
        let before = self.structures.len();
        self.structures.retain(|s| s.name != name);
        self.structures.len() != before
    }

    /// All registered surface meshes.
    pub fn structures(&self) -> &[SurfaceMesh] {
        &self.structures
    }

    /// Show a warning to the user.
    pub fn warning(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::warn!("{}", text);
        self.messages.push(text);
    }

    /// Messages shown so far, oldest first.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// The most recent message.
    pub fn last_message(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }

    /// Drain the message log.
    pub fn take_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}
