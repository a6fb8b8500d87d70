//! Application state behind the viewer and the batch runner.
//!
//! A [`Demo`] owns the loaded mesh, the scene it is registered in and the
//! source vertex for geodesic distances. Each action computes one field and
//! registers it on the `"input mesh"` structure.

use std::path::Path;

use crate::algo::curvature::gaussian_curvature;
use crate::algo::geodesic::{exact_geodesic, ExactGeodesicOptions};
use crate::algo::normals::{per_vertex_normals, NormalWeighting};
use crate::algo::parameterize::{lscm, LSCMOptions, PinnedVertex};
use crate::error::{MeshError, Result};
use crate::io;
use crate::mesh::{boundary_loop, HalfEdgeMesh, VertexId};
use crate::viz::{DataType, Scene, SurfaceMesh};

/// Name of the structure the loaded mesh is registered under.
pub const MESH_NAME: &str = "input mesh";

/// Source vertex used until the user picks another one.
pub const DEFAULT_SOURCE_VERTEX: i64 = 7;

/// Name of the curvature quantity.
pub const CURVATURE_QUANTITY: &str = "gaussian curvature";

/// Name of the normals quantity.
pub const NORMALS_QUANTITY: &str = "vertex normals";

/// Name of the parameterization quantity.
pub const PARAMETERIZATION_QUANTITY: &str = "LSCM parameterization";

/// Warning shown when a closed mesh is asked for a parameterization.
pub const NO_BOUNDARY_WARNING: &str = "mesh has no boundary, cannot parameterize";

/// Name of the distance quantity for a given source vertex.
pub fn distance_quantity_name(source: usize) -> String {
    format!("distance from vertex {}", source)
}

/// One of the four user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Gaussian curvature density.
    Curvature,
    /// Per-vertex normals.
    Normals,
    /// LSCM parameterization pinned on the boundary.
    Parameterization,
    /// Exact geodesic distance from the source vertex.
    Distance,
}

/// Loaded mesh plus viewer state.
pub struct Demo {
    mesh: HalfEdgeMesh,
    scene: Scene,
    source_vertex: i64,
    geodesic_options: ExactGeodesicOptions,
}

impl Demo {
    /// Load a mesh file and register it as [`MESH_NAME`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("loading: {}", path.display());
        let mesh = io::load(path)?;
        Ok(Self::from_mesh(mesh))
    }

    /// Wrap an already built mesh.
    pub fn from_mesh(mesh: HalfEdgeMesh) -> Self {
        log::info!(
            "{}: {} vertices, {} faces",
            MESH_NAME,
            mesh.num_vertices(),
            mesh.num_faces()
        );
        let mut scene = Scene::new();
        scene.register_halfedge_mesh(MESH_NAME, &mesh);
        Self {
            mesh,
            scene,
            source_vertex: DEFAULT_SOURCE_VERTEX,
            geodesic_options: ExactGeodesicOptions::default(),
        }
    }

    /// Replace the options used by the distance action.
    pub fn with_geodesic_options(mut self, options: ExactGeodesicOptions) -> Self {
        self.geodesic_options = options;
        self
    }

    /// The loaded mesh.
    pub fn mesh(&self) -> &HalfEdgeMesh {
        &self.mesh
    }

    /// The scene holding the registered mesh and its quantities.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable access to the scene, for display toggles.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// The registered input mesh.
    pub fn surface_mesh(&self) -> Option<&SurfaceMesh> {
        self.scene.get_surface_mesh(MESH_NAME)
    }

    fn surface_mesh_mut(&mut self) -> Result<&mut SurfaceMesh> {
        self.scene
            .get_surface_mesh_mut(MESH_NAME)
            .ok_or_else(|| MeshError::UnknownStructure(MESH_NAME.to_string()))
    }

    /// The current source vertex, as entered. It may be out of range.
    pub fn source_vertex(&self) -> i64 {
        self.source_vertex
    }

    /// Set the source vertex. Range is checked when distances are computed.
    pub fn set_source_vertex(&mut self, source: i64) {
        self.source_vertex = source;
    }

    /// Move the source vertex by `delta`, staying inside the mesh.
    pub fn step_source_vertex(&mut self, delta: i64) -> i64 {
        let last = self.mesh.num_vertices().saturating_sub(1) as i64;
        self.source_vertex = self.source_vertex.saturating_add(delta).clamp(0, last);
        self.source_vertex
    }

    /// Run one of the four actions.
    pub fn run(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Curvature => self.add_curvature_scalar(),
            Action::Normals => self.compute_normals(),
            Action::Parameterization => self.compute_parameterization(),
            Action::Distance => self.compute_distance_from(),
        }
    }

    /// Register the Gaussian curvature density as a symmetric scalar.
    pub fn add_curvature_scalar(&mut self) -> Result<()> {
        let curvature = gaussian_curvature(&self.mesh);
        self.surface_mesh_mut()?.add_vertex_scalar_quantity(
            CURVATURE_QUANTITY,
            curvature,
            DataType::Symmetric,
        )?;
        log::info!("computed {}", CURVATURE_QUANTITY);
        Ok(())
    }

    /// Register area-weighted vertex normals.
    pub fn compute_normals(&mut self) -> Result<()> {
        let normals = per_vertex_normals(&self.mesh, NormalWeighting::Area);
        self.surface_mesh_mut()?
            .add_vertex_vector_quantity(NORMALS_QUANTITY, normals)?;
        log::info!("computed {}", NORMALS_QUANTITY);
        Ok(())
    }

    /// Register an LSCM parameterization.
    ///
    /// The first vertex of the longest boundary loop is pinned to `(0, 0)`
    /// and the vertex halfway around it to `(1, 0)`. A closed mesh only
    /// produces a warning.
    pub fn compute_parameterization(&mut self) -> Result<()> {
        let bnd = boundary_loop(&self.mesh);
        if bnd.is_empty() {
            self.scene.warning(NO_BOUNDARY_WARNING);
            return Ok(());
        }

        let options = LSCMOptions::with_pins(
            PinnedVertex::new(bnd[0].index(), 0.0, 0.0),
            PinnedVertex::new(bnd[bnd.len() / 2].index(), 1.0, 0.0),
        )
        .with_normalize(false);
        let uv_map = lscm(&self.mesh, &options)?;

        self.surface_mesh_mut()?
            .add_vertex_parameterization_quantity(PARAMETERIZATION_QUANTITY, uv_map)?;
        log::info!(
            "computed {} (boundary loop of {} vertices)",
            PARAMETERIZATION_QUANTITY,
            bnd.len()
        );
        Ok(())
    }

    /// Register exact geodesic distances from the source vertex.
    ///
    /// An out-of-range source only produces a warning.
    pub fn compute_distance_from(&mut self) -> Result<()> {
        let n = self.mesh.num_vertices();
        let source = match usize::try_from(self.source_vertex) {
            Ok(s) if s < n => s,
            _ => {
                self.scene.warning(format!(
                    "source vertex {} is out of range, the mesh has {} vertices",
                    self.source_vertex, n
                ));
                return Ok(());
            }
        };

        let result = exact_geodesic(&self.mesh, VertexId::new(source), &self.geodesic_options)?;
        if let Some((v, d)) = result.farthest_vertex() {
            log::info!(
                "distance from vertex {}: farthest vertex {} at {:.6}",
                source,
                v.index(),
                d
            );
        }

        self.surface_mesh_mut()?
            .add_vertex_distance_quantity(distance_quantity_name(source), result.into_distances())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::obj;
    use crate::mesh::fixtures;
    use crate::viz::QuantityData;

    /// OBJ text for an `n x n` grid of unit squares.
    fn grid_obj(n: usize) -> String {
        let mut text = String::from("o grid\n");
        for j in 0..=n {
            for i in 0..=n {
                text.push_str(&format!("v {} {} 0\n", i, j));
            }
        }
        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i + 1;
                let (v10, v01) = (v00 + 1, v00 + n + 1);
                let v11 = v01 + 1;
                text.push_str(&format!("f {} {} {}\nf {} {} {}\n", v00, v10, v11, v00, v11, v01));
            }
        }
        text
    }

    fn quantity<'a>(demo: &'a Demo, name: &str) -> Option<&'a crate::viz::Quantity> {
        demo.surface_mesh()?.quantity(name)
    }

    #[test]
    fn test_mesh_is_registered() {
        let demo = Demo::from_mesh(fixtures::grid(2));
        let mesh = demo.surface_mesh().unwrap();

        assert_eq!(mesh.name(), MESH_NAME);
        assert_eq!(mesh.num_vertices(), 9);
        assert_eq!(mesh.faces().len(), 8);
        assert_eq!(demo.source_vertex(), 7);
    }

    #[test]
    fn test_closed_mesh_skips_parameterization() {
        let mut demo = Demo::from_mesh(fixtures::icosphere(1));
        demo.compute_parameterization().unwrap();

        assert_eq!(demo.scene().messages(), &[NO_BOUNDARY_WARNING.to_string()]);
        assert!(quantity(&demo, PARAMETERIZATION_QUANTITY).is_none());
        assert!(demo.surface_mesh().unwrap().quantities().is_empty());
    }

    #[test]
    fn test_distance_field_from_obj() {
        let mesh = obj::load_from_reader(grid_obj(3).as_bytes()).unwrap();
        let n = mesh.num_vertices();
        let mut demo = Demo::from_mesh(mesh);
        demo.compute_distance_from().unwrap();

        let q = quantity(&demo, "distance from vertex 7").unwrap();
        let d = q.values().unwrap();
        assert_eq!(n, 16);
        assert_eq!(d.len(), n);
        assert_eq!(d[7], 0.0);
        assert!(d.iter().all(|x| x.is_finite() && *x >= 0.0));
        // Vertex 7 is (3, 1); vertex 0 is straight-line reachable on the flat grid
        assert!((d[0] - 10f64.sqrt()).abs() < 1e-9);
        assert!(demo.scene().messages().is_empty());
    }

    #[test]
    fn test_parameterization_pins() {
        let mesh = obj::load_from_reader(grid_obj(2).as_bytes()).unwrap();
        let mut demo = Demo::from_mesh(mesh);
        demo.compute_parameterization().unwrap();

        let uv = quantity(&demo, PARAMETERIZATION_QUANTITY)
            .and_then(|q| q.uv_map())
            .unwrap();
        // Boundary loop is 0, 1, 2, 5, 8, 7, 6, 3
        assert!((uv.get(VertexId::new(0)).coords).norm() < 1e-12);
        let p = uv.get(VertexId::new(8));
        assert!((p.x - 1.0).abs() < 1e-12 && p.y.abs() < 1e-12);

        // The grid is flat, so the map is a similarity with scale 1 / (2 sqrt 2)
        let area = uv.total_area(demo.mesh());
        assert!((area - 4.0 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_curvature_and_normals() {
        let mut demo = Demo::from_mesh(fixtures::octahedron());
        demo.run(Action::Curvature).unwrap();
        demo.run(Action::Normals).unwrap();

        let mesh = demo.surface_mesh().unwrap();
        match mesh.quantity(CURVATURE_QUANTITY).unwrap().data() {
            QuantityData::Scalar { values, data_type } => {
                assert_eq!(*data_type, DataType::Symmetric);
                assert_eq!(values.len(), 6);
                assert!(values.iter().all(|&k| k > 0.0));
            }
            other => panic!("unexpected quantity {:?}", other),
        }

        let normals = mesh.quantity(NORMALS_QUANTITY).unwrap().vectors().unwrap();
        assert_eq!(normals.len(), 6);
        assert!(normals.iter().all(|n| (n.norm() - 1.0).abs() < 1e-12));
        // Curvature stays the displayed color quantity
        assert_eq!(mesh.enabled_color_quantity().unwrap().name(), CURVATURE_QUANTITY);
    }

    #[test]
    fn test_source_out_of_range_warns() {
        let mut demo = Demo::from_mesh(fixtures::tetrahedron());
        demo.run(Action::Distance).unwrap();
        assert_eq!(demo.scene().messages().len(), 1);

        demo.set_source_vertex(-1);
        demo.run(Action::Distance).unwrap();
        assert_eq!(demo.scene().messages().len(), 2);
        assert!(demo.surface_mesh().unwrap().quantities().is_empty());

        demo.set_source_vertex(2);
        demo.run(Action::Distance).unwrap();
        assert!(quantity(&demo, &distance_quantity_name(2)).is_some());
    }

    #[test]
    fn test_step_source_vertex_clamps() {
        let mut demo = Demo::from_mesh(fixtures::grid(2));
        assert_eq!(demo.step_source_vertex(1), 8);
        assert_eq!(demo.step_source_vertex(1), 8);
        assert_eq!(demo.step_source_vertex(-100), 0);

        demo.set_source_vertex(42);
        assert_eq!(demo.source_vertex(), 42);
        assert_eq!(demo.step_source_vertex(-1), 8);
    }

    #[test]
    fn test_distance_budget_error_propagates() {
        let mut demo = Demo::from_mesh(fixtures::grid(4))
            .with_geodesic_options(ExactGeodesicOptions::default().with_max_windows(3));
        assert!(matches!(
            demo.compute_distance_from(),
            Err(MeshError::ConvergenceFailed { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Demo::load("/nonexistent/meshlens/input.obj").is_err());
    }

    #[test]
    fn test_bowtie_obj_is_rejected() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv -1 0 0\nv 0 -1 0\nf 1 2 3\nf 1 4 5\n";
        let result = obj::load_from_reader(text.as_bytes());
        assert!(matches!(result, Err(MeshError::NonManifold { .. })));
    }
}
