//! GPU buffers for a scene surface mesh and its enabled quantities.

use bytemuck::{Pod, Zeroable};
use nalgebra::{Point3, Vector3};
use wgpu::util::DeviceExt;

use meshlens::viz::SurfaceMesh;

/// Surface color when no color quantity is enabled.
const BASE_COLOR: [f32; 3] = [0.8, 0.8, 0.85];

/// Color of vector quantity glyphs.
const VECTOR_COLOR: [f32; 3] = [0.1, 0.2, 0.9];

/// GPU vertex with position, normal, UV coordinates, and color.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2, 3 => Float32x3];

    /// Vertex buffer layout for wgpu.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// CPU-side draw data, before upload.
#[derive(Debug)]
pub struct Geometry {
    /// Three vertices per face, flat shaded.
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Line list for vector quantities, two vertices per glyph.
    pub lines: Vec<Vertex>,
    /// Whether the surface shows a parameterization checkerboard.
    pub checker: bool,
    pub center: Point3<f32>,
    pub radius: f32,
}

fn to_f32(p: &Point3<f64>) -> [f32; 3] {
    [p.x as f32, p.y as f32, p.z as f32]
}

/// Mean edge length over all face edges, used to size vector glyphs.
fn mean_edge_length(mesh: &SurfaceMesh) -> f64 {
    let positions = mesh.positions();
    let total: f64 = mesh
        .faces()
        .iter()
        .flat_map(|f| [(f[0], f[1]), (f[1], f[2]), (f[2], f[0])])
        .map(|(a, b)| (positions[b] - positions[a]).norm())
        .sum();
    let count = mesh.faces().len() * 3;
    if count > 0 {
        total / count as f64
    } else {
        1.0
    }
}

impl Geometry {
    /// Build draw data for a surface mesh in its current display state.
    pub fn from_surface_mesh(mesh: &SurfaceMesh) -> Self {
        let positions = mesh.positions();
        let enabled = mesh.enabled_color_quantity();
        let colors = enabled.and_then(|q| q.colors());

        // Scale the parameterization so checker cells have a fixed size
        let uvs: Option<Vec<[f32; 2]>> = enabled.and_then(|q| q.uv_map()).map(|uv_map| {
            let extent = uv_map
                .bounding_box()
                .map(|(min, max)| (max.x - min.x).max(max.y - min.y))
                .filter(|e| *e > 1e-12)
                .unwrap_or(1.0);
            uv_map
                .as_slice()
                .iter()
                .map(|uv| [(uv.x / extent) as f32, (uv.y / extent) as f32])
                .collect()
        });

        let mut vertices = Vec::with_capacity(mesh.faces().len() * 3);
        let mut indices: Vec<u32> = Vec::with_capacity(mesh.faces().len() * 3);
        let mut skipped = 0usize;

        for face in mesh.faces() {
            let [p0, p1, p2] = face.map(|v| positions[v]);
            let Some(normal) = (p1 - p0).cross(&(p2 - p0)).try_normalize(1e-12) else {
                skipped += 1;
                continue;
            };
            let normal = [normal.x as f32, normal.y as f32, normal.z as f32];

            let base = vertices.len() as u32;
            for &v in face {
                vertices.push(Vertex {
                    position: to_f32(&positions[v]),
                    normal,
                    uv: uvs.as_ref().map_or([0.0, 0.0], |uvs| uvs[v]),
                    color: colors.as_ref().map_or(BASE_COLOR, |colors| colors[v]),
                });
            }
            indices.extend([base, base + 1, base + 2]);
        }
        if skipped > 0 {
            log::warn!("skipped {} degenerate faces", skipped);
        }

        let length = mean_edge_length(mesh);
        let mut lines = Vec::new();
        for q in mesh.enabled_vector_quantities() {
            for (p, v) in positions.iter().zip(q.vectors().unwrap_or_default()) {
                let tip: Point3<f64> = p + v * length;
                for point in [p, &tip] {
                    lines.push(Vertex {
                        position: to_f32(point),
                        normal: [0.0; 3],
                        uv: [0.0; 2],
                        color: VECTOR_COLOR,
                    });
                }
            }
        }

        // Centroid, and the largest distance from it
        let (center, radius) = if positions.is_empty() {
            (Point3::origin(), 1.0)
        } else {
            let sum = positions
                .iter()
                .fold(Vector3::zeros(), |acc: Vector3<f64>, p| acc + p.coords);
            let center = Point3::from(sum / positions.len() as f64);
            let radius = positions
                .iter()
                .map(|p| (p - center).norm())
                .fold(0.0f64, f64::max);
            (Point3::from(to_f32(&center)), radius as f32)
        };

        Geometry {
            vertices,
            indices,
            lines,
            checker: uvs.is_some(),
            center,
            radius,
        }
    }
}

/// Mesh data uploaded to the GPU.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
    /// Vector glyphs, if any are enabled.
    pub line_buffer: Option<wgpu::Buffer>,
    pub num_line_vertices: u32,
    pub checker: bool,
    pub center: Point3<f32>,
    pub radius: f32,
}

impl GpuMesh {
    /// Upload draw data for a surface mesh.
    pub fn from_surface_mesh(device: &wgpu::Device, mesh: &SurfaceMesh) -> Self {
        let geometry = Geometry::from_surface_mesh(mesh);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let line_buffer = (!geometry.lines.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Vector Line Buffer"),
                contents: bytemuck::cast_slice(&geometry.lines),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_indices: geometry.indices.len() as u32,
            line_buffer,
            num_line_vertices: geometry.lines.len() as u32,
            checker: geometry.checker,
            center: geometry.center,
            radius: geometry.radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshlens::algo::parameterize::UVMap;
    use meshlens::viz::{DataType, Scene};
    use nalgebra::Point2;

    fn square(scene: &mut Scene) -> &mut SurfaceMesh {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        scene
            .register_surface_mesh("square", positions, vec![[0, 1, 2], [0, 2, 3]])
            .unwrap()
    }

    #[test]
    fn test_plain_surface() {
        let mut scene = Scene::new();
        let geometry = Geometry::from_surface_mesh(square(&mut scene));

        assert_eq!(geometry.vertices.len(), 6);
        assert_eq!(geometry.indices, vec![0, 1, 2, 3, 4, 5]);
        assert!(geometry.lines.is_empty());
        assert!(!geometry.checker);
        assert!(geometry.vertices.iter().all(|v| v.color == BASE_COLOR));
        assert!(geometry.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        assert!((geometry.center - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-6);
        assert!((geometry.radius - 2f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_enabled_scalar_colors_vertices() {
        let mut scene = Scene::new();
        let mesh = square(&mut scene);
        mesh.add_vertex_scalar_quantity("s", vec![-1.0, 0.0, 1.0, 0.0], DataType::Symmetric)
            .unwrap();
        let geometry = Geometry::from_surface_mesh(mesh);

        // Second corner of the first face is vertex 1, which is zero
        assert_eq!(geometry.vertices[1].color, [1.0, 1.0, 1.0]);
        assert_ne!(geometry.vertices[0].color, BASE_COLOR);
    }

    #[test]
    fn test_parameterization_turns_on_checker() {
        let mut scene = Scene::new();
        let mesh = square(&mut scene);
        let uv = UVMap::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ]);
        mesh.add_vertex_parameterization_quantity("uv", uv).unwrap();
        let geometry = Geometry::from_surface_mesh(mesh);

        assert!(geometry.checker);
        assert_eq!(geometry.vertices[2].uv, [1.0, 1.0]);
    }

    #[test]
    fn test_vectors_become_lines() {
        let mut scene = Scene::new();
        let mesh = square(&mut scene);
        mesh.add_vertex_vector_quantity("n", vec![Vector3::z(); 4])
            .unwrap();
        let geometry = Geometry::from_surface_mesh(mesh);
        assert_eq!(geometry.lines.len(), 8);

        // Glyph length is the mean edge length: (4 * 2 + 2 * 2 sqrt 2) / 6
        let expected = (8.0 + 4.0 * 2f32.sqrt()) / 6.0;
        assert!((geometry.lines[1].position[2] - expected).abs() < 1e-5);

        mesh.toggle_vector_quantities();
        assert!(Geometry::from_surface_mesh(mesh).lines.is_empty());
    }
}
