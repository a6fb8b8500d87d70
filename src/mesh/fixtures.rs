//! Small meshes shared by the unit tests.

use std::collections::HashMap;
use std::f64::consts::PI;

use nalgebra::Point3;

use super::{build_from_triangles, HalfEdgeMesh};

/// Planar `n x n` grid of unit squares in the xy-plane, vertex `(i, j)` at index `j * (n + 1) + i`.
pub(crate) fn grid(n: usize) -> HalfEdgeMesh {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + n + 1;
            let v11 = v01 + 1;
            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

/// Unit disk: a center vertex plus `rings` rings of `segments` vertices each.
pub(crate) fn disk(rings: usize, segments: usize) -> HalfEdgeMesh {
    let mut vertices = vec![Point3::origin()];
    for r in 1..=rings {
        let radius = r as f64 / rings as f64;
        for s in 0..segments {
            let a = 2.0 * PI * s as f64 / segments as f64;
            vertices.push(Point3::new(radius * a.cos(), radius * a.sin(), 0.0));
        }
    }

    let ring = |r: usize, s: usize| 1 + (r - 1) * segments + s % segments;
    let mut faces = Vec::new();
    for s in 0..segments {
        faces.push([0, ring(1, s), ring(1, s + 1)]);
    }
    for r in 1..rings {
        for s in 0..segments {
            faces.push([ring(r, s), ring(r + 1, s), ring(r + 1, s + 1)]);
            faces.push([ring(r, s), ring(r + 1, s + 1), ring(r, s + 1)]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

/// Regular tetrahedron inscribed in the cube `[-1, 1]^3`.
pub(crate) fn tetrahedron() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(1.0, -1.0, -1.0),
        Point3::new(-1.0, 1.0, -1.0),
        Point3::new(-1.0, -1.0, 1.0),
    ];
    let faces = [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];
    build_from_triangles(&vertices, &faces).unwrap()
}

/// Octahedron with vertices on the unit axes.
pub(crate) fn octahedron() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let faces = [
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];
    build_from_triangles(&vertices, &faces).unwrap()
}

/// Axis-aligned unit cube `[0, 1]^3`, two triangles per side.
pub(crate) fn cube() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
    ];
    let faces = [
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [1, 2, 6],
        [1, 6, 5],
        [2, 3, 7],
        [2, 7, 6],
        [3, 0, 4],
        [3, 4, 7],
    ];
    build_from_triangles(&vertices, &faces).unwrap()
}

/// Subdivided icosahedron projected onto the unit sphere.
pub(crate) fn icosphere(subdivisions: usize) -> HalfEdgeMesh {
    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let scale = 1.0 / (1.0 + phi * phi).sqrt();

    let mut vertices: Vec<Point3<f64>> = [
        (-1.0, phi, 0.0),
        (1.0, phi, 0.0),
        (-1.0, -phi, 0.0),
        (1.0, -phi, 0.0),
        (0.0, -1.0, phi),
        (0.0, 1.0, phi),
        (0.0, -1.0, -phi),
        (0.0, 1.0, -phi),
        (phi, 0.0, -1.0),
        (phi, 0.0, 1.0),
        (-phi, 0.0, -1.0),
        (-phi, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Point3::new(x * scale, y * scale, z * scale))
    .collect();

    let mut faces = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut new_faces = Vec::with_capacity(faces.len() * 4);
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();

        for face in &faces {
            let mut mids = [0usize; 3];
            for i in 0..3 {
                let (a, b) = (face[i], face[(i + 1) % 3]);
                let key = (a.min(b), a.max(b));
                mids[i] = *midpoints.entry(key).or_insert_with(|| {
                    let mid = (vertices[a].coords + vertices[b].coords).normalize();
                    vertices.push(Point3::from(mid));
                    vertices.len() - 1
                });
            }
            new_faces.push([face[0], mids[0], mids[2]]);
            new_faces.push([face[1], mids[1], mids[0]]);
            new_faces.push([face[2], mids[2], mids[1]]);
            new_faces.push([mids[0], mids[1], mids[2]]);
        }
        faces = new_faces;
    }

    build_from_triangles(&vertices, &faces).unwrap()
}
