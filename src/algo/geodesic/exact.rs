//! Exact polyhedral geodesics by window propagation.
//!
//! Distances are carried across the surface as *windows*: intervals on mesh
//! edges together with the position of a (pseudo-)source in the plane the
//! adjacent triangles unfold into. A window travels into the next face and
//! splits into at most two children on the opposite edges. Geodesics only
//! bend at saddle and boundary vertices, which therefore restart propagation
//! as pseudo-sources once they are reached.
//!
//! Windows are processed in order of their minimum possible distance, and a
//! window is dropped as soon as one of its edge endpoints offers a shorter
//! route to every point of the interval.
//!
//! # References
//!
//! - Chen, J., Han, Y. (1990). "Shortest paths on a polyhedron."
//! - Xin, S.-Q., Wang, G.-J. (2009). "Improving Chen and Han's algorithm on
//!   the discrete geodesic problem." ACM Transactions on Graphics.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f64::consts::PI;

use nalgebra::Vector2;

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeId, HalfEdgeMesh, VertexId};

use super::GeodesicResult;

/// Options for [`exact_geodesic`].
#[derive(Debug, Clone)]
pub struct ExactGeodesicOptions {
    /// Upper bound on the number of windows created before giving up.
    pub max_windows: usize,
}

impl Default for ExactGeodesicOptions {
    fn default() -> Self {
        Self {
            max_windows: 50_000_000,
        }
    }
}

impl ExactGeodesicOptions {
    /// Set the window budget.
    pub fn with_max_windows(mut self, max_windows: usize) -> Self {
        self.max_windows = max_windows;
        self
    }
}

/// An interval `[b0, b1]` on half-edge `he`, measured from its origin.
///
/// The frame puts the origin of `he` at `(0, 0)`, its destination at
/// `(len, 0)` and the face of `he` above the x-axis. The source `src` lies on
/// or below the x-axis, at distance `sigma` from the real source.
#[derive(Debug, Clone, Copy)]
struct Window {
    he: HalfEdgeId,
    b0: f64,
    b1: f64,
    src: Vector2<f64>,
    sigma: f64,
}

impl Window {
    /// Distance from the real source to the point `(t, 0)` through this window.
    fn distance_at(&self, t: f64) -> f64 {
        self.sigma + (Vector2::new(t, 0.0) - self.src).norm()
    }

    /// Lower bound on the distance of any point reached through this window.
    fn min_distance(&self) -> f64 {
        let x = self.src.x.clamp(self.b0, self.b1);
        self.distance_at(x)
    }
}

#[derive(Debug, Clone, Copy)]
enum Event {
    Window(Window),
    Vertex(VertexId, f64),
}

/// Priority queue entry ordered by smallest key first.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    key: f64,
    event: Event,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other.key.partial_cmp(&self.key).unwrap_or(Ordering::Equal)
    }
}

fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Position of a point given its distances `da` to `(0, 0)` and `db` to `(len, 0)`.
///
/// Returns the solution with non-negative y.
fn place(len: f64, da: f64, db: f64) -> Vector2<f64> {
    let x = (len * len + da * da - db * db) / (2.0 * len);
    let y = (da * da - x * x).max(0.0).sqrt();
    Vector2::new(x, y)
}

struct Propagator<'a> {
    mesh: &'a HalfEdgeMesh,
    dist: Vec<f64>,
    /// Saddle or boundary vertices, where geodesics may bend.
    pseudo_source: Vec<bool>,
    queue: BinaryHeap<QueueEntry>,
    windows: usize,
    max_windows: usize,
    eps: f64,
}

impl<'a> Propagator<'a> {
    fn new(mesh: &'a HalfEdgeMesh, max_windows: usize) -> Self {
        let pseudo_source = mesh
            .vertex_ids()
            .map(|v| {
                if mesh.is_isolated(v) {
                    return false;
                }
                if mesh.is_boundary_vertex(v) {
                    return true;
                }
                let angle_sum: f64 = mesh
                    .vertex_halfedges(v)
                    .map(|he| {
                        let p = mesh.position(v);
                        let a = mesh.position(mesh.dest(he)) - p;
                        let b = mesh.position(mesh.origin(mesh.prev(he))) - p;
                        a.cross(&b).norm().atan2(a.dot(&b))
                    })
                    .sum();
                angle_sum > 2.0 * PI + 1e-9
            })
            .collect();

        Self {
            mesh,
            dist: vec![f64::INFINITY; mesh.num_vertices()],
            pseudo_source,
            queue: BinaryHeap::new(),
            windows: 0,
            max_windows,
            eps: 1e-10 * mesh.average_edge_length().max(f64::MIN_POSITIVE),
        }
    }

    fn add_source(&mut self, v: VertexId) {
        self.dist[v.index()] = 0.0;
        self.queue.push(QueueEntry {
            key: 0.0,
            event: Event::Vertex(v, 0.0),
        });
    }

    /// Offer a new distance to `v`. Improved pseudo-sources are queued.
    fn relax(&mut self, v: VertexId, d: f64) {
        if d + self.eps >= self.dist[v.index()] {
            return;
        }
        self.dist[v.index()] = d;
        if self.pseudo_source[v.index()] {
            self.queue.push(QueueEntry {
                key: d,
                event: Event::Vertex(v, d),
            });
        }
    }

    /// Whether an endpoint of the edge reaches every point of the window sooner.
    fn is_dominated(&self, w: &Window) -> bool {
        let len = self.mesh.edge_length(w.he);
        let da = self.dist[self.mesh.origin(w.he).index()];
        let db = self.dist[self.mesh.dest(w.he).index()];
        da + w.b1 < w.distance_at(w.b1) - self.eps
            || db + (len - w.b0) < w.distance_at(w.b0) - self.eps
    }

    fn push_window(&mut self, w: Window) -> Result<()> {
        if w.b1 - w.b0 < self.eps {
            return Ok(());
        }

        let len = self.mesh.edge_length(w.he);
        if w.b0 < self.eps {
            self.relax(self.mesh.origin(w.he), w.distance_at(0.0));
        }
        if w.b1 > len - self.eps {
            self.relax(self.mesh.dest(w.he), w.distance_at(len));
        }

        if self.mesh.is_boundary_halfedge(w.he) || self.is_dominated(&w) {
            return Ok(());
        }

        self.windows += 1;
        if self.windows > self.max_windows {
            return Err(MeshError::ConvergenceFailed {
                iterations: self.windows,
            });
        }

        self.queue.push(QueueEntry {
            key: w.min_distance(),
            event: Event::Window(w),
        });
        Ok(())
    }

    /// Start windows on the edges opposite to `v` in each incident face.
    fn expand_vertex(&mut self, v: VertexId, d: f64) -> Result<()> {
        let mesh = self.mesh;
        let p = *mesh.position(v);
        let outgoing: Vec<HalfEdgeId> = mesh.vertex_halfedges(v).collect();

        for he in outgoing {
            self.relax(mesh.dest(he), d + mesh.edge_length(he));
            if mesh.is_boundary_halfedge(he) {
                continue;
            }

            let opposite = mesh.twin(mesh.next(he));
            if mesh.is_boundary_halfedge(opposite) {
                continue;
            }

            let len = mesh.edge_length(opposite);
            let da = (mesh.position(mesh.origin(opposite)) - p).norm();
            let db = (mesh.position(mesh.dest(opposite)) - p).norm();
            let src = place(len, da, db);

            self.push_window(Window {
                he: opposite,
                b0: 0.0,
                b1: len,
                src: Vector2::new(src.x, -src.y),
                sigma: d,
            })?;
        }
        Ok(())
    }

    /// Map `[t0, t1]` on the current edge onto the edge from `p` to `q`.
    ///
    /// `child` is the half-edge from `p` to `q` on the far side.
    fn push_child(
        &mut self,
        w: &Window,
        t0: f64,
        t1: f64,
        child: HalfEdgeId,
        p: Vector2<f64>,
        q: Vector2<f64>,
    ) -> Result<()> {
        let e = q - p;
        let len = e.norm();
        if len < self.eps {
            return Ok(());
        }

        let hit = |t: f64| -> Option<f64> {
            let d = Vector2::new(t, 0.0) - w.src;
            let den = cross(&e, &d);
            if den.abs() < f64::MIN_POSITIVE {
                return None;
            }
            Some((cross(&(w.src - p), &d) / den).clamp(0.0, 1.0) * len)
        };
        let (Some(s0), Some(s1)) = (hit(t0), hit(t1)) else {
            return Ok(());
        };

        let u = e / len;
        let v = Vector2::new(-u.y, u.x);
        let rel = w.src - p;
        let src = Vector2::new(rel.dot(&u), rel.dot(&v).min(0.0));

        self.push_window(Window {
            he: child,
            b0: s0.min(s1),
            b1: s0.max(s1),
            src,
            sigma: w.sigma,
        })
    }

    /// Carry a window across the face of its half-edge.
    fn propagate(&mut self, w: Window) -> Result<()> {
        let mesh = self.mesh;
        let h = w.he;
        let next = mesh.next(h);
        let prev = mesh.prev(h);
        let c = mesh.dest(next);

        let len = mesh.edge_length(h);
        let pc = place(len, mesh.edge_length(prev), mesh.edge_length(next));
        if pc.y < self.eps {
            // Degenerate face
            return Ok(());
        }
        let pa = Vector2::new(0.0, 0.0);
        let pb = Vector2::new(len, 0.0);

        // Where the ray from the source through C crosses the edge
        let tc = w.src.x + (pc.x - w.src.x) * (-w.src.y) / (pc.y - w.src.y);

        if tc >= w.b0 - self.eps && tc <= w.b1 + self.eps {
            self.relax(c, w.sigma + (pc - w.src).norm());
        }

        if tc > w.b0 {
            let t1 = w.b1.min(tc);
            self.push_child(&w, w.b0, t1, mesh.twin(prev), pa, pc)?;
        }
        if tc < w.b1 {
            let t0 = w.b0.max(tc);
            self.push_child(&w, t0, w.b1, mesh.twin(next), pc, pb)?;
        }
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        while let Some(entry) = self.queue.pop() {
            match entry.event {
                Event::Vertex(v, d) => {
                    if d > self.dist[v.index()] {
                        continue;
                    }
                    self.expand_vertex(v, d)?;
                }
                Event::Window(w) => {
                    if self.is_dominated(&w) {
                        continue;
                    }
                    self.propagate(w)?;
                }
            }
        }
        Ok(())
    }
}

/// Compute exact geodesic distances from a single source vertex.
///
/// Every vertex gets the length of the shortest path over the surface,
/// which may cross faces anywhere. Vertices in other connected components
/// get `f64::INFINITY`.
///
/// # Errors
///
/// * [`MeshError::InvalidParameter`] if `source` is not a vertex of `mesh`
/// * [`MeshError::ConvergenceFailed`] if more than `max_windows` windows are needed
///
/// # Example
///
/// ```no_run
/// use meshlens::prelude::*;
/// use meshlens::algo::geodesic::{exact_geodesic, ExactGeodesicOptions};
///
/// let mesh = meshlens::io::load("mesh.obj").unwrap();
/// let result = exact_geodesic(&mesh, VertexId::new(7), &ExactGeodesicOptions::default()).unwrap();
/// if let Some((v, d)) = result.farthest_vertex() {
///     println!("farthest vertex {:?} at {}", v, d);
/// }
/// ```
pub fn exact_geodesic(
    mesh: &HalfEdgeMesh,
    source: VertexId,
    options: &ExactGeodesicOptions,
) -> Result<GeodesicResult> {
    exact_geodesic_multiple(mesh, &[source], options)
}

/// Compute exact geodesic distances to the nearest of several sources.
pub fn exact_geodesic_multiple(
    mesh: &HalfEdgeMesh,
    sources: &[VertexId],
    options: &ExactGeodesicOptions,
) -> Result<GeodesicResult> {
    if sources.is_empty() {
        return Err(MeshError::invalid_param(
            "sources",
            0,
            "at least one source vertex is required",
        ));
    }
    for &s in sources {
        if !s.is_valid() || s.index() >= mesh.num_vertices() {
            return Err(MeshError::invalid_param(
                "source",
                s.index(),
                "vertex index out of range",
            ));
        }
    }

    let mut propagator = Propagator::new(mesh, options.max_windows);
    for &s in sources {
        propagator.add_source(s);
    }
    propagator.run()?;

    log::debug!(
        "exact geodesic: {} sources, {} windows",
        sources.len(),
        propagator.windows
    );

    let mut distances = propagator.dist;
    // Sources are exact even if a window rounded onto them
    for &s in sources {
        distances[s.index()] = 0.0;
    }
    Ok(GeodesicResult::new(distances))
}
