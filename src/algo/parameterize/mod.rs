//! UV parameterization.
//!
//! Maps a mesh with boundary to the plane. Closed meshes have to be cut
//! open first; [`lscm`] reports [`MeshError::NoBoundary`](crate::error::MeshError::NoBoundary)
//! for them.
//!
//! # Example
//!
//! ```no_run
//! use meshlens::algo::parameterize::{lscm, LSCMOptions};
//!
//! let mesh = meshlens::io::load("input.obj").unwrap();
//! let uv_map = lscm(&mesh, &LSCMOptions::default()).unwrap();
//! for (v, uv) in uv_map.iter() {
//!     println!("{:?}: u={:.3}, v={:.3}", v, uv.x, uv.y);
//! }
//! ```

mod lscm;
mod sparse;
mod uv;

pub use lscm::{lscm, LSCMOptions, PinStrategy, PinnedVertex};
pub use uv::UVMap;
