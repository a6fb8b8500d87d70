//! Geometry processing algorithms.
//!
//! - **Curvature**: angle defect, lumped mass matrices, Gaussian curvature density
//! - **Normals**: per-vertex normals with uniform, area or angle weights
//! - **Geodesics**: exact polyhedral distance by window propagation
//! - **Parameterization**: least squares conformal maps

pub mod curvature;
pub mod geodesic;
pub mod normals;
pub mod parameterize;
