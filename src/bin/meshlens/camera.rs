//! Orbit camera for the viewer.

use std::f32::consts::FRAC_PI_2;

use nalgebra::{Matrix4, Perspective3, Point3, Vector3};

/// Maps OpenGL clip depth `[-1, 1]` to the `[0, 1]` range wgpu expects.
#[rustfmt::skip]
fn opengl_to_wgpu() -> Matrix4<f32> {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Camera on a sphere around a target point, y up.
pub struct OrbitCamera {
    target: Point3<f32>,
    distance: f32,
    azimuth: f32,
    elevation: f32,
    fov: f32,
    /// Scene radius; near/far planes and zoom limits scale with it.
    radius: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Point3::origin(),
            distance: 3.0,
            azimuth: 0.0,
            elevation: 0.3,
            fov: std::f32::consts::FRAC_PI_4,
            radius: 1.0,
        }
    }
}

impl OrbitCamera {
    /// Look at a sphere of the given center and radius from the default angle.
    pub fn fit(&mut self, center: Point3<f32>, radius: f32) {
        self.target = center;
        self.radius = if radius > f32::EPSILON { radius } else { 1.0 };
        self.distance = self.radius * 2.5;
        self.azimuth = 0.0;
        self.elevation = 0.3;
    }

    /// Eye position in world space.
    pub fn eye(&self) -> Point3<f32> {
        let (sin_e, cos_e) = self.elevation.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.target + Vector3::new(cos_e * sin_a, sin_e, cos_e * cos_a) * self.distance
    }

    /// Unit vector from the eye toward the target.
    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.eye()).normalize()
    }

    /// Combined view-projection matrix in wgpu clip space, column-major.
    pub fn view_projection(&self, aspect: f32) -> [[f32; 4]; 4] {
        let view = Matrix4::look_at_rh(&self.eye(), &self.target, &Vector3::y());
        let near = (self.distance - self.radius * 2.0).max(self.radius * 1e-3);
        let far = self.distance + self.radius * 2.0;
        let proj = Perspective3::new(aspect, self.fov, near, far);
        (opengl_to_wgpu() * proj.as_matrix() * view).into()
    }

    /// Rotate by the given angle deltas in radians.
    pub fn rotate(&mut self, delta_azimuth: f32, delta_elevation: f32) {
        self.azimuth += delta_azimuth;
        // Stay off the poles, where the up vector degenerates
        let limit = FRAC_PI_2 - 0.01;
        self.elevation = (self.elevation + delta_elevation).clamp(-limit, limit);
    }

    /// Scale the distance to the target.
    pub fn zoom(&mut self, factor: f32) {
        self.distance = (self.distance * factor).clamp(self.radius * 0.05, self.radius * 50.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_looks_at_center() {
        let mut camera = OrbitCamera::default();
        camera.fit(Point3::new(1.0, 2.0, 3.0), 2.0);

        assert!(((camera.eye() - Point3::new(1.0, 2.0, 3.0)).norm() - 5.0).abs() < 1e-5);
        let to_center = (Point3::new(1.0, 2.0, 3.0) - camera.eye()).normalize();
        assert!((camera.forward() - to_center).norm() < 1e-6);
    }

    #[test]
    fn test_target_projects_to_screen_center() {
        let mut camera = OrbitCamera::default();
        camera.fit(Point3::new(0.5, -1.0, 0.0), 1.0);
        camera.rotate(0.7, -0.2);

        let m = Matrix4::from(camera.view_projection(1.0));
        let clip = m * nalgebra::Vector4::new(0.5, -1.0, 0.0, 1.0);
        let ndc = clip.xyz() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_elevation_and_zoom_are_clamped() {
        let mut camera = OrbitCamera::default();
        camera.rotate(0.0, 10.0);
        assert!(camera.elevation < FRAC_PI_2);

        camera.zoom(1e-6);
        assert!((camera.distance - 0.05).abs() < 1e-6);
    }
}
