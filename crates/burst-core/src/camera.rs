//! Perspective camera shared by every burst.
//!
//! Resizing only changes the projection; particle positions live in world
//! space and are never reprojected.

use crate::constants::{CAMERA_FAR, CAMERA_FOV_DEGREES, CAMERA_NEAR, CAMERA_Z};
use glam::{Mat4, Vec3};

/// Right-handed camera looking down -Z at the burst origin.
#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, CAMERA_Z),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect,
            fovy_radians: CAMERA_FOV_DEGREES.to_radians(),
            znear: CAMERA_NEAR,
            zfar: CAMERA_FAR,
        }
    }

    /// Track a new output size. Zero sizes (minimised windows) are ignored.
    pub fn resize(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.aspect = (width / height) as f32;
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn origin_projects_to_screen_centre() {
        let cam = Camera::new(16.0 / 9.0);
        let clip = cam.projection_matrix() * cam.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-6);
        assert!((clip.y / clip.w).abs() < 1e-6);
    }

    #[test]
    fn resize_ignores_zero_sizes() {
        let mut cam = Camera::new(2.0);
        cam.resize(0.0, 600.0);
        assert_eq!(cam.aspect, 2.0);
        cam.resize(600.0, 600.0);
        assert_eq!(cam.aspect, 1.0);
    }
}
