//! 3D Math Utilities
//!
//! Provides basic 3D vector operations, spherical coordinates, and
//! perspective projection for the scene renderer.

use std::ops::{Add, Mul, Neg, Sub};

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Build a point from spherical coordinates.
    ///
    /// - `radius`: distance from origin
    /// - `phi`: polar angle from the +Y axis (radians)
    /// - `theta`: azimuthal angle in the XZ plane (radians)
    ///
    /// Convention: x = r·sinφ·cosθ, y = r·cosφ, z = r·sinφ·sinθ,
    /// so θ = 0 lands in the XY plane.
    #[inline]
    pub fn from_spherical(radius: f32, phi: f32, theta: f32) -> Self {
        let sin_phi = phi.sin();
        Self {
            x: radius * sin_phi * theta.cos(),
            y: radius * phi.cos(),
            z: radius * sin_phi * theta.sin(),
        }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    #[inline]
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
            }
        } else {
            *self
        }
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Approximate equality check for floating point comparison
    #[inline]
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon
            && (self.y - other.y).abs() < epsilon
            && (self.z - other.z).abs() < epsilon
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

/// Project a 3D point to 2D screen coordinates
///
/// - `point`: The 3D point to project (camera at origin looking down +Z)
/// - `fov`: Field of view (distance from eye to projection plane)
/// - `cx`, `cy`: Screen center coordinates
///
/// Returns (screen_x, screen_y) or None if point is behind camera
#[inline]
pub fn project(point: Vec3, fov: f32, cx: f32, cy: f32) -> Option<(f32, f32)> {
    if point.z <= 0.0 {
        return None;
    }
    let scale = fov / point.z;
    Some((cx + point.x * scale, cy - point.y * scale))
}

/// Project a 3D point, returning proximity factor for brightness/size scaling
///
/// Returns (screen_x, screen_y, proximity) where proximity is 0.0-1.0
/// (1.0 = closest to camera, 0.0 = at max_z distance)
#[inline]
pub fn project_with_depth(
    point: Vec3,
    fov: f32,
    cx: f32,
    cy: f32,
    max_z: f32,
) -> Option<(f32, f32, f32)> {
    if point.z <= 0.0 {
        return None;
    }
    let scale = fov / point.z;
    let proximity = 1.0 - (point.z / max_z).min(1.0);
    Some((cx + point.x * scale, cy - point.y * scale, proximity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_from_spherical_axes() {
        // Polar angle 0 = straight up (+Y)
        let up = Vec3::from_spherical(1.0, 0.0, 0.0);
        assert!(up.approx_eq(&Vec3::new(0.0, 1.0, 0.0), 1e-6));

        // Polar PI/2, azimuth 0 = +X
        let fwd = Vec3::from_spherical(1.0, PI / 2.0, 0.0);
        assert!(fwd.approx_eq(&Vec3::new(1.0, 0.0, 0.0), 1e-6));

        // Polar PI/2, azimuth PI/2 = +Z
        let side = Vec3::from_spherical(1.0, PI / 2.0, PI / 2.0);
        assert!(side.approx_eq(&Vec3::new(0.0, 0.0, 1.0), 1e-6));
    }

    #[test]
    fn test_from_spherical_unit_length() {
        for i in 0..16 {
            let phi = i as f32 * 0.2;
            let theta = i as f32 * 0.5;
            let v = Vec3::from_spherical(1.0, phi, theta);
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_project_behind_camera() {
        assert!(project(Vec3::new(0.0, 0.0, -1.0), 256.0, 320.0, 240.0).is_none());
        assert!(project(Vec3::new(0.0, 0.0, 0.0), 256.0, 320.0, 240.0).is_none());
    }

    #[test]
    fn test_project_center() {
        let (sx, sy) = project(Vec3::new(0.0, 0.0, 10.0), 256.0, 320.0, 240.0).unwrap();
        assert_eq!((sx, sy), (320.0, 240.0));
    }

    #[test]
    fn test_project_depth_scaling() {
        // Same world offset shrinks with distance
        let (near_x, _, near_p) =
            project_with_depth(Vec3::new(1.0, 0.0, 5.0), 256.0, 0.0, 0.0, 100.0).unwrap();
        let (far_x, _, far_p) =
            project_with_depth(Vec3::new(1.0, 0.0, 50.0), 256.0, 0.0, 0.0, 100.0).unwrap();
        assert!(near_x > far_x);
        assert!(near_p > far_p);
    }
}
