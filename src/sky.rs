//! Parametric sky / atmosphere model
//!
//! A small parameter set (turbidity, rayleigh, mie, sun orientation,
//! exposure) drives a derived sun direction and a simplified scattering
//! gradient. Derived state is recomputed only when parameters change, never
//! per frame; rendering just reads the cached values.

use crate::display::PixelBuffer;
use crate::math3d::Vec3;
use crate::util::lerp_color;
use serde::{Deserialize, Serialize};

/// The six scattering/orientation parameters plus exposure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyParams {
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    /// Sun elevation above the horizon, degrees
    pub elevation: f32,
    /// Sun azimuth, degrees
    pub azimuth: f32,
    /// Tone mapping exposure, passed through to the output stage
    pub exposure: f32,
}

impl Default for SkyParams {
    fn default() -> Self {
        Self {
            turbidity: 10.0,
            rayleigh: 3.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.7,
            elevation: -2.3,
            azimuth: 180.0,
            exposure: 0.5,
        }
    }
}

/// Atmosphere state: parameters plus derived shading inputs
pub struct Atmosphere {
    params: SkyParams,
    sun_direction: Vec3,
    zenith_color: (u8, u8, u8),
    horizon_color: (u8, u8, u8),
    sun_color: (u8, u8, u8),
}

impl Atmosphere {
    pub fn new(params: SkyParams) -> Self {
        let mut atmosphere = Self {
            params,
            sun_direction: Vec3::zero(),
            zenith_color: (0, 0, 0),
            horizon_color: (0, 0, 0),
            sun_color: (0, 0, 0),
        };
        atmosphere.recompute();
        atmosphere
    }

    pub fn params(&self) -> SkyParams {
        self.params
    }

    /// Replace the parameters and recompute every derived value. This is the
    /// only place sun direction and sky colors change.
    pub fn set_params(&mut self, params: SkyParams) {
        self.params = params;
        self.recompute();
    }

    /// Unit vector pointing toward the sun; shared by the sky dome and the
    /// water surface lighting.
    pub fn sun_direction(&self) -> Vec3 {
        self.sun_direction
    }

    /// Exposure pass-through for the tone mapping stage
    pub fn exposure(&self) -> f32 {
        self.params.exposure
    }

    /// Sun tint used by specular reflections on the water
    pub fn sun_color(&self) -> (u8, u8, u8) {
        self.sun_color
    }

    fn recompute(&mut self) {
        // Spherical to Cartesian: polar angle measured from +Y,
        // 90 deg elevation = straight up
        let phi = (90.0 - self.params.elevation).to_radians();
        let theta = self.params.azimuth.to_radians();
        self.sun_direction = Vec3::from_spherical(1.0, phi, theta);

        // Simplified scattering: blend night and day palettes by sun height,
        // weight the zenith by the rayleigh coefficient and whiten the
        // horizon with turbidity
        let sun_h = self.sun_direction.y;
        let daylight = ((sun_h + 0.12) / 1.12).clamp(0.0, 1.0).powf(0.6);

        let rayleigh_k = (self.params.rayleigh / 4.0).clamp(0.0, 1.0);
        let night_zenith = (6, 9, 22);
        let day_zenith = (
            (30.0 + 40.0 * rayleigh_k) as u8,
            (70.0 + 60.0 * rayleigh_k) as u8,
            (140.0 + 80.0 * rayleigh_k) as u8,
        );
        self.zenith_color = lerp_color(night_zenith, day_zenith, daylight);

        let haze = (self.params.turbidity / 20.0).clamp(0.0, 1.0);
        let night_horizon = lerp_color((20, 16, 30), (45, 35, 40), haze);
        let day_horizon = lerp_color((130, 170, 215), (200, 195, 185), haze);
        self.horizon_color = lerp_color(night_horizon, day_horizon, daylight);

        // Low sun goes orange, high sun stays white
        let warmth = (1.0 - sun_h.max(0.0)).powi(2);
        self.sun_color = (
            255,
            (235.0 - 90.0 * warmth) as u8,
            (220.0 - 160.0 * warmth) as u8,
        );
    }

    /// Henyey-Greenstein phase function for the mie glow around the sun
    #[inline]
    fn mie_phase(&self, cos_angle: f32) -> f32 {
        let g = self.params.mie_directional_g;
        let g2 = g * g;
        (1.0 - g2) / (4.0 * std::f32::consts::PI * (1.0 + g2 - 2.0 * g * cos_angle).powf(1.5))
    }

    /// Render the sky dome into the upper half of the buffer.
    ///
    /// Camera at origin looking down +Z; `fov` is the projection plane
    /// distance in pixels. Everything below the horizon row is left for the
    /// water pass.
    pub fn render(&self, buffer: &mut PixelBuffer, fov: f32) {
        let width = buffer.width() as i32;
        let height = buffer.height() as i32;
        let cx = width as f32 * 0.5;
        let cy = height as f32 * 0.5;
        let horizon_row = (cy as i32).min(height - 1);

        // Mie glow strength; coefficient is tiny by convention so scale up
        let mie_k = self.params.mie_coefficient * 4000.0;
        let tone = self.params.exposure * 2.0;

        for sy in 0..=horizon_row {
            for sx in 0..width {
                let dir = Vec3::new(sx as f32 - cx, cy - sy as f32, fov).normalize();

                // Zenith-to-horizon gradient by view elevation
                let up = dir.y.clamp(0.0, 1.0).powf(0.45);
                let base = lerp_color(self.horizon_color, self.zenith_color, up);

                let cos_sun = dir.dot(&self.sun_direction);
                let glow = self.mie_phase(cos_sun) * mie_k;

                // Visible sun disc
                let disc = if cos_sun > 0.9998 { 255.0 } else { 0.0 };

                let r = base.0 as f32 + self.sun_color.0 as f32 * glow * 0.01 + disc;
                let g = base.1 as f32 + self.sun_color.1 as f32 * glow * 0.01 + disc;
                let b = base.2 as f32 + self.sun_color.2 as f32 * glow * 0.01 + disc;

                // Exposure tone mapping (shared curve with the water pass)
                let r = (1.0 - (-r / 255.0 * tone).exp()) * 255.0;
                let g = (1.0 - (-g / 255.0 * tone).exp()) * 255.0;
                let b = (1.0 - (-b / 255.0 * tone).exp()) * 255.0;

                buffer.set_pixel(sx, sy, r as u8, g as u8, b as u8);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn atmosphere_with(elevation: f32, azimuth: f32) -> Atmosphere {
        Atmosphere::new(SkyParams {
            elevation,
            azimuth,
            ..SkyParams::default()
        })
    }

    #[test]
    fn test_sun_direction_at_zero_zero() {
        let sun = atmosphere_with(0.0, 0.0).sun_direction();
        let expected = Vec3::new((PI / 2.0).sin(), (PI / 2.0).cos(), 0.0);
        assert!(sun.approx_eq(&expected, 1e-6), "{:?} != {:?}", sun, expected);
    }

    #[test]
    fn test_sun_direction_at_known_angles() {
        // Straight up
        let sun = atmosphere_with(90.0, 0.0).sun_direction();
        assert!(sun.approx_eq(&Vec3::new(0.0, 1.0, 0.0), 1e-6));

        // Azimuth 180 flips x
        let sun = atmosphere_with(0.0, 180.0).sun_direction();
        assert!(sun.approx_eq(&Vec3::new(-1.0, 0.0, 0.0), 1e-5));

        // Azimuth 90 points along +Z
        let sun = atmosphere_with(0.0, 90.0).sun_direction();
        assert!(sun.approx_eq(&Vec3::new(0.0, 0.0, 1.0), 1e-5));
    }

    #[test]
    fn test_sun_direction_unit_length() {
        for elevation in [-3.0, 0.0, 12.5, 45.0, 90.0] {
            for azimuth in [-180.0, -90.0, 0.0, 90.0, 180.0] {
                let sun = atmosphere_with(elevation, azimuth).sun_direction();
                assert!((sun.length() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_set_params_recomputes_sun() {
        let mut atmosphere = atmosphere_with(0.0, 0.0);
        let before = atmosphere.sun_direction();
        let mut params = atmosphere.params();
        params.elevation = 45.0;
        atmosphere.set_params(params);
        let after = atmosphere.sun_direction();
        assert!(!before.approx_eq(&after, 1e-3));
        assert!(after.y > 0.5);
    }

    #[test]
    fn test_exposure_pass_through() {
        let mut atmosphere = atmosphere_with(0.0, 0.0);
        let mut params = atmosphere.params();
        params.exposure = 0.85;
        atmosphere.set_params(params);
        assert_eq!(atmosphere.exposure(), 0.85);
    }

    #[test]
    fn test_daylight_brightens_zenith() {
        let night = atmosphere_with(-2.3, 180.0);
        let day = atmosphere_with(60.0, 180.0);
        assert!(day.zenith_color.2 > night.zenith_color.2);
    }

    #[test]
    fn test_mie_phase_peaks_forward() {
        let atmosphere = atmosphere_with(0.0, 0.0);
        assert!(atmosphere.mie_phase(1.0) > atmosphere.mie_phase(0.0));
        assert!(atmosphere.mie_phase(0.0) > atmosphere.mie_phase(-1.0));
    }
}
