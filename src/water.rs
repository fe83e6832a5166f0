//! Procedurally displaced water surface
//!
//! Per-frame the surface elevation is a pure function of (x, z, time,
//! parameters): one large low-frequency swell plus several iterated smaller
//! sinusoids with growing frequency and decaying amplitude. The same function
//! shades the surface: color blends from depth color to surface color by
//! elevation, with a sun specular term on top.

use crate::display::PixelBuffer;
use crate::math3d::Vec3;
use crate::util::lerp_color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Frequency growth per small-wave iteration
const SMALL_FREQUENCY_GROWTH: f32 = 2.0;
/// Amplitude decay per small-wave iteration
const SMALL_AMPLITUDE_DECAY: f32 = 2.5;

/// Furthest shaded distance; beyond this the surface fades to the far color
const FAR_PLANE: f32 = 150.0;

#[derive(Debug, Error)]
pub enum WaveParamError {
    #[error("small wave iterations must be >= 1")]
    ZeroIterations,
    #[error("wave parameters must be finite")]
    NonFinite,
}

/// Tunable wave and coloring parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveParams {
    pub big_elevation: f32,
    pub big_frequency_x: f32,
    pub big_frequency_y: f32,
    pub big_speed: f32,
    pub small_elevation: f32,
    pub small_frequency: f32,
    pub small_speed: f32,
    pub small_iterations: u32,
    pub depth_color: (u8, u8, u8),
    pub surface_color: (u8, u8, u8),
    pub color_offset: f32,
    pub color_multiplier: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            big_elevation: 0.6,
            big_frequency_x: 4.0,
            big_frequency_y: 1.5,
            big_speed: 0.75,
            small_elevation: 0.25,
            small_frequency: 0.9,
            small_speed: 0.2,
            small_iterations: 3,
            depth_color: (10, 45, 75),
            surface_color: (115, 190, 230),
            color_offset: 0.5,
            color_multiplier: 0.7,
        }
    }
}

impl WaveParams {
    fn validate(&self) -> Result<(), WaveParamError> {
        if self.small_iterations == 0 {
            return Err(WaveParamError::ZeroIterations);
        }
        let values = [
            self.big_elevation,
            self.big_frequency_x,
            self.big_frequency_y,
            self.big_speed,
            self.small_elevation,
            self.small_frequency,
            self.small_speed,
            self.color_offset,
            self.color_multiplier,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(WaveParamError::NonFinite);
        }
        Ok(())
    }
}

/// Vertical displacement at (x, z) for time `t`.
///
/// Deterministic: no random component, so the same inputs always produce the
/// same bits. One big swell with independent spatial frequency per axis and a
/// time-driven phase, minus iterated small chop.
pub fn elevation(x: f32, z: f32, t: f32, params: &WaveParams) -> f32 {
    let mut e = params.big_elevation
        * (x / params.big_frequency_x).sin()
        * (z / params.big_frequency_y + t * params.big_speed).sin();

    let mut frequency = params.small_frequency;
    let mut amplitude = params.small_elevation;
    for _ in 0..params.small_iterations {
        let chop = ((x * frequency + t * params.small_speed).sin()
            * (z * frequency + t * params.small_speed).cos())
        .abs();
        e -= chop * amplitude;
        frequency *= SMALL_FREQUENCY_GROWTH;
        amplitude /= SMALL_AMPLITUDE_DECAY;
    }

    e
}

/// The single live water surface: parameters plus its running time
pub struct WaterSurface {
    params: WaveParams,
    /// Height of the plane below the camera (camera at y = 0)
    surface_y: f32,
    time: f32,
}

impl WaterSurface {
    pub fn new(params: WaveParams, surface_y: f32) -> Result<Self, WaveParamError> {
        params.validate()?;
        Ok(Self {
            params,
            surface_y,
            time: 0.0,
        })
    }

    pub fn params(&self) -> &WaveParams {
        &self.params
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Replace the parameters. Invalid values are rejected and the previous
    /// parameters stay in effect.
    pub fn set_params(&mut self, params: WaveParams) -> Result<(), WaveParamError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Advance the animation clock
    pub fn advance(&mut self, dt: f32) {
        if dt > 0.0 {
            self.time += dt;
        }
    }

    /// Elevation at (x, z) for the current time
    #[inline]
    pub fn elevation_at(&self, x: f32, z: f32) -> f32 {
        elevation(x, z, self.time, &self.params)
    }

    /// Surface normal from central differences of the elevation field
    fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        const EPS: f32 = 0.3;
        let dx = self.elevation_at(x - EPS, z) - self.elevation_at(x + EPS, z);
        let dz = self.elevation_at(x, z - EPS) - self.elevation_at(x, z + EPS);
        Vec3::new(dx, 2.0 * EPS, dz).normalize()
    }

    /// Render the surface into the lower half of the buffer.
    ///
    /// Screen rows below the horizon are mapped back onto the water plane
    /// (camera at origin looking down +Z), shaded by elevation and lit by
    /// `sun_direction` (unit vector toward the sun), then exposure mapped.
    pub fn render(
        &self,
        buffer: &mut PixelBuffer,
        sun_direction: Vec3,
        sun_color: (u8, u8, u8),
        exposure: f32,
        fov: f32,
    ) {
        let width = buffer.width() as i32;
        let height = buffer.height() as i32;
        let cx = width as f32 * 0.5;
        let cy = height as f32 * 0.5;
        let cam_height = -self.surface_y; // surface sits below the camera
        let tone = exposure * 2.0;

        let far_color = lerp_color(self.params.depth_color, self.params.surface_color, 0.35);

        for sy in (cy as i32 + 1)..height {
            let dy = sy as f32 - cy;
            let z = cam_height * fov / dy;

            if z > FAR_PLANE {
                // Too far to shade individually: flat haze band at the horizon
                buffer.hline_blend(0, width - 1, sy, far_color.0, far_color.1, far_color.2, 255);
                continue;
            }

            for sx in 0..width {
                let x = (sx as f32 - cx) * z / fov;
                let e = self.elevation_at(x, z);

                // Depth-to-surface blend driven by displacement
                let mix = ((e + self.params.color_offset) * self.params.color_multiplier)
                    .clamp(0.0, 1.0);
                let base = lerp_color(self.params.depth_color, self.params.surface_color, mix);

                // Lighting: cheap diffuse plus a Blinn specular streak
                let normal = self.normal_at(x, z);
                let diffuse = normal.dot(&sun_direction).max(0.0);

                let point = Vec3::new(x, self.surface_y + e, z);
                let to_eye = (-point).normalize();
                let half = (sun_direction + to_eye).normalize();
                let spec = normal.dot(&half).max(0.0).powi(48);

                let shade = 0.35 + 0.65 * diffuse;
                let lit = (
                    base.0 as f32 * shade + sun_color.0 as f32 * spec,
                    base.1 as f32 * shade + sun_color.1 as f32 * spec,
                    base.2 as f32 * shade + sun_color.2 as f32 * spec,
                );

                // Exposure tone mapping, same curve as the sky dome
                let r = (1.0 - (-lit.0 / 255.0 * tone).exp()) * 255.0;
                let g = (1.0 - (-lit.1 / 255.0 * tone).exp()) * 255.0;
                let b = (1.0 - (-lit.2 / 255.0 * tone).exp()) * 255.0;

                buffer.set_pixel(sx, sy, r as u8, g as u8, b as u8);
            }
        }
    }
}
