//! One firework burst: attribute buffers plus a shared animation progress
//!
//! Lifecycle is Spawning -> Animating -> Disposed. Spawning happens entirely
//! inside `new` (attributes generated, buffers filled, burst handed to the
//! active set), so a constructed burst is already animating. Disposal consumes
//! the burst, which makes a second dispose unrepresentable.

use super::attributes::BurstAttributes;
use super::scheduler::SpawnRequest;
use crate::display::PixelBuffer;
use crate::math3d::{project_with_depth, Vec3};
use crate::sprite::SpritePalette;

/// Animation duration in seconds; progress runs 0 -> 1 linearly over this
pub const BURST_DURATION: f32 = 3.0;

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstState {
    Animating,
    Finished,
}

pub struct Burst {
    id: u64,
    origin: Vec3,
    attributes: BurstAttributes,
    color: (u8, u8, u8),
    base_size: f32,
    radius: f32,
    sprite_index: usize,
    spawned_at: f32,
    progress: f32,
}

impl Burst {
    pub(super) fn new(
        id: u64,
        request: &SpawnRequest,
        attributes: BurstAttributes,
        spawned_at: f32,
    ) -> Self {
        Self {
            id,
            origin: request.origin,
            attributes,
            color: request.color,
            base_size: request.base_size,
            radius: request.radius,
            sprite_index: request.sprite_index,
            spawned_at,
            progress: 0.0,
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn color(&self) -> (u8, u8, u8) {
        self.color
    }

    #[inline]
    pub fn sprite_index(&self) -> usize {
        self.sprite_index
    }

    #[inline]
    pub fn spawned_at(&self) -> f32 {
        self.spawned_at
    }

    #[inline]
    pub fn particle_count(&self) -> usize {
        self.attributes.len()
    }

    /// Shared animation progress in [0, 1]
    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    #[inline]
    pub fn state(&self) -> BurstState {
        if self.progress >= 1.0 {
            BurstState::Finished
        } else {
            BurstState::Animating
        }
    }

    /// Advance the linear progress animation. Clamps at exactly 1.0.
    pub fn advance(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.progress = (self.progress + dt / BURST_DURATION).min(1.0);
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.progress >= 1.0
    }

    /// Release the burst. Consumes self: the particle buffers are dropped and
    /// no further mutation or second dispose is possible. Returns the id for
    /// logging.
    pub fn dispose(self) -> u64 {
        self.id
    }

    /// Render every particle into the buffer.
    ///
    /// The camera sits at the origin looking down +Z; `fov` is the projection
    /// plane distance in pixels and (`cx`, `cy`) the screen center. Shading
    /// consumes the shared progress and the per-particle time multiplier
    /// exactly as generated.
    pub fn render(
        &self,
        buffer: &mut PixelBuffer,
        palette: &SpritePalette,
        fov: f32,
        cx: f32,
        cy: f32,
    ) {
        let sprite = palette.get(self.sprite_index);

        for i in 0..self.attributes.len() {
            let m = self.attributes.time_multipliers[i];
            // Per-particle time: faster particles finish early and hold at 1
            let t = (self.progress * m).min(1.0);

            // Explosion: out-cubic expansion over the first 10% of the life
            let explode = {
                let k = (t / 0.1).min(1.0);
                1.0 - (1.0 - k) * (1.0 - k) * (1.0 - k)
            };

            // Gravity droop once the shell has opened
            let fall = {
                let k = ((t - 0.1) / 0.9).clamp(0.0, 1.0);
                k * k * self.radius * 0.4
            };

            // Size opens quickly, then closes toward the end of the life
            let open = (t / 0.125).min(1.0);
            let close = 1.0 - ((t - 0.125) / 0.875).clamp(0.0, 1.0);
            let size_scale = open * close;
            if size_scale <= 0.0 {
                continue;
            }

            // Twinkle in the tail of the animation
            let twinkle = if t > 0.2 {
                0.75 + 0.25 * (t * 30.0 * m).sin()
            } else {
                1.0
            };

            let offset = self.attributes.offsets[i] * explode;
            let world = Vec3::new(
                self.origin.x + offset.x,
                self.origin.y + offset.y - fall,
                self.origin.z + offset.z,
            );

            let Some((sx, sy, _proximity)) = project_with_depth(world, fov, cx, cy, 200.0)
            else {
                continue;
            };

            // World-space particle radius projected to pixels
            let world_radius = self.base_size * (0.4 + 0.6 * self.attributes.sizes[i]) * size_scale;
            let radius_px = (world_radius * fov / world.z).round() as i32;
            if radius_px < 1 {
                // Sub-pixel particles still contribute a dim spark
                let k = size_scale * twinkle * 0.6;
                buffer.blend_pixel_additive(
                    sx as i32,
                    sy as i32,
                    (self.color.0 as f32 * k) as u8,
                    (self.color.1 as f32 * k) as u8,
                    (self.color.2 as f32 * k) as u8,
                );
                continue;
            }

            sprite.stamp_additive(
                buffer,
                sx as i32,
                sy as i32,
                radius_px.min(24),
                self.color,
                close * twinkle,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fireworks::attributes::generate_attributes;
    use crate::util::Rng;

    fn test_burst(count: usize) -> Burst {
        let mut rng = Rng::new(42);
        let request = SpawnRequest {
            count,
            origin: Vec3::new(0.0, 0.0, 40.0),
            base_size: 0.15,
            radius: 1.0,
            sprite_index: 7,
            color: (138, 255, 255),
        };
        let attrs = generate_attributes(&mut rng, count, request.radius).unwrap();
        Burst::new(1, &request, attrs, 0.0)
    }

    #[test]
    fn test_progress_monotonic_and_clamped() {
        let mut burst = test_burst(16);
        let mut rng = Rng::new(9);
        let mut last = 0.0;
        for _ in 0..200 {
            burst.advance(rng.range_f32(0.0, 0.1));
            let p = burst.progress();
            assert!(p >= last, "progress went backwards");
            assert!(p <= 1.0, "progress exceeded 1");
            last = p;
        }
    }

    #[test]
    fn test_progress_reaches_exactly_one() {
        let mut burst = test_burst(4);
        burst.advance(BURST_DURATION * 2.0);
        assert_eq!(burst.progress(), 1.0);
        assert!(burst.is_finished());
        assert_eq!(burst.state(), BurstState::Finished);
    }

    #[test]
    fn test_duration_boundary() {
        let mut burst = test_burst(4);
        burst.advance(BURST_DURATION - 0.01);
        assert!(!burst.is_finished());
        burst.advance(0.01);
        assert_eq!(burst.progress(), 1.0);
    }

    #[test]
    fn test_negative_dt_ignored() {
        let mut burst = test_burst(4);
        burst.advance(1.0);
        let p = burst.progress();
        burst.advance(-5.0);
        assert_eq!(burst.progress(), p);
    }

    #[test]
    fn test_dispose_returns_id() {
        let burst = test_burst(4);
        assert_eq!(burst.dispose(), 1);
        // `burst` is moved: a second dispose does not compile
    }

    #[test]
    fn test_render_smoke() {
        let palette = SpritePalette::new();
        let mut buffer = PixelBuffer::with_size(64, 64);
        buffer.clear(0, 0, 0);
        let mut burst = test_burst(200);
        burst.advance(0.5);
        burst.render(&mut buffer, &palette, 64.0, 32.0, 32.0);
        // Something must have been drawn near the center
        let mut lit = 0;
        for y in 0..64 {
            for x in 0..64 {
                if buffer.get_pixel(x, y) != Some((0, 0, 0)) {
                    lit += 1;
                }
            }
        }
        assert!(lit > 0);
    }
}
