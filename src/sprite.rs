//! Point-sprite palette for the firework particles
//!
//! Provides a fixed set of eight procedurally generated alpha stamps.
//! Bursts pick one by uniform random index and stamp it additively at
//! every projected particle position.

use crate::display::PixelBuffer;
use crate::util::Rng;

/// Number of sprites in the fixed palette
pub const SPRITE_COUNT: usize = 8;

/// Texel resolution of each stamp (square)
const STAMP_SIZE: u32 = 32;

/// A single-channel alpha stamp
#[derive(Clone)]
pub struct Sprite {
    size: u32,
    alpha: Vec<u8>,
}

impl Sprite {
    fn from_fn(mut f: impl FnMut(f32, f32) -> f32) -> Self {
        let size = STAMP_SIZE;
        let mut alpha = Vec::with_capacity((size * size) as usize);
        let half = size as f32 * 0.5;
        for y in 0..size {
            for x in 0..size {
                // Texel center in [-1, 1] stamp space
                let sx = (x as f32 + 0.5 - half) / half;
                let sy = (y as f32 + 0.5 - half) / half;
                let a = f(sx, sy).clamp(0.0, 1.0);
                alpha.push((a * 255.0) as u8);
            }
        }
        Self { size, alpha }
    }

    #[inline]
    fn sample(&self, sx: f32, sy: f32) -> u8 {
        // Nearest-neighbor in stamp space [-1, 1]
        let half = self.size as f32 * 0.5;
        let tx = ((sx + 1.0) * half) as i32;
        let ty = ((sy + 1.0) * half) as i32;
        if tx < 0 || ty < 0 || tx >= self.size as i32 || ty >= self.size as i32 {
            return 0;
        }
        self.alpha[(ty as u32 * self.size + tx as u32) as usize]
    }

    /// Stamp the sprite additively, tinted and scaled by intensity (0-1).
    /// `radius_px` is the on-screen half-extent in pixels.
    pub fn stamp_additive(
        &self,
        buffer: &mut PixelBuffer,
        cx: i32,
        cy: i32,
        radius_px: i32,
        color: (u8, u8, u8),
        intensity: f32,
    ) {
        if radius_px <= 0 || intensity <= 0.0 {
            return;
        }
        let intensity = intensity.min(1.0);
        let inv = 1.0 / radius_px as f32;
        for dy in -radius_px..=radius_px {
            for dx in -radius_px..=radius_px {
                let a = self.sample(dx as f32 * inv, dy as f32 * inv);
                if a == 0 {
                    continue;
                }
                let k = a as f32 / 255.0 * intensity;
                buffer.blend_pixel_additive(
                    cx + dx,
                    cy + dy,
                    (color.0 as f32 * k) as u8,
                    (color.1 as f32 * k) as u8,
                    (color.2 as f32 * k) as u8,
                );
            }
        }
    }
}

/// The fixed eight-entry sprite store
pub struct SpritePalette {
    sprites: Vec<Sprite>,
}

impl SpritePalette {
    pub fn new() -> Self {
        // Deterministic seed so the speckle stamp is identical every run
        let mut rng = Rng::new(0x51AB);

        let sprites = vec![
            // 0: soft disc
            Sprite::from_fn(|x, y| {
                let d = (x * x + y * y).sqrt();
                (1.0 - d).max(0.0).powi(2)
            }),
            // 1: hard disc with bright core
            Sprite::from_fn(|x, y| {
                let d = (x * x + y * y).sqrt();
                if d < 0.35 {
                    1.0
                } else {
                    ((0.9 - d) / 0.55).max(0.0)
                }
            }),
            // 2: ring
            Sprite::from_fn(|x, y| {
                let d = (x * x + y * y).sqrt();
                (1.0 - ((d - 0.6).abs() * 4.0)).max(0.0)
            }),
            // 3: four-point star
            Sprite::from_fn(|x, y| {
                let d = x.abs() + y.abs();
                (1.0 - d).max(0.0).powi(3) + (1.0 - (x * x + y * y).sqrt() * 3.0).max(0.0)
            }),
            // 4: six-spike sparkle
            Sprite::from_fn(|x, y| {
                let d = (x * x + y * y).sqrt();
                if d < 1e-3 {
                    return 1.0;
                }
                let angle = y.atan2(x);
                let spikes = (angle * 3.0).cos().abs().powi(8);
                ((1.0 - d) * (0.3 + 0.7 * spikes)).max(0.0)
            }),
            // 5: horizontal streak
            Sprite::from_fn(|x, y| {
                let falloff = (1.0 - x.abs()).max(0.0);
                let band = (1.0 - (y * 4.0).abs()).max(0.0);
                falloff * band
            }),
            // 6: speckle cluster
            {
                let mut dots = Vec::new();
                for _ in 0..9 {
                    let dx = rng.range_f32(-0.6, 0.6);
                    let dy = rng.range_f32(-0.6, 0.6);
                    dots.push((dx, dy));
                }
                Sprite::from_fn(move |x, y| {
                    let mut a: f32 = 0.0;
                    for &(dx, dy) in &dots {
                        let d = ((x - dx).powi(2) + (y - dy).powi(2)).sqrt();
                        a = a.max((1.0 - d * 3.5).max(0.0));
                    }
                    a
                })
            },
            // 7: bright core with wide halo (the classic firework point)
            Sprite::from_fn(|x, y| {
                let d = (x * x + y * y).sqrt();
                let core = (1.0 - d * 4.0).max(0.0);
                let halo = (1.0 - d).max(0.0).powi(2) * 0.5;
                core + halo
            }),
        ];

        Self { sprites }
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Fetch a sprite by palette index (wraps, so any index is valid)
    pub fn get(&self, index: usize) -> &Sprite {
        &self.sprites[index % self.sprites.len()]
    }
}

impl Default for SpritePalette {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_has_eight_entries() {
        let palette = SpritePalette::new();
        assert_eq!(palette.len(), SPRITE_COUNT);
    }

    #[test]
    fn test_soft_disc_falls_off() {
        let palette = SpritePalette::new();
        let disc = palette.get(0);
        assert!(disc.sample(0.0, 0.0) > disc.sample(0.7, 0.0));
        assert_eq!(disc.sample(1.5, 1.5), 0);
    }

    #[test]
    fn test_palette_deterministic() {
        let a = SpritePalette::new();
        let b = SpritePalette::new();
        for i in 0..SPRITE_COUNT {
            assert_eq!(a.get(i).alpha, b.get(i).alpha, "sprite {} differs", i);
        }
    }

    #[test]
    fn test_stamp_writes_inside_radius_only() {
        let palette = SpritePalette::new();
        let mut buf = PixelBuffer::with_size(32, 32);
        buf.clear(0, 0, 0);
        palette.get(0).stamp_additive(&mut buf, 16, 16, 4, (255, 255, 255), 1.0);
        let (r, _, _) = buf.get_pixel(16, 16).unwrap();
        assert!(r > 0);
        assert_eq!(buf.get_pixel(16, 25), Some((0, 0, 0)));
    }
}
