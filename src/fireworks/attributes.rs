//! Per-particle initial state generation
//!
//! Particles are scattered over the outer shell of a sphere: the distance is
//! biased into the outer 25% of the radius so the burst reads as a hollow
//! bloom instead of a filled ball.

use super::SpawnError;
use crate::math3d::Vec3;
use crate::util::Rng;
use std::f32::consts::{PI, TAU};

/// Parallel per-particle arrays for one burst. Immutable after creation.
pub struct BurstAttributes {
    /// Offset from the burst origin at full expansion
    pub offsets: Vec<Vec3>,
    /// Relative particle size in [0, 1)
    pub sizes: Vec<f32>,
    /// Per-particle animation speed, in [1, 2)
    pub time_multipliers: Vec<f32>,
}

impl BurstAttributes {
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Generate attributes for `count` particles within `radius`.
///
/// Pure given the RNG state: the same seeded `Rng` always produces the same
/// arrays. Buffer space is reserved fallibly so an allocation failure surfaces
/// as an error instead of aborting the frame loop.
pub fn generate_attributes(
    rng: &mut Rng,
    count: usize,
    radius: f32,
) -> Result<BurstAttributes, SpawnError> {
    if count == 0 {
        return Err(SpawnError::InvalidParameter("count must be > 0"));
    }
    if !(radius > 0.0) {
        return Err(SpawnError::InvalidParameter("radius must be > 0"));
    }

    let mut offsets = Vec::new();
    let mut sizes = Vec::new();
    let mut time_multipliers = Vec::new();
    offsets.try_reserve_exact(count)?;
    sizes.try_reserve_exact(count)?;
    time_multipliers.try_reserve_exact(count)?;

    for _ in 0..count {
        // Outer-shell bias: distance in [0.75R, R)
        let distance = radius * 0.75 + rng.next_f32() * radius * 0.25;
        let phi = rng.next_f32() * PI;
        let theta = rng.next_f32() * TAU;
        offsets.push(Vec3::from_spherical(distance, phi, theta));

        sizes.push(rng.next_f32());
        time_multipliers.push(1.0 + rng.next_f32());
    }

    Ok(BurstAttributes {
        offsets,
        sizes,
        time_multipliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_counts() {
        let mut rng = Rng::new(1);
        for n in [1usize, 7, 100, 1400] {
            let attrs = generate_attributes(&mut rng, n, 1.0).unwrap();
            assert_eq!(attrs.offsets.len(), n);
            assert_eq!(attrs.sizes.len(), n);
            assert_eq!(attrs.time_multipliers.len(), n);
        }
    }

    #[test]
    fn test_distances_within_shell() {
        let mut rng = Rng::new(2);
        let radius = 1.7;
        let attrs = generate_attributes(&mut rng, 500, radius).unwrap();
        for offset in &attrs.offsets {
            let d = offset.length();
            assert!(
                d >= radius * 0.75 - 1e-4 && d <= radius + 1e-4,
                "distance {} outside [{}, {}]",
                d,
                radius * 0.75,
                radius
            );
        }
    }

    #[test]
    fn test_size_and_multiplier_ranges() {
        let mut rng = Rng::new(3);
        let attrs = generate_attributes(&mut rng, 1000, 1.0).unwrap();
        for &s in &attrs.sizes {
            assert!((0.0..1.0).contains(&s));
        }
        for &m in &attrs.time_multipliers {
            assert!((1.0..2.0).contains(&m));
        }
    }

    #[test]
    fn test_reproducible_with_same_seed() {
        let mut a = Rng::new(0xBEEF);
        let mut b = Rng::new(0xBEEF);
        let x = generate_attributes(&mut a, 64, 1.2).unwrap();
        let y = generate_attributes(&mut b, 64, 1.2).unwrap();
        for i in 0..64 {
            assert!(x.offsets[i].approx_eq(&y.offsets[i], 0.0));
            assert_eq!(x.sizes[i], y.sizes[i]);
            assert_eq!(x.time_multipliers[i], y.time_multipliers[i]);
        }
    }

    #[test]
    fn test_rejects_zero_count() {
        let mut rng = Rng::new(4);
        assert!(matches!(
            generate_attributes(&mut rng, 0, 1.0),
            Err(SpawnError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_rejects_bad_radius() {
        let mut rng = Rng::new(5);
        assert!(generate_attributes(&mut rng, 10, 0.0).is_err());
        assert!(generate_attributes(&mut rng, 10, f32::NAN).is_err());
    }
}
