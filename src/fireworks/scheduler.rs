//! Burst spawn scheduling
//!
//! Bursts come from two sources sharing one creation contract: on-demand
//! pointer clicks mapped into the scene, and autonomous spawns driven by two
//! concurrent timer cadences (one fixed-period, one self-rescheduling with
//! jitter). Both cadences run at the same time; a tick may fire both and
//! enqueue two independent bursts.

use super::attributes::generate_attributes;
use super::burst::Burst;
use super::SpawnError;
use crate::math3d::Vec3;
use crate::sprite::SPRITE_COUNT;
use crate::util::{hsl_to_rgb, Rng};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Fixed autonomous cadence period in seconds
pub const AUTO_PERIOD: f32 = 2.0;
/// Maximum uniform jitter applied to the self-rescheduling cadence
pub const AUTO_JITTER: f32 = 2.5;
/// The jittered delay distribution can go negative; clamp here instead
const MIN_DELAY: f32 = 0.1;

/// The burst creation contract shared by every trigger source
#[derive(Debug, Clone, Copy)]
pub struct SpawnRequest {
    pub count: usize,
    pub origin: Vec3,
    pub base_size: f32,
    pub radius: f32,
    pub sprite_index: usize,
    pub color: (u8, u8, u8),
}

/// Tunable spawn bounds, editable from the config file and control channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstTuning {
    /// Minimum particle count per burst
    pub count_min: u32,
    /// Uniform span added on top of `count_min`
    pub count_span: u32,
    /// Depth at which click bursts appear (camera looks down +Z)
    pub click_depth: f32,
    /// Horizontal/vertical world extent the click plane maps onto
    pub click_extent: f32,
    /// Autonomous origin bounds: horizontal +-, vertical 0..max, depth +- jitter
    pub auto_horizontal: f32,
    pub auto_vertical: f32,
    pub auto_depth: f32,
    pub auto_depth_jitter: f32,
}

impl Default for BurstTuning {
    fn default() -> Self {
        Self {
            count_min: 400,
            count_span: 1000,
            click_depth: 40.0,
            click_extent: 10.0,
            auto_horizontal: 10.0,
            auto_vertical: 8.0,
            auto_depth: 40.0,
            auto_depth_jitter: 5.0,
        }
    }
}

impl BurstTuning {
    fn validate(&self) -> Result<(), SpawnError> {
        if self.count_min == 0 {
            return Err(SpawnError::InvalidParameter("count_min must be > 0"));
        }
        if !(self.click_extent > 0.0) || !(self.click_depth > 0.0) {
            return Err(SpawnError::InvalidParameter(
                "click bounds must be positive",
            ));
        }
        Ok(())
    }
}

/// Owns the active-burst set and both spawn trigger sources
pub struct BurstScheduler {
    bursts: Vec<Burst>,
    next_id: u64,
    rng: Rng,
    clock: f32,
    tuning: BurstTuning,
    /// Countdown for the fixed-period cadence
    fixed_timer: f32,
    /// Countdown for the jittered self-rescheduling cadence
    jitter_timer: f32,
}

impl BurstScheduler {
    pub fn new(seed: u64, tuning: BurstTuning) -> Self {
        let mut rng = Rng::new(seed);
        let jitter_timer = (AUTO_PERIOD + (rng.next_f32() * 2.0 - 1.0) * AUTO_JITTER).max(MIN_DELAY);
        Self {
            bursts: Vec::new(),
            next_id: 0,
            rng,
            clock: 0.0,
            tuning,
            fixed_timer: AUTO_PERIOD,
            jitter_timer,
        }
    }

    pub fn tuning(&self) -> &BurstTuning {
        &self.tuning
    }

    /// Replace the tuning. Invalid values are rejected and the previous
    /// tuning stays in effect.
    pub fn set_tuning(&mut self, tuning: BurstTuning) -> Result<(), SpawnError> {
        tuning.validate()?;
        self.tuning = tuning;
        Ok(())
    }

    pub fn active_count(&self) -> usize {
        self.bursts.len()
    }

    pub fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    /// Spawn a burst from an explicit request. Validates at this boundary;
    /// on any error the active set is left untouched.
    pub fn spawn(&mut self, request: SpawnRequest) -> Result<u64, SpawnError> {
        if !(request.base_size > 0.0) {
            return Err(SpawnError::InvalidParameter("base_size must be > 0"));
        }
        if !request.origin.is_finite() {
            return Err(SpawnError::InvalidParameter("origin must be finite"));
        }

        let attributes = generate_attributes(&mut self.rng, request.count, request.radius)?;

        let id = self.next_id;
        self.next_id += 1;
        let burst = Burst::new(id, &request, attributes, self.clock);
        debug!(
            "burst {} spawned: {} particles at ({:.1}, {:.1}, {:.1})",
            id, request.count, request.origin.x, request.origin.y, request.origin.z
        );
        self.bursts.push(burst);
        Ok(id)
    }

    /// On-demand trigger: a pointer click in normalized [0,1] screen
    /// coordinates, mapped onto a fixed-depth plane scaled to the configured
    /// extent.
    pub fn spawn_at_screen(&mut self, norm_x: f32, norm_y: f32) -> Result<u64, SpawnError> {
        let extent = self.tuning.click_extent;
        let origin = Vec3::new(
            (norm_x - 0.5) * 2.0 * extent,
            (0.5 - norm_y) * extent,
            self.tuning.click_depth,
        );
        let request = self.random_request(origin);
        self.spawn(request)
    }

    /// Autonomous trigger: same distribution as clicks, origin randomized
    /// within the configured volume.
    pub fn spawn_autonomous(&mut self) -> Result<u64, SpawnError> {
        let t = &self.tuning;
        let origin = Vec3::new(
            self.rng.range_f32(-t.auto_horizontal, t.auto_horizontal),
            self.rng.range_f32(0.0, t.auto_vertical),
            t.auto_depth + self.rng.range_f32(-t.auto_depth_jitter, t.auto_depth_jitter),
        );
        let request = self.random_request(origin);
        self.spawn(request)
    }

    /// Draw count/radius/size/color/sprite from the shared distribution
    fn random_request(&mut self, origin: Vec3) -> SpawnRequest {
        let count = (self.tuning.count_min as f32
            + self.rng.next_f32() * self.tuning.count_span as f32)
            .round() as usize;
        let radius = 0.7 + self.rng.next_f32();
        let base_size = 0.1 + self.rng.next_f32() * 0.1;
        let color = hsl_to_rgb(self.rng.next_f32(), 1.0, 0.7);
        let sprite_index = self.rng.index(SPRITE_COUNT);
        SpawnRequest {
            count,
            origin,
            base_size,
            radius,
            sprite_index,
            color,
        }
    }

    /// Advance one frame: animate and retire active bursts, then let both
    /// autonomous cadences fire. Returns the number of bursts retired.
    ///
    /// Mutation of the active set only happens here and in the spawn calls,
    /// always between renders, so iteration is never invalidated mid-frame.
    pub fn update(&mut self, dt: f32) -> usize {
        self.clock += dt;

        for burst in &mut self.bursts {
            burst.advance(dt);
        }

        // Retire with swap_remove; dispose consumes the burst so a second
        // dispose of the same burst cannot happen
        let mut retired = 0;
        let mut i = 0;
        while i < self.bursts.len() {
            if self.bursts[i].is_finished() {
                let burst = self.bursts.swap_remove(i);
                let age = self.clock - burst.spawned_at();
                debug!("burst {} retired after {:.2}s", burst.dispose(), age);
                retired += 1;
            } else {
                i += 1;
            }
        }

        // Both cadences tick independently and may fire in the same frame
        self.fixed_timer -= dt;
        while self.fixed_timer <= 0.0 {
            if let Err(e) = self.spawn_autonomous() {
                warn!("autonomous spawn failed: {}", e);
            }
            self.fixed_timer += AUTO_PERIOD;
        }

        self.jitter_timer -= dt;
        while self.jitter_timer <= 0.0 {
            if let Err(e) = self.spawn_autonomous() {
                warn!("autonomous spawn failed: {}", e);
            }
            self.jitter_timer += self.next_jitter_delay();
        }

        retired
    }

    fn next_jitter_delay(&mut self) -> f32 {
        (AUTO_PERIOD + (self.rng.next_f32() * 2.0 - 1.0) * AUTO_JITTER).max(MIN_DELAY)
    }

    /// Teardown: dispose every active burst immediately. Because completion
    /// is checked against the set (not a detached callback), dropping a burst
    /// here also cancels its pending completion.
    pub fn clear(&mut self) {
        for burst in self.bursts.drain(..) {
            debug!("burst {} disposed on teardown", burst.dispose());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fireworks::BURST_DURATION;
    use std::collections::HashSet;

    fn quiet_scheduler(seed: u64) -> BurstScheduler {
        let mut scheduler = BurstScheduler::new(seed, BurstTuning::default());
        // Park both autonomous cadences so tests control spawning
        scheduler.fixed_timer = f32::INFINITY;
        scheduler.jitter_timer = f32::INFINITY;
        scheduler
    }

    #[test]
    fn test_on_demand_spawn_and_retire() {
        let mut scheduler = quiet_scheduler(1);
        let request = SpawnRequest {
            count: 100,
            origin: Vec3::zero(),
            base_size: 0.5,
            radius: 1.0,
            sprite_index: 7,
            color: (138, 255, 255),
        };
        scheduler.spawn(request).unwrap();
        assert_eq!(scheduler.active_count(), 1);
        let burst = &scheduler.bursts()[0];
        assert_eq!(burst.particle_count(), 100);
        assert_eq!(burst.color(), (138, 255, 255));

        // Exactly the animation duration later the set shrinks by one
        let before = scheduler.active_count();
        scheduler.update(BURST_DURATION / 2.0);
        assert_eq!(scheduler.active_count(), before);
        let retired = scheduler.update(BURST_DURATION / 2.0);
        assert_eq!(retired, 1);
        assert_eq!(scheduler.active_count(), before - 1);
    }

    #[test]
    fn test_both_cadences_fire_same_tick() {
        let mut scheduler = BurstScheduler::new(2, BurstTuning::default());
        scheduler.fixed_timer = 0.01;
        scheduler.jitter_timer = 0.01;
        scheduler.update(0.02);
        // Two independent bursts, not one
        assert_eq!(scheduler.active_count(), 2);
        assert_ne!(scheduler.bursts()[0].id(), scheduler.bursts()[1].id());
    }

    #[test]
    fn test_fixed_cadence_period() {
        let mut scheduler = BurstScheduler::new(3, BurstTuning::default());
        scheduler.jitter_timer = f32::INFINITY;
        scheduler.update(AUTO_PERIOD - 0.05);
        assert_eq!(scheduler.active_count(), 0);
        scheduler.update(0.1);
        assert_eq!(scheduler.active_count(), 1);
    }

    #[test]
    fn test_invalid_parameters_leave_state_untouched() {
        let mut scheduler = quiet_scheduler(4);
        let bad_count = SpawnRequest {
            count: 0,
            origin: Vec3::zero(),
            base_size: 0.5,
            radius: 1.0,
            sprite_index: 0,
            color: (255, 255, 255),
        };
        assert!(scheduler.spawn(bad_count).is_err());

        let bad_origin = SpawnRequest {
            count: 10,
            origin: Vec3::new(f32::NAN, 0.0, 0.0),
            base_size: 0.5,
            radius: 1.0,
            sprite_index: 0,
            color: (255, 255, 255),
        };
        assert!(scheduler.spawn(bad_origin).is_err());
        assert_eq!(scheduler.active_count(), 0);

        let old_tuning = *scheduler.tuning();
        let mut bad_tuning = old_tuning;
        bad_tuning.count_min = 0;
        assert!(scheduler.set_tuning(bad_tuning).is_err());
        assert_eq!(scheduler.tuning().count_min, old_tuning.count_min);
    }

    #[test]
    fn test_click_distribution_bounds() {
        let mut scheduler = quiet_scheduler(5);
        for i in 0..50 {
            let nx = (i % 10) as f32 / 10.0;
            let ny = (i / 10) as f32 / 5.0;
            scheduler.spawn_at_screen(nx, ny).unwrap();
        }
        for burst in scheduler.bursts() {
            let n = burst.particle_count();
            assert!((400..=1400).contains(&n), "count {} out of range", n);
            let o = burst.origin();
            assert!(o.x.abs() <= 10.0 + 1e-3);
            assert_eq!(o.z, 40.0);
            assert!(burst.sprite_index() < SPRITE_COUNT);
        }
    }

    #[test]
    fn test_autonomous_origin_bounds() {
        let mut scheduler = quiet_scheduler(6);
        for _ in 0..50 {
            scheduler.spawn_autonomous().unwrap();
        }
        for burst in scheduler.bursts() {
            let o = burst.origin();
            assert!(o.x.abs() <= 10.0);
            assert!((0.0..=8.0).contains(&o.y));
            assert!((35.0..=45.0).contains(&o.z));
        }
    }

    #[test]
    fn test_jitter_delay_clamped() {
        let mut scheduler = quiet_scheduler(7);
        for _ in 0..1000 {
            let d = scheduler.next_jitter_delay();
            assert!(d >= MIN_DELAY);
            assert!(d <= AUTO_PERIOD + AUTO_JITTER);
        }
    }

    #[test]
    fn test_dispose_at_most_once_randomized() {
        let mut scheduler = quiet_scheduler(8);
        let mut rng = Rng::new(0xACE);
        let mut retired: HashSet<u64> = HashSet::new();
        let mut live: HashSet<u64> = HashSet::new();

        for step in 0..400 {
            if rng.next_f32() < 0.3 {
                let id = scheduler
                    .spawn(SpawnRequest {
                        count: 1 + rng.index(30),
                        origin: Vec3::new(0.0, 0.0, 40.0),
                        base_size: 0.1,
                        radius: 1.0,
                        sprite_index: rng.index(8),
                        color: (200, 200, 200),
                    })
                    .unwrap();
                assert!(live.insert(id), "id {} reused", id);
            }
            scheduler.update(rng.range_f32(0.0, 0.8));

            let active: HashSet<u64> = scheduler.bursts().iter().map(|b| b.id()).collect();
            for id in live.difference(&active) {
                // Newly retired: must never have been retired before
                assert!(!retired.contains(id), "burst {} retired twice (step {})", id, step);
            }
            for id in &retired {
                assert!(!active.contains(id), "burst {} came back from disposal", id);
            }
            retired.extend(live.difference(&active).copied());
            live = active;
        }
        assert!(!retired.is_empty());
    }

    #[test]
    fn test_clear_disposes_everything() {
        let mut scheduler = quiet_scheduler(9);
        for _ in 0..5 {
            scheduler.spawn_autonomous().unwrap();
        }
        scheduler.clear();
        assert_eq!(scheduler.active_count(), 0);
        // Nothing pending resurrects after further updates
        scheduler.update(BURST_DURATION);
        assert_eq!(scheduler.active_count(), 0);
    }
}
