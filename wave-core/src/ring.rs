//! Layout of the initial particle ring spawned by a generation event.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::{
    config::{Config, check_radii},
    error::{Result, SimError},
    particle::WaveParticle,
};

/// Largest ring a single generation event may spawn.
///
/// The count grows like `π · wave_radius / particle_radius`, so this caps
/// the ratio of the radii at roughly 20 000.
pub const MAX_RING_MEMBERS: usize = 1 << 16;

/// How many particles a generation event spawns and how wide each one is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingLayout {
    /// Number of ring members.
    pub count: usize,
    /// Angular wedge per member, exactly `2π / count`.
    pub wedge: f32,
}

impl RingLayout {
    /// Derives the ring for the given radii.
    ///
    /// The count is the largest `n` for which neighbours that have travelled
    /// `wave_radius` are still at least `2 * particle_radius` apart:
    ///
    /// 1. `len = sqrt(wave_radius² - particle_radius²)`
    /// 2. `h = particle_radius * len / wave_radius`
    /// 3. `angle = 2 * atan2(h, sqrt(len² - h²))`
    /// 4. `n = floor(2π / angle)`
    ///
    /// The wedge is then re-derived as `2π / n` so the ring tiles the full
    /// circle.
    ///
    /// ### Errors
    /// [`crate::error::SimError::InvalidParticleRadius`] or
    /// [`crate::error::SimError::InvalidRadii`] when `wave_radius` does not
    /// strictly exceed a positive `particle_radius`;
    /// [`SimError::RingTooLarge`] when the ring would have more than
    /// [`MAX_RING_MEMBERS`] members.
    pub fn new(wave_radius: f32, particle_radius: f32) -> Result<Self> {
        check_radii(wave_radius, particle_radius)?;

        let len = (wave_radius * wave_radius - particle_radius * particle_radius).sqrt();
        let h = particle_radius * len / wave_radius;
        let angle = 2.0 * h.atan2((len * len - h * h).sqrt());

        let members = (TAU / angle).floor();
        if !members.is_finite() || members > MAX_RING_MEMBERS as f32 {
            return Err(SimError::RingTooLarge {
                wave_radius,
                particle_radius,
                max: MAX_RING_MEMBERS,
            });
        }

        // angle < π for any valid pair, so there are always at least two members.
        let count = (members as usize).max(2);
        Ok(Self {
            count,
            wedge: TAU / count as f32,
        })
    }

    /// Shorthand for [`RingLayout::new`] with the radii from `cfg`.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.wave_radius, cfg.particle_radius)
    }

    /// Direction of ring member `i`: `(cos(i·Δ), sin(i·Δ))`.
    #[inline]
    pub fn direction(&self, i: usize) -> Vec2 {
        Vec2::from_angle(i as f32 * self.wedge)
    }

    /// Yields the ring members born at `center` at `time`.
    ///
    /// Every member shares the exact same birth position; the front only
    /// separates as the members travel.
    pub fn particles(&self, center: Vec2, time: f32) -> impl Iterator<Item = WaveParticle> + '_ {
        (0..self.count).map(move |i| WaveParticle {
            birth_position: center,
            direction: self.direction(i),
            amplitude: 1.0,
            dispersion_angle: self.wedge,
            birth_time: time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_tiles_the_full_circle() {
        let ring = RingLayout::new(10.0, 1.0).unwrap();

        assert_eq!(ring.count, 31);
        assert!((ring.count as f32 * ring.wedge - TAU).abs() < 1e-5);
    }

    #[test]
    fn ring_directions_are_unit_vectors() {
        let ring = RingLayout::new(10.0, 1.0).unwrap();
        for p in ring.particles(Vec2::ZERO, 0.0) {
            assert!((p.direction.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn ring_members_share_birth_point_and_time() {
        let ring = RingLayout::new(2.0, 0.95).unwrap();
        let center = Vec2::new(4.0, -1.0);
        let members: Vec<_> = ring.particles(center, 2.5).collect();

        assert_eq!(members.len(), 6);
        for p in &members {
            assert_eq!(p.birth_position, center);
            assert_eq!(p.birth_time, 2.5);
            assert_eq!(p.amplitude, 1.0);
            assert_eq!(p.dispersion_angle, ring.wedge);
        }
        assert_eq!(members[0].direction, Vec2::X);
    }

    #[test]
    fn ring_is_the_densest_layout_without_overlap() {
        let (wave_radius, particle_radius) = (10.0, 1.0);
        let ring = RingLayout::new(wave_radius, particle_radius).unwrap();

        // Neighbours at wave_radius are at least two particle radii apart...
        let a = ring.direction(0) * wave_radius;
        let b = ring.direction(1) * wave_radius;
        assert!(a.distance(b) >= 2.0 * particle_radius);

        // ...and one more member would push them closer than that.
        let denser = TAU / (ring.count + 1) as f32;
        let gap = 2.0 * wave_radius * (denser / 2.0).sin();
        assert!(gap < 2.0 * particle_radius);
    }

    #[test]
    fn degenerate_radii_are_rejected() {
        assert!(matches!(
            RingLayout::new(1.0, 1.0),
            Err(SimError::InvalidRadii { .. })
        ));
        assert!(matches!(
            RingLayout::new(0.5, 1.0),
            Err(SimError::InvalidRadii { .. })
        ));
        assert!(matches!(
            RingLayout::new(1.0, -0.1),
            Err(SimError::InvalidParticleRadius(_))
        ));
    }

    #[test]
    fn tiny_radius_ratio_is_rejected_instead_of_overflowing() {
        assert!(matches!(
            RingLayout::new(1.0, 1e-30),
            Err(SimError::RingTooLarge { .. })
        ));
        assert!(matches!(
            RingLayout::new(1.0, 1e-6),
            Err(SimError::RingTooLarge { .. })
        ));

        // Just under the cap is still accepted.
        let ring = RingLayout::new(10_000.0, 1.0).unwrap();
        assert!(ring.count <= MAX_RING_MEMBERS);
        assert!(ring.count > MAX_RING_MEMBERS / 3);
    }
}
