use std::path::PathBuf;

use glam::Vec2;

use crate::{
    error::{Result, SimError},
    ring::RingLayout,
};

/// Fixed timestep of the simulation clock, in seconds.
pub const DEFAULT_FIXED_DT: f32 = 0.02;

/// Tunable simulation parameters.
///
/// Everything here may be adjusted live between ticks. Radii are validated
/// when a ring is generated (see [`crate::ring::RingLayout::new`]), so an
/// invalid edit is reported at that point instead of producing NaN particles.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Spatial resolution floor and subdivision threshold.
    pub particle_radius: f32,
    /// Radius at which the initial ring is laid out.
    pub wave_radius: f32,
    /// Extents of the simulated plane. Only the renderer uses this.
    pub plane_size: Vec2,
    /// Number of slots in the fixed-capacity pool.
    pub pool_capacity: usize,
    /// Stop the clock on the first tick that finds a particle to subdivide.
    pub stop_on_subdivision: bool,
    /// Pool slots whose amplitude falls below this are released by `collect`.
    pub decay_amplitude: f32,
    /// Where `Save`/`Load` read and write the event log.
    pub events_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            particle_radius: 0.5,
            wave_radius: 2.0,
            plane_size: Vec2::new(40.0, 40.0),
            pool_capacity: 1024,
            stop_on_subdivision: false,
            decay_amplitude: 1e-3,
            events_path: PathBuf::from("events.bin"),
        }
    }
}

impl Config {
    /// Checks every parameter up front.
    ///
    /// The radii must produce a ring, exactly as generation requires; the
    /// pool capacity must be non-zero and addressable by a
    /// [`crate::types::SlotId`].
    pub fn validate(&self) -> Result<()> {
        RingLayout::from_config(self)?;
        if self.pool_capacity == 0 || self.pool_capacity > u32::MAX as usize {
            return Err(SimError::InvalidCapacity(self.pool_capacity));
        }
        if self.decay_amplitude.is_nan() || self.decay_amplitude < 0.0 {
            return Err(SimError::InvalidDecayAmplitude(self.decay_amplitude));
        }
        Ok(())
    }
}

/// Rejects radius pairs for which the ring derivation is undefined.
pub(crate) fn check_radii(wave_radius: f32, particle_radius: f32) -> Result<()> {
    if !particle_radius.is_finite() || particle_radius <= 0.0 {
        return Err(SimError::InvalidParticleRadius(particle_radius));
    }
    if !wave_radius.is_finite() || wave_radius <= particle_radius {
        return Err(SimError::InvalidRadii {
            wave_radius,
            particle_radius,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn wave_radius_must_exceed_particle_radius() {
        let mut cfg = Config::default();
        cfg.wave_radius = cfg.particle_radius;
        assert!(matches!(
            cfg.validate(),
            Err(SimError::InvalidRadii { .. })
        ));

        cfg.wave_radius = 0.1;
        assert!(matches!(
            cfg.validate(),
            Err(SimError::InvalidRadii { .. })
        ));
    }

    #[test]
    fn particle_radius_must_be_positive_and_finite() {
        let mut cfg = Config::default();
        cfg.particle_radius = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(SimError::InvalidParticleRadius(_))
        ));

        cfg.particle_radius = f32::NAN;
        assert!(matches!(
            cfg.validate(),
            Err(SimError::InvalidParticleRadius(_))
        ));
    }

    #[test]
    fn oversized_ring_fails_validation() {
        let mut cfg = Config::default();
        cfg.particle_radius = 1e-30;
        assert!(matches!(cfg.validate(), Err(SimError::RingTooLarge { .. })));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut cfg = Config::default();
        cfg.pool_capacity = 0;
        assert!(matches!(cfg.validate(), Err(SimError::InvalidCapacity(0))));
    }

    #[test]
    fn negative_decay_amplitude_is_rejected() {
        let mut cfg = Config::default();
        cfg.decay_amplitude = -1.0;
        assert!(matches!(
            cfg.validate(),
            Err(SimError::InvalidDecayAmplitude(_))
        ));
    }
}
