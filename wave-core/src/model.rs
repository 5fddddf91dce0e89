//! The interface both allocation disciplines share.
//!
//! [`crate::stepper::Stepper`] drives a tick through this trait only, so the
//! unbounded [`crate::store::ParticleStore`] and the fixed-capacity
//! [`crate::pool::ParticlePool`] run the exact same update rule.

use glam::Vec2;

use crate::ring::RingLayout;

/// Read-only view of one live particle, handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSample {
    /// Interpolated position at the snapshot time.
    pub position: Vec2,
    /// Drawing radius (the configured particle radius).
    pub radius: f32,
    /// Current amplitude, for intensity.
    pub amplitude: f32,
}

/// A particle container that can run the wave-particle update rule.
///
/// A tick calls, in order: [`WaveModel::collect`], any number of
/// [`WaveModel::generate`], then [`WaveModel::subdivision_candidates`]
/// followed by [`WaveModel::subdivide`] with that result. Candidates are
/// indices in whatever id space the implementation uses; they are only
/// meaningful between those two calls.
pub trait WaveModel {
    /// Drops every particle.
    fn reset(&mut self);

    /// Releases storage held by fully decayed particles.
    ///
    /// Models that never release anything keep the default no-op.
    fn collect(&mut self) {}

    /// Sets the amplitude below which [`WaveModel::collect`] releases a
    /// particle. Models that never release anything ignore it.
    fn set_decay_amplitude(&mut self, _amplitude: f32) {}

    /// Spawns `ring` around `center`, born at `time`.
    ///
    /// Returns how many ring members were actually created; a bounded model
    /// may create fewer than `ring.count`.
    fn generate(&mut self, time: f32, center: Vec2, ring: &RingLayout) -> usize;

    /// Read pass: every live particle whose growth metric at `time` exceeds
    /// `particle_radius`, in ascending index order.
    fn subdivision_candidates(&self, time: f32, particle_radius: f32) -> Vec<usize>;

    /// Write pass: splits the given particles. Returns how many were split.
    fn subdivide(&mut self, candidates: &[usize]) -> usize;

    /// Number of live particles.
    fn live_count(&self) -> usize;

    /// Fixed slot count, or `None` for unbounded storage.
    fn capacity(&self) -> Option<usize> {
        None
    }

    /// Unused slots, or `None` for unbounded storage.
    fn free_count(&self) -> Option<usize> {
        None
    }

    /// Smallest amplitude among live particles, `None` when empty.
    fn min_amplitude(&self) -> Option<f32>;

    /// Positions of all live particles at `time`.
    fn snapshot(&self, time: f32, particle_radius: f32) -> Vec<ParticleSample>;
}

impl<M: WaveModel + ?Sized> WaveModel for Box<M> {
    fn reset(&mut self) {
        (**self).reset()
    }

    fn collect(&mut self) {
        (**self).collect()
    }

    fn set_decay_amplitude(&mut self, amplitude: f32) {
        (**self).set_decay_amplitude(amplitude)
    }

    fn generate(&mut self, time: f32, center: Vec2, ring: &RingLayout) -> usize {
        (**self).generate(time, center, ring)
    }

    fn subdivision_candidates(&self, time: f32, particle_radius: f32) -> Vec<usize> {
        (**self).subdivision_candidates(time, particle_radius)
    }

    fn subdivide(&mut self, candidates: &[usize]) -> usize {
        (**self).subdivide(candidates)
    }

    fn live_count(&self) -> usize {
        (**self).live_count()
    }

    fn capacity(&self) -> Option<usize> {
        (**self).capacity()
    }

    fn free_count(&self) -> Option<usize> {
        (**self).free_count()
    }

    fn min_amplitude(&self) -> Option<f32> {
        (**self).min_amplitude()
    }

    fn snapshot(&self, time: f32, particle_radius: f32) -> Vec<ParticleSample> {
        (**self).snapshot(time, particle_radius)
    }
}
