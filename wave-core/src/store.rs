//! Unbounded particle storage.
//!
//! An append-only list: subdivision pushes two children and shrinks the
//! parent in place, and nothing is ever removed until [`ParticleStore::reset`].
//! Memory grows with the total number of splits.

use glam::Vec2;

use crate::{
    model::{ParticleSample, WaveModel},
    particle::WaveParticle,
    ring::RingLayout,
    types::ParticleId,
};

#[derive(Debug, Default)]
pub struct ParticleStore {
    pub particles: Vec<WaveParticle>,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a particle and returns its index.
    pub fn create_particle(
        &mut self,
        source_position: Vec2,
        direction: Vec2,
        amplitude: f32,
        dispersion_angle: f32,
        birth_time: f32,
    ) -> ParticleId {
        self.push(WaveParticle {
            birth_position: source_position,
            direction,
            amplitude,
            dispersion_angle,
            birth_time,
        })
    }

    fn push(&mut self, particle: WaveParticle) -> ParticleId {
        let id = self.particles.len();
        self.particles.push(particle);
        id
    }

    /// Splits particle `id` and returns the indices of its two children.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds.
    pub fn subdivide(&mut self, id: ParticleId) -> (ParticleId, ParticleId) {
        let [a, b] = self.particles[id].split();
        (self.push(a), self.push(b))
    }

    /// Runs one growth check at `time` and applies every resulting split.
    ///
    /// The scan reads the whole list first and only then appends, so children
    /// created here are not checked until the next call. Returns the number
    /// of particles split.
    pub fn step(&mut self, time: f32, particle_radius: f32) -> usize {
        let pending = self.subdivision_candidates(time, particle_radius);
        WaveModel::subdivide(self, &pending)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

impl WaveModel for ParticleStore {
    fn reset(&mut self) {
        self.particles.clear();
    }

    fn generate(&mut self, time: f32, center: Vec2, ring: &RingLayout) -> usize {
        self.particles.reserve(ring.count);
        for p in ring.particles(center, time) {
            self.push(p);
        }
        ring.count
    }

    fn subdivision_candidates(&self, time: f32, particle_radius: f32) -> Vec<usize> {
        self.particles
            .iter()
            .enumerate()
            .filter_map(|(id, p)| p.needs_split(time, particle_radius).then_some(id))
            .collect()
    }

    fn subdivide(&mut self, candidates: &[usize]) -> usize {
        self.particles.reserve(candidates.len() * 2);
        for &id in candidates {
            ParticleStore::subdivide(self, id);
        }
        candidates.len()
    }

    fn live_count(&self) -> usize {
        self.particles.len()
    }

    fn min_amplitude(&self) -> Option<f32> {
        self.particles.iter().map(|p| p.amplitude).reduce(f32::min)
    }

    fn snapshot(&self, time: f32, particle_radius: f32) -> Vec<ParticleSample> {
        self.particles
            .iter()
            .map(|p| ParticleSample {
                position: p.position_at(time),
                radius: particle_radius,
                amplitude: p.amplitude,
            })
            .collect()
    }
}
