//! Fixed-capacity particle storage.
//!
//! `N` slots are allocated once. A slot holds one particle and a liveness
//! flag; unused slot indices sit on a [`FreeList`]. Every pass over the
//! slots is a parallel iteration over `[0, N)` with no cross-slot writes.
//! Results that feed the free list are gathered in index order, so the same
//! sequence of calls always produces the same slot assignment.
//!
//! Running out of slots is an expected steady state, not an error: ring
//! members that find no slot are dropped and splits that find no slots are
//! retried on a later tick.

use glam::Vec2;
use rayon::prelude::*;

use crate::{
    config::Config,
    error::{Result, SimError},
    free_list::FreeList,
    model::{ParticleSample, WaveModel},
    particle::WaveParticle,
    ring::RingLayout,
    types::SlotId,
};

/// One pool slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Slot {
    pub particle: WaveParticle,
    pub alive: bool,
}

impl Slot {
    const EMPTY: Slot = Slot {
        particle: WaveParticle {
            birth_position: Vec2::ZERO,
            direction: Vec2::X,
            amplitude: 0.0,
            dispersion_angle: 0.0,
            birth_time: 0.0,
        },
        alive: false,
    };

    fn live(particle: WaveParticle) -> Self {
        Self {
            particle,
            alive: true,
        }
    }
}

#[derive(Debug)]
pub struct ParticlePool {
    slots: Vec<Slot>,
    free: FreeList,
    /// Live particles below this amplitude are released by `collect`.
    pub decay_amplitude: f32,
}

impl ParticlePool {
    /// Creates a pool of `capacity` free slots.
    ///
    /// ### Panics
    /// Panics if `capacity` does not fit in a [`SlotId`]. Use
    /// [`ParticlePool::from_config`] for a checked constructor.
    pub fn new(capacity: usize, decay_amplitude: f32) -> Self {
        assert!(
            capacity <= SlotId::MAX as usize,
            "pool capacity {capacity} exceeds slot id range"
        );
        Self {
            slots: vec![Slot::EMPTY; capacity],
            free: FreeList::full(capacity),
            decay_amplitude,
        }
    }

    /// Creates a pool sized and tuned by `cfg`, after validating it.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        if cfg.pool_capacity == 0 || cfg.pool_capacity > SlotId::MAX as usize {
            return Err(SimError::InvalidCapacity(cfg.pool_capacity));
        }
        if cfg.decay_amplitude.is_nan() || cfg.decay_amplitude < 0.0 {
            return Err(SimError::InvalidDecayAmplitude(cfg.decay_amplitude));
        }
        Ok(Self::new(cfg.pool_capacity, cfg.decay_amplitude))
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn free_list(&self) -> &FreeList {
        &self.free
    }

    /// Releases every decayed slot and rebuilds the free list.
    ///
    /// A slot decays once its amplitude drops below `decay_amplitude`. The
    /// free list is rebuilt from scratch out of every dead slot, so calling
    /// this twice in a row leaves the same free list both times. Must run
    /// before anything allocates in a tick. Returns how many slots were
    /// released by this call.
    pub fn collect(&mut self) -> usize {
        let threshold = self.decay_amplitude;
        let released = self
            .slots
            .par_iter_mut()
            .filter(|s| s.alive && s.particle.amplitude < threshold)
            .map(|s| s.alive = false)
            .count();

        // Highest index at the bottom of the stack: the lowest free slot is
        // handed out first.
        let free: Vec<SlotId> = self
            .slots
            .par_iter()
            .enumerate()
            .rev()
            .filter(|(_, s)| !s.alive)
            .map(|(i, _)| i as SlotId)
            .collect();

        let before = self.free.len();
        self.free.refill(free);
        if self.free.len() != before {
            log::debug!("free slots: {} -> {}", before, self.free.len());
        }
        released
    }

    /// Splits every live particle that qualifies at `time`.
    ///
    /// Each split needs two free slots. Once none are left the remaining
    /// candidates stay as they are and will qualify again on a later tick.
    pub fn subdivide_all(&mut self, time: f32, particle_radius: f32) -> usize {
        let candidates = self.subdivision_candidates(time, particle_radius);
        WaveModel::subdivide(self, &candidates)
    }

    /// Live particles at `time`, for the renderer.
    pub fn render_snapshot(&self, time: f32, particle_radius: f32) -> Vec<ParticleSample> {
        self.snapshot(time, particle_radius)
    }
}

impl WaveModel for ParticlePool {
    fn reset(&mut self) {
        self.slots.par_iter_mut().for_each(|s| s.alive = false);
        self.free.refill((0..self.slots.len() as SlotId).rev());
    }

    fn collect(&mut self) {
        ParticlePool::collect(self);
    }

    fn set_decay_amplitude(&mut self, amplitude: f32) {
        self.decay_amplitude = amplitude;
    }

    fn generate(&mut self, time: f32, center: Vec2, ring: &RingLayout) -> usize {
        let mut created = 0;
        for particle in ring.particles(center, time) {
            let Some(id) = self.free.try_pop() else {
                log::debug!(
                    "pool exhausted: dropped {} of {} ring members",
                    ring.count - created,
                    ring.count
                );
                break;
            };
            self.slots[id as usize] = Slot::live(particle);
            created += 1;
        }
        created
    }

    fn subdivision_candidates(&self, time: f32, particle_radius: f32) -> Vec<usize> {
        self.slots
            .par_iter()
            .enumerate()
            .filter(|(_, s)| s.alive && s.particle.needs_split(time, particle_radius))
            .map(|(i, _)| i)
            .collect()
    }

    fn subdivide(&mut self, candidates: &[usize]) -> usize {
        let mut split = 0;
        for &i in candidates {
            let Some((a, b)) = self.free.try_pop_pair() else {
                log::debug!(
                    "pool exhausted: deferred {} of {} splits",
                    candidates.len() - split,
                    candidates.len()
                );
                break;
            };
            let [child_a, child_b] = self.slots[i].particle.split();
            self.slots[a as usize] = Slot::live(child_a);
            self.slots[b as usize] = Slot::live(child_b);
            split += 1;
        }
        split
    }

    fn live_count(&self) -> usize {
        self.slots.par_iter().filter(|s| s.alive).count()
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.slots.len())
    }

    fn free_count(&self) -> Option<usize> {
        Some(self.free.len())
    }

    fn min_amplitude(&self) -> Option<f32> {
        self.slots
            .par_iter()
            .filter(|s| s.alive)
            .map(|s| s.particle.amplitude)
            .reduce_with(f32::min)
    }

    fn snapshot(&self, time: f32, particle_radius: f32) -> Vec<ParticleSample> {
        self.slots
            .par_iter()
            .filter(|s| s.alive)
            .map(|s| ParticleSample {
                position: s.particle.position_at(time),
                radius: particle_radius,
                amplitude: s.particle.amplitude,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use std::f32::consts::TAU;

    fn six_ring() -> RingLayout {
        let ring = RingLayout::new(2.0, 0.95).unwrap();
        assert_eq!(ring.count, 6);
        ring
    }

    fn assert_accounted(pool: &ParticlePool) {
        assert_eq!(
            pool.free_list().len() + pool.live_count(),
            pool.slots().len(),
            "free + live must equal capacity"
        );
    }

    #[test]
    fn new_pool_is_all_free() {
        let pool = ParticlePool::new(16, 1e-3);
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.free_count(), Some(16));
        assert_eq!(pool.capacity(), Some(16));
        assert_accounted(&pool);
    }

    #[test]
    fn ring_larger_than_pool_is_truncated() {
        let mut pool = ParticlePool::new(4, 1e-3);
        let created = pool.generate(0.0, Vec2::ZERO, &six_ring());

        assert_eq!(created, 4);
        assert_eq!(pool.live_count(), 4);
        assert_eq!(pool.free_count(), Some(0));
        assert_accounted(&pool);

        // The first four ring directions made it in, in order.
        let ring = six_ring();
        for i in 0..4 {
            assert_eq!(pool.slots()[i].particle.direction, ring.direction(i));
        }
    }

    #[test]
    fn generate_into_full_pool_creates_nothing() {
        let mut pool = ParticlePool::new(4, 1e-3);
        pool.generate(0.0, Vec2::ZERO, &six_ring());
        assert_eq!(pool.generate(1.0, Vec2::ONE, &six_ring()), 0);
        assert_accounted(&pool);
    }

    #[test]
    fn six_member_ring_splits_with_enough_room() {
        let particle_radius = 0.95;
        let mut pool = ParticlePool::new(64, 1e-3);
        pool.generate(0.0, Vec2::ZERO, &six_ring());

        let threshold = particle_radius / (TAU / 6.0 / 4.0).sin();
        assert_eq!(pool.subdivide_all(threshold - 0.05, particle_radius), 0);

        let split = pool.subdivide_all(threshold + 0.05, particle_radius);
        assert_eq!(split, 6);
        assert_eq!(pool.live_count(), 6 + 2 * split);
        assert_accounted(&pool);
    }

    #[test]
    fn exhausted_pool_defers_splits() {
        let particle_radius = 0.95;
        let t = 10.0;
        let mut pool = ParticlePool::new(8, 1e-3);
        pool.generate(0.0, Vec2::ZERO, &six_ring());

        // Two free slots: exactly one split fits.
        assert_eq!(pool.subdivide_all(t, particle_radius), 1);
        assert_eq!(pool.live_count(), 8);
        assert_accounted(&pool);

        // The other five still qualify and wait for capacity.
        let waiting = pool.subdivision_candidates(t, particle_radius);
        assert!(waiting.contains(&1));
        assert_eq!(pool.subdivide_all(t, particle_radius), 0);

        // Freeing two slots lets one more through.
        pool.slots[6].particle.amplitude = 0.0;
        pool.slots[7].particle.amplitude = 0.0;
        assert_eq!(pool.collect(), 2);
        assert_eq!(pool.subdivide_all(t, particle_radius), 1);
        assert_accounted(&pool);
    }

    #[test]
    fn single_free_slot_is_not_consumed_by_a_failed_split() {
        let mut pool = ParticlePool::new(7, 1e-3);
        pool.generate(0.0, Vec2::ZERO, &six_ring());
        assert_eq!(pool.free_count(), Some(1));

        assert_eq!(pool.subdivide_all(10.0, 0.95), 0);
        assert_eq!(pool.free_count(), Some(1));
        assert_accounted(&pool);
    }

    #[test]
    fn collect_releases_decayed_slots() {
        let mut pool = ParticlePool::new(8, 0.5);
        pool.generate(0.0, Vec2::ZERO, &six_ring());
        pool.slots[2].particle.amplitude = 0.1;
        pool.slots[4].particle.amplitude = 0.49;

        assert_eq!(pool.collect(), 2);
        assert_eq!(pool.live_count(), 4);
        assert!(!pool.slots()[2].alive);
        assert!(!pool.slots()[4].alive);
        assert_accounted(&pool);

        // Released slots are reused lowest first.
        assert_eq!(pool.free_list().try_pop(), Some(2));
    }

    #[test]
    fn collect_is_idempotent() {
        let mut pool = ParticlePool::new(32, 0.2);
        pool.generate(0.0, Vec2::ZERO, &six_ring());
        pool.subdivide_all(10.0, 0.95);
        pool.slots[0].particle.amplitude = 0.0;

        pool.collect();
        let first = pool.free_list().to_vec();
        pool.collect();
        let second = pool.free_list().to_vec();

        assert_eq!(first, second);
    }

    #[test]
    fn split_children_fall_below_decay_threshold_eventually() {
        // 1 / 3^3 < 0.05: the third generation of splits has decayed.
        let mut pool = ParticlePool::new(256, 0.05);
        pool.generate(0.0, Vec2::ZERO, &six_ring());

        let mut t = 0.0;
        while pool.min_amplitude().is_some_and(|a| a >= 0.05) {
            t += 1.0;
            pool.collect();
            pool.subdivide_all(t, 0.95);
            assert_accounted(&pool);
            assert!(t < 1000.0, "particles never decayed");
        }

        let before = pool.live_count();
        assert!(pool.collect() > 0);
        assert!(pool.live_count() < before);
        assert_accounted(&pool);
    }

    #[test]
    fn reset_frees_everything() {
        let mut pool = ParticlePool::new(8, 1e-3);
        pool.generate(0.0, Vec2::ZERO, &six_ring());
        pool.reset();

        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.free_count(), Some(8));
        assert_eq!(pool.free_list().try_pop(), Some(0));
    }

    #[test]
    fn snapshot_lists_only_live_slots() {
        let mut pool = ParticlePool::new(10, 1e-3);
        pool.generate(0.0, Vec2::new(1.0, 1.0), &six_ring());

        let snap = pool.render_snapshot(2.0, 0.95);
        assert_eq!(snap.len(), 6);
        for s in &snap {
            assert!((s.position.distance(Vec2::new(1.0, 1.0)) - 2.0).abs() < 1e-5);
            assert_eq!(s.radius, 0.95);
        }
    }

    #[test]
    fn random_workload_keeps_slots_accounted() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut pool = ParticlePool::new(200, 0.02);
        let ring = RingLayout::new(3.0, 0.5).unwrap();

        let mut t = 0.0;
        for _ in 0..300 {
            t += 0.05;
            pool.collect();
            assert_accounted(&pool);
            if rng.random_bool(0.1) {
                let at = Vec2::new(rng.random_range(-10.0..10.0), rng.random_range(-10.0..10.0));
                pool.generate(t, at, &ring);
                assert_accounted(&pool);
            }
            pool.subdivide_all(t, 0.5);
            assert_accounted(&pool);
        }
    }

    #[test]
    fn identical_call_sequences_fill_identical_slots() {
        let run = || {
            let mut pool = ParticlePool::new(64, 0.05);
            let ring = RingLayout::new(2.0, 0.4).unwrap();
            let mut t = 0.0;
            for step in 0..200 {
                t += 0.1;
                pool.collect();
                if step % 40 == 0 {
                    pool.generate(t, Vec2::new(step as f32, 0.0), &ring);
                }
                pool.subdivide_all(t, 0.4);
            }
            pool.slots().to_vec()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn from_config_checks_capacity() {
        let mut cfg = Config::default();
        cfg.pool_capacity = 0;
        assert!(matches!(
            ParticlePool::from_config(&cfg),
            Err(SimError::InvalidCapacity(0))
        ));

        cfg.pool_capacity = 12;
        let pool = ParticlePool::from_config(&cfg).unwrap();
        assert_eq!(pool.capacity(), Some(12));
    }

    fn sorted_samples(model: &dyn WaveModel, time: f32) -> Vec<ParticleSample> {
        let mut samples = model.snapshot(time, 0.95);
        samples.sort_by(|a, b| {
            a.position
                .x
                .total_cmp(&b.position.x)
                .then(a.position.y.total_cmp(&b.position.y))
                .then(a.amplitude.total_cmp(&b.amplitude))
        });
        samples
    }

    #[test]
    fn pool_tracks_the_unbounded_store_over_many_ticks() {
        let ring = six_ring();
        let mut store = crate::store::ParticleStore::new();
        let mut pool = ParticlePool::new(4096, 0.0);
        let rings = [
            (0, Vec2::ZERO),
            (20, Vec2::new(3.0, -2.0)),
            (50, Vec2::new(-4.0, 1.5)),
        ];

        let dt = 0.05;
        let mut time = 0.0;
        let mut splits = 0;
        for tick in 0..320 {
            time += dt;
            let models: [&mut dyn WaveModel; 2] = [&mut store, &mut pool];
            for model in models {
                model.collect();
                for &(at, center) in &rings {
                    if at == tick {
                        model.generate(time, center, &ring);
                    }
                }
            }

            let from_store = store.subdivision_candidates(time, 0.95);
            let from_pool = pool.subdivision_candidates(time, 0.95);
            assert_eq!(from_store.len(), from_pool.len(), "t = {time}");
            splits += WaveModel::subdivide(&mut store, &from_store);
            assert_eq!(pool.subdivide(&from_pool), from_pool.len());

            assert_eq!(store.live_count(), pool.live_count());
            assert_accounted(&pool);
        }
        assert!(splits >= 18, "every ring should split at least once");

        let a = sorted_samples(&store, time);
        let b = sorted_samples(&pool, time);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert!((x.position - y.position).length() < 1e-4);
            assert!((x.amplitude - y.amplitude).abs() < 1e-6);
        }
    }
}
