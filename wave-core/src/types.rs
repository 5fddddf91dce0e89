/// Index of a particle in a [`crate::store::ParticleStore`].
///
/// Indices are stable: the store only ever appends, so an id stays valid
/// until the store is reset.
pub type ParticleId = usize;

/// Index of a slot in a [`crate::pool::ParticlePool`], in `[0, capacity)`.
pub type SlotId = u32;
