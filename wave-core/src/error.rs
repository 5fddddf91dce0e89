//! Error type shared by the whole crate.
//!
//! Only the boundaries can fail: configuration checks, and reading or
//! writing the event log. Particle math and pool exhaustion never produce an
//! error.

use thiserror::Error;

/// Errors surfaced by configuration validation and event-log I/O.
#[derive(Debug, Error)]
pub enum SimError {
    /// The particle radius is zero, negative or not finite.
    #[error("particle radius must be a positive finite number, got {0}")]
    InvalidParticleRadius(f32),

    /// The ring derivation needs `wave_radius > particle_radius`.
    #[error(
        "wave radius ({wave_radius}) must be greater than particle radius ({particle_radius})"
    )]
    InvalidRadii {
        wave_radius: f32,
        particle_radius: f32,
    },

    /// The radii would spawn more ring members than a generation may create.
    #[error("radii {wave_radius}/{particle_radius} need more than {max} ring members")]
    RingTooLarge {
        wave_radius: f32,
        particle_radius: f32,
        max: usize,
    },

    /// The pool needs at least one slot, addressable by a `u32`.
    #[error("pool capacity must be in 1..=u32::MAX, got {0}")]
    InvalidCapacity(usize),

    /// The decay threshold is negative or NaN.
    #[error("decay amplitude must be a non-negative number, got {0}")]
    InvalidDecayAmplitude(f32),

    /// Reading or writing the event log failed.
    #[error("event log i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The event log ends before the declared number of events.
    #[error(
        "event log is truncated: header declares {declared} events, body holds {available} bytes"
    )]
    Truncated { declared: u32, available: usize },

    /// The event log holds more bytes than its header accounts for.
    #[error("event log has {0} unexpected trailing bytes")]
    TrailingBytes(usize),
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, SimError>;
