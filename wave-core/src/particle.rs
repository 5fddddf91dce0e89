//! The wave particle and the 2D helpers its update rule needs.
//!
//! A particle never bends: it travels on a straight ray from its birth
//! point. The curved front only appears from many particles with different
//! directions sharing one birth point and time.

use glam::Vec2;

/// One point sample of an expanding circular wavefront.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveParticle {
    /// Origin of travel. Kept through subdivision.
    pub birth_position: Vec2,
    /// Unit travel direction.
    pub direction: Vec2,
    /// Non-negative amplitude, divided by 3 on every split.
    pub amplitude: f32,
    /// Angular wedge of the front this particle stands for, divided by 3 on
    /// every split.
    pub dispersion_angle: f32,
    /// Simulation time of the generation event. Kept through subdivision.
    pub birth_time: f32,
}

impl WaveParticle {
    /// Position at time `t`: `birth_position + direction * (t - birth_time)`.
    #[inline]
    pub fn position_at(&self, t: f32) -> Vec2 {
        self.birth_position + self.direction * (t - self.birth_time)
    }

    /// Position at time `t` had the particle travelled along its direction
    /// rotated by `angle`. Used to draw the edges of the wedge it covers.
    pub fn position_rotated(&self, t: f32, angle: f32) -> Vec2 {
        self.birth_position + rotate(self.direction, angle) * (t - self.birth_time)
    }

    /// Growth metric: `(t - birth_time) * sin(dispersion_angle / 4)`.
    ///
    /// This approximates how far the wedge edges have drifted from the
    /// particle. [`chord_length`] is the exact variant and is deliberately
    /// not used here.
    #[inline]
    pub fn chord(&self, t: f32) -> f32 {
        (t - self.birth_time) * (self.dispersion_angle / 4.0).sin()
    }

    /// Returns `true` once [`WaveParticle::chord`] exceeds `particle_radius`.
    #[inline]
    pub fn needs_split(&self, t: f32, particle_radius: f32) -> bool {
        self.chord(t) > particle_radius
    }

    /// Splits this particle into three.
    ///
    /// `self` keeps its direction and is shrunk to a third of its amplitude
    /// and dispersion angle. The two returned children share the parent's
    /// birth position and birth time, carry the same shrunk amplitude and
    /// angle, and point half a dispersion angle to either side of the parent.
    pub fn split(&mut self) -> [WaveParticle; 2] {
        let half = self.dispersion_angle / 2.0;
        let sc = Vec2::new(half.sin(), half.cos());

        self.amplitude /= 3.0;
        self.dispersion_angle /= 3.0;

        let a = rotate_cw(self.direction, sc);
        let b = mirror(a, self.direction);

        [
            WaveParticle {
                direction: a,
                ..*self
            },
            WaveParticle {
                direction: b,
                ..*self
            },
        ]
    }
}

/// Rotates `v` by `angle` radians (counter-clockwise for positive angles).
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Rotates `v` by the angle whose `(sin, cos)` is `sc`.
///
/// Counter-clockwise in the y-up world frame when `sc.x > 0`; it is the
/// same rotation as [`rotate`]. The name marks the first child of a split
/// and pairs with [`rotate_ccw`], which turns the other way.
#[inline]
pub fn rotate_cw(v: Vec2, sc: Vec2) -> Vec2 {
    Vec2::new(v.x * sc.y - v.y * sc.x, v.x * sc.x + v.y * sc.y)
}

/// Reflects `v` across the line spanned by the unit vector `axis`.
#[inline]
pub fn mirror(v: Vec2, axis: Vec2) -> Vec2 {
    2.0 * v.dot(axis) * axis - v
}

/// Rotates `v` by `sc` in the opposite sense to [`rotate_cw`]: clockwise
/// in the world frame when `sc.x > 0`.
#[inline]
pub fn rotate_ccw(v: Vec2, sc: Vec2) -> Vec2 {
    mirror(rotate_cw(v, sc), v)
}

/// Exact chord length of an arc of radius `r` spanning `angle`.
pub fn chord_length(r: f32, angle: f32) -> f32 {
    2.0 * r * (angle / 2.0).sin()
}
