//! Minimal vector math for spatial queries and signal bookkeeping.
//!
//! The toolkit compares squared distances wherever possible so that the
//! per-frame hot paths never pay for a square root they do not need.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tolerance used by [`approximately`].  Matches the scale of accumulated
/// per-frame float error in confidence and strength arithmetic.
const EPSILON: f32 = 1e-5;

/// True when `a` and `b` differ by less than a small absolute tolerance.
pub fn approximately(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ────────────────────────────────────────────────────────────────────────────
// Vec3
// ────────────────────────────────────────────────────────────────────────────

/// A point or direction in 3-D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// The world "forward" axis (+Z).
    pub const FORWARD: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    /// The world "up" axis (+Y).
    pub const UP: Self = Self {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Squared length; avoids the square root of [`Vec3::length`].
    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    /// Squared distance to `other`.
    pub fn distance_sq(self, other: Self) -> f32 {
        (self - other).length_sq()
    }

    /// Unit-length copy, or [`Vec3::ZERO`] for a zero vector.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    /// Drop the vertical component, yielding the horizontal-plane projection.
    pub fn horizontal(self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Vec2
// ────────────────────────────────────────────────────────────────────────────

/// A point on the horizontal (X-Z) plane, used by the markup intersection
/// tests.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

// ────────────────────────────────────────────────────────────────────────────
// FrameTime
// ────────────────────────────────────────────────────────────────────────────

/// Snapshot of the host clock for one scheduler phase.
///
/// `time` is seconds since startup; `dt` is the elapsed time of the frame
/// being processed.  Advance with [`FrameTime::step`] in tests and sim loops.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FrameTime {
    pub time: f32,
    pub dt: f32,
}

impl FrameTime {
    pub const fn new(time: f32, dt: f32) -> Self {
        Self { time, dt }
    }

    /// Return the clock advanced by `dt` seconds.
    pub fn step(self, dt: f32) -> Self {
        Self {
            time: self.time + dt,
            dt,
        }
    }
}
