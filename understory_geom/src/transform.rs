// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rigid 2D rotations and transforms. `f32`-only: collision math has no
//! meaningful fixed-point or `f64` variant in the source material.

use crate::Vec2;

/// A 2D rotation represented as `(sin, cos)`, composed via complex-number
/// multiplication.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Rotation2 {
    /// `sin(theta)`.
    pub sin: f32,
    /// `cos(theta)`.
    pub cos: f32,
}

impl Rotation2 {
    /// The identity rotation.
    pub const IDENTITY: Self = Self { sin: 0.0, cos: 1.0 };

    /// Builds a rotation from an angle in radians.
    #[must_use]
    pub fn from_angle(radians: f32) -> Self {
        Self {
            sin: libm::sinf(radians),
            cos: libm::cosf(radians),
        }
    }

    /// The angle in radians this rotation represents.
    #[must_use]
    pub fn angle(self) -> f32 {
        libm::atan2f(self.sin, self.cos)
    }

    /// Composes two rotations (complex-number multiplication).
    #[must_use]
    pub fn mul(self, other: Self) -> Self {
        Self {
            cos: self.cos * other.cos - self.sin * other.sin,
            sin: self.sin * other.cos + self.cos * other.sin,
        }
    }

    /// The inverse rotation (the transpose of the 2x2 rotation matrix).
    #[must_use]
    pub fn inverse(self) -> Self {
        Self {
            sin: -self.sin,
            cos: self.cos,
        }
    }

    /// Rotates a vector by this rotation.
    #[must_use]
    pub fn rotate(self, v: Vec2<f32>) -> Vec2<f32> {
        Vec2::new(
            self.cos * v.x - self.sin * v.y,
            self.sin * v.x + self.cos * v.y,
        )
    }

    /// Rotates a vector by the inverse of this rotation.
    #[must_use]
    pub fn inv_rotate(self, v: Vec2<f32>) -> Vec2<f32> {
        Vec2::new(
            self.cos * v.x + self.sin * v.y,
            -self.sin * v.x + self.cos * v.y,
        )
    }

    /// Normalized linear interpolation between two rotations.
    #[must_use]
    pub fn nlerp(self, other: Self, t: f32) -> Self {
        let sin = self.sin + (other.sin - self.sin) * t;
        let cos = self.cos + (other.cos - self.cos) * t;
        let mag = libm::sqrtf(sin * sin + cos * cos);
        if mag <= f32::EPSILON {
            return Self::IDENTITY;
        }
        Self {
            sin: sin / mag,
            cos: cos / mag,
        }
    }
}

impl Default for Rotation2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A rigid 2D transform: a translation `p` and a rotation `q`.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct Transform2 {
    /// Translation.
    pub p: Vec2<f32>,
    /// Rotation.
    pub q: Rotation2,
}

impl Transform2 {
    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            p: Vec2::zero(),
            q: Rotation2::IDENTITY,
        }
    }

    /// Applies the transform to a point: rotate then translate.
    #[must_use]
    pub fn transform_point(self, point: Vec2<f32>) -> Vec2<f32> {
        self.q.rotate(point) + self.p
    }

    /// The exact inverse of [`Self::transform_point`].
    #[must_use]
    pub fn inv_transform_point(self, point: Vec2<f32>) -> Vec2<f32> {
        self.q.inv_rotate(point - self.p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_round_trip() {
        let r = Rotation2::from_angle(0.7);
        let v = Vec2::new(1.0, 2.0);
        let rotated = r.rotate(v);
        let back = r.inv_rotate(rotated);
        assert!((back.x - v.x).abs() < 1e-5);
        assert!((back.y - v.y).abs() < 1e-5);
    }

    #[test]
    fn transform_round_trip() {
        let xf = Transform2 {
            p: Vec2::new(3.0, -2.0),
            q: Rotation2::from_angle(1.2),
        };
        let p = Vec2::new(5.0, 7.0);
        let world = xf.transform_point(p);
        let local = xf.inv_transform_point(world);
        assert!((local.x - p.x).abs() < 1e-5);
        assert!((local.y - p.y).abs() < 1e-5);
    }

    #[test]
    fn composition_matches_sequential_rotation() {
        let a = Rotation2::from_angle(0.3);
        let b = Rotation2::from_angle(0.5);
        let combined = a.mul(b);
        assert!((combined.angle() - 0.8).abs() < 1e-5);
    }
}
