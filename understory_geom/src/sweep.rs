// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sweeps: a rigid body's interpolated pose over the normalized time range
//! `[0, 1]`, used by continuous collision detection (time-of-impact).

use crate::{Rotation2, Transform2, Vec2};

/// A linearly-interpolated center-of-mass and angle over `[0, 1]`.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Sweep {
    /// Local center of mass, in body space.
    pub local_center: Vec2<f32>,
    /// World center of mass at `t = 0`.
    pub c1: Vec2<f32>,
    /// World center of mass at `t = 1`.
    pub c2: Vec2<f32>,
    /// World rotation at `t = 0`.
    pub a1: Rotation2,
    /// World rotation at `t = 1`.
    pub a2: Rotation2,
}

impl Sweep {
    /// Builds a sweep that doesn't move: `c1 == c2`, `a1 == a2`.
    #[must_use]
    pub fn stationary(center: Vec2<f32>, rotation: Rotation2) -> Self {
        Self {
            local_center: Vec2::zero(),
            c1: center,
            c2: center,
            a1: rotation,
            a2: rotation,
        }
    }

    /// Interpolates the sweep to normalized time `t`, returning a
    /// [`Transform2`] mapping body-local coordinates to world coordinates.
    #[must_use]
    pub fn get_transform(&self, t: f32) -> Transform2 {
        let c = self.c1.lerp(self.c2, t);
        let q = self.a1.nlerp(self.a2, t);
        // The stored center is the center of mass, offset from the body
        // origin by `local_center`; undo that offset to get the origin's
        // world position.
        let p = c - q.rotate(self.local_center);
        Transform2 { p, q }
    }

    /// Advances `a1`/`c1` to the pose at time `alpha`, used by TOI to
    /// "consume" sub-steps of a sweep as the outer loop progresses.
    pub fn advance(&mut self, alpha: f32) {
        self.c1 = self.c1.lerp(self.c2, alpha);
        self.a1 = self.a1.nlerp(self.a2, alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stationary_sweep_is_constant() {
        let sweep = Sweep::stationary(Vec2::new(1.0, 2.0), Rotation2::IDENTITY);
        let xf0 = sweep.get_transform(0.0);
        let xf1 = sweep.get_transform(1.0);
        assert_eq!(xf0.p, xf1.p);
    }

    #[test]
    fn moving_sweep_interpolates_center() {
        let sweep = Sweep {
            local_center: Vec2::zero(),
            c1: Vec2::new(0.0, 0.0),
            c2: Vec2::new(10.0, 0.0),
            a1: Rotation2::IDENTITY,
            a2: Rotation2::IDENTITY,
        };
        let xf = sweep.get_transform(0.5);
        assert!((xf.p.x - 5.0).abs() < 1e-6);
    }

    #[test]
    fn advance_moves_start_of_sweep() {
        let mut sweep = Sweep {
            local_center: Vec2::zero(),
            c1: Vec2::new(0.0, 0.0),
            c2: Vec2::new(10.0, 0.0),
            a1: Rotation2::IDENTITY,
            a2: Rotation2::IDENTITY,
        };
        sweep.advance(0.5);
        assert!((sweep.c1.x - 5.0).abs() < 1e-6);
    }
}
