// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Geom: scalar and vector math shared by the spatial-index and
//! collision crates.
//!
//! This crate provides the leaf numeric layer the rest of the geometry
//! toolkit builds on:
//!
//! - [`Scalar`]: a small numeric trait implemented for `f32`, `f64`, `i32`
//!   and `i64`, letting the AABB and spatial-index crates stay generic over
//!   element type without pulling in a general-purpose numeric-traits crate.
//! - [`Vec2`]: a 2D vector over any [`Scalar`].
//! - [`Rotation2`] / [`Transform2`]: rigid 2D rotations and transforms,
//!   `f32`-only (collision math has no meaningful fixed-point variant).
//! - [`Sweep`]: a linearly-interpolated center/angle pair used for continuous
//!   collision detection.
//! - [`fisr`]: the classic fast inverse square root, documented as an
//!   approximation.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_geom::Vec2;
//!
//! let a = Vec2::new(3.0_f32, 4.0);
//! assert_eq!(a.length(), 5.0);
//! assert_eq!(a.normalize(), Vec2::new(0.6, 0.8));
//! ```

#![no_std]

mod scalar;
mod sweep;
mod transform;
mod vec2;

pub use scalar::Scalar;
pub use sweep::Sweep;
pub use transform::{Rotation2, Transform2};
pub use vec2::Vec2;

/// Fast inverse square root via the classic bit-hack seed and Newton
/// refinement.
///
/// `refinements` should be in `[0, 3]`; each refinement roughly doubles the
/// number of correct bits. This is an *approximation*: do not rely on it for
/// anything needing exact results.
#[must_use]
pub fn fisr(x: f32, refinements: u32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    let i = x.to_bits();
    let i = 0x5f3759df_u32.wrapping_sub(i >> 1);
    let mut y = f32::from_bits(i);
    let x_half = 0.5 * x;
    for _ in 0..refinements.min(3) {
        y *= 1.5 - x_half * y * y;
    }
    y
}

/// Default fuzzy-equality epsilon for a [`Scalar`] type.
#[must_use]
pub fn default_epsilon<T: Scalar>() -> T {
    T::EPSILON
}

/// Returns `true` if `a` and `b` are equal within `epsilon`.
#[must_use]
pub fn near_equal<T: Scalar>(a: T, b: T, epsilon: T) -> bool {
    (a - b).abs() <= epsilon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fisr_approximates_inverse_sqrt() {
        let x = 4.0_f32;
        let approx = fisr(x, 2);
        let exact = 1.0 / x.sqrt();
        assert!((approx - exact).abs() < 0.001, "{approx} vs {exact}");
    }

    #[test]
    fn fisr_of_nonpositive_is_zero() {
        assert_eq!(fisr(0.0, 1), 0.0);
        assert_eq!(fisr(-1.0, 1), 0.0);
    }

    #[test]
    fn near_equal_respects_epsilon() {
        assert!(near_equal(1.0_f32, 1.0000001, 1e-5));
        assert!(!near_equal(1.0_f32, 1.1, 1e-5));
    }
}
