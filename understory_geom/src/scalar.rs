// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Scalar`] trait: the numeric element type shared by the AABB and
//! spatial-index crates.

use core::fmt::Debug;
use core::ops::{Add, Div, Mul, Neg, Sub};

/// A numeric type usable as the element type of a [`Vec2`](crate::Vec2), an
/// AABB, or any of the spatial indices.
///
/// Implemented for `f32`, `f64`, `i32` and `i64`, matching the
/// `RTreeF32`/`RTreeF64`/`RTreeI64` and `BvhF32`/`BvhF64`/`BvhI64` type-alias
/// families the spatial-index crate exposes.
pub trait Scalar:
    Copy
    + PartialOrd
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// The additive identity.
    const ZERO: Self;
    /// The multiplicative identity.
    const ONE: Self;
    /// Largest finite value (or `MAX` for integer types).
    const MAX: Self;
    /// Smallest finite value (or `MIN` for integer types).
    const MIN: Self;
    /// Default fuzzy-comparison epsilon for this type (`0` for integers).
    const EPSILON: Self;

    /// Absolute value.
    #[must_use]
    fn abs(self) -> Self;

    /// Componentwise minimum.
    #[must_use]
    fn min(self, other: Self) -> Self;

    /// Componentwise maximum.
    #[must_use]
    fn max(self, other: Self) -> Self;

    /// Converts to `f64` for intermediate computations (length, volume).
    #[must_use]
    fn to_f64(self) -> f64;

    /// Converts from `f64`, saturating for integer types.
    #[must_use]
    fn from_f64(v: f64) -> Self;
}

macro_rules! impl_scalar_float {
    ($t:ty) => {
        impl Scalar for $t {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            const MAX: Self = <$t>::MAX;
            const MIN: Self = <$t>::MIN;
            const EPSILON: Self = <$t>::EPSILON;

            #[inline]
            fn abs(self) -> Self {
                <$t>::abs(self)
            }
            #[inline]
            fn min(self, other: Self) -> Self {
                <$t>::min(self, other)
            }
            #[inline]
            fn max(self, other: Self) -> Self {
                <$t>::max(self, other)
            }
            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }
        }
    };
}

macro_rules! impl_scalar_int {
    ($t:ty) => {
        impl Scalar for $t {
            const ZERO: Self = 0;
            const ONE: Self = 1;
            const MAX: Self = <$t>::MAX;
            const MIN: Self = <$t>::MIN;
            const EPSILON: Self = 0;

            #[inline]
            fn abs(self) -> Self {
                <$t>::abs(self)
            }
            #[inline]
            fn min(self, other: Self) -> Self {
                core::cmp::Ord::min(self, other)
            }
            #[inline]
            fn max(self, other: Self) -> Self {
                core::cmp::Ord::max(self, other)
            }
            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }
        }
    };
}

impl_scalar_float!(f32);
impl_scalar_float!(f64);
impl_scalar_int!(i32);
impl_scalar_int!(i64);
