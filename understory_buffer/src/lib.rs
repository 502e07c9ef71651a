// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Buffer: growable typed buffers with pluggable
//! capacity-growth policies, plus a fixed-capacity array variant for the
//! bounded-size collections the collision core needs (simplices, hulls,
//! manifolds never exceed 8 elements).
//!
//! [`Buffer<T, P>`] matches a standard dynamic array with explicit
//! `reserve`/`reserve_fit`/`resize` contracts and a type-parameterized
//! growth policy ([`MultiplyBy`] or [`AddBy`]). The source's POD
//! fast-path (`resize_no_construct`, a no-op for trivially-constructible
//! element types) is gated behind the local [`Pod`] marker trait, but is
//! implemented with ordinary safe default-construction rather than a
//! `memcpy`/no-op elision: this workspace denies `unsafe_code`, so there is
//! no way to skip construction without also skipping the zero-initialization
//! that makes it sound. The documented *semantics* (size changes without the
//! caller observing stale data) are preserved; the documented *mechanism*
//! (skip construction entirely) is not available in safe Rust.
//!
//! [`ArrayBuffer<T, N>`] is a fixed-capacity, allocation-free buffer used by
//! the GJK core for distance proxies, hulls and manifolds, none of which
//! ever exceed a handful of elements.

#![no_std]

extern crate alloc;

mod array;
mod growth;

pub use array::ArrayBuffer;
pub use growth::{AddBy, GrowthPolicy, MultiplyBy};

use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

/// Marker trait for element types whose default value can stand in for
/// "not yet constructed" without asserting anything about their bit
/// pattern. Implemented for the small set of POD-like primitives this
/// workspace actually stores in bulk.
pub trait Pod: Copy + Default {}

impl Pod for u8 {}
impl Pod for u16 {}
impl Pod for u32 {}
impl Pod for u64 {}
impl Pod for i8 {}
impl Pod for i16 {}
impl Pod for i32 {}
impl Pod for i64 {}
impl Pod for f32 {}
impl Pod for f64 {}
impl Pod for usize {}

/// The size type cannot represent the requested growth.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LengthError {
    /// The capacity that was requested.
    pub requested: usize,
    /// The configured maximum capacity.
    pub max_size: usize,
}

impl fmt::Display for LengthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requested capacity {} exceeds max_size {}",
            self.requested, self.max_size
        )
    }
}

impl core::error::Error for LengthError {}

/// A growable buffer over element type `T` with growth policy `P`
/// (default: double on each growth).
pub struct Buffer<T, P = MultiplyBy<2, 1>> {
    data: Vec<T>,
    max_size: usize,
    _policy: PhantomData<P>,
}

impl<T, P: GrowthPolicy> Buffer<T, P> {
    /// Creates an empty buffer with no configured maximum capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_size(usize::MAX)
    }

    /// Creates an empty buffer whose capacity will never be grown past
    /// `max_size`.
    #[must_use]
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            data: Vec::new(),
            max_size,
            _policy: PhantomData,
        }
    }

    /// Logical size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` if the buffer holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Grows capacity to at least `n` using the configured growth policy,
    /// without changing the logical size.
    pub fn reserve(&mut self, n: usize) -> Result<(), LengthError> {
        if n > self.max_size {
            return Err(LengthError {
                requested: n,
                max_size: self.max_size,
            });
        }
        let mut target = self.data.capacity();
        while target < n {
            let grown = P::grow(target).min(self.max_size);
            if grown <= target {
                target = n;
                break;
            }
            target = grown;
        }
        let additional = target.saturating_sub(self.data.len());
        self.data.reserve(additional);
        Ok(())
    }

    /// Sets capacity to exactly (at least, on allocators that round up)
    /// `n`.
    pub fn reserve_fit(&mut self, n: usize) -> Result<(), LengthError> {
        if n > self.max_size {
            return Err(LengthError {
                requested: n,
                max_size: self.max_size,
            });
        }
        let additional = n.saturating_sub(self.data.len());
        self.data.reserve_exact(additional);
        Ok(())
    }

    /// Appends `value`, growing capacity first if needed.
    pub fn push(&mut self, value: T) -> Result<(), LengthError> {
        if self.data.len() == self.data.capacity() {
            self.reserve(self.data.len() + 1)?;
        }
        self.data.push(value);
        Ok(())
    }

    /// Returns the element at `index`, using [`understory_optional::Optional`]
    /// as the carrier rather than `core::option::Option` to match the rest
    /// of this crate family's pervasive-optional convention.
    #[must_use]
    pub fn get(&self, index: usize) -> understory_optional::Optional<&T> {
        self.data.get(index).into()
    }

    /// Returns a slice view of the logical contents.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns a mutable slice view of the logical contents.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Default + Clone, P: GrowthPolicy> Buffer<T, P> {
    /// Grows or shrinks to size `n`, default-constructing any new slots.
    pub fn resize_default(&mut self, n: usize) -> Result<(), LengthError> {
        self.reserve(n)?;
        self.data.resize(n, T::default());
        Ok(())
    }
}

impl<T: Clone, P: GrowthPolicy> Buffer<T, P> {
    /// Grows or shrinks to size `n`, copy-constructing any new slots from
    /// `value`.
    pub fn resize_with_value(&mut self, n: usize, value: T) -> Result<(), LengthError> {
        self.reserve(n)?;
        self.data.resize(n, value);
        Ok(())
    }
}

impl<T: Pod, P: GrowthPolicy> Buffer<T, P> {
    /// POD fast path: makes size `n` without the caller observing stale
    /// data. See the module docs for why this still default-constructs new
    /// slots rather than skipping construction.
    pub fn resize_no_construct(&mut self, n: usize) -> Result<(), LengthError> {
        self.reserve(n)?;
        self.data.resize_with(n, T::default);
        Ok(())
    }
}

impl<T, P: GrowthPolicy> Default for Buffer<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, P> fmt::Debug for Buffer<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.data.len())
            .field("capacity", &self.data.capacity())
            .field("max_size", &self.max_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_grows_capacity() {
        let mut buf: Buffer<i32> = Buffer::new();
        for i in 0..10 {
            buf.push(i).unwrap();
        }
        assert_eq!(buf.len(), 10);
        assert!(buf.capacity() >= 10);
    }

    #[test]
    fn reserve_respects_max_size() {
        let mut buf: Buffer<i32> = Buffer::with_max_size(4);
        assert!(buf.reserve(4).is_ok());
        assert!(buf.reserve(5).is_err());
    }

    #[test]
    fn resize_default_grows_and_shrinks() {
        let mut buf: Buffer<i32> = Buffer::new();
        buf.resize_default(3).unwrap();
        assert_eq!(buf.as_slice(), &[0, 0, 0]);
        buf.resize_default(1).unwrap();
        assert_eq!(buf.as_slice(), &[0]);
    }

    #[test]
    fn add_by_policy_grows_linearly() {
        let mut buf: Buffer<u8, AddBy<4>> = Buffer::new();
        buf.reserve(1).unwrap();
        let cap_after_first = buf.capacity();
        assert!(cap_after_first >= 4);
        buf.reserve(cap_after_first + 1).unwrap();
        assert!(buf.capacity() >= cap_after_first + 4);
    }
}
