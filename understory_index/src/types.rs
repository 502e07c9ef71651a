// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared 2D AABB type used by every backend in this crate.

/// A 2D axis-aligned bounding box over element type `T`.
///
/// This is a plain alias for [`understory_aabb::Aabb<T, 2>`], so every
/// backend in this crate gets the full AABB algebra (union, containment,
/// quadrant splitting, ray casting) for free.
pub type Aabb2D<T> = understory_aabb::Aabb<T, 2>;
