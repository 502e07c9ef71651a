// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! External interface traits shared by the classical R-tree ([`crate::rtree`])
//! and quadtree ([`crate::quadtree`]) backends: a narrow node allocator hook
//! and a duck-typed "indexable" trait letting callers store ids or external
//! handles while the tree looks up bounding boxes separately.

use crate::types::Aabb2D;
use understory_geom::Scalar;

/// Allocates and frees tree nodes.
///
/// A default heap-backed implementation (`alloc::boxed::Box`) is used when
/// no caller-provided allocator is given. Pool/bump allocators satisfying
/// this trait are expected to work; trees never dereference a deallocated
/// node.
pub trait Allocator<Node> {
    /// Allocates a new node for the given tree `level` (`0` for leaves).
    fn allocate(&mut self, level: u32) -> Node;

    /// Frees a previously allocated node.
    fn deallocate(&mut self, node: Node);
}

/// Lets the tree query a caller-chosen value's bounding box through a
/// separate lookup rather than requiring values to carry their own bounds
/// inline.
pub trait Indexable<V, T: Scalar> {
    /// The value's lower bound on each axis.
    fn min(&self, value: &V) -> [T; 2];

    /// The value's upper bound on each axis.
    fn max(&self, value: &V) -> [T; 2];

    /// The value's bounding box, built from [`Indexable::min`] and
    /// [`Indexable::max`].
    fn bbox(&self, value: &V) -> Aabb2D<T> {
        Aabb2D::new(self.min(value), self.max(value))
    }
}

/// A query predicate: a bounding box plus a test against candidate boxes.
///
/// Factories [`Predicate::intersects`], [`Predicate::contains`] and
/// [`Predicate::within`] build the three standard predicates used by the
/// classical R-tree and quadtree query methods.
pub trait Predicate<T: Scalar> {
    /// The predicate's own bounding box, used to prune subtrees that can't
    /// possibly match.
    fn bbox(&self) -> Aabb2D<T>;

    /// Tests a candidate box against the predicate.
    fn test(&self, candidate: &Aabb2D<T>) -> bool;
}

/// `true` if `candidate` intersects `query`.
#[derive(Copy, Clone, Debug)]
pub struct Intersects<T: Scalar>(pub Aabb2D<T>);

impl<T: Scalar> Predicate<T> for Intersects<T> {
    fn bbox(&self) -> Aabb2D<T> {
        self.0
    }
    fn test(&self, candidate: &Aabb2D<T>) -> bool {
        self.0.overlaps(candidate)
    }
}

/// `true` if `query` contains `candidate`.
#[derive(Copy, Clone, Debug)]
pub struct Contains<T: Scalar>(pub Aabb2D<T>);

impl<T: Scalar> Predicate<T> for Contains<T> {
    fn bbox(&self) -> Aabb2D<T> {
        self.0
    }
    fn test(&self, candidate: &Aabb2D<T>) -> bool {
        self.0.contains_box(candidate)
    }
}

/// `true` if `candidate`'s lower corner lies inside `query`; used for
/// point-like data.
#[derive(Copy, Clone, Debug)]
pub struct Within<T: Scalar>(pub Aabb2D<T>);

impl<T: Scalar> Predicate<T> for Within<T> {
    fn bbox(&self) -> Aabb2D<T> {
        self.0
    }
    fn test(&self, candidate: &Aabb2D<T>) -> bool {
        self.0.contains_point(candidate.lower)
    }
}

/// Builds an [`Intersects`] predicate.
#[must_use]
pub fn intersects<T: Scalar>(bbox: Aabb2D<T>) -> Intersects<T> {
    Intersects(bbox)
}

/// Builds a [`Contains`] predicate.
#[must_use]
pub fn contains<T: Scalar>(bbox: Aabb2D<T>) -> Contains<T> {
    Contains(bbox)
}

/// Builds a [`Within`] predicate.
#[must_use]
pub fn within<T: Scalar>(bbox: Aabb2D<T>) -> Within<T> {
    Within(bbox)
}
