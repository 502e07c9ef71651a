// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Index: four spatial indices over 2D AABBs, sharing one AABB
//! type ([`Aabb2D`]) and a common `Backend` abstraction where their APIs
//! actually overlap.
//!
//! - [`rtree_packed`]: a packed, immutable-after-build Hilbert R-tree
//!   ([`rtree_packed::FlatbushIndex`]) for static scenes — bulk load once,
//!   query many times.
//! - [`bvh`]: a dynamic bounding-volume hierarchy ([`bvh::Bvh`]) for scenes
//!   that move — incremental insert/move/remove with AVL-style rebalancing.
//!   Implements the shared [`Backend`] trait.
//! - [`rtree`]: a classical R-tree with quadratic split
//!   ([`rtree::RTree`]), generic over caller-defined values via the
//!   [`Indexable`] trait, supporting hierarchical queries and k-nearest
//!   search.
//! - [`quadtree`]: a hierarchical quadtree ([`quadtree::Quadtree`]) with
//!   containment-factor-aware hierarchical queries.
//!
//! All four share [`Aabb2D`] (a 2D specialization of
//! `understory_aabb::Aabb`) for their bounding boxes, and C8/C9 share the
//! [`Indexable`] and [`Allocator`] traits from `backend.rs`'s sibling
//! `interfaces` module.

#![no_std]

extern crate alloc;

mod backend;
mod types;

pub mod backends;
pub mod bvh;
pub mod interfaces;
pub mod quadtree;
pub mod rtree;
pub mod rtree_packed;

pub use backend::{Backend, SubtreeFilter, SubtreeSummary};
pub use interfaces::{Allocator, Indexable, Predicate};
pub use types::Aabb2D;
