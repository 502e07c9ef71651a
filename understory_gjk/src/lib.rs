// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory GJK: a GJK-based collision core for convex 2D shapes.
//!
//! This crate answers the questions a physics or hit-testing layer needs
//! about a pair of convex shapes:
//!
//! - [`shape_distance`]: the closest points and distance between them.
//! - [`shape_cast`]: the first time one shape, swept along a straight
//!   translation, touches another.
//! - [`time_of_impact`]: the first time two shapes, each following its own
//!   [`understory_geom::Sweep`], touch.
//! - [`compute_hull`]: the convex hull of a point cloud, as a polygon
//!   vertex list.
//! - the [`manifold`] module: speculative contact points for a physics
//!   solver to consume.
//!
//! All of it is built on [`DistanceProxy`], a shape reduced to a short
//! vertex list plus a rounding radius — every [`shapes`] primitive
//! (circle, capsule, polygon, segment) converts to one.

#![no_std]

extern crate alloc;

mod distance;
mod hull;
mod proxy;
pub mod manifold;
pub mod raycast;
pub mod shapecast;
pub mod shapes;
mod simplex;
mod toi;

pub use distance::{shape_distance, DistanceInput, DistanceOutput};
pub use hull::{compute_hull, validate_hull, Hull};
pub use proxy::{DistanceProxy, LINEAR_SLOP, MAX_POLY_VERTS};
pub use raycast::{ray_cast_capsule, ray_cast_circle, ray_cast_polygon, ray_cast_segment, RayCastInput};
pub use shapecast::{shape_cast, RayHit, ShapeCastInput};
pub use simplex::DistanceCache;
pub use toi::{time_of_impact, ToiInput, ToiOutput, ToiState};
