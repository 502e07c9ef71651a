// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Speculative contact manifolds built directly from GJK distance queries.
//!
//! Rather than separating-axis clipping against reference/incident edges,
//! a manifold here is always a single witness point produced once two
//! shapes come within `max_distance` of each other — the same
//! distance-driven contact generation Box2D's newer solver uses, which
//! only needs deep polygon clipping once shapes are already overlapping
//! (a case the outer continuous-collision loop is meant to prevent).

use understory_buffer::ArrayBuffer;
use understory_geom::{Transform2, Vec2};

use crate::distance::{shape_distance, DistanceInput};
use crate::shapes::{Capsule, Circle, Polygon};
use crate::simplex::DistanceCache;

/// A single contact point within a [`Manifold`].
#[derive(Copy, Clone, Debug, Default)]
pub struct ManifoldPoint {
    /// World-space contact point, the midpoint of the two witness points.
    pub point: Vec2<f32>,
    /// Gap between the two surfaces; negative once overlapping.
    pub separation: f32,
    /// Accumulated normal impulse, carried across steps by the caller for
    /// warm-starting a solver; unused by manifold generation itself.
    pub normal_impulse: f32,
    /// Accumulated tangent (friction) impulse, same caveat as above.
    pub tangent_impulse: f32,
    /// Feature id identifying which vertex/edge pair produced this point,
    /// so a solver can match points across frames.
    pub id: u16,
    /// Set by the caller once it has matched this point against a prior
    /// step's manifold and carried its impulses forward.
    pub persisted: bool,
}

/// A contact manifold between two convex shapes: zero points if they are
/// farther apart than the query's `max_distance`, one otherwise (these
/// shapes never produce two-point manifolds; see the module docs).
#[derive(Copy, Clone, Debug, Default)]
pub struct Manifold {
    /// Contact points (at most the first entry is ever populated).
    pub points: ArrayBuffer<ManifoldPoint, 2>,
    /// World-space contact normal, pointing from shape A toward shape B.
    pub normal: Vec2<f32>,
}

impl Manifold {
    fn empty() -> Self {
        Self { points: ArrayBuffer::new(), normal: Vec2::zero() }
    }
}

fn single_point_manifold(point_a: Vec2<f32>, point_b: Vec2<f32>, distance: f32, max_distance: f32) -> Manifold {
    if distance > max_distance {
        return Manifold::empty();
    }

    let normal = if distance > f32::EPSILON { (point_b - point_a).normalize() } else { Vec2::zero() };
    let point = Vec2::new(0.5 * (point_a.x + point_b.x), 0.5 * (point_a.y + point_b.y));

    let mut points = ArrayBuffer::new();
    points.push(ManifoldPoint { point, separation: distance, normal_impulse: 0.0, tangent_impulse: 0.0, id: 0, persisted: false });

    Manifold { points, normal }
}

/// Contact manifold between two circles.
#[must_use]
pub fn collide_circles(a: &Circle, xf_a: Transform2, b: &Circle, xf_b: Transform2, max_distance: f32) -> Manifold {
    let center_a = xf_a.transform_point(a.point);
    let center_b = xf_b.transform_point(b.point);
    let d = center_b - center_a;
    let dist = d.length();
    let separation = dist - a.radius - b.radius;

    if separation > max_distance {
        return Manifold::empty();
    }

    let normal = if dist > f32::EPSILON { d.normalize() } else { Vec2::new(1.0, 0.0) };
    let point_a = center_a + normal * a.radius;
    let point_b = center_b - normal * b.radius;
    let point = Vec2::new(0.5 * (point_a.x + point_b.x), 0.5 * (point_a.y + point_b.y));

    let mut points = ArrayBuffer::new();
    points.push(ManifoldPoint { point, separation, normal_impulse: 0.0, tangent_impulse: 0.0, id: 0, persisted: false });

    Manifold { points, normal }
}

/// Contact manifold between a capsule and a circle.
#[must_use]
pub fn collide_capsule_and_circle(a: &Capsule, xf_a: Transform2, b: &Circle, xf_b: Transform2, max_distance: f32) -> Manifold {
    let mut cache = DistanceCache::default();
    let input = DistanceInput {
        proxy_a: a.to_proxy(),
        proxy_b: b.to_proxy(),
        transform_a: xf_a,
        transform_b: xf_b,
        use_radii: true,
    };
    let output = shape_distance(&mut cache, &input);
    single_point_manifold(output.point_a, output.point_b, output.distance, max_distance)
}

/// Contact manifold between two capsules; `cache` warm-starts the
/// underlying GJK search across successive calls for the same pair.
#[must_use]
pub fn collide_capsules(a: &Capsule, xf_a: Transform2, b: &Capsule, xf_b: Transform2, max_distance: f32, cache: &mut DistanceCache) -> Manifold {
    let input = DistanceInput { proxy_a: a.to_proxy(), proxy_b: b.to_proxy(), transform_a: xf_a, transform_b: xf_b, use_radii: true };
    let output = shape_distance(cache, &input);
    single_point_manifold(output.point_a, output.point_b, output.distance, max_distance)
}

/// Contact manifold between a polygon and a circle.
#[must_use]
pub fn collide_polygon_and_circle(a: &Polygon, xf_a: Transform2, b: &Circle, xf_b: Transform2, max_distance: f32) -> Manifold {
    let mut cache = DistanceCache::default();
    let input = DistanceInput { proxy_a: a.to_proxy(), proxy_b: b.to_proxy(), transform_a: xf_a, transform_b: xf_b, use_radii: true };
    let output = shape_distance(&mut cache, &input);
    single_point_manifold(output.point_a, output.point_b, output.distance, max_distance)
}

/// Contact manifold between two convex polygons; `cache` warm-starts the
/// underlying GJK search across successive calls for the same pair.
#[must_use]
pub fn collide_polygons(a: &Polygon, xf_a: Transform2, b: &Polygon, xf_b: Transform2, max_distance: f32, cache: &mut DistanceCache) -> Manifold {
    let input = DistanceInput { proxy_a: a.to_proxy(), proxy_b: b.to_proxy(), transform_a: xf_a, transform_b: xf_b, use_radii: true };
    let output = shape_distance(cache, &input);
    single_point_manifold(output.point_a, output.point_b, output.distance, max_distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_circles_produce_one_point() {
        let a = Circle { point: Vec2::zero(), radius: 1.0 };
        let b = Circle { point: Vec2::new(2.0, 0.0), radius: 1.0 };
        let manifold = collide_circles(&a, Transform2::identity(), &b, Transform2::identity(), 0.01);
        assert_eq!(manifold.points.len(), 1);
        assert!(manifold.points[0].separation.abs() < 1e-4);
    }

    #[test]
    fn distant_circles_produce_no_manifold() {
        let a = Circle { point: Vec2::zero(), radius: 1.0 };
        let b = Circle { point: Vec2::new(10.0, 0.0), radius: 1.0 };
        let manifold = collide_circles(&a, Transform2::identity(), &b, Transform2::identity(), 0.01);
        assert_eq!(manifold.points.len(), 0);
    }
}
