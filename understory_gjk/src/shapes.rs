// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The four convex primitives the collision core operates on, each reduced
//! to a [`DistanceProxy`] for GJK and carrying its own AABB and point-in-shape
//! test.

use understory_aabb::Aabb;
use understory_geom::{Transform2, Vec2};

use crate::proxy::{DistanceProxy, MAX_POLY_VERTS};

/// An AABB in world space, aligned with [`understory_aabb::Aabb`]'s 2D form.
pub type ShapeAabb = Aabb<f32, 2>;

/// A disc of a given radius about a point.
#[derive(Copy, Clone, Debug)]
pub struct Circle {
    /// Center, in body-local space.
    pub point: Vec2<f32>,
    /// Radius.
    pub radius: f32,
}

impl Circle {
    /// Builds the proxy GJK operates on.
    #[must_use]
    pub fn to_proxy(&self) -> DistanceProxy {
        DistanceProxy::new(&[self.point], self.radius)
    }
}

/// A line segment swept by a radius (a "stadium" shape).
#[derive(Copy, Clone, Debug)]
pub struct Capsule {
    /// First endpoint, in body-local space.
    pub point1: Vec2<f32>,
    /// Second endpoint, in body-local space.
    pub point2: Vec2<f32>,
    /// Radius.
    pub radius: f32,
}

impl Capsule {
    /// Builds the proxy GJK operates on.
    #[must_use]
    pub fn to_proxy(&self) -> DistanceProxy {
        DistanceProxy::new(&[self.point1, self.point2], self.radius)
    }
}

/// A convex polygon with an optional rounding radius, up to
/// [`MAX_POLY_VERTS`] vertices, given in counter-clockwise order.
#[derive(Copy, Clone, Debug)]
pub struct Polygon {
    /// Vertices, counter-clockwise, up to [`MAX_POLY_VERTS`].
    pub vertices: [Vec2<f32>; MAX_POLY_VERTS],
    /// Number of valid entries in `vertices`.
    pub count: usize,
    /// Rounding radius (0 for a sharp polygon).
    pub radius: f32,
}

impl Polygon {
    /// Builds a polygon from a slice of up to [`MAX_POLY_VERTS`]
    /// counter-clockwise vertices.
    #[must_use]
    pub fn new(vertices: &[Vec2<f32>], radius: f32) -> Self {
        let mut array = [Vec2::zero(); MAX_POLY_VERTS];
        let count = vertices.len().min(MAX_POLY_VERTS);
        array[..count].copy_from_slice(&vertices[..count]);
        Self { vertices: array, count, radius }
    }

    /// Builds the proxy GJK operates on.
    #[must_use]
    pub fn to_proxy(&self) -> DistanceProxy {
        DistanceProxy::new(&self.vertices[..self.count], self.radius)
    }
}

/// A bare line segment (a zero-radius [`Capsule`]).
#[derive(Copy, Clone, Debug)]
pub struct Segment {
    /// First endpoint, in body-local space.
    pub p1: Vec2<f32>,
    /// Second endpoint, in body-local space.
    pub p2: Vec2<f32>,
}

impl Segment {
    /// Builds the proxy GJK operates on.
    #[must_use]
    pub fn to_proxy(&self) -> DistanceProxy {
        DistanceProxy::new(&[self.p1, self.p2], 0.0)
    }
}

/// Tests whether a world-space `point` lies within `radius` of a circle
/// placed at `transform`.
#[must_use]
pub fn point_in_circle(circle: &Circle, transform: Transform2, point: Vec2<f32>) -> bool {
    let center = transform.transform_point(circle.point);
    (point - center).length_squared() <= circle.radius * circle.radius
}

/// Tests whether a world-space `point` lies within `radius` of the segment
/// `point1`-`point2` of a capsule placed at `transform`.
#[must_use]
pub fn point_in_capsule(capsule: &Capsule, transform: Transform2, point: Vec2<f32>) -> bool {
    let p1 = transform.transform_point(capsule.point1);
    let p2 = transform.transform_point(capsule.point2);
    let e = p2 - p1;
    let len_sq = e.length_squared();
    let t = if len_sq > f32::EPSILON { ((point - p1).dot(e) / len_sq).clamp(0.0, 1.0) } else { 0.0 };
    let closest = p1 + e * t;
    (point - closest).length_squared() <= capsule.radius * capsule.radius
}

/// Tests whether a world-space `point` lies inside (or within the rounding
/// radius of) a convex polygon placed at `transform`, via half-plane tests
/// against every edge.
#[must_use]
pub fn point_in_polygon(polygon: &Polygon, transform: Transform2, point: Vec2<f32>) -> bool {
    let local = transform.inv_transform_point(point);
    let n = polygon.count;
    if n == 0 {
        return false;
    }

    for i in 0..n {
        let p1 = polygon.vertices[i];
        let p2 = polygon.vertices[(i + 1) % n];
        let edge = p2 - p1;
        let normal = Vec2::new(edge.y, -edge.x).normalize();
        let separation = normal.dot(local - p1);
        if separation > polygon.radius {
            return false;
        }
    }

    true
}

/// Computes the AABB of a circle at `transform`.
#[must_use]
pub fn compute_circle_aabb(circle: &Circle, transform: Transform2) -> ShapeAabb {
    let p = transform.transform_point(circle.point);
    let r = circle.radius;
    ShapeAabb::new([p.x - r, p.y - r], [p.x + r, p.y + r])
}

/// Computes the AABB of a capsule at `transform`.
#[must_use]
pub fn compute_capsule_aabb(capsule: &Capsule, transform: Transform2) -> ShapeAabb {
    let p1 = transform.transform_point(capsule.point1);
    let p2 = transform.transform_point(capsule.point2);
    let r = capsule.radius;
    let lower = [p1.x.min(p2.x) - r, p1.y.min(p2.y) - r];
    let upper = [p1.x.max(p2.x) + r, p1.y.max(p2.y) + r];
    ShapeAabb::new(lower, upper)
}

/// Computes the AABB of a polygon at `transform`.
#[must_use]
pub fn compute_polygon_aabb(polygon: &Polygon, transform: Transform2) -> ShapeAabb {
    let n = polygon.count;
    if n == 0 {
        return ShapeAabb::empty();
    }
    let mut world = transform.transform_point(polygon.vertices[0]);
    let mut lower = [world.x, world.y];
    let mut upper = [world.x, world.y];
    for i in 1..n {
        world = transform.transform_point(polygon.vertices[i]);
        lower[0] = lower[0].min(world.x);
        lower[1] = lower[1].min(world.y);
        upper[0] = upper[0].max(world.x);
        upper[1] = upper[1].max(world.y);
    }
    let r = polygon.radius;
    ShapeAabb::new([lower[0] - r, lower[1] - r], [upper[0] + r, upper[1] + r])
}

/// Computes the AABB of a bare segment at `transform`.
#[must_use]
pub fn compute_segment_aabb(segment: &Segment, transform: Transform2) -> ShapeAabb {
    let p1 = transform.transform_point(segment.p1);
    let p2 = transform.transform_point(segment.p2);
    ShapeAabb::new([p1.x.min(p2.x), p1.y.min(p2.y)], [p1.x.max(p2.x), p1.y.max(p2.y)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_in_circle_respects_radius() {
        let circle = Circle { point: Vec2::zero(), radius: 2.0 };
        let xf = Transform2::identity();
        assert!(point_in_circle(&circle, xf, Vec2::new(1.0, 1.0)));
        assert!(!point_in_circle(&circle, xf, Vec2::new(2.0, 2.0)));
    }

    #[test]
    fn point_in_capsule_covers_the_rounded_caps() {
        let capsule = Capsule { point1: Vec2::new(-1.0, 0.0), point2: Vec2::new(1.0, 0.0), radius: 0.5 };
        let xf = Transform2::identity();
        assert!(point_in_capsule(&capsule, xf, Vec2::new(1.4, 0.0)));
        assert!(!point_in_capsule(&capsule, xf, Vec2::new(1.6, 0.0)));
    }

    #[test]
    fn point_in_polygon_unit_square() {
        let square = Polygon::new(
            &[Vec2::new(-1.0, -1.0), Vec2::new(1.0, -1.0), Vec2::new(1.0, 1.0), Vec2::new(-1.0, 1.0)],
            0.0,
        );
        let xf = Transform2::identity();
        assert!(point_in_polygon(&square, xf, Vec2::new(0.0, 0.0)));
        assert!(!point_in_polygon(&square, xf, Vec2::new(2.0, 0.0)));
    }

    #[test]
    fn circle_aabb_is_centered_box() {
        let circle = Circle { point: Vec2::new(1.0, 1.0), radius: 2.0 };
        let aabb = compute_circle_aabb(&circle, Transform2::identity());
        assert_eq!(aabb.lower, [-1.0, -1.0]);
        assert_eq!(aabb.upper, [3.0, 3.0]);
    }
}
