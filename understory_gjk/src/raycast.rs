// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-shape ray casts, reusing [`crate::shapecast::shape_cast`]'s
//! GJK-raycast core by treating the ray as a zero-radius point proxy swept
//! along the ray.

use understory_geom::{Transform2, Vec2};

use crate::proxy::DistanceProxy;
use crate::shapecast::{shape_cast, RayHit, ShapeCastInput};
use crate::shapes::{Capsule, Circle, Polygon, Segment};

/// A ray from `p1` toward `p2`, hits reported as a fraction of `p2 - p1`
/// up to `max_fraction`; `radius` thickens the ray into a swept disc.
#[derive(Copy, Clone, Debug)]
pub struct RayCastInput {
    /// Ray origin, in world space.
    pub p1: Vec2<f32>,
    /// Ray's far endpoint at `max_fraction = 1`, in world space.
    pub p2: Vec2<f32>,
    /// Largest fraction of `p2 - p1` to search.
    pub max_fraction: f32,
    /// Ray thickness (0 for an infinitely thin ray).
    pub radius: f32,
}

fn cast_against(input: &RayCastInput, proxy: &DistanceProxy, transform: Transform2) -> RayHit {
    let ray_proxy = DistanceProxy::new(&[Vec2::zero()], input.radius);
    let ray_transform = Transform2 { p: input.p1, q: understory_geom::Rotation2::IDENTITY };
    let translation = input.p2 - input.p1;

    shape_cast(&ShapeCastInput {
        proxy_a: *proxy,
        proxy_b: ray_proxy,
        transform_a: transform,
        transform_b: ray_transform,
        translation_b: translation,
        max_fraction: input.max_fraction,
    })
}

/// Casts a ray against a circle.
#[must_use]
pub fn ray_cast_circle(input: &RayCastInput, circle: &Circle, transform: Transform2) -> RayHit {
    cast_against(input, &circle.to_proxy(), transform)
}

/// Casts a ray against a capsule.
#[must_use]
pub fn ray_cast_capsule(input: &RayCastInput, capsule: &Capsule, transform: Transform2) -> RayHit {
    cast_against(input, &capsule.to_proxy(), transform)
}

/// Casts a ray against a bare segment.
#[must_use]
pub fn ray_cast_segment(input: &RayCastInput, segment: &Segment, transform: Transform2) -> RayHit {
    cast_against(input, &segment.to_proxy(), transform)
}

/// Casts a ray against a convex polygon.
#[must_use]
pub fn ray_cast_polygon(input: &RayCastInput, polygon: &Polygon, transform: Transform2) -> RayHit {
    cast_against(input, &polygon.to_proxy(), transform)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_circle_head_on() {
        let circle = Circle { point: Vec2::new(5.0, 0.0), radius: 1.0 };
        let input = RayCastInput { p1: Vec2::zero(), p2: Vec2::new(10.0, 0.0), max_fraction: 1.0, radius: 0.0 };
        let hit = ray_cast_circle(&input, &circle, Transform2::identity());
        assert!(hit.hit);
        assert!((hit.fraction - 0.4).abs() < 1e-3);
    }

    #[test]
    fn ray_misses_circle_off_axis() {
        let circle = Circle { point: Vec2::new(5.0, 5.0), radius: 1.0 };
        let input = RayCastInput { p1: Vec2::zero(), p2: Vec2::new(10.0, 0.0), max_fraction: 1.0, radius: 0.0 };
        let hit = ray_cast_circle(&input, &circle, Transform2::identity());
        assert!(!hit.hit);
    }
}
