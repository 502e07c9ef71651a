// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `shapeCast`: Gino van den Bergen's GJK-raycast, sweeping proxy B along a
//! translation and reporting the first time of contact with proxy A.

use understory_geom::{Transform2, Vec2};

use crate::proxy::{DistanceProxy, LINEAR_SLOP};
use crate::simplex::{Simplex, SimplexVertex};

/// Inputs to [`shape_cast`].
#[derive(Copy, Clone, Debug)]
pub struct ShapeCastInput {
    /// The stationary proxy.
    pub proxy_a: DistanceProxy,
    /// The proxy being swept.
    pub proxy_b: DistanceProxy,
    /// World transform of proxy A.
    pub transform_a: Transform2,
    /// World transform of proxy B at the start of the sweep.
    pub transform_b: Transform2,
    /// Displacement of proxy B over the sweep, in world space.
    pub translation_b: Vec2<f32>,
    /// Largest fraction of `translation_b` to consider a hit.
    pub max_fraction: f32,
}

/// Result of [`shape_cast`].
#[derive(Copy, Clone, Debug, Default)]
pub struct RayHit {
    /// World-space contact point on proxy A's surface (after its radius).
    pub point: Vec2<f32>,
    /// World-space contact normal, pointing from B toward A.
    pub normal: Vec2<f32>,
    /// Fraction of `translation_b` at which contact occurs.
    pub fraction: f32,
    /// Number of iterations taken.
    pub iterations: u32,
    /// `true` if a hit was found; an initial overlap (zero iterations) is
    /// reported as no hit, matching the reference implementation.
    pub hit: bool,
}

const MAX_ITERS: u32 = 20;

/// Sweeps `input.proxy_b` by `input.translation_b` and finds the first
/// fraction at which it touches `input.proxy_a`, if any within
/// `[0, max_fraction]`.
#[must_use]
pub fn shape_cast(input: &ShapeCastInput) -> RayHit {
    let mut output = RayHit::default();

    let proxy_a = &input.proxy_a;
    let proxy_b = &input.proxy_b;
    let radius = proxy_a.radius + proxy_b.radius;

    let xf_a = input.transform_a;
    let xf_b = input.transform_b;

    let r = input.translation_b;
    let mut n = Vec2::zero();
    let mut lambda = 0.0_f32;
    let max_fraction = input.max_fraction;

    let mut simplex = Simplex::empty();

    let mut index_a = proxy_a.find_support(xf_a.q.inv_rotate(-r));
    let mut wa = xf_a.transform_point(proxy_a.vertex(index_a));
    let mut index_b = proxy_b.find_support(xf_b.q.inv_rotate(r));
    let mut wb = xf_b.transform_point(proxy_b.vertex(index_b));
    let mut v = wa - wb;

    let sigma = LINEAR_SLOP.max(radius - LINEAR_SLOP);

    let mut iter = 0;
    while iter < MAX_ITERS && v.length() > sigma {
        debug_assert!(simplex.count < 3);
        output.iterations += 1;

        index_a = proxy_a.find_support(xf_a.q.inv_rotate(-v));
        wa = xf_a.transform_point(proxy_a.vertex(index_a));
        index_b = proxy_b.find_support(xf_b.q.inv_rotate(v));
        wb = xf_b.transform_point(proxy_b.vertex(index_b));
        let p = wa - wb;

        v = v.normalize();

        let vp = v.dot(p);
        let vr = v.dot(r);
        if vp - sigma > lambda * vr {
            if vr <= 0.0 {
                return output;
            }
            lambda = (vp - sigma) / vr;
            if lambda > max_fraction {
                return output;
            }
            n = -v;
            simplex.count = 0;
        }

        let next = simplex.count;
        simplex.v[next] = SimplexVertex {
            wa: Vec2::new(wb.x + lambda * r.x, wb.y + lambda * r.y),
            wb: wa,
            w: wa - Vec2::new(wb.x + lambda * r.x, wb.y + lambda * r.y),
            a: 1.0,
            index_a: index_b as i32,
            index_b: index_a as i32,
        };
        simplex.count += 1;

        match simplex.count {
            2 => simplex.solve2(),
            3 => simplex.solve3(),
            _ => {}
        }

        if simplex.count == 3 {
            // Overlap.
            return output;
        }

        v = simplex.closest();
        iter += 1;
    }

    if iter == 0 {
        return output;
    }

    let (_point_b, point_a) = simplex.compute_witness_points();

    if v.length_squared() > 0.0 {
        n = (-v).normalize();
    }

    let radius_a = proxy_a.radius;
    output.point = Vec2::new(point_a.x + radius_a * n.x, point_a.y + radius_a * n.y);
    output.normal = n;
    output.fraction = lambda;
    output.iterations = iter;
    output.hit = true;
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_geom::Rotation2;

    #[test]
    fn circle_sweeping_toward_stationary_circle_hits() {
        let a = DistanceProxy::new(&[Vec2::zero()], 1.0);
        let b = DistanceProxy::new(&[Vec2::zero()], 1.0);

        let input = ShapeCastInput {
            proxy_a: a,
            proxy_b: b,
            transform_a: Transform2::identity(),
            transform_b: Transform2 { p: Vec2::new(0.0, 5.0), q: Rotation2::IDENTITY },
            translation_b: Vec2::new(0.0, -10.0),
            max_fraction: 1.0,
        };

        let hit = shape_cast(&input);
        assert!(hit.hit);
        assert!((hit.fraction - 0.3).abs() < 1e-3, "{}", hit.fraction);
    }

    #[test]
    fn shapes_moving_apart_never_hit() {
        let a = DistanceProxy::new(&[Vec2::zero()], 1.0);
        let b = DistanceProxy::new(&[Vec2::zero()], 1.0);

        let input = ShapeCastInput {
            proxy_a: a,
            proxy_b: b,
            transform_a: Transform2::identity(),
            transform_b: Transform2 { p: Vec2::new(0.0, 5.0), q: Rotation2::IDENTITY },
            translation_b: Vec2::new(0.0, 10.0),
            max_fraction: 1.0,
        };

        let hit = shape_cast(&input);
        assert!(!hit.hit);
    }
}
