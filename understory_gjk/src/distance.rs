// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `shapeDistance`: the core GJK closest-points query between two convex
//! proxies under arbitrary rigid transforms.

use understory_geom::Transform2;
use understory_geom::Vec2;

use crate::proxy::DistanceProxy;
use crate::simplex::{DistanceCache, Simplex, SimplexVertex};

/// Inputs to [`shape_distance`].
#[derive(Copy, Clone, Debug)]
pub struct DistanceInput {
    /// First proxy.
    pub proxy_a: DistanceProxy,
    /// Second proxy.
    pub proxy_b: DistanceProxy,
    /// World transform of the first proxy.
    pub transform_a: Transform2,
    /// World transform of the second proxy.
    pub transform_b: Transform2,
    /// If `true`, witness points and distance account for each proxy's
    /// `radius` (shrinking the reported distance by `rA + rB`).
    pub use_radii: bool,
}

/// Result of [`shape_distance`].
#[derive(Copy, Clone, Debug)]
pub struct DistanceOutput {
    /// Closest point on proxy A, in world space.
    pub point_a: Vec2<f32>,
    /// Closest point on proxy B, in world space.
    pub point_b: Vec2<f32>,
    /// Distance between the witness points (after radius adjustment if
    /// `use_radii` was set).
    pub distance: f32,
    /// Number of support-point iterations the search took.
    pub iterations: u32,
}

const MAX_ITERS: u32 = 20;

/// Computes the closest points and distance between two convex proxies
/// using GJK over Voronoi-region simplex reduction. `cache` is both read
/// (to warm-start the initial simplex) and written (with the final
/// simplex, for the next call between the same pair).
pub fn shape_distance(cache: &mut DistanceCache, input: &DistanceInput) -> DistanceOutput {
    let proxy_a = &input.proxy_a;
    let proxy_b = &input.proxy_b;
    let transform_a = input.transform_a;
    let transform_b = input.transform_b;

    let mut simplex = Simplex::from_cache(cache, proxy_a, transform_a, proxy_b, transform_b);

    let mut save_a = [0i32; 3];
    let mut save_b = [0i32; 3];
    let mut iter = 0;

    while iter < MAX_ITERS {
        let save_count = simplex.count;
        for i in 0..save_count {
            save_a[i] = simplex.v[i].index_a;
            save_b[i] = simplex.v[i].index_b;
        }

        match simplex.count {
            2 => simplex.solve2(),
            3 => simplex.solve3(),
            _ => {}
        }

        if simplex.count == 3 {
            break;
        }

        let d = simplex.compute_search_direction();
        if d.length_squared() < f32::EPSILON * f32::EPSILON {
            // The origin is effectively inside the simplex's span; further
            // refinement wouldn't change the witness points meaningfully.
            break;
        }

        let index_a = proxy_a.find_support(transform_a.q.inv_rotate(-d));
        let wa = transform_a.transform_point(proxy_a.vertex(index_a));
        let index_b = proxy_b.find_support(transform_b.q.inv_rotate(d));
        let wb = transform_b.transform_point(proxy_b.vertex(index_b));

        iter += 1;

        let mut duplicate = false;
        for i in 0..save_count {
            if index_a as i32 == save_a[i] && index_b as i32 == save_b[i] {
                duplicate = true;
                break;
            }
        }
        if duplicate {
            break;
        }

        let next = simplex.count;
        simplex.v[next] = SimplexVertex { wa, wb, w: wb - wa, a: -1.0, index_a: index_a as i32, index_b: index_b as i32 };
        simplex.count += 1;
    }

    let (mut point_a, mut point_b) = simplex.compute_witness_points();
    let mut distance = (point_a - point_b).length();
    simplex.save_to_cache(cache);

    if input.use_radii {
        if distance < f32::EPSILON {
            let mid = Vec2::new(0.5 * (point_a.x + point_b.x), 0.5 * (point_a.y + point_b.y));
            point_a = mid;
            point_b = mid;
            distance = 0.0;
        } else {
            let ra = proxy_a.radius;
            let rb = proxy_b.radius;
            distance = (distance - ra - rb).max(0.0);
            let normal = (point_b - point_a).normalize();
            point_a = point_a + normal * ra;
            point_b = point_b - normal * rb;
        }
    }

    DistanceOutput { point_a, point_b, distance, iterations: iter }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_geom::{Rotation2, Transform2};

    fn unit_square() -> DistanceProxy {
        DistanceProxy::new(
            &[
                Vec2::new(-1.0, -1.0),
                Vec2::new(1.0, -1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(-1.0, 1.0),
            ],
            0.0,
        )
    }

    #[test]
    fn separated_unit_squares_without_radii() {
        let a = unit_square();
        let b = unit_square();
        let xf_a = Transform2::identity();
        let xf_b = Transform2 { p: Vec2::new(5.0, 0.0), q: Rotation2::IDENTITY };

        let mut cache = DistanceCache::default();
        let output = shape_distance(&mut cache, &DistanceInput { proxy_a: a, proxy_b: b, transform_a: xf_a, transform_b: xf_b, use_radii: false });

        assert!((output.distance - 3.0).abs() < 1e-4, "{}", output.distance);
        assert!((output.point_a.x - 1.0).abs() < 1e-4);
        assert!((output.point_b.x - 4.0).abs() < 1e-4);
    }

    #[test]
    fn separated_unit_squares_with_radii() {
        let a = DistanceProxy::new(&unit_square_vertices(), 0.5);
        let b = DistanceProxy::new(&unit_square_vertices(), 0.5);
        let xf_a = Transform2::identity();
        let xf_b = Transform2 { p: Vec2::new(5.0, 0.0), q: Rotation2::IDENTITY };

        let mut cache = DistanceCache::default();
        let output = shape_distance(&mut cache, &DistanceInput { proxy_a: a, proxy_b: b, transform_a: xf_a, transform_b: xf_b, use_radii: true });

        assert!((output.distance - 2.0).abs() < 1e-4, "{}", output.distance);
    }

    fn unit_square_vertices() -> [Vec2<f32>; 4] {
        [Vec2::new(-1.0, -1.0), Vec2::new(1.0, -1.0), Vec2::new(1.0, 1.0), Vec2::new(-1.0, 1.0)]
    }

    #[test]
    fn identical_circles_have_zero_distance() {
        let circle = DistanceProxy::from_point(Vec2::zero());
        let xf = Transform2::identity();
        let mut cache = DistanceCache::default();
        let output = shape_distance(&mut cache, &DistanceInput { proxy_a: circle, proxy_b: circle, transform_a: xf, transform_b: xf, use_radii: false });
        assert!(output.distance < 1e-6);
    }

    #[test]
    fn circles_three_apart_with_unit_radii_are_one_apart() {
        let a = DistanceProxy::new(&[Vec2::zero()], 1.0);
        let b = DistanceProxy::new(&[Vec2::zero()], 1.0);
        let xf_a = Transform2::identity();
        let xf_b = Transform2 { p: Vec2::new(3.0, 0.0), q: Rotation2::IDENTITY };
        let mut cache = DistanceCache::default();
        let output = shape_distance(&mut cache, &DistanceInput { proxy_a: a, proxy_b: b, transform_a: xf_a, transform_b: xf_b, use_radii: true });
        assert!((output.distance - 1.0).abs() < 1e-4, "{}", output.distance);
    }

    #[test]
    fn cache_warm_starts_a_second_query() {
        let a = unit_square();
        let b = unit_square();
        let xf_a = Transform2::identity();
        let xf_b = Transform2 { p: Vec2::new(5.0, 0.0), q: Rotation2::IDENTITY };

        let mut cache = DistanceCache::default();
        let _ = shape_distance(&mut cache, &DistanceInput { proxy_a: a, proxy_b: b, transform_a: xf_a, transform_b: xf_b, use_radii: false });
        assert!(cache.count > 0);

        let output = shape_distance(&mut cache, &DistanceInput { proxy_a: a, proxy_b: b, transform_a: xf_a, transform_b: xf_b, use_radii: false });
        assert!((output.distance - 3.0).abs() < 1e-4);
    }
}
