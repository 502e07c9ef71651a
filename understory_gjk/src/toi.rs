// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `timeOfImpact`: continuous collision detection via the local
//! separating-axis method, alternating a distance query (to find a
//! separating axis) with bisection/secant root-finding along that axis.

use understory_geom::{Sweep, Vec2};

use crate::distance::{shape_distance, DistanceInput};
use crate::proxy::{DistanceProxy, LINEAR_SLOP, MAX_POLY_VERTS};
use crate::simplex::DistanceCache;

/// Inputs to [`time_of_impact`].
#[derive(Copy, Clone, Debug)]
pub struct ToiInput {
    /// First proxy.
    pub proxy_a: DistanceProxy,
    /// Second proxy.
    pub proxy_b: DistanceProxy,
    /// First proxy's motion over `[0, 1]`.
    pub sweep_a: Sweep,
    /// Second proxy's motion over `[0, 1]`.
    pub sweep_b: Sweep,
    /// Largest normalized time to search up to.
    pub t_max: f32,
}

/// Outcome of [`time_of_impact`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ToiState {
    /// No conclusion was reached (not produced by [`time_of_impact`]
    /// itself; the initial state before the search runs).
    Unknown,
    /// The root finder could not converge; `t` is a best-effort estimate.
    Failed,
    /// The shapes are already overlapping at `t = 0`.
    Overlapped,
    /// A touching configuration was found at `t`.
    Hit,
    /// The shapes remain separated through the entire sweep.
    Separated,
}

/// Result of [`time_of_impact`].
#[derive(Copy, Clone, Debug)]
pub struct ToiOutput {
    /// The outcome.
    pub state: ToiState,
    /// The time at which `state` applies.
    pub t: f32,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum SepType {
    Point,
    FaceA,
    FaceB,
}

struct SepFunc {
    sweep_a: Sweep,
    sweep_b: Sweep,
    local_point: Vec2<f32>,
    axis: Vec2<f32>,
    kind: SepType,
}

impl SepFunc {
    fn make(
        cache: &DistanceCache,
        proxy_a: &DistanceProxy,
        sweep_a: &Sweep,
        proxy_b: &DistanceProxy,
        sweep_b: &Sweep,
        t1: f32,
    ) -> Self {
        let count = cache.count as usize;
        debug_assert!(count > 0 && count < 3);

        let xf_a = sweep_a.get_transform(t1);
        let xf_b = sweep_b.get_transform(t1);

        if count == 1 {
            let local_point_a = proxy_a.vertex(cache.index_a[0] as usize);
            let local_point_b = proxy_b.vertex(cache.index_b[0] as usize);
            let point_a = xf_a.transform_point(local_point_a);
            let point_b = xf_b.transform_point(local_point_b);
            return Self {
                sweep_a: *sweep_a,
                sweep_b: *sweep_b,
                axis: (point_b - point_a).normalize(),
                local_point: Vec2::zero(),
                kind: SepType::Point,
            };
        }

        if cache.index_a[0] == cache.index_a[1] {
            // Two points on B, one on A: a face on B.
            let local_point_b1 = proxy_b.vertex(cache.index_b[0] as usize);
            let local_point_b2 = proxy_b.vertex(cache.index_b[1] as usize);
            let mut axis = Vec2::new(local_point_b2.y - local_point_b1.y, -(local_point_b2.x - local_point_b1.x));
            axis = axis.normalize();
            let normal = xf_b.q.rotate(axis);

            let local_point =
                Vec2::new(0.5 * (local_point_b1.x + local_point_b2.x), 0.5 * (local_point_b1.y + local_point_b2.y));
            let point_b = xf_b.transform_point(local_point);

            let local_point_a = proxy_a.vertex(cache.index_a[0] as usize);
            let point_a = xf_a.transform_point(local_point_a);

            let s = (point_a - point_b).dot(normal);
            if s < 0.0 {
                axis = -axis;
            }
            return Self { sweep_a: *sweep_a, sweep_b: *sweep_b, axis, local_point, kind: SepType::FaceB };
        }

        // Two points on A, one or two on B: a face on A.
        let local_point_a1 = proxy_a.vertex(cache.index_a[0] as usize);
        let local_point_a2 = proxy_a.vertex(cache.index_a[1] as usize);
        let mut axis = Vec2::new(local_point_a2.y - local_point_a1.y, -(local_point_a2.x - local_point_a1.x));
        axis = axis.normalize();
        let normal = xf_a.q.rotate(axis);

        let local_point =
            Vec2::new(0.5 * (local_point_a1.x + local_point_a2.x), 0.5 * (local_point_a1.y + local_point_a2.y));
        let point_a = xf_a.transform_point(local_point);

        let local_point_b = proxy_b.vertex(cache.index_b[0] as usize);
        let point_b = xf_b.transform_point(local_point_b);

        let s = (point_b - point_a).dot(normal);
        if s < 0.0 {
            axis = -axis;
        }
        Self { sweep_a: *sweep_a, sweep_b: *sweep_b, axis, local_point, kind: SepType::FaceA }
    }

    fn find_min_separation(&self, proxy_a: &DistanceProxy, proxy_b: &DistanceProxy, t: f32) -> (f32, i32, i32) {
        let xf_a = self.sweep_a.get_transform(t);
        let xf_b = self.sweep_b.get_transform(t);

        match self.kind {
            SepType::Point => {
                let axis_a = xf_a.q.inv_rotate(self.axis);
                let axis_b = xf_b.q.inv_rotate(-self.axis);

                let index_a = proxy_a.find_support(axis_a);
                let index_b = proxy_b.find_support(axis_b);

                let point_a = xf_a.transform_point(proxy_a.vertex(index_a));
                let point_b = xf_b.transform_point(proxy_b.vertex(index_b));

                ((point_b - point_a).dot(self.axis), index_a as i32, index_b as i32)
            }
            SepType::FaceA => {
                let normal = xf_a.q.rotate(self.axis);
                let point_a = xf_a.transform_point(self.local_point);

                let axis_b = xf_b.q.inv_rotate(-normal);
                let index_b = proxy_b.find_support(axis_b);
                let point_b = xf_b.transform_point(proxy_b.vertex(index_b));

                ((point_b - point_a).dot(normal), -1, index_b as i32)
            }
            SepType::FaceB => {
                let normal = xf_b.q.rotate(self.axis);
                let point_b = xf_b.transform_point(self.local_point);

                let axis_a = xf_a.q.inv_rotate(-normal);
                let index_a = proxy_a.find_support(axis_a);
                let point_a = xf_a.transform_point(proxy_a.vertex(index_a));

                ((point_a - point_b).dot(normal), index_a as i32, -1)
            }
        }
    }

    fn evaluate_separation(&self, proxy_a: &DistanceProxy, proxy_b: &DistanceProxy, index_a: i32, index_b: i32, t: f32) -> f32 {
        let xf_a = self.sweep_a.get_transform(t);
        let xf_b = self.sweep_b.get_transform(t);

        match self.kind {
            SepType::Point => {
                let point_a = xf_a.transform_point(proxy_a.vertex(index_a as usize));
                let point_b = xf_b.transform_point(proxy_b.vertex(index_b as usize));
                (point_b - point_a).dot(self.axis)
            }
            SepType::FaceA => {
                let normal = xf_a.q.rotate(self.axis);
                let point_a = xf_a.transform_point(self.local_point);
                let point_b = xf_b.transform_point(proxy_b.vertex(index_b as usize));
                (point_b - point_a).dot(normal)
            }
            SepType::FaceB => {
                let normal = xf_b.q.rotate(self.axis);
                let point_b = xf_b.transform_point(self.local_point);
                let point_a = xf_a.transform_point(proxy_a.vertex(index_a as usize));
                (point_a - point_b).dot(normal)
            }
        }
    }
}

const MAX_OUTER_ITERS: u32 = 20;
const MAX_ROOT_ITERS: u32 = 50;

/// Finds the earliest normalized time in `[0, input.t_max]` at which
/// `proxy_a`/`proxy_b` (swept along `sweep_a`/`sweep_b`) come within
/// `target ± tolerance` of each other, via local separating-axis
/// bisection.
#[must_use]
pub fn time_of_impact(input: &ToiInput) -> ToiOutput {
    let mut output = ToiOutput { state: ToiState::Unknown, t: input.t_max };

    let proxy_a = &input.proxy_a;
    let proxy_b = &input.proxy_b;

    let sweep_a = input.sweep_a;
    let sweep_b = input.sweep_b;

    let t_max = input.t_max;

    let total_radius = proxy_a.radius + proxy_b.radius;
    let target = LINEAR_SLOP.max(total_radius + LINEAR_SLOP);
    let tolerance = 0.25 * LINEAR_SLOP;
    debug_assert!(target > tolerance);

    let mut t1 = 0.0_f32;
    let mut iter = 0;

    let mut cache = DistanceCache::default();

    loop {
        let xf_a = sweep_a.get_transform(t1);
        let xf_b = sweep_b.get_transform(t1);

        let distance_input =
            DistanceInput { proxy_a: *proxy_a, proxy_b: *proxy_b, transform_a: xf_a, transform_b: xf_b, use_radii: false };
        let distance_output = shape_distance(&mut cache, &distance_input);

        if distance_output.distance <= 0.0 {
            output.state = ToiState::Overlapped;
            output.t = 0.0;
            break;
        }

        if distance_output.distance < target + tolerance {
            output.state = ToiState::Hit;
            output.t = t1;
            break;
        }

        let fcn = SepFunc::make(&cache, proxy_a, &sweep_a, proxy_b, &sweep_b, t1);

        let mut done = false;
        let mut t2 = t_max;
        let mut push_back_iter = 0;

        loop {
            let (mut s2, index_a, index_b) = fcn.find_min_separation(proxy_a, proxy_b, t2);

            if s2 > target + tolerance {
                output.state = ToiState::Separated;
                output.t = t_max;
                done = true;
                break;
            }

            if s2 > target - tolerance {
                t1 = t2;
                break;
            }

            let mut s1 = fcn.evaluate_separation(proxy_a, proxy_b, index_a, index_b, t1);

            if s1 < target - tolerance {
                output.state = ToiState::Failed;
                output.t = t1;
                done = true;
                break;
            }

            if s1 <= target + tolerance {
                output.state = ToiState::Hit;
                output.t = t1;
                done = true;
                break;
            }

            let mut root_iter = 0;
            let mut a1 = t1;
            let mut a2 = t2;
            loop {
                let t = if root_iter & 1 == 1 {
                    a1 + (target - s1) * (a2 - a1) / (s2 - s1)
                } else {
                    0.5 * (a1 + a2)
                };
                root_iter += 1;

                let s = fcn.evaluate_separation(proxy_a, proxy_b, index_a, index_b, t);

                if (s - target).abs() < tolerance {
                    t2 = t;
                    break;
                }

                if s > target {
                    a1 = t;
                    s1 = s;
                } else {
                    a2 = t;
                    s2 = s;
                }

                if root_iter == MAX_ROOT_ITERS {
                    break;
                }
            }

            push_back_iter += 1;
            if push_back_iter as usize == MAX_POLY_VERTS {
                break;
            }
        }

        iter += 1;

        if done {
            break;
        }

        if iter == MAX_OUTER_ITERS {
            output.state = ToiState::Failed;
            output.t = t1;
            break;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_geom::Rotation2;

    #[test]
    fn crossing_capsules_hit_within_the_sweep() {
        let capsule_a = DistanceProxy::new(&[Vec2::new(-0.5, 0.0), Vec2::new(0.5, 0.0)], 0.1);
        let capsule_b = DistanceProxy::new(&[Vec2::new(0.0, -0.5), Vec2::new(0.0, 0.5)], 0.1);

        let sweep_a = Sweep { local_center: Vec2::zero(), c1: Vec2::new(0.0, 0.0), c2: Vec2::new(10.0, 0.0), a1: Rotation2::IDENTITY, a2: Rotation2::IDENTITY };
        let sweep_b = Sweep { local_center: Vec2::zero(), c1: Vec2::new(5.0, -5.0), c2: Vec2::new(5.0, 5.0), a1: Rotation2::IDENTITY, a2: Rotation2::IDENTITY };

        let output = time_of_impact(&ToiInput { proxy_a: capsule_a, proxy_b: capsule_b, sweep_a, sweep_b, t_max: 1.0 });

        assert_eq!(output.state, ToiState::Hit);
        assert!(output.t > 0.0 && output.t < 1.0, "{}", output.t);
    }

    #[test]
    fn already_overlapping_at_start_reports_overlapped() {
        let circle_a = DistanceProxy::new(&[Vec2::zero()], 1.0);
        let circle_b = DistanceProxy::new(&[Vec2::zero()], 1.0);

        let sweep_a = Sweep::stationary(Vec2::zero(), Rotation2::IDENTITY);
        let sweep_b = Sweep::stationary(Vec2::new(0.5, 0.0), Rotation2::IDENTITY);

        let output = time_of_impact(&ToiInput { proxy_a: circle_a, proxy_b: circle_b, sweep_a, sweep_b, t_max: 1.0 });

        assert_eq!(output.state, ToiState::Overlapped);
    }

    #[test]
    fn shapes_that_never_meet_report_separated() {
        let circle_a = DistanceProxy::new(&[Vec2::zero()], 0.5);
        let circle_b = DistanceProxy::new(&[Vec2::zero()], 0.5);

        let sweep_a = Sweep::stationary(Vec2::zero(), Rotation2::IDENTITY);
        let sweep_b = Sweep { local_center: Vec2::zero(), c1: Vec2::new(10.0, 0.0), c2: Vec2::new(10.0, 10.0), a1: Rotation2::IDENTITY, a2: Rotation2::IDENTITY };

        let output = time_of_impact(&ToiInput { proxy_a: circle_a, proxy_b: circle_b, sweep_a, sweep_b, t_max: 1.0 });

        assert_eq!(output.state, ToiState::Separated);
    }
}
