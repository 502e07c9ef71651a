// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2D-only AABB operations: quadrant splitting, rotation, ray/circle tests.

use understory_geom::Scalar;

use crate::{Aabb, Quadrant};

impl<T: Scalar> Aabb<T, 2> {
    /// Convenience constructor taking `(x, y)` pairs instead of `[T; 2]`.
    #[must_use]
    pub fn from_xy(lower: (T, T), upper: (T, T)) -> Self {
        Self::new([lower.0, lower.1], [upper.0, upper.1])
    }

    /// `true` iff `(x, y)` lies within the box, inclusive of the boundary.
    #[must_use]
    pub fn contains_point_xy(&self, x: T, y: T) -> bool {
        self.contains_point([x, y])
    }

    /// Returns the intersection of two boxes. The result is the empty
    /// sentinel (see [`Aabb::is_empty`]) when the boxes don't overlap.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let lower = [
            self.lower[0].max(other.lower[0]),
            self.lower[1].max(other.lower[1]),
        ];
        let upper = [
            self.upper[0].min(other.upper[0]),
            self.upper[1].min(other.upper[1]),
        ];
        Self { lower, upper }
    }

    /// Exactly divides the box into one of its four equal quadrants.
    #[must_use]
    pub fn quad2d(&self, quadrant: Quadrant) -> Self {
        let two = T::ONE + T::ONE;
        let half_w = (self.upper[0] - self.lower[0]) / two;
        let half_h = (self.upper[1] - self.lower[1]) / two;
        match quadrant {
            Quadrant::Nw => Self::new(
                [self.lower[0], self.lower[1] + half_h],
                [self.lower[0] + half_w, self.upper[1]],
            ),
            Quadrant::Ne => Self::new(
                [self.lower[0] + half_w, self.lower[1] + half_h],
                self.upper,
            ),
            Quadrant::Sw => Self::new(self.lower, [self.lower[0] + half_w, self.lower[1] + half_h]),
            Quadrant::Se => Self::new(
                [self.lower[0] + half_w, self.lower[1]],
                [self.upper[0], self.lower[1] + half_h],
            ),
        }
    }

    /// `true` iff the circle centered at `center` with the given `radius`
    /// intersects the box: clamp `center` into the box and compare squared
    /// distance to `radius^2`.
    #[must_use]
    pub fn overlaps_circle(&self, center: [T; 2], radius: T) -> bool {
        self.distance_squared(center) < radius * radius
    }
}

impl Aabb<f32, 2> {
    /// Slab-method ray/box intersection test. Axis-parallel rays
    /// (`direction[i] == 0`) require `origin[i]` to already lie within the
    /// box on that axis.
    #[must_use]
    pub fn intersects_ray(&self, origin: [f32; 2], direction: [f32; 2]) -> bool {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for i in 0..2 {
            if direction[i] == 0.0 {
                if origin[i] < self.lower[i] || origin[i] > self.upper[i] {
                    return false;
                }
                continue;
            }
            let inv_dir = 1.0 / direction[i];
            let mut delta_min = (self.lower[i] - origin[i]) * inv_dir;
            let mut delta_max = (self.upper[i] - origin[i]) * inv_dir;
            if delta_min > delta_max {
                core::mem::swap(&mut delta_min, &mut delta_max);
            }
            if t_min > delta_max || delta_min > t_max {
                return false;
            }
            if delta_min > t_min {
                t_min = delta_min;
            }
            if delta_max < t_max {
                t_max = delta_max;
            }
        }
        true
    }

    /// The axis-aligned bounding box of this box rotated by `radians`
    /// around its center.
    #[must_use]
    pub fn get_rotated(&self, radians: f32) -> Self {
        let c = libm::cosf(radians);
        let s = libm::sinf(radians);
        let extent = self.extents();
        let new_extent = [
            extent[1] * s + extent[0] * c,
            extent[0] * s + extent[1] * c,
        ];
        let center = self.center();
        Self::new(
            [center[0] - new_extent[0], center[1] - new_extent[1]],
            [center[0] + new_extent[0], center[1] + new_extent[1]],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad2d_partitions_exactly() {
        let b = Aabb::new([0.0_f32, 0.0], [4.0, 4.0]);
        let nw = b.quad2d(Quadrant::Nw);
        let ne = b.quad2d(Quadrant::Ne);
        let sw = b.quad2d(Quadrant::Sw);
        let se = b.quad2d(Quadrant::Se);
        assert_eq!(nw, Aabb::new([0.0, 2.0], [2.0, 4.0]));
        assert_eq!(ne, Aabb::new([2.0, 2.0], [4.0, 4.0]));
        assert_eq!(sw, Aabb::new([0.0, 0.0], [2.0, 2.0]));
        assert_eq!(se, Aabb::new([2.0, 0.0], [4.0, 2.0]));
    }

    #[test]
    fn intersect_of_disjoint_boxes_is_empty() {
        let a = Aabb::new([0.0_f32, 0.0], [1.0, 1.0]);
        let b = Aabb::new([5.0_f32, 5.0], [6.0, 6.0]);
        assert!(a.intersect(&b).is_empty());
    }

    #[test]
    fn intersect_of_overlapping_boxes() {
        let a = Aabb::new([0.0_f32, 0.0], [2.0, 2.0]);
        let b = Aabb::new([1.0_f32, 1.0], [3.0, 3.0]);
        assert_eq!(a.intersect(&b), Aabb::new([1.0, 1.0], [2.0, 2.0]));
    }

    #[test]
    fn ray_hits_box() {
        let b = Aabb::new([0.0_f32, 0.0], [10.0, 10.0]);
        assert!(b.intersects_ray([-5.0, 5.0], [1.0, 0.0]));
        assert!(!b.intersects_ray([-5.0, 20.0], [1.0, 0.0]));
    }

    #[test]
    fn axis_parallel_ray_inside_box() {
        let b = Aabb::new([0.0_f32, 0.0], [10.0, 10.0]);
        assert!(b.intersects_ray([5.0, 5.0], [0.0, 1.0]));
        assert!(!b.intersects_ray([15.0, 5.0], [0.0, 1.0]));
    }

    #[test]
    fn overlaps_circle_clamped() {
        let b = Aabb::new([0.0_f32, 0.0], [10.0, 10.0]);
        assert!(b.overlaps_circle([15.0, 5.0], 6.0));
        assert!(!b.overlaps_circle([15.0, 5.0], 4.0));
    }
}
