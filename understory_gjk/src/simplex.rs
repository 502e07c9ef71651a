// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The GJK simplex and its Voronoi-region solver (Ericson, *Real-Time
//! Collision Detection* 5.1), plus the warm-start cache that lets repeated
//! queries between the same pair of shapes skip most iterations.

use understory_geom::{Transform2, Vec2};

use crate::proxy::DistanceProxy;

/// Warm-start record: the simplex vertex indices from the previous query
/// between a given shape pair, so the next query can start close to the
/// answer instead of from scratch.
#[derive(Copy, Clone, Debug, Default)]
pub struct DistanceCache {
    /// Number of valid entries in `index_a`/`index_b` (0 to 3).
    pub count: u16,
    /// Proxy A vertex indices of the cached simplex.
    pub index_a: [u8; 3],
    /// Proxy B vertex indices of the cached simplex.
    pub index_b: [u8; 3],
    /// The simplex's metric (edge length for 2 vertices, signed area for
    /// 3) at the time it was cached; informational, not consumed by
    /// [`crate::distance::shape_distance`] itself.
    pub metric: f32,
}

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct SimplexVertex {
    pub wa: Vec2<f32>,
    pub wb: Vec2<f32>,
    pub w: Vec2<f32>,
    pub a: f32,
    pub index_a: i32,
    pub index_b: i32,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct Simplex {
    pub v: [SimplexVertex; 3],
    pub count: usize,
}

impl Simplex {
    /// Builds the initial simplex from a warm-start cache, or seeds a
    /// single-vertex simplex from each proxy's first vertex when the cache
    /// is empty.
    pub fn from_cache(
        cache: &DistanceCache,
        proxy_a: &DistanceProxy,
        transform_a: Transform2,
        proxy_b: &DistanceProxy,
        transform_b: Transform2,
    ) -> Self {
        debug_assert!(cache.count <= 3);
        let mut v = [SimplexVertex::default(); 3];
        let mut count = cache.count as usize;

        for i in 0..count {
            let index_a = cache.index_a[i] as i32;
            let index_b = cache.index_b[i] as i32;
            let wa_local = proxy_a.vertex(index_a as usize);
            let wb_local = proxy_b.vertex(index_b as usize);
            let wa = transform_a.transform_point(wa_local);
            let wb = transform_b.transform_point(wb_local);
            v[i] = SimplexVertex { wa, wb, w: wb - wa, a: -1.0, index_a, index_b };
        }

        if count == 0 {
            let wa_local = proxy_a.vertex(0);
            let wb_local = proxy_b.vertex(0);
            let wa = transform_a.transform_point(wa_local);
            let wb = transform_b.transform_point(wb_local);
            v[0] = SimplexVertex { wa, wb, w: wb - wa, a: 1.0, index_a: 0, index_b: 0 };
            count = 1;
        }

        Self { v, count }
    }

    /// Builds an empty simplex (used by shape-cast, which grows it from
    /// scratch rather than from a cache).
    pub fn empty() -> Self {
        Self { v: [SimplexVertex::default(); 3], count: 0 }
    }

    /// The cache metric: 0 for a single vertex, edge length for two,
    /// signed triangle area for three.
    pub fn metric(&self) -> f32 {
        match self.count {
            1 => 0.0,
            2 => (self.v[1].w - self.v[0].w).length(),
            3 => (self.v[1].w - self.v[0].w).cross(self.v[2].w - self.v[0].w),
            _ => 0.0,
        }
    }

    /// The closest point to the origin on the current sub-simplex, valid
    /// only for 1- and 2-vertex simplices (a 3-vertex simplex means the
    /// origin is already inside it).
    pub fn closest(&self) -> Vec2<f32> {
        match self.count {
            1 => self.v[0].w,
            2 => weight2(self.v[0].a, self.v[0].w, self.v[1].a, self.v[1].w),
            _ => Vec2::zero(),
        }
    }

    /// Writes the cache's `index_a`/`index_b`/`count`/`metric` from this
    /// simplex.
    pub fn save_to_cache(&self, cache: &mut DistanceCache) {
        cache.metric = self.metric();
        cache.count = self.count as u16;
        for i in 0..self.count {
            cache.index_a[i] = self.v[i].index_a as u8;
            cache.index_b[i] = self.v[i].index_b as u8;
        }
    }

    /// The direction GJK should add the next support point along.
    pub fn compute_search_direction(&self) -> Vec2<f32> {
        match self.count {
            1 => -self.v[0].w,
            2 => {
                let e12 = self.v[1].w - self.v[0].w;
                let sgn = e12.cross(-self.v[0].w);
                if sgn > 0.0 {
                    Vec2::new(-e12.y, e12.x)
                } else {
                    Vec2::new(e12.y, -e12.x)
                }
            }
            _ => Vec2::zero(),
        }
    }

    /// Witness points on A and B implied by the simplex's barycentric
    /// weights.
    pub fn compute_witness_points(&self) -> (Vec2<f32>, Vec2<f32>) {
        match self.count {
            1 => (self.v[0].wa, self.v[0].wb),
            2 => (
                weight2(self.v[0].a, self.v[0].wa, self.v[1].a, self.v[1].wa),
                weight2(self.v[0].a, self.v[0].wb, self.v[1].a, self.v[1].wb),
            ),
            3 => {
                let a = weight3(
                    self.v[0].a,
                    self.v[0].wa,
                    self.v[1].a,
                    self.v[1].wa,
                    self.v[2].a,
                    self.v[2].wa,
                );
                // The B-side weighted sum is mathematically equal to `a`
                // once the origin lies inside the simplex (w = wB - wA
                // averages to zero); computing it from the A weights
                // avoids a second, numerically redundant sum.
                (a, a)
            }
            _ => (Vec2::zero(), Vec2::zero()),
        }
    }

    /// Reduces the simplex to its closest 1- or 2-vertex sub-simplex
    /// (Voronoi-region test on a line segment).
    pub fn solve2(&mut self) {
        let w1 = self.v[0].w;
        let w2 = self.v[1].w;
        let e12 = w2 - w1;

        let d12_2 = -w1.dot(e12);
        if d12_2 <= 0.0 {
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }

        let d12_1 = w2.dot(e12);
        if d12_1 <= 0.0 {
            self.v[1].a = 1.0;
            self.count = 1;
            self.v[0] = self.v[1];
            return;
        }

        let inv_d12 = 1.0 / (d12_1 + d12_2);
        self.v[0].a = d12_1 * inv_d12;
        self.v[1].a = d12_2 * inv_d12;
        self.count = 2;
    }

    /// Reduces the simplex to its closest sub-simplex (Voronoi-region test
    /// on a triangle: a vertex, an edge, or the whole face).
    pub fn solve3(&mut self) {
        let w1 = self.v[0].w;
        let w2 = self.v[1].w;
        let w3 = self.v[2].w;

        let e12 = w2 - w1;
        let w1e12 = w1.dot(e12);
        let w2e12 = w2.dot(e12);
        let d12_1 = w2e12;
        let d12_2 = -w1e12;

        let e13 = w3 - w1;
        let w1e13 = w1.dot(e13);
        let w3e13 = w3.dot(e13);
        let d13_1 = w3e13;
        let d13_2 = -w1e13;

        let e23 = w3 - w2;
        let w2e23 = w2.dot(e23);
        let w3e23 = w3.dot(e23);
        let d23_1 = w3e23;
        let d23_2 = -w2e23;

        let n123 = e12.cross(e13);
        let d123_1 = n123 * w2.cross(w3);
        let d123_2 = n123 * w3.cross(w1);
        let d123_3 = n123 * w1.cross(w2);

        if d12_2 <= 0.0 && d13_2 <= 0.0 {
            self.v[0].a = 1.0;
            self.count = 1;
            return;
        }

        if d12_1 > 0.0 && d12_2 > 0.0 && d123_3 <= 0.0 {
            let inv = 1.0 / (d12_1 + d12_2);
            self.v[0].a = d12_1 * inv;
            self.v[1].a = d12_2 * inv;
            self.count = 2;
            return;
        }

        if d13_1 > 0.0 && d13_2 > 0.0 && d123_2 <= 0.0 {
            let inv = 1.0 / (d13_1 + d13_2);
            self.v[0].a = d13_1 * inv;
            self.v[2].a = d13_2 * inv;
            self.count = 2;
            self.v[1] = self.v[2];
            return;
        }

        if d12_1 <= 0.0 && d23_2 <= 0.0 {
            self.v[1].a = 1.0;
            self.count = 1;
            self.v[0] = self.v[1];
            return;
        }

        if d13_1 <= 0.0 && d23_1 <= 0.0 {
            self.v[2].a = 1.0;
            self.count = 1;
            self.v[0] = self.v[2];
            return;
        }

        if d23_1 > 0.0 && d23_2 > 0.0 && d123_1 <= 0.0 {
            let inv = 1.0 / (d23_1 + d23_2);
            self.v[1].a = d23_1 * inv;
            self.v[2].a = d23_2 * inv;
            self.count = 2;
            self.v[0] = self.v[2];
            return;
        }

        let inv = 1.0 / (d123_1 + d123_2 + d123_3);
        self.v[0].a = d123_1 * inv;
        self.v[1].a = d123_2 * inv;
        self.v[2].a = d123_3 * inv;
        self.count = 3;
    }
}

fn weight2(a1: f32, w1: Vec2<f32>, a2: f32, w2: Vec2<f32>) -> Vec2<f32> {
    Vec2::new(a1 * w1.x + a2 * w2.x, a1 * w1.y + a2 * w2.y)
}

fn weight3(a1: f32, w1: Vec2<f32>, a2: f32, w2: Vec2<f32>, a3: f32, w3: Vec2<f32>) -> Vec2<f32> {
    Vec2::new(a1 * w1.x + a2 * w2.x + a3 * w3.x, a1 * w1.y + a2 * w2.y + a3 * w3.y)
}
