// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Distance proxies: the fixed-capacity vertex lists GJK runs support
//! queries against, shared by circles (1 vertex), capsules/segments
//! (2 vertices) and polygons (up to [`MAX_POLY_VERTS`] vertices).

use understory_buffer::ArrayBuffer;
use understory_geom::Vec2;

/// Maximum number of vertices a convex polygon (and so a distance proxy)
/// may carry.
pub const MAX_POLY_VERTS: usize = 8;

/// Linear slop: the baseline length tolerance used throughout hull
/// construction and continuous collision (welding distance, TOI target
/// tolerance, collinearity threshold).
pub const LINEAR_SLOP: f32 = 0.005;

/// A convex shape reduced to a small vertex list plus a radius, the only
/// shape representation the GJK routines operate on directly.
#[derive(Copy, Clone, Debug)]
pub struct DistanceProxy {
    vertices: ArrayBuffer<Vec2<f32>, MAX_POLY_VERTS>,
    /// Rounding radius (0 for plain polygons/segments, >0 for circles and
    /// capsules represented as a point/segment plus radius).
    pub radius: f32,
}

impl DistanceProxy {
    /// Builds a proxy from up to [`MAX_POLY_VERTS`] vertices and a radius;
    /// extra vertices beyond the capacity are silently dropped, mirroring
    /// the reference implementation's `m::min(count, MAX_POLY_VERTS)`.
    #[must_use]
    pub fn new(vertices: &[Vec2<f32>], radius: f32) -> Self {
        let mut buf = ArrayBuffer::new();
        for &v in vertices.iter().take(MAX_POLY_VERTS) {
            buf.push(v);
        }
        Self { vertices: buf, radius }
    }

    /// A single-point proxy (used e.g. to test a bare point against a
    /// polygon via [`crate::shapes::point_in_polygon`]).
    #[must_use]
    pub fn from_point(point: Vec2<f32>) -> Self {
        Self::new(&[point], 0.0)
    }

    /// Number of vertices.
    #[must_use]
    pub fn count(&self) -> usize {
        self.vertices.len()
    }

    /// Vertex at `index`.
    #[must_use]
    pub fn vertex(&self, index: usize) -> Vec2<f32> {
        self.vertices[index]
    }

    /// Index of the vertex with greatest projection onto `direction`
    /// (the GJK support function).
    #[must_use]
    pub fn find_support(&self, direction: Vec2<f32>) -> usize {
        let mut best_index = 0;
        let mut best_value = self.vertices[0].dot(direction);
        for i in 1..self.vertices.len() {
            let value = self.vertices[i].dot(direction);
            if value > best_value {
                best_index = i;
                best_value = value;
            }
        }
        best_index
    }
}
