// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadrant naming for 2D box subdivision (used by [`crate::Aabb::quad2d`]
//! and the quadtree backend).

/// One of the four quadrants obtained by bisecting a 2D box through its
/// center.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Quadrant {
    /// North-west (low x, high y).
    Nw,
    /// North-east (high x, high y).
    Ne,
    /// South-west (low x, low y).
    Sw,
    /// South-east (high x, low y).
    Se,
}

impl Quadrant {
    /// All four quadrants, in a fixed order used when subdividing a node.
    pub const ALL: [Self; 4] = [Self::Nw, Self::Ne, Self::Sw, Self::Se];
}
