// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Packed Hilbert R-tree: an immutable-after-build static index.
//!
//! [`FlatbushIndex`] follows the bulk-load-only "flatbush" construction
//! protocol: call [`FlatbushIndex::add`] exactly `n` times, call
//! [`FlatbushIndex::finish`], then query with [`FlatbushIndex::search`] or
//! [`FlatbushIndex::neighbors`]. There is no incremental insert/remove; for
//! scenes that move, use [`crate::bvh::Bvh`] instead.

use alloc::vec::Vec;

use understory_geom::Scalar;
use understory_heap::BinaryMinHeap;

use crate::types::Aabb2D;

/// A single stack frame budget for [`FlatbushIndex::search`]: bounded by
/// tree depth times fan-out, as in the source. 512 comfortably covers any
/// fan-out >= 2 over millions of items.
const SEARCH_STACK_CAPACITY: usize = 512;

/// Bulk-loaded, immutable-after-build packed Hilbert R-tree.
///
/// Leaves occupy the first `num_items` slots of the internal node array;
/// parent levels are appended toward the root, which is always the last
/// slot. After [`FlatbushIndex::finish`] the tree cannot be mutated further.
pub struct FlatbushIndex<T: Scalar> {
    node_size: usize,
    num_items: usize,
    boxes: Vec<Aabb2D<T>>,
    indices: Vec<u32>,
    /// Exclusive end offset (in node-slot units) of each level, including
    /// the leaf level. The last entry is always `boxes.len()` once built.
    level_bounds: Vec<usize>,
    bounds: Aabb2D<T>,
    pos: usize,
    finished: bool,
}

impl<T: Scalar> FlatbushIndex<T> {
    /// Default fan-out, matching the source's default `nodeSize`.
    pub const DEFAULT_NODE_SIZE: usize = 16;

    /// Creates a builder for exactly `n` items with the given fan-out
    /// (clamped to `[2, 65535]`).
    #[must_use]
    pub fn new(n: usize, node_size: usize) -> Self {
        let node_size = node_size.clamp(2, 65535);
        let mut num_nodes = n;
        let mut level_len = n.max(1);
        loop {
            level_len = level_len.div_ceil(node_size);
            num_nodes += level_len;
            if level_len == 1 {
                break;
            }
        }
        Self {
            node_size,
            num_items: n,
            boxes: Vec::with_capacity(num_nodes),
            indices: Vec::with_capacity(num_nodes),
            level_bounds: Vec::new(),
            bounds: Aabb2D::empty(),
            pos: 0,
            finished: false,
        }
    }

    /// Adds one item's box. Must be called exactly `n` times (the count
    /// passed to [`Self::new`]) before [`Self::finish`].
    ///
    /// Returns the item's assigned index (its insertion order), which is
    /// what [`Self::search`]/[`Self::neighbors`] report back.
    ///
    /// # Panics
    ///
    /// Panics if called after [`Self::finish`], or more than `n` times.
    pub fn add(&mut self, min: [T; 2], max: [T; 2]) -> u32 {
        assert!(!self.finished, "add() called after finish()");
        assert!(
            self.pos < self.num_items,
            "add() called more than the declared item count"
        );
        let index = self.pos as u32;
        let aabb = Aabb2D::new(min, max);
        self.boxes.push(aabb);
        self.indices.push(index);
        self.bounds.extend_box(&aabb);
        self.pos += 1;
        index
    }

    /// Finishes construction: sorts leaves by Hilbert order of their box
    /// centers, then builds parent levels bottom-up, `node_size` children
    /// at a time, until a level produces a single root node.
    ///
    /// # Panics
    ///
    /// Panics if called twice, or before all `n` items were added.
    pub fn finish(&mut self) {
        assert!(!self.finished, "finish() called twice");
        assert_eq!(
            self.pos, self.num_items,
            "finish() called before all declared items were added"
        );

        if self.num_items == 0 {
            self.level_bounds.push(0);
            self.finished = true;
            return;
        }

        if self.num_items > 1 {
            let mut hilbert_values: Vec<u32> = self
                .boxes
                .iter()
                .map(|b| self.hilbert_value_of(b))
                .collect();
            quicksort_by_key(
                &mut hilbert_values,
                &mut self.boxes,
                &mut self.indices,
                0,
                self.num_items as isize - 1,
                self.node_size,
            );
        }

        let mut level_start = 0usize;
        let mut level_len = self.num_items;
        self.level_bounds.push(level_start + level_len);

        loop {
            let level_end = level_start + level_len;
            let mut pos = level_start;
            let mut parent_count = 0usize;
            while pos < level_end {
                let group_start = pos;
                let mut bb = Aabb2D::empty();
                let mut count = 0;
                while count < self.node_size && pos < level_end {
                    bb.extend_box(&self.boxes[pos]);
                    pos += 1;
                    count += 1;
                }
                self.boxes.push(bb);
                self.indices.push(group_start as u32);
                parent_count += 1;
            }
            self.level_bounds.push(self.boxes.len());
            if parent_count == 1 {
                break;
            }
            level_start = level_end;
            level_len = parent_count;
        }

        self.finished = true;
    }

    /// The union of every inserted leaf's box. Valid before or after
    /// [`Self::finish`].
    #[must_use]
    pub fn bounds(&self) -> Aabb2D<T> {
        self.bounds
    }

    /// Number of items passed to [`Self::new`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.num_items
    }

    /// `true` if built with zero items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_items == 0
    }

    fn hilbert_value_of(&self, b: &Aabb2D<T>) -> u32 {
        let c = b.center();
        let span_x = (self.bounds.upper[0] - self.bounds.lower[0]).to_f64();
        let span_y = (self.bounds.upper[1] - self.bounds.lower[1]).to_f64();
        let scale = (u16::MAX) as f64;
        let nx = if span_x > 0.0 {
            ((c[0] - self.bounds.lower[0]).to_f64() / span_x * scale) as u32
        } else {
            0
        };
        let ny = if span_y > 0.0 {
            ((c[1] - self.bounds.lower[1]).to_f64() / span_y * scale) as u32
        } else {
            0
        };
        hilbert_xy_to_index(nx.min(u16::MAX as u32), ny.min(u16::MAX as u32))
    }

    /// Finds the exclusive end of the level containing `node_index`: the
    /// smallest entry in `level_bounds` strictly greater than `node_index`.
    fn upper_bound(&self, node_index: usize) -> usize {
        for &bound in &self.level_bounds {
            if bound > node_index {
                return bound;
            }
        }
        self.boxes.len()
    }

    /// Iterative box query: visits every item whose box overlaps `query`,
    /// invoking `sink` with its original insertion index. Uses a fixed
    /// 512-frame stack (bounded by tree depth times fan-out).
    ///
    /// # Panics
    ///
    /// Panics (`debug_assert`) if the stack depth required exceeds 512,
    /// which should not happen for any fan-out >= 2 below ~2^512 items.
    pub fn search(&self, query: Aabb2D<T>, mut sink: impl FnMut(u32)) {
        debug_assert!(self.finished, "search() called before finish()");
        if self.boxes.is_empty() {
            return;
        }
        let mut stack = [0usize; SEARCH_STACK_CAPACITY];
        let mut sp = 0usize;
        stack[sp] = self.boxes.len() - 1;
        sp += 1;

        while sp > 0 {
            sp -= 1;
            let group_start = stack[sp];
            let level_end = self.upper_bound(group_start);
            let block_end = (group_start + self.node_size).min(level_end);
            for pos in group_start..block_end {
                if !query.overlaps(&self.boxes[pos]) {
                    continue;
                }
                let idx = self.indices[pos];
                if pos < self.num_items {
                    sink(idx);
                } else {
                    debug_assert!(sp < SEARCH_STACK_CAPACITY, "search stack overflow");
                    stack[sp] = idx as usize;
                    sp += 1;
                }
            }
        }
    }

    /// Best-first k-nearest search using [`understory_heap::BinaryMinHeap`].
    /// Emits results in nondecreasing distance order (ties broken by heap
    /// order), bounded by `max_neighbors` and (if given) `max_dist_squared`.
    pub fn neighbors(
        &self,
        point: [T; 2],
        max_neighbors: usize,
        max_dist_squared: Option<T>,
        mut sink: impl FnMut(u32, T),
    ) {
        debug_assert!(self.finished, "neighbors() called before finish()");
        if self.boxes.is_empty() || max_neighbors == 0 {
            return;
        }
        let mut heap: BinaryMinHeap<(f64, usize), _> =
            BinaryMinHeap::new(|a: &(f64, usize), b: &(f64, usize)| a.0 < b.0);
        heap.push((0.0, self.boxes.len() - 1));

        let mut found = 0usize;
        while let Some((dist, pos)) = heap.pop() {
            if let Some(max_d) = max_dist_squared
                && T::from_f64(dist) > max_d
            {
                break;
            }
            if pos < self.num_items {
                sink(self.indices[pos], T::from_f64(dist));
                found += 1;
                if found >= max_neighbors {
                    break;
                }
            } else {
                let group_start = self.indices[pos] as usize;
                let level_end = self.upper_bound(group_start);
                let block_end = (group_start + self.node_size).min(level_end);
                for child in group_start..block_end {
                    let d = self.boxes[child].distance_squared(point).to_f64();
                    heap.push((d, child));
                }
            }
        }
    }
}

/// Standard iterative-bit Hilbert curve index for a 16-bit square grid
/// (`x, y` in `[0, 65535]`).
fn hilbert_xy_to_index(mut x: u32, mut y: u32) -> u32 {
    let mut d: u32 = 0;
    let mut s: u32 = 1 << 15;
    while s > 0 {
        let rx = u32::from((x & s) > 0);
        let ry = u32::from((y & s) > 0);
        d = d.wrapping_add(s.wrapping_mul(s).wrapping_mul((3 * rx) ^ ry));
        if ry == 0 {
            if rx == 1 {
                x = s.wrapping_sub(1).wrapping_sub(x);
                y = s.wrapping_sub(1).wrapping_sub(y);
            }
            core::mem::swap(&mut x, &mut y);
        }
        s >>= 1;
    }
    d
}

/// Quicksort keyed on `values`, permuting `boxes` and `indices` in lockstep.
///
/// Recursion stops once a partition lies entirely within one `node_size`
/// block (`left / node_size >= right / node_size`): within-block ordering
/// is irrelevant to the packed layout's query selectivity, and skipping it
/// is cheaper. This is required to preserve the packed layout contract, not
/// just a performance shortcut.
fn quicksort_by_key<T: Copy>(
    values: &mut [u32],
    boxes: &mut [Aabb2D<T>],
    indices: &mut [u32],
    left: isize,
    right: isize,
    node_size: usize,
) {
    if left >= right {
        return;
    }
    if (left as usize) / node_size >= (right as usize) / node_size {
        return;
    }
    let pivot = values[((left + right) / 2) as usize];
    let mut i = left - 1;
    let mut j = right + 1;
    loop {
        loop {
            i += 1;
            if values[i as usize] >= pivot {
                break;
            }
        }
        loop {
            j -= 1;
            if values[j as usize] <= pivot {
                break;
            }
        }
        if i >= j {
            break;
        }
        values.swap(i as usize, j as usize);
        boxes.swap(i as usize, j as usize);
        indices.swap(i as usize, j as usize);
    }
    quicksort_by_key(values, boxes, indices, left, j, node_size);
    quicksort_by_key(values, boxes, indices, j + 1, right, node_size);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    /// Scenario 1 from the spec: 16 boxes, default node size (16, so this
    /// is the trivial "one level" case), query `(0,0)-(8,31)`.
    #[test]
    fn box_query_matches_expected_index_set() {
        let raw: [([f32; 2], [f32; 2]); 16] = [
            ([5.0, 2.0], [16.0, 7.0]),
            ([1.0, 1.0], [2.0, 2.0]),
            ([26.0, 24.0], [44.0, 28.0]),
            ([22.0, 21.0], [23.0, 24.0]),
            ([16.0, 0.0], [32.0, 16.0]),
            ([0.0, 0.0], [8.0, 8.0]),
            ([4.0, 4.0], [6.0, 8.0]),
            ([2.0, 1.0], [2.0, 3.0]),
            ([4.0, 2.0], [8.0, 4.0]),
            ([3.0, 3.0], [12.0, 16.0]),
            ([0.0, 0.0], [64.0, 32.0]),
            ([3.0, 2.0], [32.0, 35.0]),
            ([32.0, 32.0], [64.0, 128.0]),
            ([128.0, 0.0], [256.0, 64.0]),
            ([120.0, 64.0], [250.0, 128.0]),
            ([123.0, 84.0], [230.0, 122.0]),
        ];
        let mut index = FlatbushIndex::<f32>::new(raw.len(), FlatbushIndex::<f32>::DEFAULT_NODE_SIZE);
        for (min, max) in raw {
            index.add(min, max);
        }
        index.finish();

        let mut found = Vec::new();
        index.search(Aabb2D::new([0.0, 0.0], [8.0, 31.0]), |i| found.push(i));
        found.sort_unstable();
        assert_eq!(found, alloc::vec![0, 1, 5, 6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn root_bounds_equal_union_of_leaves() {
        let mut index = FlatbushIndex::<f32>::new(3, 2);
        index.add([0.0, 0.0], [1.0, 1.0]);
        index.add([5.0, 5.0], [6.0, 6.0]);
        index.add([-2.0, 3.0], [-1.0, 4.0]);
        index.finish();
        assert_eq!(index.bounds(), Aabb2D::new([-2.0, 0.0], [6.0, 6.0]));
    }

    #[test]
    fn forces_multiple_levels_and_still_finds_everything() {
        let n = 200;
        let mut index = FlatbushIndex::<f32>::new(n, 4);
        for i in 0..n {
            let x = (i % 20) as f32;
            let y = (i / 20) as f32;
            index.add([x, y], [x + 0.5, y + 0.5]);
        }
        index.finish();

        let mut found = Vec::new();
        index.search(Aabb2D::new([0.0, 0.0], [20.0, 10.0]), |i| found.push(i));
        found.sort_unstable();
        let expected: Vec<u32> = (0..n as u32).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn neighbors_emit_in_nondecreasing_distance_order() {
        let mut index = FlatbushIndex::<f32>::new(5, 4);
        let pts = [
            [0.0_f32, 0.0],
            [10.0, 0.0],
            [1.0, 0.0],
            [5.0, 0.0],
            [2.0, 0.0],
        ];
        for p in pts {
            index.add(p, p);
        }
        index.finish();

        let mut out = Vec::new();
        index.neighbors([0.0, 0.0], 5, None, |idx, d| out.push((idx, d)));
        let mut last = 0.0_f32;
        for (_, d) in &out {
            assert!(*d >= last - 1e-6);
            last = *d;
        }
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn neighbors_respects_max_count_and_distance() {
        let mut index = FlatbushIndex::<f32>::new(3, 4);
        index.add([0.0, 0.0], [0.0, 0.0]);
        index.add([100.0, 0.0], [100.0, 0.0]);
        index.add([1.0, 0.0], [1.0, 0.0]);
        index.finish();

        let mut out = Vec::new();
        index.neighbors([0.0, 0.0], 10, Some(4.0), |idx, _| out.push(idx));
        out.sort_unstable();
        assert_eq!(out, alloc::vec![0, 2]);
    }

    #[test]
    fn empty_index_returns_no_results() {
        let mut index = FlatbushIndex::<f32>::new(0, 8);
        index.finish();
        let mut found = Vec::new();
        index.search(Aabb2D::new([0.0, 0.0], [10.0, 10.0]), |i| found.push(i));
        assert!(found.is_empty());
    }
}
