// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamic bounding-volume hierarchy: incremental insert/move/remove with
//! AVL-style rotation rebalancing, fattened AABBs so small proxy motions
//! don't force a tree update, and a binned-SAH bulk rebuild.
//!
//! This is a close port of Box2D's `b2DynamicTree`: a pool of nodes in a
//! single growable array with an embedded free list, a sentinel `-1` (here
//! [`NULL_NODE`]) for "no index", and leaves distinguished by `height == 0`.

use alloc::vec;
use alloc::vec::Vec;

use understory_geom::Scalar;

use crate::backend::{Backend, SubtreeSummary};
use crate::types::Aabb2D;

/// Sentinel index meaning "no node"; universal across parent/child/next
/// links and the free list.
pub const NULL_NODE: i32 = -1;

/// Extension fattening applied on every side of an inserted proxy AABB, in
/// `0.1 * LEN_UNITS_PER_METER` units. With the conventional
/// `LEN_UNITS_PER_METER = 1.0`, this is `0.1`.
pub const AABB_EXTENSION: f32 = 0.1;

/// A fattened AABB is re-inserted unconditionally once the tight AABB grows
/// to fill this multiple of the original extension on any side.
const AABB_MARGIN_MULTIPLIER: f32 = 5.0;

const STACK_CAPACITY: usize = 256;
const BIN_COUNT: usize = 32;

#[derive(Clone, Copy)]
struct Node<T: Scalar, S> {
    aabb: Aabb2D<T>,
    user_data: u64,
    category_bits: S,
    parent_or_next: i32,
    child1: i32,
    child2: i32,
    height: i32,
    moved: bool,
}

impl<T: Scalar, S: SubtreeSummary> Node<T, S> {
    fn is_leaf(&self) -> bool {
        self.child1 == NULL_NODE
    }
}

/// A dynamic bounding-volume hierarchy over 2D AABBs.
///
/// `S` is a per-leaf/per-subtree summary (default `u64`, treated as a
/// category bitmask: a node's summary is the bitwise OR of its children's).
/// Use `()` for trees with no filtering needs.
pub struct Bvh<T: Scalar, S: SubtreeSummary = u64> {
    nodes: Vec<Node<T, S>>,
    root: i32,
    free_list: i32,
    proxy_count: usize,
}

impl<T: Scalar, S: SubtreeSummary> Default for Bvh<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar, S: SubtreeSummary> Bvh<T, S> {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NULL_NODE,
            free_list: NULL_NODE,
            proxy_count: 0,
        }
    }

    /// Number of live leaves (proxies) in the tree.
    #[must_use]
    pub fn proxy_count(&self) -> usize {
        self.proxy_count
    }

    /// `true` if the tree holds no proxies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxy_count == 0
    }

    /// The root's (fattened) AABB, or `None` if the tree is empty.
    #[must_use]
    pub fn root_aabb(&self) -> Option<Aabb2D<T>> {
        if self.root == NULL_NODE {
            None
        } else {
            Some(self.nodes[self.root as usize].aabb)
        }
    }

    fn allocate_node(&mut self) -> i32 {
        if self.free_list == NULL_NODE {
            let start = self.nodes.len();
            // Grow the pool by 50%, minimum 16, chaining new nodes through
            // the free list via `parent_or_next`.
            let grow = (start / 2).max(16);
            self.nodes.reserve(grow);
            for i in 0..grow {
                let idx = start + i;
                self.nodes.push(Node {
                    aabb: Aabb2D::empty(),
                    user_data: 0,
                    category_bits: S::empty(),
                    parent_or_next: if i + 1 < grow {
                        (idx + 1) as i32
                    } else {
                        NULL_NODE
                    },
                    child1: NULL_NODE,
                    child2: NULL_NODE,
                    height: -1,
                    moved: false,
                });
            }
            self.free_list = start as i32;
        }
        let node_id = self.free_list;
        self.free_list = self.nodes[node_id as usize].parent_or_next;
        let node = &mut self.nodes[node_id as usize];
        node.parent_or_next = NULL_NODE;
        node.child1 = NULL_NODE;
        node.child2 = NULL_NODE;
        node.height = 0;
        node.moved = false;
        node_id
    }

    fn free_node(&mut self, node_id: i32) {
        let node = &mut self.nodes[node_id as usize];
        node.height = -1;
        node.parent_or_next = self.free_list;
        self.free_list = node_id;
    }

    /// Inserts a new proxy with a fattened AABB around `tight_aabb`, tagged
    /// with `category_bits` and `user_data`. Returns the proxy's stable
    /// node id.
    pub fn create_proxy(&mut self, tight_aabb: Aabb2D<T>, category_bits: S, user_data: u64) -> i32 {
        let leaf = self.allocate_node();
        let node = &mut self.nodes[leaf as usize];
        node.aabb = fatten(tight_aabb);
        node.category_bits = category_bits;
        node.user_data = user_data;
        node.height = 0;
        self.proxy_count += 1;
        self.insert_leaf(leaf);
        leaf
    }

    /// Removes a proxy previously returned by [`Self::create_proxy`].
    ///
    /// # Panics
    ///
    /// Panics (precondition violation) if `proxy` is not a live leaf.
    pub fn destroy_proxy(&mut self, proxy: i32) {
        debug_assert!(self.nodes[proxy as usize].is_leaf());
        self.remove_leaf(proxy);
        self.free_node(proxy);
        self.proxy_count -= 1;
    }

    /// Updates a proxy's tight AABB. Returns `true` if the tree was
    /// restructured (the old fat AABB no longer contained the new tight
    /// AABB, or the fat AABB had become excessively large relative to the
    /// tight one), `false` if the existing fat AABB still comfortably
    /// contains it (no tree mutation).
    pub fn move_proxy(&mut self, proxy: i32, tight_aabb: Aabb2D<T>) -> bool {
        let fat = self.nodes[proxy as usize].aabb;
        if fat.contains_box(&tight_aabb) {
            // Still contained: check whether the fat box has become
            // wastefully large relative to a 5x-fattened version of the
            // tight box, in which case re-insert to tighten it up.
            let huge_margin: Aabb2D<T> = fatten_by(tight_aabb, AABB_MARGIN_MULTIPLIER);
            if huge_margin.contains_box(&fat) {
                return false;
            }
        }
        let was_moved = self.nodes[proxy as usize].moved;
        self.remove_leaf(proxy);
        self.nodes[proxy as usize].aabb = fatten(tight_aabb);
        self.nodes[proxy as usize].moved = true;
        self.insert_leaf(proxy);
        let _ = was_moved;
        true
    }

    /// Reads back a proxy's user data.
    #[must_use]
    pub fn user_data(&self, proxy: i32) -> u64 {
        self.nodes[proxy as usize].user_data
    }

    /// Reads back a proxy's category bitmask.
    #[must_use]
    pub fn category_bits(&self, proxy: i32) -> S {
        self.nodes[proxy as usize].category_bits
    }

    fn insert_leaf(&mut self, leaf: i32) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf as usize].parent_or_next = NULL_NODE;
            return;
        }

        let leaf_aabb = self.nodes[leaf as usize].aabb;
        let mut index = self.root;
        while !self.nodes[index as usize].is_leaf() {
            let child1 = self.nodes[index as usize].child1;
            let child2 = self.nodes[index as usize].child2;
            let area = self.nodes[index as usize].aabb.perimeter();
            let combined = self.nodes[index as usize].aabb.union(&leaf_aabb);
            let combined_area = combined.perimeter();

            let cost = combined_area + combined_area;
            let inheritance_cost = (combined_area - area) + (combined_area - area);

            let cost1 = Self::descend_cost(&self.nodes[child1 as usize], leaf_aabb) + inheritance_cost;
            let cost2 = Self::descend_cost(&self.nodes[child2 as usize], leaf_aabb) + inheritance_cost;

            if cost < cost1 && cost < cost2 {
                break;
            }
            index = if cost1 < cost2 { child1 } else { child2 };
        }

        let sibling = index;
        let old_parent = self.nodes[sibling as usize].parent_or_next;
        let new_parent = self.allocate_node();
        {
            let n = &mut self.nodes[new_parent as usize];
            n.parent_or_next = old_parent;
            n.aabb = leaf_aabb.union(&self.nodes[sibling as usize].aabb);
            n.height = self.nodes[sibling as usize].height + 1;
        }

        if old_parent != NULL_NODE {
            if self.nodes[old_parent as usize].child1 == sibling {
                self.nodes[old_parent as usize].child1 = new_parent;
            } else {
                self.nodes[old_parent as usize].child2 = new_parent;
            }
            self.nodes[new_parent as usize].child1 = sibling;
            self.nodes[new_parent as usize].child2 = leaf;
            self.nodes[sibling as usize].parent_or_next = new_parent;
            self.nodes[leaf as usize].parent_or_next = new_parent;
        } else {
            self.nodes[new_parent as usize].child1 = sibling;
            self.nodes[new_parent as usize].child2 = leaf;
            self.nodes[sibling as usize].parent_or_next = new_parent;
            self.nodes[leaf as usize].parent_or_next = new_parent;
            self.root = new_parent;
        }

        self.refit_and_balance(self.nodes[leaf as usize].parent_or_next);
    }

    fn descend_cost(child: &Node<T, S>, leaf_aabb: Aabb2D<T>) -> T {
        let combined = child.aabb.union(&leaf_aabb);
        if child.is_leaf() {
            combined.perimeter()
        } else {
            combined.perimeter() - child.aabb.perimeter()
        }
    }

    fn remove_leaf(&mut self, leaf: i32) {
        if self.root == leaf {
            self.root = NULL_NODE;
            return;
        }
        let parent = self.nodes[leaf as usize].parent_or_next;
        let grandparent = self.nodes[parent as usize].parent_or_next;
        let sibling = if self.nodes[parent as usize].child1 == leaf {
            self.nodes[parent as usize].child2
        } else {
            self.nodes[parent as usize].child1
        };

        if grandparent != NULL_NODE {
            if self.nodes[grandparent as usize].child1 == parent {
                self.nodes[grandparent as usize].child1 = sibling;
            } else {
                self.nodes[grandparent as usize].child2 = sibling;
            }
            self.nodes[sibling as usize].parent_or_next = grandparent;
            self.free_node(parent);
            self.refit_and_balance(grandparent);
        } else {
            self.root = sibling;
            self.nodes[sibling as usize].parent_or_next = NULL_NODE;
            self.free_node(parent);
        }
    }

    /// Walks from `start` to the root, refitting AABBs/category bits and
    /// running [`Self::balance`] at each ancestor.
    fn refit_and_balance(&mut self, start: i32) {
        let mut index = start;
        while index != NULL_NODE {
            index = self.balance(index);
            let child1 = self.nodes[index as usize].child1;
            let child2 = self.nodes[index as usize].child2;
            self.nodes[index as usize].height =
                1 + self.nodes[child1 as usize].height.max(self.nodes[child2 as usize].height);
            self.nodes[index as usize].aabb =
                self.nodes[child1 as usize].aabb.union(&self.nodes[child2 as usize].aabb);
            self.nodes[index as usize].category_bits = S::combine(
                self.nodes[child1 as usize].category_bits,
                self.nodes[child2 as usize].category_bits,
            );
            index = self.nodes[index as usize].parent_or_next;
        }
    }

    /// AVL-style single rotation around `a` if its children's heights
    /// differ by more than 1. Returns the node now occupying `a`'s former
    /// position (itself, if no rotation was needed).
    fn balance(&mut self, a: i32) -> i32 {
        if self.nodes[a as usize].is_leaf() || self.nodes[a as usize].height < 2 {
            return a;
        }

        let b = self.nodes[a as usize].child1;
        let c = self.nodes[a as usize].child2;
        let balance = self.nodes[c as usize].height - self.nodes[b as usize].height;

        if balance > 1 {
            return self.rotate(a, c, b);
        }
        if balance < -1 {
            return self.rotate(a, b, c);
        }
        a
    }

    /// Rotates `tall` up to replace `a`, keeping `other` as `tall`'s new
    /// sibling. Chooses whichever of `tall`'s two children is taller to
    /// stay under `tall`; the shorter one moves down to replace `tall`
    /// under `a`.
    fn rotate(&mut self, a: i32, tall: i32, other: i32) -> i32 {
        let f = self.nodes[tall as usize].child1;
        let g = self.nodes[tall as usize].child2;

        self.nodes[tall as usize].child1 = a;
        self.nodes[tall as usize].parent_or_next = self.nodes[a as usize].parent_or_next;
        self.nodes[a as usize].parent_or_next = tall;

        let old_parent = self.nodes[tall as usize].parent_or_next;
        if old_parent != NULL_NODE {
            if self.nodes[old_parent as usize].child1 == a {
                self.nodes[old_parent as usize].child1 = tall;
            } else {
                self.nodes[old_parent as usize].child2 = tall;
            }
        } else {
            self.root = tall;
        }

        if self.nodes[f as usize].height > self.nodes[g as usize].height {
            self.nodes[tall as usize].child2 = f;
            self.nodes[a as usize].child2 = g;
            self.nodes[g as usize].parent_or_next = a;
        } else {
            self.nodes[tall as usize].child2 = g;
            self.nodes[a as usize].child2 = f;
            self.nodes[f as usize].parent_or_next = a;
        }
        let _ = other;

        let ac1 = self.nodes[a as usize].child1;
        let ac2 = self.nodes[a as usize].child2;
        self.nodes[a as usize].aabb = self.nodes[ac1 as usize].aabb.union(&self.nodes[ac2 as usize].aabb);
        self.nodes[a as usize].height = 1 + self.nodes[ac1 as usize].height.max(self.nodes[ac2 as usize].height);
        self.nodes[a as usize].category_bits =
            S::combine(self.nodes[ac1 as usize].category_bits, self.nodes[ac2 as usize].category_bits);

        let tc1 = self.nodes[tall as usize].child1;
        let tc2 = self.nodes[tall as usize].child2;
        self.nodes[tall as usize].aabb = self.nodes[tc1 as usize].aabb.union(&self.nodes[tc2 as usize].aabb);
        self.nodes[tall as usize].height =
            1 + self.nodes[tc1 as usize].height.max(self.nodes[tc2 as usize].height);
        self.nodes[tall as usize].category_bits =
            S::combine(self.nodes[tc1 as usize].category_bits, self.nodes[tc2 as usize].category_bits);

        tall
    }

    /// Visits every leaf whose fat AABB overlaps `query` and whose
    /// category bits intersect `mask_bits`. `f` returns `false` to stop the
    /// whole query.
    pub fn query_filtered(&self, query: Aabb2D<T>, mask: &impl Fn(S) -> bool, mut f: impl FnMut(i32) -> bool) {
        if self.root == NULL_NODE {
            return;
        }
        let mut stack = [NULL_NODE; STACK_CAPACITY];
        let mut sp = 0usize;
        stack[0] = self.root;
        sp = 1;
        while sp > 0 {
            sp -= 1;
            let node_id = stack[sp];
            if node_id == NULL_NODE {
                continue;
            }
            let node = &self.nodes[node_id as usize];
            if !node.aabb.overlaps(&query) || !mask(node.category_bits) {
                continue;
            }
            if node.is_leaf() {
                if !f(node_id) {
                    return;
                }
            } else {
                debug_assert!(sp + 2 <= STACK_CAPACITY, "bvh query stack overflow");
                stack[sp] = node.child1;
                stack[sp + 1] = node.child2;
                sp += 2;
            }
        }
    }

    /// Visits every leaf whose fat AABB overlaps `query`, with no category
    /// filtering.
    pub fn query(&self, query: Aabb2D<T>, f: impl FnMut(i32) -> bool) {
        self.query_filtered(query, &|_| true, f);
    }

    /// Raycasts a segment `origin + t * (target - origin)`, `t` in
    /// `[0, max_fraction]`. `f(node_id, max_fraction_so_far)` is invoked for
    /// each leaf whose (ray-radius-widened) AABB the segment crosses; its
    /// return value becomes the new `max_fraction` (tightening the segment),
    /// `0.0` stops the cast immediately.
    pub fn raycast(
        &self,
        origin: [T; 2],
        target: [T; 2],
        mut max_fraction: T,
        mut f: impl FnMut(i32, T) -> T,
    ) {
        if self.root == NULL_NODE {
            return;
        }
        let r = [target[0] - origin[0], target[1] - origin[1]];
        let mut stack = [NULL_NODE; STACK_CAPACITY];
        let mut sp = 0usize;
        stack[0] = self.root;
        sp = 1;

        while sp > 0 {
            sp -= 1;
            let node_id = stack[sp];
            if node_id == NULL_NODE {
                continue;
            }
            let node = &self.nodes[node_id as usize];
            let p1 = origin;
            let p2 = [origin[0] + r[0] * max_fraction, origin[1] + r[1] * max_fraction];
            let mut seg_box = Aabb2D::empty();
            seg_box.extend_point(p1);
            seg_box.extend_point(p2);
            if !seg_box.overlaps(&node.aabb) {
                continue;
            }
            if node.is_leaf() {
                let new_fraction = f(node_id, max_fraction);
                if new_fraction == T::ZERO {
                    return;
                }
                if new_fraction <= max_fraction {
                    max_fraction = new_fraction;
                }
            } else {
                debug_assert!(sp + 2 <= STACK_CAPACITY, "bvh raycast stack overflow");
                stack[sp] = node.child1;
                stack[sp + 1] = node.child2;
                sp += 2;
            }
        }
    }

    /// Rebuilds the entire tree from scratch using binned SAH (32 bins)
    /// over every live leaf. Returns a map from old proxy id to new proxy
    /// id (so callers can translate previously held handles); ids not
    /// present in the map were not live leaves.
    pub fn rebuild_top_down_sah(&mut self) -> Vec<(i32, i32)> {
        let mut leaves = Vec::with_capacity(self.proxy_count);
        self.collect_leaves(self.root, &mut leaves);

        // Reset the pool: every node becomes free except freshly-built ones.
        self.nodes.clear();
        self.free_list = NULL_NODE;
        self.root = NULL_NODE;

        if leaves.is_empty() {
            return Vec::new();
        }

        let mut items: Vec<LeafRecord<T, S>> = leaves
            .into_iter()
            .map(|(old_id, aabb, category_bits, user_data)| LeafRecord {
                old_id,
                aabb,
                category_bits,
                user_data,
            })
            .collect();

        let mut remap = Vec::with_capacity(items.len());
        let new_root = self.build_sah(&mut items, &mut remap);
        self.root = new_root;
        remap
    }

    fn collect_leaves(&self, node: i32, out: &mut Vec<(i32, Aabb2D<T>, S, u64)>) {
        if node == NULL_NODE {
            return;
        }
        let n = &self.nodes[node as usize];
        if n.is_leaf() {
            out.push((node, n.aabb, n.category_bits, n.user_data));
        } else {
            self.collect_leaves(n.child1, out);
            self.collect_leaves(n.child2, out);
        }
    }

    fn build_sah(&mut self, items: &mut [LeafRecord<T, S>], remap: &mut Vec<(i32, i32)>) -> i32 {
        if items.len() == 1 {
            let leaf = self.allocate_node();
            let node = &mut self.nodes[leaf as usize];
            node.aabb = items[0].aabb;
            node.category_bits = items[0].category_bits;
            node.user_data = items[0].user_data;
            node.height = 0;
            remap.push((items[0].old_id, leaf));
            return leaf;
        }

        let mut centroid_bounds = Aabb2D::empty();
        for it in items.iter() {
            centroid_bounds.extend_point(it.aabb.center());
        }
        let dims = centroid_bounds.dimensions();
        let axis = if dims[0] >= dims[1] { 0 } else { 1 };
        let extent = dims[axis].to_f64();

        if extent <= 0.0 {
            let mid = items.len() / 2;
            let (left, right) = items.split_at_mut(mid);
            let l = self.build_sah(left, remap);
            let r = self.build_sah(right, remap);
            return self.join(l, r);
        }

        let lower = centroid_bounds.lower[axis].to_f64();
        let bin_of = |it: &LeafRecord<T, S>| -> usize {
            let c = it.aabb.center()[axis].to_f64();
            let b = ((c - lower) / extent * BIN_COUNT as f64) as usize;
            b.min(BIN_COUNT - 1)
        };

        let mut counts = [0usize; BIN_COUNT];
        let mut bin_bounds = [Aabb2D::<T>::empty(); BIN_COUNT];
        for it in items.iter() {
            let b = bin_of(it);
            counts[b] += 1;
            bin_bounds[b] = bin_bounds[b].union(&it.aabb);
        }

        let mut left_count = [0usize; BIN_COUNT];
        let mut left_area = [0.0_f64; BIN_COUNT];
        let mut running = Aabb2D::<T>::empty();
        let mut running_count = 0usize;
        for i in 0..BIN_COUNT {
            running = running.union(&bin_bounds[i]);
            running_count += counts[i];
            left_count[i] = running_count;
            left_area[i] = running.perimeter().to_f64();
        }

        let mut right_count = [0usize; BIN_COUNT];
        let mut right_area = [0.0_f64; BIN_COUNT];
        let mut running = Aabb2D::<T>::empty();
        let mut running_count = 0usize;
        for i in (0..BIN_COUNT).rev() {
            running = running.union(&bin_bounds[i]);
            running_count += counts[i];
            right_count[i] = running_count;
            right_area[i] = running.perimeter().to_f64();
        }

        let mut best_split = None;
        let mut best_cost = f64::INFINITY;
        for i in 0..BIN_COUNT - 1 {
            if left_count[i] == 0 || right_count[i + 1] == 0 {
                continue;
            }
            let cost = left_count[i] as f64 * left_area[i] + right_count[i + 1] as f64 * right_area[i + 1];
            if cost < best_cost {
                best_cost = cost;
                best_split = Some(i);
            }
        }

        let Some(split_bin) = best_split else {
            let mid = items.len() / 2;
            let (left, right) = items.split_at_mut(mid);
            let l = self.build_sah(left, remap);
            let r = self.build_sah(right, remap);
            return self.join(l, r);
        };

        let mid = partition_by_bin(items, &bin_of, split_bin);
        let mid = mid.clamp(1, items.len() - 1);
        let (left, right) = items.split_at_mut(mid);
        let l = self.build_sah(left, remap);
        let r = self.build_sah(right, remap);
        self.join(l, r)
    }

    fn join(&mut self, a: i32, b: i32) -> i32 {
        let parent = self.allocate_node();
        let aabb = self.nodes[a as usize].aabb.union(&self.nodes[b as usize].aabb);
        let category = S::combine(self.nodes[a as usize].category_bits, self.nodes[b as usize].category_bits);
        let height = 1 + self.nodes[a as usize].height.max(self.nodes[b as usize].height);
        {
            let p = &mut self.nodes[parent as usize];
            p.child1 = a;
            p.child2 = b;
            p.aabb = aabb;
            p.category_bits = category;
            p.height = height;
        }
        self.nodes[a as usize].parent_or_next = parent;
        self.nodes[b as usize].parent_or_next = parent;
        parent
    }
}

struct LeafRecord<T: Scalar, S> {
    old_id: i32,
    aabb: Aabb2D<T>,
    category_bits: S,
    user_data: u64,
}

fn partition_by_bin<T: Scalar, S: SubtreeSummary>(
    items: &mut [LeafRecord<T, S>],
    bin_of: &impl Fn(&LeafRecord<T, S>) -> usize,
    split_bin: usize,
) -> usize {
    let mut i = 0;
    let mut j = items.len();
    while i < j {
        if bin_of(&items[i]) <= split_bin {
            i += 1;
        } else {
            j -= 1;
            items.swap(i, j);
        }
    }
    i
}

fn fatten<T: Scalar>(aabb: Aabb2D<T>) -> Aabb2D<T> {
    fatten_by(aabb, 1.0)
}

fn fatten_by<T: Scalar>(aabb: Aabb2D<T>, multiplier: f32) -> Aabb2D<T> {
    let e = T::from_f64(f64::from(AABB_EXTENSION * multiplier));
    Aabb2D::new([aabb.lower[0] - e, aabb.lower[1] - e], [aabb.upper[0] + e, aabb.upper[1] + e])
}

/// Implements [`Backend`] with `slot` treated as an opaque user-data
/// payload (the proxy id returned by [`Bvh::create_proxy`] is the real
/// handle; this adapter exists so [`Bvh`] can be used wherever the crate's
/// shared `Backend` abstraction is expected).
impl<T: Scalar, S: SubtreeSummary + 'static> Backend<T, S> for Bvh<T, S> {
    fn insert(&mut self, slot: usize, aabb: Aabb2D<T>) {
        self.create_proxy(aabb, S::empty(), slot as u64);
    }

    fn update(&mut self, slot: usize, aabb: Aabb2D<T>) {
        if let Some(proxy) = self.find_proxy_for_slot(slot) {
            self.move_proxy(proxy, aabb);
        }
    }

    fn remove(&mut self, slot: usize) {
        if let Some(proxy) = self.find_proxy_for_slot(slot) {
            self.destroy_proxy(proxy);
        }
    }

    fn clear(&mut self) {
        *self = Self::new();
    }

    fn visit_point<F: FnMut(usize)>(&self, x: T, y: T, mut f: F) {
        let q = Aabb2D::new([x, y], [x, y]);
        self.query(q, |proxy| {
            f(self.user_data(proxy) as usize);
            true
        });
    }

    fn visit_rect<F: FnMut(usize)>(&self, rect: Aabb2D<T>, mut f: F) {
        self.query(rect, |proxy| {
            f(self.user_data(proxy) as usize);
            true
        });
    }
}

impl<T: Scalar, S: SubtreeSummary> Bvh<T, S> {
    fn find_proxy_for_slot(&self, slot: usize) -> Option<i32> {
        let target = slot as u64;
        self.nodes
            .iter()
            .enumerate()
            .find(|(_, n)| n.height >= 0 && n.is_leaf() && n.user_data == target)
            .map(|(i, _)| i as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_within_fat_aabb_does_not_reinsert() {
        let mut tree: Bvh<f32, ()> = Bvh::new();
        let proxy = tree.create_proxy(Aabb2D::new([0.0, 0.0], [1.0, 1.0]), (), 0);
        assert_eq!(tree.proxy_count(), 1);

        let moved = tree.move_proxy(proxy, Aabb2D::new([0.05, 0.05], [1.05, 1.05]));
        assert!(!moved);
        assert_eq!(tree.proxy_count(), 1);

        let moved_far = tree.move_proxy(proxy, Aabb2D::new([2.0, 2.0], [3.0, 3.0]));
        assert!(moved_far);
        assert_eq!(tree.proxy_count(), 1);
    }

    #[test]
    fn insert_then_remove_restores_empty_tree() {
        let mut tree: Bvh<f32, ()> = Bvh::new();
        let proxy = tree.create_proxy(Aabb2D::new([0.0, 0.0], [1.0, 1.0]), (), 0);
        tree.destroy_proxy(proxy);
        assert_eq!(tree.proxy_count(), 0);
        assert!(tree.root_aabb().is_none());
    }

    #[test]
    fn query_finds_overlapping_proxies() {
        let mut tree: Bvh<f32, ()> = Bvh::new();
        for i in 0..50 {
            let x = i as f32;
            tree.create_proxy(Aabb2D::new([x, 0.0], [x + 1.0, 1.0]), (), i as u64);
        }
        let mut found = alloc::vec::Vec::new();
        tree.query(Aabb2D::new([10.0, 0.0], [12.0, 1.0]), |proxy| {
            found.push(tree.user_data(proxy));
            true
        });
        found.sort_unstable();
        assert!(found.contains(&10));
        assert!(found.contains(&11));
        assert!(found.contains(&12));
    }

    #[test]
    fn raycast_stops_when_callback_returns_zero() {
        let mut tree: Bvh<f32, ()> = Bvh::new();
        tree.create_proxy(Aabb2D::new([5.0, -1.0], [6.0, 1.0]), (), 1);
        tree.create_proxy(Aabb2D::new([10.0, -1.0], [11.0, 1.0]), (), 2);
        let mut hits = 0;
        tree.raycast([0.0, 0.0], [20.0, 0.0], 1.0, |_proxy, _frac| {
            hits += 1;
            0.0
        });
        assert_eq!(hits, 1);
    }

    #[test]
    fn rebuild_preserves_all_proxies_and_query_results() {
        let mut tree: Bvh<f32, ()> = Bvh::new();
        let mut ids = alloc::vec::Vec::new();
        for i in 0..40 {
            let x = i as f32 * 2.0;
            ids.push(tree.create_proxy(Aabb2D::new([x, 0.0], [x + 1.0, 1.0]), (), i as u64));
        }
        let remap = tree.rebuild_top_down_sah();
        assert_eq!(remap.len(), 40);
        assert_eq!(tree.proxy_count(), 40);

        let mut found = alloc::vec::Vec::new();
        tree.query(Aabb2D::new([0.0, 0.0], [1000.0, 1.0]), |proxy| {
            found.push(tree.user_data(proxy));
            true
        });
        assert_eq!(found.len(), 40);
    }

    #[test]
    fn category_bits_propagate_to_ancestors() {
        let mut tree: Bvh<f32, u64> = Bvh::new();
        tree.create_proxy(Aabb2D::new([0.0, 0.0], [1.0, 1.0]), 0b01, 1);
        tree.create_proxy(Aabb2D::new([5.0, 5.0], [6.0, 6.0]), 0b10, 2);
        let root = tree.root_aabb();
        assert!(root.is_some());
        let mut seen = 0u64;
        tree.query_filtered(
            Aabb2D::new([-10.0, -10.0], [10.0, 10.0]),
            &|bits| bits & 0b01 != 0,
            |proxy| {
                seen |= tree.category_bits(proxy);
                true
            },
        );
        assert_eq!(seen, 0b01);
    }
}
