// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical quadtree: subdivides into four equal quadrants, storing
//! objects at the deepest node that fully contains them. Objects that
//! straddle a child boundary stay at the parent rather than being split or
//! duplicated, which is what makes the hierarchical query's aggregate
//! collapsing sound.

use alloc::boxed::Box;
use alloc::vec::Vec;

use understory_aabb::Quadrant;
use understory_geom::Scalar;

use crate::interfaces::{Indexable, Predicate};
use crate::types::Aabb2D;

/// Default number of objects a leaf node holds before it subdivides.
pub const DEFAULT_MAX_CHILD_ITEMS: usize = 8;

/// Default containment factor for [`Quadtree::hierarchical_query`]: a
/// subtree's emitted individual hits collapse into its aggregate once they
/// exceed this fraction of the subtree's total object count.
pub const DEFAULT_CONTAINMENT_FACTOR: f64 = 0.6;

struct Entry<T: Scalar, V> {
    bbox: Aabb2D<T>,
    value: V,
}

struct Node<T: Scalar, V> {
    bbox: Aabb2D<T>,
    objects: Vec<Entry<T, V>>,
    children: Option<Box<[Node<T, V>; 4]>>,
}

impl<T: Scalar, V> Node<T, V> {
    fn new(bbox: Aabb2D<T>) -> Self {
        Self { bbox, objects: Vec::new(), children: None }
    }

    fn count(&self) -> usize {
        let mut n = self.objects.len();
        if let Some(children) = &self.children {
            for child in children.iter() {
                n += child.count();
            }
        }
        n
    }
}

/// A quadtree over values of type `V`, whose bounding boxes are supplied by
/// an [`Indexable`] implementation `I`.
pub struct Quadtree<T: Scalar, V, I: Indexable<V, T>> {
    root: Node<T, V>,
    indexable: I,
    max_child_items: usize,
    levels: u32,
}

impl<T: Scalar, V, I: Indexable<V, T>> Quadtree<T, V, I> {
    /// Builds an empty quadtree covering `bounds`, with the default max
    /// items per leaf before subdivision.
    #[must_use]
    pub fn new(bounds: Aabb2D<T>, indexable: I) -> Self {
        Self::with_max_items(bounds, indexable, DEFAULT_MAX_CHILD_ITEMS)
    }

    /// Builds an empty quadtree with an explicit subdivision threshold.
    #[must_use]
    pub fn with_max_items(bounds: Aabb2D<T>, indexable: I, max_child_items: usize) -> Self {
        Self { root: Node::new(bounds), indexable, max_child_items, levels: 0 }
    }

    /// The outer bounding box the tree was constructed with.
    #[must_use]
    pub fn bounds(&self) -> Aabb2D<T> {
        self.root.bbox
    }

    /// Current maximum depth reached by any subdivision.
    #[must_use]
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// Inserts `value`, descending to the deepest node whose box fully
    /// contains it, subdividing leaves that exceed the item threshold.
    /// Objects not fully contained by any child of a subdivided node stay
    /// at that node (hierarchical storage).
    pub fn insert(&mut self, value: V) {
        let bbox = self.indexable.bbox(&value);
        let max_items = self.max_child_items;
        let depth = insert_recursive(&mut self.root, Entry { bbox, value }, max_items, 1);
        self.levels = self.levels.max(depth);
    }

    /// Translates every stored object's box by `(dx, dy)` and the tree's
    /// outer bounds by the same offset, rebuilding node structure from
    /// scratch (subdivision planes are relative to the outer bounds, so a
    /// pure in-place shift of boxes alone would desync leaf placement from
    /// the shifted quadrant boundaries). Callers translating frequently
    /// should batch all moves into a single call.
    pub fn translate(&mut self, dx: T, dy: T)
    where
        V: Clone,
    {
        let mut all = Vec::new();
        collect_all(&self.root, &mut all);
        let new_bounds = self.root.bbox.translate([dx, dy]);
        self.root = Node::new(new_bounds);
        self.levels = 0;
        for value in all {
            self.insert(value);
        }
    }

    /// Collects objects whose bbox matches `predicate`. Recurses only into
    /// children whose box overlaps the predicate's box; once a child's box
    /// is fully contained by the predicate, every object beneath it is
    /// still visited (nothing is skipped) but no further overlap test is
    /// needed for its own descendants.
    pub fn query<P: Predicate<T>>(&self, predicate: &P, out: &mut Vec<&V>) {
        query_recursive(&self.root, predicate, out);
    }

    /// Emits the node's aggregate count instead of individual objects once
    /// the fraction of a subtree's objects matching `predicate` exceeds
    /// `containment_factor` (default [`DEFAULT_CONTAINMENT_FACTOR`]), or
    /// immediately when the predicate's box fully contains a subtree's
    /// box.
    pub fn hierarchical_query<'a, P: Predicate<T>>(
        &'a self,
        predicate: &P,
        containment_factor: f64,
        out: &mut Vec<HierarchicalHit<'a, V>>,
    ) {
        hierarchical_query_recursive(&self.root, predicate, containment_factor, out);
    }
}

/// One hit from [`Quadtree::hierarchical_query`].
pub enum HierarchicalHit<'a, V> {
    /// A single object.
    Value(&'a V),
    /// A subtree's aggregate object count, standing in for every object
    /// beneath it.
    Aggregate(usize),
}

fn insert_recursive<T: Scalar, V>(node: &mut Node<T, V>, entry: Entry<T, V>, max_items: usize, depth: u32) -> u32 {
    if let Some(children) = &mut node.children {
        for quadrant in Quadrant::ALL {
            let child = &mut children[quadrant as usize];
            if child.bbox.contains_box(&entry.bbox) {
                return insert_recursive(child, entry, max_items, depth + 1);
            }
        }
        node.objects.push(entry);
        return depth;
    }

    node.objects.push(entry);
    if node.objects.len() > max_items {
        subdivide(node, max_items, depth)
    } else {
        depth
    }
}

/// Splits a leaf into four quadrant children and tries to migrate every
/// currently-held object into whichever child fully contains it; objects
/// that fit in none stay at `node` (hierarchical storage).
fn subdivide<T: Scalar, V>(node: &mut Node<T, V>, max_items: usize, depth: u32) -> u32 {
    let children = [
        Node::new(node.bbox.quad2d(Quadrant::Nw)),
        Node::new(node.bbox.quad2d(Quadrant::Ne)),
        Node::new(node.bbox.quad2d(Quadrant::Sw)),
        Node::new(node.bbox.quad2d(Quadrant::Se)),
    ];
    node.children = Some(Box::new(children));

    let objects: Vec<Entry<T, V>> = node.objects.drain(..).collect();
    let mut deepest = depth;
    for entry in objects {
        let children = node.children.as_mut().unwrap();
        let mut placed = false;
        for quadrant in Quadrant::ALL {
            let child = &mut children[quadrant as usize];
            if child.bbox.contains_box(&entry.bbox) {
                let d = insert_recursive(child, entry, max_items, depth + 1);
                deepest = deepest.max(d);
                placed = true;
                break;
            }
        }
        if !placed {
            // SAFETY-irrelevant borrow juggling: re-fetch node.objects
            // (not `children`, already dropped) to retain the object here.
            let entry = entry;
            node.objects.push(entry);
        }
    }
    deepest
}

fn query_recursive<'a, T: Scalar, V, P: Predicate<T>>(node: &'a Node<T, V>, predicate: &P, out: &mut Vec<&'a V>) {
    for entry in &node.objects {
        if predicate.test(&entry.bbox) {
            out.push(&entry.value);
        }
    }
    if let Some(children) = &node.children {
        for child in children.iter() {
            if predicate.bbox().overlaps(&child.bbox) {
                query_recursive(child, predicate, out);
            }
        }
    }
}

fn hierarchical_query_recursive<'a, T: Scalar, V, P: Predicate<T>>(
    node: &'a Node<T, V>,
    predicate: &P,
    containment_factor: f64,
    out: &mut Vec<HierarchicalHit<'a, V>>,
) {
    if predicate.bbox().contains_box(&node.bbox) {
        let total = node.count();
        if total > 0 {
            out.push(HierarchicalHit::Aggregate(total));
        }
        return;
    }

    let start = out.len();
    for entry in &node.objects {
        if predicate.test(&entry.bbox) {
            out.push(HierarchicalHit::Value(&entry.value));
        }
    }
    if let Some(children) = &node.children {
        for child in children.iter() {
            if predicate.bbox().overlaps(&child.bbox) {
                hierarchical_query_recursive(child, predicate, containment_factor, out);
            }
        }
    }

    let found = out.len() - start;
    let total = node.count();
    if total > 0 && found as f64 > containment_factor * total as f64 {
        out.truncate(start);
        out.push(HierarchicalHit::Aggregate(total));
    }
}

fn collect_all<T: Scalar, V: Clone>(node: &Node<T, V>, out: &mut Vec<V>) {
    for entry in &node.objects {
        out.push(entry.value.clone());
    }
    if let Some(children) = &node.children {
        for child in children.iter() {
            collect_all(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy)]
    struct Obj {
        id: u32,
        bbox: Aabb2D<f32>,
    }

    struct ObjIndexable;

    impl Indexable<Obj, f32> for ObjIndexable {
        fn min(&self, value: &Obj) -> [f32; 2] {
            value.bbox.lower
        }
        fn max(&self, value: &Obj) -> [f32; 2] {
            value.bbox.upper
        }
    }

    fn obj(id: u32, lower: (f32, f32), upper: (f32, f32)) -> Obj {
        Obj { id, bbox: Aabb2D::new([lower.0, lower.1], [upper.0, upper.1]) }
    }

    #[test]
    fn hierarchical_query_emits_individual_objects_below_factor() {
        let mut tree = Quadtree::with_max_items(Aabb2D::new([0.0, 0.0], [256.0, 256.0]), ObjIndexable, 2);
        tree.insert(obj(0, (0.0, 0.0), (1.0, 1.0)));
        tree.insert(obj(1, (2.0, 2.0), (3.0, 3.0)));
        tree.insert(obj(2, (4.0, 4.0), (5.0, 5.0)));

        let mut out = Vec::new();
        tree.hierarchical_query(
            &crate::interfaces::intersects(Aabb2D::new([0.0, 0.0], [10.0, 10.0])),
            0.5,
            &mut out,
        );
        let total_seen: usize = out
            .iter()
            .map(|hit| match hit {
                HierarchicalHit::Value(_) => 1,
                HierarchicalHit::Aggregate(n) => *n,
            })
            .sum();
        assert_eq!(total_seen, 3);
    }

    #[test]
    fn query_finds_objects_in_overlapping_region() {
        let mut tree = Quadtree::new(Aabb2D::new([0.0, 0.0], [100.0, 100.0]), ObjIndexable);
        for i in 0..20 {
            let x = i as f32 * 4.0;
            tree.insert(obj(i, (x, x), (x + 1.0, x + 1.0)));
        }
        let mut out = Vec::new();
        tree.query(&crate::interfaces::intersects(Aabb2D::new([0.0, 0.0], [20.0, 20.0])), &mut out);
        assert!(out.len() >= 5);
    }

    #[test]
    fn objects_straddling_quadrant_boundary_stay_at_parent() {
        let mut tree = Quadtree::with_max_items(Aabb2D::new([0.0, 0.0], [256.0, 256.0]), ObjIndexable, 1);
        tree.insert(obj(0, (0.0, 0.0), (1.0, 1.0)));
        // Straddles all four quadrants.
        tree.insert(obj(1, (127.0, 127.0), (129.0, 129.0)));
        let mut out = Vec::new();
        tree.query(&crate::interfaces::intersects(Aabb2D::new([0.0, 0.0], [256.0, 256.0])), &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn translate_shifts_every_stored_box() {
        let mut tree = Quadtree::new(Aabb2D::new([0.0, 0.0], [100.0, 100.0]), ObjIndexable);
        tree.insert(obj(0, (1.0, 1.0), (2.0, 2.0)));
        tree.translate(10.0, 10.0);
        let mut out = Vec::new();
        tree.query(&crate::interfaces::intersects(Aabb2D::new([10.0, 10.0], [13.0, 13.0])), &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 0);
    }
}
