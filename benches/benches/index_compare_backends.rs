// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_index::bvh::Bvh;
use understory_index::quadtree::Quadtree;
use understory_index::rtree::RTree;
use understory_index::rtree_packed::FlatbushIndex;
use understory_index::{Aabb2D, Indexable};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Aabb2D::from_xy((x0, y0), (x0 + cell, y0 + cell)));
        }
    }
    out
}

fn gen_random_rects(count: usize, world: f64, min_size: f64, max_size: f64) -> Vec<Aabb2D<f64>> {
    let mut rng = Rng::new(0x3C6E_F35F_4750_2932);
    (0..count)
        .map(|_| {
            let cx = rng.next_f64() * world;
            let cy = rng.next_f64() * world;
            let w = min_size + rng.next_f64() * (max_size - min_size);
            let h = min_size + rng.next_f64() * (max_size - min_size);
            Aabb2D::from_xy((cx - w * 0.5, cy - h * 0.5), (cx + w * 0.5, cy + h * 0.5))
        })
        .collect()
}

/// [`Indexable`] that treats each stored value as its own bounding box.
struct SelfIndexable;

impl Indexable<Aabb2D<f64>, f64> for SelfIndexable {
    fn min(&self, value: &Aabb2D<f64>) -> [f64; 2] {
        value.lower
    }
    fn max(&self, value: &Aabb2D<f64>) -> [f64; 2] {
        value.upper
    }
}

fn bench_bulk_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_load_grid");
    for &n in &[16usize, 32, 64] {
        let rects = gen_grid_rects(n, 10.0);
        group.throughput(Throughput::Elements(rects.len() as u64));

        group.bench_function(BenchmarkId::new("FlatbushIndex", n), |b| {
            b.iter_batched(
                || rects.clone(),
                |rects| {
                    let mut index = FlatbushIndex::<f64>::new(rects.len(), 16);
                    for r in &rects {
                        index.add(r.lower, r.upper);
                    }
                    index.finish();
                    index
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("Bvh", n), |b| {
            b.iter_batched(
                || rects.clone(),
                |rects| {
                    let mut bvh: Bvh<f64, ()> = Bvh::new();
                    for r in &rects {
                        bvh.create_proxy(*r, (), 0);
                    }
                    bvh
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("RTree", n), |b| {
            b.iter_batched(
                || rects.clone(),
                |rects| {
                    let mut tree = RTree::new(SelfIndexable);
                    for r in rects {
                        tree.insert(r);
                    }
                    tree
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(BenchmarkId::new("Quadtree", n), |b| {
            b.iter_batched(
                || rects.clone(),
                |rects| {
                    let bounds = Aabb2D::from_xy((0.0, 0.0), (n as f64 * 10.0, n as f64 * 10.0));
                    let mut tree = Quadtree::new(bounds, SelfIndexable);
                    for r in rects {
                        tree.insert(r);
                    }
                    tree
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_random");
    let rects = gen_random_rects(4096, 2000.0, 4.0, 16.0);
    let query = Aabb2D::from_xy((800.0, 800.0), (1200.0, 1200.0));

    let mut flatbush = FlatbushIndex::<f64>::new(rects.len(), 16);
    for r in &rects {
        flatbush.add(r.lower, r.upper);
    }
    flatbush.finish();

    let mut bvh: Bvh<f64, ()> = Bvh::new();
    for r in &rects {
        bvh.create_proxy(*r, (), 0);
    }

    let mut rtree = RTree::new(SelfIndexable);
    for r in rects.iter().copied() {
        rtree.insert(r);
    }

    group.bench_function("FlatbushIndex", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            flatbush.search(query, |_| hits += 1);
            black_box(hits)
        })
    });

    group.bench_function("Bvh", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            bvh.query(query, |_| {
                hits += 1;
                true
            });
            black_box(hits)
        })
    });

    group.bench_function("RTree", |b| {
        b.iter(|| {
            let mut out = Vec::new();
            rtree.query(&understory_index::interfaces::intersects(query), &mut out);

            black_box(out.len())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_bulk_load, bench_query);
criterion_main!(benches);
