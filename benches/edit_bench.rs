use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use spatial_graph::buffer::{BufferConfig, EditBuffer};
use spatial_graph::data::{Attributes, Domain, Field, FieldData};
use spatial_graph::edit;
use spatial_graph::graph::SpatialGraph;

/// Random tree with jittered 4-sample polylines and a POINT radius.
fn random_tree(n: usize, seed: u64) -> SpatialGraph {
    let mut rng = SmallRng::seed_from_u64(seed);
    let nodes: Vec<[f64; 3]> = (0..n)
        .map(|_| [rng.gen_range(0.0..1e3), rng.gen_range(0.0..1e3), rng.gen_range(0.0..1e3)])
        .collect();
    let conn: Vec<[usize; 2]> = (1..n).map(|i| [rng.gen_range(0..i), i]).collect();
    let polylines: Vec<Vec<[f64; 3]>> = conn
        .iter()
        .map(|&[a, b]| {
            let (pa, pb) = (nodes[a], nodes[b]);
            let mut mid = |t: f64| -> [f64; 3] {
                let mut q = [0.0; 3];
                for k in 0..3 {
                    q[k] = pa[k] + (pb[k] - pa[k]) * t + rng.gen_range(-1.0..1.0);
                }
                q
            };
            vec![pa, mid(1. / 3.), mid(2. / 3.), pb]
        })
        .collect();
    let mut g = SpatialGraph::from_parts(&nodes, &conn, &polylines).unwrap();
    let radius: Vec<f64> = (0..g.point_count()).map(|i| 1.0 + (i % 7) as f64).collect();
    g.add_field(Field::new("Radius", Domain::Point, 1, FieldData::Float(radius)))
        .unwrap();
    g
}

fn bench_pure_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("pure_edits");
    for &n in &[1_000usize, 10_000] {
        let g = random_tree(n, 42);
        let doomed: Vec<usize> = (0..n).step_by(10).collect();

        group.bench_with_input(BenchmarkId::new("delete_nodes", n), &g, |b, g| {
            b.iter(|| edit::delete_nodes(black_box(g), &doomed).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("split", n), &g, |b, g| {
            b.iter(|| edit::insert_node_in_edge(black_box(g), n / 2, 0.5).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("collapse", n), &g, |b, g| {
            b.iter(|| edit::collapse_intermediate_nodes(black_box(g)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("resample", n), &g, |b, g| {
            b.iter(|| edit::resample_edges(black_box(g), edit::ResampleTarget::Count(8)).unwrap())
        });
    }
    group.finish();
}

fn bench_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("edit_buffer");
    let g = random_tree(1_000, 7);
    for &batch in &[16usize, 500] {
        group.bench_with_input(BenchmarkId::new("add_1000_edges", batch), &batch, |b, &batch| {
            b.iter(|| {
                let mut buf = EditBuffer::with_config(&g, BufferConfig::default().with_growth_batch(batch)).unwrap();
                let attrs = Attributes::new();
                let mut prev = 0;
                for i in 0..1_000 {
                    let n = buf.add_node([i as f64, 0., 0.], &attrs).unwrap();
                    buf.add_edge(prev, n, &attrs, None).unwrap();
                    prev = n;
                }
                buf.flush().unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pure_edits, bench_buffer);
criterion_main!(benches);
