#![allow(dead_code)]
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use spatial_graph::data::{Domain, Field, FieldData};
use spatial_graph::graph::{SpatialGraph, ValidationOptions};

pub fn p(x: f64, y: f64, z: f64) -> [f64; 3] {
    [x, y, z]
}

/// Graph from node coordinates and connectivity with straight two-sample
/// polylines.
pub fn straight(nodes: &[[f64; 3]], conn: &[[usize; 2]]) -> SpatialGraph {
    let points: Vec<Vec<[f64; 3]>> = conn.iter().map(|&[a, b]| vec![nodes[a], nodes[b]]).collect();
    SpatialGraph::from_parts(nodes, conn, &points).unwrap()
}

/// Path 0 - 1 - ... - (n-1) along x with unit spacing.
pub fn chain(n: usize) -> SpatialGraph {
    let nodes: Vec<[f64; 3]> = (0..n).map(|i| p(i as f64, 0., 0.)).collect();
    let conn: Vec<[usize; 2]> = (1..n).map(|i| [i - 1, i]).collect();
    straight(&nodes, &conn)
}

/// Attach a per-point float field named `name` holding the sample index.
pub fn with_point_ramp(mut g: SpatialGraph, name: &str) -> SpatialGraph {
    let data: Vec<f64> = (0..g.point_count()).map(|i| i as f64).collect();
    g.add_field(Field::new(name, Domain::Point, 1, FieldData::Float(data)))
        .unwrap();
    g
}

/// Random graph with `nodes` nodes and `edges` edges; polylines carry 2-5
/// samples with jittered interiors. No self-loops.
pub fn random_graph(seed: u64, nodes: usize, edges: usize) -> SpatialGraph {
    let mut rng = SmallRng::seed_from_u64(seed);
    let coords: Vec<[f64; 3]> = (0..nodes)
        .map(|_| p(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
        .collect();
    let mut conn = Vec::with_capacity(edges);
    let mut points = Vec::with_capacity(edges);
    if nodes >= 2 {
        for _ in 0..edges {
            let a = rng.gen_range(0..nodes);
            let mut b = rng.gen_range(0..nodes - 1);
            if b >= a {
                b += 1;
            }
            let interior = rng.gen_range(0..4);
            let mut line = vec![coords[a]];
            for k in 1..=interior {
                let t = k as f64 / (interior + 1) as f64;
                let base: Vec<f64> = (0..3).map(|c| coords[a][c] + (coords[b][c] - coords[a][c]) * t).collect();
                line.push(p(
                    base[0] + rng.gen_range(-1.0..1.0),
                    base[1] + rng.gen_range(-1.0..1.0),
                    base[2] + rng.gen_range(-1.0..1.0),
                ));
            }
            line.push(coords[b]);
            conn.push([a, b]);
            points.push(line);
        }
    }
    let mut g = SpatialGraph::from_parts(&coords, &conn, &points).unwrap();
    let radius: Vec<f64> = (0..g.point_count()).map(|_| rng.gen_range(0.5..3.0)).collect();
    g.add_field(Field::new("Radius", Domain::Point, 1, FieldData::Float(radius)))
        .unwrap();
    g
}

/// Panic with the first violation unless `g` passes the deep checks.
pub fn assert_valid(g: &SpatialGraph) {
    let report = g.validate(ValidationOptions::all());
    assert!(report.is_valid(), "invalid graph: {report}");
}
