mod util;
use spatial_graph::data::{Domain, FieldData, names};
use spatial_graph::graph::SpatialGraph;
use spatial_graph::graph_error::GraphError;
use spatial_graph::io::{GraphArrays, GraphReader, GraphWriter, RenderGeometry};
use std::io::{Read, Write};
use thiserror::Error;
use util::*;

#[derive(Debug, Error)]
enum JsonError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

struct JsonFormat;

impl GraphReader for JsonFormat {
    type Error = JsonError;

    fn read<R: Read>(&self, reader: R) -> Result<GraphArrays, JsonError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

impl GraphWriter for JsonFormat {
    type Error = JsonError;

    fn write<W: Write>(&self, writer: W, arrays: &GraphArrays) -> Result<(), JsonError> {
        Ok(serde_json::to_writer(writer, arrays)?)
    }
}

#[test]
fn json_reader_and_writer_round_trip() {
    let g = with_point_ramp(chain(4), "Ramp");
    let mut bytes = Vec::new();
    JsonFormat.write_graph(&mut bytes, &g).unwrap();
    let back = JsonFormat.read_graph(bytes.as_slice()).unwrap();
    assert_eq!(back, g);
}

#[test]
fn bincode_keeps_field_order_and_types() {
    let g = random_graph(5, 10, 12);
    let arrays = g.to_arrays();
    let bytes = bincode::serialize(&arrays).unwrap();
    let decoded: GraphArrays = bincode::deserialize(&bytes).unwrap();
    assert_eq!(decoded, arrays);
    let order: Vec<&str> = decoded.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        order,
        vec![
            names::VERTEX_COORDINATES,
            names::EDGE_CONNECTIVITY,
            names::NUM_EDGE_POINTS,
            names::EDGE_POINT_COORDINATES,
            "Radius"
        ]
    );
    assert_eq!(SpatialGraph::from_arrays(decoded).unwrap(), g);
}

#[test]
fn malformed_json_payloads_surface_graph_errors() {
    let mut arrays = chain(3).to_arrays();
    let conn = arrays
        .fields
        .iter_mut()
        .find(|f| f.name == names::EDGE_CONNECTIVITY)
        .unwrap();
    conn.data = FieldData::Int(vec![0, 1, 1, 9]);
    let json = serde_json::to_vec(&arrays).unwrap();
    let err = JsonFormat.read_graph(json.as_slice()).unwrap_err();
    assert!(matches!(err, JsonError::Graph(GraphError::IndexOutOfRange { .. })), "{err}");

    let mut typed = chain(3).to_arrays();
    typed.fields[2].data = FieldData::Float(vec![2., 2.]);
    assert!(matches!(
        SpatialGraph::from_arrays(typed),
        Err(GraphError::FieldTypeMismatch { .. })
    ));

    assert!(matches!(
        JsonFormat.read_graph(&b"{\"domain_sizes\": 3}"[..]),
        Err(JsonError::Json(_))
    ));
}

#[test]
fn render_geometry_follows_the_polylines() {
    let g = random_graph(9, 6, 5);
    let r = RenderGeometry::from_graph(&g, None).unwrap();
    assert_eq!(r.polylines.len(), g.edge_count());
    let radii = r.radii.unwrap();
    for e in 0..g.edge_count() {
        assert_eq!(r.polylines[e].as_slice(), g.edge_points(e).unwrap());
        assert_eq!(radii[e].len(), r.polylines[e].len());
    }
    assert_eq!(g.field("Radius").unwrap().domain(), Domain::Point);
}
