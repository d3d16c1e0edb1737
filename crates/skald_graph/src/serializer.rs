//! Graph -> codegen wire format.
//!
//! The external generator reads exactly this shape on stdin:
//!
//! ```json
//! {
//!   "nodes": [{ "id": 1, "type": "Oscillator", "position": { "x": 0, "y": 0 },
//!               "parameters": { "waveform": "Sine", "frequency": 440, "amplitude": 0.5 } }],
//!   "connections": [{ "from_node": 1, "from_port": "output", "to_node": 2, "to_port": "input" }]
//! }
//! ```
//!
//! Nodes and connections keep the order of the source collections.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::error::SerializeError;
use crate::graph::AudioGraph;
use crate::model::{NodeId, NodeKind, NodeParams, Position};
use crate::palette::{self, PortDirection};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WireNode {
    pub id: NodeId,
    /// Emits `"type"` and `"parameters"`.
    #[serde(flatten)]
    pub params: NodeParams,
    pub position: Position,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WireConnection {
    pub from_node: NodeId,
    pub from_port: String,
    pub to_node: NodeId,
    pub to_port: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct WireGraph {
    pub nodes: Vec<WireNode>,
    pub connections: Vec<WireConnection>,
}

impl WireGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_json(&self) -> Result<String, SerializeError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SerializeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks the invariants the generator depends on: positive unique ids,
    /// endpoints naming existing nodes, port ids valid for the node type and
    /// direction, and parameter values in range.
    pub fn validate(&self) -> Result<(), SerializeError> {
        let mut kinds = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if node.id == 0 {
                return Err(SerializeError::InvalidNodeId(node.id.to_string()));
            }
            if kinds.insert(node.id, node.params.kind()).is_some() {
                return Err(SerializeError::DuplicateNodeId(node.id));
            }
            check_params(node.id, &node.params)?;
        }

        for conn in &self.connections {
            let from_kind = *kinds
                .get(&conn.from_node)
                .ok_or(SerializeError::UnknownNode(conn.from_node))?;
            let to_kind = *kinds
                .get(&conn.to_node)
                .ok_or(SerializeError::UnknownNode(conn.to_node))?;
            check_port(
                conn.from_node,
                conn.to_node,
                from_kind,
                Some(&conn.from_port),
                PortDirection::Source,
            )?;
            check_port(
                conn.from_node,
                conn.to_node,
                to_kind,
                Some(&conn.to_port),
                PortDirection::Target,
            )?;
        }
        Ok(())
    }
}

/// Parses wire JSON and validates it; the inverse of [`serialize`].
pub fn parse_wire(json: &str) -> Result<WireGraph, SerializeError> {
    let graph: WireGraph = serde_json::from_str(json)?;
    graph.validate()?;
    Ok(graph)
}

/// Maps the session graph to the wire format.
pub fn serialize(graph: &AudioGraph) -> Result<WireGraph, SerializeError> {
    let nodes: Vec<WireNode> = graph
        .nodes()
        .iter()
        .map(|node| WireNode {
            id: node.id,
            params: node.params.clone(),
            position: node.position,
        })
        .collect();

    let known: HashSet<NodeId> = nodes.iter().map(|node| node.id).collect();
    let mut connections = Vec::with_capacity(graph.connections().len());
    for conn in graph.connections() {
        for endpoint in [conn.from_node, conn.to_node] {
            if !known.contains(&endpoint) {
                return Err(SerializeError::UnknownNode(endpoint));
            }
        }
        connections.push(WireConnection {
            from_node: conn.from_node,
            from_port: conn.from_port.clone(),
            to_node: conn.to_node,
            to_port: conn.to_port.clone(),
        });
    }

    Ok(WireGraph { nodes, connections })
}

pub fn serialize_to_json(graph: &AudioGraph) -> Result<String, SerializeError> {
    serialize(graph)?.to_json()
}

/// Node as held by the editor's graph widget.
#[derive(TS, Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
#[ts(rename_all = "camelCase")]
pub struct SnapshotNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub position: Position,
    /// Parameter fields plus an optional display `label`.
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub data: Map<String, Value>,
}

/// Edge as held by the editor's graph widget. Handles are null when the edge
/// was drawn without explicit ports.
#[derive(TS, Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
#[ts(rename_all = "camelCase")]
pub struct SnapshotEdge {
    pub source: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    pub target: String,
    #[serde(default)]
    pub target_handle: Option<String>,
}

#[derive(TS, Serialize, Deserialize, Clone, Debug, Default)]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
pub struct EditorSnapshot {
    pub nodes: Vec<SnapshotNode>,
    pub edges: Vec<SnapshotEdge>,
}

const LABEL_FIELD: &str = "label";

fn parse_node_id(raw: &str) -> Result<NodeId, SerializeError> {
    match raw.trim().parse::<NodeId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(SerializeError::InvalidNodeId(raw.to_string())),
    }
}

/// Maps an editor snapshot straight to the wire format without coercion:
/// every inconsistency is an error.
pub fn serialize_snapshot(snapshot: &EditorSnapshot) -> Result<WireGraph, SerializeError> {
    let mut kinds = HashMap::with_capacity(snapshot.nodes.len());
    let mut nodes = Vec::with_capacity(snapshot.nodes.len());

    for raw in &snapshot.nodes {
        let id = parse_node_id(&raw.id)?;
        let tag = raw.node_type.as_deref().unwrap_or_default();
        let kind =
            NodeKind::from_tag(tag).ok_or_else(|| SerializeError::UnknownNodeType(tag.to_string()))?;
        if kinds.insert(id, kind).is_some() {
            return Err(SerializeError::DuplicateNodeId(id));
        }

        let mut fields = raw.data.clone();
        fields.remove(LABEL_FIELD);
        let mut params = NodeParams::default_for(kind);
        params
            .apply_patch(&fields)
            .map_err(|source| SerializeError::InvalidParameter { node_id: id, source })?;

        nodes.push(WireNode {
            id,
            params,
            position: raw.position,
        });
    }

    let mut connections = Vec::with_capacity(snapshot.edges.len());
    for edge in &snapshot.edges {
        let from_node = parse_node_id(&edge.source)?;
        let to_node = parse_node_id(&edge.target)?;
        let from_kind = *kinds
            .get(&from_node)
            .ok_or(SerializeError::UnknownNode(from_node))?;
        let to_kind = *kinds.get(&to_node).ok_or(SerializeError::UnknownNode(to_node))?;

        let from_port = check_port(
            from_node,
            to_node,
            from_kind,
            edge.source_handle.as_deref(),
            PortDirection::Source,
        )?;
        let to_port = check_port(
            from_node,
            to_node,
            to_kind,
            edge.target_handle.as_deref(),
            PortDirection::Target,
        )?;

        connections.push(WireConnection {
            from_node,
            from_port: from_port.to_string(),
            to_node,
            to_port: to_port.to_string(),
        });
    }

    Ok(WireGraph { nodes, connections })
}

fn check_port<'a>(
    from: NodeId,
    to: NodeId,
    kind: NodeKind,
    port: Option<&'a str>,
    direction: PortDirection,
) -> Result<&'a str, SerializeError> {
    let malformed = |reason: String| SerializeError::MalformedPort {
        from: from.to_string(),
        to: to.to_string(),
        reason,
    };
    let port = match port {
        Some(port) if !port.is_empty() => port,
        _ => return Err(malformed(format!("missing {:?} port", direction))),
    };
    if !palette::has_port(kind, port, direction) {
        return Err(malformed(format!(
            "'{}' is not a {:?} port of {}",
            port, direction, kind
        )));
    }
    Ok(port)
}

fn check_params(node_id: NodeId, params: &NodeParams) -> Result<(), SerializeError> {
    let fields = match params {
        NodeParams::Oscillator(p) => serde_json::to_value(p)?,
        NodeParams::Filter(p) => serde_json::to_value(p)?,
        NodeParams::GraphOutput(p) => serde_json::to_value(p)?,
    };
    let fields = match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    NodeParams::default_for(params.kind())
        .apply_patch(&fields)
        .map_err(|source| SerializeError::InvalidParameter { node_id, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FilterKind, FilterParams, OscillatorParams, Waveform};
    use serde_json::json;

    fn sawtooth_to_output() -> AudioGraph {
        let mut graph = AudioGraph::new();
        let osc = graph.add_node("oscillator", Position::new(50.0, 80.0)).unwrap();
        let out = graph.add_node("output", Position::new(300.0, 80.0)).unwrap();
        let patch = json!({ "waveform": "Sawtooth", "frequency": 440 })
            .as_object()
            .cloned()
            .unwrap();
        graph.update_node_parameters(osc, &patch).unwrap();
        graph
            .add_connection(osc, Some("output"), out, Some("input"))
            .unwrap();
        graph
    }

    #[test]
    fn serializes_oscillator_into_output_exactly() {
        let json = serialize_to_json(&sawtooth_to_output()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            json!({
                "nodes": [
                    {
                        "id": 1,
                        "type": "Oscillator",
                        "position": { "x": 50.0, "y": 80.0 },
                        "parameters": { "waveform": "Sawtooth", "frequency": 440.0, "amplitude": 0.5 }
                    },
                    {
                        "id": 2,
                        "type": "GraphOutput",
                        "position": { "x": 300.0, "y": 80.0 },
                        "parameters": {}
                    }
                ],
                "connections": [
                    { "from_node": 1, "from_port": "output", "to_node": 2, "to_port": "input" }
                ]
            })
        );
    }

    #[test]
    fn filter_parameters_use_type_key() {
        let mut graph = AudioGraph::new();
        let id = graph.add_node("filter", Position::default()).unwrap();
        let patch = json!({ "type": "Highpass", "cutoff": 2500.5 })
            .as_object()
            .cloned()
            .unwrap();
        graph.update_node_parameters(id, &patch).unwrap();

        let value = serde_json::to_value(serialize(&graph).unwrap()).unwrap();
        assert_eq!(
            value["nodes"][0]["parameters"],
            json!({ "type": "Highpass", "cutoff": 2500.5 })
        );
    }

    #[test]
    fn parse_reproduces_ids_types_and_parameters() {
        let mut graph = sawtooth_to_output();
        let filter = graph.add_node("filter", Position::new(1.0, 2.0)).unwrap();
        graph
            .add_connection(1, Some("output"), filter, Some("input"))
            .unwrap();

        let wire = serialize(&graph).unwrap();
        let parsed = parse_wire(&wire.to_json().unwrap()).unwrap();
        assert_eq!(parsed, wire);

        let kinds: Vec<_> = parsed.nodes.iter().map(|n| (n.id, n.params.kind())).collect();
        assert_eq!(
            kinds,
            vec![
                (1, NodeKind::Oscillator),
                (2, NodeKind::GraphOutput),
                (3, NodeKind::Filter)
            ]
        );
        assert_eq!(
            parsed.nodes[2].params,
            NodeParams::Filter(FilterParams {
                filter_type: FilterKind::Lowpass,
                cutoff: 1000.0
            })
        );
    }

    #[test]
    fn output_order_follows_graph_order() {
        let mut graph = AudioGraph::new();
        for tag in ["output", "filter", "oscillator", "filter"] {
            graph.add_node(tag, Position::default()).unwrap();
        }
        graph.remove_node(2).unwrap();
        let ids: Vec<_> = serialize(&graph).unwrap().nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert_eq!(serialize_to_json(&graph).unwrap(), serialize_to_json(&graph).unwrap());
    }

    #[test]
    fn parse_rejects_dangling_and_null_ports() {
        let dangling = r#"{"nodes":[{"id":1,"type":"GraphOutput","position":{"x":0,"y":0},"parameters":{}}],
            "connections":[{"from_node":7,"from_port":"output","to_node":1,"to_port":"input"}]}"#;
        assert!(matches!(parse_wire(dangling), Err(SerializeError::UnknownNode(7))));

        let null_port = r#"{"nodes":[],"connections":[{"from_node":1,"from_port":null,"to_node":2,"to_port":"input"}]}"#;
        assert!(matches!(parse_wire(null_port), Err(SerializeError::Json(_))));

        let unknown_type = r#"{"nodes":[{"id":1,"type":"Reverb","position":{"x":0,"y":0},"parameters":{}}],"connections":[]}"#;
        assert!(parse_wire(unknown_type).is_err());
    }

    #[test]
    fn parse_rejects_zero_node_id() {
        let zero = r#"{"nodes":[{"id":0,"type":"GraphOutput","position":{"x":0,"y":0},"parameters":{}}],"connections":[]}"#;
        assert!(matches!(
            parse_wire(zero),
            Err(SerializeError::InvalidNodeId(ref id)) if id == "0"
        ));
    }

    #[test]
    fn parse_rejects_out_of_range_parameters() {
        let loud = r#"{"nodes":[{"id":1,"type":"Oscillator","position":{"x":0,"y":0},
            "parameters":{"waveform":"Sine","frequency":440,"amplitude":3}}],"connections":[]}"#;
        assert!(matches!(
            parse_wire(loud),
            Err(SerializeError::InvalidParameter { node_id: 1, .. })
        ));
    }

    fn snapshot(value: Value) -> EditorSnapshot {
        serde_json::from_value(value).expect("snapshot json")
    }

    #[test]
    fn snapshot_maps_to_wire_format() {
        let snap = snapshot(json!({
            "nodes": [
                { "id": "1", "type": "oscillator", "position": { "x": 0, "y": 0 },
                  "data": { "label": "Oscillator", "waveform": "Square", "frequency": 110 } },
                { "id": "2", "type": "output", "position": { "x": 10, "y": 0 },
                  "data": { "label": "Graph Output" } }
            ],
            "edges": [
                { "source": "1", "sourceHandle": "output", "target": "2", "targetHandle": "input" }
            ]
        }));

        let wire = serialize_snapshot(&snap).unwrap();
        assert_eq!(
            wire.nodes[0].params,
            NodeParams::Oscillator(OscillatorParams {
                waveform: Waveform::Square,
                frequency: 110.0,
                amplitude: 0.5,
            })
        );
        assert_eq!(
            wire.connections,
            vec![WireConnection {
                from_node: 1,
                from_port: "output".into(),
                to_node: 2,
                to_port: "input".into(),
            }]
        );
    }

    #[test]
    fn snapshot_rejects_inconsistencies() {
        let bad_id = snapshot(json!({
            "nodes": [{ "id": "osc-1", "type": "oscillator", "position": { "x": 0, "y": 0 } }],
            "edges": []
        }));
        assert!(matches!(
            serialize_snapshot(&bad_id),
            Err(SerializeError::InvalidNodeId(ref id)) if id == "osc-1"
        ));

        let bad_type = snapshot(json!({
            "nodes": [{ "id": "1", "type": "delay", "position": { "x": 0, "y": 0 } }],
            "edges": []
        }));
        assert!(matches!(
            serialize_snapshot(&bad_type),
            Err(SerializeError::UnknownNodeType(ref t)) if t == "delay"
        ));

        let null_handle = snapshot(json!({
            "nodes": [
                { "id": "1", "type": "filter", "position": { "x": 0, "y": 0 } },
                { "id": "2", "type": "output", "position": { "x": 0, "y": 0 } }
            ],
            "edges": [{ "source": "1", "sourceHandle": null, "target": "2", "targetHandle": "input" }]
        }));
        assert!(matches!(
            serialize_snapshot(&null_handle),
            Err(SerializeError::MalformedPort { .. })
        ));

        let dangling = snapshot(json!({
            "nodes": [{ "id": "1", "type": "filter", "position": { "x": 0, "y": 0 } }],
            "edges": [{ "source": "1", "sourceHandle": "output", "target": "5", "targetHandle": "input" }]
        }));
        assert!(matches!(
            serialize_snapshot(&dangling),
            Err(SerializeError::UnknownNode(5))
        ));

        let duplicate = snapshot(json!({
            "nodes": [
                { "id": "1", "type": "filter", "position": { "x": 0, "y": 0 } },
                { "id": "1", "type": "output", "position": { "x": 0, "y": 0 } }
            ],
            "edges": []
        }));
        assert!(matches!(
            serialize_snapshot(&duplicate),
            Err(SerializeError::DuplicateNodeId(1))
        ));

        let unknown_field = snapshot(json!({
            "nodes": [{ "id": "1", "type": "filter", "position": { "x": 0, "y": 0 },
                        "data": { "resonance": 0.7 } }],
            "edges": []
        }));
        assert!(matches!(
            serialize_snapshot(&unknown_field),
            Err(SerializeError::InvalidParameter { node_id: 1, .. })
        ));
    }
}
