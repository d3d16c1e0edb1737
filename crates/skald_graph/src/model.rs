use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Node identity. Positive, unique within a graph, never reused in a session.
pub type NodeId = u32;

/// Connection identity, allocated the same way as node ids.
pub type ConnectionId = u32;

#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
pub enum NodeKind {
    Oscillator,
    Filter,
    GraphOutput,
}

impl NodeKind {
    pub const ALL: [NodeKind; 3] = [NodeKind::Oscillator, NodeKind::Filter, NodeKind::GraphOutput];

    /// Resolves the tag the editor palette uses for drag-and-drop.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "oscillator" => Some(NodeKind::Oscillator),
            "filter" => Some(NodeKind::Filter),
            "output" => Some(NodeKind::GraphOutput),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Oscillator => "oscillator",
            NodeKind::Filter => "filter",
            NodeKind::GraphOutput => "output",
        }
    }

    /// Name used in the codegen wire format.
    pub fn wire_name(self) -> &'static str {
        match self {
            NodeKind::Oscillator => "Oscillator",
            NodeKind::Filter => "Filter",
            NodeKind::GraphOutput => "GraphOutput",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
pub enum Waveform {
    #[default]
    Sine,
    Sawtooth,
    Square,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Sawtooth,
        Waveform::Square,
        Waveform::Triangle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "Sine",
            Waveform::Sawtooth => "Sawtooth",
            Waveform::Square => "Square",
            Waveform::Triangle => "Triangle",
        }
    }
}

#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
pub enum FilterKind {
    #[default]
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
}

impl FilterKind {
    pub const ALL: [FilterKind; 4] = [
        FilterKind::Lowpass,
        FilterKind::Highpass,
        FilterKind::Bandpass,
        FilterKind::Notch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Lowpass => "Lowpass",
            FilterKind::Highpass => "Highpass",
            FilterKind::Bandpass => "Bandpass",
            FilterKind::Notch => "Notch",
        }
    }
}

pub const DEFAULT_FREQUENCY: f64 = 440.0;
pub const DEFAULT_AMPLITUDE: f64 = 0.5;
pub const DEFAULT_CUTOFF: f64 = 1000.0;

#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
pub struct OscillatorParams {
    pub waveform: Waveform,
    pub frequency: f64,
    pub amplitude: f64,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency: DEFAULT_FREQUENCY,
            amplitude: DEFAULT_AMPLITUDE,
        }
    }
}

#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
pub struct FilterParams {
    #[serde(rename = "type")]
    pub filter_type: FilterKind,
    pub cutoff: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            filter_type: FilterKind::Lowpass,
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

/// The output sink carries no parameters; it serializes as `{}`.
#[derive(TS, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
pub struct GraphOutputParams {}

/// Type-specific parameter record. The variant is the node's kind.
#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "parameters")]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
pub enum NodeParams {
    Oscillator(OscillatorParams),
    Filter(FilterParams),
    GraphOutput(GraphOutputParams),
}

impl NodeParams {
    pub fn default_for(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Oscillator => NodeParams::Oscillator(OscillatorParams::default()),
            NodeKind::Filter => NodeParams::Filter(FilterParams::default()),
            NodeKind::GraphOutput => NodeParams::GraphOutput(GraphOutputParams::default()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeParams::Oscillator(_) => NodeKind::Oscillator,
            NodeParams::Filter(_) => NodeKind::Filter,
            NodeParams::GraphOutput(_) => NodeKind::GraphOutput,
        }
    }
}

#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
#[ts(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    pub params: NodeParams,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.params.kind()
    }
}

#[derive(TS, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
#[ts(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub from_node: NodeId,
    pub from_port: String,
    pub to_node: NodeId,
    pub to_port: String,
}

impl Connection {
    pub fn links(&self, from_node: NodeId, from_port: &str, to_node: NodeId, to_port: &str) -> bool {
        self.from_node == from_node
            && self.from_port == from_port
            && self.to_node == to_node
            && self.to_port == to_port
    }

    pub fn touches(&self, node_id: NodeId) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }
}

/// Read-only view of a graph handed to the editor.
#[derive(TS, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
pub struct GraphView {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}
