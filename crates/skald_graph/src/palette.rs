//! Static node type definitions: port tables and parameter forms.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::model::{
    FilterKind, NodeKind, Waveform, DEFAULT_AMPLITUDE, DEFAULT_CUTOFF, DEFAULT_FREQUENCY,
};

#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
pub enum PortDirection {
    /// Feeds a connection (`from_port`).
    Source,
    /// Receives a connection (`to_port`).
    Target,
}

#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
pub enum ParamType {
    Number,
    Choice,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub direction: PortDirection,
}

const OSCILLATOR_PORTS: &[PortSpec] = &[
    PortSpec {
        id: "input_freq",
        name: "Frequency",
        direction: PortDirection::Target,
    },
    PortSpec {
        id: "input_amp",
        name: "Amplitude",
        direction: PortDirection::Target,
    },
    PortSpec {
        id: "output",
        name: "Output",
        direction: PortDirection::Source,
    },
];

const FILTER_PORTS: &[PortSpec] = &[
    PortSpec {
        id: "input",
        name: "Input",
        direction: PortDirection::Target,
    },
    PortSpec {
        id: "output",
        name: "Output",
        direction: PortDirection::Source,
    },
];

const GRAPH_OUTPUT_PORTS: &[PortSpec] = &[PortSpec {
    id: "input",
    name: "Input",
    direction: PortDirection::Target,
}];

pub fn ports(kind: NodeKind) -> &'static [PortSpec] {
    match kind {
        NodeKind::Oscillator => OSCILLATOR_PORTS,
        NodeKind::Filter => FILTER_PORTS,
        NodeKind::GraphOutput => GRAPH_OUTPUT_PORTS,
    }
}

pub fn find_port(kind: NodeKind, port_id: &str) -> Option<&'static PortSpec> {
    ports(kind).iter().find(|port| port.id == port_id)
}

/// True when `port_id` exists on `kind` with the given direction.
pub fn has_port(kind: NodeKind, port_id: &str, direction: PortDirection) -> bool {
    find_port(kind, port_id).is_some_and(|port| port.direction == direction)
}

#[derive(TS, Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
#[ts(rename_all = "camelCase")]
pub struct PortDef {
    pub id: String,
    pub name: String,
}

#[derive(TS, Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
#[ts(rename_all = "camelCase")]
pub struct ParamDef {
    pub id: String,
    pub name: String,
    pub param_type: ParamType,
    pub default_number: Option<f64>,
    pub default_text: Option<String>,
    pub choices: Vec<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(TS, Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
#[ts(rename_all = "camelCase")]
pub struct NodeTypeDef {
    /// Palette tag, also accepted by `add_node`.
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub inputs: Vec<PortDef>,
    pub outputs: Vec<PortDef>,
    pub params: Vec<ParamDef>,
}

fn port_defs(kind: NodeKind, direction: PortDirection) -> Vec<PortDef> {
    ports(kind)
        .iter()
        .filter(|port| port.direction == direction)
        .map(|port| PortDef {
            id: port.id.into(),
            name: port.name.into(),
        })
        .collect()
}

fn number_param(id: &str, name: &str, default: f64, min: Option<f64>, max: Option<f64>) -> ParamDef {
    ParamDef {
        id: id.into(),
        name: name.into(),
        param_type: ParamType::Number,
        default_number: Some(default),
        default_text: None,
        choices: vec![],
        min,
        max,
    }
}

fn choice_param(id: &str, name: &str, default: &str, choices: Vec<String>) -> ParamDef {
    ParamDef {
        id: id.into(),
        name: name.into(),
        param_type: ParamType::Choice,
        default_number: None,
        default_text: Some(default.into()),
        choices,
        min: None,
        max: None,
    }
}

fn node_type_def(kind: NodeKind) -> NodeTypeDef {
    let (name, description, category, params) = match kind {
        NodeKind::Oscillator => (
            "Oscillator",
            "Periodic waveform generator.",
            "Sources",
            vec![
                choice_param(
                    "waveform",
                    "Waveform",
                    Waveform::Sine.name(),
                    Waveform::ALL.iter().map(|w| w.name().to_string()).collect(),
                ),
                number_param("frequency", "Frequency (Hz)", DEFAULT_FREQUENCY, Some(0.0), None),
                number_param("amplitude", "Amplitude", DEFAULT_AMPLITUDE, Some(0.0), Some(1.0)),
            ],
        ),
        NodeKind::Filter => (
            "Filter",
            "Frequency-selective filter.",
            "Processors",
            vec![
                choice_param(
                    "type",
                    "Filter Type",
                    FilterKind::Lowpass.name(),
                    FilterKind::ALL.iter().map(|k| k.name().to_string()).collect(),
                ),
                number_param("cutoff", "Cutoff (Hz)", DEFAULT_CUTOFF, Some(0.0), None),
            ],
        ),
        NodeKind::GraphOutput => (
            "Graph Output",
            "Final audio destination of the graph.",
            "Output",
            vec![],
        ),
    };

    NodeTypeDef {
        id: kind.tag().into(),
        kind,
        name: name.into(),
        description: Some(description.into()),
        category: Some(category.into()),
        inputs: port_defs(kind, PortDirection::Target),
        outputs: port_defs(kind, PortDirection::Source),
        params,
    }
}

pub fn get_node_types() -> Vec<NodeTypeDef> {
    NodeKind::ALL.iter().copied().map(node_type_def).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_directions_follow_type_tables() {
        assert!(has_port(NodeKind::Oscillator, "output", PortDirection::Source));
        assert!(has_port(NodeKind::Oscillator, "input_freq", PortDirection::Target));
        assert!(has_port(NodeKind::Oscillator, "input_amp", PortDirection::Target));
        assert!(!has_port(NodeKind::Oscillator, "input", PortDirection::Target));
        assert!(!has_port(NodeKind::Oscillator, "output", PortDirection::Target));
        assert!(has_port(NodeKind::Filter, "input", PortDirection::Target));
        assert!(!has_port(NodeKind::GraphOutput, "output", PortDirection::Source));
    }

    #[test]
    fn palette_lists_every_kind_with_matching_tags() {
        let types = get_node_types();
        assert_eq!(types.len(), 3);
        for def in &types {
            assert_eq!(NodeKind::from_tag(&def.id), Some(def.kind));
        }

        let output = types.iter().find(|t| t.kind == NodeKind::GraphOutput).unwrap();
        assert!(output.outputs.is_empty());
        assert!(output.params.is_empty());

        let osc = types.iter().find(|t| t.kind == NodeKind::Oscillator).unwrap();
        let inputs: Vec<_> = osc.inputs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(inputs, vec!["input_freq", "input_amp"]);
        assert_eq!(osc.params[0].choices.len(), 4);
    }
}
