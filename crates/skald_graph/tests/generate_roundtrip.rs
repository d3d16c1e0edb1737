#![cfg(unix)]

use serde_json::json;
use skald_graph::{
    generate_code, parse_wire, serialize, AudioGraph, BridgeConfig, CodegenBridge, GenerateError,
    GeneratorCommand, NodeKind, Position,
};

fn echo_bridge() -> CodegenBridge {
    // Stands in for the real generator: echoes the graph it was given.
    let command = GeneratorCommand::new("/bin/sh").arg("-c").arg("cat");
    CodegenBridge::new(BridgeConfig::new(command))
}

#[tokio::test]
async fn generator_sees_the_serialized_session_graph() {
    let mut graph = AudioGraph::new();
    let lfo = graph.add_node("oscillator", Position::new(0.0, 0.0)).unwrap();
    let osc = graph.add_node("oscillator", Position::new(0.0, 120.0)).unwrap();
    let filter = graph.add_node("filter", Position::new(200.0, 60.0)).unwrap();
    let out = graph.add_node("output", Position::new(400.0, 60.0)).unwrap();

    let slow = json!({ "frequency": 2, "amplitude": 0.1 });
    graph
        .update_node_parameters(lfo, slow.as_object().unwrap())
        .unwrap();
    graph
        .add_connection(lfo, Some("output"), osc, Some("input_freq"))
        .unwrap();
    graph
        .add_connection(osc, Some("output"), filter, Some("input"))
        .unwrap();
    graph
        .add_connection(filter, Some("output"), out, Some("input"))
        .unwrap();

    let wire = serialize(&graph).unwrap();
    let echoed = generate_code(&echo_bridge(), &wire).await.unwrap();
    let received = parse_wire(&echoed).unwrap();

    assert_eq!(received, wire);
    assert_eq!(received.connections.len(), 3);
    assert_eq!(received.nodes[3].params.kind(), NodeKind::GraphOutput);
}

#[tokio::test]
async fn removing_a_node_keeps_the_export_consistent() {
    let mut graph = AudioGraph::new();
    let osc = graph.add_node("oscillator", Position::default()).unwrap();
    let out = graph.add_node("output", Position::default()).unwrap();
    graph
        .add_connection(osc, Some("output"), out, Some("input"))
        .unwrap();
    graph.remove_node(osc).unwrap();

    let wire = serialize(&graph).unwrap();
    assert!(wire.connections.is_empty());
    let echoed = generate_code(&echo_bridge(), &wire).await.unwrap();
    assert!(parse_wire(&echoed).is_ok());

    graph.remove_node(out).unwrap();
    let err = generate_code(&echo_bridge(), &serialize(&graph).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerateError::EmptyGraph));
}
