use std::time::Duration;

use thiserror::Error;

use crate::model::{ConnectionId, NodeId};

/// Rejections from Graph Model mutations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("Unknown node type '{0}'")]
    InvalidType(String),
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),
    #[error("Connection {0} not found")]
    ConnectionNotFound(ConnectionId),
    #[error("Invalid port '{port}' on node {node_id}: {reason}")]
    InvalidPort {
        node_id: NodeId,
        port: String,
        reason: String,
    },
    #[error("Invalid parameter '{field}': {reason}")]
    InvalidParameter { field: String, reason: String },
}

/// Failures mapping a graph snapshot to the wire format. These point at an
/// inconsistent snapshot, not at user error.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("Unknown node type '{0}'")]
    UnknownNodeType(String),
    #[error("Node id '{0}' is not a positive integer")]
    InvalidNodeId(String),
    #[error("Duplicate node id {0}")]
    DuplicateNodeId(NodeId),
    #[error("Connection references unknown node {0}")]
    UnknownNode(NodeId),
    #[error("Malformed port on connection {from} -> {to}: {reason}")]
    MalformedPort {
        from: String,
        to: String,
        reason: String,
    },
    #[error("Invalid parameters on node {node_id}: {source}")]
    InvalidParameter {
        node_id: NodeId,
        #[source]
        source: GraphError,
    },
    #[error("Invalid graph JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures from the external code generator.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("Failed to start codegen process {program}: {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// Display is the generator's diagnostic text, verbatim.
    #[error("{message}")]
    Failed { code: Option<i32>, message: String },
    #[error("Codegen process timed out after {}s", .0.as_secs_f64())]
    TimedOut(Duration),
    #[error("Codegen output was not valid UTF-8: {0}")]
    InvalidOutput(#[from] std::string::FromUtf8Error),
    #[error("Codegen I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything that can stop a "Generate" action.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Graph is empty; add at least one node before generating code")]
    EmptyGraph,
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}
