//! Tauri commands for editing the session graph

use skald_graph::palette::{self, NodeTypeDef};
use skald_graph::{
    serialize, Connection, ConnectionId, GraphView, Node, NodeId, ParamPatch, Position,
};
use tauri::State;

use crate::editor::EditorState;

#[tauri::command]
pub fn get_node_types() -> Vec<NodeTypeDef> {
    palette::get_node_types()
}

#[tauri::command]
pub fn get_graph(editor: State<'_, EditorState>) -> Result<GraphView, String> {
    editor.with_graph(|graph| graph.view())
}

// -----------------------------------------------------------------------------
// Nodes
// -----------------------------------------------------------------------------

#[tauri::command]
pub fn add_node(
    editor: State<'_, EditorState>,
    node_type: String,
    position: Position,
) -> Result<NodeId, String> {
    editor
        .with_graph(|graph| graph.add_node(&node_type, position))?
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn move_node(
    editor: State<'_, EditorState>,
    node_id: NodeId,
    position: Position,
) -> Result<(), String> {
    editor
        .with_graph(|graph| graph.move_node(node_id, position))?
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn update_node_parameters(
    editor: State<'_, EditorState>,
    node_id: NodeId,
    patch: ParamPatch,
) -> Result<Node, String> {
    editor
        .with_graph(|graph| graph.update_node_parameters(node_id, &patch).cloned())?
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn remove_node(editor: State<'_, EditorState>, node_id: NodeId) -> Result<(), String> {
    editor
        .with_graph(|graph| graph.remove_node(node_id).map(|_| ()))?
        .map_err(|e| e.to_string())
}

// -----------------------------------------------------------------------------
// Connections
// -----------------------------------------------------------------------------

#[tauri::command]
pub fn add_connection(
    editor: State<'_, EditorState>,
    from_node: NodeId,
    from_port: Option<String>,
    to_node: NodeId,
    to_port: Option<String>,
) -> Result<Connection, String> {
    editor
        .with_graph(|graph| {
            graph.add_connection(
                from_node,
                from_port.as_deref(),
                to_node,
                to_port.as_deref(),
            )
        })?
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn remove_connection(
    editor: State<'_, EditorState>,
    connection_id: ConnectionId,
) -> Result<(), String> {
    editor
        .with_graph(|graph| graph.remove_connection(connection_id).map(|_| ()))?
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn clear_graph(editor: State<'_, EditorState>) -> Result<(), String> {
    editor.with_graph(|graph| graph.clear())
}

/// Wire JSON for the preview panel.
#[tauri::command]
pub fn serialize_graph(editor: State<'_, EditorState>) -> Result<String, String> {
    editor
        .with_graph(|graph| serialize(graph).and_then(|wire| wire.to_json_pretty()))?
        .map_err(|e| e.to_string())
}
