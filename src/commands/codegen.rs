use skald_graph::{serialize, serialize_snapshot, CodegenState, EditorSnapshot};
use tauri::State;

use crate::codegen_manager::CodegenManager;
use crate::editor::EditorState;

/// Generates code for the session graph.
#[tauri::command]
pub async fn generate_code(
    editor: State<'_, EditorState>,
    codegen: State<'_, CodegenManager>,
) -> Result<String, String> {
    let wire = editor
        .with_graph(|graph| serialize(graph))?
        .map_err(|e| e.to_string())?;
    codegen.generate(&wire).await
}

/// Generates code for a graph held by the webview's graph widget.
#[tauri::command]
pub async fn generate_code_from_snapshot(
    codegen: State<'_, CodegenManager>,
    snapshot: EditorSnapshot,
) -> Result<String, String> {
    let wire = serialize_snapshot(&snapshot).map_err(|e| e.to_string())?;
    codegen.generate(&wire).await
}

/// The only raw generator capability exposed to the webview.
#[tauri::command]
pub async fn invoke_codegen(
    codegen: State<'_, CodegenManager>,
    graph_json: String,
) -> Result<String, String> {
    codegen.invoke(&graph_json).await
}

#[tauri::command]
pub fn get_codegen_state(codegen: State<'_, CodegenManager>) -> Result<CodegenState, String> {
    codegen.state()
}
