mod codegen_manager;
mod commands;
mod editor;
mod settings;

use log::info;
use tauri::Manager;

use crate::codegen_manager::CodegenManager;
use crate::editor::EditorState;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let log_level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    tauri::Builder::default()
        .plugin(tauri_plugin_log::Builder::new().level(log_level).build())
        .setup(|app| {
            let app_handle = app.handle();

            // codegen settings -> bridge to the external generator
            let codegen_settings = settings::load_settings(app_handle)?;
            let config = settings::bridge_config(app_handle, &codegen_settings);
            info!(
                "[codegen] using generator {} (timeout {:?})",
                config.command.display(),
                config.timeout
            );

            // store shared state in the Manager
            app.manage(EditorState::default());
            app.manage(CodegenManager::new(app_handle.clone(), config));
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // registers routes for frontend
            commands::node_graph::get_node_types,
            commands::node_graph::get_graph,
            commands::node_graph::add_node,
            commands::node_graph::move_node,
            commands::node_graph::update_node_parameters,
            commands::node_graph::remove_node,
            commands::node_graph::add_connection,
            commands::node_graph::remove_connection,
            commands::node_graph::clear_graph,
            commands::node_graph::serialize_graph,
            // Codegen
            commands::codegen::generate_code,
            commands::codegen::generate_code_from_snapshot,
            commands::codegen::invoke_codegen,
            commands::codegen::get_codegen_state,
            // Settings
            settings::get_codegen_settings,
            settings::set_codegen_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
