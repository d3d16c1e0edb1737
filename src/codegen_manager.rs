use log::info;
use skald_graph::{
    generate_code, invoke_codegen, BridgeConfig, CodegenBridge, CodegenState, WireGraph,
};
use std::sync::{Arc, RwLock};
use tauri::{AppHandle, Emitter};

const STATE_EVENT: &str = "codegen_state";

/// Owns the active codegen bridge. Reconfiguring swaps in a fresh bridge;
/// requests already running finish on the one they started with.
pub struct CodegenManager {
    app: AppHandle,
    bridge: RwLock<Arc<CodegenBridge>>,
}

impl CodegenManager {
    pub fn new(app: AppHandle, config: BridgeConfig) -> Self {
        let bridge = Arc::new(CodegenBridge::new(config));
        forward_states(app.clone(), &bridge);
        Self {
            app,
            bridge: RwLock::new(bridge),
        }
    }

    pub fn bridge(&self) -> Result<Arc<CodegenBridge>, String> {
        self.bridge
            .read()
            .map(|bridge| Arc::clone(&*bridge))
            .map_err(|_| "Codegen bridge lock poisoned".to_string())
    }

    pub fn reconfigure(&self, config: BridgeConfig) -> Result<(), String> {
        info!(
            "[codegen] using generator {} (timeout {:?})",
            config.command.display(),
            config.timeout
        );
        let bridge = Arc::new(CodegenBridge::new(config));
        forward_states(self.app.clone(), &bridge);
        let mut guard = self
            .bridge
            .write()
            .map_err(|_| "Codegen bridge lock poisoned".to_string())?;
        *guard = bridge;
        Ok(())
    }

    pub fn state(&self) -> Result<CodegenState, String> {
        Ok(self.bridge()?.state())
    }

    pub async fn generate(&self, graph: &WireGraph) -> Result<String, String> {
        let bridge = self.bridge()?;
        generate_code(&bridge, graph)
            .await
            .map_err(|e| e.to_string())
    }

    /// Passes caller-supplied wire JSON through unchanged once it parses
    /// against the schema and names at least one node.
    pub async fn invoke(&self, graph_json: &str) -> Result<String, String> {
        let bridge = self.bridge()?;
        invoke_codegen(&bridge, graph_json)
            .await
            .map_err(|e| e.to_string())
    }
}

/// Relays bridge state transitions to the webview until the bridge is dropped.
fn forward_states(app: AppHandle, bridge: &CodegenBridge) {
    let mut rx = bridge.subscribe();
    tauri::async_runtime::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = *rx.borrow_and_update();
            let _ = app.emit(STATE_EVENT, state);
        }
    });
}
