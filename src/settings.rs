use serde::{Deserialize, Serialize};
use skald_graph::config::{self, CODEGEN_PATH_ENV};
use skald_graph::{BridgeConfig, GeneratorCommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tauri::{AppHandle, Manager, State};
use ts_rs::TS;

use crate::codegen_manager::CodegenManager;

const SETTINGS_FILE: &str = "settings.json";

#[derive(TS, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../ui/src/bindings/settings.ts")]
#[ts(rename_all = "camelCase")]
pub struct CodegenSettings {
    /// Overrides the bundled generator executable. Only read from the
    /// settings file; the webview cannot change it.
    #[serde(default)]
    pub generator_path: Option<String>,
    /// Seconds before a run is killed. Unset uses the default, 0 disables.
    #[serde(default)]
    #[ts(type = "number | null")]
    pub timeout_secs: Option<u64>,
}

/// The part of [`CodegenSettings`] the webview may change.
#[derive(TS, Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export, export_to = "../ui/src/bindings/settings.ts")]
#[ts(rename_all = "camelCase")]
pub struct CodegenSettingsUpdate {
    #[serde(default)]
    #[ts(type = "number | null")]
    pub timeout_secs: Option<u64>,
}

impl CodegenSettings {
    fn with_update(mut self, update: CodegenSettingsUpdate) -> Self {
        self.timeout_secs = update.timeout_secs;
        self
    }
}

#[tauri::command]
pub fn get_codegen_settings(app: AppHandle) -> Result<CodegenSettings, String> {
    load_settings(&app)
}

#[tauri::command]
pub fn set_codegen_settings(
    app: AppHandle,
    codegen: State<'_, CodegenManager>,
    update: CodegenSettingsUpdate,
) -> Result<(), String> {
    let path = settings_path(&app)?;
    let settings = load_settings_from(&path).with_update(update);
    save_settings_to(&path, &settings)?;
    codegen.reconfigure(bridge_config(&app, &settings))
}

fn settings_path(app: &AppHandle) -> Result<PathBuf, String> {
    let config_dir = app
        .path()
        .app_config_dir()
        .map_err(|e| format!("Failed to locate config dir: {}", e))?;
    Ok(config_dir.join(SETTINGS_FILE))
}

pub fn load_settings(app: &AppHandle) -> Result<CodegenSettings, String> {
    Ok(load_settings_from(&settings_path(app)?))
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings_from(path: &Path) -> CodegenSettings {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return CodegenSettings::default(),
        Err(e) => {
            log::warn!("[settings] cannot read {}: {}", path.display(), e);
            return CodegenSettings::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        log::warn!(
            "[settings] ignoring malformed {}: {}",
            path.display(),
            e
        );
        CodegenSettings::default()
    })
}

pub fn save_settings_to(path: &Path, settings: &CodegenSettings) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config dir {}: {}", parent.display(), e))?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to encode settings: {}", e))?;
    fs::write(path, json).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

/// Directories that may hold the bundled generator, most specific first.
fn generator_search_dirs(app: &AppHandle) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    // Production: Tauri resource directory
    if let Ok(resource_dir) = app.path().resource_dir() {
        dirs.push(resource_dir);
    }

    // Development: next to the running binary (target/debug)
    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs
}

pub fn bridge_config(app: &AppHandle, settings: &CodegenSettings) -> BridgeConfig {
    bridge_config_from(
        std::env::var_os(CODEGEN_PATH_ENV).map(PathBuf::from),
        settings,
        &generator_search_dirs(app),
    )
}

fn bridge_config_from(
    env_override: Option<PathBuf>,
    settings: &CodegenSettings,
    search_dirs: &[PathBuf],
) -> BridgeConfig {
    let program = config::resolve_generator_path(
        [env_override, settings.generator_path.as_ref().map(PathBuf::from)],
        search_dirs,
    );
    BridgeConfig::new(GeneratorCommand::new(program))
        .with_timeout(config::timeout_from_secs(settings.timeout_secs))
}
