use skald_graph::AudioGraph;
use std::sync::Mutex;

/// The editing session's graph. Created empty at startup, lives until the
/// app exits.
#[derive(Default)]
pub struct EditorState(pub Mutex<AudioGraph>);

impl EditorState {
    pub fn with_graph<R>(&self, f: impl FnOnce(&mut AudioGraph) -> R) -> Result<R, String> {
        let mut graph = self
            .0
            .lock()
            .map_err(|_| "Editor graph lock poisoned".to_string())?;
        Ok(f(&mut graph))
    }
}
