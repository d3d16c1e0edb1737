use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides every other generator location.
pub const CODEGEN_PATH_ENV: &str = "SKALD_CODEGEN_PATH";

#[cfg(windows)]
pub const GENERATOR_BINARY: &str = "skald_codegen.exe";
#[cfg(not(windows))]
pub const GENERATOR_BINARY: &str = "skald_codegen";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How to start the external generator. Production runs the binary with no
/// arguments; `args` exists for wrappers and test stubs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl GeneratorCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn display(&self) -> String {
        self.program.display().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub command: GeneratorCommand,
    /// `None` waits for the generator indefinitely.
    pub timeout: Option<Duration>,
}

impl BridgeConfig {
    pub fn new(command: GeneratorCommand) -> Self {
        Self {
            command,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Timeout from a settings value in seconds; 0 disables it.
pub fn timeout_from_secs(secs: Option<u64>) -> Option<Duration> {
    match secs {
        None => Some(DEFAULT_TIMEOUT),
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
    }
}

/// Picks the generator executable: the first explicit override wins, then the
/// first search directory that contains [`GENERATOR_BINARY`]. Falls back to the
/// bare binary name so the OS search path gets a chance.
pub fn resolve_generator_path<I>(overrides: I, search_dirs: &[PathBuf]) -> PathBuf
where
    I: IntoIterator<Item = Option<PathBuf>>,
{
    if let Some(path) = overrides
        .into_iter()
        .flatten()
        .find(|path| !path.as_os_str().is_empty())
    {
        return path;
    }

    search_dirs
        .iter()
        .map(|dir| dir.join(GENERATOR_BINARY))
        .find(|candidate| is_file(candidate))
        .unwrap_or_else(|| PathBuf::from(GENERATOR_BINARY))
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|meta| meta.is_file()).unwrap_or(false)
}
