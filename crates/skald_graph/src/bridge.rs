//! Request/response bridge to the external code generator.
//!
//! One request runs at a time. Each request walks
//! `Idle -> Spawning -> Running -> {Succeeded, Failed, TimedOut}`; a launch
//! failure goes straight from `Spawning` to `Failed`. The child is spawned with
//! kill-on-drop, so dropping an in-flight request also stops the process.

use std::io;
use std::process::{ExitStatus, Stdio};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tokio::sync::{watch, Mutex};
use ts_rs::TS;

use crate::config::BridgeConfig;
use crate::error::{CodegenError, GenerateError};
use crate::serializer::{parse_wire, WireGraph};

#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[ts(export, export_to = "../../../ui/src/bindings/graph.ts")]
pub enum CodegenState {
    Idle,
    Spawning,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

pub struct CodegenBridge {
    config: BridgeConfig,
    gate: Mutex<()>,
    state: watch::Sender<CodegenState>,
}

impl CodegenBridge {
    pub fn new(config: BridgeConfig) -> Self {
        let (state, _) = watch::channel(CodegenState::Idle);
        Self {
            config,
            gate: Mutex::new(()),
            state,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn state(&self) -> CodegenState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<CodegenState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: CodegenState) {
        debug!("[codegen] state -> {:?}", next);
        self.state.send_replace(next);
    }

    /// Sends `graph_json` to the generator and returns its stdout.
    ///
    /// Concurrent callers queue on an internal lock; each gets its own
    /// process and buffers. Dropping the returned future kills the child and
    /// leaves the bridge in `Failed`.
    pub async fn generate(&self, graph_json: &str) -> Result<String, CodegenError> {
        let _turn = self.gate.lock().await;
        let run = RunGuard::new(&self.state);
        let outcome = self.run(graph_json).await;
        run.settle(match &outcome {
            Ok(_) => CodegenState::Succeeded,
            Err(CodegenError::TimedOut(_)) => CodegenState::TimedOut,
            Err(_) => CodegenState::Failed,
        });
        outcome
    }

    async fn run(&self, graph_json: &str) -> Result<String, CodegenError> {
        self.set_state(CodegenState::Spawning);
        let command = &self.config.command;

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| {
            error!(
                "[codegen] failed to start {}: {}",
                command.display(),
                source
            );
            CodegenError::LaunchFailed {
                program: command.display(),
                source,
            }
        })?;
        self.set_state(CodegenState::Running);
        info!(
            "[codegen] started {} (pid {:?}) with {} byte graph",
            command.display(),
            child.id(),
            graph_json.len()
        );

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("generator stdin was not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("generator stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("generator stderr was not captured"))?;

        // Input is fed while both outputs drain so a generator that starts
        // writing before it has read the whole graph cannot stall on a full pipe.
        // The time limit also covers the exit, since a generator may close its
        // streams and keep running.
        let exchange = async {
            let ((), out, err) = tokio::try_join!(
                feed_stdin(stdin, graph_json.as_bytes()),
                read_all(stdout),
                read_all(stderr),
            )?;
            let status = child.wait().await?;
            Ok::<_, io::Error>((status, out, err))
        };

        let exchanged = match self.config.timeout {
            Some(limit) => {
                let waited = tokio::time::timeout(limit, exchange).await;
                match waited {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            "[codegen] {} exceeded {:?}, killing it",
                            command.display(),
                            limit
                        );
                        if let Err(err) = child.kill().await {
                            warn!("[codegen] failed to kill generator: {}", err);
                        }
                        return Err(CodegenError::TimedOut(limit));
                    }
                }
            }
            None => exchange.await,
        };

        let (status, stdout, stderr) = match exchanged {
            Ok(collected) => collected,
            Err(err) => {
                if let Err(kill_err) = child.kill().await {
                    debug!("[codegen] kill after I/O failure: {}", kill_err);
                }
                return Err(err.into());
            }
        };

        finish(status, stdout, stderr)
    }
}

/// Publishes the final state of one request. A request dropped before it
/// settles is reported as `Failed`; kill-on-drop has already stopped the child.
struct RunGuard<'a> {
    state: &'a watch::Sender<CodegenState>,
    settled: bool,
}

impl<'a> RunGuard<'a> {
    fn new(state: &'a watch::Sender<CodegenState>) -> Self {
        Self {
            state,
            settled: false,
        }
    }

    fn settle(mut self, next: CodegenState) {
        debug!("[codegen] state -> {:?}", next);
        self.state.send_replace(next);
        self.settled = true;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("[codegen] request abandoned before the generator finished");
            self.state.send_replace(CodegenState::Failed);
        }
    }
}

fn finish(status: ExitStatus, stdout: Vec<u8>, stderr: Vec<u8>) -> Result<String, CodegenError> {
    let diagnostics = String::from_utf8_lossy(&stderr).trim().to_string();

    if status.success() {
        if !diagnostics.is_empty() {
            debug!("[codegen] generator stderr: {}", diagnostics);
        }
        let source = String::from_utf8(stdout)?;
        info!("[codegen] generated {} bytes of source", source.len());
        return Ok(source);
    }

    let message = if diagnostics.is_empty() {
        match status.code() {
            Some(code) => format!("Codegen process exited with code {}", code),
            None => "Codegen process was terminated by a signal".to_string(),
        }
    } else {
        diagnostics
    };
    error!("[codegen] failed ({}): {}", status, message);
    Err(CodegenError::Failed {
        code: status.code(),
        message,
    })
}

async fn feed_stdin(mut stdin: ChildStdin, payload: &[u8]) -> io::Result<()> {
    match stdin.write_all(payload).await {
        Ok(()) => {}
        // The generator may exit without reading all of its input; its exit
        // status decides the outcome.
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!("[codegen] generator closed stdin early");
            return Ok(());
        }
        Err(err) => return Err(err),
    }
    // Closing stdin marks the end of the graph.
    drop(stdin);
    Ok(())
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

/// Serializes, checks the empty-graph precondition, and runs the generator.
pub async fn generate_code(
    bridge: &CodegenBridge,
    graph: &WireGraph,
) -> Result<String, GenerateError> {
    if graph.is_empty() {
        return Err(GenerateError::EmptyGraph);
    }
    let json = graph.to_json()?;
    Ok(bridge.generate(&json).await?)
}

/// Runs caller-supplied wire JSON. It must parse against the wire schema and
/// name at least one node; the original text is sent to the generator as is.
pub async fn invoke_codegen(
    bridge: &CodegenBridge,
    graph_json: &str,
) -> Result<String, GenerateError> {
    if parse_wire(graph_json)?.is_empty() {
        return Err(GenerateError::EmptyGraph);
    }
    Ok(bridge.generate(graph_json).await?)
}
