//! Post-generation process orchestration.
//!
//! Runs the dependency-install command to completion, then launches the dev server
//! and watches its output for the port it binds. The dev server keeps running after
//! [`ProcessOrchestrator::start`] returns; the caller owns it through [`DevServer`].

use crate::config::{CommandSpec, Config};
use crate::error::{Error, Result};
use crate::port::{LocalhostUrlProbe, PortProbe};
use log::{debug, warn};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Extra time to reap a server whose output streams closed right at the deadline.
const EXIT_GRACE: Duration = Duration::from_millis(500);

/// Lifecycle of one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Installing,
    InstallFailed,
    Installed,
    Starting,
    /// Start failed; installed artifacts are kept
    StartFailed,
    Running { port: u16 },
}

/// Outcome of one child-process run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessResult {
    /// `None` while the process is still running or when it was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Port announced in stdout, if any was seen
    pub port: Option<u16>,
}

impl ProcessResult {
    /// Stdout followed by stderr, for diagnostics.
    pub fn combined_output(&self) -> String {
        let mut output = self.stdout.clone();
        if !output.is_empty() && !output.ends_with('\n') && !self.stderr.is_empty() {
            output.push('\n');
        }
        output.push_str(&self.stderr);
        output
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// A running dev server. Dropping the handle leaves the process running.
#[derive(Debug)]
pub struct DevServer {
    child: Child,
    port: u16,
    result: ProcessResult,
}

impl DevServer {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Announced port, or the configured default when none was seen in time.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the port came from the server's own output.
    pub fn port_announced(&self) -> bool {
        self.result.port.is_some()
    }

    /// Output captured while waiting for the port announcement.
    pub fn result(&self) -> &ProcessResult {
        &self.result
    }

    /// Blocks until the dev server exits.
    pub fn wait(&mut self) -> Result<ExitStatus> {
        Ok(self.child.wait()?)
    }

    /// Terminates the dev server and reaps it.
    pub fn kill(&mut self) -> Result<()> {
        if self.child.try_wait()?.is_none() {
            self.child.kill()?;
        }
        self.child.wait()?;
        Ok(())
    }
}

fn describe_status(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Output of one stream, split into complete lines plus an unterminated tail.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Appends `chunk` and returns the lines it completed, without terminators.
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line);
            lines.push(line.trim_end_matches(['\r', '\n']).to_string());
        }
        lines
    }

    fn tail(&self) -> String {
        String::from_utf8_lossy(&self.pending).into_owned()
    }

    fn take_tail(&mut self) -> String {
        let tail = self.tail();
        self.pending.clear();
        tail
    }
}

/// Forwards raw chunks from `reader` to `tx` as soon as they are read. Once the
/// receiver is gone the chunks are written to the operator instead, so the child
/// never blocks on a full pipe.
fn spawn_reader<R: Read + Send + 'static>(
    mut reader: R,
    stream: Stream,
    tx: Sender<(Stream, Vec<u8>)>,
) {
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        let mut forwarding = true;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            };
            let chunk = buf[..n].to_vec();
            if forwarding && tx.send((stream, chunk.clone())).is_ok() {
                continue;
            }
            forwarding = false;
            let written = match stream {
                Stream::Stdout => {
                    io::stdout().write_all(&chunk).and_then(|_| io::stdout().flush())
                }
                Stream::Stderr => io::stderr().write_all(&chunk),
            };
            if written.is_err() {
                break;
            }
        }
    });
}

fn echo(stream: Stream, text: &str, newline: bool) {
    match (stream, newline) {
        (Stream::Stdout, true) => println!("{}", text),
        (Stream::Stderr, true) => eprintln!("{}", text),
        (Stream::Stdout, false) => {
            print!("{}", text);
            let _ = io::stdout().flush();
        }
        (Stream::Stderr, false) => eprint!("{}", text),
    }
}

/// Polls `child` until it exits or `deadline` passes.
fn wait_until(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }
}

/// Runs install, then start, in a generated project directory.
pub struct ProcessOrchestrator {
    project_root: PathBuf,
    install: CommandSpec,
    start: CommandSpec,
    port_timeout: Duration,
    default_port: u16,
    fail_on_stderr: bool,
    echo: bool,
    probe: Box<dyn PortProbe>,
    state: OrchestratorState,
}

impl ProcessOrchestrator {
    pub fn new<P: AsRef<Path>>(project_root: P, config: &Config) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            install: config.install.clone(),
            start: config.start.clone(),
            port_timeout: config.port_timeout,
            default_port: config.default_port,
            fail_on_stderr: config.fail_on_stderr,
            echo: true,
            probe: Box::new(LocalhostUrlProbe::new()),
            state: OrchestratorState::Idle,
        }
    }

    /// Replaces the port-discovery heuristic.
    pub fn with_probe(mut self, probe: Box<dyn PortProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Controls whether dev-server output seen while waiting is echoed to the operator.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    fn transition(&mut self, next: OrchestratorState) {
        debug!("Orchestrator: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn command(&self, spec: &CommandSpec) -> Command {
        let mut command = Command::new(spec.program());
        command.args(spec.args()).current_dir(&self.project_root).stdin(Stdio::null());
        command
    }

    /// Runs the install command and blocks until it exits.
    ///
    /// # Errors
    /// * `Error::SpawnError` if the command cannot be started
    /// * `Error::InstallError` on a nonzero exit, or on stderr output when
    ///   `fail_on_stderr` is set
    pub fn install(&mut self) -> Result<ProcessResult> {
        if self.state != OrchestratorState::Idle {
            return Err(Error::ConfigError(format!(
                "install cannot run in state {:?}",
                self.state
            )));
        }
        self.transition(OrchestratorState::Installing);
        println!("Running '{}' in {}", self.install, self.project_root.display());

        let output = match self.command(&self.install).output() {
            Ok(output) => output,
            Err(source) => {
                self.transition(OrchestratorState::InstallFailed);
                return Err(Error::SpawnError { command: self.install.to_string(), source });
            }
        };

        let result = ProcessResult {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            port: None,
        };

        let failure = if !output.status.success() {
            Some(describe_status(&output.status))
        } else if self.fail_on_stderr && !result.stderr.is_empty() {
            Some("wrote to stderr".to_string())
        } else {
            None
        };

        if let Some(code) = failure {
            self.transition(OrchestratorState::InstallFailed);
            return Err(Error::InstallError {
                command: self.install.to_string(),
                code,
                output: result.combined_output(),
            });
        }

        self.transition(OrchestratorState::Installed);
        Ok(result)
    }

    /// Launches the dev server and returns once its port is known.
    ///
    /// Stdout is watched until a line yields a port or the timeout elapses, in which
    /// case the default port is assumed. The process is not waited on.
    ///
    /// # Errors
    /// * `Error::StartError` if install has not succeeded, or the server exits before
    ///   announcing a port or before the timeout elapses
    /// * `Error::SpawnError` if the command cannot be started
    pub fn start(&mut self) -> Result<DevServer> {
        if self.state != OrchestratorState::Installed {
            return Err(Error::StartError {
                command: self.start.to_string(),
                reason: format!("install has not completed (state {:?})", self.state),
                output: String::new(),
            });
        }
        self.transition(OrchestratorState::Starting);
        println!("Running '{}' in {}", self.start, self.project_root.display());

        let mut child = match self
            .command(&self.start)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(source) => {
                self.transition(OrchestratorState::StartFailed);
                return Err(Error::SpawnError { command: self.start.to_string(), source });
            }
        };

        let (tx, rx) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, Stream::Stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, Stream::Stderr, tx);
        }

        let deadline = Instant::now() + self.port_timeout;
        let mut result = ProcessResult::default();
        let mut stdout_lines = LineBuffer::default();
        let mut stderr_lines = LineBuffer::default();
        let mut stderr_reported = false;
        let mut streams_closed = false;

        while result.port.is_none() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let (stream, chunk) = match rx.recv_timeout(remaining) {
                Ok(received) => received,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    streams_closed = true;
                    break;
                }
            };

            let (lines, captured) = match stream {
                Stream::Stdout => (stdout_lines.push(&chunk), &mut result.stdout),
                Stream::Stderr => (stderr_lines.push(&chunk), &mut result.stderr),
            };
            for line in &lines {
                captured.push_str(line);
                captured.push('\n');
                if self.echo {
                    echo(stream, line, true);
                }
            }

            match stream {
                Stream::Stdout => {
                    // The announcement may sit in an unterminated tail (no newline
                    // yet, or a `\r`-redrawn status line).
                    result.port = lines
                        .iter()
                        .find_map(|line| self.probe.probe(line))
                        .or_else(|| self.probe.probe(&stdout_lines.tail()));
                }
                Stream::Stderr if !stderr_reported => {
                    stderr_reported = true;
                    warn!("'{}' is writing to stderr while starting", self.start);
                }
                Stream::Stderr => {}
            }
        }

        let buffers = [(Stream::Stdout, &mut stdout_lines), (Stream::Stderr, &mut stderr_lines)];
        for (stream, buffer) in buffers {
            let tail = buffer.take_tail();
            if tail.is_empty() {
                continue;
            }
            match stream {
                Stream::Stdout => result.stdout.push_str(&tail),
                Stream::Stderr => result.stderr.push_str(&tail),
            }
            if self.echo {
                echo(stream, &tail, false);
            }
        }

        if result.port.is_none() {
            let exited = if streams_closed {
                wait_until(&mut child, deadline.max(Instant::now() + EXIT_GRACE))?
            } else {
                child.try_wait()?
            };
            if let Some(status) = exited {
                result.exit_code = status.code();
                self.transition(OrchestratorState::StartFailed);
                warn!("Dev server exited before it was ready: {}", describe_status(&status));
                return Err(Error::StartError {
                    command: self.start.to_string(),
                    reason: describe_status(&status),
                    output: result.combined_output(),
                });
            }
        }

        let port = match result.port {
            Some(port) => port,
            None => {
                debug!(
                    "No port announced within {:?}; assuming {}",
                    self.port_timeout, self.default_port
                );
                self.default_port
            }
        };
        self.transition(OrchestratorState::Running { port });

        Ok(DevServer { child, port, result })
    }

    /// Runs install and then start.
    pub fn run(&mut self) -> Result<(ProcessResult, DevServer)> {
        let install = self.install()?;
        let server = self.start()?;
        Ok((install, server))
    }
}
