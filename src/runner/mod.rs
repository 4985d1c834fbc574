//! Templated subprocess execution.
//!
//! One call launches exactly one shell process and buffers its output until
//! it exits. There are no retries at this layer, and no timeout unless one is
//! configured: without it a hung command stalls its caller.

pub mod template;

pub use template::TemplateVars;

use crate::error::{WardenError, WardenResult};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

/// How long to keep draining pipes after the child exits. A command that
/// backgrounds a long-lived process (typical for restarts) leaves that
/// process holding the pipes open.
const OUTPUT_SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Lines of output kept by [`CommandOutput::summary`].
const MAX_SUMMARY_LINES: usize = 5;

/// Exit code reported for signal-terminated or killed children.
pub const EXIT_CODE_UNKNOWN: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    /// Short description for log lines: exit status plus the first lines of
    /// stderr (or stdout when stderr is empty).
    pub fn summary(&self) -> String {
        let status = if self.timed_out {
            "timed out".to_string()
        } else {
            format!("exit code {}", self.exit_code)
        };
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let excerpt = source
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(MAX_SUMMARY_LINES)
            .collect::<Vec<_>>()
            .join(" | ");
        if excerpt.is_empty() {
            status
        } else {
            format!("{status}: {excerpt}")
        }
    }
}

/// Something that can run a command template. The heartbeat talks to this
/// trait so tests can script command outcomes.
pub trait Execute: Send + Sync {
    fn execute(&self, template: &str, vars: &TemplateVars) -> WardenResult<CommandOutput>;
}

/// Runs templates through the platform shell.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    timeout: Option<Duration>,
    working_dir: Option<PathBuf>,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill commands that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Run an already-rendered command line.
    pub fn run(&self, command_line: &str) -> WardenResult<CommandOutput> {
        let mut command = shell_command(command_line);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| WardenError::SubprocessFailure {
                command: command_line.to_string(),
                reason: e.to_string(),
            })?;

        let stdout = OutputCollector::spawn(child.stdout.take());
        let stderr = OutputCollector::spawn(child.stderr.take());

        let (exit_code, timed_out) = wait_for_exit(&mut child, self.timeout).map_err(|e| {
            WardenError::SubprocessFailure {
                command: command_line.to_string(),
                reason: format!("wait failed: {e}"),
            }
        })?;

        Ok(CommandOutput {
            exit_code,
            stdout: stdout.finish(),
            stderr: stderr.finish(),
            timed_out,
        })
    }
}

impl Execute for CommandRunner {
    fn execute(&self, template: &str, vars: &TemplateVars) -> WardenResult<CommandOutput> {
        self.run(&vars.render(template))
    }
}

fn shell_command(command_line: &str) -> Command {
    if cfg!(target_family = "unix") {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command_line);
        c
    } else {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command_line);
        c
    }
}

fn wait_for_exit(child: &mut Child, timeout: Option<Duration>) -> std::io::Result<(i32, bool)> {
    let Some(timeout) = timeout else {
        let status = child.wait()?;
        return Ok((status.code().unwrap_or(EXIT_CODE_UNKNOWN), false));
    };

    match child.wait_timeout(timeout)? {
        Some(status) => Ok((status.code().unwrap_or(EXIT_CODE_UNKNOWN), false)),
        None => {
            let _ = child.kill();
            let _ = child.wait();
            Ok((EXIT_CODE_UNKNOWN, true))
        }
    }
}

/// Drains one pipe on a helper thread so the child never blocks on a full
/// pipe buffer while we wait for it.
struct OutputCollector {
    buffer: Arc<Mutex<Vec<u8>>>,
    done: mpsc::Receiver<()>,
}

impl OutputCollector {
    fn spawn<R: Read + Send + 'static>(stream: Option<R>) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let (tx, done) = mpsc::channel();

        match stream {
            Some(mut stream) => {
                let sink = Arc::clone(&buffer);
                thread::spawn(move || {
                    let mut chunk = [0u8; 8192];
                    loop {
                        match stream.read(&mut chunk) {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                if let Ok(mut buf) = sink.lock() {
                                    buf.extend_from_slice(&chunk[..n]);
                                }
                            }
                        }
                    }
                    let _ = tx.send(());
                });
            }
            None => {
                let _ = tx.send(());
            }
        }

        Self { buffer, done }
    }

    fn finish(self) -> String {
        let _ = self.done.recv_timeout(OUTPUT_SETTLE_TIMEOUT);
        let bytes = match self.buffer.lock() {
            Ok(buf) => buf.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
