//! Subprocess execution for the external tools (`yolo`, `ffmpeg`, `ffprobe`).
//!
//! Invocations are plain values so they can be built and inspected without
//! spawning anything; a [`ProcessRunner`] turns them into processes.

use crate::domain::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

const ERROR_EXCERPT_LIMIT: usize = 400;
/// Trailing stderr lines kept for a failure message. ffmpeg prints the cause
/// a few lines before its final `Conversion failed!`.
const ERROR_TAIL_LINES: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Value following `flag`, e.g. `value_of("-vf")`.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[async_trait]
pub trait ProcessRunner {
    /// Runs to completion, relaying output to the log. Non-zero exit is an error.
    async fn run(&self, invocation: &ToolInvocation) -> Result<()>;

    /// Runs to completion and returns stdout. Non-zero exit is an error.
    async fn capture(&self, invocation: &ToolInvocation) -> Result<String>;
}

pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(invocation: &ToolInvocation) -> TokioCommand {
        let mut cmd = TokioCommand::new(&invocation.program);
        cmd.args(&invocation.args).stdin(Stdio::null());
        cmd
    }
}

impl Default for SystemProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_error(program: &str, err: std::io::Error) -> AppError {
    if err.kind() == ErrorKind::NotFound {
        AppError::NotFound(format!(
            "{} not found. Ensure it is in PATH or configure its full path.",
            program
        ))
    } else {
        AppError::ExternalToolFailure(format!("Failed to spawn {}: {}", program, err))
    }
}

fn excerpt(line: &str) -> String {
    if line.chars().count() > ERROR_EXCERPT_LIMIT {
        let cut: String = line.chars().take(ERROR_EXCERPT_LIMIT).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}

/// The last [`ERROR_TAIL_LINES`] non-empty stderr lines of a child.
#[derive(Debug, Default)]
struct StderrTail {
    lines: VecDeque<String>,
}

impl StderrTail {
    fn push(&mut self, line: String) {
        if self.lines.len() == ERROR_TAIL_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(excerpt(&line));
    }

    fn render(&self) -> String {
        if self.lines.is_empty() {
            return "no error output".to_string();
        }
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<()> {
        info!(command = %invocation, "Running command");

        let mut child = Self::command(invocation)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(&invocation.program, e))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            AppError::Internal(format!("{} stdout unavailable", invocation.program))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            AppError::Internal(format!("{} stderr unavailable", invocation.program))
        })?;

        let tool = invocation.program.as_str();
        let relay_stdout = async {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(tool, "{}", line);
            }
        };
        let relay_stderr = async {
            let mut tail = StderrTail::default();
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                info!(tool, stream = "stderr", "{}", line);
                tail.push(line);
            }
            tail
        };

        let ((), tail) = tokio::join!(relay_stdout, relay_stderr);
        let status = child.wait().await?;

        if status.success() {
            return Ok(());
        }

        let detail = tail.render();
        warn!(tool, %status, "Command failed");
        Err(AppError::ExternalToolFailure(format!(
            "{} exited with {}: {}",
            invocation.program, status, detail
        )))
    }

    async fn capture(&self, invocation: &ToolInvocation) -> Result<String> {
        debug!(command = %invocation, "Capturing command output");

        let output = Self::command(invocation)
            .output()
            .await
            .map_err(|e| spawn_error(&invocation.program, e))?;

        if !output.status.success() {
            let mut tail = StderrTail::default();
            String::from_utf8_lossy(&output.stderr)
                .lines()
                .filter(|line| !line.trim().is_empty())
                .for_each(|line| tail.push(line.to_string()));
            return Err(AppError::ExternalToolFailure(format!(
                "{} exited with {}: {}",
                invocation.program,
                output.status,
                tail.render()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
