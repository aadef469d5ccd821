//! Child processes for command checkers and config-declared hooks.
//!
//! Output is drained on reader threads while the child runs so a chatty
//! program cannot deadlock on a full pipe; only the first
//! `output_limit_bytes` of each stream are kept.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Output cap used when a caller has no opinion.
pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessLimits {
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub output_limit_bytes: usize,
}

impl Default for ProcessLimits {
    fn default() -> Self {
        Self {
            timeout: None,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Bytes dropped across both streams.
    pub truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.success()
    }

    /// First non-blank line of stdout, falling back to stderr.
    pub fn first_line(&self) -> Option<String> {
        [&self.stdout, &self.stderr].into_iter().find_map(|stream| {
            String::from_utf8_lossy(stream)
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string)
        })
    }

    /// Human readable exit description, e.g. `exit code 2`.
    pub fn describe_exit(&self) -> String {
        if self.timed_out {
            return "timed out".to_string();
        }
        match self.status.code() {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Run `cmd` with stdin closed, capturing bounded stdout/stderr.
///
/// A child still running at the timeout is killed and reported with
/// `timed_out` set; that is not an `Err`.
#[instrument(skip_all, fields(program = ?cmd.get_program(), timeout_ms = limits.timeout.map(|t| t.as_millis() as u64)))]
pub fn run_command(mut cmd: Command, limits: ProcessLimits) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawn {}", cmd.get_program().to_string_lossy()))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;
    let limit = limits.output_limit_bytes;
    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, limit));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, limit));

    let mut timed_out = false;
    let status = match limits.timeout {
        Some(timeout) => match child.wait_timeout(timeout).context("wait for command")? {
            Some(status) => status,
            None => {
                warn!(timeout_ms = timeout.as_millis() as u64, "command timed out, killing");
                timed_out = true;
                child.kill().context("kill command")?;
                child.wait().context("wait command after kill")?
            }
        },
        None => child.wait().context("wait for command")?,
    };

    let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;
    let truncated = stdout_truncated + stderr_truncated;
    if truncated > 0 {
        debug!(truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        truncated,
        timed_out,
    })
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        let keep = n.min(remaining);
        buf.extend_from_slice(&chunk[..keep]);
        truncated += n - keep;
    }

    Ok((buf, truncated))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_first_line_and_exit() {
        let out = run_command(sh("echo; echo bad thing; exit 3"), ProcessLimits::default())
            .expect("run");
        assert!(!out.success());
        assert_eq!(out.first_line().as_deref(), Some("bad thing"));
        assert_eq!(out.describe_exit(), "exit code 3");
    }

    #[test]
    fn truncates_beyond_limit() {
        let limits = ProcessLimits {
            timeout: None,
            output_limit_bytes: 4,
        };
        let out = run_command(sh("printf 0123456789"), limits).expect("run");
        assert_eq!(out.stdout, b"0123");
        assert_eq!(out.truncated, 6);
    }

    #[test]
    fn kills_on_timeout() {
        let limits = ProcessLimits {
            timeout: Some(Duration::from_millis(50)),
            ..ProcessLimits::default()
        };
        let out = run_command(sh("exec sleep 5"), limits).expect("run");
        assert!(out.timed_out);
        assert!(!out.success());
    }

    #[test]
    fn missing_program_is_an_error() {
        let err = run_command(
            Command::new("checkrun-definitely-not-a-program"),
            ProcessLimits::default(),
        )
        .expect_err("spawn fails");
        assert!(err.to_string().contains("spawn"));
    }
}
