//! Operating-system processes spawned through `tokio::process`.

use crate::process_supervision::{
    domain::{LaunchSpec, ProcessError},
    ports::{ManagedProcess, ProcessLauncher, ProcessResult},
};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Spawns real child processes.
///
/// Stdout and stderr are read by two background tasks that feed a single
/// channel, so reading output never blocks the caller. Children are killed
/// when their handle is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessLauncher;

impl TokioProcessLauncher {
    /// Creates a launcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessLauncher for TokioProcessLauncher {
    async fn launch(&self, spec: &LaunchSpec) -> ProcessResult<Box<dyn ManagedProcess>> {
        let mut command = Command::new(spec.program());
        command
            .args(spec.args())
            .envs(spec.env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|err| ProcessError::spawn(spec.command_line(), err))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, sender.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, sender));
        }

        Ok(Box::new(TokioManagedProcess {
            pid: child.id(),
            child,
            lines: receiver,
        }))
    }
}

async fn forward_lines<R>(reader: R, sender: UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer).await {
            Ok(0) => break,
            Ok(_) => {
                if buffer.last() == Some(&b'\n') {
                    buffer.pop();
                }
                if buffer.last() == Some(&b'\r') {
                    buffer.pop();
                }
                let line = String::from_utf8_lossy(&buffer).into_owned();
                if sender.send(line).is_err() {
                    break;
                }
            }
            Err(err) => {
                debug!(error = %err, "output stream closed with error");
                break;
            }
        }
    }
}

struct TokioManagedProcess {
    pid: Option<u32>,
    child: Child,
    lines: UnboundedReceiver<String>,
}

#[async_trait]
impl ManagedProcess for TokioManagedProcess {
    fn id(&self) -> Option<u32> {
        self.pid
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn try_read_line(&mut self) -> Option<String> {
        self.lines.try_recv().ok()
    }

    async fn terminate(&mut self) -> ProcessResult<()> {
        graceful_stop(&mut self.child, self.pid)
    }

    async fn kill(&mut self) -> ProcessResult<()> {
        self.child
            .start_kill()
            .map_err(|err| ProcessError::signal(self.pid.unwrap_or_default(), err))
    }

    async fn wait_for_exit(&mut self, timeout: Duration) -> bool {
        matches!(
            tokio::time::timeout(timeout, self.child.wait()).await,
            Ok(Ok(_))
        )
    }

    async fn collect_remaining_output(&mut self, timeout: Duration) -> Vec<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut remaining = Vec::new();
        while let Ok(Some(line)) = tokio::time::timeout_at(deadline, self.lines.recv()).await {
            remaining.push(line);
        }
        remaining
    }
}

#[cfg(unix)]
fn graceful_stop(child: &mut Child, pid: Option<u32>) -> ProcessResult<()> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    if !matches!(child.try_wait(), Ok(None)) {
        return Ok(());
    }
    let Some(pid) = pid else {
        return Ok(());
    };
    let raw = i32::try_from(pid).map_err(|err| ProcessError::signal(pid, err))?;
    kill(Pid::from_raw(raw), Signal::SIGTERM).map_err(|err| ProcessError::signal(pid, err))
}

#[cfg(not(unix))]
fn graceful_stop(child: &mut Child, pid: Option<u32>) -> ProcessResult<()> {
    child
        .start_kill()
        .map_err(|err| ProcessError::signal(pid.unwrap_or_default(), err))
}
