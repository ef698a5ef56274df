//! In-memory process adapters for supervisor tests.
//!
//! [`InMemoryProcessLauncher`] models process lifecycles without spawning
//! anything. Each launch yields an [`InMemoryProcessHandle`] through which a
//! test can emit output, make the process exit, or make it ignore
//! termination requests.

use crate::process_supervision::{
    domain::{LaunchSpec, ProcessError, ServerKey},
    ports::{ManagedProcess, ProcessLauncher, ProcessResult, SupervisorObserver},
};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct SimulatedProcess {
    pending: VecDeque<String>,
    alive: bool,
    ignores_terminate: bool,
    ignores_kill: bool,
    rejects_signals: bool,
    terminate_requests: usize,
    kill_requests: usize,
}

impl Default for SimulatedProcess {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            alive: true,
            ignores_terminate: false,
            ignores_kill: false,
            rejects_signals: false,
            terminate_requests: 0,
            kill_requests: 0,
        }
    }
}

/// Test-side control over one simulated process.
#[derive(Debug, Clone)]
pub struct InMemoryProcessHandle {
    pid: u32,
    state: Arc<Mutex<SimulatedProcess>>,
}

impl InMemoryProcessHandle {
    /// Returns the simulated process identifier.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Queues one output line.
    pub fn emit(&self, line: impl Into<String>) {
        guard(&self.state).pending.push_back(line.into());
    }

    /// Makes the process exit on its own.
    pub fn exit(&self) {
        guard(&self.state).alive = false;
    }

    /// Makes the process ignore graceful termination.
    pub fn ignore_terminate(&self) {
        guard(&self.state).ignores_terminate = true;
    }

    /// Makes the process survive forced kills too.
    pub fn ignore_kill(&self) {
        guard(&self.state).ignores_kill = true;
    }

    /// Makes every signal delivery fail.
    pub fn reject_signals(&self) {
        guard(&self.state).rejects_signals = true;
    }

    /// Returns whether the process is still running.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        guard(&self.state).alive
    }

    /// Returns how many graceful termination requests arrived.
    #[must_use]
    pub fn terminate_requests(&self) -> usize {
        guard(&self.state).terminate_requests
    }

    /// Returns how many kill requests arrived.
    #[must_use]
    pub fn kill_requests(&self) -> usize {
        guard(&self.state).kill_requests
    }
}

#[derive(Debug, Default)]
struct LauncherState {
    next_pid: u32,
    launches: Vec<LaunchSpec>,
    failing_programs: BTreeSet<String>,
    handles: BTreeMap<ServerKey, InMemoryProcessHandle>,
}

/// Launcher producing simulated processes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProcessLauncher {
    state: Arc<Mutex<LauncherState>>,
}

impl InMemoryProcessLauncher {
    /// Creates a launcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every launch of `program` fail.
    pub fn fail_program(&self, program: impl Into<String>) {
        guard(&self.state).failing_programs.insert(program.into());
    }

    /// Returns every launch request received, in order.
    #[must_use]
    pub fn launches(&self) -> Vec<LaunchSpec> {
        guard(&self.state).launches.clone()
    }

    /// Returns the handle of the latest process launched for `key`.
    #[must_use]
    pub fn handle(&self, key: &ServerKey) -> Option<InMemoryProcessHandle> {
        guard(&self.state).handles.get(key).cloned()
    }
}

#[async_trait]
impl ProcessLauncher for InMemoryProcessLauncher {
    async fn launch(&self, spec: &LaunchSpec) -> ProcessResult<Box<dyn ManagedProcess>> {
        let mut state = guard(&self.state);
        state.launches.push(spec.clone());
        if state.failing_programs.contains(spec.program()) {
            return Err(ProcessError::spawn(
                spec.command_line(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
            ));
        }

        state.next_pid += 1;
        let handle = InMemoryProcessHandle {
            pid: 1000 + state.next_pid,
            state: Arc::new(Mutex::new(SimulatedProcess::default())),
        };
        state.handles.insert(spec.key().clone(), handle.clone());
        Ok(Box::new(InMemoryProcess { handle }))
    }
}

struct InMemoryProcess {
    handle: InMemoryProcessHandle,
}

impl InMemoryProcess {
    fn signal_error(&self) -> ProcessError {
        ProcessError::signal(
            self.handle.pid,
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "signal rejected"),
        )
    }
}

impl Drop for InMemoryProcess {
    fn drop(&mut self) {
        self.handle.exit();
    }
}

#[async_trait]
impl ManagedProcess for InMemoryProcess {
    fn id(&self) -> Option<u32> {
        Some(self.handle.pid)
    }

    fn is_alive(&mut self) -> bool {
        self.handle.is_alive()
    }

    fn try_read_line(&mut self) -> Option<String> {
        guard(&self.handle.state).pending.pop_front()
    }

    async fn terminate(&mut self) -> ProcessResult<()> {
        let mut state = guard(&self.handle.state);
        state.terminate_requests += 1;
        if state.rejects_signals {
            return Err(self.signal_error());
        }
        if !state.ignores_terminate {
            state.alive = false;
        }
        Ok(())
    }

    async fn kill(&mut self) -> ProcessResult<()> {
        let mut state = guard(&self.handle.state);
        state.kill_requests += 1;
        if state.rejects_signals {
            return Err(self.signal_error());
        }
        if !state.ignores_kill {
            state.alive = false;
        }
        Ok(())
    }

    async fn wait_for_exit(&mut self, _timeout: Duration) -> bool {
        !self.handle.is_alive()
    }

    async fn collect_remaining_output(&mut self, _timeout: Duration) -> Vec<String> {
        guard(&self.handle.state).pending.drain(..).collect()
    }
}

/// One event seen by a [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    /// A server started.
    Started(ServerKey),
    /// A server stopped or exited.
    Stopped(ServerKey),
    /// A server printed a line.
    Output(ServerKey, String),
}

/// Observer that records every event for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ObservedEvent>>>,
}

impl RecordingObserver {
    /// Creates an observer with no recorded events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<ObservedEvent> {
        guard(&self.events).clone()
    }
}

impl SupervisorObserver for RecordingObserver {
    fn server_started(&self, key: &ServerKey, _pid: Option<u32>) {
        guard(&self.events).push(ObservedEvent::Started(key.clone()));
    }

    fn server_stopped(&self, key: &ServerKey) {
        guard(&self.events).push(ObservedEvent::Stopped(key.clone()));
    }

    fn server_output(&self, key: &ServerKey, line: &str) {
        guard(&self.events).push(ObservedEvent::Output(key.clone(), line.to_owned()));
    }
}
