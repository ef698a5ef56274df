//! Supervisor for instance helper servers.

use crate::instance::InstanceName;
use crate::process_supervision::{
    domain::{
        BatchOutcome, CapturedLog, LaunchSpec, ServerKey, ServerStatus, StartOutcome,
        StopOutcome, SupervisorError, SupervisorResult,
    },
    ports::{ManagedProcess, ProcessLauncher, SupervisorObserver, ToolPortSource},
};
use crate::server_config::{
    domain::{ServerConfigDocument, ServerLaunchConfig},
    ports::InstanceRegistry,
};
use crate::templates::ServerTemplate;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bounds on how long `stop` waits at each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTimeouts {
    /// Wait after the graceful request.
    pub graceful: Duration,
    /// Wait after the forced kill.
    pub forced: Duration,
    /// Wait for output still in flight once the process has exited.
    pub output_flush: Duration,
}

impl Default for StopTimeouts {
    fn default() -> Self {
        Self {
            graceful: Duration::from_secs(3),
            forced: Duration::from_secs(1),
            output_flush: Duration::from_millis(250),
        }
    }
}

struct TrackedProcess {
    process: Box<dyn ManagedProcess>,
    started_at: DateTime<Utc>,
}

#[derive(Default)]
struct ProcessTable {
    running: BTreeMap<ServerKey, TrackedProcess>,
    logs: BTreeMap<ServerKey, CapturedLog>,
}

impl ProcessTable {
    fn append(&mut self, key: &ServerKey, lines: &[String]) {
        let log = self.logs.entry(key.clone()).or_default();
        for line in lines {
            log.push(line.clone());
        }
    }
}

enum Event {
    Started(ServerKey, Option<u32>),
    Stopped(ServerKey),
    Output(ServerKey, String),
}

/// Launches, tracks and stops the helper servers of every instance.
///
/// The process table sits behind a mutex that is never held across an
/// await. Observers are notified after the table is released.
pub struct ProcessSupervisor<R, L, T, C>
where
    R: InstanceRegistry,
    L: ProcessLauncher,
    T: ToolPortSource,
    C: Clock + Send + Sync,
{
    registry: Arc<R>,
    launcher: Arc<L>,
    tool_ports: Arc<T>,
    clock: Arc<C>,
    observers: Vec<Arc<dyn SupervisorObserver>>,
    timeouts: StopTimeouts,
    table: Mutex<ProcessTable>,
}

impl<R, L, T, C> ProcessSupervisor<R, L, T, C>
where
    R: InstanceRegistry,
    L: ProcessLauncher,
    T: ToolPortSource,
    C: Clock + Send + Sync,
{
    /// Creates a supervisor with no tracked processes and no observers.
    #[must_use]
    pub fn new(registry: Arc<R>, launcher: Arc<L>, tool_ports: Arc<T>, clock: Arc<C>) -> Self {
        Self {
            registry,
            launcher,
            tool_ports,
            clock,
            observers: Vec::new(),
            timeouts: StopTimeouts::default(),
            table: Mutex::new(ProcessTable::default()),
        }
    }

    /// Adds an observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SupervisorObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Replaces the stop timeouts.
    #[must_use]
    pub const fn with_stop_timeouts(mut self, timeouts: StopTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Starts `server` of `instance`.
    ///
    /// A live tracked process is left alone. Otherwise the port is taken
    /// from the `--port` argument, and is zero when the argument or its
    /// value is missing or malformed. No port range is allocated here. The
    /// captured log is reset on success.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::NoConfiguration`] or
    /// [`SupervisorError::NotConfigured`] when there is nothing to launch,
    /// [`SupervisorError::Launch`] when spawning fails, and registry errors
    /// from the lookup.
    pub async fn start(
        &self,
        instance: &InstanceName,
        server: &str,
    ) -> SupervisorResult<StartOutcome> {
        let key = ServerKey::new(instance.clone(), server);
        if let Some(pid) = self.live_pid(&key) {
            debug!(instance = %instance, server, "server already running");
            return Ok(StartOutcome::AlreadyRunning { pid });
        }

        let document = self.load_document(instance)?;
        let config = document
            .server(server)
            .ok_or_else(|| SupervisorError::NotConfigured(key.clone()))?;
        let port = config.port_argument().declared().unwrap_or_default();
        let spec = LaunchSpec::resolve(key.clone(), config, port);

        let process = match self.launcher.launch(&spec).await {
            Ok(process) => process,
            Err(source) => {
                warn!(instance = %instance, server, error = %source, "failed to launch server");
                return Err(SupervisorError::Launch { key, source });
            }
        };

        let pid = process.id();
        {
            let mut table = self.table();
            table.logs.insert(key.clone(), CapturedLog::new());
            table.running.insert(
                key.clone(),
                TrackedProcess {
                    process,
                    started_at: self.clock.utc(),
                },
            );
        }
        info!(
            instance = %instance,
            server,
            pid,
            port,
            command = %spec.command_line(),
            "started server"
        );
        self.notify(vec![Event::Started(key, pid)]);
        Ok(StartOutcome::Started { pid, port })
    }

    /// Stops `server` of `instance`.
    ///
    /// Sends a graceful request, then a forced kill, each bounded by
    /// [`StopTimeouts`]. Output still in flight is appended to the captured
    /// log, which stays readable after the stop.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::NotTracked`] when no process is tracked,
    /// and [`SupervisorError::Terminate`] or [`SupervisorError::StillRunning`]
    /// when the process could not be stopped. In the latter cases the process
    /// stays tracked so the stop can be retried.
    pub async fn stop(
        &self,
        instance: &InstanceName,
        server: &str,
    ) -> SupervisorResult<StopOutcome> {
        let key = ServerKey::new(instance.clone(), server);
        let Some(mut tracked) = self.table().running.remove(&key) else {
            return Err(SupervisorError::NotTracked(key));
        };

        let outcome = if tracked.process.is_alive() {
            match self.terminate(&key, tracked.process.as_mut()).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(instance = %instance, server, error = %err, "failed to stop server");
                    self.table().running.insert(key, tracked);
                    return Err(err);
                }
            }
        } else {
            StopOutcome::AlreadyExited
        };

        let mut remaining = Vec::new();
        while let Some(line) = tracked.process.try_read_line() {
            remaining.push(line);
        }
        remaining.extend(
            tracked
                .process
                .collect_remaining_output(self.timeouts.output_flush)
                .await,
        );
        drop(tracked);

        self.table().append(&key, &remaining);
        info!(instance = %instance, server, outcome = ?outcome, "stopped server");
        let mut events: Vec<Event> = remaining
            .into_iter()
            .map(|line| Event::Output(key.clone(), line))
            .collect();
        events.push(Event::Stopped(key));
        self.notify(events);
        Ok(outcome)
    }

    /// Starts every server of `instance` flagged `autoStart`.
    ///
    /// Failures are recorded and the remaining servers are still started.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::NoConfiguration`] when the instance has no
    /// configuration document.
    pub async fn start_all(&self, instance: &InstanceName) -> SupervisorResult<BatchOutcome> {
        let document = self.load_document(instance)?;
        let mut outcome = BatchOutcome::default();
        for server in document.auto_start_servers() {
            let result = self.start(instance, &server).await;
            if let Err(err) = &result {
                warn!(instance = %instance, server = %server, error = %err, "auto-start failed");
            }
            outcome.record(server, result);
        }
        Ok(outcome)
    }

    /// Stops every tracked server of `instance`, continuing past failures.
    pub async fn stop_all(&self, instance: &InstanceName) -> BatchOutcome {
        let keys = self.tracked_keys(|key| key.instance() == instance);
        let mut outcome = BatchOutcome::default();
        for key in keys {
            let result = self.stop(key.instance(), key.server()).await;
            outcome.record(key.server().to_owned(), result);
        }
        outcome
    }

    /// Stops every tracked server of every instance.
    pub async fn shutdown(&self) -> BatchOutcome {
        let keys = self.tracked_keys(|_| true);
        let mut outcome = BatchOutcome::default();
        for key in keys {
            let result = self.stop(key.instance(), key.server()).await;
            outcome.record(key.to_string(), result);
        }
        outcome
    }

    /// Returns whether a live process is tracked for the server.
    ///
    /// An exited process found here is dropped from tracking; its log is
    /// kept.
    pub fn is_running(&self, instance: &InstanceName, server: &str) -> bool {
        let key = ServerKey::new(instance.clone(), server);
        !self.live_keys(|candidate| *candidate == key).is_empty()
    }

    /// Returns the names of live servers of `instance`.
    ///
    /// Exited processes found here are dropped from tracking; their logs are
    /// kept.
    pub fn list_running(&self, instance: &InstanceName) -> Vec<String> {
        self.live_keys(|key| key.instance() == instance)
            .into_iter()
            .map(|key| key.server().to_owned())
            .collect()
    }

    /// Returns the captured output of the server, oldest line first.
    #[must_use]
    pub fn get_log(&self, instance: &InstanceName, server: &str) -> Vec<String> {
        let key = ServerKey::new(instance.clone(), server);
        self.table()
            .logs
            .get(&key)
            .map(CapturedLog::lines)
            .unwrap_or_default()
    }

    /// Moves every output line that is ready into the captured logs without
    /// waiting, and returns how many lines were read.
    pub fn drain_output(&self) -> usize {
        let mut events = Vec::new();
        {
            let mut table = self.table();
            let ProcessTable { running, logs } = &mut *table;
            for (key, tracked) in running.iter_mut() {
                while let Some(line) = tracked.process.try_read_line() {
                    logs.entry(key.clone()).or_default().push(line.clone());
                    events.push(Event::Output(key.clone(), line));
                }
            }
        }
        let drained = events.len();
        if drained > 0 {
            debug!(lines = drained, "drained server output");
        }
        self.notify(events);
        drained
    }

    /// Writes the entry of `template`, rendered for `port`, into the
    /// configuration of `instance`.
    ///
    /// A missing document is created with baseline defaults.
    ///
    /// # Errors
    ///
    /// Returns template or registry errors.
    pub fn deploy_template(
        &self,
        instance: &InstanceName,
        template: &ServerTemplate,
        port: u16,
    ) -> SupervisorResult<()> {
        let config = template.render_config(port)?;
        self.update_document(instance, |document| {
            document.upsert_server(template.server_name(), config);
        })?;
        info!(
            instance = %instance,
            server = template.server_name(),
            port,
            "deployed template"
        );
        Ok(())
    }

    /// Writes `config` as the entry for `server`, forcing a usable `--port`.
    ///
    /// A missing or zero `requested_port` is replaced by the tool port of
    /// the server. Returns the port written.
    ///
    /// # Errors
    ///
    /// Returns port or registry errors.
    pub async fn configure_server(
        &self,
        instance: &InstanceName,
        server: &str,
        mut config: ServerLaunchConfig,
        requested_port: Option<u16>,
    ) -> SupervisorResult<u16> {
        let port = match requested_port.filter(|port| *port > 0) {
            Some(port) => port,
            None => self.tool_ports.tool_port(instance, server).await?,
        };
        config.force_port(port);
        self.update_document(instance, |document| {
            document.upsert_server(server, config);
        })?;
        info!(instance = %instance, server, port, "configured server");
        Ok(port)
    }

    /// Returns one status row per configured server of `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::NoConfiguration`] when the instance has no
    /// configuration document, or port and registry errors.
    pub async fn server_statuses(
        &self,
        instance: &InstanceName,
    ) -> SupervisorResult<Vec<ServerStatus>> {
        let document = self.load_document(instance)?;
        let live: BTreeSet<String> = self.list_running(instance).into_iter().collect();

        let mut statuses = Vec::new();
        for (name, config) in document.servers() {
            let port = match config.port_argument().declared() {
                Some(port) => port,
                None => self.tool_ports.tool_port(instance, name).await?,
            };
            let details = if live.contains(name) {
                self.process_details(&ServerKey::new(instance.clone(), name))
            } else {
                None
            };
            statuses.push(ServerStatus {
                name: name.to_owned(),
                running: details.is_some(),
                port,
                auto_start: config.auto_start(),
                pid: details.and_then(|(pid, _)| pid),
                started_at: details.map(|(_, started_at)| started_at),
            });
        }
        Ok(statuses)
    }

    async fn terminate(
        &self,
        key: &ServerKey,
        process: &mut dyn ManagedProcess,
    ) -> SupervisorResult<StopOutcome> {
        let to_error = |source| SupervisorError::Terminate {
            key: key.clone(),
            source,
        };

        process.terminate().await.map_err(to_error)?;
        if process.wait_for_exit(self.timeouts.graceful).await {
            return Ok(StopOutcome::Terminated);
        }

        warn!(
            instance = %key.instance(),
            server = key.server(),
            "server ignored termination request, killing"
        );
        process.kill().await.map_err(to_error)?;
        if process.wait_for_exit(self.timeouts.forced).await {
            return Ok(StopOutcome::Killed);
        }
        Err(SupervisorError::StillRunning(key.clone()))
    }

    fn load_document(&self, instance: &InstanceName) -> SupervisorResult<ServerConfigDocument> {
        self.registry
            .load_server_config(instance)?
            .ok_or_else(|| SupervisorError::NoConfiguration(instance.clone()))
    }

    fn update_document(
        &self,
        instance: &InstanceName,
        update: impl FnOnce(&mut ServerConfigDocument),
    ) -> SupervisorResult<()> {
        let _lease = self.registry.lock_server_config(instance)?;
        let mut document = self
            .registry
            .load_server_config(instance)?
            .unwrap_or_else(ServerConfigDocument::with_baseline_defaults);
        update(&mut document);
        self.registry.save_server_config(instance, &document)?;
        Ok(())
    }

    fn live_pid(&self, key: &ServerKey) -> Option<Option<u32>> {
        if self.live_keys(|candidate| candidate == key).is_empty() {
            return None;
        }
        self.process_details(key).map(|(pid, _)| pid)
    }

    fn process_details(&self, key: &ServerKey) -> Option<(Option<u32>, DateTime<Utc>)> {
        self.table()
            .running
            .get(key)
            .map(|tracked| (tracked.process.id(), tracked.started_at))
    }

    fn tracked_keys(&self, selects: impl Fn(&ServerKey) -> bool) -> Vec<ServerKey> {
        self.table()
            .running
            .keys()
            .filter(|key| selects(key))
            .cloned()
            .collect()
    }

    fn live_keys(&self, selects: impl Fn(&ServerKey) -> bool) -> Vec<ServerKey> {
        let mut events = Vec::new();
        let mut alive = Vec::new();
        {
            let mut table = self.table();
            let ProcessTable { running, logs } = &mut *table;
            let mut exited = Vec::new();
            for (key, tracked) in running.iter_mut() {
                if !selects(key) {
                    continue;
                }
                if tracked.process.is_alive() {
                    alive.push(key.clone());
                } else {
                    exited.push(key.clone());
                }
            }

            for key in exited {
                let Some(mut tracked) = running.remove(&key) else {
                    continue;
                };
                let log = logs.entry(key.clone()).or_default();
                while let Some(line) = tracked.process.try_read_line() {
                    log.push(line.clone());
                    events.push(Event::Output(key.clone(), line));
                }
                info!(instance = %key.instance(), server = key.server(), "server exited");
                events.push(Event::Stopped(key));
            }
        }
        self.notify(events);
        alive
    }

    fn table(&self) -> MutexGuard<'_, ProcessTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, events: Vec<Event>) {
        for event in events {
            for observer in &self.observers {
                match &event {
                    Event::Started(key, pid) => observer.server_started(key, *pid),
                    Event::Stopped(key) => observer.server_stopped(key),
                    Event::Output(key, line) => observer.server_output(key, line),
                }
            }
        }
    }
}
