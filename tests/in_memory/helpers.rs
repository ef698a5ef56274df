//! Shared fixtures for in-memory supervisor tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use vauban::instance::InstanceName;
use vauban::port_allocation::{
    adapters::memory::{InMemoryPortRegistry, StaticPortProbe},
    services::PortAllocator,
};
use vauban::process_supervision::{
    adapters::memory::{InMemoryProcessHandle, InMemoryProcessLauncher, RecordingObserver},
    domain::ServerKey,
    services::ProcessSupervisor,
};
use vauban::server_config::{
    adapters::memory::InMemoryInstanceRegistry,
    domain::{ServerConfigDocument, ServerLaunchConfig},
    ports::InstanceRegistry,
};

pub type TestAllocator = PortAllocator<InMemoryPortRegistry, StaticPortProbe>;

pub type TestSupervisor = ProcessSupervisor<
    InMemoryInstanceRegistry,
    InMemoryProcessLauncher,
    TestAllocator,
    DefaultClock,
>;

pub struct Harness {
    pub registry: Arc<InMemoryInstanceRegistry>,
    pub launcher: Arc<InMemoryProcessLauncher>,
    pub ports: InMemoryPortRegistry,
    pub observer: RecordingObserver,
    pub supervisor: TestSupervisor,
}

impl Harness {
    pub fn new() -> Self {
        let registry = Arc::new(InMemoryInstanceRegistry::new());
        let launcher = Arc::new(InMemoryProcessLauncher::new());
        let ports = InMemoryPortRegistry::new();
        let allocator = Arc::new(PortAllocator::new(
            Arc::new(ports.clone()),
            Arc::new(StaticPortProbe::new()),
        ));
        let observer = RecordingObserver::new();
        let supervisor = ProcessSupervisor::new(
            registry.clone(),
            launcher.clone(),
            allocator,
            Arc::new(DefaultClock),
        )
        .with_observer(Arc::new(observer.clone()));

        Self {
            registry,
            launcher,
            ports,
            observer,
            supervisor,
        }
    }

    /// Stores a baseline document holding `servers` for `instance`.
    pub fn configure(&self, instance: &InstanceName, servers: &[(&str, ServerLaunchConfig)]) {
        let mut document = ServerConfigDocument::with_baseline_defaults();
        for (name, config) in servers {
            document.upsert_server(*name, config.clone());
        }
        self.registry
            .save_server_config(instance, &document)
            .expect("document should be stored");
    }

    pub fn handle(&self, instance: &InstanceName, server: &str) -> InMemoryProcessHandle {
        self.launcher
            .handle(&ServerKey::new(instance.clone(), server))
            .expect("a process should have been launched")
    }
}

#[fixture]
pub fn harness() -> Harness {
    Harness::new()
}

pub fn instance(name: &str) -> InstanceName {
    InstanceName::new(name).expect("valid instance name")
}

pub fn key(instance_name: &str, server: &str) -> ServerKey {
    ServerKey::new(instance(instance_name), server)
}

/// An `npx` entry with `--port <port>` arguments.
pub fn npx_server(package: &str, port: &str) -> ServerLaunchConfig {
    ServerLaunchConfig::default().with_args(["-y", package, "--port", port])
}
