//! In-memory integration tests for the process supervisor lifecycle.

use rstest::rstest;
use vauban::port_allocation::{
    domain::{BasePort, PortRegistryDocument},
    ports::PortRegistryStore,
};
use vauban::process_supervision::{
    adapters::memory::ObservedEvent,
    domain::{
        CLAUDE_INSTANCE_ENV, LOG_CAPACITY, MCP_PORT_ENV, MCP_SERVER_PORT_ENV, StartOutcome,
        StopOutcome, SupervisorError,
    },
};
use vauban::server_config::domain::ServerLaunchConfig;

use super::helpers::{Harness, harness, instance, key, npx_server};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_without_document_fails(harness: Harness) {
    let result = harness.supervisor.start(&instance("alpha"), "memory").await;

    assert!(matches!(result, Err(SupervisorError::NoConfiguration(_))));
    assert!(harness.launcher.launches().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_unconfigured_server_tracks_nothing(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(&alpha, &[]);

    let result = harness.supervisor.start(&alpha, "memory").await;

    assert!(matches!(result, Err(SupervisorError::NotConfigured(ref k)) if *k == key("alpha", "memory")));
    assert!(!harness.supervisor.is_running(&alpha, "memory"));
    assert!(harness.supervisor.list_running(&alpha).is_empty());
}

#[rstest]
#[case("9555", 9555)]
#[case("0", 0)]
#[case("not-a-port", 0)]
#[tokio::test(flavor = "multi_thread")]
async fn port_argument_drives_child_environment(
    harness: Harness,
    #[case] port_value: &str,
    #[case] expected: u16,
) {
    let alpha = instance("alpha");
    harness.configure(&alpha, &[("memory", npx_server("pkg", port_value))]);

    let outcome = harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("start should succeed");

    assert!(matches!(outcome, StartOutcome::Started { port, .. } if port == expected));
    let launches = harness.launcher.launches();
    let spec = launches.first().expect("one launch expected");
    let expected_text = expected.to_string();
    assert_eq!(spec.env().get(MCP_PORT_ENV), Some(&expected_text));
    assert_eq!(spec.env().get(MCP_SERVER_PORT_ENV), Some(&expected_text));
    assert_eq!(
        spec.env().get(CLAUDE_INSTANCE_ENV).map(String::as_str),
        Some("alpha")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_port_argument_launches_on_port_zero(harness: Harness) {
    let alpha = instance("alpha");
    let config = ServerLaunchConfig::default()
        .with_args(["-y", "@modelcontextprotocol/memory"])
        .with_env("HOME", "/home/claude");
    harness.configure(&alpha, &[("memory", config)]);

    harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("start should succeed");

    let launches = harness.launcher.launches();
    let spec = launches.first().expect("one launch expected");
    assert_eq!(spec.port(), 0);
    assert_eq!(spec.env().get(MCP_PORT_ENV).map(String::as_str), Some("0"));
    assert_eq!(spec.command_line(), "npx -y @modelcontextprotocol/memory");
    assert_eq!(
        spec.env().get("HOME").map(String::as_str),
        Some("/home/claude")
    );
    let allocations = harness.ports.snapshot().expect("snapshot should succeed");
    assert!(allocations.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_does_not_need_a_port_range(harness: Harness) {
    let mut full = PortRegistryDocument::new();
    full.insert(&instance("last"), BasePort::new(65_500));
    harness.ports.save(&full).expect("seed should succeed");
    let alpha = instance("alpha");
    harness.configure(
        &alpha,
        &[("memory", ServerLaunchConfig::default().with_args(["-y", "mem"]))],
    );

    let outcome = harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("start should succeed");

    assert!(matches!(outcome, StartOutcome::Started { port: 0, .. }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn double_start_keeps_single_process(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(&alpha, &[("memory", npx_server("pkg", "9130"))]);

    let first = harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("first start should succeed");
    let second = harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("second start should succeed");

    let StartOutcome::Started { pid, .. } = first else {
        panic!("first start should launch a process");
    };
    assert_eq!(second, StartOutcome::AlreadyRunning { pid });
    assert_eq!(harness.launcher.launches().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn exited_process_is_relaunched(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(&alpha, &[("memory", npx_server("pkg", "9130"))]);
    harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("start should succeed");
    harness.handle(&alpha, "memory").exit();

    let outcome = harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("restart should succeed");

    assert!(matches!(outcome, StartOutcome::Started { .. }));
    assert_eq!(harness.launcher.launches().len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn launch_failure_is_reported_and_not_tracked(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(
        &alpha,
        &[("ghost", ServerLaunchConfig::new("missing-binary"))],
    );
    harness.launcher.fail_program("missing-binary");

    let result = harness.supervisor.start(&alpha, "ghost").await;

    assert!(matches!(result, Err(SupervisorError::Launch { .. })));
    assert!(!harness.supervisor.is_running(&alpha, "ghost"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_untracked_server_fails(harness: Harness) {
    let result = harness.supervisor.stop(&instance("alpha"), "memory").await;

    assert!(matches!(result, Err(SupervisorError::NotTracked(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn graceful_stop_terminates_and_notifies(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(&alpha, &[("memory", npx_server("pkg", "9130"))]);
    harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("start should succeed");

    let outcome = harness
        .supervisor
        .stop(&alpha, "memory")
        .await
        .expect("stop should succeed");

    assert_eq!(outcome, StopOutcome::Terminated);
    assert!(!harness.supervisor.is_running(&alpha, "memory"));
    let handle = harness.handle(&alpha, "memory");
    assert_eq!(handle.terminate_requests(), 1);
    assert_eq!(handle.kill_requests(), 0);
    assert_eq!(
        harness.observer.events(),
        vec![
            ObservedEvent::Started(key("alpha", "memory")),
            ObservedEvent::Stopped(key("alpha", "memory")),
        ]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stubborn_process_is_killed(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(&alpha, &[("memory", npx_server("pkg", "9130"))]);
    harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("start should succeed");
    harness.handle(&alpha, "memory").ignore_terminate();

    let outcome = harness
        .supervisor
        .stop(&alpha, "memory")
        .await
        .expect("stop should succeed");

    assert_eq!(outcome, StopOutcome::Killed);
    assert_eq!(harness.handle(&alpha, "memory").kill_requests(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unkillable_process_stays_tracked_for_retry(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(&alpha, &[("memory", npx_server("pkg", "9130"))]);
    harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("start should succeed");
    let handle = harness.handle(&alpha, "memory");
    handle.ignore_terminate();
    handle.ignore_kill();

    let first = harness.supervisor.stop(&alpha, "memory").await;

    assert!(matches!(first, Err(SupervisorError::StillRunning(_))));
    assert!(harness.supervisor.is_running(&alpha, "memory"));

    handle.exit();
    let retry = harness
        .supervisor
        .stop(&alpha, "memory")
        .await
        .expect("retry should succeed");
    assert_eq!(retry, StopOutcome::AlreadyExited);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn signal_failure_keeps_process_tracked(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(&alpha, &[("memory", npx_server("pkg", "9130"))]);
    harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("start should succeed");
    harness.handle(&alpha, "memory").reject_signals();

    let result = harness.supervisor.stop(&alpha, "memory").await;

    assert!(matches!(result, Err(SupervisorError::Terminate { .. })));
    assert!(harness.supervisor.is_running(&alpha, "memory"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn output_is_captured_in_order_and_survives_stop(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(&alpha, &[("memory", npx_server("pkg", "9130"))]);
    harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("start should succeed");
    let handle = harness.handle(&alpha, "memory");
    handle.emit("booting");
    handle.emit("");
    handle.emit("ready");

    assert_eq!(harness.supervisor.drain_output(), 3);
    handle.emit("shutting down");
    harness
        .supervisor
        .stop(&alpha, "memory")
        .await
        .expect("stop should succeed");

    assert_eq!(
        harness.supervisor.get_log(&alpha, "memory"),
        vec!["booting", "", "ready", "shutting down"]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restart_resets_log(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(&alpha, &[("memory", npx_server("pkg", "9130"))]);
    harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("start should succeed");
    harness.handle(&alpha, "memory").emit("first run");
    harness.supervisor.drain_output();
    harness
        .supervisor
        .stop(&alpha, "memory")
        .await
        .expect("stop should succeed");

    harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("restart should succeed");

    assert!(harness.supervisor.get_log(&alpha, "memory").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn log_keeps_only_latest_lines(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(&alpha, &[("memory", npx_server("pkg", "9130"))]);
    harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("start should succeed");
    let handle = harness.handle(&alpha, "memory");
    for index in 0..(LOG_CAPACITY + 5) {
        handle.emit(format!("line {index}"));
    }

    harness.supervisor.drain_output();

    let log = harness.supervisor.get_log(&alpha, "memory");
    assert_eq!(log.len(), LOG_CAPACITY);
    assert_eq!(log.first().map(String::as_str), Some("line 5"));
    assert_eq!(
        log.last().map(String::as_str),
        Some(format!("line {}", LOG_CAPACITY + 4).as_str())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn drain_reports_each_line_to_observers(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(&alpha, &[("memory", npx_server("pkg", "9130"))]);
    harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("start should succeed");
    harness.handle(&alpha, "memory").emit("hello");

    harness.supervisor.drain_output();

    assert!(
        harness
            .observer
            .events()
            .contains(&ObservedEvent::Output(key("alpha", "memory"), "hello".to_owned()))
    );
    assert_eq!(harness.supervisor.drain_output(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn liveness_check_reaps_exited_process_and_keeps_log(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(&alpha, &[("memory", npx_server("pkg", "9130"))]);
    harness
        .supervisor
        .start(&alpha, "memory")
        .await
        .expect("start should succeed");
    let handle = harness.handle(&alpha, "memory");
    handle.emit("last words");
    handle.exit();

    assert!(!harness.supervisor.is_running(&alpha, "memory"));

    assert_eq!(
        harness.supervisor.get_log(&alpha, "memory"),
        vec!["last words"]
    );
    assert!(
        harness
            .observer
            .events()
            .contains(&ObservedEvent::Stopped(key("alpha", "memory")))
    );
    let result = harness.supervisor.stop(&alpha, "memory").await;
    assert!(matches!(result, Err(SupervisorError::NotTracked(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_running_is_scoped_to_instance(harness: Harness) {
    let alpha = instance("alpha");
    let beta = instance("beta");
    harness.configure(
        &alpha,
        &[
            ("memory", npx_server("pkg", "9130")),
            ("repl", npx_server("pkg", "9150")),
        ],
    );
    harness.configure(&beta, &[("memory", npx_server("pkg", "9230"))]);
    for (target, server) in [(&alpha, "memory"), (&alpha, "repl"), (&beta, "memory")] {
        harness
            .supervisor
            .start(target, server)
            .await
            .expect("start should succeed");
    }
    harness.handle(&alpha, "repl").exit();

    assert_eq!(harness.supervisor.list_running(&alpha), vec!["memory"]);
    assert_eq!(harness.supervisor.list_running(&beta), vec!["memory"]);
}
