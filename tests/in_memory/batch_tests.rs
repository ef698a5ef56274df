//! In-memory integration tests for instance-wide supervisor operations.

use rstest::rstest;
use vauban::process_supervision::domain::SupervisorError;
use vauban::server_config::domain::ServerLaunchConfig;

use super::helpers::{Harness, harness, instance, npx_server};

fn auto(config: ServerLaunchConfig) -> ServerLaunchConfig {
    config.with_auto_start(true)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_all_launches_only_auto_start_servers(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(
        &alpha,
        &[
            ("filesystem", auto(npx_server("fs", "9110"))),
            ("memory", npx_server("mem", "9130")),
            ("sequential-thinking", auto(npx_server("seq", "9120"))),
        ],
    );

    let outcome = harness
        .supervisor
        .start_all(&alpha)
        .await
        .expect("start_all should succeed");

    assert!(outcome.is_success());
    assert_eq!(outcome.succeeded, vec!["filesystem", "sequential-thinking"]);
    assert_eq!(
        harness.supervisor.list_running(&alpha),
        vec!["filesystem", "sequential-thinking"]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_all_continues_past_failures(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(
        &alpha,
        &[
            ("broken", auto(ServerLaunchConfig::new("missing-binary"))),
            ("filesystem", auto(npx_server("fs", "9110"))),
        ],
    );
    harness.launcher.fail_program("missing-binary");

    let outcome = harness
        .supervisor
        .start_all(&alpha)
        .await
        .expect("start_all should succeed");

    assert!(!outcome.is_success());
    assert_eq!(outcome.succeeded, vec!["filesystem"]);
    let (failed_server, error) = outcome.failed.first().expect("one failure expected");
    assert_eq!(failed_server, "broken");
    assert!(matches!(error, SupervisorError::Launch { .. }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_all_without_document_fails(harness: Harness) {
    let result = harness.supervisor.start_all(&instance("alpha")).await;

    assert!(matches!(result, Err(SupervisorError::NoConfiguration(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stop_all_only_touches_target_instance(harness: Harness) {
    let alpha = instance("alpha");
    let beta = instance("beta");
    harness.configure(
        &alpha,
        &[
            ("filesystem", auto(npx_server("fs", "9110"))),
            ("memory", auto(npx_server("mem", "9130"))),
        ],
    );
    harness.configure(&beta, &[("filesystem", auto(npx_server("fs", "9210")))]);
    for target in [&alpha, &beta] {
        harness
            .supervisor
            .start_all(target)
            .await
            .expect("start_all should succeed");
    }

    let outcome = harness.supervisor.stop_all(&alpha).await;

    assert_eq!(outcome.succeeded, vec!["filesystem", "memory"]);
    assert!(harness.supervisor.list_running(&alpha).is_empty());
    assert_eq!(harness.supervisor.list_running(&beta), vec!["filesystem"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn shutdown_stops_every_instance(harness: Harness) {
    let alpha = instance("alpha");
    let beta = instance("beta");
    harness.configure(&alpha, &[("memory", auto(npx_server("mem", "9130")))]);
    harness.configure(&beta, &[("memory", auto(npx_server("mem", "9230")))]);
    for target in [&alpha, &beta] {
        harness
            .supervisor
            .start_all(target)
            .await
            .expect("start_all should succeed");
    }

    let outcome = harness.supervisor.shutdown().await;

    assert!(outcome.is_success());
    assert_eq!(outcome.succeeded, vec!["alpha/memory", "beta/memory"]);
    assert!(harness.supervisor.list_running(&alpha).is_empty());
    assert!(harness.supervisor.list_running(&beta).is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn statuses_report_every_configured_server(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(
        &alpha,
        &[
            ("filesystem", auto(npx_server("fs", "9111"))),
            ("memory", ServerLaunchConfig::default().with_args(["-y", "mem"])),
        ],
    );
    harness
        .supervisor
        .start(&alpha, "filesystem")
        .await
        .expect("start should succeed");
    let pid = harness.handle(&alpha, "filesystem").pid();

    let statuses = harness
        .supervisor
        .server_statuses(&alpha)
        .await
        .expect("statuses should load");

    let [filesystem, memory] = statuses.as_slice() else {
        panic!("two status rows expected, got {statuses:?}");
    };
    assert_eq!(filesystem.name, "filesystem");
    assert!(filesystem.running);
    assert_eq!(filesystem.port, 9111);
    assert!(filesystem.auto_start);
    assert_eq!(filesystem.pid, Some(pid));
    assert!(filesystem.started_at.is_some());

    assert_eq!(memory.name, "memory");
    assert!(!memory.running);
    assert_eq!(memory.port, 9130);
    assert!(!memory.auto_start);
    assert_eq!(memory.pid, None);
    assert_eq!(memory.started_at, None);
}
