//! In-memory integration tests for writing server configuration.

use rstest::rstest;
use serde_json::json;
use vauban::server_config::{
    domain::{BASELINE_PRELOAD_SCRIPT, PortArgument, ServerLaunchConfig},
    ports::InstanceRegistry,
};
use vauban::templates::find_by_name;

use super::helpers::{Harness, harness, instance};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deploy_creates_baseline_document(harness: Harness) {
    let alpha = instance("alpha");
    let template = find_by_name("Filesystem").expect("builtin template should exist");

    harness
        .supervisor
        .deploy_template(&alpha, &template, 9110)
        .expect("deploy should succeed");

    let document = harness
        .registry
        .load_server_config(&alpha)
        .expect("load should succeed")
        .expect("document should exist");
    assert_eq!(document.passthrough("showTray"), Some(&json!(true)));
    assert_eq!(
        document.passthrough("electronInitScript"),
        Some(&json!(BASELINE_PRELOAD_SCRIPT))
    );
    let entry = document
        .server(template.server_name())
        .expect("server entry should exist");
    assert_eq!(entry.port_argument(), PortArgument::Present(9110));
    assert!(entry.auto_start());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deploy_keeps_other_servers(harness: Harness) {
    let alpha = instance("alpha");
    harness.configure(
        &alpha,
        &[("custom", ServerLaunchConfig::new("python3").with_args(["server.py"]))],
    );
    let template = find_by_name("Memory").expect("builtin template should exist");

    harness
        .supervisor
        .deploy_template(&alpha, &template, 9130)
        .expect("deploy should succeed");

    let document = harness
        .registry
        .load_server_config(&alpha)
        .expect("load should succeed")
        .expect("document should exist");
    assert_eq!(
        document.server("custom").map(ServerLaunchConfig::command),
        Some("python3")
    );
    assert!(document.server(template.server_name()).is_some());
}

#[rstest]
#[case(Some(9444), 9444)]
#[case(Some(0), 9130)]
#[case(None, 9130)]
#[tokio::test(flavor = "multi_thread")]
async fn configure_server_forces_port_argument(
    harness: Harness,
    #[case] requested: Option<u16>,
    #[case] expected: u16,
) {
    let alpha = instance("alpha");
    let config = ServerLaunchConfig::default().with_args(["-y", "mem"]);

    let port = harness
        .supervisor
        .configure_server(&alpha, "memory", config, requested)
        .await
        .expect("configure should succeed");

    assert_eq!(port, expected);
    let document = harness
        .registry
        .load_server_config(&alpha)
        .expect("load should succeed")
        .expect("document should exist");
    let entry = document.server("memory").expect("server entry should exist");
    assert_eq!(entry.port_argument(), PortArgument::Present(expected));
    assert_eq!(entry.args().first().map(String::as_str), Some("-y"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn configured_server_starts_on_written_port(harness: Harness) {
    let alpha = instance("alpha");
    harness
        .supervisor
        .configure_server(
            &alpha,
            "weather",
            ServerLaunchConfig::new("weather-mcp"),
            None,
        )
        .await
        .expect("configure should succeed");

    harness
        .supervisor
        .start(&alpha, "weather")
        .await
        .expect("start should succeed");

    let launches = harness.launcher.launches();
    let spec = launches.first().expect("one launch expected");
    assert_eq!(spec.port(), 9190);
    assert_eq!(spec.command_line(), "weather-mcp --port 9190");
}
