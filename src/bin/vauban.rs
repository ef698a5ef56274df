//! Command-line front end for Vauban.
//!
//! Usage:
//!
//! ```text
//! vauban ports get <instance>
//! vauban ports tool <instance> <tool>
//! vauban ports release <instance>
//! vauban ports list
//! vauban instances
//! vauban templates
//! vauban deploy <template> (--instance <instance> | --all) [--port <port>]
//! vauban configure <instance> <server> [--command <cmd>] [--port <port>] [-- <args>...]
//! vauban status <instance>
//! vauban supervise <instance> [--interval-ms <ms>]
//! ```
//!
//! `supervise` starts the auto-start servers of an instance, moves their
//! output into the log once per interval, and stops them on Ctrl-C.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use mockable::DefaultClock;
use std::fmt::Display;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use vauban::config::{HOME_ENV, ManagerPaths, SANDBOX_BASE_ENV};
use vauban::instance::{InstanceName, InstanceNameError};
use vauban::logging::{LogConfig, LogFormat, init_logging};
use vauban::port_allocation::{
    adapters::{JsonFilePortRegistry, TcpConnectProbe},
    services::PortAllocator,
};
use vauban::process_supervision::{
    adapters::{TokioProcessLauncher, TracingObserver},
    domain::{BatchOutcome, SupervisorError},
    services::ProcessSupervisor,
};
use vauban::server_config::{
    adapters::FileInstanceRegistry, domain::ServerLaunchConfig, ports::InstanceRegistry,
};
use vauban::templates::{self, ServerTemplate};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

type Allocator = PortAllocator<JsonFilePortRegistry, TcpConnectProbe>;
type Supervisor =
    ProcessSupervisor<FileInstanceRegistry, TokioProcessLauncher, Allocator, DefaultClock>;

/// Port allocation and helper-server supervision for sandboxed instances.
#[derive(Parser)]
#[command(name = "vauban")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Options available to every command.
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Manager home holding the port and instance registries
    #[arg(long, global = true, env = HOME_ENV)]
    cmgr_home: Option<Utf8PathBuf>,

    /// Directory holding one sandbox per instance
    #[arg(long, global = true, env = SANDBOX_BASE_ENV)]
    sandbox_base: Option<Utf8PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Human)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect and change port allocations
    #[command(subcommand)]
    Ports(PortsCommand),

    /// List registered instances
    Instances,

    /// List built-in server templates
    Templates,

    /// Deploy a template into instance configurations
    Deploy(DeployArgs),

    /// Write a server entry with a forced `--port`
    Configure(ConfigureArgs),

    /// Show configured servers of an instance
    Status {
        /// Instance name
        #[arg(value_parser = parse_instance)]
        instance: InstanceName,
    },

    /// Run the auto-start servers of an instance until interrupted
    Supervise {
        /// Instance name
        #[arg(value_parser = parse_instance)]
        instance: InstanceName,

        /// Milliseconds between output drains
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

#[derive(Subcommand)]
enum PortsCommand {
    /// Print the base port of an instance, allocating one if needed
    Get {
        /// Instance name
        #[arg(value_parser = parse_instance)]
        instance: InstanceName,
    },

    /// Print the port reserved for a tool inside an instance's range
    Tool {
        /// Instance name
        #[arg(value_parser = parse_instance)]
        instance: InstanceName,
        /// Tool identifier
        tool: String,
    },

    /// Release the range of an instance
    Release {
        /// Instance name
        #[arg(value_parser = parse_instance)]
        instance: InstanceName,
    },

    /// List every allocation
    List,
}

#[derive(Args)]
struct DeployArgs {
    /// Template display name or server name
    template: String,

    /// Target instance
    #[arg(long, value_parser = parse_instance, required_unless_present = "all", conflicts_with = "all")]
    instance: Option<InstanceName>,

    /// Deploy to every registered instance
    #[arg(long)]
    all: bool,

    /// Port to render into the entry instead of the tool port
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args)]
struct ConfigureArgs {
    /// Instance name
    #[arg(value_parser = parse_instance)]
    instance: InstanceName,

    /// Server name
    server: String,

    /// Executable to launch
    #[arg(long, default_value = "npx")]
    command: String,

    /// Listening port; zero or absent selects the tool port
    #[arg(long)]
    port: Option<u16>,

    /// Start the server together with the instance
    #[arg(long)]
    auto_start: bool,

    /// Environment additions as KEY=VALUE
    #[arg(long = "env", value_parser = parse_env_pair)]
    env: Vec<(String, String)>,

    /// Arguments passed to the executable
    #[arg(last = true)]
    args: Vec<String>,
}

fn parse_instance(value: &str) -> Result<InstanceName, InstanceNameError> {
    InstanceName::new(value)
}

fn parse_env_pair(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(key, val)| (key.to_owned(), val.to_owned()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{value}'"))
}

struct App {
    paths: ManagerPaths,
    allocator: Arc<Allocator>,
    registry: Arc<FileInstanceRegistry>,
    supervisor: Supervisor,
}

impl App {
    fn new(global: &GlobalOpts) -> Result<Self, BoxError> {
        let mut paths = ManagerPaths::from_env()?;
        if let Some(home) = &global.cmgr_home {
            paths = paths.with_home(home.clone());
        }
        if let Some(sandbox_base) = &global.sandbox_base {
            paths = paths.with_sandbox_base(sandbox_base.clone());
        }
        Ok(Self::from_paths(paths))
    }

    fn from_paths(paths: ManagerPaths) -> Self {
        let allocator = Arc::new(PortAllocator::new(
            Arc::new(JsonFilePortRegistry::for_paths(&paths)),
            Arc::new(TcpConnectProbe::new()),
        ));
        let registry = Arc::new(FileInstanceRegistry::new(paths.clone()));
        let supervisor = ProcessSupervisor::new(
            Arc::clone(&registry),
            Arc::new(TokioProcessLauncher::new()),
            Arc::clone(&allocator),
            Arc::new(DefaultClock),
        )
        .with_observer(Arc::new(TracingObserver));

        Self {
            paths,
            allocator,
            registry,
            supervisor,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    init_logging(&LogConfig::default().with_format(cli.global.log_format))?;
    let app = App::new(&cli.global)?;

    match cli.command {
        Command::Ports(command) => run_ports(&app, command).await,
        Command::Instances => run_instances(&app),
        Command::Templates => run_templates(),
        Command::Deploy(args) => run_deploy(&app, args).await,
        Command::Configure(args) => run_configure(&app, args).await,
        Command::Status { instance } => run_status(&app, &instance).await,
        Command::Supervise {
            instance,
            interval_ms,
        } => run_supervise(&app, &instance, Duration::from_millis(interval_ms)).await,
    }
}

fn print_line(line: impl Display) -> io::Result<()> {
    writeln!(io::stdout().lock(), "{line}")
}

async fn run_ports(app: &App, command: PortsCommand) -> Result<(), BoxError> {
    match command {
        PortsCommand::Get { instance } => {
            print_line(app.allocator.get_base_port(&instance).await?)?;
        }
        PortsCommand::Tool { instance, tool } => {
            print_line(app.allocator.get_tool_port(&instance, &tool).await?)?;
        }
        PortsCommand::Release { instance } => {
            if app.allocator.release_port_range(&instance) {
                print_line(format_args!("released {instance}"))?;
            } else {
                print_line(format_args!("{instance} has no allocation"))?;
            }
        }
        PortsCommand::List => {
            for (instance, base) in app.allocator.allocations().iter() {
                print_line(format_args!("{instance}\t{base}"))?;
            }
        }
    }
    Ok(())
}

fn run_instances(app: &App) -> Result<(), BoxError> {
    let mut out = io::stdout().lock();
    for instance in app.registry.list_instances()? {
        writeln!(
            out,
            "{instance}\t{}",
            app.paths.instance_config_path(&instance)
        )?;
    }
    Ok(())
}

fn run_templates() -> Result<(), BoxError> {
    let mut out = io::stdout().lock();
    for template in templates::builtin_templates() {
        let auto_start = if template.auto_start() { "auto" } else { "manual" };
        writeln!(
            out,
            "{}\t{}\t{auto_start}\t{} {}",
            template.name(),
            template.server_name(),
            template.command(),
            template.args().join(" ")
        )?;
    }
    Ok(())
}

fn find_template(name: &str) -> Result<ServerTemplate, BoxError> {
    templates::find_by_name(name)
        .or_else(|| templates::find_by_server_name(name))
        .ok_or_else(|| format!("unknown template '{name}'").into())
}

async fn run_deploy(app: &App, args: DeployArgs) -> Result<(), BoxError> {
    let template = find_template(&args.template)?;
    let targets = match args.instance {
        Some(instance) => vec![instance],
        None => app.registry.list_instances()?,
    };

    let mut failures = 0_usize;
    for instance in targets {
        match deploy_one(app, &template, &instance, args.port).await {
            Ok(port) => print_line(format_args!(
                "deployed {} to {instance} on port {port}",
                template.name()
            ))?,
            Err(err) => {
                warn!(instance = %instance, error = %err, "deploy failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} deployment(s) failed").into());
    }
    Ok(())
}

async fn deploy_one(
    app: &App,
    template: &ServerTemplate,
    instance: &InstanceName,
    requested_port: Option<u16>,
) -> Result<u16, SupervisorError> {
    let port = match requested_port {
        Some(port) => port,
        None => {
            app.allocator
                .get_tool_port(instance, template.server_name())
                .await?
        }
    };
    app.supervisor.deploy_template(instance, template, port)?;
    Ok(port)
}

async fn run_configure(app: &App, args: ConfigureArgs) -> Result<(), BoxError> {
    let mut config = ServerLaunchConfig::new(args.command)
        .with_args(args.args)
        .with_auto_start(args.auto_start);
    for (key, value) in args.env {
        config = config.with_env(key, value);
    }

    let port = app
        .supervisor
        .configure_server(&args.instance, &args.server, config, args.port)
        .await?;
    print_line(format_args!(
        "configured {} on {} with port {port}",
        args.server, args.instance
    ))?;
    Ok(())
}

async fn run_status(app: &App, instance: &InstanceName) -> Result<(), BoxError> {
    let statuses = app.supervisor.server_statuses(instance).await?;
    let mut out = io::stdout().lock();
    for status in statuses {
        let state = if status.running { "running" } else { "stopped" };
        let auto_start = if status.auto_start { "auto" } else { "manual" };
        writeln!(
            out,
            "{}\t{state}\t{}\t{auto_start}",
            status.name, status.port
        )?;
    }
    Ok(())
}

async fn run_supervise(
    app: &App,
    instance: &InstanceName,
    interval: Duration,
) -> Result<(), BoxError> {
    let started = app.supervisor.start_all(instance).await?;
    report_batch("start", instance, &started);

    let mut ticker = tokio::time::interval(interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(err) = result {
                    warn!(error = %err, "failed to wait for Ctrl-C, shutting down");
                }
                break;
            }
            _ = ticker.tick() => {
                app.supervisor.drain_output();
                // Reaps exited servers so their exit reaches the observer.
                app.supervisor.list_running(instance);
            }
        }
    }

    info!(instance = %instance, "stopping servers");
    let stopped = app.supervisor.stop_all(instance).await;
    report_batch("stop", instance, &stopped);
    if stopped.is_success() {
        Ok(())
    } else {
        Err(format!("{} server(s) failed to stop", stopped.failed.len()).into())
    }
}

fn report_batch(action: &str, instance: &InstanceName, outcome: &BatchOutcome) {
    for server in &outcome.succeeded {
        info!(instance = %instance, server = %server, action, "succeeded");
    }
    for (server, err) in &outcome.failed {
        warn!(instance = %instance, server = %server, action, error = %err, "failed");
    }
}
