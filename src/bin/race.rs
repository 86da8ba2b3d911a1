//! `race` - runs or validates a graph configuration file.
//!
//! `race <config-file>` brings the graph up and hands control to a stdin
//! menu (`pause`, `resume`, `exit`); `race --check <config-file>` only
//! parses and validates. See `config::load_graph_config` for the file
//! format and `classes` for the built-in actor types a config can select.

#[path = "race/classes.rs"]
mod classes;

use std::collections::HashMap;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use race_runtime::config::{self, GraphConfig};
use race_runtime::message::UserPayload;
use race_runtime::util::NodeId;
use race_runtime::{Clock, Master, RemoteBridge};

#[derive(Parser, Debug)]
#[command(name = "race", about = "Runtime for Airspace Concept Evaluation")]
struct Cli {
    /// Graph configuration file to load.
    config_file: PathBuf,

    /// Parse and validate the configuration, then exit without running it.
    #[arg(long)]
    check: bool,

    /// Config substitution for a `${key}` reference in the file, e.g.
    /// `-Dport=9000`. May be repeated.
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_substitution)]
    define: Vec<(String, String)>,

    /// Override the clock's base instant.
    #[arg(long)]
    start_time: Option<DateTime<Utc>>,

    /// Override the clock's time scale.
    #[arg(long)]
    time_scale: Option<f64>,

    /// Minimum log level.
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Override the config file's remote listen port.
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

fn parse_substitution(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(cli.log_level.as_filter())).init();

    let substitutions: HashMap<String, String> = cli.define.iter().cloned().collect();
    let graph = match config::load_graph_config(&cli.config_file, &substitutions) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(1);
        }
    };

    if cli.check {
        return ExitCode::SUCCESS;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("startup failure: could not start async runtime: {e}");
            return ExitCode::from(2);
        }
    };

    runtime.block_on(run(graph, &cli))
}

async fn run(graph: GraphConfig, cli: &Cli) -> ExitCode {
    let base_instant = cli.start_time.unwrap_or_else(Utc::now);
    let scale = cli.time_scale.unwrap_or(1.0);
    let clock = Clock::new(base_instant, scale);
    let master = Master::<UserPayload>::new(clock, Duration::from_secs(10));

    for actor in graph.actors.iter().filter(|a| !a.is_remote()) {
        if let Err(e) = classes::spawn(&master, actor) {
            eprintln!("startup failure: {e}");
            master.terminate_all().await;
            return ExitCode::from(2);
        }
    }

    if let Err(e) = master.initialize_all().await {
        eprintln!("startup failure: {e}");
        master.terminate_all().await;
        return ExitCode::from(2);
    }
    if let Err(e) = master.start_all().await {
        eprintln!("startup failure: {e}");
        master.terminate_all().await;
        return ExitCode::from(2);
    }

    let port = cli.port.or(graph.port);
    if let Err(e) = start_remote_bridge(&master, port).await {
        eprintln!("startup failure: {e}");
        master.terminate_all().await;
        return ExitCode::from(2);
    }

    run_console(&master).await;
    master.terminate_all().await;
    ExitCode::SUCCESS
}

/// Binds the listen port (if any) and wires an accept loop into a
/// [`RemoteBridge`] over the graph's bus. Runs for the lifetime of the
/// process; disconnects are logged rather than propagated, matching the
/// spec's "release subscriptions, tell callers" policy for `RemoteUnreachable`.
async fn start_remote_bridge(master: &Master<UserPayload>, port: Option<u16>) -> Result<(), race_runtime::RaceError> {
    let Some(port) = port else {
        return Ok(());
    };

    let (bridge, mut disconnects) = RemoteBridge::new(NodeId::new(), master.bus().clone(), "user_payload");
    let bridge = Arc::new(bridge);

    let listener = TcpListener::bind(("0.0.0.0", port)).await.map_err(|e| race_runtime::RaceError::ConfigurationError {
        reason: format!("failed to bind remote listen port {port}: {e}"),
    })?;

    let accept_bridge = Arc::clone(&bridge);
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let bridge = Arc::clone(&accept_bridge);
                    tokio::spawn(async move {
                        if let Err(e) = bridge.accept(stream, |_credentials| true).await {
                            tracing::warn!(peer = %peer_addr, error = %e, "rejected inbound remote connection");
                        }
                    });
                }
                Err(e) => tracing::warn!(error = %e, "remote listener accept failed"),
            }
        }
    });

    tokio::spawn(async move {
        while let Some((peer, reason)) = disconnects.recv().await {
            tracing::warn!(peer = %peer, error = %reason, "remote peer disconnected");
        }
    });

    Ok(())
}

async fn run_console(master: &Master<UserPayload>) {
    println!("race running; commands: pause, resume, exit");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        match line.trim() {
            "pause" => {
                master.pause_all().await;
                println!("paused");
            }
            "resume" => {
                master.resume_all().await;
                println!("resumed");
            }
            "exit" => break,
            "" => {}
            other => println!("unknown command: `{other}` (try pause, resume, exit)"),
        }
    }
}
