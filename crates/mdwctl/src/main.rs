//! mdwctl - command & control front-end for the Bhojpur middleware manager.
//!
//! Validates and sorts middleware manifests locally, runs the manager
//! server, and queries a running manager over its HTTP API.

mod client;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mdw_config::{
    ConfigLoader, LogFormat, MiddlewareManifest, DEFAULT_ENV_PREFIX, HOST_ENV_VAR,
};
use mdw_engine::MiddlewareStack;
use mdw_server::{MiddlewareService, Server, ServerConfig};

use client::ManagerClient;

const DEFAULT_HOST: &str = "localhost:7777";

/// Parsed command line.
struct Args {
    verbose: bool,
    command: Command,
}

enum Command {
    /// Validate a manifest: load, sort, report.
    Check { manifest: PathBuf, strict: bool },
    /// Print the execution order of a manifest.
    Sort { manifest: PathBuf, strict: bool },
    /// Run the manager server.
    Serve {
        config: Option<PathBuf>,
        manifest: Option<PathBuf>,
    },
    /// List the middlewares registered with a running manager.
    List { host: String },
    /// Print the execution order computed by a running manager.
    Sorted { host: String },
    /// Print the health of a running manager.
    Status { host: String },
    Help,
    Version,
}

impl Args {
    fn parse() -> Self {
        match Self::from_args(std::env::args().skip(1).collect()) {
            Ok(args) => args,
            Err(message) => {
                eprintln!("{message}");
                eprintln!("Use --help for usage information");
                std::process::exit(2);
            }
        }
    }

    fn from_args(raw: Vec<String>) -> Result<Self, String> {
        let mut verbose = false;
        let mut strict = false;
        let mut command_name: Option<String> = None;
        let mut manifest: Option<PathBuf> = None;
        let mut config: Option<PathBuf> = None;
        let mut host: Option<String> = None;

        let mut iter = raw.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--verbose" | "-v" => verbose = true,
                "--strict" => strict = true,
                "--manifest" | "-m" => {
                    manifest = Some(PathBuf::from(next_value(&mut iter, "--manifest")?));
                }
                "--config" | "-c" => {
                    config = Some(PathBuf::from(next_value(&mut iter, "--config")?));
                }
                "--host" => host = Some(next_value(&mut iter, "--host")?),
                "--help" | "-h" => {
                    return Ok(Self {
                        verbose,
                        command: Command::Help,
                    })
                }
                "--version" | "-V" => {
                    return Ok(Self {
                        verbose,
                        command: Command::Version,
                    })
                }
                other if !other.starts_with('-') && command_name.is_none() => {
                    command_name = Some(other.to_string());
                }
                other => return Err(format!("unknown argument: {other}")),
            }
        }

        let command = match command_name.as_deref() {
            Some("check") => Command::Check {
                manifest: manifest.ok_or("check requires --manifest <path>")?,
                strict,
            },
            Some("sort") => Command::Sort {
                manifest: manifest.ok_or("sort requires --manifest <path>")?,
                strict,
            },
            Some("serve") => Command::Serve { config, manifest },
            Some("list") => Command::List {
                host: host.unwrap_or_else(default_host),
            },
            Some("sorted") => Command::Sorted {
                host: host.unwrap_or_else(default_host),
            },
            Some("status") => Command::Status {
                host: host.unwrap_or_else(default_host),
            },
            Some(other) => return Err(format!("unknown command: {other}")),
            None => Command::Help,
        };

        Ok(Self { verbose, command })
    }
}

fn next_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    iter.next().ok_or_else(|| format!("{flag} requires a value"))
}

/// Default manager address: `MIDDLEWARE_HOST` env var, then localhost.
fn default_host() -> String {
    std::env::var(HOST_ENV_VAR)
        .ok()
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string())
}

fn print_help() {
    println!(
        r"mdwctl - command & control for the Bhojpur middleware manager

USAGE:
    mdwctl <COMMAND> [OPTIONS]

COMMANDS:
    check      Validate a middleware manifest (exits non-zero on conflicts)
    sort       Print the execution order of a manifest
    serve      Run the middleware manager server
    list       List middlewares registered with a running manager
    sorted     Print the execution order computed by a running manager
    status     Print the health of a running manager

OPTIONS:
    -m, --manifest <PATH>    Middleware manifest (TOML or JSON)
    -c, --config <PATH>      Manager configuration file (serve only)
        --host <ADDR>        Manager to talk to (defaults to MIDDLEWARE_HOST,
                             then localhost:7777)
        --strict             Treat hints aimed at unknown middlewares as errors
    -v, --verbose            Enable debug logging
    -h, --help               Print help information
    -V, --version            Print version information

ENVIRONMENT VARIABLES:
    MIDDLEWARE_HOST                   Manager address for client commands
    MIDDLEWARE__SERVER__HTTP_ADDR     Listen address override (serve)
    MIDDLEWARE__LOGGING__LEVEL        Log level override (serve)
    MIDDLEWARE__ENGINE__STRICT_HINTS  Strict hint handling override (serve)

EXAMPLES:
    # Validate a manifest before rollout
    mdwctl check --manifest middleware.toml

    # Run the manager seeded from a manifest
    mdwctl serve --config manager.toml --manifest middleware.toml

    # Ask a running manager for the execution order
    mdwctl sorted --host mdw.internal:7777
"
    );
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn init_cli_tracing(verbose: bool) {
    let level = if verbose {
        "mdwctl=debug,mdw_server=debug,info"
    } else {
        "mdwctl=info,warn"
    };
    init_tracing(level, false);
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let result = match args.command {
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            println!("mdwctl {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Check { manifest, strict } => {
            init_cli_tracing(args.verbose);
            check(&manifest, strict)
        }
        Command::Sort { manifest, strict } => {
            init_cli_tracing(args.verbose);
            sort(&manifest, strict)
        }
        Command::Serve { config, manifest } => serve(config, manifest, args.verbose).await,
        Command::List { host } => {
            init_cli_tracing(args.verbose);
            list(&host).await
        }
        Command::Sorted { host } => {
            init_cli_tracing(args.verbose);
            sorted(&host).await
        }
        Command::Status { host } => {
            init_cli_tracing(args.verbose);
            status(&host).await
        }
    };

    if let Err(e) = result {
        // Not every failure path has a tracing subscriber yet (e.g. a bad
        // configuration file for `serve`), so report on stderr directly.
        eprintln!("mdwctl: {e:#}");
        std::process::exit(1);
    }
}

fn load_stack(path: &Path, strict: bool) -> Result<MiddlewareStack> {
    let manifest = MiddlewareManifest::from_file(path)
        .with_context(|| format!("cannot load manifest {}", path.display()))?;
    Ok(manifest.into_stack(strict)?)
}

fn check(path: &Path, strict: bool) -> Result<()> {
    let stack = load_stack(path, strict)?;
    let sorted = stack.sort().context("manifest cannot be ordered")?;

    let order: Vec<_> = sorted.iter().map(|d| d.name()).collect();
    println!(
        "ok: {} middlewares, order: {}",
        stack.len(),
        order.join(" -> ")
    );
    Ok(())
}

fn sort(path: &Path, strict: bool) -> Result<()> {
    let stack = load_stack(path, strict)?;
    for declaration in stack.sort().context("manifest cannot be ordered")? {
        println!("{}", declaration.name());
    }
    Ok(())
}

async fn serve(
    config_path: Option<PathBuf>,
    manifest_path: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &config_path {
        loader = loader
            .with_file(path)
            .with_context(|| format!("cannot load configuration {}", path.display()))?;
    }
    let mut config = loader.with_env_prefix(DEFAULT_ENV_PREFIX).load()?;
    if verbose {
        config.logging.level = "debug".to_string();
    }

    init_tracing(&config.logging.level, config.logging.format == LogFormat::Json);

    let stack = match &manifest_path {
        Some(path) => {
            let stack = load_stack(path, config.engine.strict_hints)?;
            // Surface ordering conflicts at startup rather than on the
            // first sorted query.
            stack.sort().context("seed manifest cannot be ordered")?;
            stack
        }
        None if config.engine.strict_hints => MiddlewareStack::strict(),
        None => MiddlewareStack::new(),
    };

    info!(
        middlewares = stack.len(),
        addr = %config.server.http_addr,
        "starting middleware manager"
    );

    let server_config = ServerConfig::builder()
        .http_addr(config.server.http_addr.as_str())
        .shutdown_timeout(Duration::from_secs(config.server.shutdown_timeout_secs))
        .request_timeout(Duration::from_millis(config.server.request_timeout_ms))
        .build();

    let service = Arc::new(MiddlewareService::with_stack(stack));
    Server::new(server_config, service).run().await?;
    Ok(())
}

async fn list(host: &str) -> Result<()> {
    let client = ManagerClient::new(host)?;
    let response = client.list().await?;

    if response.middlewares.is_empty() {
        println!("no middlewares registered");
        return Ok(());
    }

    for declaration in &response.middlewares {
        let mut line = declaration.name().to_string();
        if !declaration.insert_after().is_empty() {
            line.push_str(&format!(" (after: {})", declaration.insert_after().join(", ")));
        }
        if !declaration.insert_before().is_empty() {
            line.push_str(&format!(" (before: {})", declaration.insert_before().join(", ")));
        }
        if !declaration.requires().is_empty() {
            line.push_str(&format!(" (requires: {})", declaration.requires().join(", ")));
        }
        println!("{line}");
    }
    Ok(())
}

async fn sorted(host: &str) -> Result<()> {
    let client = ManagerClient::new(host)?;
    let response = client.sorted().await?;
    println!("{}", response.order.join(" -> "));
    Ok(())
}

async fn status(host: &str) -> Result<()> {
    let client = ManagerClient::new(host)?;
    let health = client.health().await?;
    println!(
        "{} {} (version {}, up {}s)",
        health.service(),
        health.status(),
        health.version(),
        health.uptime_seconds()
    );
    Ok(())
}
