// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 sshmux Contributors

// sshmux - CLI Client
// Command-line interface for managing multiplexed SSH tunnels

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use dialoguer::{Confirm, Input, Select};

use sshmux_common::{
    find_tunnel_for, forward_spec, load_config, resolve, save_config, AutoStart, Config,
    ControlMaster, OverrideStore, ResolvedTunnel, TunnelConfig, TunnelKind,
};

#[derive(Parser)]
#[command(name = "sshmux")]
#[command(about = "Multiplexed SSH tunnel manager", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new tunnel definition
    Add {
        /// Tunnel name (also names the control socket)
        name: String,

        /// SSH login target (user@host, or a client alias for
        /// shell-managed tunnels)
        #[arg(short, long)]
        login: Option<String>,

        /// Tunnel type: local, remote, dynamic, or shell_managed
        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        /// Tunneling endpoint host
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Local port to bind
        #[arg(short = 'p', long)]
        local_port: Option<u16>,

        /// Remote port to forward to
        #[arg(short = 'r', long)]
        remote_port: Option<u16>,

        /// Local Unix socket to bind
        #[arg(long)]
        local_socket: Option<String>,

        /// Remote Unix socket to forward to
        #[arg(long)]
        remote_socket: Option<String>,

        /// Skip interactive prompts (use provided args only)
        #[arg(short = 'y', long)]
        non_interactive: bool,
    },

    /// List all tunnel definitions with their current state
    List {
        /// Output as JSON for scripting
        #[arg(short, long)]
        json: bool,
    },

    /// Show detailed information about a tunnel
    Info {
        /// Tunnel name
        name: String,
    },

    /// Start a tunnel
    Run {
        /// Tunnel name
        name: String,

        /// Use this local port for this run instead of the configured
        /// local endpoint
        #[arg(short = 'p', long)]
        local_port: Option<u16>,
    },

    /// Stop a tunnel
    Stop {
        /// Tunnel name
        name: String,
    },

    /// Stop and start a tunnel again
    Restart {
        /// Tunnel name
        name: String,
    },

    /// Show tunnel status
    Status {
        /// Tunnel name (all tunnels if omitted)
        name: Option<String>,
    },

    /// Delete a tunnel definition
    Delete {
        /// Tunnel name
        name: String,

        /// Delete without confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Make sure any tunnel mapping to host:service is up, starting it
    /// if needed (integration point for connection hooks)
    Ensure {
        /// Target host
        host: String,

        /// Target port or numeric service identifier
        service: String,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Add {
            name,
            login,
            kind,
            host,
            local_port,
            remote_port,
            local_socket,
            remote_socket,
            non_interactive,
        } => add_tunnel(
            name,
            login,
            kind,
            host,
            local_port,
            remote_port,
            local_socket,
            remote_socket,
            non_interactive,
        ),
        Commands::List { json } => list_tunnels(json),
        Commands::Info { name } => show_tunnel_info(name),
        Commands::Run { name, local_port } => run_tunnel(name, local_port),
        Commands::Stop { name } => stop_tunnel(name),
        Commands::Restart { name } => restart_tunnel(name),
        Commands::Status { name } => show_status(name),
        Commands::Delete { name, yes } => delete_tunnel(name, yes),
        Commands::Ensure { host, service } => ensure_tunnel(host, service),
    }
}

fn create_control(config: &Config) -> ControlMaster {
    ControlMaster::new(&config.settings, Arc::new(OverrideStore::new()))
}

fn kind_label(kind: TunnelKind) -> &'static str {
    match kind {
        TunnelKind::Local => "local",
        TunnelKind::Remote => "remote",
        TunnelKind::Dynamic => "dynamic",
        TunnelKind::ShellManaged => "shell_managed",
    }
}

fn parse_kind(value: &str) -> Result<TunnelKind> {
    match value {
        "local" => Ok(TunnelKind::Local),
        "remote" => Ok(TunnelKind::Remote),
        "dynamic" => Ok(TunnelKind::Dynamic),
        "shell_managed" => Ok(TunnelKind::ShellManaged),
        other => anyhow::bail!(
            "Unknown tunnel type '{}' (expected local, remote, dynamic, or shell_managed)",
            other
        ),
    }
}

fn add_tunnel(
    name: String,
    login: Option<String>,
    kind: Option<String>,
    host: Option<String>,
    local_port: Option<u16>,
    remote_port: Option<u16>,
    local_socket: Option<String>,
    remote_socket: Option<String>,
    non_interactive: bool,
) -> Result<()> {
    let mut config = load_config()?;

    if config.tunnel(&name).is_ok() {
        anyhow::bail!(
            "A tunnel named '{}' already exists. Choose a different name or delete it first.",
            name.yellow()
        );
    }

    println!("{}", "Creating new tunnel definition".bold().green());

    let kind = match kind {
        Some(value) => parse_kind(&value)?,
        None if non_interactive => TunnelKind::Local,
        None => {
            let labels = ["local", "remote", "dynamic", "shell_managed"];
            let selection = Select::new()
                .with_prompt("Tunnel type")
                .items(&labels)
                .default(0)
                .interact()?;
            parse_kind(labels[selection])?
        }
    };

    let login = match login {
        Some(value) => Some(value),
        None if non_interactive => None,
        None => {
            let prompt = if kind == TunnelKind::ShellManaged {
                "Client host alias"
            } else {
                "SSH login target (user@host)"
            };
            let value: String = Input::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()?;
            if value.trim().is_empty() {
                None
            } else {
                Some(value)
            }
        }
    };

    let host = match host {
        Some(value) => value,
        None if non_interactive || kind == TunnelKind::ShellManaged => "localhost".to_string(),
        None => Input::new()
            .with_prompt("Tunneling endpoint host")
            .default("localhost".to_string())
            .interact_text()?,
    };

    let local_port = match local_port {
        Some(port) => Some(port),
        None if non_interactive || local_socket.is_some() || kind == TunnelKind::ShellManaged => {
            None
        }
        None => {
            let value: String = Input::new()
                .with_prompt("Local port (empty for none)")
                .allow_empty(true)
                .interact_text()?;
            if value.trim().is_empty() {
                None
            } else {
                Some(value.trim().parse().context("Invalid local port")?)
            }
        }
    };

    let remote_port = match remote_port {
        Some(port) => Some(port),
        None if non_interactive || remote_socket.is_some() || kind == TunnelKind::ShellManaged => {
            None
        }
        None => {
            let value: String = Input::new()
                .with_prompt("Remote port (empty for none)")
                .allow_empty(true)
                .interact_text()?;
            if value.trim().is_empty() {
                None
            } else {
                Some(value.trim().parse().context("Invalid remote port")?)
            }
        }
    };

    let tunnel = TunnelConfig {
        name: name.clone(),
        kind,
        login,
        host,
        local_port,
        remote_port,
        local_socket,
        remote_socket,
    };

    tunnel.validate()?;

    config.tunnels.push(tunnel);
    let path = save_config(&config)?;

    println!(
        "{}",
        format!("✓ Tunnel '{}' saved to {}", name, path.display())
            .green()
            .bold()
    );
    Ok(())
}

fn list_tunnels(json: bool) -> Result<()> {
    let config = load_config()?;

    if config.tunnels.is_empty() {
        println!("{}", "No tunnels defined.".yellow());
        println!("Create one with: {}", "sshmux add <name>".cyan());
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&config.tunnels)?);
        return Ok(());
    }

    let control = create_control(&config);

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name")
            .add_attribute(Attribute::Bold)
            .fg(Color::Cyan),
        Cell::new("Type")
            .add_attribute(Attribute::Bold)
            .fg(Color::Cyan),
        Cell::new("Login")
            .add_attribute(Attribute::Bold)
            .fg(Color::Cyan),
        Cell::new("Forward")
            .add_attribute(Attribute::Bold)
            .fg(Color::Cyan),
        Cell::new("Status")
            .add_attribute(Attribute::Bold)
            .fg(Color::Cyan),
    ]);

    let mut errors = Vec::new();

    // Each listing refresh re-validates the raw records and asks the
    // client for the live state; nothing is cached between refreshes
    for tunnel_config in &config.tunnels {
        let login = tunnel_config.login.as_deref().unwrap_or("-").to_string();

        if let Err(err) = tunnel_config.validate() {
            errors.push(err.to_string());
            table.add_row(vec![
                Cell::new(&tunnel_config.name).fg(Color::Green),
                Cell::new(kind_label(tunnel_config.kind)),
                Cell::new(login),
                Cell::new("-"),
                Cell::new("invalid").fg(Color::Red),
            ]);
            continue;
        }

        let tunnel = resolve(tunnel_config, control.overrides());
        let forward = match forward_spec(&tunnel) {
            Ok(Some(spec)) => spec,
            Ok(None) => "(client config)".to_string(),
            Err(err) => {
                errors.push(err.to_string());
                err.to_string()
            }
        };
        let status = if control.check(&tunnel) {
            Cell::new("running").fg(Color::Green)
        } else {
            Cell::new("stopped").fg(Color::DarkGrey)
        };

        table.add_row(vec![
            Cell::new(&tunnel.name).fg(Color::Green),
            Cell::new(kind_label(tunnel.kind)),
            Cell::new(login),
            Cell::new(forward),
            status,
        ]);
    }

    println!();
    println!("{}", table);
    println!();
    println!("{} tunnel(s) defined", config.tunnels.len().to_string().cyan());

    for error in errors {
        println!("{}", error.red());
    }

    Ok(())
}

fn show_tunnel_info(name: String) -> Result<()> {
    let config = load_config()?;
    let tunnel_config = config.tunnel(&name)?;
    let control = create_control(&config);

    println!();
    println!("{}", format!("Tunnel: {}", tunnel_config.name).bold().green());
    println!("  Type: {}", kind_label(tunnel_config.kind));
    println!(
        "  Login: {}",
        tunnel_config.login.as_deref().unwrap_or("-")
    );
    println!("  Host: {}", tunnel_config.host);

    if let Err(err) = tunnel_config.validate() {
        println!("  {}", err.to_string().red());
        return Ok(());
    }

    let tunnel = resolve(tunnel_config, control.overrides());
    println!(
        "  Local endpoint: {}",
        tunnel
            .local
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "  Remote endpoint: {}",
        tunnel
            .remote
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string())
    );

    match forward_spec(&tunnel) {
        Ok(Some(spec)) => println!("  Forward: {}", spec),
        Ok(None) => println!("  Forward: configured in the client's host alias"),
        Err(err) => println!("  Forward: {}", err.to_string().red()),
    }

    if control.check(&tunnel) {
        println!("  Status: {}", "running".green());
    } else {
        println!("  Status: {}", "stopped".dimmed());
    }

    Ok(())
}

fn prepare(
    config: &Config,
    control: &ControlMaster,
    name: &str,
    local_port: Option<u16>,
) -> Result<ResolvedTunnel> {
    let tunnel_config = config.tunnel(name)?;
    let record = match local_port {
        Some(port) => tunnel_config.with_local_port(port),
        None => tunnel_config.clone(),
    };
    record.validate()?;
    Ok(resolve(&record, control.overrides()))
}

fn run_tunnel(name: String, local_port: Option<u16>) -> Result<()> {
    let config = load_config()?;
    let control = create_control(&config);
    let tunnel = prepare(&config, &control, &name, local_port)?;

    // A second master on the same socket would be redundant; check
    // before spawning one
    if control.check(&tunnel) {
        println!("{}", format!("Tunnel '{}' is already running", name).yellow());
        return Ok(());
    }

    println!("{}", format!("Starting tunnel '{}'", name).green().bold());
    control.run(&tunnel)?;

    if control.check(&tunnel) {
        println!("{}", "✓ Tunnel running".green().bold());
    } else {
        println!(
            "{}",
            "Start requested; master not confirmed yet".yellow()
        );
    }
    Ok(())
}

fn stop_tunnel(name: String) -> Result<()> {
    let config = load_config()?;
    let control = create_control(&config);
    let tunnel = prepare(&config, &control, &name, None)?;

    println!("{}", format!("Stopping tunnel '{}'", name).yellow());
    match control.kill(&tunnel) {
        Ok(()) => println!("{}", "✓ Tunnel stopped".green().bold()),
        // Best-effort: bookkeeping is already cleared, a later run
        // starts clean
        Err(err) => println!("{}", format!("Stop reported: {}", err).yellow()),
    }
    Ok(())
}

fn restart_tunnel(name: String) -> Result<()> {
    let config = load_config()?;
    let control = create_control(&config);
    let tunnel = prepare(&config, &control, &name, None)?;

    println!("{}", format!("Restarting tunnel '{}'", name).green().bold());
    control.rerun(&tunnel)?;

    if control.check(&tunnel) {
        println!("{}", "✓ Tunnel running".green().bold());
    }
    Ok(())
}

fn show_status(name: Option<String>) -> Result<()> {
    let config = load_config()?;
    let control = create_control(&config);

    let selected: Vec<&TunnelConfig> = match &name {
        Some(n) => vec![config.tunnel(n)?],
        None => config.tunnels.iter().collect(),
    };

    if selected.is_empty() {
        println!("{}", "No tunnels defined.".yellow());
        return Ok(());
    }

    for tunnel_config in selected {
        let tunnel = resolve(tunnel_config, control.overrides());
        if control.check(&tunnel) {
            println!("{}: {}", tunnel.name, "running".green());
        } else {
            println!("{}: {}", tunnel.name, "stopped".dimmed());
        }
    }
    Ok(())
}

fn delete_tunnel(name: String, yes: bool) -> Result<()> {
    let mut config = load_config()?;
    config.tunnel(&name)?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete tunnel '{}'?", name))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    config.tunnels.retain(|t| t.name != name);
    save_config(&config)?;

    println!("{}", format!("✓ Tunnel '{}' deleted", name).green().bold());
    Ok(())
}

fn ensure_tunnel(host: String, service: String) -> Result<()> {
    let config = load_config()?;
    let control = create_control(&config);

    let Some(tunnel_config) =
        find_tunnel_for(&config.tunnels, control.overrides(), &host, &service)
    else {
        println!(
            "{}",
            format!("No tunnel configured for {}:{}", host, service).dimmed()
        );
        return Ok(());
    };
    let name = tunnel_config.name.clone();

    let auto = AutoStart::new(&config.tunnels, &control);
    if auto.before_connect(&host, &service)? {
        println!("{}", format!("✓ Started tunnel '{}'", name).green().bold());
    } else {
        println!("{}", format!("Tunnel '{}' is already running", name).green());
    }
    Ok(())
}
