// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 sshmux Contributors

// Control-socket lifecycle: run, check, and kill multiplexing masters

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::forward::forward_spec;
use crate::resolve::ResolvedTunnel;
use crate::state::OverrideStore;
use crate::types::ControlAction;

/// Drives the external ssh client through its multiplexing control
/// socket.
///
/// One control socket per tunnel name, kept in `socket_dir`, which is
/// also the working directory of every client invocation; the bare
/// tunnel name passed to `-S` therefore lands in that directory. The
/// authoritative running/stopped state lives in the client, not here:
/// `check` rediscovers it on every call and nothing is cached.
pub struct ControlMaster {
    ssh_command: String,
    socket_dir: PathBuf,
    overrides: Arc<OverrideStore>,
}

impl ControlMaster {
    pub fn new(settings: &Settings, overrides: Arc<OverrideStore>) -> Self {
        Self {
            ssh_command: settings.ssh_command.clone(),
            socket_dir: settings.socket_dir.clone(),
            overrides,
        }
    }

    /// The override store this control layer writes to
    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    /// Start the multiplexing master for this tunnel in the background.
    ///
    /// The override entry is replaced before the client is spawned; a
    /// failed launch leaves it behind on purpose, so a later kill
    /// clears the same bookkeeping this run recorded. The call returns
    /// once the client has forked and detached; callers that need
    /// confirmation should follow up with `check`.
    pub fn run(&self, tunnel: &ResolvedTunnel) -> Result<()> {
        self.overrides.remove(&tunnel.name);
        if let Some(endpoint) = &tunnel.local {
            self.overrides.set(&tunnel.name, endpoint.clone());
        }

        let mut cmd = self.command(ControlAction::Run, tunnel)?;
        debug!("starting tunnel '{}': {:?}", tunnel.name, cmd);

        let status = cmd.status().map_err(|e| {
            Error::Ssh(format!(
                "failed to launch '{}' for tunnel '{}': {}",
                self.ssh_command, tunnel.name, e
            ))
        })?;
        if !status.success() {
            return Err(Error::Ssh(format!(
                "client exited with {} while starting tunnel '{}'",
                status, tunnel.name
            )));
        }
        Ok(())
    }

    /// Ask the client whether a master is alive for this tunnel.
    ///
    /// Any nonzero exit is the normal negative answer, not an error;
    /// a missing control socket is indistinguishable from other client
    /// failures here. Never cache the result across operations.
    pub fn check(&self, tunnel: &ResolvedTunnel) -> bool {
        let mut cmd = match self.command(ControlAction::Check, tunnel) {
            Ok(cmd) => cmd,
            Err(err) => {
                warn!("cannot check tunnel '{}': {}", tunnel.name, err);
                return false;
            }
        };
        match cmd.status() {
            Ok(status) => status.success(),
            Err(err) => {
                debug!("check for tunnel '{}' failed to launch: {}", tunnel.name, err);
                false
            }
        }
    }

    /// Tell the master for this tunnel to terminate.
    ///
    /// The override entry is removed even when the client reports
    /// failure, so a subsequent run starts from clean bookkeeping.
    pub fn kill(&self, tunnel: &ResolvedTunnel) -> Result<()> {
        let result = self.command(ControlAction::Kill, tunnel).and_then(|mut cmd| {
            debug!("stopping tunnel '{}': {:?}", tunnel.name, cmd);
            cmd.status().map_err(|e| {
                Error::Ssh(format!(
                    "failed to launch '{}' for tunnel '{}': {}",
                    self.ssh_command, tunnel.name, e
                ))
            })
        });

        self.overrides.remove(&tunnel.name);

        let status = result?;
        if !status.success() {
            return Err(Error::Ssh(format!(
                "client exited with {} while stopping tunnel '{}'",
                status, tunnel.name
            )));
        }
        Ok(())
    }

    /// Stop-then-start composition. The kill result is advisory only;
    /// a tunnel that was not running is simply started.
    pub fn rerun(&self, tunnel: &ResolvedTunnel) -> Result<()> {
        if let Err(err) = self.kill(tunnel) {
            debug!("rerun of '{}': kill reported: {}", tunnel.name, err);
        }
        self.run(tunnel)
    }

    fn command(&self, action: ControlAction, tunnel: &ResolvedTunnel) -> Result<Command> {
        let login = tunnel
            .login
            .clone()
            .ok_or_else(|| Error::MissingLogin(tunnel.name.clone()))?;

        let mut cmd = Command::new(&self.ssh_command);
        cmd.current_dir(&self.socket_dir).arg("-S").arg(&tunnel.name);

        match action {
            ControlAction::Run => {
                cmd.args(["-M", "-f", "-N", "-T"]);
                if let (Some(flag), Some(spec)) =
                    (tunnel.kind.forward_flag(), forward_spec(tunnel)?)
                {
                    cmd.arg(flag).arg(spec);
                }
            }
            ControlAction::Check => {
                cmd.args(["-O", "check"]).stdout(Stdio::null()).stderr(Stdio::null());
            }
            ControlAction::Kill => {
                cmd.args(["-O", "exit"]).stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        cmd.arg(login);
        Ok(cmd)
    }
}
