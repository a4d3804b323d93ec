// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 sshmux Contributors

// On-demand tunnel activation for hosting environments

use tracing::debug;

use crate::config::TunnelConfig;
use crate::control::ControlMaster;
use crate::error::Result;
use crate::lookup::find_tunnel_for;
use crate::resolve::resolve;

/// Interceptor a hosting environment calls immediately before opening
/// an outbound connection.
///
/// The host owns the interception mechanism; this object only answers
/// "does a tunnel map to this endpoint, and is it up". It blocks no
/// longer than a normal run.
pub struct AutoStart<'a> {
    tunnels: &'a [TunnelConfig],
    control: &'a ControlMaster,
}

impl<'a> AutoStart<'a> {
    pub fn new(tunnels: &'a [TunnelConfig], control: &'a ControlMaster) -> Self {
        Self { tunnels, control }
    }

    /// Ensure any tunnel mapping to `host:service` is up before the
    /// caller connects. Returns `true` when a tunnel was started by
    /// this call; no match and already-running both return `false`.
    pub fn before_connect(&self, host: &str, service: &str) -> Result<bool> {
        let Some(config) = find_tunnel_for(self.tunnels, self.control.overrides(), host, service)
        else {
            return Ok(false);
        };

        config.validate()?;
        let tunnel = resolve(config, self.control.overrides());
        if self.control.check(&tunnel) {
            debug!(
                "tunnel '{}' already running for {}:{}",
                tunnel.name, host, service
            );
            return Ok(false);
        }

        debug!("starting tunnel '{}' for {}:{}", tunnel.name, host, service);
        self.control.run(&tunnel)?;
        Ok(true)
    }
}
