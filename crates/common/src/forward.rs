// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 sshmux Contributors

// Forward specification strings for the client's -L/-R/-D flags

use crate::error::{Error, Result};
use crate::resolve::ResolvedTunnel;
use crate::types::{Endpoint, TunnelKind};

/// Build the argument for the client's forwarding flag.
///
/// Returns `None` for shell-managed tunnels: their forwarding lives in
/// the client's own host alias and no flag is emitted at all.
pub fn forward_spec(tunnel: &ResolvedTunnel) -> Result<Option<String>> {
    let spec = match tunnel.kind {
        TunnelKind::ShellManaged => return Ok(None),
        TunnelKind::Dynamic => {
            let port = tunnel
                .local
                .as_ref()
                .and_then(Endpoint::port)
                .ok_or_else(|| Error::MissingLocalPort(tunnel.name.clone()))?;
            format!("{}:{}", bracket_host(&tunnel.host), port)
        }
        TunnelKind::Remote => match (&tunnel.remote, &tunnel.local) {
            // Socket-to-socket forwards carry no host component
            (Some(Endpoint::Socket(remote)), Some(Endpoint::Socket(local))) => {
                format!("{}:{}", remote, local)
            }
            _ => format!(
                "{}:{}:{}",
                render(&tunnel.remote),
                bracket_host(&tunnel.host),
                render(&tunnel.local)
            ),
        },
        TunnelKind::Local => match (&tunnel.local, &tunnel.remote) {
            (Some(Endpoint::Socket(local)), Some(Endpoint::Socket(remote))) => {
                format!("{}:{}", local, remote)
            }
            _ => format!(
                "{}:{}:{}",
                render(&tunnel.local),
                bracket_host(&tunnel.host),
                render(&tunnel.remote)
            ),
        },
    };
    Ok(Some(spec))
}

/// IPv6 literals must be bracketed so the client does not split on
/// their colons
fn bracket_host(host: &str) -> String {
    if host.contains(':') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}

fn render(endpoint: &Option<Endpoint>) -> String {
    endpoint.as_ref().map(ToString::to_string).unwrap_or_default()
}
