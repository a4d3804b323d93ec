// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 sshmux Contributors

// Endpoint lookup for opportunistic tunnel activation

use crate::config::TunnelConfig;
use crate::resolve::resolve;
use crate::state::OverrideStore;
use crate::types::{Endpoint, TunnelKind};

/// Find the first configured tunnel whose resolved host and local port
/// match the target endpoint.
///
/// `service` must be numeric; named services never match, and socket
/// endpoints are never considered. Shell-managed tunnels have no
/// discoverable local endpoint and are skipped. Ties are broken by
/// configuration order.
pub fn find_tunnel_for<'a>(
    tunnels: &'a [TunnelConfig],
    overrides: &OverrideStore,
    host: &str,
    service: &str,
) -> Option<&'a TunnelConfig> {
    let port: u16 = service.parse().ok()?;

    tunnels.iter().find(|config| {
        if config.kind == TunnelKind::ShellManaged {
            return false;
        }
        let resolved = resolve(config, overrides);
        resolved.host == host && resolved.local == Some(Endpoint::Port(port))
    })
}
