// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 sshmux Contributors

// Property resolution: sparse records to fully-defaulted tunnels

use crate::config::TunnelConfig;
use crate::state::OverrideStore;
use crate::types::{Endpoint, TunnelKind};

/// A tunnel with every optional endpoint defaulted, ready to format
/// and hand to the ssh client. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTunnel {
    pub name: String,
    pub kind: TunnelKind,
    pub login: Option<String>,
    pub host: String,
    pub local: Option<Endpoint>,
    pub remote: Option<Endpoint>,
}

/// Fully resolve a sparse tunnel record against the override store.
///
/// Structural fields pass through with their configured defaults;
/// endpoints follow the three-tier precedence below. No side effects.
pub fn resolve(config: &TunnelConfig, overrides: &OverrideStore) -> ResolvedTunnel {
    ResolvedTunnel {
        name: config.name.clone(),
        kind: config.kind,
        login: config.login.clone(),
        host: config.host.clone(),
        local: resolve_local(config, overrides.get(&config.name)),
        remote: resolve_remote(config),
    }
}

/// Local endpoint precedence: the override entry for a running tunnel,
/// then the configured local endpoint, then the configured remote
/// endpoint, ports before sockets.
pub fn resolve_local(
    config: &TunnelConfig,
    override_entry: Option<Endpoint>,
) -> Option<Endpoint> {
    if let Some(endpoint) = override_entry {
        return Some(endpoint);
    }
    if let Some(port) = config.local_port {
        return Some(Endpoint::Port(port));
    }
    if let Some(socket) = &config.local_socket {
        return Some(Endpoint::Socket(socket.clone()));
    }
    if let Some(port) = config.remote_port {
        return Some(Endpoint::Port(port));
    }
    config.remote_socket.clone().map(Endpoint::Socket)
}

/// Remote endpoint precedence: the configured remote endpoint, then the
/// configured local endpoint. Remote ends are never overridden at
/// runtime, so the override store plays no part here.
pub fn resolve_remote(config: &TunnelConfig) -> Option<Endpoint> {
    if let Some(port) = config.remote_port {
        return Some(Endpoint::Port(port));
    }
    if let Some(socket) = &config.remote_socket {
        return Some(Endpoint::Socket(socket.clone()));
    }
    if let Some(port) = config.local_port {
        return Some(Endpoint::Port(port));
    }
    config.local_socket.clone().map(Endpoint::Socket)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tunnel(name: &str) -> TunnelConfig {
        let mut config = TunnelConfig::new(name);
        config.login = Some("deploy@example.com".to_string());
        config
    }

    #[test]
    fn test_structural_defaults() {
        let resolved = resolve(&tunnel("db"), &OverrideStore::new());
        assert_eq!(resolved.name, "db");
        assert_eq!(resolved.kind, TunnelKind::Local);
        assert_eq!(resolved.host, "localhost");
        assert_eq!(resolved.login.as_deref(), Some("deploy@example.com"));
    }

    #[test]
    fn test_local_port_falls_back_to_remote_port() {
        let mut config = tunnel("db");
        config.remote_port = Some(5432);

        let resolved = resolve(&config, &OverrideStore::new());
        assert_eq!(resolved.local, Some(Endpoint::Port(5432)));
        assert_eq!(resolved.remote, Some(Endpoint::Port(5432)));
    }

    #[test]
    fn test_remote_port_falls_back_to_local_port() {
        let mut config = tunnel("db");
        config.local_port = Some(15432);

        let resolved = resolve(&config, &OverrideStore::new());
        assert_eq!(resolved.local, Some(Endpoint::Port(15432)));
        assert_eq!(resolved.remote, Some(Endpoint::Port(15432)));
    }

    #[test]
    fn test_socket_fallback_is_symmetric() {
        let mut config = tunnel("agent");
        config.remote_socket = Some("/run/agent.sock".to_string());

        let resolved = resolve(&config, &OverrideStore::new());
        assert_eq!(
            resolved.local,
            Some(Endpoint::Socket("/run/agent.sock".into()))
        );

        let mut config = tunnel("agent");
        config.local_socket = Some("/tmp/agent.sock".to_string());

        let resolved = resolve(&config, &OverrideStore::new());
        assert_eq!(
            resolved.remote,
            Some(Endpoint::Socket("/tmp/agent.sock".into()))
        );
    }

    #[test]
    fn test_mixed_endpoints_resolve_independently() {
        let mut config = tunnel("db");
        config.local_socket = Some("/tmp/db.sock".to_string());
        config.remote_port = Some(5432);

        let resolved = resolve(&config, &OverrideStore::new());
        assert_eq!(resolved.local, Some(Endpoint::Socket("/tmp/db.sock".into())));
        assert_eq!(resolved.remote, Some(Endpoint::Port(5432)));
    }

    #[test]
    fn test_override_beats_static_configuration() {
        let mut config = tunnel("db");
        config.local_port = Some(1234);
        config.remote_port = Some(3306);

        let overrides = OverrideStore::new();
        overrides.set("db", Endpoint::Port(1235));

        let resolved = resolve(&config, &overrides);
        assert_eq!(resolved.local, Some(Endpoint::Port(1235)));
    }

    #[test]
    fn test_override_socket_beats_static_port() {
        let mut config = tunnel("db");
        config.local_port = Some(1234);

        let overrides = OverrideStore::new();
        overrides.set("db", Endpoint::Socket("/tmp/adhoc.sock".into()));

        let resolved = resolve(&config, &overrides);
        assert_eq!(
            resolved.local,
            Some(Endpoint::Socket("/tmp/adhoc.sock".into()))
        );
    }

    #[test]
    fn test_remote_end_is_never_overridden() {
        let mut config = tunnel("db");
        config.local_port = Some(1234);
        config.remote_port = Some(3306);

        let overrides = OverrideStore::new();
        overrides.set("db", Endpoint::Port(9999));

        let resolved = resolve(&config, &overrides);
        assert_eq!(resolved.remote, Some(Endpoint::Port(3306)));
    }

    #[test]
    fn test_override_is_per_tunnel_name() {
        let mut config = tunnel("db");
        config.local_port = Some(1234);

        let overrides = OverrideStore::new();
        overrides.set("other", Endpoint::Port(9999));

        let resolved = resolve(&config, &overrides);
        assert_eq!(resolved.local, Some(Endpoint::Port(1234)));
    }

    #[test]
    fn test_nothing_to_resolve() {
        let resolved = resolve(&tunnel("bare"), &OverrideStore::new());
        assert_eq!(resolved.local, None);
        assert_eq!(resolved.remote, None);
    }
}
