// Configuration structures for sshmux

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::TunnelKind;

/// A single sparse tunnel definition as written by the operator.
///
/// Only `name` is required; every other field is defaulted during
/// resolution. The record itself is never mutated after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelConfig {
    /// Unique tunnel name, also the control-socket discriminator.
    /// Must be safe to embed in a socket file path.
    pub name: String,
    /// Forwarding type
    #[serde(rename = "type", default)]
    pub kind: TunnelKind,
    /// SSH login target (`user@host`). For shell-managed tunnels this
    /// must match a host alias in the client's own configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// Tunneling endpoint host (ignored for shell-managed tunnels)
    #[serde(default = "default_host")]
    pub host: String,
    /// Local port to bind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_port: Option<u16>,
    /// Remote port to forward to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_port: Option<u16>,
    /// Local Unix socket to bind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_socket: Option<String>,
    /// Remote Unix socket to forward to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_socket: Option<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl TunnelConfig {
    /// Create a minimal record with everything else left for resolution
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TunnelKind::default(),
            login: None,
            host: default_host(),
            local_port: None,
            remote_port: None,
            local_socket: None,
            remote_socket: None,
        }
    }

    /// Reject mutually exclusive endpoint fields.
    ///
    /// Inspects the raw record only: resolution defaults one side from
    /// the other and would mask the conflict.
    pub fn validate(&self) -> Result<()> {
        if self.local_port.is_some() && self.local_socket.is_some() {
            return Err(Error::MutuallyExclusiveLocal(self.name.clone()));
        }
        if self.remote_port.is_some() && self.remote_socket.is_some() {
            return Err(Error::MutuallyExclusiveRemote(self.name.clone()));
        }
        Ok(())
    }

    /// Duplicate this record with an ad-hoc local port for a single
    /// invocation, dropping any configured local endpoint
    pub fn with_local_port(&self, port: u16) -> Self {
        let mut copy = self.clone();
        copy.local_port = Some(port);
        copy.local_socket = None;
        copy
    }
}

/// Client invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// SSH client binary
    #[serde(default = "default_ssh_command")]
    pub ssh_command: String,
    /// Directory holding the control sockets; also the working
    /// directory of every client invocation
    #[serde(default = "default_socket_dir")]
    pub socket_dir: PathBuf,
}

fn default_ssh_command() -> String {
    "ssh".to_string()
}

fn default_socket_dir() -> PathBuf {
    std::env::temp_dir()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ssh_command: default_ssh_command(),
            socket_dir: default_socket_dir(),
        }
    }
}

/// The complete tunnel definition file: client settings plus an ordered
/// list of tunnel records. Order is significant for lookup matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub tunnels: Vec<TunnelConfig>,
}

impl Config {
    /// Look up a tunnel record by name
    pub fn tunnel(&self, name: &str) -> Result<&TunnelConfig> {
        self.tunnels
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::TunnelNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::OverrideStore;
    use crate::types::Endpoint;

    #[test]
    fn test_valid_config() {
        let mut config = TunnelConfig::new("db");
        config.login = Some("deploy@db.example.com".to_string());
        config.local_port = Some(15432);
        config.remote_port = Some(5432);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mutually_exclusive_local() {
        let mut config = TunnelConfig::new("db");
        config.local_port = Some(15432);
        config.local_socket = Some("/tmp/db.sock".to_string());
        assert!(matches!(
            config.validate(),
            Err(Error::MutuallyExclusiveLocal(name)) if name == "db"
        ));
    }

    #[test]
    fn test_mutually_exclusive_remote() {
        let mut config = TunnelConfig::new("db");
        config.remote_port = Some(5432);
        config.remote_socket = Some("/var/run/db.sock".to_string());
        assert!(matches!(
            config.validate(),
            Err(Error::MutuallyExclusiveRemote(name)) if name == "db"
        ));
    }

    #[test]
    fn test_validation_ignores_override_state() {
        // An active override must not mask a conflict in the raw record
        let mut config = TunnelConfig::new("db");
        config.local_port = Some(15432);
        config.local_socket = Some("/tmp/db.sock".to_string());

        let overrides = OverrideStore::new();
        overrides.set("db", Endpoint::Port(9999));

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_local_port_drops_socket() {
        let mut config = TunnelConfig::new("db");
        config.local_socket = Some("/tmp/db.sock".to_string());

        let copy = config.with_local_port(1235);
        assert_eq!(copy.local_port, Some(1235));
        assert_eq!(copy.local_socket, None);
        // the original record is untouched
        assert_eq!(config.local_port, None);
        assert!(config.local_socket.is_some());
    }

    #[test]
    fn test_minimal_record_defaults() {
        let config: TunnelConfig = toml::from_str(r#"name = "web""#).unwrap();
        assert_eq!(config.kind, TunnelKind::Local);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.login, None);
        assert_eq!(config.local_port, None);
    }

    #[test]
    fn test_kind_parses_snake_case() {
        let config: TunnelConfig =
            toml::from_str("name = \"alias\"\ntype = \"shell_managed\"").unwrap();
        assert_eq!(config.kind, TunnelKind::ShellManaged);
    }

    #[test]
    fn test_tunnel_lookup_by_name() {
        let config = Config {
            settings: Settings::default(),
            tunnels: vec![TunnelConfig::new("a"), TunnelConfig::new("b")],
        };
        assert_eq!(config.tunnel("b").unwrap().name, "b");
        assert!(matches!(
            config.tunnel("c"),
            Err(Error::TunnelNotFound(name)) if name == "c"
        ));
    }
}
