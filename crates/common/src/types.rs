// Common types for sshmux

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type of forwarding a tunnel performs
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TunnelKind {
    /// Local port forwarding (bind local endpoint, forward to remote)
    #[default]
    Local,
    /// Remote port forwarding (bind remote endpoint, forward to local)
    Remote,
    /// Dynamic port forwarding (SOCKS proxy)
    Dynamic,
    /// Forwarding is pre-configured in the client's own host alias;
    /// sshmux only starts, checks, and stops the connection
    ShellManaged,
}

impl TunnelKind {
    /// The client flag that carries the forward specification.
    /// Shell-managed tunnels emit no forwarding flag at all.
    pub fn forward_flag(&self) -> Option<&'static str> {
        match self {
            TunnelKind::Local => Some("-L"),
            TunnelKind::Remote => Some("-R"),
            TunnelKind::Dynamic => Some("-D"),
            TunnelKind::ShellManaged => None,
        }
    }
}

/// A resolved local or remote end of a tunnel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// TCP port
    Port(u16),
    /// Unix socket path
    Socket(String),
}

impl Endpoint {
    pub fn port(&self) -> Option<u16> {
        match self {
            Endpoint::Port(port) => Some(*port),
            Endpoint::Socket(_) => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Port(port) => write!(f, "{}", port),
            Endpoint::Socket(path) => f.write_str(path),
        }
    }
}

/// Control-socket verb issued to the ssh client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Start a multiplexing master in the background
    Run,
    /// Ask an existing master whether it is alive
    Check,
    /// Tell an existing master to terminate
    Kill,
}
