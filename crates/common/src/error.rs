// Error types for sshmux

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Tunnel '{0}': local_port and local_socket are mutually exclusive")]
    MutuallyExclusiveLocal(String),

    #[error("Tunnel '{0}': remote_port and remote_socket are mutually exclusive")]
    MutuallyExclusiveRemote(String),

    #[error("Tunnel '{0}': dynamic forwarding requires a numeric local port")]
    MissingLocalPort(String),

    #[error("Tunnel '{0}': no login configured")]
    MissingLogin(String),

    #[error("Tunnel not found: {0}")]
    TunnelNotFound(String),

    #[error("SSH client error: {0}")]
    Ssh(String),
}

pub type Result<T> = std::result::Result<T, Error>;
