// sshmux - Tunnel File Module
// Shared tunnels.toml I/O for the CLI and embedding hosts

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::Config;

/// Get the sshmux configuration directory
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(base.join("sshmux"))
}

/// Get the path of the tunnel definition file
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("tunnels.toml"))
}

/// Load the tunnel definitions, falling back to an empty default when
/// the file does not exist yet
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        debug!("Tunnel file does not exist: {}", path.display());
        return Ok(Config::default());
    }

    load_config_from(&path)
}

/// Load tunnel definitions from an explicit path
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents =
        fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&contents).context(format!("Failed to parse {}", path.display()))?;

    // Socket paths may be written with a leading ~
    for tunnel in &mut config.tunnels {
        tunnel.local_socket = tunnel.local_socket.take().map(expand_tilde);
        tunnel.remote_socket = tunnel.remote_socket.take().map(expand_tilde);
    }
    config.settings.socket_dir = PathBuf::from(expand_tilde(
        config.settings.socket_dir.to_string_lossy().into_owned(),
    ));

    debug!(
        "Loaded {} tunnel(s) from {}",
        config.tunnels.len(),
        path.display()
    );

    Ok(config)
}

/// Save the tunnel definitions to the default location, creating the
/// configuration directory if needed
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = config_path()?;
    save_config_to(&path, config)?;
    Ok(path)
}

/// Save tunnel definitions to an explicit path
pub fn save_config_to(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let contents = toml::to_string_pretty(config).context("Failed to serialize tunnel file")?;

    fs::write(path, contents).context(format!("Failed to write {}", path.display()))?;

    debug!(
        "Saved {} tunnel(s) to {}",
        config.tunnels.len(),
        path.display()
    );

    Ok(())
}

fn expand_tilde(path: String) -> String {
    shellexpand::tilde(&path).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TunnelConfig;
    use crate::types::TunnelKind;

    #[test]
    fn test_load_preserves_order_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tunnels.toml");
        fs::write(
            &path,
            r#"
[settings]
ssh_command = "/usr/bin/ssh"

[[tunnels]]
name = "db"
login = "deploy@db.example.com"
local_port = 15432
remote_port = 5432

[[tunnels]]
name = "socks"
type = "dynamic"
login = "deploy@gw.example.com"
local_port = 1080
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.settings.ssh_command, "/usr/bin/ssh");
        assert_eq!(config.tunnels.len(), 2);
        assert_eq!(config.tunnels[0].name, "db");
        assert_eq!(config.tunnels[0].host, "localhost");
        assert_eq!(config.tunnels[1].name, "socks");
        assert_eq!(config.tunnels[1].kind, TunnelKind::Dynamic);
    }

    #[test]
    fn test_socket_paths_are_tilde_expanded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tunnels.toml");
        fs::write(
            &path,
            r#"
[[tunnels]]
name = "agent"
login = "me@host"
local_socket = "~/agent.sock"
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        let socket = config.tunnels[0].local_socket.as_deref().unwrap();
        assert!(!socket.starts_with('~'));
        assert!(socket.ends_with("agent.sock"));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tunnels.toml");

        let mut tunnel = TunnelConfig::new("db");
        tunnel.login = Some("deploy@db.example.com".to_string());
        tunnel.local_port = Some(15432);
        let config = Config {
            tunnels: vec![tunnel],
            ..Config::default()
        };

        save_config_to(&path, &config).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.tunnels.len(), 1);
        assert_eq!(loaded.tunnels[0].name, "db");
        assert_eq!(loaded.tunnels[0].local_port, Some(15432));
    }
}
