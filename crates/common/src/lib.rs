// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 sshmux Contributors

// sshmux - Common Library
// Tunnel resolution, validation, and control-socket lifecycle

pub mod autostart;
pub mod config;
pub mod control;
pub mod error;
pub mod forward;
pub mod lookup;
pub mod resolve;
pub mod state;
pub mod tunnels_file;
pub mod types;

pub use autostart::AutoStart;
pub use config::{Config, Settings, TunnelConfig};
pub use control::ControlMaster;
pub use error::{Error, Result};
pub use forward::forward_spec;
pub use lookup::find_tunnel_for;
pub use resolve::{resolve, ResolvedTunnel};
pub use state::OverrideStore;
pub use tunnels_file::{config_path, load_config, save_config};
pub use types::{ControlAction, Endpoint, TunnelKind};
