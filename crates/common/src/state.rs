// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 sshmux Contributors

// Override state for running tunnels

use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::Endpoint;

/// Transient record of the local endpoint actually in use for each
/// running tunnel.
///
/// Entries are written when a tunnel is started and cleared when it is
/// stopped; they take precedence over the static configuration in the
/// meantime, so an ad-hoc local port survives configuration edits until
/// the tunnel is next stopped. Nothing here outlives the process.
///
/// The control layer is the only writer. The map is mutex-protected so
/// multi-threaded hosts stay safe, but run/kill for the same tunnel
/// name still need external serialization to avoid racing the client
/// against one control-socket path.
#[derive(Debug, Default)]
pub struct OverrideStore {
    entries: Mutex<HashMap<String, Endpoint>>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Endpoint> {
        self.entries
            .lock()
            .expect("override store lock")
            .get(name)
            .cloned()
    }

    pub fn set(&self, name: &str, endpoint: Endpoint) {
        self.entries
            .lock()
            .expect("override store lock")
            .insert(name.to_string(), endpoint);
    }

    pub fn remove(&self, name: &str) {
        self.entries
            .lock()
            .expect("override store lock")
            .remove(name);
    }
}
