//! `[serve]` section configuration.
//!
//! Development server and watch loop settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 5277                 # HTTP port number
//! ws_port = 35729             # Live-reload WebSocket port
//! debounce_ms = 300           # Quiet period before a batch is rebuilt
//! cooldown_ms = 0             # Minimum gap between two batches
//! reload_dirs = ["js", "images", "fonts"]  # Output subtrees that only reload
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// WebSocket port for live reload.
    pub ws_port: u16,

    /// Debounce window for file events.
    pub debounce_ms: u64,

    /// Cooldown after a batch before the next one may start.
    pub cooldown_ms: u64,

    /// Directories below the output root whose changes trigger a reload
    /// without rebuilding anything.
    pub reload_dirs: Vec<PathBuf>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5277,
            ws_port: 35729,
            debounce_ms: 300,
            cooldown_ms: 0,
            reload_dirs: vec!["js".into(), "images".into(), "fonts".into()],
        }
    }
}

impl ServeConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}
