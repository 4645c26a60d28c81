//! Runtime configuration.
//!
//! Both structs implement `Default` and a builder-style API, and derive
//! serde so they can be embedded in a larger configuration file.
//!
//! ```
//! use std::time::Duration;
//! use netremote::config::ControlChannelConfig;
//!
//! let config = ControlChannelConfig::default()
//!     .hostapd_control_dir("/run/hostapd")
//!     .recv_timeout(Duration::from_secs(2));
//! assert_eq!(config.recv_timeout, Some(Duration::from_secs(2)));
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::wpa::{HOSTAPD_CONTROL_DIR, WPA_SUPPLICANT_CONTROL_DIR, WpaType};

/// Default size of the control-socket receive buffer.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 8192;

/// Default capacity of the discovery event channel.
pub const DEFAULT_DISCOVERY_CHANNEL_CAPACITY: usize = 32;

/// Settings for [`ControlChannel`](crate::wpa::ControlChannel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlChannelConfig {
    /// Directory holding hostapd's per-interface sockets.
    pub hostapd_control_dir: PathBuf,
    /// Directory holding wpa_supplicant's per-interface sockets.
    pub wpa_supplicant_control_dir: PathBuf,
    /// Directory in which client sockets are bound.
    pub local_socket_dir: PathBuf,
    /// Largest reply accepted, in bytes.
    pub recv_buffer_size: usize,
    /// How long to wait for a reply. `None` waits forever.
    pub recv_timeout: Option<Duration>,
}

impl Default for ControlChannelConfig {
    fn default() -> Self {
        Self {
            hostapd_control_dir: PathBuf::from(HOSTAPD_CONTROL_DIR),
            wpa_supplicant_control_dir: PathBuf::from(WPA_SUPPLICANT_CONTROL_DIR),
            local_socket_dir: std::env::temp_dir(),
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            recv_timeout: None,
        }
    }
}

impl ControlChannelConfig {
    pub fn hostapd_control_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.hostapd_control_dir = dir.into();
        self
    }

    pub fn wpa_supplicant_control_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.wpa_supplicant_control_dir = dir.into();
        self
    }

    pub fn local_socket_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_socket_dir = dir.into();
        self
    }

    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = Some(timeout);
        self
    }

    /// Socket directory of `daemon`.
    pub fn control_dir(&self, daemon: WpaType) -> &Path {
        match daemon {
            WpaType::Hostapd => &self.hostapd_control_dir,
            WpaType::WpaSupplicant => &self.wpa_supplicant_control_dir,
        }
    }

    /// Control socket of `interface` served by `daemon`.
    pub fn socket_path(&self, daemon: WpaType, interface: &str) -> PathBuf {
        self.control_dir(daemon).join(interface)
    }
}

/// Settings for [`AccessPointDiscoveryAgent`](crate::discovery::AccessPointDiscoveryAgent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Events buffered before the agent waits for the consumer.
    pub channel_capacity: usize,
    /// Report access points that already exist when the agent starts.
    pub probe_existing: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_DISCOVERY_CHANNEL_CAPACITY,
            probe_existing: true,
        }
    }
}

impl DiscoveryConfig {
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn probe_existing(mut self, probe: bool) -> Self {
        self.probe_existing = probe;
        self
    }
}
