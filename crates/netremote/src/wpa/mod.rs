//! hostapd / wpa_supplicant control-socket protocol.
//!
//! Both daemons expose a per-interface Unix datagram socket that accepts
//! ASCII commands and answers with `OK`, `FAIL`, `PONG` or `key=value`
//! lines. Clients that send `ATTACH` additionally receive unsolicited
//! event lines of the form `<level>[IFNAME=<name> ]payload`.
//!
//! ```text
//! WpaCommand ──payload──▶ ControlChannel ──datagram──▶ daemon
//!     │                        │
//!     │ decoder                ◀───────── WpaResponse
//!     ▼
//! ResponseDecoder ── KeyValuePair* ──▶ WpaTypedResponse
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use netremote::wpa::{ControlChannel, WpaCommand, WpaType, WpaTypedResponse};
//!
//! # async fn example() -> netremote::Result<()> {
//! let channel = ControlChannel::new("wlan0", WpaType::Hostapd);
//! let command = WpaCommand::Status;
//! let response = channel.send(&command).await?;
//! if let Some(WpaTypedResponse::Status(status)) = command.decode(&response) {
//!     println!("{:?} on {:?}", status.state, status.frequency);
//! }
//! # Ok(())
//! # }
//! ```

mod channel;
mod command;
mod controller;
mod decoder;
mod event;
mod key_value;
mod listener;
mod response;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use channel::{ControlChannel, ControlConnector, ControlTransport, UnixConnector, UnixTransport};
pub use command::{DecoderKind, WpaCommand};
pub use controller::HostapdController;
pub use decoder::{DecoderState, ResponseDecoder};
pub use event::{EventParser, WpaEvent, WpaEventKind, WpaLogLevel};
pub use key_value::{ExtractMode, KeyValuePair, Presence};
pub use listener::WpaEventListener;
pub use response::{
    HostapdInterfaceState, WpaBssStatus, WpaConfig, WpaProperty, WpaResponse, WpaStatus, WpaSuite,
    WpaTypedResponse,
};

/// Default control socket directory of hostapd.
pub const HOSTAPD_CONTROL_DIR: &str = "/var/run/hostapd";

/// Default control socket directory of wpa_supplicant.
pub const WPA_SUPPLICANT_CONTROL_DIR: &str = "/var/run/wpa_supplicant";

/// Which daemon a control socket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WpaType {
    Hostapd,
    WpaSupplicant,
}

impl WpaType {
    /// The daemon's default control socket directory.
    pub fn default_control_dir(self) -> &'static Path {
        match self {
            Self::Hostapd => Path::new(HOSTAPD_CONTROL_DIR),
            Self::WpaSupplicant => Path::new(WPA_SUPPLICANT_CONTROL_DIR),
        }
    }

    /// The daemon's executable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Hostapd => "hostapd",
            Self::WpaSupplicant => "wpa_supplicant",
        }
    }
}

impl fmt::Display for WpaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
