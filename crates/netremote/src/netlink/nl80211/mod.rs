//! nl80211 wireless configuration via Generic Netlink.
//!
//! Adapters in this module decode raw nl80211 attribute trees into typed
//! value objects:
//!
//! - [`Nl80211Wiphy`] - a physical radio with its bands and capabilities
//! - [`Nl80211WiphyBand`] / [`WiphyBandFrequency`] - per-band channel data
//! - [`Nl80211Interface`] - a virtual interface bound to a wiphy
//!
//! The [`convert`] module maps them onto the protocol-neutral `Ieee80211*`
//! vocabulary. Family and multicast group ids are resolved once per process
//! by [`Nl80211ProtocolState`].
//!
//! # Example
//!
//! ```rust,no_run
//! use netremote::netlink::nl80211::{Nl80211Connection, Nl80211Wiphy};
//!
//! # async fn example() -> netremote::Result<()> {
//! let conn = Nl80211Connection::new().await?;
//! for iface in conn.interfaces().await? {
//!     let wiphy = Nl80211Wiphy::from_index(&conn, iface.wiphy_index).await?;
//!     println!("{} on {}: {:?}", iface.name, wiphy.name, wiphy.phy_types());
//! }
//! # Ok(())
//! # }
//! ```

mod band;
mod connection;
pub mod convert;
mod interface;
mod state;
mod wiphy;

pub use band::{Nl80211WiphyBand, WiphyBandFrequency};
pub use connection::Nl80211Connection;
pub use interface::{Nl80211Interface, Nl80211InterfaceType};
pub use state::Nl80211ProtocolState;
pub use wiphy::Nl80211Wiphy;

/// nl80211 Generic Netlink family name.
pub const NL80211_GENL_NAME: &str = "nl80211";

/// nl80211 Generic Netlink version.
pub const NL80211_GENL_VERSION: u8 = 0;

/// Multicast groups exposed by the nl80211 family.
pub const NL80211_MULTICAST_GROUPS: &[&str] = &[
    NL80211_MULTICAST_GROUP_CONFIG,
    NL80211_MULTICAST_GROUP_SCAN,
    NL80211_MULTICAST_GROUP_REG,
    NL80211_MULTICAST_GROUP_MLME,
    NL80211_MULTICAST_GROUP_VENDOR,
];

pub const NL80211_MULTICAST_GROUP_CONFIG: &str = "config";
pub const NL80211_MULTICAST_GROUP_SCAN: &str = "scan";
pub const NL80211_MULTICAST_GROUP_REG: &str = "regulatory";
pub const NL80211_MULTICAST_GROUP_MLME: &str = "mlme";
pub const NL80211_MULTICAST_GROUP_VENDOR: &str = "vendor";

/// nl80211 commands used by this crate.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211Cmd {
    Unspec = 0,
    GetWiphy = 1,
    SetWiphy = 2,
    NewWiphy = 3,
    DelWiphy = 4,
    GetInterface = 5,
    SetInterface = 6,
    NewInterface = 7,
    DelInterface = 8,
}

impl Nl80211Cmd {
    /// Convert a raw command number.
    pub fn from_u8(cmd: u8) -> Option<Self> {
        Some(match cmd {
            0 => Self::Unspec,
            1 => Self::GetWiphy,
            2 => Self::SetWiphy,
            3 => Self::NewWiphy,
            4 => Self::DelWiphy,
            5 => Self::GetInterface,
            6 => Self::SetInterface,
            7 => Self::NewInterface,
            8 => Self::DelInterface,
            _ => return None,
        })
    }
}

/// Top-level nl80211 attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211Attr {
    Unspec = 0,
    Wiphy = 1,
    WiphyName = 2,
    Ifindex = 3,
    Ifname = 4,
    Iftype = 5,
    Mac = 6,
    WiphyBands = 22,
    SupportedIftypes = 32,
    WiphyFreq = 38,
    Generation = 46,
    Ssid = 52,
    CipherSuites = 57,
    WpaVersions = 75,
    AkmSuites = 76,
    WiphyTxPowerLevel = 98,
    Wdev = 153,
    ChannelWidth = 159,
    SplitWiphyDump = 174,
}

/// Table size for top-level nl80211 attributes.
///
/// Large enough for every attribute current kernels emit; newer attributes
/// land past the end and are ignored.
pub(crate) const NL80211_ATTR_TABLE: usize = 0x150;

/// Per-band attributes (`NL80211_BAND_ATTR_*`).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211BandAttr {
    Invalid = 0,
    Freqs = 1,
    Rates = 2,
    HtMcsSet = 3,
    HtCapa = 4,
    HtAmpduFactor = 5,
    HtAmpduDensity = 6,
    VhtMcsSet = 7,
    VhtCapa = 8,
    IftypeData = 9,
}

pub(crate) const NL80211_BAND_ATTR_TABLE: usize = 16;

/// Per-frequency attributes (`NL80211_FREQUENCY_ATTR_*`).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211FrequencyAttr {
    Invalid = 0,
    Freq = 1,
    Disabled = 2,
    NoIr = 3,
    NoIbss = 4,
    Radar = 5,
    MaxTxPower = 6,
    DfsState = 7,
    Offset = 20,
}

pub(crate) const NL80211_FREQUENCY_ATTR_TABLE: usize = 40;

/// Per-bitrate attributes (`NL80211_BITRATE_ATTR_*`).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nl80211BitrateAttr {
    Invalid = 0,
    Rate = 1,
    ShortPreamble2Ghz = 2,
}

pub(crate) const NL80211_BITRATE_ATTR_TABLE: usize = 4;

/// Frequency band identifiers (`enum nl80211_band`).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum Nl80211Band {
    TwoGhz = 0,
    FiveGhz = 1,
    SixtyGhz = 2,
    SixGhz = 3,
    S1Ghz = 4,
    Lc = 5,
}

impl Nl80211Band {
    /// Convert a raw band id.
    pub fn from_u16(band: u16) -> Option<Self> {
        Some(match band {
            0 => Self::TwoGhz,
            1 => Self::FiveGhz,
            2 => Self::SixtyGhz,
            3 => Self::SixGhz,
            4 => Self::S1Ghz,
            5 => Self::Lc,
            _ => return None,
        })
    }
}

/// WPA version bits (`NL80211_WPA_VERSION_*`).
pub mod wpa_version {
    pub const WPA1: u32 = 1 << 0;
    pub const WPA2: u32 = 1 << 1;
    pub const WPA3: u32 = 1 << 2;
}
