//! nl80211 virtual interfaces.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::{NL80211_ATTR_TABLE, Nl80211Attr, Nl80211Connection};
use crate::error::Result;
use crate::ieee80211::Ieee80211MacAddress;
use crate::netlink::attr::AttrTable;

/// Interface operating mode (`enum nl80211_iftype`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Nl80211InterfaceType {
    Unspecified,
    Adhoc,
    Station,
    AccessPoint,
    ApVlan,
    Wds,
    Monitor,
    MeshPoint,
    P2pClient,
    P2pGo,
    P2pDevice,
    Ocb,
    Nan,
    Unknown(u32),
}

impl From<u32> for Nl80211InterfaceType {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Unspecified,
            1 => Self::Adhoc,
            2 => Self::Station,
            3 => Self::AccessPoint,
            4 => Self::ApVlan,
            5 => Self::Wds,
            6 => Self::Monitor,
            7 => Self::MeshPoint,
            8 => Self::P2pClient,
            9 => Self::P2pGo,
            10 => Self::P2pDevice,
            11 => Self::Ocb,
            12 => Self::Nan,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for Nl80211InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "unspecified"),
            Self::Adhoc => write!(f, "IBSS"),
            Self::Station => write!(f, "managed"),
            Self::AccessPoint => write!(f, "AP"),
            Self::ApVlan => write!(f, "AP/VLAN"),
            Self::Wds => write!(f, "WDS"),
            Self::Monitor => write!(f, "monitor"),
            Self::MeshPoint => write!(f, "mesh point"),
            Self::P2pClient => write!(f, "P2P-client"),
            Self::P2pGo => write!(f, "P2P-GO"),
            Self::P2pDevice => write!(f, "P2P-device"),
            Self::Ocb => write!(f, "outside context of a BSS"),
            Self::Nan => write!(f, "NAN"),
            Self::Unknown(v) => write!(f, "unknown ({})", v),
        }
    }
}

/// A wireless network interface as reported by nl80211.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nl80211Interface {
    /// Interface name.
    pub name: String,
    /// Kernel interface index.
    pub index: u32,
    /// Index of the wiphy this interface belongs to.
    pub wiphy_index: u32,
    /// Operating mode.
    pub interface_type: Nl80211InterfaceType,
    /// Wireless device id.
    pub wdev: Option<u64>,
    /// Interface MAC address.
    pub mac: Option<Ieee80211MacAddress>,
    /// SSID the interface is operating on, if any.
    pub ssid: Option<String>,
    /// Operating frequency in MHz.
    pub frequency: Option<u32>,
    /// Transmit power in mBm.
    pub tx_power: Option<u32>,
}

impl Nl80211Interface {
    /// Decode an interface from the attributes of a `NEW_INTERFACE` message.
    ///
    /// Returns `None` if the interface index, name or wiphy index is missing.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let attrs = AttrTable::<NL80211_ATTR_TABLE>::parse(data);

        let (Some(index), Some(name), Some(wiphy_index)) = (
            attrs.u32(Nl80211Attr::Ifindex as u16),
            attrs.string(Nl80211Attr::Ifname as u16),
            attrs.u32(Nl80211Attr::Wiphy as u16),
        ) else {
            warn!("nl80211 interface without ifindex, ifname or wiphy, skipping");
            return None;
        };

        let interface_type = attrs
            .u32(Nl80211Attr::Iftype as u16)
            .map(Nl80211InterfaceType::from)
            .unwrap_or(Nl80211InterfaceType::Unspecified);

        let ssid = attrs
            .get(Nl80211Attr::Ssid as u16)
            .map(|raw| String::from_utf8_lossy(raw).into_owned());

        Some(Self {
            name,
            index,
            wiphy_index,
            interface_type,
            wdev: attrs.u64(Nl80211Attr::Wdev as u16),
            mac: attrs
                .get(Nl80211Attr::Mac as u16)
                .and_then(Ieee80211MacAddress::from_slice),
            ssid,
            frequency: attrs.u32(Nl80211Attr::WiphyFreq as u16),
            tx_power: attrs.u32(Nl80211Attr::WiphyTxPowerLevel as u16),
        })
    }

    /// List every wireless interface on the system.
    pub async fn enumerate(conn: &Nl80211Connection) -> Result<Vec<Self>> {
        conn.interfaces().await
    }

    /// Whether the interface is operating as an access point.
    pub fn is_access_point(&self) -> bool {
        self.interface_type == Nl80211InterfaceType::AccessPoint
    }
}
