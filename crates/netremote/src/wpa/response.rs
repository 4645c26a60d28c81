//! Raw and typed control-socket replies.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::ieee80211::{
    Ieee80211AkmSuite, Ieee80211CipherSuite, Ieee80211MacAddress, Ieee80211SecurityProtocol,
};

/// A reply exactly as received from the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WpaResponse {
    payload: String,
}

impl WpaResponse {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The reply text.
    pub fn as_str(&self) -> &str {
        &self.payload
    }

    pub fn into_string(self) -> String {
        self.payload
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Whether the reply starts with `OK`.
    pub fn is_ok(&self) -> bool {
        self.payload.starts_with("OK")
    }

    /// Whether the reply starts with `FAIL`.
    pub fn is_fail(&self) -> bool {
        self.payload.starts_with("FAIL")
    }

    /// Whether the reply starts with `PONG`.
    pub fn is_pong(&self) -> bool {
        self.payload.starts_with("PONG")
    }

    /// Whether the reply is an unsolicited event line (`<N>...`).
    pub fn is_event(&self) -> bool {
        self.payload.starts_with('<')
    }
}

impl fmt::Display for WpaResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.payload.trim_end())
    }
}

/// A decoded reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum WpaTypedResponse {
    /// Reply to a command without a structured decoder.
    Raw(WpaResponse),
    Status(WpaStatus),
    Config(WpaConfig),
    Property(WpaProperty),
}

/// hostapd interface state as reported by `STATUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HostapdInterfaceState {
    Uninitialized,
    Disabled,
    CountryUpdate,
    Acs,
    HtScan,
    Dfs,
    NoIr,
    Enabled,
    Unknown,
}

impl FromStr for HostapdInterfaceState {
    type Err = std::convert::Infallible;

    /// Parse a state name, ignoring case. Unrecognized names map to
    /// `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let state = match s.trim().to_ascii_uppercase().as_str() {
            "UNINITIALIZED" => Self::Uninitialized,
            "DISABLED" => Self::Disabled,
            "COUNTRY_UPDATE" => Self::CountryUpdate,
            "ACS" => Self::Acs,
            "HT_SCAN" => Self::HtScan,
            "DFS" => Self::Dfs,
            "NO_IR" => Self::NoIr,
            "ENABLED" => Self::Enabled,
            _ => Self::Unknown,
        };
        Ok(state)
    }
}

impl HostapdInterfaceState {
    /// Whether the interface is beaconing.
    pub fn is_operational(self) -> bool {
        self == Self::Enabled
    }
}

/// Per-BSS entry of a `STATUS` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WpaBssStatus {
    /// Interface name of the BSS.
    pub interface: String,
    pub bssid: Option<Ieee80211MacAddress>,
    pub ssid: Option<String>,
    /// Number of associated stations.
    pub num_stations: Option<u32>,
}

/// Decoded `STATUS` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WpaStatus {
    pub state: HostapdInterfaceState,
    /// Wiphy name (`phy0`).
    pub phy: Option<String>,
    /// Operating frequency in MHz.
    pub frequency: Option<u32>,
    pub channel: Option<u32>,
    pub ieee80211n: bool,
    pub ieee80211ac: bool,
    pub ieee80211ax: bool,
    pub ieee80211be: bool,
    pub disable_11n: bool,
    pub disable_11ac: bool,
    pub disable_11ax: bool,
    /// Beacon interval in TUs.
    pub beacon_interval: Option<u32>,
    pub dtim_period: Option<u32>,
    pub num_sta_non_erp: Option<u32>,
    pub bss: Vec<WpaBssStatus>,
}

/// A value that is either a known suite or a name hostapd reported verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WpaSuite<T> {
    Known(T),
    Unknown(String),
}

impl<T> WpaSuite<T> {
    /// The known value, if any.
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(v) => Some(v),
            Self::Unknown(_) => None,
        }
    }
}

/// Decoded `GET_CONFIG` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WpaConfig {
    pub bssid: Ieee80211MacAddress,
    pub ssid: String,
    pub wps_state: Option<String>,
    /// Security protocols enabled by the `wpa=` flags and key management.
    pub security_protocols: Vec<Ieee80211SecurityProtocol>,
    pub key_management: Vec<WpaSuite<Ieee80211AkmSuite>>,
    pub group_cipher: Option<WpaSuite<Ieee80211CipherSuite>>,
    pub rsn_pairwise_ciphers: Vec<WpaSuite<Ieee80211CipherSuite>>,
    pub wpa_pairwise_ciphers: Vec<WpaSuite<Ieee80211CipherSuite>>,
}

/// Decoded `GET <property>` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WpaProperty {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_and_fail_prefixes() {
        let ok = WpaResponse::new("OK\nextra");
        assert!(ok.is_ok());
        assert!(!ok.is_fail());

        let fail = WpaResponse::new("FAIL\n");
        assert!(fail.is_fail());
        assert!(!fail.is_ok());

        let other = WpaResponse::new("state=ENABLED\n");
        assert!(!other.is_ok());
        assert!(!other.is_fail());
        assert!(!WpaResponse::new("").is_ok());
    }

    #[test]
    fn test_pong_and_event() {
        assert!(WpaResponse::new("PONG\n").is_pong());
        assert!(WpaResponse::new("<3>AP-ENABLED").is_event());
        assert!(!WpaResponse::new("PONG\n").is_event());
    }

    #[test]
    fn test_state_parse_is_case_insensitive() {
        assert_eq!(
            "ENABLED".parse::<HostapdInterfaceState>().unwrap(),
            HostapdInterfaceState::Enabled
        );
        assert_eq!(
            "country_update".parse::<HostapdInterfaceState>().unwrap(),
            HostapdInterfaceState::CountryUpdate
        );
        assert_eq!(
            "BOGUS".parse::<HostapdInterfaceState>().unwrap(),
            HostapdInterfaceState::Unknown
        );
        assert!(HostapdInterfaceState::Enabled.is_operational());
        assert!(!HostapdInterfaceState::Dfs.is_operational());
    }

    #[test]
    fn test_display_trims_trailing_newline() {
        assert_eq!(WpaResponse::new("PONG\n").to_string(), "PONG");
    }
}
