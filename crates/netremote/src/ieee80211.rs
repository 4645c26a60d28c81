//! Protocol-neutral IEEE 802.11 vocabulary.
//!
//! Both control surfaces map into these types: the nl80211 adapters convert
//! kernel constants, and the hostapd decoders convert configuration strings.
//! Cipher and AKM suites are open sets, so they are modelled as `u32`
//! newtypes with named constants rather than closed enums; any value the
//! kernel or daemon reports round-trips unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The IEEE 802.11 OUI (00-0F-AC) used by standard cipher and AKM suites.
pub const IEEE80211_OUI: u32 = 0x000F_AC;

const fn suite(oui: u32, kind: u8) -> u32 {
    (oui << 8) | kind as u32
}

/// An IEEE 802.11 MAC address.
///
/// Displays as uppercase, colon-separated hex (`00:11:22:AA:BB:CC`); parsing
/// accepts either case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ieee80211MacAddress(pub [u8; 6]);

impl Ieee80211MacAddress {
    /// Length of a MAC address in bytes.
    pub const LEN: usize = 6;

    /// Create a MAC address from its six octets.
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Build a MAC address from a byte slice of exactly six bytes.
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        let octets: [u8; 6] = data.try_into().ok()?;
        Some(Self(octets))
    }

    /// The raw octets.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for Ieee80211MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}

/// Error returned when a MAC address string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid MAC address: {0:?}")]
pub struct ParseMacAddressError(pub String);

impl FromStr for Ieee80211MacAddress {
    type Err = ParseMacAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in octets.iter_mut() {
            let part = parts
                .next()
                .filter(|p| p.len() == 2)
                .ok_or_else(|| ParseMacAddressError(s.to_string()))?;
            *octet =
                u8::from_str_radix(part, 16).map_err(|_| ParseMacAddressError(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(ParseMacAddressError(s.to_string()));
        }
        Ok(Self(octets))
    }
}

impl Serialize for Ieee80211MacAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ieee80211MacAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Security protocol generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ieee80211SecurityProtocol {
    Unknown,
    Wpa,
    Wpa2,
    Wpa3,
}

/// Frequency band a radio operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ieee80211FrequencyBand {
    Unknown,
    TwoPointFourGHz,
    FiveGHz,
    SixGHz,
    SixtyGHz,
}

impl Ieee80211FrequencyBand {
    /// Classify a channel center frequency in MHz.
    pub fn from_frequency_mhz(freq: u32) -> Self {
        match freq {
            2400..=2500 => Self::TwoPointFourGHz,
            5925..=7125 => Self::SixGHz,
            4900..=5924 => Self::FiveGHz,
            57000..=71000 => Self::SixtyGHz,
            _ => Self::Unknown,
        }
    }
}

/// 802.11 physical layer type.
///
/// Variant order is the order PHY types were introduced in the standard;
/// sorted lists of PHY types follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ieee80211PhyType {
    Unknown,
    B,
    G,
    N,
    A,
    AC,
    AD,
    AX,
    BE,
}

impl fmt::Display for Ieee80211PhyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::B => "b",
            Self::G => "g",
            Self::N => "n",
            Self::A => "a",
            Self::AC => "ac",
            Self::AD => "ad",
            Self::AX => "ax",
            Self::BE => "be",
        };
        f.write_str(name)
    }
}

/// Cipher suite selector (OUI << 8 | suite type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ieee80211CipherSuite(pub u32);

impl Ieee80211CipherSuite {
    pub const USE_GROUP: Self = Self(suite(IEEE80211_OUI, 0));
    pub const WEP40: Self = Self(suite(IEEE80211_OUI, 1));
    pub const TKIP: Self = Self(suite(IEEE80211_OUI, 2));
    pub const CCMP_128: Self = Self(suite(IEEE80211_OUI, 4));
    pub const WEP104: Self = Self(suite(IEEE80211_OUI, 5));
    pub const BIP_CMAC_128: Self = Self(suite(IEEE80211_OUI, 6));
    pub const GROUP_ADDRESSED_TRAFFIC_NOT_ALLOWED: Self = Self(suite(IEEE80211_OUI, 7));
    pub const GCMP_128: Self = Self(suite(IEEE80211_OUI, 8));
    pub const GCMP_256: Self = Self(suite(IEEE80211_OUI, 9));
    pub const CCMP_256: Self = Self(suite(IEEE80211_OUI, 10));
    pub const BIP_GMAC_128: Self = Self(suite(IEEE80211_OUI, 11));
    pub const BIP_GMAC_256: Self = Self(suite(IEEE80211_OUI, 12));
    pub const BIP_CMAC_256: Self = Self(suite(IEEE80211_OUI, 13));

    /// Raw selector value.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Organizationally unique identifier of this suite.
    pub const fn oui(self) -> u32 {
        self.0 >> 8
    }

    /// Suite type within the OUI.
    pub const fn kind(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    /// Well-known name for standard suites.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::USE_GROUP => "use-group",
            Self::WEP40 => "WEP-40",
            Self::TKIP => "TKIP",
            Self::CCMP_128 => "CCMP",
            Self::WEP104 => "WEP-104",
            Self::BIP_CMAC_128 => "BIP-CMAC-128",
            Self::GROUP_ADDRESSED_TRAFFIC_NOT_ALLOWED => "group-addressed-not-allowed",
            Self::GCMP_128 => "GCMP",
            Self::GCMP_256 => "GCMP-256",
            Self::CCMP_256 => "CCMP-256",
            Self::BIP_GMAC_128 => "BIP-GMAC-128",
            Self::BIP_GMAC_256 => "BIP-GMAC-256",
            Self::BIP_CMAC_256 => "BIP-CMAC-256",
            _ => return None,
        };
        Some(name)
    }

    /// Map a hostapd cipher name (`CCMP`, `GCMP-256`, ...) to a suite.
    pub fn from_hostapd_name(name: &str) -> Option<Self> {
        let suite = match name {
            "WEP40" | "WEP-40" => Self::WEP40,
            "WEP104" | "WEP-104" => Self::WEP104,
            "TKIP" => Self::TKIP,
            "CCMP" | "CCMP-128" => Self::CCMP_128,
            "CCMP-256" => Self::CCMP_256,
            "GCMP" | "GCMP-128" => Self::GCMP_128,
            "GCMP-256" => Self::GCMP_256,
            "BIP" | "AES-128-CMAC" | "BIP-CMAC-128" => Self::BIP_CMAC_128,
            "BIP-CMAC-256" => Self::BIP_CMAC_256,
            "BIP-GMAC-128" => Self::BIP_GMAC_128,
            "BIP-GMAC-256" => Self::BIP_GMAC_256,
            _ => return None,
        };
        Some(suite)
    }
}

impl From<u32> for Ieee80211CipherSuite {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Ieee80211CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:06X}-{}", self.oui(), self.kind()),
        }
    }
}

/// Authentication and key management suite selector (OUI << 8 | suite type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ieee80211AkmSuite(pub u32);

impl Ieee80211AkmSuite {
    pub const IEEE8021X: Self = Self(suite(IEEE80211_OUI, 1));
    pub const PSK: Self = Self(suite(IEEE80211_OUI, 2));
    pub const FT_8021X: Self = Self(suite(IEEE80211_OUI, 3));
    pub const FT_PSK: Self = Self(suite(IEEE80211_OUI, 4));
    pub const IEEE8021X_SHA256: Self = Self(suite(IEEE80211_OUI, 5));
    pub const PSK_SHA256: Self = Self(suite(IEEE80211_OUI, 6));
    pub const TDLS: Self = Self(suite(IEEE80211_OUI, 7));
    pub const SAE: Self = Self(suite(IEEE80211_OUI, 8));
    pub const FT_SAE: Self = Self(suite(IEEE80211_OUI, 9));
    pub const AP_PEER_KEY: Self = Self(suite(IEEE80211_OUI, 10));
    pub const IEEE8021X_SUITE_B: Self = Self(suite(IEEE80211_OUI, 11));
    pub const IEEE8021X_SUITE_B_192: Self = Self(suite(IEEE80211_OUI, 12));
    pub const FT_8021X_SHA384: Self = Self(suite(IEEE80211_OUI, 13));
    pub const FILS_SHA256: Self = Self(suite(IEEE80211_OUI, 14));
    pub const FILS_SHA384: Self = Self(suite(IEEE80211_OUI, 15));
    pub const FT_FILS_SHA256: Self = Self(suite(IEEE80211_OUI, 16));
    pub const FT_FILS_SHA384: Self = Self(suite(IEEE80211_OUI, 17));
    pub const OWE: Self = Self(suite(IEEE80211_OUI, 18));
    pub const FT_PSK_SHA384: Self = Self(suite(IEEE80211_OUI, 19));
    pub const PSK_SHA384: Self = Self(suite(IEEE80211_OUI, 20));
    pub const SAE_EXT_KEY: Self = Self(suite(IEEE80211_OUI, 24));
    pub const FT_SAE_EXT_KEY: Self = Self(suite(IEEE80211_OUI, 25));

    /// Raw selector value.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Organizationally unique identifier of this suite.
    pub const fn oui(self) -> u32 {
        self.0 >> 8
    }

    /// Suite type within the OUI.
    pub const fn kind(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    /// Map a hostapd `key_mgmt` token (`WPA-PSK`, `SAE`, ...) to a suite.
    pub fn from_hostapd_name(name: &str) -> Option<Self> {
        let suite = match name {
            "WPA-EAP" => Self::IEEE8021X,
            "WPA-PSK" => Self::PSK,
            "FT-EAP" => Self::FT_8021X,
            "FT-PSK" => Self::FT_PSK,
            "WPA-EAP-SHA256" => Self::IEEE8021X_SHA256,
            "WPA-PSK-SHA256" => Self::PSK_SHA256,
            "SAE" => Self::SAE,
            "FT-SAE" => Self::FT_SAE,
            "WPA-EAP-SUITE-B" => Self::IEEE8021X_SUITE_B,
            "WPA-EAP-SUITE-B-192" => Self::IEEE8021X_SUITE_B_192,
            "FT-EAP-SHA384" => Self::FT_8021X_SHA384,
            "FILS-SHA256" => Self::FILS_SHA256,
            "FILS-SHA384" => Self::FILS_SHA384,
            "FT-FILS-SHA256" => Self::FT_FILS_SHA256,
            "FT-FILS-SHA384" => Self::FT_FILS_SHA384,
            "OWE" => Self::OWE,
            "SAE-EXT-KEY" => Self::SAE_EXT_KEY,
            "FT-SAE-EXT-KEY" => Self::FT_SAE_EXT_KEY,
            _ => return None,
        };
        Some(suite)
    }

    /// Security protocol generation implied by this AKM, if standard.
    pub fn security_protocol(self) -> Ieee80211SecurityProtocol {
        match self {
            Self::SAE
            | Self::FT_SAE
            | Self::SAE_EXT_KEY
            | Self::FT_SAE_EXT_KEY
            | Self::OWE
            | Self::IEEE8021X_SUITE_B_192 => Ieee80211SecurityProtocol::Wpa3,
            s if s.oui() == IEEE80211_OUI => Ieee80211SecurityProtocol::Wpa2,
            _ => Ieee80211SecurityProtocol::Unknown,
        }
    }
}

impl From<u32> for Ieee80211AkmSuite {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Ieee80211AkmSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}-{}", self.oui(), self.kind())
    }
}
