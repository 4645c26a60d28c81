//! Mapping from nl80211 values onto the `Ieee80211*` vocabulary.

use super::{Nl80211Band, Nl80211WiphyBand, wpa_version};
use crate::ieee80211::{
    Ieee80211AkmSuite, Ieee80211CipherSuite, Ieee80211FrequencyBand, Ieee80211PhyType,
    Ieee80211SecurityProtocol,
};

impl From<Nl80211Band> for Ieee80211FrequencyBand {
    fn from(band: Nl80211Band) -> Self {
        match band {
            Nl80211Band::TwoGhz => Self::TwoPointFourGHz,
            Nl80211Band::FiveGhz => Self::FiveGHz,
            Nl80211Band::SixGhz => Self::SixGHz,
            Nl80211Band::SixtyGhz => Self::SixtyGHz,
            Nl80211Band::S1Ghz | Nl80211Band::Lc => Self::Unknown,
        }
    }
}

/// Map an `NL80211_ATTR_WPA_VERSIONS` bitmask to security protocols.
///
/// Protocols are returned in ascending order. Unknown bits are ignored.
pub fn security_protocols(wpa_versions: u32) -> Vec<Ieee80211SecurityProtocol> {
    [
        (wpa_version::WPA1, Ieee80211SecurityProtocol::Wpa),
        (wpa_version::WPA2, Ieee80211SecurityProtocol::Wpa2),
        (wpa_version::WPA3, Ieee80211SecurityProtocol::Wpa3),
    ]
    .into_iter()
    .filter(|(bit, _)| wpa_versions & bit != 0)
    .map(|(_, protocol)| protocol)
    .collect()
}

/// Map a security protocol back to its WPA version bit.
pub fn wpa_version_bit(protocol: Ieee80211SecurityProtocol) -> u32 {
    match protocol {
        Ieee80211SecurityProtocol::Wpa => wpa_version::WPA1,
        Ieee80211SecurityProtocol::Wpa2 => wpa_version::WPA2,
        Ieee80211SecurityProtocol::Wpa3 => wpa_version::WPA3,
        Ieee80211SecurityProtocol::Unknown => 0,
    }
}

/// Reinterpret raw `NL80211_ATTR_CIPHER_SUITES` values.
pub fn cipher_suites(raw: &[u32]) -> Vec<Ieee80211CipherSuite> {
    raw.iter().copied().map(Ieee80211CipherSuite::from).collect()
}

/// Reinterpret raw `NL80211_ATTR_AKM_SUITES` values.
pub fn akm_suites(raw: &[u32]) -> Vec<Ieee80211AkmSuite> {
    raw.iter().copied().map(Ieee80211AkmSuite::from).collect()
}

/// PHY types supported across a set of bands.
///
/// B and G are always present; N is added when any band reports HT
/// capabilities and AC when any band reports VHT capabilities. The result is
/// sorted and free of duplicates.
pub fn phy_types<'a>(bands: impl IntoIterator<Item = &'a Nl80211WiphyBand>) -> Vec<Ieee80211PhyType> {
    let mut types = vec![Ieee80211PhyType::B, Ieee80211PhyType::G];
    for band in bands {
        if band.ht_capabilities != 0 {
            types.push(Ieee80211PhyType::N);
        }
        if band.vht_capabilities != 0 {
            types.push(Ieee80211PhyType::AC);
        }
    }
    types.sort();
    types.dedup();
    types
}
