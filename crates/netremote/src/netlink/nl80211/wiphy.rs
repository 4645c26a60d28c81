//! nl80211 physical radios (wiphys).

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use super::band::parse_bands;
use super::convert;
use super::{
    NL80211_ATTR_TABLE, Nl80211Attr, Nl80211Band, Nl80211Connection, Nl80211InterfaceType,
    Nl80211WiphyBand,
};
use crate::error::Result;
use crate::ieee80211::{
    Ieee80211AkmSuite, Ieee80211CipherSuite, Ieee80211FrequencyBand, Ieee80211PhyType,
    Ieee80211SecurityProtocol,
};
use crate::netlink::attr::{AttrTable, get};

/// A wireless physical device and its capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nl80211Wiphy {
    /// Wiphy index (the `N` in `phyN`).
    pub index: u32,
    /// Wiphy name.
    pub name: String,
    /// Supported bands keyed by band id.
    pub bands: BTreeMap<Nl80211Band, Nl80211WiphyBand>,
    /// Supported cipher suites.
    pub cipher_suites: Vec<Ieee80211CipherSuite>,
    /// Supported AKM suites. Older kernels do not report these.
    pub akm_suites: Vec<Ieee80211AkmSuite>,
    /// Interface types the wiphy can host.
    pub supported_interface_types: Vec<Nl80211InterfaceType>,
    /// Bitmask of supported WPA versions, when reported.
    pub wpa_versions: Option<u32>,
    /// Configuration generation counter.
    pub generation: Option<u32>,
}

impl Nl80211Wiphy {
    /// Decode a wiphy from the attributes of a `NEW_WIPHY` message.
    ///
    /// Returns `None` if the wiphy index is missing. With split dumps one
    /// message may carry only a subset of the attributes; combine the parts
    /// with [`merge`](Self::merge).
    pub fn parse(data: &[u8]) -> Option<Self> {
        let attrs = AttrTable::<NL80211_ATTR_TABLE>::parse(data);

        let Some(index) = attrs.u32(Nl80211Attr::Wiphy as u16) else {
            warn!("nl80211 wiphy message without NL80211_ATTR_WIPHY, skipping");
            return None;
        };

        let bands = attrs
            .get(Nl80211Attr::WiphyBands as u16)
            .map(parse_bands)
            .unwrap_or_default()
            .into_iter()
            .collect();

        let cipher_suites = attrs
            .get(Nl80211Attr::CipherSuites as u16)
            .map(|raw| convert::cipher_suites(&get::u32_array(raw)))
            .unwrap_or_default();

        let akm_suites = attrs
            .get(Nl80211Attr::AkmSuites as u16)
            .map(|raw| convert::akm_suites(&get::u32_array(raw)))
            .unwrap_or_default();

        // Each child is a flag attribute whose type is the iftype.
        let supported_interface_types = attrs
            .nested(Nl80211Attr::SupportedIftypes as u16)
            .map(|(kind, _)| Nl80211InterfaceType::from(u32::from(kind)))
            .collect();

        Some(Self {
            index,
            name: attrs.string(Nl80211Attr::WiphyName as u16).unwrap_or_default(),
            bands,
            cipher_suites,
            akm_suites,
            supported_interface_types,
            wpa_versions: attrs.u32(Nl80211Attr::WpaVersions as u16),
            generation: attrs.u32(Nl80211Attr::Generation as u16),
        })
    }

    /// Fold a later split-dump part for the same wiphy into this one.
    ///
    /// Band data and lists are concatenated; scalar fields keep the first
    /// value seen.
    pub fn merge(&mut self, other: Self) {
        if self.name.is_empty() {
            self.name = other.name;
        }
        for (id, band) in other.bands {
            match self.bands.get_mut(&id) {
                Some(existing) => existing.merge(band),
                None => {
                    self.bands.insert(id, band);
                }
            }
        }
        self.cipher_suites.extend(other.cipher_suites);
        self.akm_suites.extend(other.akm_suites);
        self.supported_interface_types
            .extend(other.supported_interface_types);
        self.wpa_versions = self.wpa_versions.or(other.wpa_versions);
        self.generation = self.generation.or(other.generation);
    }

    /// Fetch one wiphy by index.
    pub async fn from_index(conn: &Nl80211Connection, index: u32) -> Result<Self> {
        conn.wiphy(index).await
    }

    /// PHY types this wiphy supports.
    ///
    /// Always contains B and G; N and AC are derived from the HT and VHT
    /// capabilities of the bands.
    pub fn phy_types(&self) -> Vec<Ieee80211PhyType> {
        convert::phy_types(self.bands.values())
    }

    /// Frequency bands this wiphy supports.
    pub fn frequency_bands(&self) -> Vec<Ieee80211FrequencyBand> {
        self.bands
            .keys()
            .map(|&band| Ieee80211FrequencyBand::from(band))
            .filter(|band| *band != Ieee80211FrequencyBand::Unknown)
            .collect()
    }

    /// Security protocols this wiphy supports.
    ///
    /// Uses the WPA versions bitmask when present, otherwise derives the
    /// protocols from the AKM suites.
    pub fn security_protocols(&self) -> Vec<Ieee80211SecurityProtocol> {
        if let Some(versions) = self.wpa_versions {
            return convert::security_protocols(versions);
        }

        let mut protocols: Vec<_> = self
            .akm_suites
            .iter()
            .map(|akm| akm.security_protocol())
            .filter(|p| *p != Ieee80211SecurityProtocol::Unknown)
            .collect();
        protocols.sort();
        protocols.dedup();
        protocols
    }

    /// Whether the wiphy can host an access-point interface.
    pub fn supports_ap(&self) -> bool {
        self.supported_interface_types
            .contains(&Nl80211InterfaceType::AccessPoint)
    }
}

/// Merge split-dump parts into one wiphy per index, in first-seen order.
pub(crate) fn merge_parts(parts: impl IntoIterator<Item = Nl80211Wiphy>) -> Vec<Nl80211Wiphy> {
    let mut merged: Vec<Nl80211Wiphy> = Vec::new();
    for part in parts {
        match merged.iter_mut().find(|w| w.index == part.index) {
            Some(existing) => existing.merge(part),
            None => merged.push(part),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::{NLA_F_NESTED, NlAttr, nla_align};
    use crate::netlink::nl80211::{Nl80211BandAttr, Nl80211FrequencyAttr};

    fn attr(kind: u16, payload: &[u8]) -> Vec<u8> {
        let mut buf = NlAttr::new(kind, payload.len()).as_bytes().to_vec();
        buf.extend_from_slice(payload);
        buf.resize(nla_align(buf.len()), 0);
        buf
    }

    fn nest(kind: u16, children: &[Vec<u8>]) -> Vec<u8> {
        attr(kind | NLA_F_NESTED, &children.concat())
    }

    fn band(id: u16, mhz: u32, ht: u16, vht: u32) -> Vec<u8> {
        let freq = nest(
            0,
            &[attr(Nl80211FrequencyAttr::Freq as u16, &mhz.to_ne_bytes())],
        );
        nest(
            id,
            &[
                nest(Nl80211BandAttr::Freqs as u16, &[freq]),
                attr(Nl80211BandAttr::HtCapa as u16, &ht.to_ne_bytes()),
                attr(Nl80211BandAttr::VhtCapa as u16, &vht.to_ne_bytes()),
            ],
        )
    }

    fn header(index: u32) -> Vec<u8> {
        attr(Nl80211Attr::Wiphy as u16, &index.to_ne_bytes())
    }

    fn full_wiphy() -> Vec<u8> {
        let ciphers: Vec<u8> = [0x000F_AC04u32, 0x000F_AC02]
            .iter()
            .flat_map(|c| c.to_ne_bytes())
            .collect();
        [
            header(0),
            attr(Nl80211Attr::WiphyName as u16, b"phy0\0"),
            attr(Nl80211Attr::Generation as u16, &4u32.to_ne_bytes()),
            attr(Nl80211Attr::CipherSuites as u16, &ciphers),
            nest(
                Nl80211Attr::SupportedIftypes as u16,
                &[attr(2, &[]), attr(3, &[]), attr(6, &[])],
            ),
            nest(
                Nl80211Attr::WiphyBands as u16,
                &[band(0, 2412, 0x1ce, 0), band(1, 5180, 0x1ef, 0x3380_0032)],
            ),
        ]
        .concat()
    }

    #[test]
    fn test_parse_wiphy() {
        let wiphy = Nl80211Wiphy::parse(&full_wiphy()).unwrap();
        assert_eq!(wiphy.index, 0);
        assert_eq!(wiphy.name, "phy0");
        assert_eq!(wiphy.generation, Some(4));
        assert_eq!(wiphy.bands.len(), 2);
        assert_eq!(
            wiphy.cipher_suites,
            vec![Ieee80211CipherSuite::CCMP_128, Ieee80211CipherSuite::TKIP]
        );
        assert!(wiphy.supports_ap());
        assert_eq!(
            wiphy.frequency_bands(),
            vec![
                Ieee80211FrequencyBand::TwoPointFourGHz,
                Ieee80211FrequencyBand::FiveGHz
            ]
        );
    }

    #[test]
    fn test_parse_requires_index() {
        let data = attr(Nl80211Attr::WiphyName as u16, b"phy0\0");
        assert!(Nl80211Wiphy::parse(&data).is_none());
    }

    #[test]
    fn test_phy_types_from_capabilities() {
        let wiphy = Nl80211Wiphy::parse(&full_wiphy()).unwrap();
        assert_eq!(
            wiphy.phy_types(),
            vec![
                Ieee80211PhyType::B,
                Ieee80211PhyType::G,
                Ieee80211PhyType::N,
                Ieee80211PhyType::AC,
            ]
        );

        let bare = Nl80211Wiphy::parse(&header(1)).unwrap();
        assert_eq!(bare.phy_types(), vec![Ieee80211PhyType::B, Ieee80211PhyType::G]);
        assert!(!bare.supports_ap());
    }

    #[test]
    fn test_merge_split_dump_parts() {
        let first = [
            header(0),
            attr(Nl80211Attr::WiphyName as u16, b"phy0\0"),
            nest(Nl80211Attr::WiphyBands as u16, &[band(0, 2412, 0, 0)]),
        ]
        .concat();
        let second = [
            header(0),
            nest(Nl80211Attr::WiphyBands as u16, &[band(0, 2417, 0x1ce, 0)]),
        ]
        .concat();
        let third = [
            header(0),
            nest(Nl80211Attr::WiphyBands as u16, &[band(1, 5180, 0, 0)]),
        ]
        .concat();
        let other = [header(1), attr(Nl80211Attr::WiphyName as u16, b"phy1\0")].concat();

        let parts = [first, second, other, third]
            .iter()
            .filter_map(|p| Nl80211Wiphy::parse(p))
            .collect::<Vec<_>>();
        let wiphys = merge_parts(parts);

        assert_eq!(wiphys.len(), 2);
        let phy0 = &wiphys[0];
        assert_eq!(phy0.name, "phy0");
        let two_ghz = &phy0.bands[&Nl80211Band::TwoGhz];
        assert_eq!(two_ghz.frequencies.len(), 2);
        assert_eq!(two_ghz.ht_capabilities, 0x1ce);
        assert!(phy0.bands.contains_key(&Nl80211Band::FiveGhz));
        assert_eq!(wiphys[1].name, "phy1");
    }

    #[test]
    fn test_security_protocols_fallback_to_akm() {
        let mut wiphy = Nl80211Wiphy::parse(&header(0)).unwrap();
        wiphy.akm_suites = vec![
            Ieee80211AkmSuite::SAE,
            Ieee80211AkmSuite::PSK,
            Ieee80211AkmSuite::FT_PSK,
        ];
        assert_eq!(
            wiphy.security_protocols(),
            vec![Ieee80211SecurityProtocol::Wpa2, Ieee80211SecurityProtocol::Wpa3]
        );

        wiphy.wpa_versions = Some(0b001);
        assert_eq!(wiphy.security_protocols(), vec![Ieee80211SecurityProtocol::Wpa]);
    }
}
