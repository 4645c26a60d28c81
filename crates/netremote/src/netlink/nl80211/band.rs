//! Wiphy band and frequency decoding.

use serde::Serialize;
use tracing::warn;

use super::{
    NL80211_BAND_ATTR_TABLE, NL80211_BITRATE_ATTR_TABLE, NL80211_FREQUENCY_ATTR_TABLE, Nl80211Band,
    Nl80211BandAttr, Nl80211BitrateAttr, Nl80211FrequencyAttr,
};
use crate::netlink::attr::AttrTable;

/// One channel within a wiphy band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WiphyBandFrequency {
    /// Center frequency in MHz.
    pub frequency: u32,
    /// Offset from `frequency` in KHz, for sub-MHz channels.
    pub frequency_offset: Option<u32>,
    /// Channel is disabled by regulatory rules.
    pub is_disabled: bool,
    /// Initiating radiation (beaconing, probing) is forbidden.
    pub is_no_ir: bool,
    /// Radar detection is required.
    pub is_radar: bool,
    /// Maximum transmit power in mBm.
    pub max_tx_power: Option<u32>,
}

impl WiphyBandFrequency {
    /// Decode a frequency from its nested attribute payload.
    ///
    /// Returns `None` if the frequency value is missing.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let attrs = AttrTable::<NL80211_FREQUENCY_ATTR_TABLE>::parse(data);

        let Some(frequency) = attrs.u32(Nl80211FrequencyAttr::Freq as u16) else {
            warn!("wiphy band frequency without NL80211_FREQUENCY_ATTR_FREQ, skipping");
            return None;
        };

        Some(Self {
            frequency,
            frequency_offset: attrs.u32(Nl80211FrequencyAttr::Offset as u16),
            is_disabled: attrs.has(Nl80211FrequencyAttr::Disabled as u16),
            is_no_ir: attrs.has(Nl80211FrequencyAttr::NoIr as u16),
            is_radar: attrs.has(Nl80211FrequencyAttr::Radar as u16),
            max_tx_power: attrs.u32(Nl80211FrequencyAttr::MaxTxPower as u16),
        })
    }
}

/// Capabilities of one frequency band of a wiphy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Nl80211WiphyBand {
    /// Supported channels.
    pub frequencies: Vec<WiphyBandFrequency>,
    /// Supported legacy bitrates in units of 100 kbps.
    pub bitrates: Vec<u32>,
    /// HT capability field (0 if HT is unsupported).
    pub ht_capabilities: u16,
    /// VHT capability field (0 if VHT is unsupported).
    pub vht_capabilities: u32,
}

impl Nl80211WiphyBand {
    /// Decode a band from its nested attribute payload.
    ///
    /// Every band attribute is optional. Frequencies without a value are
    /// dropped individually.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let attrs = AttrTable::<NL80211_BAND_ATTR_TABLE>::parse(data);

        let frequencies = attrs
            .nested(Nl80211BandAttr::Freqs as u16)
            .filter_map(|(_, freq)| WiphyBandFrequency::parse(freq))
            .collect();

        let bitrates = attrs
            .nested(Nl80211BandAttr::Rates as u16)
            .filter_map(|(_, rate)| {
                AttrTable::<NL80211_BITRATE_ATTR_TABLE>::parse(rate)
                    .u32(Nl80211BitrateAttr::Rate as u16)
            })
            .collect();

        Some(Self {
            frequencies,
            bitrates,
            ht_capabilities: attrs.u16(Nl80211BandAttr::HtCapa as u16).unwrap_or(0),
            vht_capabilities: attrs.u32(Nl80211BandAttr::VhtCapa as u16).unwrap_or(0),
        })
    }

    /// Fold a partial band from a later split-dump message into this one.
    ///
    /// Lists are concatenated; capability fields keep the first non-zero value.
    pub(crate) fn merge(&mut self, other: Self) {
        self.frequencies.extend(other.frequencies);
        self.bitrates.extend(other.bitrates);
        if self.ht_capabilities == 0 {
            self.ht_capabilities = other.ht_capabilities;
        }
        if self.vht_capabilities == 0 {
            self.vht_capabilities = other.vht_capabilities;
        }
    }
}

/// Decode the `NL80211_ATTR_WIPHY_BANDS` nest into `(band, band data)` pairs.
///
/// The nested attribute type is the band id. Unknown band ids are skipped.
pub(crate) fn parse_bands(data: &[u8]) -> Vec<(Nl80211Band, Nl80211WiphyBand)> {
    crate::netlink::attr::AttrIter::new(data)
        .filter_map(|(id, payload)| {
            let Some(band) = Nl80211Band::from_u16(id) else {
                warn!(band = id, "unknown nl80211 band id, skipping");
                return None;
            };
            Nl80211WiphyBand::parse(payload).map(|b| (band, b))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::{NLA_F_NESTED, NlAttr, nla_align};

    fn attr(kind: u16, payload: &[u8]) -> Vec<u8> {
        let mut buf = NlAttr::new(kind, payload.len()).as_bytes().to_vec();
        buf.extend_from_slice(payload);
        buf.resize(nla_align(buf.len()), 0);
        buf
    }

    fn nest(kind: u16, children: &[Vec<u8>]) -> Vec<u8> {
        attr(kind | NLA_F_NESTED, &children.concat())
    }

    fn freq(mhz: u32, extra: &[Vec<u8>]) -> Vec<u8> {
        let mut attrs = vec![attr(Nl80211FrequencyAttr::Freq as u16, &mhz.to_ne_bytes())];
        attrs.extend_from_slice(extra);
        attrs.concat()
    }

    #[test]
    fn test_frequency_flags() {
        let data = freq(
            5260,
            &[
                attr(Nl80211FrequencyAttr::NoIr as u16, &[]),
                attr(Nl80211FrequencyAttr::Radar as u16, &[]),
                attr(Nl80211FrequencyAttr::MaxTxPower as u16, &2000u32.to_ne_bytes()),
            ],
        );

        let f = WiphyBandFrequency::parse(&data).unwrap();
        assert_eq!(f.frequency, 5260);
        assert!(f.is_no_ir);
        assert!(f.is_radar);
        assert!(!f.is_disabled);
        assert_eq!(f.max_tx_power, Some(2000));
        assert_eq!(f.frequency_offset, None);
    }

    #[test]
    fn test_frequency_requires_value() {
        let data = attr(Nl80211FrequencyAttr::Disabled as u16, &[]);
        assert!(WiphyBandFrequency::parse(&data).is_none());
    }

    #[test]
    fn test_band_parse() {
        let freqs = nest(
            Nl80211BandAttr::Freqs as u16,
            &[
                nest(0, &[freq(2412, &[])]),
                nest(1, &[freq(2417, &[])]),
                // Missing frequency value: dropped, band still parses.
                nest(2, &[attr(Nl80211FrequencyAttr::Disabled as u16, &[])]),
            ],
        );
        let rates = nest(
            Nl80211BandAttr::Rates as u16,
            &[
                nest(0, &[attr(Nl80211BitrateAttr::Rate as u16, &10u32.to_ne_bytes())]),
                nest(1, &[attr(Nl80211BitrateAttr::Rate as u16, &20u32.to_ne_bytes())]),
            ],
        );
        let data = [
            freqs,
            rates,
            attr(Nl80211BandAttr::HtCapa as u16, &0x1ceu16.to_ne_bytes()),
        ]
        .concat();

        let band = Nl80211WiphyBand::parse(&data).unwrap();
        assert_eq!(band.frequencies.len(), 2);
        assert_eq!(band.frequencies[1].frequency, 2417);
        assert_eq!(band.bitrates, vec![10, 20]);
        assert_eq!(band.ht_capabilities, 0x1ce);
        assert_eq!(band.vht_capabilities, 0);
    }

    #[test]
    fn test_parse_bands_keyed_by_id() {
        let data = [
            nest(0, &[nest(Nl80211BandAttr::Freqs as u16, &[nest(0, &[freq(2412, &[])])])]),
            nest(1, &[attr(Nl80211BandAttr::VhtCapa as u16, &0x3380_0032u32.to_ne_bytes())]),
            nest(9, &[]),
        ]
        .concat();

        let bands = parse_bands(&data);
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].0, Nl80211Band::TwoGhz);
        assert_eq!(bands[0].1.frequencies[0].frequency, 2412);
        assert_eq!(bands[1].0, Nl80211Band::FiveGhz);
        assert_eq!(bands[1].1.vht_capabilities, 0x3380_0032);
    }

    #[test]
    fn test_merge_keeps_first_capability() {
        let mut a = Nl80211WiphyBand {
            ht_capabilities: 0x1ce,
            ..Default::default()
        };
        a.frequencies.push(WiphyBandFrequency {
            frequency: 2412,
            ..Default::default()
        });
        let b = Nl80211WiphyBand {
            frequencies: vec![WiphyBandFrequency {
                frequency: 2417,
                ..Default::default()
            }],
            ht_capabilities: 0x2,
            vht_capabilities: 0x10,
            ..Default::default()
        };

        a.merge(b);
        assert_eq!(a.frequencies.len(), 2);
        assert_eq!(a.ht_capabilities, 0x1ce);
        assert_eq!(a.vht_capabilities, 0x10);
    }
}
