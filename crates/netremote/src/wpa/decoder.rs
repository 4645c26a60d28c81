//! Per-command reply decoding.

use tracing::{debug, warn};

use super::command::{DecoderKind, WpaCommand};
use super::key_value::KeyValuePair;
use super::response::{
    HostapdInterfaceState, WpaBssStatus, WpaConfig, WpaProperty, WpaResponse, WpaStatus, WpaSuite,
    WpaTypedResponse,
};
use crate::ieee80211::{
    Ieee80211AkmSuite, Ieee80211CipherSuite, Ieee80211MacAddress, Ieee80211SecurityProtocol,
};

/// Progress of a [`ResponseDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Properties have not been extracted yet.
    AwaitingProperties,
    /// Every required property resolved; the payload has not been built.
    AwaitingPayload,
    Decoded,
    Failed,
}

/// Decodes one reply to one command.
///
/// Properties are resolved in declaration order. The first required
/// property that cannot be found stops resolution and fails the decode;
/// optional properties before it have been attempted, later ones have not.
#[derive(Debug)]
pub struct ResponseDecoder<'a> {
    command: &'a WpaCommand,
    response: &'a WpaResponse,
    pending: Vec<KeyValuePair<'a>>,
    resolved: Vec<KeyValuePair<'a>>,
    state: DecoderState,
    missing_key: Option<String>,
}

impl<'a> ResponseDecoder<'a> {
    pub fn new(
        command: &'a WpaCommand,
        response: &'a WpaResponse,
        properties: Vec<KeyValuePair<'a>>,
    ) -> Self {
        Self {
            command,
            response,
            pending: properties,
            resolved: Vec::new(),
            state: DecoderState::AwaitingProperties,
            missing_key: None,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Key of the required property that was not found, if any.
    pub fn missing_key(&self) -> Option<&str> {
        self.missing_key.as_deref()
    }

    /// Properties that have not resolved.
    pub fn pending(&self) -> &[KeyValuePair<'a>] {
        &self.pending
    }

    /// Properties that resolved, in resolution order.
    pub fn resolved(&self) -> &[KeyValuePair<'a>] {
        &self.resolved
    }

    /// Resolve properties against the reply.
    ///
    /// Returns `true` if every required property was found.
    pub fn try_parse_properties(&mut self) -> bool {
        if self.state != DecoderState::AwaitingProperties {
            return self.missing_key.is_none();
        }

        let input = self.response.as_str();
        let mut properties = std::mem::take(&mut self.pending).into_iter();

        while let Some(mut pair) = properties.next() {
            if pair.try_parse(input).is_some() {
                self.resolved.push(pair);
                continue;
            }

            if pair.is_required() {
                warn!(
                    command = %self.command,
                    key = pair.key(),
                    "required property missing from reply"
                );
                self.missing_key = Some(pair.key().to_string());
                self.pending.push(pair);
                self.pending.extend(properties);
                self.state = DecoderState::Failed;
                return false;
            }

            self.pending.push(pair);
        }

        self.state = DecoderState::AwaitingPayload;
        true
    }

    /// Decode the reply into a typed response.
    pub fn parse(&mut self) -> Option<WpaTypedResponse> {
        if !self.try_parse_properties() {
            return None;
        }

        let decoded = match self.command.decoder_kind() {
            Some(DecoderKind::Status) => self.decode_status().map(WpaTypedResponse::Status),
            Some(DecoderKind::Config) => self.decode_config().map(WpaTypedResponse::Config),
            Some(DecoderKind::Property) => self.decode_property().map(WpaTypedResponse::Property),
            None if self.response.is_empty() => None,
            None => Some(WpaTypedResponse::Raw(self.response.clone())),
        };

        self.state = if decoded.is_some() {
            DecoderState::Decoded
        } else {
            debug!(command = %self.command, "reply payload rejected");
            DecoderState::Failed
        };
        decoded
    }

    /// Resolved value of `key`.
    pub fn value(&self, key: &str) -> Option<&'a str> {
        self.find(key).and_then(KeyValuePair::value)
    }

    /// Resolved values of an indexed `key`, in index order.
    pub fn values(&self, key: &str) -> &[&'a str] {
        self.find(key).map(KeyValuePair::values).unwrap_or(&[])
    }

    /// An exact key match wins over one that differs only in case.
    fn find(&self, key: &str) -> Option<&KeyValuePair<'a>> {
        self.resolved
            .iter()
            .find(|p| p.key() == key)
            .or_else(|| self.resolved.iter().find(|p| p.key().eq_ignore_ascii_case(key)))
    }

    fn number(&self, key: &str) -> Option<u32> {
        self.value(key).and_then(|v| v.trim().parse().ok())
    }

    fn flag(&self, key: &str) -> bool {
        self.value(key).is_some_and(|v| v.trim() == "1")
    }

    fn decode_status(&self) -> Option<WpaStatus> {
        let state = self
            .value("state=")?
            .parse()
            .unwrap_or(HostapdInterfaceState::Unknown);

        let bssids = self.values("bssid=");
        let ssids = self.values("ssid=");
        let stations = self.values("num_sta=");
        let bss = self
            .values("bss=")
            .iter()
            .enumerate()
            .map(|(i, interface)| WpaBssStatus {
                interface: interface.to_string(),
                bssid: bssids.get(i).and_then(|b| b.parse().ok()),
                ssid: ssids.get(i).map(|s| s.to_string()),
                num_stations: stations.get(i).and_then(|n| n.parse().ok()),
            })
            .collect();

        Some(WpaStatus {
            state,
            phy: self.value("phy=").map(str::to_string),
            frequency: self.number("freq="),
            channel: self.number("channel="),
            ieee80211n: self.flag("ieee80211n="),
            ieee80211ac: self.flag("ieee80211ac="),
            ieee80211ax: self.flag("ieee80211ax="),
            ieee80211be: self.flag("ieee80211be="),
            disable_11n: self.flag("disable_11n="),
            disable_11ac: self.flag("disable_11ac="),
            disable_11ax: self.flag("disable_11ax="),
            beacon_interval: self.number("beacon_int="),
            dtim_period: self.number("dtim_period="),
            num_sta_non_erp: self.number("num_sta_non_erp="),
            bss,
        })
    }

    fn decode_config(&self) -> Option<WpaConfig> {
        let bssid = self.value("bssid=")?;
        let bssid: Ieee80211MacAddress = match bssid.trim().parse() {
            Ok(mac) => mac,
            Err(e) => {
                warn!(bssid, error = %e, "GET_CONFIG reply carries an invalid bssid");
                return None;
            }
        };

        let key_management: Vec<_> = tokens(self.value("key_mgmt="))
            .map(|name| suite(name, Ieee80211AkmSuite::from_hostapd_name))
            .collect();

        let wpa = self.number("wpa=").unwrap_or(0);
        let mut security_protocols = Vec::new();
        if wpa & 0x1 != 0 {
            security_protocols.push(Ieee80211SecurityProtocol::Wpa);
        }
        if wpa & 0x2 != 0 {
            let before = security_protocols.len();
            security_protocols.extend(
                key_management
                    .iter()
                    .filter_map(WpaSuite::known)
                    .map(|akm| akm.security_protocol())
                    .filter(|p| *p != Ieee80211SecurityProtocol::Unknown),
            );
            if security_protocols.len() == before {
                security_protocols.push(Ieee80211SecurityProtocol::Wpa2);
            }
        }
        security_protocols.sort();
        security_protocols.dedup();

        Some(WpaConfig {
            bssid,
            ssid: self.value("ssid=")?.to_string(),
            wps_state: self.value("wps_state=").map(str::to_string),
            security_protocols,
            key_management,
            group_cipher: tokens(self.value("group_cipher="))
                .next()
                .map(|name| suite(name, Ieee80211CipherSuite::from_hostapd_name)),
            rsn_pairwise_ciphers: tokens(self.value("rsn_pairwise_cipher="))
                .map(|name| suite(name, Ieee80211CipherSuite::from_hostapd_name))
                .collect(),
            wpa_pairwise_ciphers: tokens(self.value("wpa_pairwise_cipher="))
                .map(|name| suite(name, Ieee80211CipherSuite::from_hostapd_name))
                .collect(),
        })
    }

    fn decode_property(&self) -> Option<WpaProperty> {
        let WpaCommand::Get { property } = self.command else {
            return None;
        };
        let value = self.value(&format!("{}=", property))?;
        Some(WpaProperty {
            name: property.clone(),
            value: value.to_string(),
        })
    }
}

/// Space-separated names of a value, tolerating the trailing space hostapd
/// emits.
fn tokens(value: Option<&str>) -> impl Iterator<Item = &str> {
    value.unwrap_or_default().split_whitespace()
}

fn suite<T>(name: &str, lookup: impl Fn(&str) -> Option<T>) -> WpaSuite<T> {
    lookup(name).map_or_else(|| WpaSuite::Unknown(name.to_string()), WpaSuite::Known)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wpa::key_value::Presence;

    const STATUS_REPLY: &str = "\
state=ENABLED
phy=phy0
freq=5180
num_sta_non_erp=0
num_sta_no_short_slot_time=0
ieee80211n=1
ieee80211ac=1
ieee80211ax=0
disable_11n=0
disable_11ac=0
beacon_int=100
dtim_period=2
secondary_channel=1
channel=36
bss[0]=wlan0
bssid[0]=02:00:00:00:03:00
ssid[0]=TestNetwork
num_sta[0]=2
bss[1]=wlan0-1
bssid[1]=02:00:00:00:03:01
ssid[1]=Guest
num_sta[1]=0
";

    const CONFIG_REPLY: &str = "\
bssid=02:00:00:00:03:00
ssid=TestNetwork
wps_state=disabled
wpa=2
key_mgmt=WPA-PSK SAE
group_cipher=CCMP
rsn_pairwise_cipher=CCMP GCMP-256
";

    fn decode(command: WpaCommand, reply: &str) -> Option<WpaTypedResponse> {
        command.decode(&WpaResponse::new(reply))
    }

    #[test]
    fn test_status_decode() {
        let Some(WpaTypedResponse::Status(status)) = decode(WpaCommand::Status, STATUS_REPLY)
        else {
            panic!("STATUS did not decode");
        };

        assert_eq!(status.state, HostapdInterfaceState::Enabled);
        assert_eq!(status.phy.as_deref(), Some("phy0"));
        assert_eq!(status.frequency, Some(5180));
        assert_eq!(status.channel, Some(36));
        assert!(status.ieee80211n);
        assert!(status.ieee80211ac);
        assert!(!status.ieee80211ax);
        assert!(!status.ieee80211be);
        assert_eq!(status.beacon_interval, Some(100));
        assert_eq!(status.dtim_period, Some(2));
        assert_eq!(status.num_sta_non_erp, Some(0));

        assert_eq!(status.bss.len(), 2);
        assert_eq!(status.bss[0].interface, "wlan0");
        assert_eq!(status.bss[0].ssid.as_deref(), Some("TestNetwork"));
        assert_eq!(status.bss[0].num_stations, Some(2));
        assert_eq!(
            status.bss[1].bssid.map(|b| b.to_string()).as_deref(),
            Some("02:00:00:00:03:01")
        );
    }

    #[test]
    fn test_status_minimal() {
        let Some(WpaTypedResponse::Status(status)) = decode(WpaCommand::Status, "state=ENABLED\n")
        else {
            panic!("STATUS did not decode");
        };
        assert_eq!(status.state, HostapdInterfaceState::Enabled);
        assert!(status.bss.is_empty());
        assert_eq!(status.frequency, None);
    }

    #[test]
    fn test_status_missing_state() {
        let command = WpaCommand::Status;
        let response = WpaResponse::new("phy=phy0\nfreq=2412\n");
        let mut decoder =
            ResponseDecoder::new(&command, &response, command.properties().unwrap());

        assert_eq!(decoder.parse(), None);
        assert_eq!(decoder.state(), DecoderState::Failed);
        assert_eq!(decoder.missing_key(), Some("state="));
    }

    #[test]
    fn test_status_uppercase_state_key() {
        let Some(WpaTypedResponse::Status(status)) = decode(WpaCommand::Status, "STATE=ENABLED\n")
        else {
            panic!("STATUS did not decode");
        };
        assert_eq!(status.state, HostapdInterfaceState::Enabled);
    }

    #[test]
    fn test_status_explicit_uppercase_pair() {
        let command = WpaCommand::Status;
        let response = WpaResponse::new("STATE=ENABLED\n");
        let properties = vec![KeyValuePair::required("STATE=").unwrap()];
        let mut decoder = ResponseDecoder::new(&command, &response, properties);

        let Some(WpaTypedResponse::Status(status)) = decoder.parse() else {
            panic!("STATUS did not decode");
        };
        assert_eq!(status.state, HostapdInterfaceState::Enabled);
        assert_eq!(decoder.state(), DecoderState::Decoded);

        let response = WpaResponse::new("phy=phy0\n");
        let properties = vec![KeyValuePair::required("STATE=").unwrap()];
        let mut decoder = ResponseDecoder::new(&command, &response, properties);
        assert_eq!(decoder.parse(), None);
        assert_eq!(decoder.missing_key(), Some("STATE="));
    }

    #[test]
    fn test_first_missing_required_stops_resolution() {
        let command = WpaCommand::raw("CUSTOM");
        let response = WpaResponse::new("a=1\nc=3\n");
        let properties = vec![
            KeyValuePair::new("a=", Presence::Optional).unwrap(),
            KeyValuePair::new("b=", Presence::Required).unwrap(),
            KeyValuePair::new("c=", Presence::Optional).unwrap(),
        ];
        let mut decoder = ResponseDecoder::new(&command, &response, properties);

        assert!(!decoder.try_parse_properties());
        assert_eq!(decoder.state(), DecoderState::Failed);
        assert_eq!(decoder.missing_key(), Some("b="));
        assert_eq!(decoder.resolved().len(), 1);
        assert_eq!(decoder.value("a="), Some("1"));
        // `c=` is present but was never attempted.
        assert_eq!(decoder.pending().len(), 2);
        assert!(!decoder.pending()[1].is_resolved());
    }

    #[test]
    fn test_optional_missing_still_decodes() {
        let command = WpaCommand::raw("CUSTOM");
        let response = WpaResponse::new("b=2\n");
        let properties = vec![
            KeyValuePair::new("a=", Presence::Optional).unwrap(),
            KeyValuePair::new("b=", Presence::Required).unwrap(),
        ];
        let mut decoder = ResponseDecoder::new(&command, &response, properties);

        assert!(decoder.try_parse_properties());
        assert_eq!(decoder.state(), DecoderState::AwaitingPayload);
        assert!(matches!(decoder.parse(), Some(WpaTypedResponse::Raw(_))));
        assert_eq!(decoder.state(), DecoderState::Decoded);
    }

    #[test]
    fn test_get_property() {
        let Some(WpaTypedResponse::Property(property)) =
            decode(WpaCommand::get("ssid"), "ssid=TestNetwork\n")
        else {
            panic!("GET did not decode");
        };
        assert_eq!(property.name, "ssid");
        assert_eq!(property.value, "TestNetwork");
    }

    #[test]
    fn test_get_property_missing() {
        assert_eq!(decode(WpaCommand::get("ssid"), "FAIL\n"), None);
    }

    #[test]
    fn test_config_decode() {
        let Some(WpaTypedResponse::Config(config)) = decode(WpaCommand::GetConfig, CONFIG_REPLY)
        else {
            panic!("GET_CONFIG did not decode");
        };

        assert_eq!(config.bssid.to_string(), "02:00:00:00:03:00");
        assert_eq!(config.ssid, "TestNetwork");
        assert_eq!(config.wps_state.as_deref(), Some("disabled"));
        assert_eq!(
            config.security_protocols,
            vec![Ieee80211SecurityProtocol::Wpa2, Ieee80211SecurityProtocol::Wpa3]
        );
        assert_eq!(
            config.key_management,
            vec![
                WpaSuite::Known(Ieee80211AkmSuite::PSK),
                WpaSuite::Known(Ieee80211AkmSuite::SAE)
            ]
        );
        assert_eq!(
            config.group_cipher,
            Some(WpaSuite::Known(Ieee80211CipherSuite::CCMP_128))
        );
        assert_eq!(
            config.rsn_pairwise_ciphers,
            vec![
                WpaSuite::Known(Ieee80211CipherSuite::CCMP_128),
                WpaSuite::Known(Ieee80211CipherSuite::GCMP_256)
            ]
        );
        assert!(config.wpa_pairwise_ciphers.is_empty());
    }

    #[test]
    fn test_config_keeps_unknown_names() {
        let reply = "bssid=02:00:00:00:03:00\nssid=lab\nwpa=1\nkey_mgmt=WPA-PSK DPP\n";
        let Some(WpaTypedResponse::Config(config)) = decode(WpaCommand::GetConfig, reply) else {
            panic!("GET_CONFIG did not decode");
        };
        assert_eq!(config.security_protocols, vec![Ieee80211SecurityProtocol::Wpa]);
        assert_eq!(config.key_management[1], WpaSuite::Unknown("DPP".into()));
        assert_eq!(config.group_cipher, None);
    }

    #[test]
    fn test_config_invalid_bssid_fails() {
        let command = WpaCommand::GetConfig;
        let response = WpaResponse::new("bssid=nope\nssid=lab\n");
        let mut decoder =
            ResponseDecoder::new(&command, &response, command.properties().unwrap());
        assert_eq!(decoder.parse(), None);
        assert_eq!(decoder.state(), DecoderState::Failed);
        assert_eq!(decoder.missing_key(), None);
    }

    #[test]
    fn test_config_requires_ssid() {
        assert_eq!(
            decode(WpaCommand::GetConfig, "bssid=02:00:00:00:03:00\n"),
            None
        );
    }
}
