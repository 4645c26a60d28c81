//! Control-socket commands.

use std::borrow::Cow;
use std::fmt;

use tracing::warn;

use super::decoder::ResponseDecoder;
use super::key_value::KeyValuePair;
use super::response::{WpaResponse, WpaTypedResponse};
use crate::error::{Error, Result};

/// A request to hostapd or wpa_supplicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WpaCommand {
    Ping,
    Status,
    Enable,
    Disable,
    Terminate,
    Reload,
    Reconfigure,
    /// Subscribe this socket to unsolicited events.
    Attach,
    Detach,
    GetConfig,
    Get { property: String },
    Set { property: String, value: String },
    /// Any other command, sent verbatim.
    Raw(String),
}

/// Structured decoder selected by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderKind {
    Status,
    Config,
    Property,
}

const STATUS_REQUIRED: &[&str] = &["state="];

const STATUS_OPTIONAL: &[&str] = &[
    "phy=",
    "freq=",
    "channel=",
    "ieee80211n=",
    "ieee80211ac=",
    "ieee80211ax=",
    "ieee80211be=",
    "disable_11n=",
    "disable_11ac=",
    "disable_11ax=",
    "beacon_int=",
    "dtim_period=",
    "num_sta_non_erp=",
];

const STATUS_INDEXED: &[&str] = &["bss=", "bssid=", "ssid=", "num_sta="];

const CONFIG_REQUIRED: &[&str] = &["bssid=", "ssid="];

const CONFIG_OPTIONAL: &[&str] = &[
    "wps_state=",
    "wpa=",
    "key_mgmt=",
    "group_cipher=",
    "rsn_pairwise_cipher=",
    "wpa_pairwise_cipher=",
];

impl WpaCommand {
    /// `GET <property>`.
    pub fn get(property: impl Into<String>) -> Self {
        Self::Get {
            property: property.into(),
        }
    }

    /// `SET <property> <value>`.
    pub fn set(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Set {
            property: property.into(),
            value: value.into(),
        }
    }

    /// A command not modeled by this enum.
    pub fn raw(payload: impl Into<String>) -> Self {
        Self::Raw(payload.into())
    }

    /// The ASCII payload sent on the wire.
    pub fn payload(&self) -> Cow<'_, str> {
        match self {
            Self::Ping => "PING".into(),
            Self::Status => "STATUS".into(),
            Self::Enable => "ENABLE".into(),
            Self::Disable => "DISABLE".into(),
            Self::Terminate => "TERMINATE".into(),
            Self::Reload => "RELOAD".into(),
            Self::Reconfigure => "RECONFIGURE".into(),
            Self::Attach => "ATTACH".into(),
            Self::Detach => "DETACH".into(),
            Self::GetConfig => "GET_CONFIG".into(),
            Self::Get { property } => format!("GET {}", property).into(),
            Self::Set { property, value } => format!("SET {} {}", property, value).into(),
            Self::Raw(payload) => payload.as_str().into(),
        }
    }

    /// The decoder for this command's reply, if it has a structured one.
    pub fn decoder_kind(&self) -> Option<DecoderKind> {
        match self {
            Self::Status => Some(DecoderKind::Status),
            Self::GetConfig => Some(DecoderKind::Config),
            Self::Get { .. } => Some(DecoderKind::Property),
            _ => None,
        }
    }

    /// The properties to extract from this command's reply, in the order
    /// they are resolved.
    pub fn properties<'a>(&self) -> Result<Vec<KeyValuePair<'a>>> {
        let Some(kind) = self.decoder_kind() else {
            return Ok(Vec::new());
        };

        let mut properties = Vec::new();
        match kind {
            DecoderKind::Status => {
                for &key in STATUS_REQUIRED {
                    properties.push(KeyValuePair::required(key)?.ignore_case());
                }
                for &key in STATUS_OPTIONAL {
                    properties.push(KeyValuePair::optional(key)?);
                }
                for &key in STATUS_INDEXED {
                    properties.push(KeyValuePair::optional(key)?.indexed());
                }
            }
            DecoderKind::Config => {
                for &key in CONFIG_REQUIRED {
                    properties.push(KeyValuePair::required(key)?);
                }
                for &key in CONFIG_OPTIONAL {
                    properties.push(KeyValuePair::optional(key)?);
                }
            }
            DecoderKind::Property => {
                if let Self::Get { property } = self {
                    if property.is_empty() {
                        return Err(Error::MalformedKeySpec { key: "=".into() });
                    }
                    properties.push(KeyValuePair::required(format!("{}=", property))?);
                }
            }
        }
        Ok(properties)
    }

    /// Decode a reply to this command.
    ///
    /// Commands without a structured decoder yield
    /// [`WpaTypedResponse::Raw`] for any non-empty reply. Returns `None` if
    /// a required property is missing or the payload cannot be interpreted.
    pub fn decode(&self, response: &WpaResponse) -> Option<WpaTypedResponse> {
        let properties = match self.properties() {
            Ok(properties) => properties,
            Err(e) => {
                warn!(command = %self, error = %e, "cannot build reply decoder");
                return None;
            }
        };
        ResponseDecoder::new(self, response, properties).parse()
    }
}

impl fmt::Display for WpaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload())
    }
}
