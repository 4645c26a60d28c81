//! Unsolicited event lines.
//!
//! After `ATTACH`, the daemon sends event datagrams of the form
//!
//! ```text
//! <3>AP-STA-CONNECTED 02:00:00:00:01:00
//! <3>IFNAME=wlan0 CTRL-EVENT-TERMINATING
//! ```
//!
//! The number between the angle brackets is the daemon's log level.

use serde::Serialize;
use winnow::combinator::{delimited, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_till;

use super::WpaType;
use crate::ieee80211::Ieee80211MacAddress;

type PResult<T> = Result<T, ErrMode<ContextError>>;

/// Daemon log level carried in the `<N>` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WpaLogLevel {
    Excessive,
    MsgDump,
    Debug,
    Info,
    Warning,
    Error,
    Unknown,
}

impl WpaLogLevel {
    fn from_number(level: &str) -> Self {
        match level.trim().parse::<u8>() {
            Ok(0) => Self::Excessive,
            Ok(1) => Self::MsgDump,
            Ok(2) => Self::Debug,
            Ok(3) => Self::Info,
            Ok(4) => Self::Warning,
            Ok(5) => Self::Error,
            _ => Self::Unknown,
        }
    }
}

/// Known event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WpaEventKind {
    ApEnabled,
    ApDisabled,
    ApStaConnected,
    ApStaDisconnected,
    ApCsaFinished,
    CtrlEventTerminating,
    CtrlEventConnected,
    CtrlEventDisconnected,
    CtrlEventScanResults,
    DfsCacStart,
    DfsCacCompleted,
    DfsRadarDetected,
    WpsPbcActive,
    Other,
}

impl WpaEventKind {
    /// Classify an event by the first token of its payload.
    pub fn from_name(name: &str) -> Self {
        match name {
            "AP-ENABLED" => Self::ApEnabled,
            "AP-DISABLED" => Self::ApDisabled,
            "AP-STA-CONNECTED" => Self::ApStaConnected,
            "AP-STA-DISCONNECTED" => Self::ApStaDisconnected,
            "AP-CSA-FINISHED" => Self::ApCsaFinished,
            "CTRL-EVENT-TERMINATING" => Self::CtrlEventTerminating,
            "CTRL-EVENT-CONNECTED" => Self::CtrlEventConnected,
            "CTRL-EVENT-DISCONNECTED" => Self::CtrlEventDisconnected,
            "CTRL-EVENT-SCAN-RESULTS" => Self::CtrlEventScanResults,
            "DFS-CAC-START" => Self::DfsCacStart,
            "DFS-CAC-COMPLETED" => Self::DfsCacCompleted,
            "DFS-RADAR-DETECTED" => Self::DfsRadarDetected,
            "WPS-PBC-ACTIVE" => Self::WpsPbcActive,
            _ => Self::Other,
        }
    }
}

/// A parsed event line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WpaEvent {
    pub source: WpaType,
    pub level: WpaLogLevel,
    /// Interface named by an `IFNAME=` prefix.
    pub interface: Option<String>,
    /// Everything after the prefixes.
    pub payload: String,
    pub kind: WpaEventKind,
}

impl WpaEvent {
    /// The event name (first payload token).
    pub fn name(&self) -> &str {
        self.payload.split_whitespace().next().unwrap_or_default()
    }

    /// Station address of `AP-STA-CONNECTED` / `AP-STA-DISCONNECTED`.
    pub fn station(&self) -> Option<Ieee80211MacAddress> {
        match self.kind {
            WpaEventKind::ApStaConnected | WpaEventKind::ApStaDisconnected => self
                .payload
                .split_whitespace()
                .nth(1)
                .and_then(|mac| mac.parse().ok()),
            _ => None,
        }
    }
}

/// Parses event lines from one daemon.
#[derive(Debug, Clone, Copy)]
pub struct EventParser {
    source: WpaType,
}

impl EventParser {
    pub fn new(source: WpaType) -> Self {
        Self { source }
    }

    /// Parse one event line.
    ///
    /// Returns `None` unless the line starts with a `<level>` prefix closed
    /// by `>`. Trailing line terminators are dropped from the payload.
    pub fn parse(&self, line: &str) -> Option<WpaEvent> {
        let mut input = line.trim_end_matches(['\n', '\r']);
        let (level, interface) = prefix(&mut input).ok()?;
        let payload = input.to_string();

        Some(WpaEvent {
            source: self.source,
            level: WpaLogLevel::from_number(level),
            interface: interface.map(str::to_string),
            kind: WpaEventKind::from_name(payload.split_whitespace().next().unwrap_or_default()),
            payload,
        })
    }
}

fn level<'s>(input: &mut &'s str) -> PResult<&'s str> {
    delimited('<', take_till(0.., '>'), '>').parse_next(input)
}

fn interface<'s>(input: &mut &'s str) -> PResult<&'s str> {
    delimited("IFNAME=", take_till(1.., ' '), ' ').parse_next(input)
}

fn prefix<'s>(input: &mut &'s str) -> PResult<(&'s str, Option<&'s str>)> {
    (level, opt(interface)).parse_next(input)
}
