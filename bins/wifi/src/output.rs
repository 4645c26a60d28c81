//! Output formatting helpers.

use netremote::netlink::nl80211::Nl80211Band;
use serde::Serialize;

/// Print `value` as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print `value` as one line of JSON.
pub fn print_json_line<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

pub fn band_name(band: Nl80211Band) -> &'static str {
    match band {
        Nl80211Band::TwoGhz => "2.4 GHz",
        Nl80211Band::FiveGhz => "5 GHz",
        Nl80211Band::SixtyGhz => "60 GHz",
        Nl80211Band::SixGhz => "6 GHz",
        Nl80211Band::S1Ghz => "900 MHz",
        Nl80211Band::Lc => "light",
    }
}

/// Format a bitrate given in units of 100 kbit/s.
pub fn format_bitrate(rate: u32) -> String {
    format!("{}.{} Mbps", rate / 10, rate % 10)
}

/// Format a power level given in mBm.
pub fn format_mbm(mbm: u32) -> String {
    format!("{}.{:02} dBm", mbm / 100, mbm % 100)
}
