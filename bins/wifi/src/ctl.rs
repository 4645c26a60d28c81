//! Control-socket commands: ctl, status and events.

use netremote::config::ControlChannelConfig;
use netremote::wpa::{ControlChannel, WpaCommand, WpaStatus, WpaType, WpaTypedResponse};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::output::{print_json, print_json_line};

/// Parse a command line typed by the user.
fn parse_command(line: &str) -> WpaCommand {
    let mut words = line.split_whitespace();
    match (words.next(), words.next(), words.next(), words.next()) {
        (Some("PING"), None, ..) => WpaCommand::Ping,
        (Some("STATUS"), None, ..) => WpaCommand::Status,
        (Some("ENABLE"), None, ..) => WpaCommand::Enable,
        (Some("DISABLE"), None, ..) => WpaCommand::Disable,
        (Some("TERMINATE"), None, ..) => WpaCommand::Terminate,
        (Some("RELOAD"), None, ..) => WpaCommand::Reload,
        (Some("RECONFIGURE"), None, ..) => WpaCommand::Reconfigure,
        (Some("GET_CONFIG"), None, ..) => WpaCommand::GetConfig,
        (Some("GET"), Some(property), None, _) => WpaCommand::get(property),
        (Some("SET"), Some(property), Some(value), None) => WpaCommand::set(property, value),
        _ => WpaCommand::raw(line),
    }
}

pub async fn send(
    interface: &str,
    daemon: WpaType,
    config: ControlChannelConfig,
    line: &str,
    json: bool,
) -> anyhow::Result<()> {
    let channel = ControlChannel::with_config(interface, daemon, config);
    let command = parse_command(line);
    let response = channel.send(&command).await?;

    if json {
        match command.decode(&response) {
            Some(decoded) => print_json(&decoded)?,
            None => print_json(&WpaTypedResponse::Raw(response))?,
        }
    } else {
        println!("{}", response);
    }
    Ok(())
}

pub async fn status(
    interface: &str,
    daemon: WpaType,
    config: ControlChannelConfig,
    json: bool,
) -> anyhow::Result<()> {
    let channel = ControlChannel::with_config(interface, daemon, config);
    let status = match channel.request(&WpaCommand::Status).await? {
        Some(WpaTypedResponse::Status(status)) => status,
        _ => anyhow::bail!("{}: STATUS reply did not decode", interface),
    };

    if json {
        return print_json(&status);
    }
    print_status(interface, &status);
    Ok(())
}

fn print_status(interface: &str, status: &WpaStatus) {
    println!("{}: {:?}", interface, status.state);
    if let Some(phy) = &status.phy {
        println!("\tphy {}", phy);
    }
    if let (Some(freq), Some(channel)) = (status.frequency, status.channel) {
        println!("\tchannel {} ({} MHz)", channel, freq);
    }
    let mut modes = Vec::new();
    if status.ieee80211n {
        modes.push("n");
    }
    if status.ieee80211ac {
        modes.push("ac");
    }
    if status.ieee80211ax {
        modes.push("ax");
    }
    if status.ieee80211be {
        modes.push("be");
    }
    if !modes.is_empty() {
        println!("\t802.11{}", modes.join("/"));
    }
    for bss in &status.bss {
        let bssid = bss.bssid.map(|b| b.to_string()).unwrap_or_default();
        println!(
            "\tBSS {} {} ssid {:?} stations {}",
            bss.interface,
            bssid,
            bss.ssid.as_deref().unwrap_or(""),
            bss.num_stations.unwrap_or(0)
        );
    }
}

pub async fn events(
    interface: &str,
    daemon: WpaType,
    config: ControlChannelConfig,
    json: bool,
) -> anyhow::Result<()> {
    let channel = ControlChannel::with_config(interface, daemon, config);
    let cancel = CancellationToken::new();
    let mut events = channel.listen().await?.into_stream(cancel.clone());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.next() => {
                let Some(event) = event else { break };
                let event = event?;
                if json {
                    print_json_line(&event)?;
                } else {
                    let iface = event.interface.as_deref().unwrap_or(interface);
                    println!("{} <{:?}> {}", iface, event.level, event.payload);
                }
            }
        }
    }

    cancel.cancel();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("PING"), WpaCommand::Ping);
        assert_eq!(parse_command("GET ssid"), WpaCommand::get("ssid"));
        assert_eq!(
            parse_command("SET ssid lab"),
            WpaCommand::set("ssid", "lab")
        );
        assert_eq!(parse_command("ALL_STA"), WpaCommand::raw("ALL_STA"));
        assert_eq!(
            parse_command("SET ssid two words"),
            WpaCommand::raw("SET ssid two words")
        );
    }
}
