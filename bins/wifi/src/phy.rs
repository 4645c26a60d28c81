//! nl80211 commands: phy, dev and monitor.

use netremote::config::DiscoveryConfig;
use netremote::discovery::{AccessPointDiscoveryAgent, AccessPointPresence};
use netremote::netlink::nl80211::{Nl80211Connection, Nl80211Interface, Nl80211Wiphy};
use tokio_stream::StreamExt;

use crate::output::{band_name, format_bitrate, format_mbm, print_json, print_json_line};

pub async fn show_wiphys(index: Option<u32>, json: bool) -> anyhow::Result<()> {
    let conn = Nl80211Connection::new().await?;
    let wiphys = match index {
        Some(index) => vec![Nl80211Wiphy::from_index(&conn, index).await?],
        None => conn.wiphys().await?,
    };

    if json {
        return print_json(&wiphys);
    }

    for wiphy in &wiphys {
        print_wiphy(wiphy);
    }
    Ok(())
}

fn print_wiphy(wiphy: &Nl80211Wiphy) {
    println!("Wiphy {} (index {})", wiphy.name, wiphy.index);

    let phy_types: Vec<_> = wiphy.phy_types().iter().map(|t| t.to_string()).collect();
    println!("\tPHY types: {}", phy_types.join(" "));

    let security: Vec<_> = wiphy
        .security_protocols()
        .iter()
        .map(|p| format!("{:?}", p))
        .collect();
    println!("\tSecurity: {}", security.join(" "));
    println!("\tAP mode: {}", if wiphy.supports_ap() { "yes" } else { "no" });

    if !wiphy.cipher_suites.is_empty() {
        println!("\tCiphers:");
        for cipher in &wiphy.cipher_suites {
            println!("\t\t* {}", cipher);
        }
    }

    for (band, data) in &wiphy.bands {
        println!("\tBand {}:", band_name(*band));
        if data.ht_capabilities != 0 {
            println!("\t\tHT capabilities: 0x{:04x}", data.ht_capabilities);
        }
        if data.vht_capabilities != 0 {
            println!("\t\tVHT capabilities: 0x{:08x}", data.vht_capabilities);
        }
        if !data.bitrates.is_empty() {
            let rates: Vec<_> = data.bitrates.iter().map(|r| format_bitrate(*r)).collect();
            println!("\t\tBitrates: {}", rates.join(", "));
        }
        println!("\t\tFrequencies:");
        for freq in &data.frequencies {
            let mut flags = Vec::new();
            if freq.is_disabled {
                flags.push("disabled");
            }
            if freq.is_no_ir {
                flags.push("no IR");
            }
            if freq.is_radar {
                flags.push("radar detection");
            }
            let power = freq
                .max_tx_power
                .map(|p| format!(" ({})", format_mbm(p)))
                .unwrap_or_default();
            if flags.is_empty() {
                println!("\t\t\t* {} MHz{}", freq.frequency, power);
            } else {
                println!("\t\t\t* {} MHz{} ({})", freq.frequency, power, flags.join(", "));
            }
        }
    }
}

pub async fn show_interfaces(json: bool) -> anyhow::Result<()> {
    let conn = Nl80211Connection::new().await?;
    let interfaces = Nl80211Interface::enumerate(&conn).await?;

    if json {
        return print_json(&interfaces);
    }

    for iface in &interfaces {
        print_interface(iface);
    }
    Ok(())
}

fn print_interface(iface: &Nl80211Interface) {
    println!("Interface {}", iface.name);
    println!("\tifindex {}", iface.index);
    println!("\twiphy {}", iface.wiphy_index);
    if let Some(mac) = iface.mac {
        println!("\taddr {}", mac);
    }
    println!("\ttype {}", iface.interface_type);
    if let Some(ssid) = &iface.ssid {
        println!("\tssid {}", ssid);
    }
    if let Some(freq) = iface.frequency {
        println!("\tchannel frequency {} MHz", freq);
    }
    if let Some(power) = iface.tx_power {
        println!("\ttxpower {}", format_mbm(power));
    }
}

pub async fn monitor(probe_existing: bool, json: bool) -> anyhow::Result<()> {
    let config = DiscoveryConfig::default().probe_existing(probe_existing);
    let mut agent = AccessPointDiscoveryAgent::new(config);
    let mut events = agent.start().await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.next() => {
                let Some(event) = event else { break };
                if json {
                    print_json_line(&event)?;
                    continue;
                }
                let action = match event.presence {
                    AccessPointPresence::Arrived => "+",
                    AccessPointPresence::Departed => "-",
                };
                println!(
                    "{} {} (ifindex {}, phy{})",
                    action, event.interface.name, event.interface.index, event.interface.wiphy_index
                );
            }
        }
    }

    agent.stop();
    Ok(())
}
