//! wifi - access point diagnostics
//!
//! Lists nl80211 radios and interfaces and talks to hostapd control sockets.

mod ctl;
mod output;
mod phy;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use netremote::config::ControlChannelConfig;
use netremote::wpa::WpaType;

#[derive(Parser)]
#[command(name = "wifi", version, about = "Access point diagnostics")]
struct Cli {
    /// Output JSON.
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Talk to wpa_supplicant instead of hostapd.
    #[arg(long, global = true)]
    supplicant: bool,

    /// Control socket directory.
    #[arg(long, global = true)]
    ctrl_dir: Option<PathBuf>,

    /// Reply timeout in milliseconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show wireless radios.
    Phy {
        /// Wiphy index (shows all if omitted).
        index: Option<u32>,
    },

    /// Show wireless interfaces.
    Dev,

    /// Send a control command.
    Ctl {
        /// Interface name.
        interface: String,
        /// Command and arguments, e.g. `GET ssid`.
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },

    /// Show decoded STATUS of an interface.
    Status {
        /// Interface name.
        interface: String,
    },

    /// Print control-socket events of an interface.
    Events {
        /// Interface name.
        interface: String,
    },

    /// Print access point arrivals and departures.
    Monitor {
        /// Do not report access points that already exist.
        #[arg(long)]
        new_only: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let daemon = if cli.supplicant {
        WpaType::WpaSupplicant
    } else {
        WpaType::Hostapd
    };
    let mut config = ControlChannelConfig::default();
    if let Some(dir) = cli.ctrl_dir {
        config = match daemon {
            WpaType::Hostapd => config.hostapd_control_dir(dir),
            WpaType::WpaSupplicant => config.wpa_supplicant_control_dir(dir),
        };
    }
    if let Some(ms) = cli.timeout {
        config = config.recv_timeout(Duration::from_millis(ms));
    }

    match cli.command {
        Command::Phy { index } => phy::show_wiphys(index, cli.json).await,
        Command::Dev => phy::show_interfaces(cli.json).await,
        Command::Ctl { interface, command } => {
            ctl::send(&interface, daemon, config, &command.join(" "), cli.json).await
        }
        Command::Status { interface } => ctl::status(&interface, daemon, config, cli.json).await,
        Command::Events { interface } => ctl::events(&interface, daemon, config, cli.json).await,
        Command::Monitor { new_only } => phy::monitor(!new_only, cli.json).await,
    }
}
