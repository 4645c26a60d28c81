//! Common test utilities for integration tests.
//!
//! Provides `FakeDaemon`, an in-process stand-in for a hostapd control
//! socket, and helper macros for conditional test execution.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use netremote::config::ControlChannelConfig;
use tempfile::TempDir;
use tokio::net::UnixDatagram;
use tokio::task::JoinHandle;

/// Canned `STATUS` reply of a single-BSS 5 GHz access point.
pub const STATUS_REPLY: &str = "\
state=ENABLED
phy=phy0
freq=5180
num_sta_non_erp=0
ieee80211n=1
ieee80211ac=1
ieee80211ax=0
beacon_int=100
dtim_period=2
channel=36
bss[0]=wlan0
bssid[0]=02:00:00:00:03:00
ssid[0]=TestNetwork
num_sta[0]=1
";

/// A control socket served by a task in this process.
///
/// The socket lives in a temporary directory that is removed on drop.
/// Every received command is recorded; the handler returns the datagrams
/// to send back, in order.
pub struct FakeDaemon {
    dir: TempDir,
    received: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl FakeDaemon {
    /// Serve `interface` with `handler`.
    pub fn spawn<F>(interface: &str, handler: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + Send + 'static,
    {
        let dir = tempfile::tempdir().expect("create socket directory");
        let socket = UnixDatagram::bind(dir.path().join(interface)).expect("bind fake daemon");
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&received);
        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                let command = String::from_utf8_lossy(&buf[..len]).into_owned();
                log.lock().unwrap().push(command.clone());

                let Some(peer) = peer.as_pathname().map(|p| p.to_path_buf()) else {
                    continue;
                };
                for reply in handler(&command) {
                    let _ = socket.send_to(reply.as_bytes(), &peer).await;
                }
            }
        });

        Self {
            dir,
            received,
            task,
        }
    }

    /// Serve `interface` like a running hostapd.
    pub fn hostapd(interface: &str) -> Self {
        Self::spawn(interface, hostapd_reply)
    }

    /// Configuration pointing a channel at this daemon.
    pub fn config(&self) -> ControlChannelConfig {
        ControlChannelConfig::default()
            .hostapd_control_dir(self.dir.path())
            .local_socket_dir(self.dir.path())
    }

    /// Commands received so far.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Replies of a hostapd with one enabled BSS.
pub fn hostapd_reply(command: &str) -> Vec<String> {
    let reply = match command {
        "PING" => "PONG\n".to_string(),
        "STATUS" => STATUS_REPLY.to_string(),
        "ENABLE" | "DISABLE" | "RELOAD" | "ATTACH" | "DETACH" => "OK\n".to_string(),
        // Stays silent so the caller times out.
        "SLOW" => return Vec::new(),
        _ => match command.strip_prefix("GET ") {
            Some("ssid") => "ssid=TestNetwork\n".to_string(),
            Some(property) => format!("{}=value-of-{}\n", property, property),
            None => "UNKNOWN COMMAND\n".to_string(),
        },
    };
    vec![reply]
}

/// Check if the nl80211 family is registered with the kernel.
pub async fn has_nl80211() -> bool {
    netremote::netlink::nl80211::Nl80211ProtocolState::instance()
        .await
        .is_ok()
}

/// Skip the test if nl80211 is unavailable.
///
/// Use this at the beginning of tests that talk to the kernel.
#[macro_export]
macro_rules! require_nl80211 {
    () => {
        if !crate::common::has_nl80211().await {
            eprintln!("Skipping test: nl80211 not available");
            return Ok(());
        }
    };
}
