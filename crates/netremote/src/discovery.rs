//! Access point arrival and departure.
//!
//! The agent subscribes to the nl80211 `config` multicast group and turns
//! `NEW_INTERFACE` / `SET_INTERFACE` / `DEL_INTERFACE` notifications into
//! [`AccessPointEvent`]s.
//!
//! ```rust,no_run
//! use netremote::config::DiscoveryConfig;
//! use netremote::discovery::AccessPointDiscoveryAgent;
//! use tokio_stream::StreamExt;
//!
//! # async fn example() -> netremote::Result<()> {
//! let mut agent = AccessPointDiscoveryAgent::new(DiscoveryConfig::default());
//! let mut events = agent.start().await?;
//! while let Some(event) = events.next().await {
//!     println!("{:?} {}", event.presence, event.interface.name);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DiscoveryConfig;
use crate::error::{Error, Result};
use crate::netlink::genl::split_payload;
use crate::netlink::nl80211::{
    NL80211_GENL_NAME, NL80211_MULTICAST_GROUP_CONFIG, Nl80211Cmd, Nl80211Connection,
    Nl80211Interface, Nl80211ProtocolState,
};
use crate::netlink::{MessageIter, NetlinkSocket};

/// Whether an access point appeared or went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPointPresence {
    Arrived,
    Departed,
}

/// A change in the set of access point interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPointEvent {
    pub presence: AccessPointPresence,
    pub interface: Nl80211Interface,
}

impl AccessPointEvent {
    fn arrived(interface: Nl80211Interface) -> Self {
        Self {
            presence: AccessPointPresence::Arrived,
            interface,
        }
    }

    fn departed(interface: Nl80211Interface) -> Self {
        Self {
            presence: AccessPointPresence::Departed,
            interface,
        }
    }
}

/// Access point interfaces seen so far, keyed by ifindex.
#[derive(Debug, Default)]
struct AccessPointTracker {
    known: HashMap<u32, Nl80211Interface>,
}

impl AccessPointTracker {
    fn seed(&mut self, interfaces: Vec<Nl80211Interface>) -> Vec<AccessPointEvent> {
        interfaces
            .into_iter()
            .filter_map(|iface| self.observe(Nl80211Cmd::NewInterface, iface))
            .collect()
    }

    fn observe(&mut self, cmd: Nl80211Cmd, iface: Nl80211Interface) -> Option<AccessPointEvent> {
        match cmd {
            Nl80211Cmd::NewInterface | Nl80211Cmd::SetInterface => {
                if iface.is_access_point() {
                    if self.known.contains_key(&iface.index) {
                        self.known.insert(iface.index, iface);
                        return None;
                    }
                    self.known.insert(iface.index, iface.clone());
                    Some(AccessPointEvent::arrived(iface))
                } else {
                    // An access point switched to another mode.
                    self.known
                        .remove(&iface.index)
                        .map(|_| AccessPointEvent::departed(iface))
                }
            }
            Nl80211Cmd::DelInterface => match self.known.remove(&iface.index) {
                Some(known) => Some(AccessPointEvent::departed(known)),
                None if iface.is_access_point() => Some(AccessPointEvent::departed(iface)),
                None => None,
            },
            _ => None,
        }
    }
}

/// Decode the interface notifications in one netlink datagram.
fn decode_events(
    data: &[u8],
    family_id: u16,
    tracker: &mut AccessPointTracker,
) -> Vec<AccessPointEvent> {
    let mut events = Vec::new();
    for msg in MessageIter::new(data) {
        let (header, payload) = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "malformed nl80211 notification");
                break;
            }
        };
        if header.nlmsg_type != family_id {
            continue;
        }
        let Some((genl, attrs)) = split_payload(payload) else {
            continue;
        };
        let Some(cmd) = Nl80211Cmd::from_u8(genl.cmd) else {
            continue;
        };
        if !matches!(
            cmd,
            Nl80211Cmd::NewInterface | Nl80211Cmd::SetInterface | Nl80211Cmd::DelInterface
        ) {
            continue;
        }
        let Some(iface) = Nl80211Interface::parse(attrs) else {
            continue;
        };
        debug!(?cmd, interface = %iface.name, "nl80211 interface notification");
        events.extend(tracker.observe(cmd, iface));
    }
    events
}

/// Watches nl80211 for access point interfaces on a background task.
///
/// Dropping the agent stops the task.
#[derive(Debug)]
pub struct AccessPointDiscoveryAgent {
    config: DiscoveryConfig,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl AccessPointDiscoveryAgent {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    /// Whether the background task is running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start watching. A running agent is stopped first.
    ///
    /// With [`DiscoveryConfig::probe_existing`], the stream starts with an
    /// `Arrived` event for every access point that already exists.
    pub async fn start(&mut self) -> Result<ReceiverStream<AccessPointEvent>> {
        self.stop();

        let state = Nl80211ProtocolState::instance().await?;
        let group = state
            .multicast_group_id(NL80211_MULTICAST_GROUP_CONFIG)
            .ok_or_else(|| Error::MulticastGroupNotFound {
                family: NL80211_GENL_NAME.to_string(),
                group: NL80211_MULTICAST_GROUP_CONFIG.to_string(),
            })?;

        // Subscribe before probing so no change falls between the two.
        let mut socket = NetlinkSocket::generic()?;
        socket.add_membership(group)?;

        let mut tracker = AccessPointTracker::default();
        let initial = if self.config.probe_existing {
            let conn = Nl80211Connection::new().await?;
            tracker.seed(conn.access_points().await?)
        } else {
            Vec::new()
        };

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let cancel = CancellationToken::new();
        self.cancel = cancel.clone();

        let family_id = state.family_id();
        info!(existing = initial.len(), "access point discovery started");
        self.task = Some(tokio::spawn(async move {
            for event in initial {
                if tx.send(event).await.is_err() {
                    return;
                }
            }

            loop {
                let data = tokio::select! {
                    _ = cancel.cancelled() => break,
                    data = socket.recv_msg() => match data {
                        Ok(data) => data,
                        Err(e) => {
                            warn!(error = %e, "nl80211 notification socket failed");
                            break;
                        }
                    },
                };

                for event in decode_events(&data, family_id, &mut tracker) {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
            debug!("access point discovery stopped");
        }));

        Ok(ReceiverStream::new(rx))
    }

    /// Stop watching. The event stream ends.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        self.task = None;
    }
}

impl Drop for AccessPointDiscoveryAgent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
