//! nl80211 request connection.

use std::sync::Arc;

use tracing::debug;

use super::wiphy::merge_parts;
use super::{
    NL80211_GENL_VERSION, Nl80211Attr, Nl80211Cmd, Nl80211Interface, Nl80211ProtocolState,
    Nl80211Wiphy,
};
use crate::error::{Error, Result};
use crate::netlink::genl::{GenlConnection, split_payload};

/// Connection for querying wireless devices over nl80211.
///
/// Wraps a Generic Netlink connection addressed at the nl80211 family id
/// held in the shared [`Nl80211ProtocolState`].
pub struct Nl80211Connection {
    genl: GenlConnection,
    state: Arc<Nl80211ProtocolState>,
}

impl Nl80211Connection {
    /// Open a new nl80211 connection, resolving the family on first use.
    pub async fn new() -> Result<Self> {
        let state = Nl80211ProtocolState::instance().await?;
        Ok(Self {
            genl: GenlConnection::new()?,
            state,
        })
    }

    /// Get the underlying GENL connection.
    pub fn genl(&self) -> &GenlConnection {
        &self.genl
    }

    /// Get the shared protocol state.
    pub fn state(&self) -> &Arc<Nl80211ProtocolState> {
        &self.state
    }

    /// List every wiphy on the system.
    pub async fn wiphys(&self) -> Result<Vec<Nl80211Wiphy>> {
        let responses = self
            .genl
            .dump_command(
                self.state.family_id(),
                Nl80211Cmd::GetWiphy as u8,
                NL80211_GENL_VERSION,
                |builder| builder.append_attr_flag(Nl80211Attr::SplitWiphyDump as u16),
            )
            .await
            .map_err(|e| e.with_context("dumping wiphys"))?;

        let parts = responses
            .iter()
            .filter_map(|r| split_payload(r))
            .filter_map(|(_, attrs)| Nl80211Wiphy::parse(attrs));
        let wiphys = merge_parts(parts);
        debug!(count = wiphys.len(), messages = responses.len(), "dumped wiphys");
        Ok(wiphys)
    }

    /// Fetch one wiphy by index.
    ///
    /// Uses a filtered split dump so that large band tables are not
    /// truncated.
    pub async fn wiphy(&self, index: u32) -> Result<Nl80211Wiphy> {
        let responses = self
            .genl
            .dump_command(
                self.state.family_id(),
                Nl80211Cmd::GetWiphy as u8,
                NL80211_GENL_VERSION,
                |builder| {
                    builder.append_attr_u32(Nl80211Attr::Wiphy as u16, index);
                    builder.append_attr_flag(Nl80211Attr::SplitWiphyDump as u16);
                },
            )
            .await
            .map_err(|e| match e.errno() {
                Some(libc::ENODEV) | Some(libc::ENOENT) => Error::WiphyNotFound { index },
                _ => e.with_context(format!("dumping wiphy {}", index)),
            })?;

        let parts = responses
            .iter()
            .filter_map(|r| split_payload(r))
            .filter_map(|(_, attrs)| Nl80211Wiphy::parse(attrs))
            .filter(|w| w.index == index);

        merge_parts(parts)
            .into_iter()
            .next()
            .ok_or(Error::WiphyNotFound { index })
    }

    /// List every wireless interface on the system.
    pub async fn interfaces(&self) -> Result<Vec<Nl80211Interface>> {
        let responses = self
            .genl
            .dump_command(
                self.state.family_id(),
                Nl80211Cmd::GetInterface as u8,
                NL80211_GENL_VERSION,
                |_| {},
            )
            .await
            .map_err(|e| e.with_context("dumping interfaces"))?;

        Ok(responses
            .iter()
            .filter_map(|r| split_payload(r))
            .filter_map(|(_, attrs)| Nl80211Interface::parse(attrs))
            .collect())
    }

    /// Look up one wireless interface by name.
    pub async fn interface(&self, name: &str) -> Result<Nl80211Interface> {
        self.interfaces()
            .await?
            .into_iter()
            .find(|iface| iface.name == name)
            .ok_or_else(|| Error::InterfaceNotFound {
                name: name.to_string(),
            })
    }

    /// List the interfaces currently operating as access points.
    pub async fn access_points(&self) -> Result<Vec<Nl80211Interface>> {
        Ok(self
            .interfaces()
            .await?
            .into_iter()
            .filter(Nl80211Interface::is_access_point)
            .collect())
    }
}
