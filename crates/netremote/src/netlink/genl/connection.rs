//! Generic Netlink connection with family resolution.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::Mutex;
use tracing::debug;

use super::header::split_payload;
use super::{CtrlAttr, CtrlAttrMcastGrp, CtrlCmd, GENL_ID_CTRL};
use crate::error::{Error, Result};
use crate::netlink::attr::AttrTable;
use crate::netlink::builder::MessageBuilder;
use crate::netlink::message::{MessageIter, NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST, NlMsgError};
use crate::netlink::socket::NetlinkSocket;

/// Size of the control family attribute table.
const CTRL_ATTR_TABLE: usize = CtrlAttr::McastGroups as usize + 1;

/// Information about a Generic Netlink family.
#[derive(Debug, Clone)]
pub struct FamilyInfo {
    /// Dynamically assigned family ID (used as nlmsg_type).
    pub id: u16,
    /// Family version.
    pub version: u8,
    /// Header size (additional bytes after genlmsghdr).
    pub hdr_size: u32,
    /// Maximum attribute number.
    pub max_attr: u32,
    /// Multicast groups: name -> group ID.
    pub mcast_groups: HashMap<String, u32>,
}

impl FamilyInfo {
    /// Parse the attributes of a CTRL_CMD_NEWFAMILY reply.
    pub(crate) fn parse(data: &[u8]) -> Result<Self> {
        let attrs = AttrTable::<CTRL_ATTR_TABLE>::parse(data);

        let id = attrs
            .u16(CtrlAttr::FamilyId as u16)
            .ok_or_else(|| Error::InvalidMessage("missing family ID".into()))?;

        let mut mcast_groups = HashMap::new();
        // Nested array: each child is indexed by position, not by type.
        for (_idx, group) in attrs.nested(CtrlAttr::McastGroups as u16) {
            let group = AttrTable::<3>::parse(group);
            let name = group.string(CtrlAttrMcastGrp::Name as u16);
            let grp_id = group.u32(CtrlAttrMcastGrp::Id as u16);
            if let (Some(name), Some(grp_id)) = (name, grp_id) {
                mcast_groups.insert(name, grp_id);
            }
        }

        Ok(Self {
            id,
            version: attrs.u32(CtrlAttr::Version as u16).unwrap_or(0) as u8,
            hdr_size: attrs.u32(CtrlAttr::HdrSize as u16).unwrap_or(0),
            max_attr: attrs.u32(CtrlAttr::MaxAttr as u16).unwrap_or(0),
            mcast_groups,
        })
    }

    /// Look up a multicast group id by name.
    pub fn mcast_group(&self, name: &str) -> Option<u32> {
        self.mcast_groups.get(name).copied()
    }
}

/// Generic Netlink connection.
///
/// Provides family ID resolution and request/dump helpers. Family lookups
/// are cached. Each request/response exchange holds an internal lock so
/// concurrent callers sharing one connection never read each other's
/// replies.
pub struct GenlConnection {
    socket: NetlinkSocket,
    cache: RwLock<HashMap<String, FamilyInfo>>,
    exchange: Mutex<()>,
}

impl GenlConnection {
    /// Create a new Generic Netlink connection.
    pub fn new() -> Result<Self> {
        Ok(Self::from_socket(NetlinkSocket::generic()?))
    }

    /// Create a GENL connection from an existing socket.
    pub fn from_socket(socket: NetlinkSocket) -> Self {
        Self {
            socket,
            cache: RwLock::new(HashMap::new()),
            exchange: Mutex::new(()),
        }
    }

    /// Get information about a Generic Netlink family.
    ///
    /// The result is cached, so subsequent calls for the same family
    /// do not require kernel communication.
    pub async fn get_family(&self, name: &str) -> Result<FamilyInfo> {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(info) = cache.get(name) {
                return Ok(info.clone());
            }
        }

        let info = self.query_family(name).await?;
        debug!(family = name, id = info.id, groups = info.mcast_groups.len(), "resolved genl family");

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), info.clone());

        Ok(info)
    }

    /// Clear the family cache.
    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Query the kernel for family information.
    async fn query_family(&self, name: &str) -> Result<FamilyInfo> {
        let mut builder =
            MessageBuilder::genl(GENL_ID_CTRL, NLM_F_REQUEST | NLM_F_ACK, CtrlCmd::GetFamily as u8, 1);
        builder.append_attr_str(CtrlAttr::FamilyName as u16, name);

        let responses = match self.exchange(builder).await {
            Ok(responses) => responses,
            Err(e) if e.errno() == Some(libc::ENOENT) => {
                return Err(Error::FamilyNotFound {
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let payload = responses.first().ok_or_else(|| Error::FamilyNotFound {
            name: name.to_string(),
        })?;
        let (_hdr, attrs) = split_payload(payload)
            .ok_or_else(|| Error::InvalidMessage("GENL header too short".into()))?;
        FamilyInfo::parse(attrs)
    }

    /// Get the family ID for a Generic Netlink family.
    pub async fn get_family_id(&self, name: &str) -> Result<u16> {
        Ok(self.get_family(name).await?.id)
    }

    /// Send a GENL command and wait for the kernel's ACK.
    ///
    /// The closure appends request attributes. Any data replies the kernel
    /// sends before the ACK are returned, each starting with the GENL header.
    pub async fn command(
        &self,
        family_id: u16,
        cmd: u8,
        version: u8,
        build: impl FnOnce(&mut MessageBuilder),
    ) -> Result<Vec<Vec<u8>>> {
        let mut builder = MessageBuilder::genl(family_id, NLM_F_REQUEST | NLM_F_ACK, cmd, version);
        build(&mut builder);
        self.exchange(builder).await
    }

    /// Send a GENL dump request and collect every reply until NLMSG_DONE.
    pub async fn dump_command(
        &self,
        family_id: u16,
        cmd: u8,
        version: u8,
        build: impl FnOnce(&mut MessageBuilder),
    ) -> Result<Vec<Vec<u8>>> {
        let mut builder = MessageBuilder::genl(family_id, NLM_F_REQUEST | NLM_F_DUMP, cmd, version);
        build(&mut builder);
        self.exchange(builder).await
    }

    async fn exchange(&self, mut builder: MessageBuilder) -> Result<Vec<Vec<u8>>> {
        let flags = builder.flags();
        let dump = flags & NLM_F_DUMP == NLM_F_DUMP;
        let wants_ack = flags & NLM_F_ACK != 0;

        let _guard = self.exchange.lock().await;

        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());
        self.socket.send(&builder.finish()).await?;

        let mut responses = Vec::new();
        loop {
            let data = self.socket.recv_msg().await?;

            for result in MessageIter::new(&data) {
                let (header, payload) = result?;

                if header.nlmsg_seq != seq {
                    continue;
                }

                if header.is_error() {
                    let err = NlMsgError::from_bytes(payload)?;
                    if !err.is_ack() {
                        return Err(Error::from_errno(err.error));
                    }
                    if !dump {
                        return Ok(responses);
                    }
                    continue;
                }

                if header.is_done() {
                    return Ok(responses);
                }

                if header.is_control() {
                    continue;
                }

                responses.push(payload.to_vec());

                if !dump && !wants_ack && !header.is_multi() {
                    return Ok(responses);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::{NLA_F_NESTED, NlAttr, nla_align};

    fn attr(kind: u16, payload: &[u8]) -> Vec<u8> {
        let mut buf = NlAttr::new(kind, payload.len()).as_bytes().to_vec();
        buf.extend_from_slice(payload);
        buf.resize(nla_align(buf.len()), 0);
        buf
    }

    fn mcast_group(index: u16, name: &str, id: u32) -> Vec<u8> {
        let mut inner = attr(CtrlAttrMcastGrp::Name as u16, format!("{name}\0").as_bytes());
        inner.extend(attr(CtrlAttrMcastGrp::Id as u16, &id.to_ne_bytes()));
        attr(index | NLA_F_NESTED, &inner)
    }

    fn nl80211_family() -> Vec<u8> {
        let mut groups = mcast_group(1, "config", 5);
        groups.extend(mcast_group(2, "scan", 6));
        groups.extend(mcast_group(3, "mlme", 8));

        let mut data = attr(CtrlAttr::FamilyName as u16, b"nl80211\0");
        data.extend(attr(CtrlAttr::FamilyId as u16, &0x1cu16.to_ne_bytes()));
        data.extend(attr(CtrlAttr::Version as u16, &1u32.to_ne_bytes()));
        data.extend(attr(CtrlAttr::MaxAttr as u16, &0x14fu32.to_ne_bytes()));
        data.extend(attr(CtrlAttr::McastGroups as u16 | NLA_F_NESTED, &groups));
        data
    }

    #[test]
    fn test_family_info_parse() {
        let info = FamilyInfo::parse(&nl80211_family()).unwrap();
        assert_eq!(info.id, 0x1c);
        assert_eq!(info.version, 1);
        assert_eq!(info.max_attr, 0x14f);
        assert_eq!(info.mcast_group("config"), Some(5));
        assert_eq!(info.mcast_group("mlme"), Some(8));
        assert_eq!(info.mcast_group("vendor"), None);
    }

    #[test]
    fn test_family_info_requires_id() {
        let data = attr(CtrlAttr::FamilyName as u16, b"nl80211\0");
        assert!(matches!(
            FamilyInfo::parse(&data),
            Err(Error::InvalidMessage(_))
        ));
    }
}
