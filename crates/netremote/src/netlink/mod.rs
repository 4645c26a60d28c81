//! Async generic netlink implementation for nl80211.
//!
//! The layering follows the kernel's own:
//!
//! - [`message`] - `nlmsghdr` framing and batched message iteration
//! - [`attr`] - attribute iteration and `nla_parse`-style tables
//! - [`builder`] - request construction with nested attributes
//! - [`socket`] - tokio-driven `NETLINK_GENERIC` socket
//! - [`genl`] - family and multicast group resolution
//! - [`nl80211`] - wireless adapters built on all of the above
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use netremote::netlink::nl80211::Nl80211Connection;
//!
//! # async fn example() -> netremote::Result<()> {
//! let conn = Nl80211Connection::new().await?;
//! for wiphy in conn.wiphys().await? {
//!     println!("{}: {:?}", wiphy.name, wiphy.phy_types());
//! }
//! # Ok(())
//! # }
//! ```

pub mod attr;
pub mod builder;
pub mod genl;
pub mod message;
pub mod nl80211;
pub mod socket;

pub use attr::{AttrIter, AttrTable, NlAttr};
pub use builder::{MessageBuilder, NestToken};
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use socket::NetlinkSocket;
