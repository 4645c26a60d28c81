//! Async control layer for Linux WiFi access points.
//!
//! This crate speaks the two interfaces an access point is managed through:
//! the text control socket of `hostapd` / `wpa_supplicant`, and the
//! kernel's `nl80211` generic netlink family. Both are mapped onto one
//! protocol-neutral vocabulary in [`ieee80211`].
//!
//! # Modules
//!
//! - [`wpa`] - control-socket commands, replies, decoders and events
//! - [`netlink`] - generic netlink plumbing and nl80211 adapters
//! - [`discovery`] - access point arrival/departure over nl80211
//! - [`config`] - runtime settings
//!
//! # Example
//!
//! ```rust,no_run
//! use netremote::netlink::nl80211::Nl80211Connection;
//! use netremote::wpa::HostapdController;
//!
//! #[tokio::main]
//! async fn main() -> netremote::Result<()> {
//!     let conn = Nl80211Connection::new().await?;
//!     for ap in conn.access_points().await? {
//!         let hostapd = HostapdController::new(ap.name.clone());
//!         let status = hostapd.status().await?;
//!         println!("{}: {:?} on {:?} MHz", ap.name, status.state, status.frequency);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod ieee80211;
pub mod netlink;
pub mod wpa;

// Re-export common types at crate root for convenience
pub use error::{Error, Result};
