//! nl80211 tests against the running kernel.
//!
//! These need the `nl80211` family (a wireless driver or `mac80211_hwsim`)
//! and skip otherwise:
//!
//! ```bash
//! sudo modprobe mac80211_hwsim radios=2
//! cargo test -p netremote --features integration --test nl80211
//! ```

#[macro_use]
#[path = "common/mod.rs"]
mod common;

use std::sync::Arc;

use netremote::Result;
use netremote::ieee80211::Ieee80211PhyType;
use netremote::netlink::nl80211::{
    NL80211_MULTICAST_GROUP_CONFIG, Nl80211Connection, Nl80211Interface, Nl80211ProtocolState,
    Nl80211Wiphy,
};

#[tokio::test]
async fn test_protocol_state_is_shared() -> Result<()> {
    require_nl80211!();

    let first = Nl80211ProtocolState::instance().await?;
    let second = Nl80211ProtocolState::instance().await?;
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.family_id() > 0);
    assert!(first.multicast_group_id(NL80211_MULTICAST_GROUP_CONFIG).is_some());
    Ok(())
}

#[tokio::test]
async fn test_enumerate_wiphys() -> Result<()> {
    require_nl80211!();

    let conn = Nl80211Connection::new().await?;
    for wiphy in conn.wiphys().await? {
        let phy_types = wiphy.phy_types();
        assert!(phy_types.contains(&Ieee80211PhyType::B));
        assert!(phy_types.contains(&Ieee80211PhyType::G));
        assert!(phy_types.windows(2).all(|w| w[0] < w[1]));

        let again = Nl80211Wiphy::from_index(&conn, wiphy.index).await?;
        assert_eq!(again.index, wiphy.index);
        assert_eq!(again.name, wiphy.name);
    }
    Ok(())
}

#[tokio::test]
async fn test_missing_wiphy() -> Result<()> {
    require_nl80211!();

    let conn = Nl80211Connection::new().await?;
    let err = Nl80211Wiphy::from_index(&conn, u32::MAX - 1).await.unwrap_err();
    assert!(matches!(err, netremote::Error::WiphyNotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn test_enumerate_interfaces() -> Result<()> {
    require_nl80211!();

    let conn = Nl80211Connection::new().await?;
    let interfaces = Nl80211Interface::enumerate(&conn).await?;
    for iface in &interfaces {
        assert!(!iface.name.is_empty());
        let by_name = conn.interface(&iface.name).await?;
        assert_eq!(by_name.index, iface.index);
    }

    let access_points = conn.access_points().await?;
    assert!(access_points.iter().all(Nl80211Interface::is_access_point));
    Ok(())
}
