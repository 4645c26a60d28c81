//! Process-wide nl80211 identifiers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tokio::sync::Mutex;
use tracing::debug;

use super::{NL80211_GENL_NAME, NL80211_MULTICAST_GROUPS};
use crate::error::{Error, Result};
use crate::netlink::genl::GenlConnection;

/// Resolved nl80211 family and multicast group ids.
///
/// Generic netlink ids are assigned by the kernel at module load, so they
/// are looked up once per process and shared.
#[derive(Debug)]
pub struct Nl80211ProtocolState {
    family_id: u16,
    multicast_group_ids: HashMap<String, u32>,
}

static STATE: OnceLock<StateCell<Nl80211ProtocolState>> = OnceLock::new();

impl Nl80211ProtocolState {
    /// Get the shared instance, resolving it on first use.
    ///
    /// A failed resolution is returned to the caller and not cached; the next
    /// call tries again.
    pub async fn instance() -> Result<Arc<Self>> {
        STATE
            .get_or_init(StateCell::new)
            .get_or_try_init(Self::resolve)
            .await
    }

    /// Drop the shared instance so the next [`instance`](Self::instance)
    /// call resolves again.
    pub fn reset() {
        if let Some(cell) = STATE.get() {
            cell.reset();
        }
    }

    /// The nl80211 generic netlink family id.
    pub fn family_id(&self) -> u16 {
        self.family_id
    }

    /// Id of a named nl80211 multicast group.
    pub fn multicast_group_id(&self, name: &str) -> Option<u32> {
        self.multicast_group_ids.get(name).copied()
    }

    /// All resolved multicast groups.
    pub fn multicast_group_ids(&self) -> &HashMap<String, u32> {
        &self.multicast_group_ids
    }

    async fn resolve() -> Result<Self> {
        let genl = GenlConnection::new()?;
        let family = genl.get_family(NL80211_GENL_NAME).await?;
        Self::from_family(family.id, &family.mcast_groups)
    }

    /// Build the state from a resolved family, requiring every known group.
    pub(crate) fn from_family(family_id: u16, groups: &HashMap<String, u32>) -> Result<Self> {
        let mut multicast_group_ids = HashMap::with_capacity(NL80211_MULTICAST_GROUPS.len());
        for &name in NL80211_MULTICAST_GROUPS {
            let id = groups
                .get(name)
                .copied()
                .ok_or_else(|| Error::MulticastGroupNotFound {
                    family: NL80211_GENL_NAME.to_string(),
                    group: name.to_string(),
                })?;
            multicast_group_ids.insert(name.to_string(), id);
        }

        debug!(family_id, groups = ?multicast_group_ids, "resolved nl80211 protocol state");
        Ok(Self {
            family_id,
            multicast_group_ids,
        })
    }
}

/// One-time initialization cell with fallible async init and reset.
///
/// Readers take the shared lock only. Initializers serialize on `init` and
/// re-check before running, so at most one initialization is in flight.
pub(crate) struct StateCell<T> {
    value: RwLock<Option<Arc<T>>>,
    init: Mutex<()>,
}

impl<T> StateCell<T> {
    pub(crate) fn new() -> Self {
        Self {
            value: RwLock::new(None),
            init: Mutex::new(()),
        }
    }

    fn current(&self) -> Option<Arc<T>> {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.current() {
            return Ok(value);
        }

        let _guard = self.init.lock().await;
        if let Some(value) = self.current() {
            return Ok(value);
        }

        let value = Arc::new(init().await?);
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&value));
        Ok(value)
    }

    pub(crate) fn reset(&self) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
