//! The set of attached peers, in attach order.

use sawf_utils::MacAddress;
use std::sync::Arc;

use crate::peer::{PeerContext, PeerId};
use crate::timers::SlaTimers;

/// Owned by the engine behind its registry lock. Holding the lock gives a
/// sweep exclusive use of the membership; insert, remove and reset wait
/// for it.
pub(crate) struct Registry {
    peers: Vec<Arc<PeerContext>>,
    next_id: u64,
    /// Running while at least one peer is attached
    pub(crate) timers: Option<SlaTimers>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            peers: Vec::new(),
            next_id: 1,
            timers: None,
        }
    }

    pub(crate) fn allocate_id(&mut self) -> PeerId {
        let id = PeerId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn insert(&mut self, peer: Arc<PeerContext>) {
        self.peers.push(peer);
    }

    pub(crate) fn remove(&mut self, id: PeerId) -> Option<Arc<PeerContext>> {
        let index = self.peers.iter().position(|p| p.id == id)?;
        Some(self.peers.remove(index))
    }

    pub(crate) fn find_by_mac(&self, mac: MacAddress) -> Option<&Arc<PeerContext>> {
        self.peers.iter().find(|p| p.mac == mac)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<PeerContext>> {
        self.peers.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.peers.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub(crate) fn drain(&mut self) -> Vec<Arc<PeerContext>> {
        std::mem::take(&mut self.peers)
    }
}
