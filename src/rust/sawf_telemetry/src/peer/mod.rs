//! Per-peer statistics context.

pub(crate) mod queue_stats;

use parking_lot::{Mutex, MutexGuard};
use sawf_utils::{Bitmap, MacAddress};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::moving_average::MovingWindowBuffer;
use crate::{
    CounterSource, StatsHandle, TelemetryError, SAWF_MAX_MSDUQ_PER_TID, SAWF_MAX_QUEUES,
    SAWF_MAX_TID,
};
use queue_stats::{QueueInfo, QueueStats};

/// Stable identity of an attached peer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub(crate) u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

/// Everything guarded by the peer's own lock.
pub(crate) struct PeerState {
    pub(crate) queues: [QueueInfo; SAWF_MAX_QUEUES],
    pub(crate) active: Bitmap,
    pub(crate) msduq_map: [[Option<u8>; SAWF_MAX_MSDUQ_PER_TID]; SAWF_MAX_TID],
    pub(crate) stats: [QueueStats; SAWF_MAX_QUEUES],
    pub(crate) windows: MovingWindowBuffer,
}

impl PeerState {
    pub(crate) fn active_queues(&self) -> impl Iterator<Item = usize> {
        self.active.iter().filter(|q| *q < SAWF_MAX_QUEUES)
    }

    /// Associate a host queue with a TID/MSDU-queue pair. Arguments are
    /// already range checked.
    pub(crate) fn map_queue(&mut self, queue: u8, tid: u8, msdu_queue: u8) {
        let info = &mut self.queues[queue as usize];
        info.tid = tid;
        info.msdu_queue = msdu_queue;
        self.msduq_map[tid as usize][msdu_queue as usize] = Some(queue);
        self.active.set(queue as usize);
    }

    /// Host queue currently mapped to a TID/MSDU-queue pair.
    pub(crate) fn host_queue(&self, tid: u8, msdu_queue: u8) -> Option<u8> {
        self.msduq_map
            .get(tid as usize)
            .and_then(|row| row.get(msdu_queue as usize))
            .copied()
            .flatten()
    }
}

pub(crate) struct PeerContext {
    pub(crate) id: PeerId,
    pub(crate) mac: MacAddress,
    pub(crate) source: Arc<dyn CounterSource>,
    pub(crate) stats_handle: StatsHandle,
    detached: AtomicBool,
    state: Mutex<PeerState>,
}

impl PeerContext {
    pub(crate) fn new(
        id: PeerId,
        source: Arc<dyn CounterSource>,
        stats_handle: StatsHandle,
        mac: MacAddress,
        service_class_id: u8,
        queue: u8,
        window_count: u32,
    ) -> Result<Self, TelemetryError> {
        check_queue(queue)?;
        let windows = MovingWindowBuffer::allocate(window_count)?;
        let mut state = PeerState {
            queues: [QueueInfo::default(); SAWF_MAX_QUEUES],
            active: Bitmap::new(),
            msduq_map: [[None; SAWF_MAX_MSDUQ_PER_TID]; SAWF_MAX_TID],
            stats: [QueueStats::default(); SAWF_MAX_QUEUES],
            windows,
        };
        state.queues[queue as usize].service_class_id = service_class_id;
        state.active.set(queue as usize);

        Ok(Self {
            id,
            mac,
            source,
            stats_handle,
            detached: AtomicBool::new(false),
            state: Mutex::new(state),
        })
    }

    /// Lock the peer for an update. Fails once the peer has been freed.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, PeerState>, TelemetryError> {
        let state = self.state.lock();
        if self.detached.load(Ordering::Acquire) {
            return Err(TelemetryError::PeerDetached);
        }
        Ok(state)
    }

    /// Mark the peer as freed. Waits for any update in progress.
    pub(crate) fn detach(&self) {
        let _state = self.state.lock();
        self.detached.store(true, Ordering::Release);
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    pub(crate) fn reset_stats(&self) {
        let mut state = self.state.lock();
        state.stats = [QueueStats::default(); SAWF_MAX_QUEUES];
    }
}

/// A caller's reference to an attached peer. Handles stay valid to hold
/// after `free_peer`; every call made through them is then rejected.
#[derive(Clone)]
pub struct PeerHandle {
    pub(crate) peer: Arc<PeerContext>,
}

impl PeerHandle {
    /// The peer's stable id.
    pub fn id(&self) -> PeerId {
        self.peer.id
    }

    /// The peer's MAC address.
    pub fn mac(&self) -> MacAddress {
        self.peer.mac
    }

    /// Has the peer been freed?
    pub fn is_detached(&self) -> bool {
        self.peer.is_detached()
    }
}

impl fmt::Debug for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerHandle")
            .field("id", &self.peer.id)
            .field("mac", &self.peer.mac)
            .finish()
    }
}

pub(crate) fn check_queue(queue: u8) -> Result<(), TelemetryError> {
    if (queue as usize) < SAWF_MAX_QUEUES {
        Ok(())
    } else {
        Err(TelemetryError::InvalidQueue(queue))
    }
}

pub(crate) fn check_tid(tid: u8) -> Result<(), TelemetryError> {
    if (tid as usize) < SAWF_MAX_TID {
        Ok(())
    } else {
        Err(TelemetryError::InvalidTid(tid))
    }
}

pub(crate) fn check_msdu_queue(msdu_queue: u8) -> Result<(), TelemetryError> {
    if (msdu_queue as usize) < SAWF_MAX_MSDUQ_PER_TID {
        Ok(())
    } else {
        Err(TelemetryError::InvalidMsduQueue(msdu_queue))
    }
}
