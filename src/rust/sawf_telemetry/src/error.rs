use sawf_config::SawfConfigError;
use thiserror::Error;

/// Errors returned by peer lifecycle and data-path calls. Detector
/// outcomes are never reported here; they go to the breach notifier.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The peer context or its moving-average buffer could not be allocated
    #[error("Unable to allocate SAWF peer context")]
    AllocationFailure,

    /// The handle refers to a peer that has been freed
    #[error("Peer has been detached from the telemetry engine")]
    PeerDetached,

    /// Host queue ids run from 0 to 15
    #[error("Invalid host queue id {0}")]
    InvalidQueue(u8),

    /// TIDs run from 0 to 7
    #[error("Invalid TID {0}")]
    InvalidTid(u8),

    /// Each TID has two MSDU queues
    #[error("Invalid MSDU queue index {0}")]
    InvalidMsduQueue(u8),

    /// The configuration rejected a value needed to build the peer
    #[error(transparent)]
    Config(#[from] SawfConfigError),
}
