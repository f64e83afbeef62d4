//! Service Events
//!
//! Events emitted by the service layer for the state layer. Failures that
//! are degraded to safe defaults are still reported here.

use std::sync::Arc;

use crate::domain::bin::MapPosition;

/// Events emitted by the service layer
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceEvent {
    /// A store read or write failed and was degraded
    StoreFailure {
        /// Operation name (e.g. "fetch_bins")
        operation: Arc<str>,
        /// Error detail
        detail: Arc<str>,
    },

    /// An aggregation pass finished
    RefreshCompleted {
        /// Generation of the pass
        generation: u64,
        /// Bins in the registry
        bin_count: usize,
        /// Bins active today
        active_bins: usize,
    },

    /// A dragged marker position was written to the registry
    PositionSaved {
        /// Registry document ID
        bin_id: Arc<str>,
        position: MapPosition,
    },

    /// A dragged marker position could not be written (kept on screen)
    PositionSaveFailed {
        bin_id: Arc<str>,
        detail: Arc<str>,
    },

    /// A new bin was registered
    BinRegistered {
        /// Registry document ID
        bin_id: Arc<str>,
        assigned_id: Arc<str>,
    },
}

impl ServiceEvent {
    /// Whether the event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ServiceEvent::StoreFailure { .. } | ServiceEvent::PositionSaveFailed { .. }
        )
    }
}
