//! DashboardState - KPIs, Enriched Bins, and Notices
//!
//! Holds the result of the latest aggregation pass. Each pass takes a
//! [`RefreshTicket`]; a snapshot is only applied if no newer pass started
//! after its ticket was issued.

use chrono::{DateTime, Local};

use crate::constants::NOTICE_CAPACITY;
use crate::domain::aggregation::{DashboardSnapshot, DashboardStats, EnrichedBin};
use crate::helpers::BoundedDeque;
use crate::services::ServiceEvent;

/// Generation token for one aggregation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

impl RefreshTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Notice severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

impl NoticeLevel {
    pub fn label(&self) -> &'static str {
        match self {
            NoticeLevel::Info => "INFO",
            NoticeLevel::Warn => "WARN",
            NoticeLevel::Error => "ERROR",
        }
    }
}

/// A user-visible notice derived from a service event
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

/// Dashboard view state
#[derive(Debug)]
pub struct DashboardState {
    /// Generation of the most recently started pass
    generation: u64,
    stats: DashboardStats,
    bins: Vec<EnrichedBin>,
    is_loading: bool,
    last_refreshed_at: Option<DateTime<Local>>,
    /// Recent notices (bounded buffer)
    notices: BoundedDeque<Notice>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            generation: 0,
            stats: DashboardStats::default(),
            bins: Vec::new(),
            is_loading: false,
            last_refreshed_at: None,
            notices: BoundedDeque::new(NOTICE_CAPACITY),
        }
    }

    // ==================== Refresh ====================

    /// Start a new pass; any ticket issued earlier becomes stale
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.generation += 1;
        self.is_loading = true;
        RefreshTicket {
            generation: self.generation,
        }
    }

    /// Apply a pass result if its ticket is still current
    pub fn apply_snapshot(&mut self, ticket: RefreshTicket, snapshot: DashboardSnapshot) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Discarding stale refresh {} (current {})",
                ticket.generation,
                self.generation
            );
            return false;
        }
        self.stats = snapshot.stats;
        self.bins = snapshot.bins;
        self.is_loading = false;
        self.last_refreshed_at = Some(Local::now());
        true
    }

    // ==================== Events ====================

    /// Record a service event as a notice
    pub fn apply_event(&mut self, event: &ServiceEvent) {
        let (level, message) = match event {
            ServiceEvent::StoreFailure { operation, detail } => {
                (NoticeLevel::Error, format!("{operation} failed: {detail}"))
            }
            ServiceEvent::RefreshCompleted {
                bin_count,
                active_bins,
                ..
            } => (
                NoticeLevel::Info,
                format!("Refreshed {bin_count} bins ({active_bins} active today)"),
            ),
            ServiceEvent::PositionSaved { bin_id, .. } => {
                (NoticeLevel::Info, format!("Saved position of bin {bin_id}"))
            }
            ServiceEvent::PositionSaveFailed { bin_id, detail } => (
                NoticeLevel::Warn,
                format!("Position of bin {bin_id} not saved: {detail}"),
            ),
            ServiceEvent::BinRegistered { assigned_id, .. } => {
                (NoticeLevel::Info, format!("Registered bin {assigned_id}"))
            }
        };
        self.notices.push(Notice {
            level,
            message,
            timestamp: Local::now(),
        });
    }

    // ==================== Getters ====================

    pub fn stats(&self) -> DashboardStats {
        self.stats
    }

    pub fn bins(&self) -> &[EnrichedBin] {
        &self.bins
    }

    /// Enriched bin by registry document ID
    pub fn bin(&self, doc_id: &str) -> Option<&EnrichedBin> {
        self.bins.iter().find(|b| b.bin.id == doc_id)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_refreshed_at(&self) -> Option<DateTime<Local>> {
        self.last_refreshed_at
    }

    /// Notices, newest first
    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter_rev()
    }

    pub fn clear_notices(&mut self) {
        self.notices.clear();
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}
