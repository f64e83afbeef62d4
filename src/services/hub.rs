//! Bin Service
//!
//! Entry point for everything that touches the document store. Reads are
//! degraded to safe defaults on failure and reported on the event channel;
//! validation failures are returned to the caller.

use chrono::{DateTime, Local, TimeZone};
use crossbeam_channel::{Receiver, Sender};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::aggregation::{
    BinReading, DashboardSnapshot, DashboardStats, EnrichedBin, aggregate, day_start_millis,
};
use crate::domain::bin::{BinRecord, MapPosition, NewBin, next_assigned_id, parse_assigned_id};
use crate::domain::sensor_log::{SensorLog, latest_reading, sort_newest_first};
use crate::error::{Error, Result};
use crate::services::events::ServiceEvent;
use crate::services::runtime::spawn_named_in_tokio;
use crate::services::store::{BinRegistry, SensorLogSource};
use crate::state::{DashboardState, Shared};

/// Store-backed operations for the dashboard, registry, and map
pub struct BinService {
    /// Bin registry collection
    registry: Arc<dyn BinRegistry>,
    /// Sensor log collection
    logs: Arc<dyn SensorLogSource>,
    /// Event sender
    tx: Sender<ServiceEvent>,
    /// Event receiver (for the state layer)
    rx: Receiver<ServiceEvent>,
}

impl BinService {
    /// Create a service over the two collections
    pub fn new(registry: Arc<dyn BinRegistry>, logs: Arc<dyn SensorLogSource>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            registry,
            logs,
            tx,
            rx,
        }
    }

    /// Create a service over one store that serves both collections
    pub fn with_store<S>(store: Arc<S>) -> Self
    where
        S: BinRegistry + SensorLogSource,
    {
        Self::new(store.clone(), store)
    }

    /// Receiver for service events
    pub fn events(&self) -> Receiver<ServiceEvent> {
        self.rx.clone()
    }

    fn emit(&self, event: ServiceEvent) {
        let _ = self.tx.send(event);
    }

    fn report_failure(&self, operation: &str, err: &Error) {
        error!("{} failed: {}", operation, err);
        self.emit(ServiceEvent::StoreFailure {
            operation: operation.into(),
            detail: err.to_string().into(),
        });
    }

    // ==================== Registry ====================

    /// All registry records; empty when the store cannot be read
    pub async fn fetch_bins(&self) -> Vec<BinRecord> {
        debug!("Fetching bin registry");
        match self.registry.list_bins().await {
            Ok(bins) => bins,
            Err(e) => {
                self.report_failure("fetch_bins", &e);
                Vec::new()
            }
        }
    }

    /// Next free assigned ID (highest numeric ID + 1, or "1")
    pub async fn next_available_id(&self) -> Result<String> {
        let bins = self
            .registry
            .list_bins()
            .await
            .inspect_err(|e| self.report_failure("next_available_id", e))?;
        Ok(next_assigned_id(bins.iter().map(|b| b.assigned_id.as_str())))
    }

    /// Register a new bin after checking its hardware address is unused
    pub async fn register_bin(&self, hardware_address: &str, assigned_id: &str) -> Result<BinRecord> {
        let address = hardware_address.trim();
        if address.is_empty() {
            warn!("Rejected bin registration without hardware address");
            return Err(Error::EmptyField {
                field: "hardware address",
            });
        }
        let assigned_id = assigned_id.trim();
        if assigned_id.is_empty() {
            warn!("Rejected bin registration without assigned ID");
            return Err(Error::EmptyField {
                field: "assigned ID",
            });
        }

        let bins = self
            .registry
            .list_bins()
            .await
            .inspect_err(|e| self.report_failure("register_bin", e))?;
        if let Some(existing) = bins.iter().find(|b| b.has_hardware_address(address)) {
            warn!(
                "Hardware address {} already registered as bin {}",
                address, existing.assigned_id
            );
            return Err(Error::DuplicateHardwareAddress {
                address: address.to_string(),
                assigned_id: existing.assigned_id.clone(),
            });
        }

        let record = self
            .registry
            .insert_bin(NewBin::new(address, assigned_id))
            .await
            .inspect_err(|e| self.report_failure("register_bin", e))?;

        info!("Registered bin {} ({})", record.assigned_id, record.hardware_address);
        self.emit(ServiceEvent::BinRegistered {
            bin_id: record.id.as_str().into(),
            assigned_id: record.assigned_id.as_str().into(),
        });
        Ok(record)
    }

    /// Write a bin position and wait for the result
    pub async fn update_bin_position(&self, doc_id: &str, position: MapPosition) -> Result<()> {
        self.registry
            .update_position(doc_id, position)
            .await
            .inspect_err(|e| self.report_failure("update_bin_position", e))?;
        self.emit(ServiceEvent::PositionSaved {
            bin_id: doc_id.into(),
            position,
        });
        Ok(())
    }

    /// Write a bin position in the background
    ///
    /// The caller has already moved the marker. A failed write is logged and
    /// reported as `PositionSaveFailed`; nothing is rolled back.
    pub fn persist_position_detached(&self, doc_id: Arc<str>, position: MapPosition) {
        let registry = self.registry.clone();
        let tx = self.tx.clone();
        spawn_named_in_tokio("persist_position", async move {
            let event = match registry.update_position(&doc_id, position).await {
                Ok(()) => {
                    info!("Saved position of bin {} ({:.1}, {:.1})", doc_id, position.x, position.y);
                    ServiceEvent::PositionSaved {
                        bin_id: doc_id,
                        position,
                    }
                }
                Err(e) => {
                    error!("Failed to save position of bin {}: {}", doc_id, e);
                    ServiceEvent::PositionSaveFailed {
                        bin_id: doc_id,
                        detail: e.to_string().into(),
                    }
                }
            };
            let _ = tx.send(event);
        });
    }

    // ==================== Sensor Logs ====================

    /// Logs for one bin, newest first
    ///
    /// Non-numeric IDs and store failures both yield an empty history.
    pub async fn fetch_bin_history(&self, assigned_id: &str) -> Vec<SensorLog> {
        let Some(bin_id) = parse_assigned_id(assigned_id) else {
            warn!("Invalid bin ID for history: {:?}", assigned_id);
            return Vec::new();
        };
        match self.logs.logs_for_bin(bin_id).await {
            Ok(mut logs) => {
                sort_newest_first(&mut logs);
                logs
            }
            Err(e) => {
                self.report_failure("fetch_bin_history", &e);
                Vec::new()
            }
        }
    }

    /// Fetch one bin's logs and pick the latest
    ///
    /// A non-numeric assigned ID resolves to `None` without a store read.
    pub async fn latest_reading(&self, bin: &BinRecord) -> Result<Option<SensorLog>> {
        let Some(bin_id) = bin.numeric_id() else {
            debug!("Bin {} has non-numeric assigned ID {:?}", bin.id, bin.assigned_id);
            return Ok(None);
        };
        let logs = self.logs.logs_for_bin(bin_id).await?;
        Ok(latest_reading(bin_id, &logs).cloned())
    }

    // ==================== Dashboard ====================

    /// KPIs and enriched bins, with "today" in the local time zone
    pub async fn fetch_dashboard(&self) -> DashboardSnapshot {
        self.fetch_dashboard_at(&Local::now()).await
    }

    /// KPIs and enriched bins, with "today" taken from `now`
    ///
    /// One log query per bin runs concurrently. A failed query only drops
    /// that bin from the KPIs; a failed registry read zeroes everything.
    pub async fn fetch_dashboard_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DashboardSnapshot {
        let day_start_ms = day_start_millis(now);

        let bins = match self.registry.list_bins().await {
            Ok(bins) => bins,
            Err(e) => {
                self.report_failure("fetch_dashboard", &e);
                return DashboardSnapshot::empty();
            }
        };

        let reads = bins.into_iter().map(|bin| async move {
            let latest = match self.latest_reading(&bin).await {
                Ok(latest) => latest,
                Err(e) => {
                    self.report_failure("fetch_latest_reading", &e);
                    None
                }
            };
            BinReading::new(bin, latest)
        });
        let readings = join_all(reads).await;

        let snapshot = aggregate(readings, day_start_ms);
        debug!(
            "Aggregated {} bins: {:?}",
            snapshot.bins.len(),
            snapshot.stats
        );
        snapshot
    }

    /// Dashboard KPIs only
    pub async fn fetch_dashboard_stats(&self) -> DashboardStats {
        self.fetch_dashboard().await.stats
    }

    /// Enriched bins only
    pub async fn fetch_bins_with_status(&self) -> Vec<EnrichedBin> {
        self.fetch_dashboard().await.bins
    }

    /// Run one aggregation pass into `state`
    ///
    /// Returns `false` when a newer refresh started meanwhile and this
    /// result was discarded.
    pub async fn refresh(&self, state: &Shared<DashboardState>) -> bool {
        let ticket = state.lock().begin_refresh();
        let snapshot = self.fetch_dashboard().await;
        let bin_count = snapshot.bins.len();
        let active_bins = snapshot.stats.active_bin_count;

        let applied = state.lock().apply_snapshot(ticket, snapshot);
        if applied {
            self.emit(ServiceEvent::RefreshCompleted {
                generation: ticket.generation(),
                bin_count,
                active_bins,
            });
        }
        applied
    }
}

impl Clone for BinService {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            logs: self.logs.clone(),
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl std::fmt::Debug for BinService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinService")
            .field("pending_events", &self.rx.len())
            .finish()
    }
}
