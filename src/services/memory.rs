//! In-Memory Document Store
//!
//! Holds both collections behind a lock. Used by the binary (seeded from a
//! JSON snapshot) and as the substitute store in tests, with switches to
//! inject store failures.

use ahash::AHashSet;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::constants::{BIN_HISTORY_COLLECTION, BIN_REGISTRY_COLLECTION};
use crate::domain::bin::{BinRecord, MapPosition, NewBin};
use crate::domain::sensor_log::SensorLog;
use crate::domain::timestamp::Timestamp;
use crate::error::{Error, Result};

use super::store::{BinRegistry, SensorLogSource};

/// Serialized contents of both collections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetSnapshot {
    #[serde(default)]
    pub bin_registry: Vec<BinRecord>,
    #[serde(default)]
    pub bin_history: Vec<SensorLog>,
}

impl FleetSnapshot {
    /// Read a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[derive(Default)]
struct Collections {
    bins: Vec<BinRecord>,
    logs: Vec<SensorLog>,
}

/// In-memory implementation of both store seams
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
    fail_registry: AtomicBool,
    fail_writes: AtomicBool,
    failing_bins: Mutex<AHashSet<i64>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the snapshot's documents
    pub fn from_snapshot(snapshot: FleetSnapshot) -> Self {
        let store = Self::new();
        for bin in snapshot.bin_registry {
            store.push_bin(bin);
        }
        for log in snapshot.bin_history {
            store.push_log(log);
        }
        store
    }

    /// Add a registry document as-is (an ID is generated when missing)
    pub fn push_bin(&self, mut bin: BinRecord) {
        if bin.id.is_empty() {
            bin.id = new_document_id();
        }
        self.data.write().bins.push(bin);
    }

    /// Append a sensor log (an ID is generated when missing)
    pub fn push_log(&self, mut log: SensorLog) {
        if log.id.is_empty() {
            log.id = new_document_id();
        }
        self.data.write().logs.push(log);
    }

    /// Copy of the registry collection, bypassing failure injection
    pub fn bins(&self) -> Vec<BinRecord> {
        self.data.read().bins.clone()
    }

    /// Fail every registry read
    pub fn set_registry_failure(&self, fail: bool) {
        self.fail_registry.store(fail, Ordering::SeqCst);
    }

    /// Fail every registry write
    pub fn set_write_failure(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail log queries for one bin ID
    pub fn fail_logs_for(&self, bin_id: i64) {
        self.failing_bins.lock().insert(bin_id);
    }

    fn check_writes(&self, operation: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::store(operation, "write rejected by store"));
        }
        Ok(())
    }
}

fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl BinRegistry for MemoryStore {
    async fn list_bins(&self) -> Result<Vec<BinRecord>> {
        if self.fail_registry.load(Ordering::SeqCst) {
            return Err(Error::store(
                format!("read {BIN_REGISTRY_COLLECTION}"),
                "store unavailable",
            ));
        }
        Ok(self.data.read().bins.clone())
    }

    async fn insert_bin(&self, bin: NewBin) -> Result<BinRecord> {
        self.check_writes(&format!("insert {BIN_REGISTRY_COLLECTION}"))?;
        let record = BinRecord {
            id: new_document_id(),
            assigned_id: bin.assigned_id,
            hardware_address: bin.hardware_address,
            registered_at: Some(Timestamp::now()),
            status: bin.status,
            position: None,
        };
        self.data.write().bins.push(record.clone());
        Ok(record)
    }

    async fn update_position(&self, doc_id: &str, position: MapPosition) -> Result<()> {
        let operation = format!("update {BIN_REGISTRY_COLLECTION}/{doc_id}");
        self.check_writes(&operation)?;
        let mut data = self.data.write();
        match data.bins.iter_mut().find(|bin| bin.id == doc_id) {
            Some(bin) => {
                bin.position = Some(position);
                Ok(())
            }
            None => Err(Error::store(operation, "no such document")),
        }
    }
}

#[async_trait]
impl SensorLogSource for MemoryStore {
    async fn logs_for_bin(&self, bin_id: i64) -> Result<Vec<SensorLog>> {
        if self.failing_bins.lock().contains(&bin_id) {
            return Err(Error::store(
                format!("query {BIN_HISTORY_COLLECTION} binID=={bin_id}"),
                "query failed",
            ));
        }
        Ok(self
            .data
            .read()
            .logs
            .iter()
            .filter(|log| log.bin_id == bin_id)
            .cloned()
            .collect())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data.read();
        f.debug_struct("MemoryStore")
            .field("bins", &data.bins.len())
            .field("logs", &data.logs.len())
            .finish()
    }
}
