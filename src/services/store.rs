//! Store Seams
//!
//! The document store is an external collaborator. These traits are the
//! only way the rest of the crate reaches it, so tests can substitute
//! [`MemoryStore`](super::MemoryStore).

use async_trait::async_trait;

use crate::domain::bin::{BinRecord, MapPosition, NewBin};
use crate::domain::sensor_log::SensorLog;
use crate::error::Result;

/// The bin registry collection
#[async_trait]
pub trait BinRegistry: Send + Sync + 'static {
    /// Read every registry document
    async fn list_bins(&self) -> Result<Vec<BinRecord>>;

    /// Create a document; the store assigns the ID and registration time
    async fn insert_bin(&self, bin: NewBin) -> Result<BinRecord>;

    /// Overwrite the `position` field of a document
    async fn update_position(&self, doc_id: &str, position: MapPosition) -> Result<()>;
}

/// The sensor log collection
#[async_trait]
pub trait SensorLogSource: Send + Sync + 'static {
    /// Read every log whose bin ID equals `bin_id`, in storage order
    async fn logs_for_bin(&self, bin_id: i64) -> Result<Vec<SensorLog>>;
}
