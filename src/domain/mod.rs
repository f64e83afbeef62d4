//! Domain - Pure Data Structures and Fleet Logic
//!
//! Nothing here touches the document store or the async runtime.

pub mod aggregation;
pub mod bin;
pub mod config;
pub mod sensor_log;
pub mod timestamp;
pub mod viewport;
