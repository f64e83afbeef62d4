//! Service Layer
//!
//! Store access, concurrent per-bin fan-out, and the background runtime.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      BinService                              │
//! │  ┌─────────────┐  ┌─────────────────┐  ┌──────────────────┐ │
//! │  │ BinRegistry │  │ SensorLogSource │  │  tokio runtime   │ │
//! │  │ (registry)  │  │ (bin history)   │  │ (detached saves) │ │
//! │  └─────────────┘  └─────────────────┘  └──────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼ ServiceEvent
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      State Layer                             │
//! │               (DashboardState, MapState)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod events;
mod hub;
mod memory;
mod runtime;
mod store;

pub use events::*;
pub use hub::*;
pub use memory::*;
pub use runtime::*;
pub use store::*;
