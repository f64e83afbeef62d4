//! State - View State Objects
//!
//! Mutated from one logical thread. The service layer only touches them
//! through [`Shared`] handles for the duration of a short lock.

pub mod dashboard_state;
pub mod map_state;

pub use dashboard_state::*;
pub use map_state::*;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::services::ServiceEvent;

/// Shared handle to a view-state object
pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Drain pending service events into both view states; returns how many
/// were read
pub fn ingest_events(
    rx: &Receiver<ServiceEvent>,
    dashboard: &mut DashboardState,
    map: &mut MapState,
) -> usize {
    let mut count = 0;
    while let Ok(event) = rx.try_recv() {
        dashboard.apply_event(&event);
        map.apply_event(&event);
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bin::MapPosition;

    #[test]
    fn ingest_feeds_both_states() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(ServiceEvent::PositionSaveFailed {
            bin_id: "doc-1".into(),
            detail: "offline".into(),
        })
        .expect("send");
        tx.send(ServiceEvent::PositionSaved {
            bin_id: "doc-2".into(),
            position: MapPosition { x: 1.0, y: 2.0 },
        })
        .expect("send");

        let mut dashboard = DashboardState::new();
        let mut map = MapState::default();
        assert_eq!(ingest_events(&rx, &mut dashboard, &mut map), 2);
        assert_eq!(dashboard.notices().count(), 2);
        assert!(rx.try_recv().is_err());
    }
}
