pub mod dedup;
pub mod hub;

pub use dedup::NotificationDeduper;
pub use hub::{RealtimeEvent, RealtimeHub};

use serde_json::Value;
use uuid::Uuid;

/// Um evento de lead vai para a sala "area|disposition" e para "area|all".
pub fn lead_events(area: &str, disposition: Option<&str>, event: &str, payload: Value) -> Vec<RealtimeEvent> {
    let id = Uuid::new_v4().to_string();
    vec![
        RealtimeEvent::with_id(id.clone(), hub::lead_room(area, disposition), event, payload.clone()),
        RealtimeEvent::with_id(id, hub::area_room(area), event, payload),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lead_events_target_disposition_and_area_rooms() {
        let events = lead_events("Goa", Some("Hot"), "lead:updated", json!({"id": 1}));
        let rooms: Vec<&str> = events.iter().map(|e| e.room.as_str()).collect();
        assert_eq!(rooms, vec!["goa|hot", "goa|all"]);
        assert_eq!(events[0].id, events[1].id);
    }
}
