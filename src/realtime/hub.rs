// src/realtime/hub.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::dedup::NotificationDeduper;

const ROOM_CAPACITY: usize = 64;

pub const INBOX_ROOM: &str = "whatsapp:inbox";
const NO_DISPOSITION: &str = "none";
const ALL_DISPOSITIONS: &str = "all";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeEvent {
    pub id: String,
    pub room: String,
    pub event: String,
    pub payload: Value,
    pub timestamp: i64,
}

impl RealtimeEvent {
    /// Evento com id novo: só é barrado pelo deduplicador se for reenviado.
    pub fn new(room: impl Into<String>, event: impl Into<String>, payload: Value) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), room, event, payload)
    }

    /// Evento com id externo (ex: id da mensagem no WhatsApp).
    pub fn with_id(id: impl Into<String>, room: impl Into<String>, event: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            room: room.into(),
            event: event.into(),
            payload,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

fn normalize(part: &str) -> String {
    part.trim().to_lowercase()
}

/// Sala de um lead: "area|disposition".
pub fn lead_room(area: &str, disposition: Option<&str>) -> String {
    let disposition = disposition
        .map(normalize)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| NO_DISPOSITION.to_string());
    format!("{}|{}", normalize(area), disposition)
}

/// Sala que recebe todos os leads de uma área.
pub fn area_room(area: &str) -> String {
    format!("{}|{}", normalize(area), ALL_DISPOSITIONS)
}

pub fn conversation_room(conversation_id: Uuid) -> String {
    format!("conversation:{}", conversation_id)
}

/// Forma canônica do nome de uma sala: salas de lead em minúsculas.
pub fn normalize_room(room: &str) -> String {
    let room = room.trim();
    match room.split_once('|') {
        Some((area, disposition)) => format!("{}|{}", normalize(area), normalize(disposition)),
        None => room.to_string(),
    }
}

/// Área de uma sala de lead, `None` para as demais salas.
pub fn room_area(room: &str) -> Option<&str> {
    room.split_once('|').map(|(area, _)| area)
}

#[derive(Debug)]
struct HubInner {
    rooms: RwLock<HashMap<String, broadcast::Sender<RealtimeEvent>>>,
    deduper: NotificationDeduper,
}

/// Fan-out de eventos por sala. Entrega "fire-and-forget": quem não estiver
/// inscrito, ou ficar para trás no canal, simplesmente perde a mensagem.
#[derive(Debug, Clone)]
pub struct RealtimeHub {
    inner: Arc<HubInner>,
}

impl RealtimeHub {
    pub fn new(dedup_window: Duration, dedup_max_entries: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                rooms: RwLock::new(HashMap::new()),
                deduper: NotificationDeduper::new(dedup_window, dedup_max_entries),
            }),
        }
    }

    pub async fn subscribe(&self, room: &str) -> broadcast::Receiver<RealtimeEvent> {
        let mut rooms = self.inner.rooms.write().await;
        rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Remove a sala quando ninguém mais a escuta.
    pub async fn unsubscribe(&self, room: &str) {
        let mut rooms = self.inner.rooms.write().await;
        if rooms.get(room).is_some_and(|s| s.receiver_count() == 0) {
            rooms.remove(room);
        }
    }

    /// Publica e devolve quantos inscritos receberam o evento.
    pub async fn publish(&self, event: RealtimeEvent) -> usize {
        let dedup_key = format!("{}@{}", event.id, event.room);
        if !self.inner.deduper.check_and_record(&dedup_key, event.timestamp) {
            tracing::debug!("Evento duplicado descartado: {} ({})", event.event, dedup_key);
            return 0;
        }

        let sender = {
            let rooms = self.inner.rooms.read().await;
            match rooms.get(&event.room) {
                Some(sender) => sender.clone(),
                None => return 0,
            }
        };

        let room = event.room.clone();
        match sender.send(event) {
            Ok(delivered) => delivered,
            Err(_) => {
                // Ninguém mais ouvindo: remove a sala
                let mut rooms = self.inner.rooms.write().await;
                if rooms.get(&room).is_some_and(|s| s.receiver_count() == 0) {
                    rooms.remove(&room);
                }
                0
            }
        }
    }

    pub async fn publish_all(&self, events: Vec<RealtimeEvent>) -> usize {
        let mut delivered = 0;
        for event in events {
            delivered += self.publish(event).await;
        }
        delivered
    }

    pub async fn room_count(&self) -> usize {
        self.inner.rooms.read().await.len()
    }

    pub async fn subscriber_count(&self, room: &str) -> usize {
        self.inner
            .rooms
            .read()
            .await
            .get(room)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hub() -> RealtimeHub {
        RealtimeHub::new(Duration::from_secs(10), 100)
    }

    #[test]
    fn builds_room_names() {
        assert_eq!(lead_room(" Goa ", Some("Interested")), "goa|interested");
        assert_eq!(lead_room("goa", None), "goa|none");
        assert_eq!(lead_room("goa", Some("  ")), "goa|none");
        assert_eq!(area_room("Goa"), "goa|all");
        assert_eq!(room_area("goa|interested"), Some("goa"));
        assert_eq!(room_area(INBOX_ROOM), None);
    }

    #[tokio::test]
    async fn delivers_to_subscribers_of_the_room_only() {
        let hub = hub();
        let mut goa = hub.subscribe("goa|all").await;
        let mut delhi = hub.subscribe("delhi|all").await;

        let delivered = hub.publish(RealtimeEvent::new("goa|all", "lead:created", json!({"name": "A"}))).await;
        assert_eq!(delivered, 1);

        let received = goa.recv().await.unwrap();
        assert_eq!(received.event, "lead:created");
        assert_eq!(received.payload["name"], "A");
        assert!(delhi.try_recv().is_err());
    }

    #[tokio::test]
    async fn publishing_without_listeners_is_a_no_op() {
        let hub = hub();
        assert_eq!(hub.publish(RealtimeEvent::new("nobody", "x", Value::Null)).await, 0);
        assert_eq!(hub.room_count().await, 0);
    }

    #[tokio::test]
    async fn drops_repeated_event_ids_per_room() {
        let hub = hub();
        let mut conv = hub.subscribe("conversation:1").await;
        let mut inbox = hub.subscribe(INBOX_ROOM).await;

        let event = RealtimeEvent::with_id("wamid.1", "conversation:1", "message:new", json!({}));
        assert_eq!(hub.publish(event.clone()).await, 1);
        assert_eq!(hub.publish(event).await, 0);

        // Mesmo id em outra sala ainda é entregue
        let to_inbox = RealtimeEvent::with_id("wamid.1", INBOX_ROOM, "conversation:updated", json!({}));
        assert_eq!(hub.publish(to_inbox).await, 1);

        assert!(conv.recv().await.is_ok());
        assert!(conv.try_recv().is_err());
        assert!(inbox.recv().await.is_ok());
    }

    #[tokio::test]
    async fn removes_rooms_whose_subscribers_left() {
        let hub = hub();
        let rx = hub.subscribe("goa|none").await;
        assert_eq!(hub.subscriber_count("goa|none").await, 1);
        drop(rx);

        assert_eq!(hub.publish(RealtimeEvent::new("goa|none", "lead:updated", Value::Null)).await, 0);
        assert_eq!(hub.room_count().await, 0);
    }

    #[tokio::test]
    async fn unsubscribe_prunes_rooms_left_empty() {
        let hub = hub();
        for i in 0..1000 {
            let rx = hub.subscribe(&format!("conversation:{}", i)).await;
            drop(rx);
            hub.unsubscribe(&format!("conversation:{}", i)).await;
        }
        assert_eq!(hub.room_count().await, 0);

        // Sala com inscrito ativo permanece
        let _rx = hub.subscribe("goa|all").await;
        hub.unsubscribe("goa|all").await;
        assert_eq!(hub.room_count().await, 1);
    }

    #[test]
    fn normalizes_lead_room_names_only() {
        assert_eq!(normalize_room(" Goa|Hot "), "goa|hot");
        assert_eq!(normalize_room("GOA | All"), "goa|all");
        assert_eq!(normalize_room(INBOX_ROOM), INBOX_ROOM);
    }

    #[tokio::test]
    async fn publish_all_sums_deliveries() {
        let hub = hub();
        let _a = hub.subscribe("goa|all").await;
        let _b = hub.subscribe("goa|hot").await;
        let delivered = hub
            .publish_all(vec![
                RealtimeEvent::new("goa|all", "lead:updated", Value::Null),
                RealtimeEvent::new("goa|hot", "lead:updated", Value::Null),
                RealtimeEvent::new("goa|cold", "lead:updated", Value::Null),
            ])
            .await;
        assert_eq!(delivered, 2);
    }
}
