// src/models/whatsapp.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "message_direction", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    #[schema(example = "5511999990000")]
    pub phone: String,
    pub contact_name: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i32,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub wa_message_id: Option<String>,
    pub direction: MessageDirection,
    #[schema(example = "text")]
    pub message_type: String,
    pub body: Option<String>,
    #[schema(example = "delivered")]
    pub status: String,
    pub sent_by: Option<Uuid>,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    #[validate(length(min = 1, max = 4096, message = "invalid_message"))]
    pub body: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct MessagesQuery {
    pub limit: Option<u32>,
}

// --- Webhook da WhatsApp Business API ---

#[derive(Debug, Deserialize, IntoParams)]
pub struct WebhookVerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookEntry {
    pub id: String,
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookChange {
    pub field: String,
    pub value: WebhookValue,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub messaging_product: Option<String>,
    #[serde(default)]
    pub contacts: Vec<WebhookContact>,
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
    #[serde(default)]
    pub statuses: Vec<WebhookStatus>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookContact {
    pub wa_id: String,
    #[serde(default)]
    pub profile: Option<WebhookProfile>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookProfile {
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookMessage {
    pub id: String,
    pub from: String,
    // Segundos desde a época, como string
    pub timestamp: String,
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub text: Option<WebhookText>,
    #[serde(default)]
    pub button: Option<WebhookButton>,
    #[serde(default)]
    pub image: Option<WebhookMedia>,
    #[serde(default)]
    pub document: Option<WebhookMedia>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookText {
    pub body: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookButton {
    pub text: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookMedia {
    pub id: String,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookStatus {
    pub id: String,
    pub status: String,
    pub timestamp: String,
    pub recipient_id: String,
}

// Mensagem recebida já normalizada
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub wa_message_id: String,
    pub phone: String,
    pub contact_name: Option<String>,
    pub message_type: String,
    pub body: Option<String>,
    pub timestamp_ms: i64,
}

impl WebhookMessage {
    /// Texto exibível da mensagem, quando houver.
    pub fn display_body(&self) -> Option<String> {
        match self.message_type.as_str() {
            "text" => self.text.as_ref().map(|t| t.body.clone()),
            "button" => self.button.as_ref().map(|b| b.text.clone()),
            "image" => self.image.as_ref().and_then(|m| m.caption.clone()),
            "document" => self.document.as_ref().and_then(|m| m.caption.clone()),
            _ => None,
        }
    }
}

impl WebhookPayload {
    /// Achata entry/changes/messages numa lista de mensagens recebidas.
    pub fn inbound_messages(&self) -> Vec<InboundMessage> {
        let mut out = Vec::new();
        for change in self.entry.iter().flat_map(|e| e.changes.iter()) {
            if change.field != "messages" {
                continue;
            }
            for message in &change.value.messages {
                let contact_name = change
                    .value
                    .contacts
                    .iter()
                    .find(|c| c.wa_id == message.from)
                    .and_then(|c| c.profile.as_ref())
                    .map(|p| p.name.clone());

                // Timestamp inválido ou fora de faixa: usa o relógio local
                let timestamp_ms = message
                    .timestamp
                    .parse::<i64>()
                    .ok()
                    .and_then(|secs| secs.checked_mul(1000))
                    .unwrap_or_else(|| Utc::now().timestamp_millis());

                out.push(InboundMessage {
                    wa_message_id: message.id.clone(),
                    phone: message.from.clone(),
                    contact_name,
                    message_type: message.message_type.clone(),
                    body: message.display_body(),
                    timestamp_ms,
                });
            }
        }
        out
    }

    pub fn statuses(&self) -> impl Iterator<Item = &WebhookStatus> {
        self.entry
            .iter()
            .flat_map(|e| e.changes.iter())
            .filter(|c| c.field == "messages")
            .flat_map(|c| c.value.statuses.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> WebhookPayload {
        serde_json::from_value(json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "123",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "contacts": [{ "wa_id": "5511999990000", "profile": { "name": "Carlos" } }],
                        "messages": [
                            { "id": "wamid.A", "from": "5511999990000", "timestamp": "1700000000",
                              "type": "text", "text": { "body": "Olá, ainda disponível?" } },
                            { "id": "wamid.B", "from": "5511888880000", "timestamp": "oops",
                              "type": "image", "image": { "id": "media-1", "caption": "planta" } }
                        ],
                        "statuses": [
                            { "id": "wamid.OUT", "status": "read", "timestamp": "1700000001", "recipient_id": "5511" }
                        ]
                    }
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn flattens_inbound_messages() {
        let messages = sample().inbound_messages();
        assert_eq!(messages.len(), 2);

        assert_eq!(messages[0].wa_message_id, "wamid.A");
        assert_eq!(messages[0].contact_name.as_deref(), Some("Carlos"));
        assert_eq!(messages[0].body.as_deref(), Some("Olá, ainda disponível?"));
        assert_eq!(messages[0].timestamp_ms, 1_700_000_000_000);

        // Sem contato correspondente e timestamp inválido
        assert_eq!(messages[1].contact_name, None);
        assert_eq!(messages[1].body.as_deref(), Some("planta"));
        assert!(messages[1].timestamp_ms > 0);
    }

    #[test]
    fn out_of_range_timestamp_falls_back_to_now() {
        let mut payload = sample();
        payload.entry[0].changes[0].value.messages[0].timestamp = "9223372036854775807".into();

        let before = Utc::now().timestamp_millis();
        let messages = payload.inbound_messages();
        let after = Utc::now().timestamp_millis();

        assert!(messages[0].timestamp_ms >= before && messages[0].timestamp_ms <= after);
    }

    #[test]
    fn exposes_status_callbacks() {
        let payload = sample();
        let statuses: Vec<_> = payload.statuses().collect();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].status, "read");
    }
}
