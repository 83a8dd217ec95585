// src/services/whatsapp_service.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{whatsapp_repo::NewMessage, WhatsAppRepository},
    models::{
        auth::Claims,
        whatsapp::{ChatMessage, Conversation, InboundMessage, MessageDirection, WebhookPayload, WebhookVerifyQuery},
    },
    realtime::{hub, NotificationDeduper, RealtimeEvent, RealtimeHub},
};

const CONVERSATION_LIST_LIMIT: i64 = 100;
const DEFAULT_MESSAGES_LIMIT: u32 = 50;
const MAX_MESSAGES_LIMIT: u32 = 500;

/// Envio de mensagens pela WhatsApp Business API.
#[async_trait]
pub trait WhatsAppGateway: Send + Sync {
    /// Devolve o id (wamid) atribuído pelo provedor.
    async fn send_text(&self, to: &str, body: &str) -> Result<String, AppError>;
}

pub struct GraphApiGateway {
    client: Client,
    api_base: String,
    phone_number_id: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GraphSendResponse {
    #[serde(default)]
    messages: Vec<GraphMessageId>,
}

#[derive(Debug, Deserialize)]
struct GraphMessageId {
    id: String,
}

impl GraphApiGateway {
    pub fn new(api_base: String, phone_number_id: String, access_token: String) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            phone_number_id,
            access_token,
        })
    }
}

#[async_trait]
impl WhatsAppGateway for GraphApiGateway {
    async fn send_text(&self, to: &str, body: &str) -> Result<String, AppError> {
        let url = format!("{}/{}/messages", self.api_base, self.phone_number_id);
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("WhatsApp indisponível: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("WhatsApp API error {}: {}", status, error_text);
            return Err(AppError::Gateway(format!("WhatsApp API respondeu {}", status)));
        }

        let parsed: GraphSendResponse = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Resposta inesperada do WhatsApp: {}", e)))?;

        parsed
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| AppError::Gateway("WhatsApp não devolveu o id da mensagem".into()))
    }
}

/// Handshake de verificação do webhook: devolve o challenge quando aceito.
pub fn verify_subscription(expected_token: Option<&str>, query: &WebhookVerifyQuery) -> Option<String> {
    let expected = expected_token.filter(|t| !t.is_empty())?;
    if query.mode.as_deref() == Some("subscribe") && query.verify_token.as_deref() == Some(expected) {
        query.challenge.clone()
    } else {
        None
    }
}

// Resumo do processamento de um POST do webhook
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WebhookOutcome {
    pub stored: usize,
    pub duplicates: usize,
    pub statuses: usize,
    pub failed: usize,
}

fn timestamp_from_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}

#[derive(Clone)]
pub struct WhatsAppService {
    repo: WhatsAppRepository,
    pool: PgPool,
    hub: RealtimeHub,
    // Reentregas do provedor chegam com o mesmo id em poucos segundos
    inbound_dedup: Arc<NotificationDeduper>,
    gateway: Option<Arc<dyn WhatsAppGateway>>,
    verify_token: Option<String>,
}

impl WhatsAppService {
    pub fn new(
        repo: WhatsAppRepository,
        pool: PgPool,
        hub: RealtimeHub,
        inbound_dedup: NotificationDeduper,
        gateway: Option<Arc<dyn WhatsAppGateway>>,
        verify_token: Option<String>,
    ) -> Self {
        Self {
            repo,
            pool,
            hub,
            inbound_dedup: Arc::new(inbound_dedup),
            gateway,
            verify_token,
        }
    }

    pub fn verify(&self, query: &WebhookVerifyQuery) -> Option<String> {
        verify_subscription(self.verify_token.as_deref(), query)
    }

    async fn broadcast_message(&self, conversation: &Conversation, message: &ChatMessage, event: &str) {
        let id = message
            .wa_message_id
            .clone()
            .unwrap_or_else(|| message.id.to_string());
        self.hub
            .publish_all(vec![
                RealtimeEvent::with_id(id.clone(), hub::conversation_room(conversation.id), event, json!(message)),
                RealtimeEvent::with_id(id, hub::INBOX_ROOM, "conversation:updated", json!(conversation)),
            ])
            .await;
    }

    async fn store_inbound(&self, inbound: &InboundMessage) -> Result<bool, AppError> {
        let sent_at = timestamp_from_ms(inbound.timestamp_ms);

        let mut tx = self.pool.begin().await?;
        let conversation = self
            .repo
            .upsert_conversation(
                &mut *tx,
                &inbound.phone,
                inbound.contact_name.as_deref(),
                inbound.body.as_deref(),
                sent_at,
                1,
            )
            .await?;

        let stored = self
            .repo
            .insert_message(
                &mut *tx,
                NewMessage {
                    conversation_id: conversation.id,
                    wa_message_id: Some(&inbound.wa_message_id),
                    direction: MessageDirection::Inbound,
                    message_type: &inbound.message_type,
                    body: inbound.body.as_deref(),
                    status: "received",
                    sent_by: None,
                    sent_at,
                },
            )
            .await?;

        // Já gravada antes: o rollback desfaz o incremento de não lidas
        let Some(message) = stored else {
            return Ok(false);
        };
        tx.commit().await?;

        self.broadcast_message(&conversation, &message, "message:new").await;
        Ok(true)
    }

    /// Processa um POST do webhook. Falhas por mensagem são registradas e não interrompem o lote.
    pub async fn process_webhook(&self, payload: &WebhookPayload) -> WebhookOutcome {
        let mut outcome = WebhookOutcome::default();

        for inbound in payload.inbound_messages() {
            if !self.inbound_dedup.check_and_record(&inbound.wa_message_id, inbound.timestamp_ms) {
                outcome.duplicates += 1;
                continue;
            }
            match self.store_inbound(&inbound).await {
                Ok(true) => outcome.stored += 1,
                Ok(false) => outcome.duplicates += 1,
                Err(e) => {
                    outcome.failed += 1;
                    tracing::error!("Falha ao gravar mensagem {}: {:?}", inbound.wa_message_id, e);
                }
            }
        }

        for status in payload.statuses() {
            match self.repo.update_message_status(&status.id, &status.status).await {
                Ok(Some(message)) => {
                    outcome.statuses += 1;
                    self.hub
                        .publish(RealtimeEvent::new(
                            hub::conversation_room(message.conversation_id),
                            "message:status",
                            json!(message),
                        ))
                        .await;
                }
                Ok(None) => tracing::debug!("Status para mensagem desconhecida {}", status.id),
                Err(e) => {
                    outcome.failed += 1;
                    tracing::error!("Falha ao atualizar status de {}: {:?}", status.id, e);
                }
            }
        }

        if outcome.stored + outcome.statuses + outcome.duplicates > 0 {
            tracing::info!("📨 Webhook WhatsApp: {:?} ({} ids na janela)", outcome, self.inbound_dedup.len());
        }
        outcome
    }

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, AppError> {
        self.repo.list_conversations(CONVERSATION_LIST_LIMIT).await
    }

    async fn conversation(&self, id: Uuid) -> Result<Conversation, AppError> {
        self.repo
            .find_conversation(id)
            .await?
            .ok_or(AppError::NotFound("resource.conversation"))
    }

    pub async fn list_messages(&self, conversation_id: Uuid, limit: Option<u32>) -> Result<Vec<ChatMessage>, AppError> {
        self.conversation(conversation_id).await?;
        let limit = limit.unwrap_or(DEFAULT_MESSAGES_LIMIT).clamp(1, MAX_MESSAGES_LIMIT);
        self.repo.list_messages(conversation_id, i64::from(limit)).await
    }

    pub async fn mark_read(&self, conversation_id: Uuid) -> Result<Conversation, AppError> {
        let conversation = self
            .repo
            .mark_read(conversation_id)
            .await?
            .ok_or(AppError::NotFound("resource.conversation"))?;

        self.hub
            .publish(RealtimeEvent::new(hub::INBOX_ROOM, "conversation:updated", json!(conversation)))
            .await;
        Ok(conversation)
    }

    pub async fn send_text(&self, claims: &Claims, conversation_id: Uuid, body: &str) -> Result<ChatMessage, AppError> {
        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| AppError::Gateway("WhatsApp não configurado".into()))?;
        let conversation = self.conversation(conversation_id).await?;

        let wa_message_id = gateway.send_text(&conversation.phone, body).await?;
        let sent_at = Utc::now();

        let mut tx = self.pool.begin().await?;
        let conversation = self
            .repo
            .upsert_conversation(&mut *tx, &conversation.phone, None, Some(body), sent_at, 0)
            .await?;
        let message = self
            .repo
            .insert_message(
                &mut *tx,
                NewMessage {
                    conversation_id: conversation.id,
                    wa_message_id: Some(&wa_message_id),
                    direction: MessageDirection::Outbound,
                    message_type: "text",
                    body: Some(body),
                    status: "sent",
                    sent_by: Some(claims.id),
                    sent_at,
                },
            )
            .await?
            .ok_or_else(|| anyhow::anyhow!("wamid {} repetido no envio", wa_message_id))?;
        tx.commit().await?;

        tracing::info!("📤 Mensagem {} enviada por {}", wa_message_id, claims.email);
        self.broadcast_message(&conversation, &message, "message:new").await;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(mode: &str, token: &str, challenge: &str) -> WebhookVerifyQuery {
        WebhookVerifyQuery {
            mode: Some(mode.into()),
            verify_token: Some(token.into()),
            challenge: Some(challenge.into()),
        }
    }

    #[test]
    fn echoes_challenge_for_matching_token() {
        let q = query("subscribe", "meu-token", "1158201444");
        assert_eq!(verify_subscription(Some("meu-token"), &q).as_deref(), Some("1158201444"));
    }

    #[test]
    fn refuses_wrong_mode_token_or_missing_config() {
        assert_eq!(verify_subscription(Some("meu-token"), &query("subscribe", "outro", "1")), None);
        assert_eq!(verify_subscription(Some("meu-token"), &query("unsubscribe", "meu-token", "1")), None);
        assert_eq!(verify_subscription(None, &query("subscribe", "meu-token", "1")), None);
        assert_eq!(verify_subscription(Some(""), &query("subscribe", "", "1")), None);
    }

    #[test]
    fn falls_back_to_now_on_out_of_range_timestamps() {
        assert_eq!(timestamp_from_ms(1_700_000_000_000).timestamp(), 1_700_000_000);
        assert!(timestamp_from_ms(i64::MAX).timestamp() > 0);
    }
}
