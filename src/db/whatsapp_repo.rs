// src/db/whatsapp_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::whatsapp::{ChatMessage, Conversation, MessageDirection},
};

const CONVERSATION_COLUMNS: &str =
    "id, phone, contact_name, last_message, last_message_at, unread_count, assigned_to, created_at";
const MESSAGE_COLUMNS: &str =
    "id, conversation_id, wa_message_id, direction, message_type, body, status, sent_by, sent_at";

pub struct NewMessage<'a> {
    pub conversation_id: Uuid,
    pub wa_message_id: Option<&'a str>,
    pub direction: MessageDirection,
    pub message_type: &'a str,
    pub body: Option<&'a str>,
    pub status: &'a str,
    pub sent_by: Option<Uuid>,
    pub sent_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct WhatsAppRepository {
    pool: PgPool,
}

impl WhatsAppRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cria ou atualiza a conversa do telefone. `unread_increment` soma no contador.
    pub async fn upsert_conversation<'e, E>(
        &self,
        executor: E,
        phone: &str,
        contact_name: Option<&str>,
        last_message: Option<&str>,
        last_message_at: DateTime<Utc>,
        unread_increment: i32,
    ) -> Result<Conversation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO wa_conversations (phone, contact_name, last_message, last_message_at, unread_count)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (phone) DO UPDATE SET
                contact_name = COALESCE(EXCLUDED.contact_name, wa_conversations.contact_name),
                last_message = COALESCE(EXCLUDED.last_message, wa_conversations.last_message),
                last_message_at = GREATEST(EXCLUDED.last_message_at, wa_conversations.last_message_at),
                unread_count = wa_conversations.unread_count + EXCLUDED.unread_count
            RETURNING {}
            "#,
            CONVERSATION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Conversation>(&sql)
            .bind(phone)
            .bind(contact_name)
            .bind(last_message)
            .bind(last_message_at)
            .bind(unread_increment)
            .fetch_one(executor)
            .await?)
    }

    /// `None` quando o wa_message_id já existia (reentrega do provedor).
    pub async fn insert_message<'e, E>(&self, executor: E, new: NewMessage<'_>) -> Result<Option<ChatMessage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO wa_messages (conversation_id, wa_message_id, direction, message_type, body, status, sent_by, sent_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (wa_message_id) DO NOTHING
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        );
        Ok(sqlx::query_as::<_, ChatMessage>(&sql)
            .bind(new.conversation_id)
            .bind(new.wa_message_id)
            .bind(new.direction)
            .bind(new.message_type)
            .bind(new.body)
            .bind(new.status)
            .bind(new.sent_by)
            .bind(new.sent_at)
            .fetch_optional(executor)
            .await?)
    }

    pub async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>, AppError> {
        let sql = format!("SELECT {} FROM wa_conversations WHERE id = $1", CONVERSATION_COLUMNS);
        Ok(sqlx::query_as::<_, Conversation>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    pub async fn list_conversations(&self, limit: i64) -> Result<Vec<Conversation>, AppError> {
        let sql = format!(
            "SELECT {} FROM wa_conversations ORDER BY last_message_at DESC NULLS LAST LIMIT $1",
            CONVERSATION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Conversation>(&sql).bind(limit).fetch_all(&self.pool).await?)
    }

    /// As últimas `limit` mensagens, em ordem cronológica.
    pub async fn list_messages(&self, conversation_id: Uuid, limit: i64) -> Result<Vec<ChatMessage>, AppError> {
        let sql = format!(
            r#"
            SELECT * FROM (
                SELECT {} FROM wa_messages
                WHERE conversation_id = $1
                ORDER BY sent_at DESC
                LIMIT $2
            ) recent
            ORDER BY sent_at ASC
            "#,
            MESSAGE_COLUMNS
        );
        Ok(sqlx::query_as::<_, ChatMessage>(&sql)
            .bind(conversation_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<Option<Conversation>, AppError> {
        let sql = format!(
            "UPDATE wa_conversations SET unread_count = 0 WHERE id = $1 RETURNING {}",
            CONVERSATION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Conversation>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    /// Callback de status (sent/delivered/read/failed) de mensagem enviada.
    pub async fn update_message_status(&self, wa_message_id: &str, status: &str) -> Result<Option<ChatMessage>, AppError> {
        let sql = format!(
            "UPDATE wa_messages SET status = $2 WHERE wa_message_id = $1 RETURNING {}",
            MESSAGE_COLUMNS
        );
        Ok(sqlx::query_as::<_, ChatMessage>(&sql)
            .bind(wa_message_id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?)
    }
}
