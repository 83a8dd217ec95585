// src/handlers/whatsapp.rs

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::whatsapp::{
        ChatMessage, Conversation, MessagesQuery, SendMessagePayload, WebhookPayload, WebhookVerifyQuery,
    },
};

// =============================================================================
//  WEBHOOK (público, chamado pela Meta)
// =============================================================================

// GET /api/whatsapp/webhook
#[utoipa::path(
    get,
    path = "/api/whatsapp/webhook",
    tag = "WhatsApp",
    params(WebhookVerifyQuery),
    responses(
        (status = 200, description = "Challenge devolvido", body = String),
        (status = 403, description = "Token de verificação não confere")
    )
)]
pub async fn verify_webhook(
    State(app_state): State<AppState>,
    Query(query): Query<WebhookVerifyQuery>,
) -> impl IntoResponse {
    match app_state.whatsapp_service.verify(&query) {
        Some(challenge) => {
            tracing::info!("✅ Webhook do WhatsApp verificado");
            (StatusCode::OK, challenge)
        }
        None => {
            tracing::warn!("Verificação do webhook recusada (mode={:?})", query.mode);
            (StatusCode::FORBIDDEN, String::new())
        }
    }
}

// POST /api/whatsapp/webhook
// Sempre 200: a Meta reenvia indefinidamente quando recebe erro.
#[utoipa::path(
    post,
    path = "/api/whatsapp/webhook",
    tag = "WhatsApp",
    request_body(content = Object, description = "Payload da WhatsApp Business API"),
    responses((status = 200, description = "Recebido"))
)]
pub async fn receive_webhook(State(app_state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match serde_json::from_slice::<WebhookPayload>(&body) {
        Ok(payload) => {
            let outcome = app_state.whatsapp_service.process_webhook(&payload).await;
            tracing::debug!("Webhook processado: {:?}", outcome);
        }
        Err(e) => tracing::warn!("Payload de webhook ignorado: {}", e),
    }
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

// =============================================================================
//  CAIXA DE ENTRADA (autenticado)
// =============================================================================

// GET /api/whatsapp/conversations
#[utoipa::path(
    get,
    path = "/api/whatsapp/conversations",
    tag = "WhatsApp",
    responses((status = 200, description = "Conversas, atividade mais recente primeiro", body = Vec<Conversation>)),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn list_conversations(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let conversations = app_state
        .whatsapp_service
        .list_conversations()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(conversations))
}

// GET /api/whatsapp/conversations/{id}/messages
#[utoipa::path(
    get,
    path = "/api/whatsapp/conversations/{id}/messages",
    tag = "WhatsApp",
    params(("id" = Uuid, Path, description = "ID da conversa"), MessagesQuery),
    responses(
        (status = 200, description = "Mensagens em ordem cronológica", body = Vec<ChatMessage>),
        (status = 404, description = "Conversa não encontrada")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn list_messages(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<MessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = app_state
        .whatsapp_service
        .list_messages(id, query.limit)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(messages))
}

// POST /api/whatsapp/conversations/{id}/read
#[utoipa::path(
    post,
    path = "/api/whatsapp/conversations/{id}/read",
    tag = "WhatsApp",
    params(("id" = Uuid, Path, description = "ID da conversa")),
    responses(
        (status = 200, description = "Não lidas zeradas", body = Conversation),
        (status = 404, description = "Conversa não encontrada")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn mark_read(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = app_state
        .whatsapp_service
        .mark_read(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(conversation))
}

// POST /api/whatsapp/conversations/{id}/messages
#[utoipa::path(
    post,
    path = "/api/whatsapp/conversations/{id}/messages",
    tag = "WhatsApp",
    request_body = SendMessagePayload,
    params(("id" = Uuid, Path, description = "ID da conversa")),
    responses(
        (status = 201, description = "Mensagem enviada", body = ChatMessage),
        (status = 404, description = "Conversa não encontrada"),
        (status = 502, description = "Falha na API do WhatsApp")
    ),
    security(("cookie_auth" = []), ("api_jwt" = []))
)]
pub async fn send_message(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state
        .whatsapp_service
        .send_text(&user, id, &payload.body)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(message)))
}
