// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Erro de domínio. Os serviços e repositórios só conhecem este tipo;
// a tradução para HTTP acontece em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    // O &'static str é a chave i18n do recurso (ex: "resource.employee")
    #[error("Recurso não encontrado: {0}")]
    NotFound(&'static str),

    #[error("Registro duplicado: {0}")]
    Duplicate(String),

    // Carrega uma chave i18n (ex: "lead.reminder_required")
    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    #[error("Falha no serviço externo: {0}")]
    Gateway(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O erro que efetivamente sai na resposta HTTP
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::Duplicate(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio em resposta HTTP traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status_code();

        match self {
            AppError::ValidationError(errors) => {
                // Devolve os códigos por campo, o frontend decide como exibir
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string());
                            Value::String(i18n.translate(lang, &format!("validation.{}", code)))
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                ApiError {
                    status,
                    error: i18n.translate(lang, "error.validation"),
                    details: Some(Value::Object(details)),
                }
            }
            AppError::InvalidCredentials => ApiError::new(status, i18n.translate(lang, "auth.invalid_credentials")),
            AppError::InvalidToken => ApiError::new(status, i18n.translate(lang, "auth.invalid_token")),
            AppError::Forbidden => ApiError::new(status, i18n.translate(lang, "auth.forbidden")),
            AppError::NotFound(resource) => {
                let resource_name = i18n.translate(lang, resource);
                ApiError::new(
                    status,
                    i18n.translate_with(lang, "error.not_found", &[("resource", &resource_name)]),
                )
            }
            AppError::Duplicate(detail) => ApiError::new(
                status,
                i18n.translate_with(lang, "error.duplicate", &[("detail", detail)]),
            ),
            AppError::BadRequest(key) => ApiError::new(status, i18n.translate(lang, key)),
            AppError::Gateway(reason) => {
                tracing::warn!("Falha no gateway externo: {}", reason);
                ApiError::new(status, i18n.translate(lang, "error.gateway"))
            }
            e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                ApiError::new(status, i18n.translate(lang, "error.internal"))
            }
        }
    }
}

// Helper usado pelos repositórios: violação de unicidade vira Duplicate,
// violação de FK vira BadRequest, o resto segue como erro de banco.
pub fn map_constraint_error(e: sqlx::Error, duplicate_detail: impl FnOnce() -> String) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Duplicate(duplicate_detail());
        }
        if db_err.is_foreign_key_violation() {
            return AppError::BadRequest("error.referenced".into());
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Payload {
        #[validate(length(min = 6, message = "password_too_short"))]
        password: String,
    }

    fn en() -> Locale {
        Locale("en".to_string())
    }

    #[test]
    fn maps_statuses() {
        assert_eq!(AppError::Duplicate("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("resource.employee").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Gateway("down".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_names_the_resource() {
        let store = I18nStore::load().unwrap();
        let api = AppError::NotFound("resource.employee").to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.error, "Employee not found.");
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let store = I18nStore::load().unwrap();
        let errors = Payload { password: "123".into() }.validate().unwrap_err();
        let api = AppError::ValidationError(errors).to_api_error(&en(), &store);

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.unwrap();
        assert_eq!(details["password"][0], "Password must have at least 6 characters.");
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let store = I18nStore::load().unwrap();
        let api = AppError::InternalServerError(anyhow::anyhow!("connection string leaked"))
            .to_api_error(&Locale("pt".into()), &store);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("connection string"));
    }
}
