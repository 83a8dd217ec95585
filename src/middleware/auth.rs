// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::Claims,
};

// O usuário autenticado, decodificado do JWT a cada requisição
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

/// Cookie HTTP-only primeiro; `Authorization: Bearer` como alternativa
/// (clientes que não são navegador, ex: integrações e testes).
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = jar.get(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

// O middleware em si
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let reject = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let token = extract_token(&jar, request.headers(), &app_state.config.cookie_name)
        .ok_or_else(|| reject(AppError::InvalidToken))?;

    let claims = app_state.auth_service.decode_token(&token).map_err(reject)?;

    // Insere o usuário nos "extensions" da requisição
    request.extensions_mut().insert(AuthenticatedUser(claims));
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);
        Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn prefers_cookie_over_bearer_header() {
        let jar = CookieJar::new().add(Cookie::new("token", "from-cookie"));
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));

        assert_eq!(extract_token(&jar, &headers, "token").as_deref(), Some("from-cookie"));
    }

    #[test]
    fn falls_back_to_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));

        assert_eq!(extract_token(&CookieJar::new(), &headers, "token").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_missing_or_malformed_credentials() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&CookieJar::new(), &headers, "token"), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_token(&CookieJar::new(), &headers, "token"), None);

        let empty = CookieJar::new().add(Cookie::new("token", ""));
        assert_eq!(extract_token(&empty, &HeaderMap::new(), "token"), None);
    }
}
