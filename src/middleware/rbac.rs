// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{Claims, ROLE_AGENT, ROLE_HR, ROLE_MANAGER, ROLE_SALES},
};

/// 1. O Trait que define um grupo de cargos com acesso. Admin sempre passa.
pub trait RoleSet: Send + Sync + 'static {
    fn roles() -> &'static [&'static str];

    fn allows(claims: &Claims) -> bool {
        claims.is_admin() || Self::roles().iter().any(|r| claims.role.eq_ignore_ascii_case(r))
    }
}

/// 2. O Extractor (Guardião). Devolve as claims para o handler.
pub struct RequireRole<T>(pub Claims, pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleSet,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(claims) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !T::allows(&claims) {
            let app_state = AppState::from_ref(state);
            let locale = Locale::from_headers(&parts.headers);
            tracing::debug!("Acesso negado para {} (cargo '{}')", claims.email, claims.role);
            return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(claims, PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS GRUPOS (TIPOS)
// ---

pub struct AdminOnly;
impl RoleSet for AdminOnly {
    fn roles() -> &'static [&'static str] { &[] }
}

pub struct HrAccess;
impl RoleSet for HrAccess {
    fn roles() -> &'static [&'static str] { &[ROLE_HR] }
}

pub struct SalesAccess;
impl RoleSet for SalesAccess {
    fn roles() -> &'static [&'static str] { &[ROLE_MANAGER, ROLE_SALES, ROLE_AGENT] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn claims(role: &str) -> Claims {
        Claims {
            id: Uuid::new_v4(),
            name: "x".into(),
            email: "x@estate.test".into(),
            role: role.into(),
            alloted_area: vec![],
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn admin_passes_every_gate() {
        assert!(AdminOnly::allows(&claims("admin")));
        assert!(HrAccess::allows(&claims("ADMIN")));
        assert!(SalesAccess::allows(&claims("admin")));
    }

    #[test]
    fn gates_by_role() {
        assert!(HrAccess::allows(&claims("hr")));
        assert!(!HrAccess::allows(&claims("sales")));
        assert!(SalesAccess::allows(&claims("Agent")));
        assert!(!SalesAccess::allows(&claims("hr")));
        assert!(!AdminOnly::allows(&claims("manager")));
    }
}
