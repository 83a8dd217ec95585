// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::EmployeeRepository,
    models::{auth::Claims, employee::Employee},
};

/// bcrypt é CPU-bound: roda fora das threads do runtime.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[derive(Clone)]
pub struct AuthService {
    employee_repo: EmployeeRepository,
    jwt_secret: String,
    ttl_days: i64,
}

impl AuthService {
    pub fn new(employee_repo: EmployeeRepository, jwt_secret: String, ttl_days: i64) -> Self {
        Self { employee_repo, jwt_secret, ttl_days }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(String, Employee), AppError> {
        let employee = self
            .employee_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Conta desativada se comporta como credencial inválida
        if !employee.is_active {
            tracing::info!("Login recusado para conta inativa {}", employee.email);
            return Err(AppError::InvalidCredentials);
        }

        let password_clone = password.to_owned();
        let password_hash_clone = employee.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&employee)?;
        Ok((token, employee))
    }

    /// Valida assinatura e expiração. Não consulta o banco.
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|e| {
            tracing::debug!("Token rejeitado: {}", e);
            AppError::InvalidToken
        })?;

        Ok(token_data.claims)
    }

    pub fn create_token(&self, employee: &Employee) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(self.ttl_days);

        let claims = Claims {
            id: employee.id,
            name: employee.name.clone(),
            email: employee.email.clone(),
            role: employee.role.clone(),
            alloted_area: employee.alloted_area.clone(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn service(secret: &str, ttl_days: i64) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/estate_portal_test")
            .unwrap();
        AuthService::new(EmployeeRepository::new(pool), secret.to_string(), ttl_days)
    }

    fn employee() -> Employee {
        Employee {
            id: Uuid::new_v4(),
            name: "Ana Souza".into(),
            email: "ana@estate.test".into(),
            password_hash: String::new(),
            phone: None,
            role: "sales".into(),
            department: Some("leads".into()),
            alloted_area: vec!["goa".into(), "delhi".into()],
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_carries_profile_claims() {
        let svc = service("segredo", 7);
        let employee = employee();

        let token = svc.create_token(&employee).unwrap();
        let claims = svc.decode_token(&token).unwrap();

        assert_eq!(claims.id, employee.id);
        assert_eq!(claims.role, "sales");
        assert_eq!(claims.alloted_area, vec!["goa", "delhi"]);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn rejects_token_signed_with_another_secret() {
        let token = service("outro", 7).create_token(&employee()).unwrap();
        let err = service("segredo", 7).decode_token(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn rejects_expired_and_garbage_tokens() {
        let svc = service("segredo", -1);
        let token = svc.create_token(&employee()).unwrap();
        assert!(matches!(svc.decode_token(&token), Err(AppError::InvalidToken)));
        assert!(matches!(svc.decode_token("nem.um.jwt"), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn hashes_passwords_with_bcrypt() {
        let hashed = hash_password("segredo123").await.unwrap();
        assert!(verify("segredo123", &hashed).unwrap());
        assert!(!verify("errada", &hashed).unwrap());
    }
}
