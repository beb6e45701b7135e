// src/services/auth.rs

use bcrypt::verify;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{common::error::AppError, models::auth::Claims};

/// Único "usuário" do painel.
const OPERATOR: &str = "operator";

#[derive(Clone)]
pub struct AuthService {
    password_hash: String,
    session_secret: String,
    session_ttl_days: i64,
}

impl AuthService {
    pub fn new(password_hash: String, session_secret: String, session_ttl_days: i64) -> Self {
        Self {
            password_hash,
            session_secret,
            session_ttl_days,
        }
    }

    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_days * 24 * 60 * 60
    }

    /// Troca a senha compartilhada por um token de sessão assinado.
    pub async fn login(&self, password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let password_hash_clone = self.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::warn!("Tentativa de login com senha inválida");
            return Err(AppError::InvalidCredentials);
        }

        self.create_token()
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.session_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized)?;

        Ok(token_data.claims)
    }

    fn create_token(&self) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(self.session_ttl_days);

        let claims = Claims {
            sub: OPERATOR.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.session_secret.as_ref()),
        )?)
    }
}
