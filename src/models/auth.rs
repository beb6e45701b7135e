// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// Dados para login (senha compartilhada única)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
}

// Estrutura de dados ("claims") dentro do JWT da sessão
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (sempre o operador do painel)
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued At
}

/// Sessão válida, inserida nas extensions pelo guard.
#[derive(Debug, Clone)]
pub struct Session(pub Claims);
