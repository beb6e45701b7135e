use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::drops::{DropStatus, ExistingDrop};

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Entrada inválida com um código curto legível por máquina
    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    #[error("Senha inválida")]
    InvalidCredentials,

    #[error("Sessão inválida ou ausente")]
    Unauthorized,

    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("Endereço já possui um box drop")]
    DuplicateAddress(ExistingDrop),

    #[error("Transição inválida a partir de {0:?}")]
    InvalidTransition(DropStatus),

    // Violação de índice único vinda do banco (tratada pelos serviços)
    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Integração de mapas não configurada")]
    MapsUnavailable,

    #[error("Falha no provedor de mapas: {0}")]
    UpstreamError(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let codes: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), codes);
                }
                let body = Json(json!({
                    "error": "validation_failed",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::DuplicateAddress(existing) => {
                let body = Json(json!({
                    "error": "duplicate_address",
                    "existing": existing,
                    "message": "A box drop already exists for this address. \
                                Open the existing record or resend with allow_duplicate=true to create another one.",
                }));
                return (StatusCode::CONFLICT, body).into_response();
            }
            AppError::InvalidTransition(from) => {
                let body = Json(json!({
                    "error": "invalid_transition",
                    "from": from,
                }));
                return (StatusCode::CONFLICT, body).into_response();
            }
            AppError::BadRequest(code) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": code }))).into_response();
            }
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid password"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            AppError::UniqueConstraintViolation(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::MapsUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "maps_unavailable"),
            AppError::UpstreamError(ref detail) => {
                tracing::warn!("Provedor de mapas falhou: {}", detail);
                (StatusCode::BAD_GATEWAY, "maps_upstream_error")
            }

            // Todos os outros erros (DatabaseError, InternalServerError...) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
