// src/common/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    // Payload rejeitado pelo validator (campos anotados nos structs).
    #[error("Erro de validação")]
    PayloadValidation(#[from] validator::ValidationErrors),

    // Regra de negócio violada em um create (preço <= 0, SKU ausente...).
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    // O Contifico respondeu não-2xx ou a chamada falhou na rede. Quando o
    // upstream devolve um corpo de erro com id (pessoa duplicada), ele vem
    // em `external_id` para o chamador persistir mesmo assim.
    #[error("Contifico respondeu {status}: {message}")]
    ExternalApi {
        status: u16,
        message: String,
        external_id: Option<String>,
    },

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    Database(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    Internal(#[from] anyhow::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16()).unwrap_or(500);
        AppError::ExternalApi {
            status,
            message: format!("Error al comunicarse con Contifico: {}", err),
            external_id: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // Retornamos todos os detalhes da validação.
            AppError::PayloadValidation(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "message": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),

            // Repassa o status que o Contifico devolveu, quando houver.
            AppError::ExternalApi { status, message, .. } => {
                tracing::error!("Erro do Contifico ({}): {}", status, message);
                let status = StatusCode::from_u16(status)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, message)
            }

            // Todos os outros erros (Database, Internal) viram 500.
            // O `tracing` loga a mensagem detalhada; o caller recebe algo genérico.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error interno del servidor".to_string(),
                )
            }
        };

        // Resposta padrão: sempre um JSON com `message`.
        let body = Json(json!({ "message": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn erros_mapeiam_para_os_status_do_contrato() {
        let casos = [
            (AppError::Validation("precio".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("persona".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("duplicado".into()), StatusCode::CONFLICT),
            (
                AppError::ExternalApi {
                    status: 402,
                    message: "sin saldo".into(),
                    external_id: None,
                },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                AppError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (erro, esperado) in casos {
            assert_eq!(erro.into_response().status(), esperado);
        }
    }

    #[test]
    fn status_invalido_do_upstream_vira_500() {
        let erro = AppError::ExternalApi {
            status: 0,
            message: "sem status".into(),
            external_id: None,
        };
        assert_eq!(
            erro.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
