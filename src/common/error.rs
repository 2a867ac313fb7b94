// src/common/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

// El tipo de error de dominio. Los servicios y repositorios devuelven
// siempre `AppError`; el texto HTTP vive únicamente en `into_response`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de validación de payload")]
    PayloadValidation(#[from] validator::ValidationErrors),

    // Regla de negocio incumplida y corregible por el usuario
    // (falta almacén/cliente, documento sin líneas, pedido ya facturado...).
    #[error("{0}")]
    Validation(String),

    #[error("El documento está vencido")]
    ExpiredDocument,

    #[error("Stock insuficiente para {product} en {warehouse}")]
    InsufficientStock { product: String, warehouse: String },

    // Interno: el bucle de asignación agotó los reintentos. Si llega al
    // usuario es una falla de configuración, no un error suyo.
    #[error("No se pudo emitir un NCF único para el tenant")]
    DuplicateFiscalNumber,

    // Cubre también entidades de otro tenant: indistinguible de "no existe".
    #[error("Recurso no encontrado")]
    NotFound,

    #[error("El contador {counter} no puede retroceder de {current} a {attempted}")]
    CounterRegression {
        counter: &'static str,
        current: i64,
        attempted: i64,
    },

    #[error("Credenciales inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Error de base de datos")]
    Database(#[from] sqlx::Error),

    #[error("Error interno del servidor")]
    Internal(#[from] anyhow::Error),

    #[error("Error de Bcrypt: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("Error de JWT: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
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
                    "error": "Uno o más campos son inválidos.",
                    "details": details,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::Validation(msg) => {
                let body = Json(json!({ "error": msg }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::ExpiredDocument => {
                (StatusCode::CONFLICT, "La cotización ha expirado.".to_string())
            }
            AppError::InsufficientStock { product, warehouse } => (
                StatusCode::CONFLICT,
                format!("Stock insuficiente para {product} en {warehouse}."),
            ),
            AppError::CounterRegression { counter, current, attempted } => (
                StatusCode::CONFLICT,
                format!("El contador {counter} no puede bajar de {current} a {attempted}."),
            ),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Recurso no encontrado.".to_string()),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Usuario o contraseña inválidos.".to_string(),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticación inválido o ausente.".to_string(),
            ),

            // Todo lo demás (Database, Internal, DuplicateFiscalNumber...) es un 500.
            // Se registra con un id de correlación; el cliente solo ve el id.
            ref e => {
                let correlation_id = Uuid::new_v4();
                tracing::error!(%correlation_id, "Error interno del servidor: {}", e);
                let body = Json(json!({
                    "error": "Ocurrió un error inesperado.",
                    "correlationId": correlation_id,
                }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

// Rechazo simple para extractores (TenantContext, AuthenticatedUser) que
// no tienen acceso al AppError completo.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}
