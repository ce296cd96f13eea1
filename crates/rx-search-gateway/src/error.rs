//! Boundary error types with structured JSON bodies.

use serde::Serialize;
use thiserror::Error;

use rx_search_core::{CatalogError, ConfigError};

/// Language for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    /// Pick a locale from a language tag such as `es-MX` or `en_US`.
    /// Anything unrecognized falls back to English.
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .split(|c| c == '-' || c == '_' || c == ',' || c == ';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match primary.as_str() {
            "es" => Locale::Es,
            _ => Locale::En,
        }
    }
}

/// Structured error body returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Gateway errors with HTTP-style status mapping.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::BadRequest(_) => 400,
            GatewayError::Internal(_) | GatewayError::Catalog(_) | GatewayError::Config(_) => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::BadRequest(_) => "BAD_REQUEST",
            GatewayError::Internal(_) | GatewayError::Catalog(_) | GatewayError::Config(_) => {
                "INTERNAL"
            }
        }
    }

    /// Message safe to show a user. Server-side failures never leak detail.
    pub fn user_message(&self, locale: Locale) -> String {
        match (self, locale) {
            (GatewayError::BadRequest(detail), Locale::En) => {
                format!("The search request is invalid: {detail}")
            }
            (GatewayError::BadRequest(detail), Locale::Es) => {
                format!("La solicitud de búsqueda no es válida: {detail}")
            }
            (_, Locale::En) => "An internal error occurred. Please try again.".to_string(),
            (_, Locale::Es) => {
                "Se produjo un error interno. Por favor, inténtelo de nuevo.".to_string()
            }
        }
    }

    pub fn to_body(&self, locale: Locale) -> ErrorBody {
        if self.status_code() >= 500 {
            tracing::error!(error = %self, "Gateway internal error");
        }
        ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.user_message(locale),
            },
        }
    }
}
