//! Tipos de error de la capa de acceso a contenidos.

use reqwest::StatusCode;
use thiserror::Error;

/// Resultado de las operaciones contra el CMS.
pub type ContentResult<T> = Result<T, ContentError>;

/// Errores posibles al consultar o enviar datos al CMS.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("error HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("el CMS respondió {status} para {url}")]
    Status { status: StatusCode, url: String },

    #[error("no encontrado: {0}")]
    NotFound(String),

    #[error("la consulta GraphQL devolvió errores: {0}")]
    GraphQl(String),

    #[error("respuesta no decodificable: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("entrada no válida: {0}")]
    InvalidInput(String),

    #[error("envío rechazado ({status}): {message}")]
    Submission { status: StatusCode, message: String },

    #[error("{context}: {source}")]
    Fetch {
        context: String,
        #[source]
        source: Box<ContentError>,
    },
}

impl ContentError {
    /// Envuelve el error con un mensaje legible para la capa de UI.
    pub fn context(self, context: impl Into<String>) -> Self {
        ContentError::Fetch {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Indica si merece la pena reintentar la petición.
    pub fn is_retryable(&self) -> bool {
        match self {
            ContentError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            ContentError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            ContentError::Fetch { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Devuelve true si, quitando el contexto, el error es un 404 o un `NotFound`.
    pub fn is_not_found(&self) -> bool {
        match self {
            ContentError::NotFound(_) => true,
            ContentError::Status { status, .. } => *status == StatusCode::NOT_FOUND,
            ContentError::Fetch { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        let err = ContentError::Status {
            status: StatusCode::BAD_GATEWAY,
            url: "http://cms/x".into(),
        };
        assert!(err.is_retryable());
        assert!(err.context("cargando documentos").is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        let err = ContentError::Status {
            status: StatusCode::NOT_FOUND,
            url: "http://cms/x".into(),
        };
        assert!(!err.is_retryable());
        assert!(err.is_not_found());
        assert!(!ContentError::InvalidInput("x".into()).is_retryable());
    }

    #[test]
    fn context_keeps_source_message() {
        let err = ContentError::NotFound("bai-viet".into()).context("No se pudo cargar el artículo");
        assert_eq!(
            err.to_string(),
            "No se pudo cargar el artículo: no encontrado: bai-viet"
        );
        assert!(err.is_not_found());
    }
}
