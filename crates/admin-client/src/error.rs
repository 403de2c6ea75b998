use thiserror::Error;

/// Error taxonomy for the admin client.
///
/// `Validation` never reaches the network; `AuthExpired` is the 401 special
/// case and is raised by the response pipeline after the session has been
/// cleared. Transport failures (no response at all) surface as `Network`,
/// while any other non-2xx response becomes `Http` with the raw body.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("session expired")]
    AuthExpired,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// HTTP status of the rejected request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::AuthExpired => Some(401),
            _ => None,
        }
    }
}
