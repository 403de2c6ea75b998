use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API error: {0}")]
    Client(#[from] admin_client::ClientError),

    #[error("API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Prompt error: {0}")]
    Prompt(#[from] inquire::InquireError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not logged in; run `refadmin login <telegram-id>` first")]
    AuthRequired,

    #[error("Session expired; run `refadmin login <telegram-id>` again")]
    SessionExpired,
}
