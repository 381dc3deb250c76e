//! Fehlertypen fuer das Moderations-Crate

use thiserror::Error;

/// Moderations-Fehlertypen
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Ungueltiger Benutzername: {0}")]
    UngueltigerBenutzername(String),

    #[error("Bannliste beschaedigt: {0}")]
    BannlisteBeschaedigt(#[from] serde_json::Error),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type ModerationResult<T> = Result<T, ModerationError>;
