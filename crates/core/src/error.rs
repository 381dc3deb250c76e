//! Fehlertypen fuer Kanalfunk
//!
//! Zentraler Fehler-Enum fuer crate-uebergreifende Fehler (vor allem beim
//! Start). Die einzelnen Crates definieren eigene Fehler fuer ihre Domaene.

use thiserror::Error;

/// Globaler Result-Alias fuer Kanalfunk
pub type Result<T> = std::result::Result<T, KanalfunkError>;

/// Crate-uebergreifende Fehler
#[derive(Debug, Error)]
pub enum KanalfunkError {
    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    #[error("Channel doppelt konfiguriert: {0}")]
    DoppelterChannel(String),

    #[error("Standard-Channel nicht konfiguriert: {0}")]
    StandardChannelFehlt(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl KanalfunkError {
    /// Erstellt einen Konfigurationsfehler aus einer beliebigen Nachricht
    pub fn konfiguration(msg: impl Into<String>) -> Self {
        Self::Konfiguration(msg.into())
    }

    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}
