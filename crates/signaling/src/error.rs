//! Fehlertypen fuer das Relay
//!
//! Jeder Fehler hier ist eine Protokollverletzung der ausloesenden
//! Verbindung und wird ihr als `error`-Ereignis gemeldet. Still verworfene
//! Inhalte (gebannter Absender, unbekannter Empfaenger) sind keine Fehler,
//! siehe `handlers::chat_handler::Zustellung`.

use kanalfunk_core::types::ChannelId;
use kanalfunk_protocol::{ErrorCode, ServerEvent};
use thiserror::Error;

/// Relay-Fehler
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Unbekannter Channel: {0}")]
    UnbekannterChannel(ChannelId),

    #[error("Nicht im Channel {angefragt} (aktuell: {aktuell})")]
    NichtImChannel {
        angefragt: ChannelId,
        aktuell: ChannelId,
    },

    #[error("Bereits angemeldet")]
    BereitsAngemeldet,

    #[error("Nicht angemeldet")]
    NichtAngemeldet,

    #[error("Benutzername bereits vergeben: {0}")]
    BenutzernameVergeben(String),

    #[error("Ungueltige Anfrage: {0}")]
    UngueltigeAnfrage(String),

    #[error("Verbindung bereits geschlossen")]
    VerbindungGeschlossen,
}

/// Result-Typ fuer Relay-Operationen
pub type RelayResult<T> = Result<T, RelayError>;

impl RelayError {
    /// Wire-Fehlercode fuer das `error`-Ereignis
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnbekannterChannel(_) => ErrorCode::UnknownChannel,
            Self::NichtImChannel { .. } => ErrorCode::NotInChannel,
            Self::BereitsAngemeldet => ErrorCode::AlreadyAuthenticated,
            Self::NichtAngemeldet => ErrorCode::Unauthenticated,
            Self::BenutzernameVergeben(_) => ErrorCode::UsernameTaken,
            Self::UngueltigeAnfrage(_) => ErrorCode::InvalidRequest,
            Self::VerbindungGeschlossen => ErrorCode::ConnectionClosed,
        }
    }

    /// Label fuer `kanalfunk_protocol_errors_total`
    pub fn metrik_label(&self) -> &'static str {
        match self.error_code() {
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::AlreadyAuthenticated => "ALREADY_AUTHENTICATED",
            ErrorCode::UsernameTaken => "USERNAME_TAKEN",
            ErrorCode::SessionReplaced => "SESSION_REPLACED",
            ErrorCode::ConnectionClosed => "CONNECTION_CLOSED",
            ErrorCode::UnknownChannel => "UNKNOWN_CHANNEL",
            ErrorCode::NotInChannel => "NOT_IN_CHANNEL",
            ErrorCode::ServerFull => "SERVER_FULL",
        }
    }

    /// Ablehnungs-Ereignis fuer die ausloesende Verbindung
    pub fn als_event(&self) -> ServerEvent {
        ServerEvent::error(self.error_code(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehlercodes() {
        assert_eq!(
            RelayError::UnbekannterChannel("lobby".into()).error_code(),
            ErrorCode::UnknownChannel
        );
        assert_eq!(
            RelayError::BereitsAngemeldet.error_code(),
            ErrorCode::AlreadyAuthenticated
        );
        assert_eq!(
            RelayError::NichtAngemeldet.error_code(),
            ErrorCode::Unauthenticated
        );
    }

    #[test]
    fn als_event_enthaelt_nachricht() {
        let event = RelayError::UnbekannterChannel("lobby".into()).als_event();
        match event {
            ServerEvent::Error(info) => {
                assert_eq!(info.code, ErrorCode::UnknownChannel);
                assert!(info.message.contains("lobby"));
            }
            andere => panic!("Unerwartetes Ereignis: {andere:?}"),
        }
    }

    #[test]
    fn metrik_label_entspricht_wire_format() {
        let fehler = RelayError::NichtImChannel {
            angefragt: "random".into(),
            aktuell: "general".into(),
        };
        let wire = serde_json::to_value(fehler.error_code()).unwrap();
        assert_eq!(wire, fehler.metrik_label());
    }
}
