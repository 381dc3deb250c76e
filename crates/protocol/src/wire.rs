//! Wire-Format fuer WebSocket-Verbindungen
//!
//! Jeder WebSocket-Textframe enthaelt genau ein JSON-kodiertes Ereignis.
//! Die maximale Frame-Groesse ist konfigurierbar (Standard: 1 MB) und wird
//! vor der Deserialisierung eingehender Frames geprueft.

use thiserror::Error;

use crate::events::{ClientEvent, ServerEvent};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Frame-Groesse (1 MB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// Fehler
// ---------------------------------------------------------------------------

/// Fehler beim Kodieren oder Dekodieren eines Frames
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Frame zu gross: {groesse} Bytes (Maximum: {maximum} Bytes)")]
    FrameZuGross { groesse: usize, maximum: usize },

    #[error("JSON-Verarbeitung fehlgeschlagen: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result-Typ fuer das Wire-Format
pub type WireResult<T> = Result<T, WireError>;

// ---------------------------------------------------------------------------
// EventCodec
// ---------------------------------------------------------------------------

/// Codec fuer JSON-Textframes
///
/// Dekodiert `ClientEvent`s und kodiert `ServerEvent`s. Der Codec ist
/// zustandslos und kann pro Verbindung kopiert werden.
#[derive(Debug, Clone, Copy)]
pub struct EventCodec {
    /// Maximale erlaubte Frame-Groesse in Bytes
    max_frame_size: usize,
}

impl EventCodec {
    /// Erstellt einen neuen `EventCodec` mit Standard-Limits
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Erstellt einen `EventCodec` mit benutzerdefinierter maximaler Frame-Groesse
    pub fn with_max_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Gibt die konfigurierte maximale Frame-Groesse zurueck
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Dekodiert einen eingehenden Textframe
    pub fn decode(&self, frame: &str) -> WireResult<ClientEvent> {
        if frame.len() > self.max_frame_size {
            return Err(WireError::FrameZuGross {
                groesse: frame.len(),
                maximum: self.max_frame_size,
            });
        }
        Ok(serde_json::from_str(frame)?)
    }

    /// Kodiert ein ausgehendes Ereignis als Textframe
    ///
    /// Ohne Groessenpruefung, die Frame-Grenze gilt nur fuer Client-Frames.
    pub fn encode(&self, event: &ServerEvent) -> WireResult<String> {
        Ok(serde_json::to_string(event)?)
    }
}

impl Default for EventCodec {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
