//! Gemeinsame Identifikationstypen fuer Kanalfunk
//!
//! IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! Verbindungs-Handles und Channel-Kennungen zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle einer einzelnen Netzwerkverbindung
///
/// Wird pro angenommener Verbindung einmal vergeben und nie wiederverwendet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// Stabile Kennung eines konfigurierten Channels (z.B. `general`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Statisch konfigurierter Channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Stabile, eindeutige Kennung
    pub id: ChannelId,
    /// Anzeigename (z.B. `#general`)
    pub name: String,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ChannelId::new(id),
            name: name.into(),
        }
    }
}

/// Standard-Channelliste, wenn die Konfiguration keine eigene angibt
pub fn standard_kanaele() -> Vec<Channel> {
    vec![
        Channel::new("general", "#general"),
        Channel::new("game-updates", "#game-updates"),
        Channel::new("random", "#random"),
        Channel::new("chatbot", "#chatbot"),
    ]
}
