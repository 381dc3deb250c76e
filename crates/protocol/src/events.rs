//! Echtzeit-Ereignisse (WebSocket)
//!
//! Definiert alle Ereignisse die ueber die bidirektionale Verbindung
//! zwischen Client und Server ausgetauscht werden.
//!
//! ## Design
//! - Jeder Frame ist ein JSON-Objekt `{"event": "<name>", "data": <payload>}`
//! - Adjacently tagged Enums fuer typsichere Ereignistypen
//! - Feldnamen auf dem Draht entsprechen dem Browser-Client (`pfp`, `imageUrl`, `isAdmin`)

use kanalfunk_core::types::{Channel, ChannelId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Standardisierte Fehler-Codes fuer Ablehnungs-Ereignisse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Allgemein
    InternalError,
    InvalidRequest,
    // Session
    Unauthenticated,
    AlreadyAuthenticated,
    UsernameTaken,
    SessionReplaced,
    ConnectionClosed,
    // Channel
    UnknownChannel,
    NotInChannel,
    // Server
    ServerFull,
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

/// Login-Anfrage (Benutzername wurde vorher ueber die REST-API geprueft)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

/// Text-Nachricht an einen Channel
///
/// `user` wird vom Client mitgesendet, serverseitig aber durch den
/// angemeldeten Benutzernamen der Session ersetzt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSendRequest {
    #[serde(default)]
    pub channel: Option<ChannelId>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub pfp: Option<String>,
}

/// Bild-Nachricht an einen Channel (URL stammt aus dem Upload-Endpunkt)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSendRequest {
    #[serde(default)]
    pub channel: Option<ChannelId>,
    #[serde(default)]
    pub user: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub pfp: Option<String>,
}

/// Direktnachricht an einen Benutzernamen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessageRequest {
    pub to: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub pfp: Option<String>,
}

/// Signaling-Nutzlast (SDP oder ICE-Kandidat), wird nicht interpretiert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRequest {
    #[serde(default)]
    pub channel: Option<ChannelId>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Alle Ereignisse die ein Client senden darf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Login(LoginRequest),
    Join(ChannelId),
    Message(ChatSendRequest),
    Image(ImageSendRequest),
    Dm(DirectMessageRequest),
    Signal(SignalRequest),
}

impl ClientEvent {
    /// Ereignisname fuer Logs und Metrik-Labels
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::Join(_) => "join",
            Self::Message(_) => "message",
            Self::Image(_) => "image",
            Self::Dm(_) => "dm",
            Self::Signal(_) => "signal",
        }
    }
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// Channel-Eintrag der Channel-Liste
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
}

impl From<&Channel> for ChannelInfo {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.id.clone(),
            name: channel.name.clone(),
        }
    }
}

/// Zugestellte Text-Nachricht
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageInfo {
    pub user: String,
    pub text: String,
    pub pfp: Option<String>,
    /// Markierung fuer die Admin-Krone im Client, keine Berechtigung
    #[serde(rename = "isAdmin")]
    pub is_privileged: bool,
}

/// Zugestellte Bild-Nachricht
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMessageInfo {
    pub user: String,
    pub image_url: String,
    pub pfp: Option<String>,
}

/// Zugestellte Direktnachricht
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessageInfo {
    pub from: String,
    pub text: String,
    pub pfp: Option<String>,
}

/// Ablehnung eines Client-Ereignisses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

/// Alle Ereignisse die der Server senden kann
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Channels(Vec<ChannelInfo>),
    Joined(ChannelId),
    Message(ChatMessageInfo),
    Image(ImageMessageInfo),
    Dm(DirectMessageInfo),
    Signal(serde_json::Value),
    Error(ErrorInfo),
}

impl ServerEvent {
    /// Erstellt ein Ablehnungs-Ereignis
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error(ErrorInfo {
            code,
            message: message.into(),
        })
    }

    /// Ereignisname fuer Logs und Metrik-Labels
    pub fn name(&self) -> &'static str {
        match self {
            Self::Channels(_) => "channels",
            Self::Joined(_) => "joined",
            Self::Message(_) => "message",
            Self::Image(_) => "image",
            Self::Dm(_) => "dm",
            Self::Signal(_) => "signal",
            Self::Error(_) => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
