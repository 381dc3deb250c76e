//! kanalfunk-signaling – Echtzeit-Relay
//!
//! Dieser Crate implementiert den Relay-Kern von Kanalfunk: Benutzer-
//! verzeichnis, statische Channels, Session-Zustandsmaschine, Zustellung
//! von Chat-Ereignissen und die Weiterleitung von WebRTC-Signaling.
//!
//! ## Architektur
//!
//! ```text
//! WebSocket-Endpunkt (/ws)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  ClientSession: NichtAuthentifiziert -> Authentifiziert(channel) -> Geschlossen
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- AuthHandler     (Login, Trennen)
//!     +-- ChannelHandler  (Channel-Liste, Wechsel)
//!     +-- ChatHandler     (Text, Bild, Direktnachricht)
//!     +-- SignalHandler   (WebRTC-Signaling)
//!
//! Directory        – Benutzername -> Verbindung
//! ChannelRegistry  – Channel -> Mitglieder
//! EventBroadcaster – Send-Queues aller Verbindungen
//! ```

pub mod broadcast;
pub mod connection;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod server_state;
pub mod session;
pub mod ws;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use connection::ClientConnection;
pub use directory::Directory;
pub use dispatcher::MessageDispatcher;
pub use error::{RelayError, RelayResult};
pub use handlers::chat_handler::{VerwerfGrund, Zustellung};
pub use registry::ChannelRegistry;
pub use server_state::{RelayConfig, RelayState, ReloginPolitik};
pub use session::{ClientSession, SessionZustand};
pub use ws::relay_router;
