//! kanalfunk-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Kanalfunk-Crates gemeinsam genutzt werden.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{KanalfunkError, Result};
pub use types::{standard_kanaele, Channel, ChannelId, ConnectionId};
