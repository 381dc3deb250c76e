//! kanalfunk-protocol – Protokoll-Definitionen
//!
//! Dieses Crate definiert alle Ereignistypen, die zwischen Client und Server
//! ueber die Echtzeit-Verbindung ausgetauscht werden, sowie das Wire-Format.

pub mod events;
pub mod wire;

pub use events::{ClientEvent, ErrorCode, ServerEvent};
pub use wire::{EventCodec, WireError};
