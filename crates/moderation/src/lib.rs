//! kanalfunk-moderation – Kollaborateure des Relays
//!
//! Dieses Crate implementiert:
//! - BanList: synchrones Sperr-Praedikat mit JSON-Datei-Persistenz
//! - WortFilter: Text-Transformation fuer Chat-Nachrichten
//! - ChatBot: vorgefertigte Antworten fuer den Chatbot-Channel
//!
//! # Beispiel
//!
//! ```no_run
//! use kanalfunk_moderation::{BanList, BanPredicate, TextFilter, WortFilter};
//!
//! #[tokio::main]
//! async fn main() {
//!     let bans = BanList::laden("bans.json").await.unwrap();
//!     bans.bannen("troll").await.unwrap();
//!     assert!(bans.ist_gebannt("troll"));
//!
//!     let filter = WortFilter::standard();
//!     println!("{}", filter.bereinigen("so ein shit"));
//! }
//! ```

pub mod bans;
pub mod bot;
pub mod error;
pub mod filter;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use bans::{BanList, BanPredicate};
pub use bot::ChatBot;
pub use error::{ModerationError, ModerationResult};
pub use filter::{TextFilter, WortFilter};
