//! Handler fuer alle Client-Ereignisse
//!
//! Jeder Handler ist fuer einen bestimmten Ereignistyp zustaendig und hat
//! Zugriff auf den gemeinsamen RelayState. Handler halten nie eine Sperre
//! ueber die Zustellung hinweg.

pub mod auth_handler;
pub mod channel_handler;
pub mod chat_handler;
pub mod signal_handler;
