//! Signal-Handler – Leitet WebRTC-Signaling an den Channel weiter
//!
//! Die Nutzlast wird nicht interpretiert. Der Ursprung erhaelt sein eigenes
//! Signal nie zurueck.

use kanalfunk_core::types::{ChannelId, ConnectionId};
use kanalfunk_moderation::{BanPredicate, TextFilter};
use kanalfunk_protocol::ServerEvent;
use std::sync::Arc;

use crate::server_state::RelayState;

/// Leitet die Nutzlast an alle anderen Mitglieder des Channels weiter
///
/// Gibt die Anzahl der Empfaenger zurueck.
pub fn handle_signal<B, F>(
    nutzlast: serde_json::Value,
    ursprung: ConnectionId,
    channel_id: &ChannelId,
    state: &Arc<RelayState<B, F>>,
) -> usize
where
    B: BanPredicate,
    F: TextFilter,
{
    let mitglieder = state.registry.mitglieder(channel_id);
    let empfaenger = state.broadcaster.an_verbindungen_senden(
        &mitglieder,
        Some(&ursprung),
        &ServerEvent::Signal(nutzlast),
    );
    state.metriken.zugestellt("signal", empfaenger);

    tracing::trace!(
        connection_id = %ursprung,
        channel_id = %channel_id,
        empfaenger,
        "Signal weitergeleitet"
    );

    empfaenger
}
