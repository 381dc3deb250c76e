//! Channel-Handler – Channel-Liste und Channel-Wechsel

use kanalfunk_core::types::{ChannelId, ConnectionId};
use kanalfunk_moderation::{BanPredicate, TextFilter};
use kanalfunk_protocol::events::ChannelInfo;
use kanalfunk_protocol::ServerEvent;
use std::sync::Arc;

use crate::error::RelayResult;
use crate::server_state::RelayState;

/// Channel-Liste in Konfigurationsreihenfolge
pub fn kanal_liste<B, F>(state: &Arc<RelayState<B, F>>) -> Vec<ChannelInfo>
where
    B: BanPredicate,
    F: TextFilter,
{
    state
        .registry
        .kanaele()
        .iter()
        .map(ChannelInfo::from)
        .collect()
}

/// Wechselt den Channel einer Verbindung und bestaetigt mit `joined`
///
/// Die Bestaetigung geht nur an die eigene Verbindung. Gibt den vorherigen
/// Channel zurueck.
pub fn handle_join<B, F>(
    ziel: &ChannelId,
    connection_id: ConnectionId,
    state: &Arc<RelayState<B, F>>,
) -> RelayResult<Option<ChannelId>>
where
    B: BanPredicate,
    F: TextFilter,
{
    let vorher = state.registry.beitreten(ziel, connection_id)?;

    state
        .broadcaster
        .an_verbindung_senden(&connection_id, ServerEvent::Joined(ziel.clone()));

    tracing::debug!(
        connection_id = %connection_id,
        channel_id = %ziel,
        vorher = ?vorher,
        "Channel gewechselt"
    );

    Ok(vorher)
}
