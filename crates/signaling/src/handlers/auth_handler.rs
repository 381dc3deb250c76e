//! Auth-Handler – Login und Aufraeumen beim Trennen
//!
//! Der Login traegt den Benutzernamen gemaess `ReloginPolitik` ins
//! Verzeichnis ein, tritt dem Standard-Channel bei und sendet der eigenen
//! Verbindung die Channel-Liste.

use kanalfunk_core::types::{ChannelId, ConnectionId};
use kanalfunk_moderation::{BanPredicate, TextFilter};
use kanalfunk_protocol::{ErrorCode, ServerEvent};
use std::sync::Arc;

use crate::error::{RelayError, RelayResult};
use crate::handlers::channel_handler;
use crate::server_state::{RelayState, ReloginPolitik};

/// Meldet eine Verbindung unter einem Benutzernamen an
///
/// Gibt den bereinigten Benutzernamen und den Standard-Channel zurueck.
/// Schlaegt der Beitritt fehl, wird der Verzeichniseintrag zurueckgenommen.
pub fn handle_login<B, F>(
    username: &str,
    connection_id: ConnectionId,
    state: &Arc<RelayState<B, F>>,
) -> RelayResult<(String, ChannelId)>
where
    B: BanPredicate,
    F: TextFilter,
{
    let username = username.trim();
    if username.is_empty() {
        return Err(RelayError::UngueltigeAnfrage(
            "Benutzername darf nicht leer sein".into(),
        ));
    }

    match state.config.relogin_politik {
        ReloginPolitik::Ueberschreiben => {
            if let Some(alt) = state.directory.registrieren(username, connection_id) {
                tracing::info!(
                    username = %username,
                    alt = %alt,
                    neu = %connection_id,
                    "Benutzername an neuere Verbindung uebergeben"
                );
            }
        }
        ReloginPolitik::Ablehnen => {
            if let Err(besitzer) = state
                .directory
                .registrieren_falls_frei(username, connection_id)
            {
                tracing::info!(
                    username = %username,
                    besitzer = %besitzer,
                    "Login abgelehnt – Benutzername vergeben"
                );
                return Err(RelayError::BenutzernameVergeben(username.to_string()));
            }
        }
        ReloginPolitik::Verdraengen => {
            if let Some(alt) = state.directory.registrieren(username, connection_id) {
                verdraengen(alt, username, state);
            }
        }
    }

    let standard = state.config.standard_channel.clone();
    if let Err(e) = state.registry.beitreten(&standard, connection_id) {
        state.directory.entfernen(connection_id);
        return Err(e);
    }

    state.metriken.authenticated_sessions.inc();

    state.broadcaster.an_verbindung_senden(
        &connection_id,
        ServerEvent::Channels(channel_handler::kanal_liste(state)),
    );

    tracing::info!(
        username = %username,
        connection_id = %connection_id,
        channel_id = %standard,
        "Benutzer angemeldet"
    );

    Ok((username.to_string(), standard))
}

/// Schliesst die vorherige Verbindung eines Benutzernamens
///
/// Die alte Verbindung erhaelt `SESSION_REPLACED`, verliert ihre
/// Mitgliedschaft und ihre Send-Queue wird geschlossen.
fn verdraengen<B, F>(alt: ConnectionId, username: &str, state: &Arc<RelayState<B, F>>)
where
    B: BanPredicate,
    F: TextFilter,
{
    let gemeldet = state.broadcaster.an_verbindung_senden(
        &alt,
        ServerEvent::error(
            ErrorCode::SessionReplaced,
            "Benutzername wurde von einer neueren Verbindung uebernommen",
        ),
    );
    if !gemeldet {
        tracing::info!(
            username = %username,
            alt = %alt,
            "SESSION_REPLACED nicht eingereiht, Grund nur im Close-Frame"
        );
    }
    state.registry.alle_verlassen(alt);
    state.broadcaster.client_entfernen(&alt);

    tracing::info!(username = %username, alt = %alt, "Vorherige Verbindung verdraengt");
}

/// Raeumt alle Spuren einer Verbindung auf
///
/// Idempotent: mehrfacher Aufruf ist ein No-op.
pub fn handle_disconnect<B, F>(connection_id: ConnectionId, state: &Arc<RelayState<B, F>>)
where
    B: BanPredicate,
    F: TextFilter,
{
    let channel = state.registry.alle_verlassen(connection_id);
    let username = state.directory.entfernen(connection_id);
    state.broadcaster.client_entfernen(&connection_id);

    tracing::debug!(
        connection_id = %connection_id,
        username = ?username,
        channel_id = ?channel,
        "Verbindung aufgeraeumt"
    );
}
