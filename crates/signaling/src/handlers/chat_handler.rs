//! Chat-Handler – Verteilt Text, Bilder und Direktnachrichten
//!
//! Gebannte Absender und unbekannte Empfaenger fuehren zu einem still
//! verworfenen Ereignis: der Absender erfaehrt davon nichts, der Verwurf
//! wird nur geloggt und gezaehlt.

use kanalfunk_core::types::{ChannelId, ConnectionId};
use kanalfunk_moderation::{BanPredicate, TextFilter};
use kanalfunk_protocol::events::{
    ChatMessageInfo, ChatSendRequest, DirectMessageInfo, DirectMessageRequest, ImageMessageInfo,
    ImageSendRequest,
};
use kanalfunk_protocol::ServerEvent;
use std::sync::Arc;

use crate::server_state::RelayState;

// ---------------------------------------------------------------------------
// Ergebnis
// ---------------------------------------------------------------------------

/// Grund fuer einen stillen Verwurf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerwerfGrund {
    GebannterAbsender,
    UnbekannterEmpfaenger,
}

impl VerwerfGrund {
    /// Label fuer `kanalfunk_events_dropped_total`
    pub fn label(&self) -> &'static str {
        match self {
            Self::GebannterAbsender => "banned_sender",
            Self::UnbekannterEmpfaenger => "unresolved_recipient",
        }
    }
}

/// Ergebnis einer Zustellung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zustellung {
    /// Anzahl der Verbindungen in deren Queue das Ereignis eingereiht wurde
    Zugestellt { empfaenger: usize },
    Verworfen(VerwerfGrund),
}

/// Angemeldeter Absender eines Ereignisses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Absender {
    pub connection_id: ConnectionId,
    pub username: String,
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// Verteilt eine Text-Nachricht an alle Mitglieder des Channels
pub fn handle_message<B, F>(
    request: ChatSendRequest,
    absender: &Absender,
    channel_id: &ChannelId,
    state: &Arc<RelayState<B, F>>,
) -> Zustellung
where
    B: BanPredicate,
    F: TextFilter,
{
    if state.bans.ist_gebannt(&absender.username) {
        return verwerfen("message", absender, VerwerfGrund::GebannterAbsender, state);
    }

    let event = ServerEvent::Message(ChatMessageInfo {
        user: absender.username.clone(),
        text: state.filter.bereinigen(&request.text),
        pfp: request.pfp,
        is_privileged: state.ist_admin(&absender.username),
    });

    an_channel_zustellen(event, absender, channel_id, state)
}

/// Verteilt eine Bild-Nachricht an alle Mitglieder des Channels
pub fn handle_image<B, F>(
    request: ImageSendRequest,
    absender: &Absender,
    channel_id: &ChannelId,
    state: &Arc<RelayState<B, F>>,
) -> Zustellung
where
    B: BanPredicate,
    F: TextFilter,
{
    if state.bans.ist_gebannt(&absender.username) {
        return verwerfen("image", absender, VerwerfGrund::GebannterAbsender, state);
    }

    let event = ServerEvent::Image(ImageMessageInfo {
        user: absender.username.clone(),
        image_url: request.image_url,
        pfp: request.pfp,
    });

    an_channel_zustellen(event, absender, channel_id, state)
}

/// Stellt eine Direktnachricht an genau eine Verbindung zu
///
/// Der Text wird nicht gefiltert.
pub fn handle_dm<B, F>(
    request: DirectMessageRequest,
    absender: &Absender,
    state: &Arc<RelayState<B, F>>,
) -> Zustellung
where
    B: BanPredicate,
    F: TextFilter,
{
    if state.bans.ist_gebannt(&absender.username) {
        return verwerfen("dm", absender, VerwerfGrund::GebannterAbsender, state);
    }

    let Some(ziel) = state.directory.nachschlagen(&request.to) else {
        return verwerfen("dm", absender, VerwerfGrund::UnbekannterEmpfaenger, state);
    };

    let event = ServerEvent::Dm(DirectMessageInfo {
        from: absender.username.clone(),
        text: request.text,
        pfp: request.pfp,
    });

    let empfaenger = usize::from(state.broadcaster.an_verbindung_senden(&ziel, event));
    state.metriken.zugestellt("dm", empfaenger);

    tracing::debug!(
        from = %absender.username,
        to = %request.to,
        empfaenger,
        "Direktnachricht zugestellt"
    );

    Zustellung::Zugestellt { empfaenger }
}

// ---------------------------------------------------------------------------
// Hilfsfunktionen
// ---------------------------------------------------------------------------

fn an_channel_zustellen<B, F>(
    event: ServerEvent,
    absender: &Absender,
    channel_id: &ChannelId,
    state: &Arc<RelayState<B, F>>,
) -> Zustellung
where
    B: BanPredicate,
    F: TextFilter,
{
    let art = event.name();
    let mitglieder = state.registry.mitglieder(channel_id);
    let ausser = (!state.config.echo_an_absender).then_some(&absender.connection_id);

    let empfaenger = state
        .broadcaster
        .an_verbindungen_senden(&mitglieder, ausser, &event);
    state.metriken.zugestellt(art, empfaenger);

    tracing::debug!(
        username = %absender.username,
        channel_id = %channel_id,
        event = art,
        empfaenger,
        "Ereignis an Channel verteilt"
    );

    Zustellung::Zugestellt { empfaenger }
}

fn verwerfen<B, F>(
    art: &'static str,
    absender: &Absender,
    grund: VerwerfGrund,
    state: &Arc<RelayState<B, F>>,
) -> Zustellung
where
    B: BanPredicate,
    F: TextFilter,
{
    state.metriken.verworfen(grund.label());
    tracing::debug!(
        username = %absender.username,
        event = art,
        grund = grund.label(),
        "Ereignis still verworfen"
    );
    Zustellung::Verworfen(grund)
}
