//! Gemeinsame Test-Hilfen fuer das Relay
//!
//! Ein `TestClient` verhaelt sich wie eine Verbindung ohne Socket: er ist
//! im Broadcaster registriert, besitzt eine Session und liest seine
//! zugestellten Ereignisse direkt aus der Send-Queue.


use std::sync::Arc;

use kanalfunk_core::types::{standard_kanaele, ChannelId, ConnectionId};
use kanalfunk_moderation::{BanList, WortFilter};
use kanalfunk_observability::KanalfunkMetrics;
use kanalfunk_protocol::events::{
    ChatSendRequest, DirectMessageRequest, ImageSendRequest, LoginRequest, SignalRequest,
};
use kanalfunk_protocol::{ClientEvent, ErrorCode, ServerEvent};
use tokio::sync::mpsc;

use crate::{ClientSession, MessageDispatcher, RelayConfig, RelayState};

pub(crate) type TestState = Arc<RelayState<BanList, WortFilter>>;

pub(crate) fn relay(config: RelayConfig) -> TestState {
    RelayState::neu(
        config,
        standard_kanaele(),
        Arc::new(BanList::in_memory()),
        Arc::new(WortFilter::standard()),
        KanalfunkMetrics::neu().unwrap(),
    )
    .unwrap()
}

pub(crate) fn standard_relay() -> TestState {
    relay(RelayConfig::default())
}

pub(crate) struct TestClient {
    pub session: ClientSession<BanList, WortFilter>,
    pub rx: mpsc::Receiver<ServerEvent>,
    dispatcher: MessageDispatcher<BanList, WortFilter>,
}

impl TestClient {
    /// Neue, noch nicht angemeldete Verbindung
    pub fn verbinden(state: &TestState) -> Self {
        let id = ConnectionId::new();
        let rx = state.broadcaster.client_registrieren(id);
        Self {
            session: ClientSession::neu(Arc::clone(state), id),
            rx,
            dispatcher: MessageDispatcher::neu(Arc::clone(state)),
        }
    }

    /// Verbindet, meldet an und verwirft die Channel-Liste
    pub fn angemeldet(state: &TestState, username: &str) -> Self {
        let mut client = Self::verbinden(state);
        assert_eq!(client.senden(login(username)), None);
        client.empfangen();
        client
    }

    pub fn id(&self) -> ConnectionId {
        self.session.connection_id()
    }

    /// Dispatcht ein Ereignis und gibt die Ablehnung zurueck (falls vorhanden)
    pub fn senden(&mut self, event: ClientEvent) -> Option<ServerEvent> {
        self.dispatcher.dispatch(event, &mut self.session)
    }

    /// Code der Ablehnung fuer ein Ereignis
    pub fn abgelehnt(&mut self, event: ClientEvent) -> ErrorCode {
        match self.senden(event) {
            Some(ServerEvent::Error(info)) => info.code,
            andere => panic!("Ablehnung erwartet, erhalten: {andere:?}"),
        }
    }

    /// Alle bisher zugestellten Ereignisse
    pub fn empfangen(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

// ---------------------------------------------------------------------------
// Ereignis-Bausteine
// ---------------------------------------------------------------------------

pub(crate) fn login(username: &str) -> ClientEvent {
    ClientEvent::Login(LoginRequest {
        username: username.into(),
    })
}

pub(crate) fn join(channel: &str) -> ClientEvent {
    ClientEvent::Join(ChannelId::from(channel))
}

pub(crate) fn nachricht(text: &str) -> ClientEvent {
    ClientEvent::Message(ChatSendRequest {
        channel: None,
        user: None,
        text: text.into(),
        pfp: Some("/pfp.png".into()),
    })
}

pub(crate) fn nachricht_an(channel: &str, text: &str) -> ClientEvent {
    ClientEvent::Message(ChatSendRequest {
        channel: Some(ChannelId::from(channel)),
        user: None,
        text: text.into(),
        pfp: None,
    })
}

pub(crate) fn bild(url: &str) -> ClientEvent {
    ClientEvent::Image(ImageSendRequest {
        channel: None,
        user: None,
        image_url: url.into(),
        pfp: None,
    })
}

pub(crate) fn dm(to: &str, text: &str) -> ClientEvent {
    ClientEvent::Dm(DirectMessageRequest {
        to: to.into(),
        from: None,
        text: text.into(),
        pfp: None,
    })
}

pub(crate) fn signal(nutzlast: serde_json::Value) -> ClientEvent {
    ClientEvent::Signal(SignalRequest {
        channel: None,
        data: nutzlast,
    })
}
