//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung laeuft in einem eigenen tokio-Task. Eingehende Frames
//! werden nacheinander dekodiert und dispatcht; ausgehende Ereignisse kommen
//! ausschliesslich aus der Send-Queue der Zustellschicht.
//!
//! Die Verbindung endet bei
//! - Close-Frame oder Lesefehler des Clients
//! - geschlossener Send-Queue (Verdraengung durch neueren Login)
//! - Shutdown-Signal

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use kanalfunk_core::types::ConnectionId;
use kanalfunk_moderation::{BanPredicate, TextFilter};
use kanalfunk_protocol::{ErrorCode, EventCodec, ServerEvent};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::dispatcher::MessageDispatcher;
use crate::server_state::RelayState;
use crate::session::ClientSession;

/// Close-Code fuer eine durch neueren Login verdraengte Verbindung
pub const CLOSE_SESSION_REPLACED: u16 = 4001;

/// Close-Frame nach Verdraengung
///
/// Traegt den Grund auch dann, wenn `SESSION_REPLACED` wegen voller Queue
/// nicht mehr zugestellt werden konnte.
fn verdraengt_close_frame() -> Message {
    Message::Close(Some(CloseFrame {
        code: CLOSE_SESSION_REPLACED,
        reason: "SESSION_REPLACED".into(),
    }))
}

/// Verarbeitet eine einzelne WebSocket-Verbindung
pub struct ClientConnection<B: BanPredicate, F: TextFilter> {
    state: Arc<RelayState<B, F>>,
    peer_addr: Option<SocketAddr>,
}

impl<B: BanPredicate, F: TextFilter> ClientConnection<B, F> {
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<RelayState<B, F>>, peer_addr: Option<SocketAddr>) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verarbeitungsschleife
    ///
    /// Laeuft bis die Verbindung getrennt wird oder ein Shutdown-Signal
    /// eingeht. Danach ist die Verbindung aus allen Tabellen entfernt.
    pub async fn verarbeiten(
        self,
        socket: WebSocket,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let connection_id = ConnectionId::new();
        let peer = self
            .peer_addr
            .map(|a| a.to_string())
            .unwrap_or_else(|| "unbekannt".to_string());

        tracing::info!(connection_id = %connection_id, peer = %peer, "Neue Verbindung");

        let codec = EventCodec::with_max_size(self.state.config.max_frame_groesse);
        let mut sende_rx = self.state.broadcaster.client_registrieren(connection_id);
        let mut session = ClientSession::neu(Arc::clone(&self.state), connection_id);
        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));
        self.state.metriken.connected_clients.inc();

        let (mut ws_tx, mut ws_rx) = socket.split();

        loop {
            tokio::select! {
                // Eingehender Frame vom Client
                frame = ws_rx.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            let antwort = match codec.decode(&text) {
                                Ok(event) => {
                                    tracing::trace!(
                                        connection_id = %connection_id,
                                        event = event.name(),
                                        "Ereignis empfangen"
                                    );
                                    dispatcher.dispatch(event, &mut session)
                                }
                                Err(e) => {
                                    tracing::debug!(
                                        connection_id = %connection_id,
                                        fehler = %e,
                                        "Frame nicht dekodierbar"
                                    );
                                    self.state.metriken.protokollfehler("INVALID_REQUEST");
                                    Some(ServerEvent::error(ErrorCode::InvalidRequest, e.to_string()))
                                }
                            };
                            if let Some(antwort) = antwort {
                                self.state.broadcaster.an_verbindung_senden(&connection_id, antwort);
                            }
                        }
                        Some(Ok(Message::Binary(_))) => {
                            self.state.metriken.protokollfehler("INVALID_REQUEST");
                            self.state.broadcaster.an_verbindung_senden(
                                &connection_id,
                                ServerEvent::error(
                                    ErrorCode::InvalidRequest,
                                    "Nur Textframes werden unterstuetzt",
                                ),
                            );
                        }
                        // Ping/Pong beantwortet axum selbst
                        Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!(connection_id = %connection_id, "Verbindung vom Client getrennt");
                            break;
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                connection_id = %connection_id,
                                fehler = %e,
                                "WebSocket-Lesefehler"
                            );
                            break;
                        }
                    }
                }

                // Ausgehendes Ereignis aus der Zustellschicht
                ausgehend = sende_rx.recv() => {
                    let Some(event) = ausgehend else {
                        // Queue geschlossen: durch neueren Login verdraengt
                        tracing::info!(connection_id = %connection_id, "Send-Queue geschlossen – Verbindung wird beendet");
                        let _ = ws_tx.send(verdraengt_close_frame()).await;
                        break;
                    };
                    let text = match codec.encode(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(
                                connection_id = %connection_id,
                                fehler = %e,
                                "Ereignis nicht kodierbar"
                            );
                            continue;
                        }
                    };
                    if let Err(e) = ws_tx.send(Message::Text(text)).await {
                        tracing::warn!(
                            connection_id = %connection_id,
                            fehler = %e,
                            "Senden fehlgeschlagen"
                        );
                        break;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(connection_id = %connection_id, "Shutdown-Signal – Verbindung wird getrennt");
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }

        // Cleanup beim Verbindungsende
        session.trennen();
        self.state.metriken.connected_clients.dec();

        tracing::info!(connection_id = %connection_id, "Verbindungs-Task beendet");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_frame_nennt_verdraengung() {
        match verdraengt_close_frame() {
            Message::Close(Some(frame)) => {
                assert_eq!(frame.code, CLOSE_SESSION_REPLACED);
                assert_eq!(frame.reason, "SESSION_REPLACED");
            }
            andere => panic!("Close-Frame erwartet, erhalten: {andere:?}"),
        }
    }
}
