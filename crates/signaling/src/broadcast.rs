//! Event-Broadcaster – Zustellschicht fuer alle offenen Verbindungen
//!
//! Jede Verbindung besitzt eine begrenzte Send-Queue. Der Broadcaster reiht
//! Ereignisse nicht-blockierend ein; der Verbindungs-Task leert die Queue
//! und schreibt auf den WebSocket.
//!
//! Empfaengermengen kommen immer als Schnappschuss aus der Registry bzw.
//! dem Verzeichnis. Zugestellt wird erst nach dem Freigeben dieser Sperren.

use dashmap::DashMap;
use kanalfunk_core::types::ConnectionId;
use kanalfunk_protocol::ServerEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer Verbindung
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub connection_id: ConnectionId,
    pub tx: mpsc::Sender<ServerEvent>,
}

impl ClientSender {
    /// Sendet ein Ereignis nicht-blockierend an die Verbindung
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, event: ServerEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(
                    connection_id = %self.connection_id,
                    event = event.name(),
                    "Send-Queue voll – Ereignis verworfen"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    connection_id = %self.connection_id,
                    "Send-Queue geschlossen (Verbindung getrennt)"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentrale Zustellschicht
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<DashMap<ConnectionId, ClientSender>>,
    queue_groesse: usize,
}

impl EventBroadcaster {
    /// Erstellt einen Broadcaster mit der angegebenen Queue-Groesse pro Verbindung
    pub fn neu(queue_groesse: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            queue_groesse: queue_groesse.max(1),
        }
    }

    /// Registriert eine Verbindung und gibt ihre Empfangs-Queue zurueck
    pub fn client_registrieren(&self, connection_id: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(self.queue_groesse);
        self.inner
            .insert(connection_id, ClientSender { connection_id, tx });
        tracing::debug!(connection_id = %connection_id, "Verbindung im Broadcaster registriert");
        rx
    }

    /// Entfernt eine Verbindung
    ///
    /// Der Sender wird verworfen; der Verbindungs-Task sieht danach nach dem
    /// Leeren der Queue ein `None` und beendet sich.
    pub fn client_entfernen(&self, connection_id: &ConnectionId) -> bool {
        let entfernt = self.inner.remove(connection_id).is_some();
        if entfernt {
            tracing::debug!(connection_id = %connection_id, "Verbindung aus Broadcaster entfernt");
        }
        entfernt
    }

    /// Sendet ein Ereignis an eine einzelne Verbindung
    pub fn an_verbindung_senden(&self, connection_id: &ConnectionId, event: ServerEvent) -> bool {
        match self.inner.get(connection_id) {
            Some(sender) => sender.senden(event),
            None => {
                tracing::debug!(connection_id = %connection_id, "Senden an unbekannte Verbindung");
                false
            }
        }
    }

    /// Sendet ein Ereignis an eine Empfaengermenge
    ///
    /// `ausser` wird uebersprungen. Gibt die Anzahl der eingereihten
    /// Zustellungen zurueck.
    pub fn an_verbindungen_senden(
        &self,
        empfaenger: &[ConnectionId],
        ausser: Option<&ConnectionId>,
        event: &ServerEvent,
    ) -> usize {
        empfaenger
            .iter()
            .filter(|id| Some(*id) != ausser)
            .filter(|id| {
                self.inner
                    .get(*id)
                    .is_some_and(|sender| sender.senden(event.clone()))
            })
            .count()
    }

    /// Anzahl der registrierten Verbindungen
    pub fn client_anzahl(&self) -> usize {
        self.inner.len()
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn ist_registriert(&self, connection_id: &ConnectionId) -> bool {
        self.inner.contains_key(connection_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use kanalfunk_core::types::ChannelId;

    fn test_event(id: &str) -> ServerEvent {
        ServerEvent::Joined(ChannelId::from(id))
    }

    #[tokio::test]
    async fn registrieren_und_senden() {
        let broadcaster = EventBroadcaster::neu(8);
        let id = ConnectionId::new();

        let mut rx = broadcaster.client_registrieren(id);
        assert!(broadcaster.ist_registriert(&id));
        assert!(broadcaster.an_verbindung_senden(&id, test_event("general")));

        let empfangen = rx.try_recv().expect("Ereignis muss vorhanden sein");
        assert_eq!(empfangen, test_event("general"));
    }

    #[tokio::test]
    async fn an_verbindungen_mit_ausnahme() {
        let broadcaster = EventBroadcaster::neu(8);
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let c = ConnectionId::new(); // nicht in der Empfaengermenge

        let mut rx_a = broadcaster.client_registrieren(a);
        let mut rx_b = broadcaster.client_registrieren(b);
        let mut rx_c = broadcaster.client_registrieren(c);

        let gesendet = broadcaster.an_verbindungen_senden(&[a, b], Some(&a), &test_event("x"));
        assert_eq!(gesendet, 1);

        assert!(rx_a.try_recv().is_err(), "Ausnahme darf nichts empfangen");
        assert!(rx_b.try_recv().is_ok());
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn volle_queue_verwirft_ohne_blockieren() {
        let broadcaster = EventBroadcaster::neu(2);
        let id = ConnectionId::new();
        let mut rx = broadcaster.client_registrieren(id);

        assert!(broadcaster.an_verbindung_senden(&id, test_event("1")));
        assert!(broadcaster.an_verbindung_senden(&id, test_event("2")));
        assert!(!broadcaster.an_verbindung_senden(&id, test_event("3")));

        assert_eq!(rx.try_recv().unwrap(), test_event("1"));
        assert_eq!(rx.try_recv().unwrap(), test_event("2"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn entfernen_schliesst_queue_nach_dem_leeren() {
        let broadcaster = EventBroadcaster::neu(8);
        let id = ConnectionId::new();
        let mut rx = broadcaster.client_registrieren(id);

        broadcaster.an_verbindung_senden(&id, test_event("letztes"));
        assert!(broadcaster.client_entfernen(&id));
        assert!(!broadcaster.client_entfernen(&id));

        assert_eq!(rx.recv().await, Some(test_event("letztes")));
        assert_eq!(rx.recv().await, None);
        assert!(!broadcaster.an_verbindung_senden(&id, test_event("zu spaet")));
    }

    #[tokio::test]
    async fn geschlossener_empfaenger_ist_harmlos() {
        let broadcaster = EventBroadcaster::neu(8);
        let id = ConnectionId::new();
        let rx = broadcaster.client_registrieren(id);
        drop(rx);

        assert_eq!(
            broadcaster.an_verbindungen_senden(&[id], None, &test_event("x")),
            0
        );
    }
}
