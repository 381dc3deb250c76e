//! Message-Dispatcher – Routet Client-Ereignisse an die Handler
//!
//! ## Zustandspruefung
//! - `login` nur im Zustand `NichtAuthentifiziert`
//! - alle anderen Ereignisse nur im Zustand `Authentifiziert`
//! - im Zustand `Geschlossen` wird alles abgelehnt
//!
//! Abgelehnte Ereignisse liefern ein `error`-Ereignis fuer die ausloesende
//! Verbindung. Erfolgreiche Ereignisse antworten ueber die Zustellschicht.

use kanalfunk_moderation::{BanPredicate, TextFilter};
use kanalfunk_protocol::{ClientEvent, ServerEvent};
use std::sync::Arc;

use crate::error::{RelayError, RelayResult};
use crate::handlers::chat_handler::{self, Zustellung};
use crate::handlers::signal_handler;
use crate::server_state::RelayState;
use crate::session::ClientSession;

/// Zentraler Message-Dispatcher
pub struct MessageDispatcher<B: BanPredicate, F: TextFilter> {
    state: Arc<RelayState<B, F>>,
}

impl<B: BanPredicate, F: TextFilter> MessageDispatcher<B, F> {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<RelayState<B, F>>) -> Self {
        Self { state }
    }

    /// Verarbeitet ein eingehendes Ereignis
    ///
    /// Gibt `Some(error)` zurueck wenn das Ereignis abgelehnt wurde.
    pub fn dispatch(
        &self,
        event: ClientEvent,
        session: &mut ClientSession<B, F>,
    ) -> Option<ServerEvent> {
        let name = event.name();

        let ergebnis = if session.ist_verdraengt() {
            session.trennen();
            Err(RelayError::VerbindungGeschlossen)
        } else {
            self.routen(event, session)
        };

        match ergebnis {
            Ok(()) => None,
            Err(fehler) => {
                self.state.metriken.protokollfehler(fehler.metrik_label());
                tracing::debug!(
                    connection_id = %session.connection_id(),
                    event = name,
                    fehler = %fehler,
                    "Ereignis abgelehnt"
                );
                Some(fehler.als_event())
            }
        }
    }

    fn routen(&self, event: ClientEvent, session: &mut ClientSession<B, F>) -> RelayResult<()> {
        match event {
            ClientEvent::Login(req) => session.login(&req.username),

            ClientEvent::Join(ziel) => session.kanal_wechseln(ziel),

            ClientEvent::Message(req) => {
                let absender = session.absender()?;
                let channel_id = session.ziel_channel(req.channel.clone())?;
                let ergebnis =
                    chat_handler::handle_message(req, &absender, &channel_id, &self.state);
                Self::ergebnis_loggen("message", ergebnis);
                Ok(())
            }

            ClientEvent::Image(req) => {
                let absender = session.absender()?;
                let channel_id = session.ziel_channel(req.channel.clone())?;
                let ergebnis = chat_handler::handle_image(req, &absender, &channel_id, &self.state);
                Self::ergebnis_loggen("image", ergebnis);
                Ok(())
            }

            ClientEvent::Dm(req) => {
                let absender = session.absender()?;
                let ergebnis = chat_handler::handle_dm(req, &absender, &self.state);
                Self::ergebnis_loggen("dm", ergebnis);
                Ok(())
            }

            ClientEvent::Signal(req) => {
                let absender = session.absender()?;
                let channel_id = session.ziel_channel(req.channel)?;
                signal_handler::handle_signal(
                    req.data,
                    absender.connection_id,
                    &channel_id,
                    &self.state,
                );
                Ok(())
            }
        }
    }

    fn ergebnis_loggen(art: &'static str, ergebnis: Zustellung) {
        if let Zustellung::Zugestellt { empfaenger: 0 } = ergebnis {
            tracing::trace!(event = art, "Keine Empfaenger");
        }
    }
}
