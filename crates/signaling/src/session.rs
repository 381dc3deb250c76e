//! Client-Session – Zustandsmaschine einer einzelnen Verbindung
//!
//! ```text
//! NichtAuthentifiziert --login--> Authentifiziert(channel)
//!          |                          |   ^
//!          |                          +---+ join
//!          v                          v
//!      Geschlossen <-------------- trennen
//! ```
//!
//! Nach dem Login ist die Verbindung immer in genau einem Channel.

use kanalfunk_core::types::{ChannelId, ConnectionId};
use kanalfunk_moderation::{BanPredicate, TextFilter};
use std::sync::Arc;

use crate::error::{RelayError, RelayResult};
use crate::handlers::chat_handler::Absender;
use crate::handlers::{auth_handler, channel_handler};
use crate::server_state::RelayState;

/// Zustand einer Verbindung
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionZustand {
    NichtAuthentifiziert,
    Authentifiziert {
        username: String,
        channel_id: ChannelId,
    },
    Geschlossen,
}

/// Session einer Verbindung
///
/// Gehoert exklusiv dem Verbindungs-Task; Ereignisse einer Verbindung
/// werden daher strikt nacheinander verarbeitet.
pub struct ClientSession<B: BanPredicate, F: TextFilter> {
    connection_id: ConnectionId,
    zustand: SessionZustand,
    state: Arc<RelayState<B, F>>,
}

impl<B: BanPredicate, F: TextFilter> ClientSession<B, F> {
    pub fn neu(state: Arc<RelayState<B, F>>, connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            zustand: SessionZustand::NichtAuthentifiziert,
            state,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn zustand(&self) -> &SessionZustand {
        &self.zustand
    }

    pub fn username(&self) -> Option<&str> {
        match &self.zustand {
            SessionZustand::Authentifiziert { username, .. } => Some(username),
            _ => None,
        }
    }

    pub fn channel(&self) -> Option<&ChannelId> {
        match &self.zustand {
            SessionZustand::Authentifiziert { channel_id, .. } => Some(channel_id),
            _ => None,
        }
    }

    /// Prueft ob die Session von einem neueren Login verdraengt wurde
    ///
    /// Erkennbar daran, dass die Send-Queue nicht mehr registriert ist.
    pub fn ist_verdraengt(&self) -> bool {
        matches!(self.zustand, SessionZustand::Authentifiziert { .. })
            && !self.state.broadcaster.ist_registriert(&self.connection_id)
    }

    /// Meldet die Session unter einem Benutzernamen an
    pub fn login(&mut self, username: &str) -> RelayResult<()> {
        match self.zustand {
            SessionZustand::NichtAuthentifiziert => {}
            SessionZustand::Authentifiziert { .. } => return Err(RelayError::BereitsAngemeldet),
            SessionZustand::Geschlossen => return Err(RelayError::VerbindungGeschlossen),
        }

        let (username, channel_id) =
            auth_handler::handle_login(username, self.connection_id, &self.state)?;
        self.zustand = SessionZustand::Authentifiziert {
            username,
            channel_id,
        };
        Ok(())
    }

    /// Wechselt in einen anderen Channel
    ///
    /// Bei unbekanntem Ziel bleibt der aktuelle Channel erhalten.
    pub fn kanal_wechseln(&mut self, ziel: ChannelId) -> RelayResult<()> {
        let aktuell = match &mut self.zustand {
            SessionZustand::Authentifiziert { channel_id, .. } => channel_id,
            SessionZustand::NichtAuthentifiziert => return Err(RelayError::NichtAngemeldet),
            SessionZustand::Geschlossen => return Err(RelayError::VerbindungGeschlossen),
        };

        channel_handler::handle_join(&ziel, self.connection_id, &self.state)?;
        *aktuell = ziel;
        Ok(())
    }

    /// Angemeldeter Absender fuer Inhalts-Ereignisse
    pub fn absender(&self) -> RelayResult<Absender> {
        match &self.zustand {
            SessionZustand::Authentifiziert { username, .. } => Ok(Absender {
                connection_id: self.connection_id,
                username: username.clone(),
            }),
            SessionZustand::NichtAuthentifiziert => Err(RelayError::NichtAngemeldet),
            SessionZustand::Geschlossen => Err(RelayError::VerbindungGeschlossen),
        }
    }

    /// Bestimmt den Ziel-Channel eines Inhalts-Ereignisses
    ///
    /// Ohne Angabe gilt der aktuelle Channel. Eine Angabe muss konfiguriert
    /// sein und dem aktuellen Channel entsprechen.
    pub fn ziel_channel(&self, angefragt: Option<ChannelId>) -> RelayResult<ChannelId> {
        let aktuell = match &self.zustand {
            SessionZustand::Authentifiziert { channel_id, .. } => channel_id,
            SessionZustand::NichtAuthentifiziert => return Err(RelayError::NichtAngemeldet),
            SessionZustand::Geschlossen => return Err(RelayError::VerbindungGeschlossen),
        };

        match angefragt {
            None => Ok(aktuell.clone()),
            Some(id) if !self.state.registry.enthaelt(&id) => {
                Err(RelayError::UnbekannterChannel(id))
            }
            Some(id) if &id != aktuell => Err(RelayError::NichtImChannel {
                angefragt: id,
                aktuell: aktuell.clone(),
            }),
            Some(id) => Ok(id),
        }
    }

    /// Trennt die Session und raeumt Verzeichnis, Registry und Queue auf
    ///
    /// Idempotent.
    pub fn trennen(&mut self) {
        let vorher = std::mem::replace(&mut self.zustand, SessionZustand::Geschlossen);
        match vorher {
            SessionZustand::Geschlossen => return,
            SessionZustand::Authentifiziert { .. } => {
                self.state.metriken.authenticated_sessions.dec();
            }
            SessionZustand::NichtAuthentifiziert => {}
        }
        auth_handler::handle_disconnect(self.connection_id, &self.state);
    }
}

impl<B: BanPredicate, F: TextFilter> Drop for ClientSession<B, F> {
    fn drop(&mut self) {
        self.trennen();
    }
}
