//! Channel-Registry – Statische Channels und ihre Mitglieder
//!
//! Die Menge der Channels steht beim Start fest; zur Laufzeit aendert sich
//! nur die Mitgliedschaft. Beide Indizes (Channel -> Mitglieder und
//! Verbindung -> Channel) liegen unter einer gemeinsamen Sperre, damit ein
//! Wechsel nie zwei oder null Mitgliedschaften sichtbar macht.

use std::collections::{HashMap, HashSet};

use kanalfunk_core::types::{Channel, ChannelId, ConnectionId};
use parking_lot::RwLock;

use crate::error::{RelayError, RelayResult};

/// Registry aller konfigurierten Channels
#[derive(Debug)]
pub struct ChannelRegistry {
    /// Konfigurierte Channels in Konfigurationsreihenfolge
    kanaele: Vec<Channel>,
    inner: RwLock<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    /// Enthaelt fuer jeden konfigurierten Channel einen (ggf. leeren) Eintrag
    mitglieder: HashMap<ChannelId, HashSet<ConnectionId>>,
    zuordnung: HashMap<ConnectionId, ChannelId>,
}

impl RegistryInner {
    fn aus_mitglied_entfernen(&mut self, channel_id: &ChannelId, handle: &ConnectionId) {
        if let Some(menge) = self.mitglieder.get_mut(channel_id) {
            let entfernt = menge.remove(handle);
            debug_assert!(entfernt, "Zuordnung ohne Mitgliedschaft fuer {handle}");
        }
    }

    #[cfg(debug_assertions)]
    fn konsistent(&self) -> bool {
        let summe: usize = self.mitglieder.values().map(HashSet::len).sum();
        summe == self.zuordnung.len()
            && self.zuordnung.iter().all(|(handle, channel_id)| {
                self.mitglieder
                    .get(channel_id)
                    .is_some_and(|menge| menge.contains(handle))
            })
    }
}

impl ChannelRegistry {
    /// Erstellt die Registry aus der Channel-Liste
    ///
    /// Doppelte Kennungen werden bei der Konfigurationspruefung abgelehnt;
    /// hier gewinnt bei Duplikaten der erste Eintrag.
    pub fn neu(kanaele: Vec<Channel>) -> Self {
        let mut gesehen = HashSet::new();
        let kanaele: Vec<Channel> = kanaele
            .into_iter()
            .filter(|k| gesehen.insert(k.id.clone()))
            .collect();

        let inner = RegistryInner {
            mitglieder: kanaele
                .iter()
                .map(|k| (k.id.clone(), HashSet::new()))
                .collect(),
            zuordnung: HashMap::new(),
        };

        Self {
            kanaele,
            inner: RwLock::new(inner),
        }
    }

    /// Alle Channels in Konfigurationsreihenfolge
    pub fn kanaele(&self) -> &[Channel] {
        &self.kanaele
    }

    /// Prueft ob ein Channel konfiguriert ist
    pub fn enthaelt(&self, channel_id: &ChannelId) -> bool {
        self.kanaele.iter().any(|k| &k.id == channel_id)
    }

    /// Verschiebt eine Verbindung atomar in den Ziel-Channel
    ///
    /// Gibt den vorherigen Channel zurueck. Bei unbekanntem Ziel bleibt die
    /// Mitgliedschaft unveraendert.
    pub fn beitreten(
        &self,
        channel_id: &ChannelId,
        handle: ConnectionId,
    ) -> RelayResult<Option<ChannelId>> {
        if !self.enthaelt(channel_id) {
            return Err(RelayError::UnbekannterChannel(channel_id.clone()));
        }

        let mut inner = self.inner.write();
        let vorher = inner.zuordnung.insert(handle, channel_id.clone());
        if let Some(alt) = &vorher {
            inner.aus_mitglied_entfernen(alt, &handle);
        }
        if let Some(menge) = inner.mitglieder.get_mut(channel_id) {
            menge.insert(handle);
        }

        #[cfg(debug_assertions)]
        debug_assert!(inner.konsistent(), "Registry inkonsistent nach Beitritt");

        Ok(vorher)
    }

    /// Entfernt eine Verbindung aus ihrem Channel
    ///
    /// Gibt den verlassenen Channel zurueck; No-op ohne Mitgliedschaft.
    pub fn alle_verlassen(&self, handle: ConnectionId) -> Option<ChannelId> {
        let mut inner = self.inner.write();
        let alt = inner.zuordnung.remove(&handle)?;
        inner.aus_mitglied_entfernen(&alt, &handle);

        #[cfg(debug_assertions)]
        debug_assert!(inner.konsistent(), "Registry inkonsistent nach Verlassen");

        Some(alt)
    }

    /// Schnappschuss der Mitglieder eines Channels
    pub fn mitglieder(&self, channel_id: &ChannelId) -> Vec<ConnectionId> {
        self.inner
            .read()
            .mitglieder
            .get(channel_id)
            .map(|menge| menge.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Aktueller Channel einer Verbindung
    pub fn channel_von(&self, handle: ConnectionId) -> Option<ChannelId> {
        self.inner.read().zuordnung.get(&handle).cloned()
    }

    /// Anzahl der Mitglieder eines Channels
    pub fn mitglieder_anzahl(&self, channel_id: &ChannelId) -> usize {
        self.inner
            .read()
            .mitglieder
            .get(channel_id)
            .map(HashSet::len)
            .unwrap_or(0)
    }
}
