//! Benutzerverzeichnis – Benutzername -> Verbindungs-Handle
//!
//! Hoechstens ein Eintrag pro Benutzername. Entfernt wird immer ueber das
//! Handle, damit das Trennen einer veralteten Verbindung nie den Eintrag
//! eines neueren Besitzers loescht.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use kanalfunk_core::types::ConnectionId;

/// Verzeichnis aller angemeldeten Benutzernamen
///
/// Operationen auf denselben Benutzernamen sind ueber die Shard-Sperren der
/// DashMap serialisiert.
#[derive(Debug, Default)]
pub struct Directory {
    eintraege: DashMap<String, ConnectionId>,
}

impl Directory {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Traegt einen Benutzernamen ein oder ueberschreibt ihn
    ///
    /// Gibt das zuvor eingetragene Handle zurueck (falls vorhanden).
    pub fn registrieren(&self, username: &str, handle: ConnectionId) -> Option<ConnectionId> {
        let vorher = self.eintraege.insert(username.to_string(), handle);
        tracing::debug!(username = %username, connection_id = %handle, "Benutzer eingetragen");
        vorher
    }

    /// Traegt einen Benutzernamen nur ein wenn er frei ist
    ///
    /// Ist er bereits von einem anderen Handle belegt, wird dieses als Fehler
    /// zurueckgegeben. Ein erneutes Eintragen desselben Handles ist erlaubt.
    pub fn registrieren_falls_frei(
        &self,
        username: &str,
        handle: ConnectionId,
    ) -> Result<(), ConnectionId> {
        match self.eintraege.entry(username.to_string()) {
            Entry::Occupied(eintrag) if *eintrag.get() != handle => Err(*eintrag.get()),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(frei) => {
                frei.insert(handle);
                tracing::debug!(username = %username, connection_id = %handle, "Benutzer eingetragen");
                Ok(())
            }
        }
    }

    /// Sucht das Handle zu einem Benutzernamen
    pub fn nachschlagen(&self, username: &str) -> Option<ConnectionId> {
        self.eintraege.get(username).map(|eintrag| *eintrag.value())
    }

    /// Entfernt den Eintrag dessen Wert dem Handle entspricht
    ///
    /// Gibt den entfernten Benutzernamen zurueck; kein Fehler wenn es keinen
    /// solchen Eintrag gibt.
    pub fn entfernen(&self, handle: ConnectionId) -> Option<String> {
        let username = self
            .eintraege
            .iter()
            .find(|eintrag| *eintrag.value() == handle)
            .map(|eintrag| eintrag.key().clone())?;

        // Zwischen Suche und Entfernen kann ein neuerer Login den Namen uebernommen haben
        let (username, _) = self
            .eintraege
            .remove_if(&username, |_, wert| *wert == handle)?;
        tracing::debug!(username = %username, connection_id = %handle, "Benutzer ausgetragen");
        Some(username)
    }

    /// Anzahl der eingetragenen Benutzernamen
    pub fn anzahl(&self) -> usize {
        self.eintraege.len()
    }
}
