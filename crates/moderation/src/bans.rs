//! Bannliste fuer Kanalfunk
//!
//! Haelt gesperrte Benutzernamen im Speicher und spiegelt sie optional in
//! eine JSON-Datei (Array von Strings). Die Pruefung `ist_gebannt` ist
//! synchron und blockiert nie auf IO; Schreibzugriffe auf die Datei laufen
//! ausschliesslich in `bannen`/`entbannen`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::{ModerationError, ModerationResult};

/// Synchrones Mitgliedschafts-Praedikat fuer gesperrte Benutzer
pub trait BanPredicate: Send + Sync + 'static {
    /// Prueft ob der Benutzername gesperrt ist
    fn ist_gebannt(&self, username: &str) -> bool;
}

impl<F> BanPredicate for F
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    fn ist_gebannt(&self, username: &str) -> bool {
        self(username)
    }
}

/// Bannliste – In-Memory-Menge mit optionaler Datei-Persistenz
pub struct BanList {
    eintraege: RwLock<BTreeSet<String>>,
    /// Zieldatei (None = nur im Speicher)
    pfad: Option<PathBuf>,
    /// Serialisiert Dateischreibvorgaenge, damit kein aelterer Stand gewinnt
    schreib_sperre: tokio::sync::Mutex<()>,
}

impl BanList {
    /// Erstellt eine leere Bannliste ohne Persistenz
    pub fn in_memory() -> Self {
        Self {
            eintraege: RwLock::new(BTreeSet::new()),
            pfad: None,
            schreib_sperre: tokio::sync::Mutex::new(()),
        }
    }

    /// Laedt die Bannliste aus einer JSON-Datei
    ///
    /// Existiert die Datei nicht, startet die Liste leer; die Datei wird
    /// beim ersten Bann angelegt.
    pub async fn laden(pfad: impl AsRef<Path>) -> ModerationResult<Self> {
        let pfad = pfad.as_ref().to_path_buf();
        let eintraege: BTreeSet<String> = match tokio::fs::read(&pfad).await {
            Ok(inhalt) => serde_json::from_slice::<Vec<String>>(&inhalt)?
                .into_iter()
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(pfad = %pfad.display(), "Keine Bannliste gefunden, starte leer");
                BTreeSet::new()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(pfad = %pfad.display(), anzahl = eintraege.len(), "Bannliste geladen");

        Ok(Self {
            eintraege: RwLock::new(eintraege),
            pfad: Some(pfad),
            schreib_sperre: tokio::sync::Mutex::new(()),
        })
    }

    /// Sperrt einen Benutzer
    ///
    /// Gibt `true` zurueck wenn der Benutzer neu gesperrt wurde. Schlaegt das
    /// Speichern fehl, bleibt die Liste unveraendert.
    pub async fn bannen(&self, username: &str) -> ModerationResult<bool> {
        let username = benutzername_pruefen(username)?;
        let _schreiben = self.schreib_sperre.lock().await;

        let mut neuer_stand = self.eintraege.read().clone();
        if !neuer_stand.insert(username.to_string()) {
            return Ok(false);
        }
        self.uebernehmen(neuer_stand).await?;
        tracing::info!(username = %username, "Benutzer gebannt");
        Ok(true)
    }

    /// Hebt die Sperre eines Benutzers auf
    ///
    /// Gibt `true` zurueck wenn der Benutzer gesperrt war. Schlaegt das
    /// Speichern fehl, bleibt die Sperre bestehen.
    pub async fn entbannen(&self, username: &str) -> ModerationResult<bool> {
        let username = benutzername_pruefen(username)?;
        let _schreiben = self.schreib_sperre.lock().await;

        let mut neuer_stand = self.eintraege.read().clone();
        if !neuer_stand.remove(username) {
            return Ok(false);
        }
        self.uebernehmen(neuer_stand).await?;
        tracing::info!(username = %username, "Benutzer entbannt");
        Ok(true)
    }

    /// Gibt alle gesperrten Benutzernamen sortiert zurueck
    pub fn alle(&self) -> Vec<String> {
        self.eintraege.read().iter().cloned().collect()
    }

    /// Anzahl der gesperrten Benutzer
    pub fn anzahl(&self) -> usize {
        self.eintraege.read().len()
    }

    /// Schreibt `neuer_stand` in die Datei und setzt ihn erst danach in Kraft
    ///
    /// Aufrufer haelt `schreib_sperre`.
    async fn uebernehmen(&self, neuer_stand: BTreeSet<String>) -> ModerationResult<()> {
        if let Some(pfad) = &self.pfad {
            let json = serde_json::to_vec_pretty(&neuer_stand)?;

            if let Some(verzeichnis) = pfad.parent() {
                if !verzeichnis.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(verzeichnis).await?;
                }
            }
            if let Err(e) = tokio::fs::write(pfad, json).await {
                tracing::error!(pfad = %pfad.display(), fehler = %e, "Bannliste nicht gespeichert");
                return Err(e.into());
            }

            tracing::debug!(pfad = %pfad.display(), anzahl = neuer_stand.len(), "Bannliste gespeichert");
        }

        *self.eintraege.write() = neuer_stand;
        Ok(())
    }
}

impl Default for BanList {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl BanPredicate for BanList {
    fn ist_gebannt(&self, username: &str) -> bool {
        self.eintraege.read().contains(username)
    }
}

fn benutzername_pruefen(username: &str) -> ModerationResult<&str> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ModerationError::UngueltigerBenutzername(
            "Benutzername darf nicht leer sein".into(),
        ));
    }
    Ok(username)
}
