//! Gemeinsamer Relay-Zustand
//!
//! Haelt Verzeichnis, Channel-Registry, Zustellschicht und die
//! Moderations-Kollaborateure. Wird als `Arc<RelayState>` zwischen allen
//! Verbindungs-Tasks geteilt.

use kanalfunk_core::types::{Channel, ChannelId};
use kanalfunk_moderation::{BanPredicate, TextFilter};
use kanalfunk_observability::KanalfunkMetrics;
use kanalfunk_protocol::wire::DEFAULT_MAX_FRAME_SIZE;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};

use crate::broadcast::EventBroadcaster;
use crate::directory::Directory;
use crate::error::{RelayError, RelayResult};
use crate::registry::ChannelRegistry;

/// Verhalten bei einem zweiten Login mit bereits vergebenem Benutzernamen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloginPolitik {
    /// Neuester Login uebernimmt die Adressierung, die alte Verbindung bleibt offen
    #[default]
    #[serde(alias = "overwrite")]
    Ueberschreiben,
    /// Zweiter Login wird mit `USERNAME_TAKEN` abgelehnt
    #[serde(alias = "reject")]
    Ablehnen,
    /// Alte Verbindung bekommt `SESSION_REPLACED` und wird geschlossen
    #[serde(alias = "displace")]
    Verdraengen,
}

/// Konfiguration fuer das Relay
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Channel in den jeder Login automatisch eintritt
    pub standard_channel: ChannelId,
    /// Benutzername der im Client als Admin markiert wird
    pub admin_name: String,
    pub relogin_politik: ReloginPolitik,
    /// Absender empfaengt seine eigenen Text- und Bildnachrichten
    pub echo_an_absender: bool,
    /// Maximale Groesse eines eingehenden Frames in Bytes
    pub max_frame_groesse: usize,
    /// Send-Queue-Groesse pro Verbindung
    pub send_queue_groesse: usize,
    /// Maximale Anzahl gleichzeitiger Verbindungen
    pub max_verbindungen: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            standard_channel: ChannelId::from("general"),
            admin_name: "BredXD".to_string(),
            relogin_politik: ReloginPolitik::default(),
            echo_an_absender: true,
            max_frame_groesse: DEFAULT_MAX_FRAME_SIZE,
            send_queue_groesse: 64,
            max_verbindungen: 1024,
        }
    }
}

/// Gemeinsamer Relay-Zustand (thread-safe, Arc-geteilt)
pub struct RelayState<B: BanPredicate, F: TextFilter> {
    pub config: Arc<RelayConfig>,
    pub directory: Directory,
    pub registry: ChannelRegistry,
    pub broadcaster: EventBroadcaster,
    /// Sperr-Praedikat fuer Inhalts-Ereignisse
    pub bans: Arc<B>,
    /// Text-Filter fuer Chat-Nachrichten
    pub filter: Arc<F>,
    pub metriken: KanalfunkMetrics,
    /// Startzeitpunkt des Servers (fuer Uptime-Berechnung)
    pub start_time: Instant,
    shutdown_tx: watch::Sender<bool>,
    /// Ein Permit je offener Verbindung, begrenzt auf `max_verbindungen`
    verbindungs_plaetze: Arc<Semaphore>,
}

impl<B: BanPredicate, F: TextFilter> RelayState<B, F> {
    /// Erstellt einen neuen RelayState
    ///
    /// Schlaegt fehl wenn der Standard-Channel nicht in `kanaele` enthalten ist.
    pub fn neu(
        config: RelayConfig,
        kanaele: Vec<Channel>,
        bans: Arc<B>,
        filter: Arc<F>,
        metriken: KanalfunkMetrics,
    ) -> RelayResult<Arc<Self>> {
        let registry = ChannelRegistry::neu(kanaele);
        if !registry.enthaelt(&config.standard_channel) {
            return Err(RelayError::UnbekannterChannel(
                config.standard_channel.clone(),
            ));
        }

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Arc::new(Self {
            broadcaster: EventBroadcaster::neu(config.send_queue_groesse),
            verbindungs_plaetze: Arc::new(Semaphore::new(config.max_verbindungen)),
            config: Arc::new(config),
            directory: Directory::neu(),
            registry,
            bans,
            filter,
            metriken,
            start_time: Instant::now(),
            shutdown_tx,
        }))
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Prueft ob der Benutzername als Admin markiert wird
    pub fn ist_admin(&self, username: &str) -> bool {
        username == self.config.admin_name
    }

    /// Reserviert einen Verbindungsplatz
    ///
    /// `None` wenn `max_verbindungen` erreicht ist. Der Platz wird mit dem
    /// Permit wieder frei.
    pub fn platz_reservieren(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.verbindungs_plaetze).try_acquire_owned().ok()
    }

    /// Anzahl freier Verbindungsplaetze
    pub fn freie_plaetze(&self) -> usize {
        self.verbindungs_plaetze.available_permits()
    }

    /// Abonniert das Shutdown-Signal fuer einen Verbindungs-Task
    pub fn shutdown_abonnieren(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Signalisiert allen Verbindungs-Tasks das Herunterfahren
    pub fn herunterfahren(&self) {
        self.shutdown_tx.send_replace(true);
        tracing::info!(
            verbindungen = self.broadcaster.client_anzahl(),
            "Relay wird heruntergefahren"
        );
    }
}
