//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use std::collections::HashSet;

use kanalfunk_core::error::{KanalfunkError, Result};
use kanalfunk_core::types::{standard_kanaele, Channel, ChannelId};
use kanalfunk_observability::logging::log_format_gueltig;
use kanalfunk_protocol::wire::DEFAULT_MAX_FRAME_SIZE;
use kanalfunk_signaling::{RelayConfig, ReloginPolitik};
use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Relay-Verhalten
    pub relay: RelayEinstellungen,
    /// Statische Channel-Liste (Reihenfolge = Anzeigereihenfolge)
    pub kanaele: Vec<KanalEinstellung>,
    /// Bannliste, Wortfilter, Admin-Zugang
    pub moderation: ModerationEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerEinstellungen::default(),
            netzwerk: NetzwerkEinstellungen::default(),
            logging: LoggingEinstellungen::default(),
            relay: RelayEinstellungen::default(),
            kanaele: standard_kanaele()
                .into_iter()
                .map(|k| KanalEinstellung {
                    id: k.id.0,
                    name: k.name,
                })
                .collect(),
            moderation: ModerationEinstellungen::default(),
            observability: ObservabilityEinstellungen::default(),
        }
    }
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Echtzeit-Verbindungen
    pub max_verbindungen: usize,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Kanalfunk".into(),
            max_verbindungen: 1024,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer HTTP und WebSocket
    pub bind_adresse: String,
    pub port: u16,
    /// Verzeichnis mit dem Browser-Client (None = nicht ausliefern)
    pub statisches_verzeichnis: Option<String>,
    /// CORS-Origins (leer = alle erlaubt)
    pub cors_origins: Vec<String>,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 3000,
            statisches_verzeichnis: None,
            cors_origins: vec![],
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Filter-Direktive: "trace", "debug", "info", "warn", "error" oder EnvFilter-Syntax
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Relay-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayEinstellungen {
    /// Channel in den jeder Login eintritt
    pub standard_channel: String,
    /// Benutzername mit Admin-Markierung und Zugriff auf Ban/Unban
    pub admin_name: String,
    #[serde(alias = "relogin_policy")]
    pub relogin_politik: ReloginPolitik,
    /// Absender empfaengt eigene Text- und Bildnachrichten
    #[serde(alias = "echo_to_sender")]
    pub echo_an_absender: bool,
    /// Maximale Frame-Groesse in Bytes
    pub max_frame_groesse: usize,
    /// Send-Queue-Groesse pro Verbindung
    pub send_queue_groesse: usize,
}

impl Default for RelayEinstellungen {
    fn default() -> Self {
        Self {
            standard_channel: "general".into(),
            admin_name: "BredXD".into(),
            relogin_politik: ReloginPolitik::default(),
            echo_an_absender: true,
            max_frame_groesse: DEFAULT_MAX_FRAME_SIZE,
            send_queue_groesse: 64,
        }
    }
}

/// Ein konfigurierter Channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanalEinstellung {
    pub id: String,
    pub name: String,
}

/// Moderations-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationEinstellungen {
    /// Pfad der Bannliste (JSON-Array von Benutzernamen)
    pub bann_datei: String,
    /// Optionales Geheimnis fuer Ban/Unban (Header `x-admin-token`)
    pub admin_token: Option<String>,
    /// Zusaetzliche Woerter fuer den Wortfilter
    pub zusatz_woerter: Vec<String>,
}

impl Default for ModerationEinstellungen {
    fn default() -> Self {
        Self {
            bann_datei: "bans.json".into(),
            admin_token: None,
            zusatz_woerter: vec![],
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Stellt `/metrics` und `/health` bereit
    pub aktiviert: bool,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self { aktiviert: true }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft die Konfiguration auf Widersprueche
    pub fn validieren(&self) -> Result<()> {
        if self.kanaele.is_empty() {
            return Err(KanalfunkError::konfiguration(
                "mindestens ein Channel muss konfiguriert sein",
            ));
        }

        let mut ids = HashSet::new();
        for kanal in &self.kanaele {
            if kanal.id.trim().is_empty() {
                return Err(KanalfunkError::konfiguration("Channel-ID darf nicht leer sein"));
            }
            if !ids.insert(kanal.id.as_str()) {
                return Err(KanalfunkError::DoppelterChannel(kanal.id.clone()));
            }
        }

        if !ids.contains(self.relay.standard_channel.as_str()) {
            return Err(KanalfunkError::StandardChannelFehlt(
                self.relay.standard_channel.clone(),
            ));
        }
        if self.relay.max_frame_groesse == 0 || self.relay.send_queue_groesse == 0 {
            return Err(KanalfunkError::konfiguration(
                "max_frame_groesse und send_queue_groesse muessen groesser als 0 sein",
            ));
        }
        if self.relay.admin_name.trim().is_empty() {
            return Err(KanalfunkError::konfiguration("admin_name darf nicht leer sein"));
        }
        if !log_format_gueltig(&self.logging.format) {
            return Err(KanalfunkError::konfiguration(format!(
                "unbekanntes Log-Format '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }

    /// Gibt die vollstaendige Bind-Adresse zurueck
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Channel-Liste fuer die Registry
    pub fn kanaele(&self) -> Vec<Channel> {
        self.kanaele
            .iter()
            .map(|k| Channel::new(k.id.clone(), k.name.clone()))
            .collect()
    }

    /// Relay-Konfiguration fuer den RelayState
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            standard_channel: ChannelId::new(self.relay.standard_channel.clone()),
            admin_name: self.relay.admin_name.clone(),
            relogin_politik: self.relay.relogin_politik,
            echo_an_absender: self.relay.echo_an_absender,
            max_frame_groesse: self.relay.max_frame_groesse,
            send_queue_groesse: self.relay.send_queue_groesse,
            max_verbindungen: self.server.max_verbindungen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert!(cfg.validieren().is_ok());
        assert_eq!(cfg.netzwerk.port, 3000);
        assert_eq!(cfg.relay.admin_name, "BredXD");
        assert_eq!(cfg.kanaele.len(), 4);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn bind_adresse() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_adresse(), "0.0.0.0:3000");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r##"
            [server]
            name = "Mein Relay"

            [netzwerk]
            port = 8080

            [relay]
            relogin_policy = "displace"
            echo_to_sender = false

            [[kanaele]]
            id = "lobby"
            name = "#lobby"

            [[kanaele]]
            id = "general"
            name = "#general"
        "##;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.server.name, "Mein Relay");
        assert_eq!(cfg.netzwerk.port, 8080);
        assert_eq!(cfg.relay.relogin_politik, ReloginPolitik::Verdraengen);
        assert!(!cfg.relay.echo_an_absender);
        assert_eq!(cfg.kanaele.len(), 2);
        assert_eq!(cfg.kanaele[0].id, "lobby");
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.netzwerk.bind_adresse, "0.0.0.0");
        assert_eq!(cfg.relay.standard_channel, "general");
        assert!(cfg.validieren().is_ok());
    }

    #[test]
    fn relay_config_uebernimmt_werte() {
        let mut cfg = ServerConfig::default();
        cfg.server.max_verbindungen = 7;
        cfg.relay.relogin_politik = ReloginPolitik::Ablehnen;

        let relay = cfg.relay_config();
        assert_eq!(relay.max_verbindungen, 7);
        assert_eq!(relay.relogin_politik, ReloginPolitik::Ablehnen);
        assert_eq!(relay.standard_channel.as_str(), "general");
    }

    #[test]
    fn leere_channel_liste_ist_ungueltig() {
        let mut cfg = ServerConfig::default();
        cfg.kanaele.clear();
        assert!(matches!(
            cfg.validieren(),
            Err(KanalfunkError::Konfiguration(_))
        ));
    }

    #[test]
    fn doppelte_channel_id_ist_ungueltig() {
        let mut cfg = ServerConfig::default();
        cfg.kanaele.push(KanalEinstellung {
            id: "random".into(),
            name: "#random2".into(),
        });
        assert!(matches!(
            cfg.validieren(),
            Err(KanalfunkError::DoppelterChannel(ref id)) if id == "random"
        ));
    }

    #[test]
    fn fehlender_standard_channel_ist_ungueltig() {
        let mut cfg = ServerConfig::default();
        cfg.relay.standard_channel = "lobby".into();
        assert!(matches!(
            cfg.validieren(),
            Err(KanalfunkError::StandardChannelFehlt(ref id)) if id == "lobby"
        ));
    }

    #[test]
    fn unbekanntes_log_format_ist_ungueltig() {
        let mut cfg = ServerConfig::default();
        cfg.logging.format = "xml".into();
        assert!(cfg.validieren().is_err());
    }

    #[test]
    fn fehlende_datei_liefert_standardwerte() {
        let dir = tempfile::tempdir().unwrap();
        let pfad = dir.path().join("gibt-es-nicht.toml");
        let cfg = ServerConfig::laden(pfad.to_str().unwrap()).unwrap();
        assert_eq!(cfg.netzwerk.port, 3000);
    }

    #[test]
    fn kaputte_datei_ist_fehler() {
        let dir = tempfile::tempdir().unwrap();
        let pfad = dir.path().join("config.toml");
        std::fs::write(&pfad, "[relay\nkaputt").unwrap();
        assert!(ServerConfig::laden(pfad.to_str().unwrap()).is_err());
    }
}
