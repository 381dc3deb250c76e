//! Structured Logging Setup via tracing-subscriber
//!
//! Umgebungsvariablen haben Vorrang vor der Konfigurationsdatei:
//! - `KF_LOG_LEVEL`: Filter-Direktive (z.B. `info` oder `kanalfunk_signaling=debug`)
//! - `KF_LOG_FORMAT`: `text` oder `json`

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "KF_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "KF_LOG_FORMAT";

/// Ausgabeformat der Log-Zeilen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Unbekannte Werte fallen auf `Text` zurueck
    pub fn parsen(wert: &str) -> Self {
        match wert.trim() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Initialisiert das Logging-System.
///
/// `level` und `format` stammen aus der Konfiguration; gesetzte
/// Umgebungsvariablen ueberschreiben sie. Ein zweiter Aufruf (z.B. in
/// Tests) ist wirkungslos.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = std::env::var(ENV_LOG_FORMAT)
        .map(|f| LogFormat::parsen(&f))
        .unwrap_or_else(|_| LogFormat::parsen(format));

    let ergebnis = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };

    if ergebnis.is_err() {
        tracing::debug!("Logging war bereits initialisiert");
    }
}

/// Fuehrt `f` mit einem vorlaeufigen Text-Subscriber aus
///
/// Fuer Meldungen vor `logging_initialisieren`, etwa beim Laden der
/// Konfiguration. `KF_LOG_LEVEL` gilt auch hier, sonst `info`.
pub fn mit_vorlaeufigem_logging<T>(f: impl FnOnce() -> T) -> T {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_gueltige_werte() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_level_gueltig(level), "{level} sollte gueltig sein");
        }
    }

    #[test]
    fn log_level_ungueltige_werte() {
        assert!(!log_level_gueltig("verbose"));
        assert!(!log_level_gueltig("INFO")); // Gross-/Kleinschreibung
        assert!(!log_level_gueltig(""));
    }

    #[test]
    fn log_format_validierung() {
        assert!(log_format_gueltig("text"));
        assert!(log_format_gueltig("json"));
        assert!(!log_format_gueltig("xml"));
        assert!(!log_format_gueltig("JSON"));
    }

    #[test]
    fn log_format_parsen() {
        assert_eq!(LogFormat::parsen("json"), LogFormat::Json);
        assert_eq!(LogFormat::parsen(" json "), LogFormat::Json);
        assert_eq!(LogFormat::parsen("text"), LogFormat::Text);
        assert_eq!(LogFormat::parsen("unsinn"), LogFormat::Text);
    }

    #[test]
    fn vorlaeufiges_logging_ist_aktiv() {
        let ergebnis = mit_vorlaeufigem_logging(|| {
            assert!(tracing::enabled!(tracing::Level::WARN));
            tracing::warn!("Meldung vor der eigentlichen Initialisierung");
            42
        });
        assert_eq!(ergebnis, 42);
    }

    #[test]
    fn doppelte_initialisierung_panikt_nicht() {
        logging_initialisieren("info", "text");
        logging_initialisieren("debug", "json");
    }
}
