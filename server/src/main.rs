//! Kanalfunk Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Server.

use anyhow::Result;
use kanalfunk_observability::{logging_initialisieren, mit_vorlaeufigem_logging};
use kanalfunk_server::{config::ServerConfig, Server};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("KANALFUNK_CONFIG").unwrap_or_else(|_| "config.toml".into());

    // Warnungen beim Laden erscheinen bereits vor dem konfigurierten Logging
    let config = mit_vorlaeufigem_logging(|| ServerConfig::laden(&config_pfad))?;

    logging_initialisieren(&config.logging.level, &config.logging.format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Kanalfunk Server wird initialisiert"
    );

    Server::neu(config).starten().await
}
