//! kanalfunk-server – Bibliotheks-Root
//!
//! Setzt die Subsysteme zu einem HTTP-Server zusammen: WebSocket-Relay,
//! REST-API, Health/Metriken und optional ein statisches Web-Verzeichnis.

pub mod api;
pub mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{http::HeaderValue, Router};
use config::ServerConfig;
use kanalfunk_moderation::{BanList, WortFilter};
use kanalfunk_observability::{
    health_router, metrics_router, request_timing_layer, timing_middleware, HealthState,
    KanalfunkMetrics,
};
use kanalfunk_signaling::{relay_router, RelayState};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
};

use crate::api::{api_router, ApiState, Relay};

/// Fertig verdrahtete Anwendung
pub struct App {
    pub router: Router,
    pub relay: Arc<Relay>,
    pub health: HealthState,
}

/// Baut Relay-State und Router aus der Konfiguration
pub async fn app_bauen(config: &ServerConfig) -> Result<App> {
    config.validieren()?;

    let bans = BanList::laden(&config.moderation.bann_datei)
        .await
        .with_context(|| format!("Bannliste {} nicht lesbar", config.moderation.bann_datei))?;
    let filter = WortFilter::standard().hinzufuegen(config.moderation.zusatz_woerter.iter());
    let metriken = KanalfunkMetrics::neu()?;

    let relay = RelayState::neu(
        config.relay_config(),
        config.kanaele(),
        Arc::new(bans),
        Arc::new(filter),
        metriken.clone(),
    )?;
    let health = HealthState::neu(metriken.clone());

    let mut router = Router::new()
        .merge(relay_router(Arc::clone(&relay)))
        .merge(api_router(ApiState::neu(
            Arc::clone(&relay),
            config.moderation.admin_token.clone(),
        )));

    if config.observability.aktiviert {
        router = router
            .merge(health_router(health.clone()))
            .merge(metrics_router(metriken.clone()));
    }

    if let Some(verzeichnis) = &config.netzwerk.statisches_verzeichnis {
        router = router.fallback_service(ServeDir::new(verzeichnis));
    }

    let router = router
        .layer(axum::middleware::from_fn_with_state(
            metriken,
            timing_middleware,
        ))
        .layer(request_timing_layer())
        .layer(cors_layer(&config.netzwerk.cors_origins)?);

    Ok(App {
        router,
        relay,
        health,
    })
}

/// Leere Liste = jede Herkunft erlaubt
fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    let erlaubt = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Ungueltiger CORS-Origin: {o}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(erlaubt))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any))
}

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den HTTP-Listener und laeuft bis zum Shutdown-Signal
    ///
    /// Beim Shutdown meldet `/health` sofort 503, danach werden alle
    /// Verbindungs-Tasks beendet.
    pub async fn starten(self) -> Result<()> {
        let app = app_bauen(&self.config).await?;
        let adresse = self.config.bind_adresse();

        let listener = tokio::net::TcpListener::bind(&adresse)
            .await
            .with_context(|| format!("Bind auf {adresse} fehlgeschlagen"))?;

        tracing::info!(
            server_name = %self.config.server.name,
            adresse = %adresse,
            kanaele = app.relay.registry.kanaele().len(),
            relogin = ?app.relay.config.relogin_politik,
            "Server laeuft"
        );

        let relay = Arc::clone(&app.relay);
        let health = app.health.clone();
        axum::serve(
            listener,
            app.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            health.herunterfahren_markieren();
            relay.herunterfahren();
        })
        .await
        .context("HTTP-Server abgebrochen")?;

        tracing::info!("Server beendet");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown-Signal empfangen"),
        Err(e) => tracing::error!(fehler = %e, "Signal-Handler konnte nicht installiert werden"),
    }
}
