//! Prometheus-kompatible Metriken fuer Kanalfunk
//!
//! Registrierte Metriken:
//! - `kanalfunk_connected_clients` – Gauge: Offene Echtzeit-Verbindungen
//! - `kanalfunk_authenticated_sessions` – Gauge: Eintraege im Benutzerverzeichnis
//! - `kanalfunk_events_relayed_total` – Counter: Zugestellte Ereignisse (kind)
//! - `kanalfunk_events_dropped_total` – Counter: Still verworfene Ereignisse (reason)
//! - `kanalfunk_protocol_errors_total` – Counter: Abgelehnte Client-Ereignisse (code)
//! - `kanalfunk_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `kanalfunk_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit

use anyhow::Result;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Alle Kanalfunk-Prometheus-Metriken
///
/// Clone teilt die Registry und alle Metrik-Handles.
#[derive(Clone)]
pub struct KanalfunkMetrics {
    pub registry: Arc<Registry>,

    // Relay-Metriken
    pub connected_clients: IntGauge,
    pub authenticated_sessions: IntGauge,
    pub events_relayed_total: IntCounterVec,
    pub events_dropped_total: IntCounterVec,
    pub protocol_errors_total: IntCounterVec,

    // HTTP-Metriken
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl KanalfunkMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        // --- Relay-Metriken ---
        let connected_clients = IntGauge::with_opts(Opts::new(
            "kanalfunk_connected_clients",
            "Anzahl offener Echtzeit-Verbindungen",
        ))?;
        registry.register(Box::new(connected_clients.clone()))?;

        let authenticated_sessions = IntGauge::with_opts(Opts::new(
            "kanalfunk_authenticated_sessions",
            "Anzahl angemeldeter Benutzernamen im Verzeichnis",
        ))?;
        registry.register(Box::new(authenticated_sessions.clone()))?;

        let events_relayed_total = IntCounterVec::new(
            Opts::new(
                "kanalfunk_events_relayed_total",
                "Gesamtanzahl zugestellter Ereignisse pro Empfaenger",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(events_relayed_total.clone()))?;

        let events_dropped_total = IntCounterVec::new(
            Opts::new(
                "kanalfunk_events_dropped_total",
                "Gesamtanzahl still verworfener Ereignisse",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(events_dropped_total.clone()))?;

        let protocol_errors_total = IntCounterVec::new(
            Opts::new(
                "kanalfunk_protocol_errors_total",
                "Gesamtanzahl abgelehnter Client-Ereignisse",
            ),
            &["code"],
        )?;
        registry.register(Box::new(protocol_errors_total.clone()))?;

        // --- HTTP-Metriken ---
        let http_requests_total = IntCounterVec::new(
            Opts::new("kanalfunk_http_requests_total", "Gesamtanzahl HTTP-Anfragen"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "kanalfunk_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connected_clients,
            authenticated_sessions,
            events_relayed_total,
            events_dropped_total,
            protocol_errors_total,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Zaehlt zugestellte Ereignisse einer Art
    pub fn zugestellt(&self, kind: &str, anzahl: usize) {
        self.events_relayed_total
            .with_label_values(&[kind])
            .inc_by(anzahl as u64);
    }

    /// Zaehlt ein still verworfenes Ereignis
    pub fn verworfen(&self, reason: &str) {
        self.events_dropped_total.with_label_values(&[reason]).inc();
    }

    /// Zaehlt ein abgelehntes Client-Ereignis
    pub fn protokollfehler(&self, code: &str) {
        self.protocol_errors_total.with_label_values(&[code]).inc();
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: KanalfunkMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<KanalfunkMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metriken_erstellen_erfolgreich() {
        let metriken = KanalfunkMetrics::neu().unwrap();
        assert!(!metriken.registry.gather().is_empty());
    }

    #[test]
    fn gauge_connected_clients() {
        let metriken = KanalfunkMetrics::neu().unwrap();
        metriken.connected_clients.inc();
        metriken.connected_clients.inc();
        metriken.connected_clients.dec();
        assert_eq!(metriken.connected_clients.get(), 1);
    }

    #[test]
    fn zugestellt_zaehlt_pro_art() {
        let metriken = KanalfunkMetrics::neu().unwrap();
        metriken.zugestellt("message", 3);
        metriken.zugestellt("message", 2);
        metriken.zugestellt("signal", 1);
        assert_eq!(
            metriken
                .events_relayed_total
                .with_label_values(&["message"])
                .get(),
            5
        );
        assert_eq!(
            metriken
                .events_relayed_total
                .with_label_values(&["signal"])
                .get(),
            1
        );
    }

    #[test]
    fn verworfen_und_protokollfehler() {
        let metriken = KanalfunkMetrics::neu().unwrap();
        metriken.verworfen("banned_sender");
        metriken.protokollfehler("UNKNOWN_CHANNEL");
        metriken.protokollfehler("UNKNOWN_CHANNEL");
        assert_eq!(
            metriken
                .events_dropped_total
                .with_label_values(&["banned_sender"])
                .get(),
            1
        );
        assert_eq!(
            metriken
                .protocol_errors_total
                .with_label_values(&["UNKNOWN_CHANNEL"])
                .get(),
            2
        );
    }

    #[test]
    fn metriken_export_prometheus_format() {
        let metriken = KanalfunkMetrics::neu().unwrap();
        metriken.connected_clients.set(5);
        metriken.zugestellt("image", 1);

        let output = metriken.exportieren().unwrap();
        assert!(output.contains("kanalfunk_connected_clients"));
        assert!(output.contains("kanalfunk_events_relayed_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn getrennte_instanzen_teilen_keine_registry() {
        let a = KanalfunkMetrics::neu().unwrap();
        let b = KanalfunkMetrics::neu().unwrap();
        a.connected_clients.set(7);
        assert_eq!(b.connected_clients.get(), 0);
    }
}
