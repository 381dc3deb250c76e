//! Health-Check-Endpunkt fuer Kanalfunk
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime und offenen Verbindungen

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::KanalfunkMetrics;

/// Status des Health-Checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Server faehrt herunter und nimmt keine neuen Verbindungen mehr an
    Unhealthy,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub connected_clients: i64,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    start_time: Arc<Instant>,
    started_at: chrono::DateTime<chrono::Utc>,
    herunterfahren: Arc<AtomicBool>,
    metriken: KanalfunkMetrics,
}

impl HealthState {
    pub fn neu(metriken: KanalfunkMetrics) -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
            started_at: chrono::Utc::now(),
            herunterfahren: Arc::new(AtomicBool::new(false)),
            metriken,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Markiert den Server als herunterfahrend (Health liefert danach 503)
    pub fn herunterfahren_markieren(&self) {
        self.herunterfahren.store(true, Ordering::Relaxed);
    }

    pub fn status(&self) -> HealthStatus {
        if self.herunterfahren.load(Ordering::Relaxed) {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Healthy
        }
    }

    pub fn antwort(&self) -> HealthResponse {
        HealthResponse {
            status: self.status(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime_seconds(),
            connected_clients: self.metriken.connected_clients.get(),
            started_at: self.started_at,
        }
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `GET /health` – gibt den Serverstatus zurueck
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let response = state.antwort();
    let http_status = match response.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (http_status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> HealthState {
        HealthState::neu(KanalfunkMetrics::neu().unwrap())
    }

    #[test]
    fn health_state_frisch_gesund() {
        let state = state();
        assert!(state.uptime_seconds() < 5);
        assert_eq!(state.status(), HealthStatus::Healthy);
    }

    #[test]
    fn herunterfahren_macht_unhealthy() {
        let state = state();
        state.herunterfahren_markieren();
        assert_eq!(state.status(), HealthStatus::Unhealthy);
    }

    #[test]
    fn antwort_enthaelt_verbindungen() {
        let state = state();
        state.metriken.connected_clients.set(3);
        let json = serde_json::to_string(&state.antwort()).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"connected_clients\":3"));
    }

    #[tokio::test]
    async fn endpunkt_liefert_503_beim_herunterfahren() {
        let state = state();
        let app = health_router(state.clone());

        let antwort = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::OK);

        state.herunterfahren_markieren();
        let antwort = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
