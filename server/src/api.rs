//! REST-API fuer Moderation, Chatbot und Channel-Liste
//!
//! Endpunkte:
//! - `POST /api/ban`      – Benutzer sperren (nur Admin)
//! - `POST /api/unban`    – Sperre aufheben (nur Admin)
//! - `POST /api/chatbot`  – Antwort des Chatbots
//! - `GET  /api/channels` – Channels mit Mitgliederzahl

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use kanalfunk_moderation::{BanList, ChatBot, ModerationError, WortFilter};
use kanalfunk_signaling::RelayState;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Relay mit den Moderations-Kollaboratoren des Servers
pub type Relay = RelayState<BanList, WortFilter>;

/// Header fuer das optionale Admin-Geheimnis
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

// ---------------------------------------------------------------------------
// Fehler
// ---------------------------------------------------------------------------

/// Fehler der REST-Handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authorized.")]
    NichtAutorisiert,

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl ApiError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NichtAutorisiert => StatusCode::FORBIDDEN,
            Self::UngueltigeEingabe(_) => StatusCode::BAD_REQUEST,
            Self::Intern(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ModerationError> for ApiError {
    fn from(e: ModerationError) -> Self {
        match e {
            ModerationError::UngueltigerBenutzername(msg) => Self::UngueltigeEingabe(msg),
            andere => Self::Intern(andere.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Intern(ref msg) = self {
            tracing::error!(fehler = %msg, "REST-Anfrage fehlgeschlagen");
        }
        (self.http_status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Axum-State fuer die REST-API
#[derive(Clone)]
pub struct ApiState {
    pub relay: Arc<Relay>,
    pub bot: ChatBot,
    /// None = Pruefung nur ueber den Admin-Namen
    pub admin_token: Option<Arc<str>>,
}

impl ApiState {
    pub fn neu(relay: Arc<Relay>, admin_token: Option<String>) -> Self {
        Self {
            relay,
            bot: ChatBot::neu(),
            admin_token: admin_token.map(Arc::from),
        }
    }

    /// Prueft Admin-Name und (falls konfiguriert) Admin-Token
    fn admin_pruefen(&self, admin: &str, headers: &HeaderMap) -> Result<(), ApiError> {
        if admin != self.relay.config.admin_name {
            return Err(ApiError::NichtAutorisiert);
        }
        if let Some(erwartet) = &self.admin_token {
            let token = headers
                .get(ADMIN_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok());
            if token != Some(erwartet.as_ref()) {
                return Err(ApiError::NichtAutorisiert);
            }
        }
        Ok(())
    }
}

/// Router mit allen `/api`-Endpunkten
pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/ban", post(bannen))
        .route("/api/unban", post(entbannen))
        .route("/api/chatbot", post(chatbot))
        .route("/api/channels", get(kanaele))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct BannBody {
    pub username: String,
    #[serde(default)]
    pub admin: String,
}

#[derive(Debug, Serialize)]
pub struct BannAntwort {
    pub success: bool,
    /// false wenn der Zustand bereits bestand
    pub changed: bool,
}

async fn bannen(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<BannBody>,
) -> Result<Json<BannAntwort>, ApiError> {
    state.admin_pruefen(&body.admin, &headers)?;
    let changed = state.relay.bans.bannen(&body.username).await?;
    tracing::info!(username = %body.username.trim(), changed, "Ban ueber REST");
    Ok(Json(BannAntwort {
        success: true,
        changed,
    }))
}

async fn entbannen(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<BannBody>,
) -> Result<Json<BannAntwort>, ApiError> {
    state.admin_pruefen(&body.admin, &headers)?;
    let changed = state.relay.bans.entbannen(&body.username).await?;
    tracing::info!(username = %body.username.trim(), changed, "Unban ueber REST");
    Ok(Json(BannAntwort {
        success: true,
        changed,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChatbotBody {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub username: String,
}

async fn chatbot(State(state): State<ApiState>, Json(body): Json<ChatbotBody>) -> Response {
    let text = state.bot.antworten(body.prompt.as_deref(), &body.username);
    (StatusCode::OK, Json(json!({ "text": text }))).into_response()
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct KanalAntwort {
    pub id: String,
    pub name: String,
    pub members: usize,
}

async fn kanaele(State(state): State<ApiState>) -> Json<Vec<KanalAntwort>> {
    let registry = &state.relay.registry;
    Json(
        registry
            .kanaele()
            .iter()
            .map(|k| KanalAntwort {
                id: k.id.to_string(),
                name: k.name.clone(),
                members: registry.mitglieder_anzahl(&k.id),
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use kanalfunk_core::types::{standard_kanaele, ChannelId, ConnectionId};
    use kanalfunk_moderation::BanPredicate;
    use kanalfunk_observability::KanalfunkMetrics;
    use kanalfunk_signaling::RelayConfig;
    use tower::ServiceExt;

    fn relay(bans: BanList) -> Arc<Relay> {
        RelayState::neu(
            RelayConfig::default(),
            standard_kanaele(),
            Arc::new(bans),
            Arc::new(WortFilter::standard()),
            KanalfunkMetrics::neu().unwrap(),
        )
        .unwrap()
    }

    fn post_json(pfad: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(pfad)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(antwort: Response) -> serde_json::Value {
        let bytes = to_bytes(antwort.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn admin_kann_bannen_und_entbannen() {
        let relay = relay(BanList::in_memory());
        let app = api_router(ApiState::neu(Arc::clone(&relay), None));

        let antwort = app
            .clone()
            .oneshot(post_json(
                "/api/ban",
                json!({"username": "carol", "admin": "BredXD"}),
            ))
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::OK);
        assert_eq!(
            json_body(antwort).await,
            json!({"success": true, "changed": true})
        );
        assert!(relay.bans.ist_gebannt("carol"));

        let antwort = app
            .oneshot(post_json(
                "/api/unban",
                json!({"username": "carol", "admin": "BredXD"}),
            ))
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::OK);
        assert!(!relay.bans.ist_gebannt("carol"));
    }

    #[tokio::test]
    async fn fremder_admin_wird_abgewiesen() {
        let relay = relay(BanList::in_memory());
        let app = api_router(ApiState::neu(Arc::clone(&relay), None));

        let antwort = app
            .oneshot(post_json(
                "/api/ban",
                json!({"username": "bob", "admin": "mallory"}),
            ))
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            json_body(antwort).await,
            json!({"error": "Not authorized."})
        );
        assert!(!relay.bans.ist_gebannt("bob"));
    }

    #[tokio::test]
    async fn admin_token_wird_geprueft() {
        let relay = relay(BanList::in_memory());
        let app = api_router(ApiState::neu(Arc::clone(&relay), Some("geheim".into())));

        let ohne_token = app
            .clone()
            .oneshot(post_json(
                "/api/ban",
                json!({"username": "bob", "admin": "BredXD"}),
            ))
            .await
            .unwrap();
        assert_eq!(ohne_token.status(), StatusCode::FORBIDDEN);

        let mut anfrage = post_json("/api/ban", json!({"username": "bob", "admin": "BredXD"}));
        anfrage
            .headers_mut()
            .insert(ADMIN_TOKEN_HEADER, "geheim".parse().unwrap());
        let mit_token = app.oneshot(anfrage).await.unwrap();
        assert_eq!(mit_token.status(), StatusCode::OK);
        assert!(relay.bans.ist_gebannt("bob"));
    }

    #[tokio::test]
    async fn leerer_benutzername_ist_bad_request() {
        let relay = relay(BanList::in_memory());
        let app = api_router(ApiState::neu(relay, None));

        let antwort = app
            .oneshot(post_json(
                "/api/ban",
                json!({"username": "  ", "admin": "BredXD"}),
            ))
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bann_wird_in_datei_geschrieben() {
        let dir = tempfile::tempdir().unwrap();
        let pfad = dir.path().join("bans.json");
        let relay = relay(BanList::laden(&pfad).await.unwrap());
        let app = api_router(ApiState::neu(relay, None));

        app.oneshot(post_json(
            "/api/ban",
            json!({"username": "carol", "admin": "BredXD"}),
        ))
        .await
        .unwrap();

        let inhalt: Vec<String> =
            serde_json::from_slice(&std::fs::read(&pfad).unwrap()).unwrap();
        assert_eq!(inhalt, vec!["carol".to_string()]);
    }

    #[tokio::test]
    async fn chatbot_antwortet() {
        let app = api_router(ApiState::neu(relay(BanList::in_memory()), None));

        let antwort = app
            .clone()
            .oneshot(post_json(
                "/api/chatbot",
                json!({"prompt": "hello bot", "username": "alice"}),
            ))
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::OK);
        assert_eq!(json_body(antwort).await, json!({"text": "Hi alice! 👋"}));

        let antwort = app
            .oneshot(post_json("/api/chatbot", json!({})))
            .await
            .unwrap();
        assert_eq!(
            json_body(antwort).await,
            json!({"text": "Hello! I'm Chatbot. How can I help you today?"})
        );
    }

    #[tokio::test]
    async fn channel_liste_mit_mitgliederzahl() {
        let relay = relay(BanList::in_memory());
        relay
            .registry
            .beitreten(&ChannelId::from("random"), ConnectionId::new())
            .unwrap();
        let app = api_router(ApiState::neu(Arc::clone(&relay), None));

        let antwort = app
            .oneshot(Request::get("/api/channels").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(antwort.status(), StatusCode::OK);

        let liste: Vec<KanalAntwort> = serde_json::from_value(json_body(antwort).await).unwrap();
        assert_eq!(liste.len(), 4);
        assert_eq!(liste[0].id, "general");
        assert_eq!(liste[0].members, 0);
        assert_eq!(liste[2].id, "random");
        assert_eq!(liste[2].members, 1);
    }
}
