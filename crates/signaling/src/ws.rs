//! WebSocket-Endpunkt – Nimmt Upgrades an und startet Verbindungs-Tasks

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use kanalfunk_moderation::{BanPredicate, TextFilter};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::connection::ClientConnection;
use crate::server_state::RelayState;

/// Router mit dem Echtzeit-Endpunkt `GET /ws`
pub fn relay_router<B, F>(state: Arc<RelayState<B, F>>) -> Router
where
    B: BanPredicate,
    F: TextFilter,
{
    Router::new()
        .route("/ws", get(ws_handler::<B, F>))
        .with_state(state)
}

async fn ws_handler<B, F>(
    State(state): State<Arc<RelayState<B, F>>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    ws: WebSocketUpgrade,
) -> Response
where
    B: BanPredicate,
    F: TextFilter,
{
    let Some(platz) = state.platz_reservieren() else {
        tracing::warn!(
            maximum = state.config.max_verbindungen,
            "Verbindungslimit erreicht – Upgrade abgelehnt"
        );
        state.metriken.protokollfehler("SERVER_FULL");
        return (StatusCode::SERVICE_UNAVAILABLE, "Server voll").into_response();
    };

    let peer_addr = connect_info.map(|ConnectInfo(addr)| addr);
    let shutdown_rx = state.shutdown_abonnieren();
    // Der Codec prueft die Frame-Grenze, der Transport bricht erst beim Vierfachen ab
    let transport_grenze = state.config.max_frame_groesse.saturating_mul(4);

    ws.max_message_size(transport_grenze)
        .on_upgrade(move |socket| async move {
            // Der Platz bleibt belegt bis der Verbindungs-Task endet
            let _platz = platz;
            ClientConnection::neu(state, peer_addr)
                .verarbeiten(socket, shutdown_rx)
                .await;
        })
}
