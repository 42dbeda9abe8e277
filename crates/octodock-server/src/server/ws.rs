use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::Response;

use crate::broadcast::serve_socket;

use super::state::AppState;

/// `GET /ws`: upgrade and join the broadcast group.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let server = state.broadcast.clone();
    ws.on_upgrade(move |socket| serve_socket(server, socket))
}
