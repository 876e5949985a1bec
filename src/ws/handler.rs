//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{future, SinkExt, StreamExt};
use tracing::info;

use crate::app::AppState;
use crate::ws::session::Session;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let session = Session::start(&state.hub, state.session_options());
    let player_id = session.id().clone();
    let connections = state.connection_opened();
    info!(player_id = %player_id, connections, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();

    // Sessions speak text frames; binary, ping and pong frames are skipped
    // and a close frame ends the stream.
    let sink = ws_sink.with(|text: String| future::ready(Ok::<_, axum::Error>(Message::Text(text))));
    let stream = ws_stream
        .take_while(|frame| future::ready(!matches!(frame, Ok(Message::Close(_)))))
        .filter_map(|frame| {
            future::ready(match frame {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
        });

    let end = session.run(sink, stream).await;

    let connections = state.connection_closed();
    info!(player_id = %player_id, reason = %end, connections, "WebSocket connection closed");
}
