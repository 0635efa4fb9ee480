use super::AppState;
use crate::broadcast::Subscription;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::debug;

/// GET /ws
pub async fn progress_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let subscription = state.broadcaster().subscribe();
    ws.on_upgrade(move |socket| forward_events(socket, subscription))
}

/// Push progress events until the client goes away. Incoming messages are ignored.
async fn forward_events(socket: WebSocket, mut subscription: Subscription) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(text) = event else { break };
                if sender.send(Message::Text(text.to_string())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!("Progress socket closed");
}
