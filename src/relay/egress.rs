//! # WebSocket Egress
//!
//! Serves the `update` event stream to dashboard clients.
//!
//! Each connection subscribes to the [`Broadcaster`] and forwards every
//! update it sees as one text frame. Frames from the client are only read
//! to notice the connection closing; there are no client commands.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use super::broadcaster::{Broadcaster, Subscription, UpdateEvent};
use crate::error::{RelayError, Result, SubscriberError};

/// Build the egress router with the WebSocket endpoint at `path`
pub fn router(broadcaster: Arc<Broadcaster>, path: &str) -> Router {
    Router::new()
        .route(path, get(ws_upgrade))
        .with_state(broadcaster)
}

/// Bind the egress listener
///
/// # Errors
///
/// Returns [`RelayError::Transport`] if the address cannot be bound
pub async fn bind(addr: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| RelayError::Transport {
            endpoint: format!("tcp://{}", addr),
            source,
        })?;

    info!("WebSocket egress listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Serve the egress router until the listener fails
pub async fn serve(listener: TcpListener, broadcaster: Arc<Broadcaster>, path: &str) -> Result<()> {
    let app = router(broadcaster, path);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(broadcaster): State<Arc<Broadcaster>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| client_connection(socket, peer, broadcaster))
}

/// Drive one client connection until either side goes away
async fn client_connection(socket: WebSocket, peer: SocketAddr, broadcaster: Arc<Broadcaster>) {
    let subscription = broadcaster.subscribe();
    let id = subscription.id();
    info!("Client {} connected (subscriber {})", peer, id);

    let (sink, mut stream) = socket.split();
    let mut forward = tokio::spawn(forward_updates(subscription, sink));

    let mut watch_close = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Client {} read error: {}", peer, e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        result = &mut forward => {
            if let Ok(Err(e)) = result {
                warn!("{}", e);
            }
            watch_close.abort();
        }
        _ = &mut watch_close => forward.abort(),
    }

    broadcaster.unsubscribe(id);
    info!("Client {} disconnected (subscriber {})", peer, id);
}

async fn forward_updates<S>(
    mut subscription: Subscription,
    mut sink: S,
) -> std::result::Result<(), SubscriberError>
where
    S: futures_util::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let id = subscription.id();
    while let Some(update) = subscription.recv().await {
        sink.send(update_message(&update))
            .await
            .map_err(|e| SubscriberError::Send {
                id,
                reason: e.to_string(),
            })?;
    }
    Ok(())
}

/// Text frame carrying one update
pub fn update_message(update: &UpdateEvent) -> Message {
    Message::Text(update.json.as_str().into())
}
