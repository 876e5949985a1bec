//! Client connection to the relay
//!
//! One task pumps inbound frames into the [`ReplicaCache`]; one task owns the
//! socket's write half and drains a queue of outgoing updates. There is no
//! reconnect: once the pump stops the cache stays frozen at its last state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite};
use tracing::{debug, info, warn};

use crate::ws::protocol::{Message, Record, User};

use super::cache::{Replica, ReplicaCache};

type WsMessage = tungstenite::Message;

/// Client-side errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to connect to relay: {0}")]
    Connect(#[from] tungstenite::Error),
}

/// Live connection to a relay
pub struct RelayClient {
    cache: Arc<ReplicaCache>,
    outgoing: mpsc::UnboundedSender<Message>,
    connected: Arc<AtomicBool>,
    pump: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl RelayClient {
    /// Dial the relay's websocket endpoint
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (ws_stream, _) = connect_async(url).await?;
        info!(url, "Connected to relay");

        let (ws_sink, ws_stream) = ws_stream.split();
        let cache = Arc::new(ReplicaCache::new());
        let connected = Arc::new(AtomicBool::new(true));
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();

        let pump = tokio::spawn(run_pump(ws_stream, cache.clone(), connected.clone()));
        let writer = tokio::spawn(run_writer(ws_sink, outgoing_rx));

        Ok(Self {
            cache,
            outgoing,
            connected,
            pump,
            writer,
        })
    }

    pub fn cache(&self) -> &Arc<ReplicaCache> {
        &self.cache
    }

    pub fn list_replicas(&self) -> Vec<Replica> {
        self.cache.list_replicas()
    }

    pub fn leaderboard(&self) -> Vec<Record> {
        self.cache.leaderboard()
    }

    /// Queue an update for the relay. Never blocks, never retries.
    pub fn send_update(&self, user: User) {
        if self.outgoing.send(Message::Update(user)).is_err() {
            debug!("Relay writer gone, update dropped");
        }
    }

    /// Whether the inbound pump is still reading
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Flush queued updates, send a close frame and stop both tasks
    pub async fn close(self) {
        drop(self.outgoing);
        let _ = self.writer.await;
        self.pump.abort();
        let _ = self.pump.await;
        self.connected.store(false, Ordering::Release);
    }
}

async fn run_pump<S>(mut stream: S, cache: Arc<ReplicaCache>, connected: Arc<AtomicBool>)
where
    S: Stream<Item = Result<WsMessage, tungstenite::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => match Message::decode(&text) {
                Ok(msg) => cache.apply(&msg),
                Err(e) if e.is_terminal() => {
                    warn!(error = %e, "Undecodable frame from relay");
                    break;
                }
                Err(e) => debug!(error = %e, "Ignoring relay message"),
            },
            Ok(WsMessage::Close(_)) => {
                debug!("Relay sent close");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Relay connection error");
                break;
            }
        }
    }

    connected.store(false, Ordering::Release);
    info!(replicas = cache.len(), "Relay connection closed, replicas frozen");
}

async fn run_writer<S>(mut sink: S, mut outgoing: mpsc::UnboundedReceiver<Message>)
where
    S: Sink<WsMessage, Error = tungstenite::Error> + Unpin,
{
    while let Some(msg) = outgoing.recv().await {
        let text = match msg.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to encode update");
                continue;
            }
        };

        if let Err(e) = sink.send(WsMessage::Text(text)).await {
            warn!(error = %e, "Failed to send update");
            break;
        }
    }

    let _ = sink.close().await;
}
