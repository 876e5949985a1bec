//! Per-connection session bridging one client socket to the hub

use std::fmt::Display;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, trace, warn};

use crate::bus::{Hub, Member, Publisher};
use crate::util::rate_limit::PlayerRateLimiter;
use crate::ws::protocol::{Message, PlayerId, ProtocolError};

/// Per-session behaviour switches
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Max in-flight updates per second before dropping; finished runs are
    /// always published
    pub input_rate_limit: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            input_rate_limit: crate::util::rate_limit::INPUT_RATE_LIMIT,
        }
    }
}

/// Why a session ended
#[derive(Debug, thiserror::Error)]
pub enum SessionEnd {
    #[error("client closed the connection")]
    ClientClosed,

    #[error("hub closed")]
    HubClosed,

    #[error("socket read failed: {0}")]
    ReadFailed(String),

    #[error("socket write failed: {0}")]
    WriteFailed(String),

    #[error("{0}")]
    Protocol(#[from] ProtocolError),
}

/// One accepted client connection
pub struct Session {
    id: PlayerId,
    member: Member,
    options: SessionOptions,
}

impl Session {
    /// Join the hub under a fresh identity and announce the join so the
    /// leaderboard republishes its standing.
    pub fn start(hub: &Hub, options: SessionOptions) -> Self {
        let member = hub.join();
        let id = PlayerId::generate();
        member.publish(Message::Join);

        Self {
            id,
            member,
            options,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// Run both loops until one of them ends, then publish the departure
    /// and unsubscribe. Neither loop is alive once this returns.
    pub async fn run<Tx, Rx, E>(mut self, sink: Tx, stream: Rx) -> SessionEnd
    where
        Tx: Sink<String>,
        Tx::Error: Display,
        Rx: Stream<Item = Result<String, E>>,
        E: Display,
    {
        let mut sink = Box::pin(sink);
        let mut stream = Box::pin(stream);
        let publisher = self.member.publisher();
        let limiter = PlayerRateLimiter::new(self.options.input_rate_limit);

        let end = {
            let outbound = forward_outbound(&self.id, &mut self.member, &mut sink);
            let inbound = pump_inbound(&self.id, &publisher, &mut stream, &limiter);

            tokio::select! {
                end = outbound => end,
                end = inbound => end,
            }
        };

        publisher.publish(Message::Leave(self.id.clone()));
        self.member.close();

        end
    }
}

/// Hub -> socket
async fn forward_outbound<Tx>(
    id: &PlayerId,
    member: &mut Member,
    sink: &mut Tx,
) -> SessionEnd
where
    Tx: Sink<String> + Unpin,
    Tx::Error: Display,
{
    while let Some(msg) = member.next().await {
        if !should_forward(&msg, id) {
            continue;
        }

        let text = match msg.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!(player_id = %id, error = %e, "Failed to encode outbound message");
                continue;
            }
        };

        if let Err(e) = sink.send(text).await {
            return SessionEnd::WriteFailed(e.to_string());
        }
    }

    SessionEnd::HubClosed
}

/// Socket -> hub
async fn pump_inbound<Rx, E>(
    id: &PlayerId,
    publisher: &Publisher,
    stream: &mut Rx,
    limiter: &PlayerRateLimiter,
) -> SessionEnd
where
    Rx: Stream<Item = Result<String, E>> + Unpin,
    E: Display,
{
    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(text) => text,
            Err(e) => return SessionEnd::ReadFailed(e.to_string()),
        };

        match admit(&text, id) {
            Ok(Some(msg)) => {
                if is_in_flight(&msg) && !limiter.check_input() {
                    debug!(player_id = %id, "Rate limited update");
                    continue;
                }
                publisher.publish(msg);
            }
            Ok(None) => {
                trace!(player_id = %id, "Dropped client message");
            }
            Err(e) => return SessionEnd::Protocol(e),
        }
    }

    SessionEnd::ClientClosed
}

/// Validate one client frame. Only updates are admitted, re-stamped with the
/// session's identity. Undecodable JSON is an error; anything else that is
/// not an update is dropped.
pub fn admit(text: &str, id: &PlayerId) -> Result<Option<Message>, ProtocolError> {
    let msg = match Message::decode(text) {
        Ok(msg) => msg,
        Err(e) if e.is_terminal() => return Err(e),
        Err(_) => return Ok(None),
    };

    if !msg.is_client_sendable() {
        return Ok(None);
    }

    match msg {
        Message::Update(mut user) => {
            user.id = id.clone();
            Ok(Some(Message::Update(user)))
        }
        _ => Ok(None),
    }
}

/// Only in-flight updates count against the rate limit. A crash update ends
/// the run on every replica and carries the score, so it is never dropped.
fn is_in_flight(msg: &Message) -> bool {
    matches!(msg, Message::Update(user) if user.running)
}

/// Join never leaves the relay. A client's own updates are not sent back:
/// it does not know its identity and would mirror itself as a replica.
pub fn should_forward(msg: &Message, id: &PlayerId) -> bool {
    match msg {
        Message::Join => false,
        Message::Update(user) => &user.id != id,
        Message::Leave(_) | Message::Standing(_) => true,
    }
}
