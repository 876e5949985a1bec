//! Publish/subscribe hub with per-member delivery queues
//!
//! Every published message is pushed into the queue of each member joined at
//! the time of the publish, the publisher included. Fan-out happens under the
//! registry lock, so all members observe publishes in the same order. Queues
//! are unbounded: a member that stops reading only grows its own queue.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::ws::protocol::Message;

/// Hub-local member number (not a player identity)
pub type MemberId = u64;

type Delivery = Arc<Message>;

#[derive(Default)]
struct Registry {
    members: HashMap<MemberId, mpsc::UnboundedSender<Delivery>>,
    closed: bool,
}

#[derive(Default)]
struct Inner {
    registry: Mutex<Registry>,
    next_id: AtomicU64,
}

/// Broadcast hub. Cloneable — store in AppState.
#[derive(Clone, Default)]
pub struct Hub {
    inner: Arc<Inner>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a new member. Joining a closed hub yields a member whose
    /// queue is already closed.
    pub fn join(&self) -> Member {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        let mut registry = self.inner.registry.lock();
        if !registry.closed {
            registry.members.insert(id, tx);
        }
        let subscribers = registry.members.len();
        drop(registry);

        debug!(member_id = id, subscribers, "Member joined hub");

        Member {
            id,
            rx,
            publisher: Publisher { hub: self.clone() },
            joined: true,
        }
    }

    /// Number of currently joined members
    pub fn subscriber_count(&self) -> usize {
        self.inner.registry.lock().members.len()
    }

    /// Close every queue. Pending `next()` calls return `None` once drained.
    pub fn close(&self) {
        let mut registry = self.inner.registry.lock();
        if registry.closed {
            return;
        }
        registry.closed = true;
        let dropped = registry.members.len();
        registry.members.clear();
        drop(registry);

        info!(members = dropped, "Hub closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.registry.lock().closed
    }

    fn publish(&self, msg: Delivery) -> usize {
        let registry = self.inner.registry.lock();
        registry
            .members
            .values()
            .filter(|tx| tx.send(msg.clone()).is_ok())
            .count()
    }

    fn leave(&self, id: MemberId) {
        let removed = self.inner.registry.lock().members.remove(&id).is_some();
        if removed {
            debug!(member_id = id, "Member left hub");
        }
    }
}

/// Publish capability detached from a member's queue
#[derive(Clone)]
pub struct Publisher {
    hub: Hub,
}

impl Publisher {
    /// Deliver to every joined member; returns how many queues received it
    pub fn publish(&self, msg: Message) -> usize {
        self.hub.publish(Arc::new(msg))
    }
}

/// One subscription to the hub
pub struct Member {
    id: MemberId,
    rx: mpsc::UnboundedReceiver<Delivery>,
    publisher: Publisher,
    joined: bool,
}

impl Member {
    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn publish(&self, msg: Message) -> usize {
        self.publisher.publish(msg)
    }

    pub fn publisher(&self) -> Publisher {
        self.publisher.clone()
    }

    /// Wait for the next delivery. Returns `None` once the member is closed
    /// (or the hub shut down) and its queue is drained.
    pub async fn next(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`Member::next`]
    pub fn try_next(&mut self) -> Option<Delivery> {
        self.rx.try_recv().ok()
    }

    /// Stop further deliveries. Already queued messages stay readable.
    pub fn close(&mut self) {
        if !self.joined {
            return;
        }
        self.joined = false;
        self.publisher.hub.leave(self.id);
        self.rx.close();
    }
}

impl Drop for Member {
    fn drop(&mut self) {
        self.close();
    }
}
