//! # Relay Broadcaster
//!
//! Fans each decoded record out to every connected subscriber.
//!
//! Every subscriber owns a single-slot mailbox (a `tokio::sync::watch`
//! channel). Publishing overwrites the slot, so a slow subscriber skips
//! straight to the latest record and no per-subscriber backlog builds up.
//! Records fully replace each other, so a skipped record never leaves a
//! subscriber inconsistent.
//!
//! The subscriber set is the only shared mutable state. `publish` takes a
//! snapshot of it under a short lock and delivers outside the lock, so
//! subscribers may join or leave at any time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::SubscriberError;
use crate::telemetry::TelemetryRecord;
use crate::wire::encoder::to_update_json;

/// Identifier handed out by [`Broadcaster::subscribe`]
pub type SubscriptionId = u64;

/// One published update, shared by every subscriber that receives it
#[derive(Debug)]
pub struct UpdateEvent {
    /// Relay-wide sequence number, increasing with arrival order
    pub sequence: u64,
    pub record: TelemetryRecord,
    /// `update` event text, rendered once per publish
    pub json: String,
}

type Slot = Option<Arc<UpdateEvent>>;

/// Publisher-side state of one subscriber
#[derive(Debug)]
struct SubscriberSlot {
    sender: watch::Sender<Slot>,
    active: AtomicBool,
}

/// Receiving end of a subscription
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: watch::Receiver<Slot>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next update
    ///
    /// Returns `None` once the subscription has been removed from the
    /// broadcaster.
    pub async fn recv(&mut self) -> Option<Arc<UpdateEvent>> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(update) = self.receiver.borrow_and_update().clone() {
                return Some(update);
            }
        }
    }

    /// Take the latest unseen update without waiting
    pub fn try_recv(&mut self) -> Option<Arc<UpdateEvent>> {
        if self.receiver.has_changed().unwrap_or(false) {
            self.receiver.borrow_and_update().clone()
        } else {
            None
        }
    }
}

/// Outcome of one publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishReport {
    /// Subscribers the update was handed to
    pub delivered: usize,
    /// Subscribers found disconnected and pruned
    pub dropped: usize,
}

/// Latest-sample-wins fan-out of telemetry records
#[derive(Debug, Default)]
pub struct Broadcaster {
    subscribers: RwLock<HashMap<SubscriptionId, Arc<SubscriberSlot>>>,
    next_id: AtomicU64,
    sequence: AtomicU64,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    ///
    /// The subscriber only sees records published after this call.
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = watch::channel(None);
        let slot = Arc::new(SubscriberSlot {
            sender,
            active: AtomicBool::new(true),
        });

        self.write_subscribers().insert(id, slot);
        debug!("Subscriber {} added", id);

        Subscription { id, receiver }
    }

    /// Remove a subscriber
    ///
    /// A publish already in flight will not deliver to it after this
    /// returns. Returns `false` if the id was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.write_subscribers().remove(&id);
        match removed {
            Some(slot) => {
                slot.active.store(false, Ordering::SeqCst);
                debug!("Subscriber {} removed", id);
                true
            }
            None => false,
        }
    }

    /// Number of currently registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.read_subscribers().len()
    }

    /// Publish a record to every current subscriber
    ///
    /// Having no subscribers is not an error. Subscribers whose receiving
    /// half is gone are pruned and counted in [`PublishReport::dropped`].
    pub fn publish(&self, record: TelemetryRecord) -> PublishReport {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let json = to_update_json(&record);
        let update = Arc::new(UpdateEvent {
            sequence,
            record,
            json,
        });

        let snapshot: Vec<(SubscriptionId, Arc<SubscriberSlot>)> = self
            .read_subscribers()
            .iter()
            .map(|(id, slot)| (*id, Arc::clone(slot)))
            .collect();

        let mut report = PublishReport::default();
        for (id, slot) in snapshot {
            match Self::deliver(id, &slot, &update) {
                Ok(true) => report.delivered += 1,
                Ok(false) => {}
                Err(e) => {
                    debug!("{}", e);
                    if self.unsubscribe(id) {
                        report.dropped += 1;
                    }
                }
            }
        }

        report
    }

    /// Hand an update to one subscriber; `Ok(false)` if it was removed meanwhile
    fn deliver(
        id: SubscriptionId,
        slot: &SubscriberSlot,
        update: &Arc<UpdateEvent>,
    ) -> Result<bool, SubscriberError> {
        if !slot.active.load(Ordering::SeqCst) {
            return Ok(false);
        }

        slot.sender
            .send(Some(Arc::clone(update)))
            .map(|_| true)
            .map_err(|_| SubscriberError::Disconnected(id))
    }

    fn read_subscribers(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<SubscriptionId, Arc<SubscriberSlot>>> {
        self.subscribers.read().unwrap_or_else(|poisoned| {
            warn!("Subscriber set lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_subscribers(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<SubscriptionId, Arc<SubscriberSlot>>> {
        self.subscribers.write().unwrap_or_else(|poisoned| {
            warn!("Subscriber set lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
