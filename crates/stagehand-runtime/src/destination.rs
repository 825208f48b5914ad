//! In-process messaging destinations backing queues and topics.
//!
//! A destination is created when its deployment starts it and destroyed
//! when the deployment stops it. Handles keep a reference to the shared
//! core, so a handle held past undeploy becomes inert instead of dangling.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use stagehand_common::error::{Result, StagehandError};
use stagehand_common::types::{ResourceKind, ResourceName, ResourceState};

type Inbox = Arc<Mutex<VecDeque<String>>>;

/// Locks a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct CoreState {
    state: ResourceState,
    messages: VecDeque<String>,
    subscribers: Vec<Weak<Mutex<VecDeque<String>>>>,
}

/// Shared state of one queue or topic.
#[derive(Debug)]
pub struct DestinationCore {
    name: ResourceName,
    durable: bool,
    inner: Mutex<CoreState>,
}

impl DestinationCore {
    /// Creates a stopped destination.
    #[must_use]
    pub fn new(name: ResourceName, durable: bool) -> Self {
        Self {
            name,
            durable,
            inner: Mutex::new(CoreState {
                state: ResourceState::Stopped,
                messages: VecDeque::new(),
                subscribers: Vec::new(),
            }),
        }
    }

    /// Destination name.
    #[must_use]
    pub const fn name(&self) -> &ResourceName {
        &self.name
    }

    /// Whether buffered messages carry over when the destination is
    /// replaced by a redeployment.
    #[must_use]
    pub const fn is_durable(&self) -> bool {
        self.durable
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ResourceState {
        lock(&self.inner).state
    }

    /// Creates the destination.
    pub fn start(&self) {
        tracing::info!(destination = %self.name, durable = self.durable, "start destination");
        lock(&self.inner).state = ResourceState::Started;
    }

    /// Destroys the destination, dropping buffered messages and subscriptions.
    pub fn stop(&self) {
        tracing::info!(destination = %self.name, "stop destination");
        let mut inner = lock(&self.inner);
        inner.state = ResourceState::Stopped;
        inner.messages.clear();
        inner.subscribers.clear();
    }

    /// Moves buffered messages to the front of `successor`, preserving order.
    pub fn hand_over(&self, successor: &Self) {
        let moved: Vec<String> = lock(&self.inner).messages.drain(..).collect();
        if moved.is_empty() {
            return;
        }
        tracing::debug!(destination = %self.name, count = moved.len(), "handing over messages");
        let mut next = lock(&successor.inner);
        for message in moved.into_iter().rev() {
            next.messages.push_front(message);
        }
    }

    fn ensure_started(&self, inner: &CoreState) -> Result<()> {
        if inner.state == ResourceState::Started {
            Ok(())
        } else {
            Err(StagehandError::NotFound {
                kind: "destination",
                id: self.name.to_string(),
            })
        }
    }
}

/// Handle to a deployed queue.
#[derive(Debug, Clone)]
pub struct QueueHandle {
    core: Arc<DestinationCore>,
}

impl QueueHandle {
    pub(crate) fn new(core: Arc<DestinationCore>) -> Self {
        debug_assert_eq!(core.name().kind(), ResourceKind::Queue);
        Self { core }
    }

    /// Queue name.
    #[must_use]
    pub fn name(&self) -> &ResourceName {
        self.core.name()
    }

    /// Whether the queue is durable.
    #[must_use]
    pub fn is_durable(&self) -> bool {
        self.core.is_durable()
    }

    /// Enqueues a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue has been undeployed.
    pub fn send(&self, body: impl Into<String>) -> Result<()> {
        let mut inner = lock(&self.core.inner);
        self.core.ensure_started(&inner)?;
        inner.messages.push_back(body.into());
        Ok(())
    }

    /// Dequeues the oldest message, if any.
    #[must_use]
    pub fn receive(&self) -> Option<String> {
        let mut inner = lock(&self.core.inner);
        if inner.state == ResourceState::Started {
            inner.messages.pop_front()
        } else {
            None
        }
    }

    /// Number of buffered messages.
    #[must_use]
    pub fn depth(&self) -> usize {
        lock(&self.core.inner).messages.len()
    }
}

/// Handle to a deployed topic.
#[derive(Debug, Clone)]
pub struct TopicHandle {
    core: Arc<DestinationCore>,
}

impl TopicHandle {
    pub(crate) fn new(core: Arc<DestinationCore>) -> Self {
        debug_assert_eq!(core.name().kind(), ResourceKind::Topic);
        Self { core }
    }

    /// Topic name.
    #[must_use]
    pub fn name(&self) -> &ResourceName {
        self.core.name()
    }

    /// Registers a new subscription; it sees messages published from now on.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic has been undeployed.
    pub fn subscribe(&self) -> Result<Subscription> {
        let mut inner = lock(&self.core.inner);
        self.core.ensure_started(&inner)?;
        let inbox: Inbox = Arc::new(Mutex::new(VecDeque::new()));
        inner.subscribers.push(Arc::downgrade(&inbox));
        Ok(Subscription { inbox })
    }

    /// Delivers a message to every live subscription, returning how many
    /// received it.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic has been undeployed.
    pub fn publish(&self, body: impl Into<String>) -> Result<usize> {
        let body = body.into();
        let mut inner = lock(&self.core.inner);
        self.core.ensure_started(&inner)?;
        inner.subscribers.retain(|s| s.strong_count() > 0);
        let mut delivered = 0;
        for subscriber in inner.subscribers.iter().filter_map(Weak::upgrade) {
            lock(&subscriber).push_back(body.clone());
            delivered += 1;
        }
        Ok(delivered)
    }
}

/// A topic subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    inbox: Inbox,
}

impl Subscription {
    /// Takes the oldest undelivered message, if any.
    #[must_use]
    pub fn receive(&self) -> Option<String> {
        lock(&self.inbox).pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started_queue() -> QueueHandle {
        let core = Arc::new(DestinationCore::new(
            ResourceName::Queue("container_queue".into()),
            true,
        ));
        core.start();
        QueueHandle::new(core)
    }

    fn started_topic() -> TopicHandle {
        let core = Arc::new(DestinationCore::new(
            ResourceName::Topic("announcements".into()),
            true,
        ));
        core.start();
        TopicHandle::new(core)
    }

    #[test]
    fn queue_is_fifo() {
        let q = started_queue();
        q.send("one").expect("send");
        q.send("two").expect("send");
        assert_eq!(q.depth(), 2);
        assert_eq!(q.receive().as_deref(), Some("one"));
        assert_eq!(q.receive().as_deref(), Some("two"));
        assert_eq!(q.receive(), None);
    }

    #[test]
    fn stopped_queue_rejects_send() {
        let q = started_queue();
        q.send("pending").expect("send");
        q.core.stop();
        assert!(q.send("late").is_err());
        assert_eq!(q.receive(), None);
        assert_eq!(q.depth(), 0);
    }

    #[test]
    fn topic_fans_out_to_subscribers() {
        let t = started_topic();
        let a = t.subscribe().expect("subscribe");
        let b = t.subscribe().expect("subscribe");
        assert_eq!(t.publish("hello").expect("publish"), 2);
        assert_eq!(a.receive().as_deref(), Some("hello"));
        assert_eq!(b.receive().as_deref(), Some("hello"));
    }

    #[test]
    fn dropped_subscription_stops_receiving() {
        let t = started_topic();
        let keep = t.subscribe().expect("subscribe");
        drop(t.subscribe().expect("subscribe"));
        assert_eq!(t.publish("x").expect("publish"), 1);
        assert_eq!(keep.receive().as_deref(), Some("x"));
    }

    #[test]
    fn subscription_misses_earlier_messages() {
        let t = started_topic();
        assert_eq!(t.publish("early").expect("publish"), 0);
        let s = t.subscribe().expect("subscribe");
        assert_eq!(s.receive(), None);
    }

    #[test]
    fn hand_over_preserves_order() {
        let old = started_queue();
        old.send("a").expect("send");
        old.send("b").expect("send");
        let successor = started_queue();
        successor.send("c").expect("send");

        old.core.hand_over(&successor.core);
        assert_eq!(old.depth(), 0);
        assert_eq!(successor.receive().as_deref(), Some("a"));
        assert_eq!(successor.receive().as_deref(), Some("b"));
        assert_eq!(successor.receive().as_deref(), Some("c"));
    }
}
