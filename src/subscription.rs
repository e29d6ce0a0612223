//! Scoped listener subscriptions.
//!
//! Floating panels need to react to events that happen anywhere on screen:
//! layout changes, terminal resizes, scrolling and pointer presses outside the
//! panel. Instead of registering global handlers, a panel asks a [`Registry`]
//! for [`Subscription`] guards when it opens and drops them when it closes.
//! A guard is released on every exit path, including unwinding, so listeners
//! cannot accumulate across open/close cycles.
//!
//! The registry is cheap to clone and shared between every component of an
//! application; hosts can query it to decide whether anyone is interested in,
//! say, `ScrollMsg` before emitting one.
//!
//! ```rust
//! use bubbletea_panels::subscription::{Registry, Topic};
//!
//! let registry = Registry::new();
//! {
//!     let _guard = registry.subscribe(Topic::Scroll);
//!     assert_eq!(registry.active(Topic::Scroll), 1);
//! }
//! assert_eq!(registry.active(Topic::Scroll), 0);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Event sources a panel can listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Pointer presses anywhere on screen.
    PointerDown,
    /// Layout of the host view changed.
    LayoutChanged,
    /// The terminal was resized.
    Resize,
    /// A scrollable region moved.
    Scroll,
}

impl Topic {
    /// Every topic, in declaration order.
    pub const ALL: [Topic; 4] = [
        Topic::PointerDown,
        Topic::LayoutChanged,
        Topic::Resize,
        Topic::Scroll,
    ];

    fn index(self) -> usize {
        match self {
            Topic::PointerDown => 0,
            Topic::LayoutChanged => 1,
            Topic::Resize => 2,
            Topic::Scroll => 3,
        }
    }
}

#[derive(Debug, Default)]
struct Counters([AtomicUsize; 4]);

/// Shared table of live subscriptions per [`Topic`].
#[derive(Debug, Clone, Default)]
pub struct Registry {
    counters: Arc<Counters>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in `topic`. Interest lasts until the guard drops.
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        self.counters.0[topic.index()].fetch_add(1, Ordering::SeqCst);
        Subscription {
            counters: Arc::clone(&self.counters),
            topic,
        }
    }

    /// Number of live subscriptions to `topic`.
    pub fn active(&self, topic: Topic) -> usize {
        self.counters.0[topic.index()].load(Ordering::SeqCst)
    }

    /// Number of live subscriptions across all topics.
    pub fn total_active(&self) -> usize {
        Topic::ALL.iter().map(|t| self.active(*t)).sum()
    }
}

/// A live subscription. Dropping it unregisters the listener.
#[derive(Debug)]
#[must_use = "the subscription is released as soon as the guard is dropped"]
pub struct Subscription {
    counters: Arc<Counters>,
    topic: Topic,
}

impl Subscription {
    /// The topic this guard listens to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.counters.0[self.topic.index()].fetch_sub(1, Ordering::SeqCst);
    }
}

/// The listener set held by an open floating panel.
///
/// Holds one outside-press listener and one layout observer (layout changes,
/// resizes and scrolls).
#[derive(Debug)]
pub struct PanelListeners {
    guards: Vec<Subscription>,
}

impl PanelListeners {
    /// Subscribes to every topic a floating panel needs.
    pub fn attach(registry: &Registry) -> Self {
        Self {
            guards: Topic::ALL.iter().map(|t| registry.subscribe(*t)).collect(),
        }
    }

    /// Whether this set listens to `topic`.
    pub fn listens_to(&self, topic: Topic) -> bool {
        self.guards.iter().any(|g| g.topic() == topic)
    }
}
