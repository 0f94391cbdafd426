//! Generation-checked registry for notification handlers
//!
//! Signalling engines deliver notifications from their own threads, possibly
//! after the conference they belong to has been torn down. Handlers are
//! therefore never handed out as raw pointers: the registry stores them in an
//! arena and hands out an [`AgentToken`] carrying the slot index plus a
//! generation counter. A token whose generation no longer matches its slot is
//! stale and its delivery is silently dropped.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::signaling::engine::SignallingNotification;

/// Handler invoked for each notification delivered to a live token
pub type NotificationHandler = Arc<dyn Fn(SignallingNotification) + Send + Sync>;

/// Opaque ticket identifying a registered notification handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentToken {
    index: usize,
    generation: u64,
}

struct Slot {
    generation: u64,
    handler: Option<NotificationHandler>,
}

/// Arena of notification handlers keyed by generation-checked tokens
#[derive(Default)]
pub struct AgentRegistry {
    slots: Mutex<Vec<Slot>>,
}

impl AgentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler and return its token
    ///
    /// Free slots are reused; their generation is bumped on reuse so tokens
    /// from a previous occupant never alias the new one.
    pub fn register(&self, handler: NotificationHandler) -> AgentToken {
        let mut slots = self.slots.lock();
        if let Some(index) = slots.iter().position(|s| s.handler.is_none()) {
            let slot = &mut slots[index];
            slot.generation += 1;
            slot.handler = Some(handler);
            let token = AgentToken {
                index,
                generation: slot.generation,
            };
            trace!(index, generation = token.generation, "Reused handler slot");
            token
        } else {
            let index = slots.len();
            slots.push(Slot {
                generation: 0,
                handler: Some(handler),
            });
            trace!(index, "Allocated handler slot");
            AgentToken {
                index,
                generation: 0,
            }
        }
    }

    /// Invalidate a token, dropping its handler
    ///
    /// Idempotent: unregistering a stale or already-removed token is a no-op.
    pub fn unregister(&self, token: AgentToken) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(token.index) {
            if slot.generation == token.generation && slot.handler.is_some() {
                slot.handler = None;
                slot.generation += 1;
                debug!(index = token.index, "Unregistered notification handler");
            }
        }
    }

    /// Deliver a notification to the handler behind `token`
    ///
    /// Returns `false` without side effects when the token is stale. The
    /// registry lock is not held across the handler call.
    pub fn deliver(&self, token: AgentToken, notification: SignallingNotification) -> bool {
        let handler = {
            let slots = self.slots.lock();
            match slots.get(token.index) {
                Some(slot) if slot.generation == token.generation => slot.handler.clone(),
                _ => None,
            }
        };
        match handler {
            Some(handler) => {
                handler(notification);
                true
            }
            None => {
                trace!(index = token.index, "Dropped notification for stale token");
                false
            }
        }
    }
}

/// Clonable delivery endpoint handed to signalling engines
///
/// Pairs a registry with one token. Engines hold sinks for as long as they
/// like; once the token is unregistered every later delivery is rejected.
#[derive(Clone)]
pub struct NotificationSink {
    registry: Arc<AgentRegistry>,
    token: AgentToken,
}

impl NotificationSink {
    /// Bind a sink to a registered token
    pub fn new(registry: Arc<AgentRegistry>, token: AgentToken) -> Self {
        Self { registry, token }
    }

    /// Deliver a notification; returns `false` if the token is stale
    pub fn deliver(&self, notification: SignallingNotification) -> bool {
        self.registry.deliver(self.token, notification)
    }
}
