//! Portfolio event sink trait and implementations.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use log::debug;
use tokio::sync::mpsc;

use super::PortfolioEvent;

/// Trait for receiving portfolio change events.
///
/// A portfolio hands events to its sink only after releasing its lock, so an
/// implementation may read from (or mutate) the portfolio without deadlock.
///
/// # Ordering
///
/// Events within one batch are in cascade order. Batches from mutations on
/// different threads may reach the sink in either order, so a consumer that
/// tracks the latest value of a field must keep the event with the highest
/// [`PortfolioEvent::version`] rather than the last one delivered.
///
/// # Design Rules
///
/// - `emit()` must be fast and non-blocking
/// - Failure to deliver must not affect the portfolio (best-effort)
pub trait PortfolioEventSink: Send + Sync {
    /// Emit a single event.
    fn emit(&self, event: PortfolioEvent);

    /// Emit the events produced by one mutation, in order.
    ///
    /// Default implementation calls `emit()` for each event.
    fn emit_batch(&self, events: Vec<PortfolioEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// No-op implementation for contexts that don't observe changes.
#[derive(Clone, Default)]
pub struct NoOpPortfolioEventSink;

impl PortfolioEventSink for NoOpPortfolioEventSink {
    fn emit(&self, _event: PortfolioEvent) {
        // Intentionally empty - events are discarded
    }
}

/// Mock sink for testing - collects emitted events.
#[derive(Clone, Default)]
pub struct MockPortfolioEventSink {
    events: Arc<Mutex<Vec<PortfolioEvent>>>,
}

impl MockPortfolioEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    pub fn events(&self) -> Vec<PortfolioEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clears collected events.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns the number of collected events.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no events have been collected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PortfolioEventSink for MockPortfolioEventSink {
    fn emit(&self, event: PortfolioEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Forwards events to an async queue for a consumer task (UI bridge,
/// persistence writer).
pub struct ChannelPortfolioEventSink {
    tx: mpsc::UnboundedSender<PortfolioEvent>,
}

impl ChannelPortfolioEventSink {
    /// Creates the sink together with the receiving end of its queue.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PortfolioEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PortfolioEventSink for ChannelPortfolioEventSink {
    fn emit(&self, event: PortfolioEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!("Portfolio event receiver dropped; discarding {}", e.0.field_name());
        }
    }
}

type Listener = Arc<dyn Fn(&PortfolioEvent) + Send + Sync>;

/// Calls registered listeners synchronously on the emitting thread.
#[derive(Clone, Default)]
pub struct ListenerPortfolioEventSink {
    listeners: Arc<RwLock<Vec<Listener>>>,
}

impl ListenerPortfolioEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an `on_change` callback.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&PortfolioEvent) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PortfolioEventSink for ListenerPortfolioEventSink {
    fn emit(&self, event: PortfolioEvent) {
        // Snapshot the list so a listener may subscribe others while running.
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(&event);
        }
    }
}
