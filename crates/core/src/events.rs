//! Event System
//! 
//! Pub/sub event bus connecting the engine to the surrounding UI: toasts,
//! status bar, outline sidebar and toolbar all listen here.

use parking_lot::RwLock;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

use crate::document::{DocumentStats, OutlineEntry};
use crate::error::NotifyLevel;

/// Direction of a history step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

/// Save indicator shown in the status bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Typing,
}

/// Active formatting at the current selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolbarState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub ordered_list: bool,
    pub unordered_list: bool,
    pub justify_left: bool,
    pub justify_center: bool,
    pub justify_right: bool,
    pub justify_full: bool,
    pub in_blockquote: bool,
}

/// Events emitted by the editor engine
#[derive(Debug, Clone)]
pub enum Event {
    /// Startup load finished; `restored` is false for a fresh document
    DocumentLoaded { restored: bool },
    /// Content or title changed and is not yet saved
    DocumentChanged,
    /// Document persisted
    DocumentSaved { manual: bool },
    /// Save indicator changed
    SaveStatus(SaveStatus),
    /// Undo or redo applied a snapshot
    HistoryApplied(HistoryDirection),
    /// Statistics recomputed
    StatsUpdated(DocumentStats),
    /// Outline regenerated
    OutlineUpdated(Vec<OutlineEntry>),
    /// Toolbar active states refreshed
    ToolbarUpdated(ToolbarState),
    /// View zoom changed
    ZoomChanged(u16),
    /// A file was imported
    Imported { file_name: String },
    /// An export artifact was produced
    Exported { format: String, filename: String },
    /// Transient user notification (toast)
    Notification { level: NotifyLevel, message: String },
    /// Application shutdown
    Shutdown,
}

/// Subscriber handle for receiving events
#[derive(Clone)]
pub struct EventSubscription {
    receiver: Receiver<Event>,
}

impl EventSubscription {
    /// Receive the next event (blocking)
    pub fn recv(&self) -> Result<Event, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv(&self) -> Result<Event, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drain every pending event
    pub fn drain(&self) -> Vec<Event> {
        self.receiver.try_iter().collect()
    }
}

/// Event bus for publish/subscribe pattern
pub struct EventBus {
    subscribers: RwLock<Vec<Sender<Event>>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> EventSubscription {
        let (sender, receiver) = unbounded();
        self.subscribers.write().push(sender);
        EventSubscription { receiver }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: Event) -> usize {
        let subscribers = self.subscribers.read();
        let mut delivered = 0;
        
        for sender in subscribers.iter() {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        
        debug!("Event {:?} delivered to {} subscribers", event, delivered);
        delivered
    }

    /// Emit a toast notification
    pub fn notify(&self, level: NotifyLevel, message: impl Into<String>) -> usize {
        self.emit(Event::Notification {
            level,
            message: message.into(),
        })
    }

    /// Get the number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus() {
        let bus = EventBus::new();
        let sub1 = bus.subscribe();
        let sub2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        let delivered = bus.emit(Event::DocumentChanged);
        assert_eq!(delivered, 2);

        assert!(sub1.try_recv().is_ok());
        assert!(sub2.try_recv().is_ok());
    }

    #[test]
    fn test_notify_and_drain() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        bus.notify(NotifyLevel::Warning, "Please enter a valid link");
        bus.emit(Event::ZoomChanged(110));

        let events = sub.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            Event::Notification { level: NotifyLevel::Warning, message } if message == "Please enter a valid link"
        ));
    }
}
