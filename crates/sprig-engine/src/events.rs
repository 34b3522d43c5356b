//! Event bus
//!
//! Two kinds of traffic share the bubbling model: gesture events
//! (`UiEvent`) fired at an element and handled by the nearest bound
//! ancestor, and typed notifications that bubble to the document root
//! where the engine and host observers receive them.

use sprig_dom::NodeId;

/// Index of a binding in the engine's binding table
pub(crate) type BindingId = usize;

/// Typed notification payload
#[derive(Debug, Clone)]
pub enum NotificationKind {
    /// A fetch completed and its decoded value was stored
    FetchCompleted {
        key: String,
        value: serde_json::Value,
    },
    /// A contained failure (network, status, decode)
    Error { message: String },
}

impl NotificationKind {
    /// Event type name
    pub fn name(&self) -> &'static str {
        match self {
            NotificationKind::FetchCompleted { .. } => "fetch-completed",
            NotificationKind::Error { .. } => "error",
        }
    }
}

/// A notification bubbling from an originating element to the root
#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    /// Originating element
    pub target: NodeId,
}

/// A user interaction delivered to `Engine::fire`
#[derive(Debug, Clone)]
pub struct UiEvent {
    /// Interaction name ("click", ...)
    pub name: String,
    /// Element the interaction happened on
    pub target: NodeId,
    default_prevented: bool,
}

impl UiEvent {
    pub(crate) fn new(name: &str, target: NodeId) -> Self {
        Self {
            name: name.to_string(),
            target,
            default_prevented: false,
        }
    }

    /// Suppress the interaction's default behavior (e.g. navigation)
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Check if default was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

struct Listener {
    node: NodeId,
    event: String,
    binding: BindingId,
}

/// Listener registrations and root observers
#[derive(Default)]
pub(crate) struct EventBus {
    listeners: Vec<Listener>,
    pub(crate) observers: Vec<Box<dyn FnMut(&Notification)>>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a gesture listener on an element
    pub(crate) fn add_listener(&mut self, node: NodeId, event: &str, binding: BindingId) {
        self.listeners.push(Listener {
            node,
            event: event.to_string(),
            binding,
        });
    }

    /// Bindings listening for `event` directly on `node`
    pub(crate) fn listeners_at(&self, node: NodeId, event: &str) -> Vec<BindingId> {
        self.listeners
            .iter()
            .filter(|l| l.node == node && l.event == event)
            .map(|l| l.binding)
            .collect()
    }

    /// Register a root observer for notifications
    pub(crate) fn observe(&mut self, observer: Box<dyn FnMut(&Notification)>) {
        self.observers.push(observer);
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}
