//! Sprig engine
//!
//! The dispatch-and-reactivity core: discovers elements carrying
//! recognized `sg-*` attributes, binds each to a trigger and an action
//! handler, and propagates fetch results to every dependent element
//! through a bubbling notification observed at the document root.
//!
//! All engine state (vocabulary, state store, event bus, bindings) is
//! owned by an explicitly constructed `Engine`; there are no
//! process-wide registries.

mod engine;
mod events;
mod handlers;
mod store;
mod trigger;
mod vocab;

pub use engine::{Engine, EngineConfig, EngineError};
pub use events::{Notification, NotificationKind, UiEvent};
pub use store::StateStore;
pub use trigger::Trigger;
pub use vocab::{ActionKind, Vocabulary};
