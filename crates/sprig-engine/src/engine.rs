//! Engine
//!
//! Owns the document, state store, vocabulary, event bus, and binding
//! table. Discovery is a single pass over the tree at mount time;
//! fetches are the only suspension points and resume through the
//! outcome channel when the host calls `run_until_idle`.

use std::sync::Arc;

use smol::LocalExecutor;
use smol::channel::{Receiver, Sender};
use sprig_dom::{Document, DomError, NodeId};
use sprig_expr::ExprError;
use sprig_net::{NetError, Response, Transport};

use crate::events::{BindingId, EventBus, Notification, NotificationKind, UiEvent};
use crate::store::StateStore;
use crate::trigger::Trigger;
use crate::vocab::{ActionKind, Vocabulary};

/// Engine errors
///
/// Contained failures (network, status, decode) never surface here;
/// they become error notifications. What does surface is authoring
/// errors: broken expressions and replacement targets that match
/// nothing.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("expression error: {0}")]
    Expr(#[from] ExprError),

    #[error("replacement target matched nothing: {0}")]
    TargetNotFound(String),

    #[error("dom error: {0}")]
    Dom(#[from] DomError),
}

/// Engine construction parameters
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Attribute prefix for the vocabulary
    pub prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefix: "sg-".to_string(),
        }
    }
}

/// One discovered element: its action and resolved trigger
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) node: NodeId,
    pub(crate) action: ActionKind,
    #[allow(dead_code)]
    pub(crate) trigger: Trigger,
}

/// A completed fetch, ready to be applied
pub(crate) struct FetchOutcome {
    pub(crate) node: NodeId,
    pub(crate) key: Option<String>,
    pub(crate) target: Option<String>,
    pub(crate) result: Result<Response, NetError>,
}

/// The dispatch-and-reactivity engine
pub struct Engine {
    pub(crate) doc: Document,
    pub(crate) store: StateStore,
    pub(crate) vocab: Vocabulary,
    pub(crate) bus: EventBus,
    pub(crate) bindings: Vec<Binding>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) executor: LocalExecutor<'static>,
    pub(crate) outcome_tx: Sender<FetchOutcome>,
    outcome_rx: Receiver<FetchOutcome>,
    pub(crate) in_flight: usize,
    mounted: bool,
    mount_deferred: bool,
}

impl Engine {
    /// Create an engine for a document
    pub fn new(config: EngineConfig, doc: Document, transport: Arc<dyn Transport>) -> Self {
        let (outcome_tx, outcome_rx) = smol::channel::unbounded();
        Self {
            doc,
            store: StateStore::new(),
            vocab: Vocabulary::new(&config.prefix),
            bus: EventBus::new(),
            bindings: Vec::new(),
            transport,
            executor: LocalExecutor::new(),
            outcome_tx,
            outcome_rx,
            in_flight: 0,
            mounted: false,
            mount_deferred: false,
        }
    }

    /// Discover and bind every actionable element
    ///
    /// Runs immediately if the document is ready, otherwise defers
    /// until `document_ready`. The scan happens at most once per
    /// engine; elements inserted later are never bound automatically
    /// (use `bind_subtree` to opt in).
    pub fn mount(&mut self) -> Result<(), EngineError> {
        if self.mounted {
            return Ok(());
        }
        if !self.doc.is_ready() {
            tracing::debug!("document still loading, deferring bind");
            self.mount_deferred = true;
            return Ok(());
        }
        self.mounted = true;
        let root = self.doc.tree().root();
        self.scan(root)
    }

    /// Signal that the host finished building the document
    pub fn document_ready(&mut self) -> Result<(), EngineError> {
        self.doc.set_ready();
        if self.mount_deferred && !self.mounted {
            self.mount_deferred = false;
            self.mount()
        } else {
            Ok(())
        }
    }

    /// Bind actionable elements within a subtree
    ///
    /// For hosts that insert markup after mount and want it live.
    pub fn bind_subtree(&mut self, node: NodeId) -> Result<(), EngineError> {
        self.scan(node)
    }

    fn scan(&mut self, from: NodeId) -> Result<(), EngineError> {
        let matches: Vec<(NodeId, ActionKind)> = {
            let tree = self.doc.tree();
            std::iter::once(from)
                .chain(tree.descendants(from))
                .filter(|&id| tree.get(id).is_some_and(|n| n.is_element()))
                .filter_map(|id| self.vocab.action_for(tree, id).map(|kind| (id, kind)))
                .collect()
        };
        tracing::debug!("bound {} actionable elements", matches.len());

        let trigger_attr = self.vocab.attr("trigger");
        for (node, action) in matches {
            let explicit = self
                .doc
                .tree()
                .get_attribute(node, &trigger_attr)
                .map(str::to_string);
            let trigger = Trigger::resolve(explicit.as_deref(), action);
            let id: BindingId = self.bindings.len();
            self.bindings.push(Binding {
                node,
                action,
                trigger: trigger.clone(),
            });
            match trigger {
                // Load actions run here, in document order.
                Trigger::Load => self.run_action(id)?,
                Trigger::Event(name) => self.bus.add_listener(node, &name, id),
            }
        }
        Ok(())
    }

    /// Deliver a user interaction to an element
    ///
    /// Bubbles from the element to the root; every bound listener along
    /// the path runs, innermost first, after marking the interaction's
    /// default behavior as prevented.
    pub fn fire(&mut self, node: NodeId, event: &str) -> Result<UiEvent, EngineError> {
        let mut ui = UiEvent::new(event, node);
        let mut chain = Vec::new();
        let mut cur = node;
        while cur.is_valid() {
            chain.push(cur);
            cur = self.doc.tree().parent(cur);
        }
        for ancestor in chain {
            for binding in self.bus.listeners_at(ancestor, event) {
                ui.prevent_default();
                self.run_action(binding)?;
            }
        }
        Ok(ui)
    }

    /// Drive in-flight fetches to completion and apply their outcomes
    ///
    /// Outcomes are applied in completion order, whatever order the
    /// transport futures finish in. Blocks until nothing is in flight;
    /// a fetch that never resolves never returns control.
    pub fn run_until_idle(&mut self) -> Result<(), EngineError> {
        while self.in_flight > 0 {
            let outcome = smol::block_on(self.executor.run(self.outcome_rx.recv()));
            let Ok(outcome) = outcome else {
                break;
            };
            self.in_flight -= 1;
            self.apply_outcome(outcome)?;
        }
        Ok(())
    }

    /// Subscribe to notifications at the document root
    ///
    /// Observers run after the engine's own root handling, so by the
    /// time one sees a fetch-completed notification every dependent
    /// element has been refreshed.
    pub fn observe(&mut self, observer: impl FnMut(&Notification) + 'static) {
        self.bus.observe(Box::new(observer));
    }

    /// Write a value into the state store
    ///
    /// Behaves like a fetch result landing: dependents are refreshed
    /// and a fetch-completed notification is delivered.
    pub fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), EngineError> {
        self.store.set_value(key, value.clone());
        let root = self.doc.tree().root();
        self.emit(Notification {
            kind: NotificationKind::FetchCompleted {
                key: key.to_string(),
                value,
            },
            target: root,
        })
    }

    /// Read the latest value for a store key
    pub fn get_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.store.get_value(key)
    }

    /// The state store
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// The document
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The document, mutably
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Deliver a notification: root handling first, then observers
    pub(crate) fn emit(&mut self, notification: Notification) -> Result<(), EngineError> {
        tracing::debug!(
            "notification '{}' bubbling from {:?}",
            notification.kind.name(),
            notification.target
        );
        match &notification.kind {
            NotificationKind::FetchCompleted { key, .. } => {
                let key = key.clone();
                self.refresh_dependents(&key)?;
            }
            NotificationKind::Error { message } => {
                tracing::warn!("sprig: {}", message);
            }
        }
        for observer in self.bus.observers.iter_mut() {
            observer(&notification);
        }
        Ok(())
    }

    pub(crate) fn emit_error(&mut self, node: NodeId, message: String) -> Result<(), EngineError> {
        self.emit(Notification {
            kind: NotificationKind::Error { message },
            target: node,
        })
    }

    /// Whether a node is still reachable from the document root
    pub(crate) fn is_attached(&self, node: NodeId) -> bool {
        self.doc
            .tree()
            .is_ancestor_or_self(self.doc.tree().root(), node)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("bindings", &self.bindings.len())
            .field("in_flight", &self.in_flight)
            .field("mounted", &self.mounted)
            .finish()
    }
}
