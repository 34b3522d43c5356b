//! Action handlers
//!
//! One entry point per action kind, plus the fetch completion path and
//! the dependency refresh that runs after every store write. Handlers
//! mutate the document directly; fetch handlers only issue the request
//! and finish later through `apply_outcome`.

use sprig_dom::{NodeId, Selector};
use sprig_expr::{Program, Scope, Value};
use sprig_net::{Decoded, Method, Request};

use crate::engine::{Engine, EngineError, FetchOutcome};
use crate::events::{BindingId, Notification, NotificationKind};
use crate::vocab::ActionKind;

impl Engine {
    /// Run the action behind a binding
    pub(crate) fn run_action(&mut self, binding: BindingId) -> Result<(), EngineError> {
        let (node, action) = {
            let b = &self.bindings[binding];
            (b.node, b.action)
        };
        // A conditional earlier in the pass may have pruned this node.
        if !self.is_attached(node) {
            tracing::debug!("skipping action on detached node {:?}", node);
            return Ok(());
        }
        match action {
            ActionKind::Get => self.issue_fetch(node, Method::Get),
            ActionKind::Post => self.issue_fetch(node, Method::Post),
            ActionKind::If => self.handle_if(node),
            ActionKind::Render => self.handle_render(node),
            ActionKind::Data => self.handle_data(node),
        }
    }

    /// Start a fetch for an element's URL attribute
    ///
    /// The request runs on the engine's executor; the outcome comes
    /// back through the channel during `run_until_idle`.
    fn issue_fetch(&mut self, node: NodeId, method: Method) -> Result<(), EngineError> {
        let url_attr = match method {
            Method::Get => self.vocab.attr("get"),
            Method::Post => self.vocab.attr("post"),
        };
        let url = self
            .doc
            .tree()
            .get_attribute(node, &url_attr)
            .map(str::to_string);
        let Some(url) = url else {
            return self.emit_error(node, format!("missing URL in {}", url_attr));
        };
        let key = self
            .doc
            .tree()
            .get_attribute(node, &self.vocab.attr("data-key"))
            .map(str::to_string);
        let target = self
            .doc
            .tree()
            .get_attribute(node, &self.vocab.attr("target"))
            .map(str::to_string);

        let request = match method {
            Method::Get => Request::get(&url),
            Method::Post => {
                let form = self.collect_form_data(node);
                Request::post(&url).with_json(&form.to_string())
            }
        };
        tracing::info!("dispatching {} {}", request.method.as_str(), url);

        let future = self.transport.send(request);
        let tx = self.outcome_tx.clone();
        self.in_flight += 1;
        self.executor
            .spawn(async move {
                let result = future.await;
                let _ = tx
                    .send(FetchOutcome {
                        node,
                        key,
                        target,
                        result,
                    })
                    .await;
            })
            .detach();
        Ok(())
    }

    /// Gather named form control values under an element
    ///
    /// Every input, textarea, or select with a name contributes its
    /// value attribute (empty string when absent).
    pub(crate) fn collect_form_data(&self, node: NodeId) -> serde_json::Value {
        let tree = self.doc.tree();
        let mut map = serde_json::Map::new();
        for desc in std::iter::once(node).chain(tree.descendants(node)) {
            let Some(elem) = tree.get(desc).and_then(|n| n.as_element()) else {
                continue;
            };
            if !matches!(elem.tag.as_str(), "input" | "textarea" | "select") {
                continue;
            }
            let Some(name) = elem.get_attr("name") else {
                continue;
            };
            let value = elem.get_attr("value").unwrap_or("");
            map.insert(
                name.to_string(),
                serde_json::Value::String(value.to_string()),
            );
        }
        serde_json::Value::Object(map)
    }

    /// Apply a completed fetch
    ///
    /// Transport, status, and decode failures are contained: they
    /// become error notifications and leave the store and document
    /// untouched. A configured target that matches nothing is an
    /// authoring error and propagates.
    pub(crate) fn apply_outcome(&mut self, outcome: FetchOutcome) -> Result<(), EngineError> {
        let FetchOutcome {
            node,
            key,
            target,
            result,
        } = outcome;

        let response = match result {
            Ok(r) => r,
            Err(err) => return self.emit_error(node, format!("request failed: {err}")),
        };
        if !response.ok() {
            return self.emit_error(node, format!("request failed: HTTP {}", response.status));
        }
        let decoded = match Decoded::from_response(&response) {
            Ok(d) => d,
            Err(err) => return self.emit_error(node, format!("decode failed: {err}")),
        };

        if let Some(key) = key {
            let value = match &decoded {
                Decoded::Json(v) => v.clone(),
                Decoded::Text(s) => serde_json::Value::String(s.clone()),
            };
            self.store.set_value(&key, value.clone());
            self.emit(Notification {
                kind: NotificationKind::FetchCompleted { key, value },
                target: node,
            })?;
        }
        if let Some(selector) = target {
            self.replace_target(&selector, &decoded)?;
        }
        Ok(())
    }

    /// Inject a decoded body into the first element matching a selector
    fn replace_target(&mut self, selector: &str, decoded: &Decoded) -> Result<(), EngineError> {
        let found = Selector::parse(selector).and_then(|sel| self.doc.tree().query_selector(&sel));
        let Some(target) = found else {
            return Err(EngineError::TargetNotFound(selector.to_string()));
        };
        let tree = self.doc.tree_mut();
        match decoded {
            Decoded::Text(markup) => {
                let frag = sprig_html::parse_fragment(tree, markup);
                tree.set_contents(target, &frag)?;
            }
            Decoded::Json(value) => {
                tree.set_text_contents(target, &value.to_string())?;
            }
        }
        Ok(())
    }

    /// Re-run every element whose output depends on a store key
    ///
    /// Data projections match when their reference is the key itself or
    /// a property path under it. Render expressions match when the key
    /// appears among their free identifiers.
    pub(crate) fn refresh_dependents(&mut self, key: &str) -> Result<(), EngineError> {
        let data_attr = self.vocab.attr("data");
        let dotted = format!("{key}.");

        let mut data_nodes = Vec::new();
        let mut render_nodes = Vec::new();
        {
            let tree = self.doc.tree();
            for node in tree.elements() {
                // The bound action (first match in enumeration order)
                // decides which handler refreshes, same as dispatch.
                match self.vocab.action_for(tree, node) {
                    Some(ActionKind::Data) => {
                        if let Some(reference) = tree.get_attribute(node, &data_attr) {
                            if reference == key || reference.starts_with(&dotted) {
                                data_nodes.push(node);
                            }
                        }
                    }
                    Some(ActionKind::Render) => {
                        if let Some(src) = self.vocab.action_value(tree, node, ActionKind::Render)
                        {
                            let program = Program::compile(src)?;
                            if program.params().iter().any(|p| p == key) {
                                render_nodes.push(node);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        tracing::debug!(
            "'{}' updated: {} data nodes, {} render nodes",
            key,
            data_nodes.len(),
            render_nodes.len()
        );

        for node in data_nodes {
            self.handle_data(node)?;
        }
        for node in render_nodes {
            self.handle_render(node)?;
        }
        Ok(())
    }

    /// Evaluate a render expression and inject its result
    ///
    /// Free identifiers resolve against the store; unset keys evaluate
    /// as undefined inside the expression.
    pub(crate) fn handle_render(&mut self, node: NodeId) -> Result<(), EngineError> {
        let src = self
            .vocab
            .action_value(self.doc.tree(), node, ActionKind::Render)
            .map(str::to_string);
        let Some(src) = src else {
            return Ok(());
        };

        let program = Program::compile(&src)?;
        let mut scope = Scope::new();
        for param in program.params() {
            if let Some(value) = self.store.get_value(param) {
                scope.bind(param, Value::from(value.clone()));
            }
        }
        let markup = program.eval(&scope)?.render();

        let tree = self.doc.tree_mut();
        let frag = sprig_html::parse_fragment(tree, &markup);
        tree.set_contents(node, &frag)?;
        Ok(())
    }

    /// Evaluate a condition and prune the losing branch
    ///
    /// Falsy removes the element itself; truthy removes the nearest
    /// following sibling carrying the else attribute, if any.
    pub(crate) fn handle_if(&mut self, node: NodeId) -> Result<(), EngineError> {
        let src = self
            .doc
            .tree()
            .get_attribute(node, &self.vocab.attr("if"))
            .map(str::to_string);
        let Some(src) = src else {
            return Ok(());
        };

        let keep = Program::compile(&src)?.eval(&Scope::new())?.truthy();
        let else_attr = self.vocab.attr("else");
        let tree = self.doc.tree_mut();
        if keep {
            if let Some(alternative) = tree.following_sibling_with_attribute(node, &else_attr) {
                tree.detach(alternative)?;
            }
        } else {
            tree.detach(node)?;
        }
        Ok(())
    }

    /// Project a stored value (or one property of it) into an element
    ///
    /// The reference is `key` or `key.property`; anything after a
    /// second dot is ignored. An unset key or absent property clears
    /// the element.
    pub(crate) fn handle_data(&mut self, node: NodeId) -> Result<(), EngineError> {
        let reference = self
            .doc
            .tree()
            .get_attribute(node, &self.vocab.attr("data"))
            .map(str::to_string);
        let Some(reference) = reference else {
            return Ok(());
        };

        let mut parts = reference.splitn(3, '.');
        let key = parts.next().unwrap_or("");
        let property = parts.next();

        let projected = match self.store.get_value(key) {
            None => Value::Undefined,
            Some(stored) => {
                let value = Value::from(stored.clone());
                match property {
                    None => value,
                    Some(name) => match value {
                        // Undefined-safe: a hole projects as empty.
                        Value::Undefined | Value::Null => Value::Undefined,
                        other => other.member(name).unwrap_or(Value::Undefined),
                    },
                }
            }
        };
        let markup = projected.render();

        let tree = self.doc.tree_mut();
        let frag = sprig_html::parse_fragment(tree, &markup);
        tree.set_contents(node, &frag)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sprig_html::HtmlParser;
    use sprig_net::{Response, Transport, TransportFuture};

    use crate::engine::{Engine, EngineConfig};

    struct NullTransport;

    impl Transport for NullTransport {
        fn send(&self, _request: Request) -> TransportFuture {
            Box::pin(async {
                Ok(Response {
                    status: 200,
                    headers: vec![],
                    body: Vec::new(),
                })
            })
        }
    }

    use super::*;

    fn engine_for(html: &str) -> Engine {
        let doc = HtmlParser::new().parse(html);
        Engine::new(EngineConfig::default(), doc, Arc::new(NullTransport))
    }

    #[test]
    fn test_collect_form_data() {
        let engine = engine_for(
            "<body><form id=\"f\">\
             <input name=\"title\" value=\"milk\">\
             <input value=\"ignored\">\
             <textarea name=\"notes\"></textarea>\
             </form></body>",
        );
        let form = engine.doc.get_element_by_id("f").unwrap();
        let data = engine.collect_form_data(form);
        assert_eq!(
            data,
            serde_json::json!({"title": "milk", "notes": ""})
        );
    }

    #[test]
    fn test_data_projection_unset_key_clears() {
        let mut engine = engine_for("<body><span id=\"out\" sg-data=\"user.name\">old</span></body>");
        engine.mount().unwrap();
        let out = engine.doc.get_element_by_id("out").unwrap();
        assert_eq!(engine.doc.tree().text_content(out), "");
    }

    #[test]
    fn test_data_projection_whole_value() {
        let mut engine = engine_for("<body><span id=\"out\" sg-data=\"greeting\"></span></body>");
        engine.mount().unwrap();
        engine
            .set_value("greeting", serde_json::json!("hello"))
            .unwrap();
        let out = engine.doc.get_element_by_id("out").unwrap();
        assert_eq!(engine.doc.tree().text_content(out), "hello");
    }

    #[test]
    fn test_data_projection_is_idempotent() {
        let mut engine = engine_for("<body><span id=\"out\" sg-data=\"user.name\"></span></body>");
        engine.mount().unwrap();
        engine
            .set_value("user", serde_json::json!({"name": "ada"}))
            .unwrap();
        let out = engine.doc.get_element_by_id("out").unwrap();
        assert_eq!(engine.doc.tree().text_content(out), "ada");

        engine.handle_data(out).unwrap();
        assert_eq!(engine.doc.tree().text_content(out), "ada");
        assert_eq!(engine.doc.tree().children(out).count(), 1);
    }

    #[test]
    fn test_data_projection_ignores_third_segment() {
        let mut engine = engine_for("<body><span id=\"out\" sg-data=\"user.name.extra\"></span></body>");
        engine.mount().unwrap();
        engine
            .set_value("user", serde_json::json!({"name": "ada"}))
            .unwrap();
        let out = engine.doc.get_element_by_id("out").unwrap();
        assert_eq!(engine.doc.tree().text_content(out), "ada");
    }

    #[test]
    fn test_refresh_follows_bound_action_order() {
        // render comes before data in the action order, so an element
        // carrying both refreshes through its render expression.
        let mut engine = engine_for(
            "<body><span id=\"out\" sg-render=\"'R:' + user.name\" sg-data=\"user\" sg-trigger=\"never\"></span></body>",
        );
        engine.mount().unwrap();
        engine
            .set_value("user", serde_json::json!({"name": "ada"}))
            .unwrap();

        let out = engine.doc.get_element_by_id("out").unwrap();
        assert_eq!(engine.doc.tree().text_content(out), "R:ada");
    }

    #[test]
    fn test_if_prunes_false_branch() {
        let mut engine = engine_for(
            "<body>\
             <div id=\"yes\" sg-if=\"1 == 1\">shown</div>\
             <div id=\"no\" sg-else>hidden</div>\
             </body>",
        );
        let yes = engine.doc.get_element_by_id("yes").unwrap();
        let no = engine.doc.get_element_by_id("no").unwrap();
        engine.mount().unwrap();

        assert!(engine.is_attached(yes));
        assert!(!engine.is_attached(no));
    }

    #[test]
    fn test_if_prunes_self_when_falsy() {
        let mut engine = engine_for(
            "<body>\
             <div id=\"yes\" sg-if=\"false\">shown</div>\
             <div id=\"no\" sg-else>hidden</div>\
             </body>",
        );
        let yes = engine.doc.get_element_by_id("yes").unwrap();
        let no = engine.doc.get_element_by_id("no").unwrap();
        engine.mount().unwrap();

        assert!(!engine.is_attached(yes));
        assert!(engine.is_attached(no));
    }

    #[test]
    fn test_if_without_else_is_fine() {
        let mut engine = engine_for("<body><div id=\"x\" sg-if=\"true\">shown</div></body>");
        engine.mount().unwrap();
        let x = engine.doc.get_element_by_id("x").unwrap();
        assert!(engine.is_attached(x));
    }

    #[test]
    fn test_render_injects_markup() {
        let mut engine = engine_for(
            "<body><div id=\"out\" sg-render=\"'<b>' + name + '</b>'\" sg-trigger=\"click\"></div></body>",
        );
        engine.mount().unwrap();
        engine.set_value("name", serde_json::json!("ada")).unwrap();

        let out = engine.doc.get_element_by_id("out").unwrap();
        engine.fire(out, "click").unwrap();
        assert_eq!(engine.doc.tree().text_content(out), "ada");
        let b = engine.doc.tree().children(out).next().unwrap();
        assert_eq!(
            engine.doc.tree().get(b).unwrap().as_element().unwrap().tag,
            "b"
        );
    }

    #[test]
    fn test_render_error_propagates() {
        let mut engine = engine_for("<body><div sg-render=\"1 +\"></div></body>");
        assert!(matches!(engine.mount(), Err(EngineError::Expr(_))));
    }

    #[test]
    fn test_pruned_branch_actions_are_skipped() {
        // The data projection inside the pruned branch must not run.
        let mut engine = engine_for(
            "<body>\
             <div sg-if=\"false\"><span id=\"in\" sg-data=\"x\">keep</span></div>\
             </body>",
        );
        let inner = engine.doc.get_element_by_id("in").unwrap();
        engine.mount().unwrap();
        // Still holds its original text: the projection never cleared it.
        assert_eq!(engine.doc.tree().text_content(inner), "keep");
    }
}
