//! Sprig - Command-line driver
//!
//! Parses an HTML file, mounts the engine over it, drives every fetch
//! to completion, and prints the resulting document. Useful for
//! smoke-testing pages and for running Sprig markup outside a browser
//! shell.

use std::sync::Arc;

use anyhow::Context;
use sprig_dom::{Document, NodeId};
use sprig_engine::{Engine, EngineConfig, NotificationKind};
use sprig_html::HtmlParser;
use sprig_net::HttpTransport;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: sprig <page.html>")?;
    tracing::info!("loading {}", path);

    let html = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path))?;
    let doc = HtmlParser::new().parse_with_url(&html, &format!("file://{}", path));

    let mut engine = Engine::new(EngineConfig::default(), doc, Arc::new(HttpTransport::new()));
    engine.observe(|n| {
        if let NotificationKind::Error { message } = &n.kind {
            tracing::error!("{}", message);
        }
    });

    engine.mount()?;
    engine.run_until_idle()?;

    let mut out = String::new();
    serialize(engine.document(), engine.document().tree().root(), &mut out);
    println!("{}", out);
    Ok(())
}

/// Serialize a subtree back to markup
fn serialize(doc: &Document, node: NodeId, out: &mut String) {
    let tree = doc.tree();
    let Some(n) = tree.get(node) else {
        return;
    };
    if let Some(elem) = n.as_element() {
        out.push('<');
        out.push_str(&elem.tag);
        for attr in &elem.attrs {
            out.push(' ');
            out.push_str(&attr.name);
            out.push_str("=\"");
            out.push_str(&attr.value);
            out.push('"');
        }
        out.push('>');
        for child in tree.children(node) {
            serialize(doc, child, out);
        }
        out.push_str("</");
        out.push_str(&elem.tag);
        out.push('>');
        return;
    }
    if let Some(text) = n.as_text() {
        out.push_str(text);
        return;
    }
    // Document root and comments: children only.
    for child in tree.children(node) {
        serialize(doc, child, out);
    }
}
