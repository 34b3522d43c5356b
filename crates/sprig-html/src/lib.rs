//! Sprig HTML
//!
//! html5ever-based parsing into Sprig DOM trees: full documents and
//! detached fragments (the replacement primitives consume the latter).

mod parser;

pub use parser::{HtmlParser, parse_fragment};
