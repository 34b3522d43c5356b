//! Sprig expression language
//!
//! Attribute strings ("render this", "if this") are compiled into small
//! programs and evaluated against an explicit set of named parameters —
//! never handed to a host-language eval. A `Program` exposes its free
//! identifiers so callers know exactly which parameters it consumes.
//!
//! Pipeline: lexer → recursive-descent parser → AST → tree-walking
//! evaluator over a `Scope`.

mod eval;
mod parser;
mod token;
mod value;

pub use eval::Scope;
pub use parser::Program;
pub use value::Value;

/// Expression errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExprError {
    /// Malformed source text
    #[error("syntax error at {pos}: {msg}")]
    Syntax { pos: usize, msg: String },

    /// Operation applied to an unsupported value
    #[error("type error: {0}")]
    Type(String),
}

/// Compile an expression source string
pub fn compile(src: &str) -> Result<Program, ExprError> {
    Program::compile(src)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_and_eval() {
        let program = compile("1 + 2 * 3").unwrap();
        let result = program.eval(&Scope::new()).unwrap();
        assert!(matches!(result, Value::Number(n) if (n - 7.0).abs() < 1e-9));
    }

    #[test]
    fn test_params_enumerated() {
        let program = compile("todo.items.length > limit").unwrap();
        assert_eq!(program.params(), ["todo", "limit"]);
    }
}
