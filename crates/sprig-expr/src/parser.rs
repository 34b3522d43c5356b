//! Recursive-descent parser
//!
//! Produces a `Program`: the AST plus the ordered set of free
//! identifiers (the parameters the expression consumes).

use crate::ExprError;
use crate::eval::{self, Scope};
use crate::token::{Spanned, Token, lex};
use crate::value::Value;

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

/// Expression AST
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Ident(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

/// A compiled expression
#[derive(Debug, Clone)]
pub struct Program {
    root: Expr,
    params: Vec<String>,
}

impl Program {
    /// Compile source text into a program
    pub fn compile(src: &str) -> Result<Program, ExprError> {
        let tokens = lex(src)?;
        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.ternary()?;
        if parser.pos < parser.tokens.len() {
            return Err(ExprError::Syntax {
                pos: parser.tokens[parser.pos].pos,
                msg: "trailing input".into(),
            });
        }
        let mut params = Vec::new();
        collect_params(&root, &mut params);
        tracing::trace!("compiled expression with {} params", params.len());
        Ok(Program { root, params })
    }

    /// Free identifiers, in first-appearance order
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Evaluate against a scope of named parameter bindings
    pub fn eval(&self, scope: &Scope) -> Result<Value, ExprError> {
        eval::eval(&self.root, scope)
    }
}

fn collect_params(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Ident(name) => {
            if !out.iter().any(|p| p == name) {
                out.push(name.clone());
            }
        }
        Expr::Member(base, _) => collect_params(base, out),
        Expr::Index(base, idx) => {
            collect_params(base, out);
            collect_params(idx, out);
        }
        Expr::Unary(_, e) => collect_params(e, out),
        Expr::Binary(_, l, r) => {
            collect_params(l, out);
            collect_params(r, out);
        }
        Expr::Ternary(c, a, b) => {
            collect_params(c, out);
            collect_params(a, out);
            collect_params(b, out);
        }
        _ => {}
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn here(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |s| s.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ExprError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(ExprError::Syntax {
                pos: self.here(),
                msg: format!("expected {}", what),
            })
        }
    }

    fn ternary(&mut self) -> Result<Expr, ExprError> {
        let cond = self.or()?;
        if self.eat(&Token::Question) {
            let then = self.ternary()?;
            self.expect(Token::Colon, "':'")?;
            let alt = self.ternary()?;
            return Ok(Expr::Ternary(Box::new(cond), Box::new(then), Box::new(alt)));
        }
        Ok(cond)
    }

    fn or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.and()?;
        while self.eat(&Token::OrOr) {
            let right = self.and()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.equality()?;
        while self.eat(&Token::AndAnd) {
            let right = self.equality()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                _ => break,
            };
            self.pos += 1;
            let right = self.comparison()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let right = self.additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::Bang) {
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)));
        }
        if self.eat(&Token::Minus) {
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::Dot) {
                let name = match self.advance() {
                    Some(Token::Ident(name)) => name,
                    _ => {
                        return Err(ExprError::Syntax {
                            pos: self.here(),
                            msg: "expected property name after '.'".into(),
                        });
                    }
                };
                expr = Expr::Member(Box::new(expr), name);
            } else if self.eat(&Token::LBracket) {
                let index = self.ternary()?;
                self.expect(Token::RBracket, "']'")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let pos = self.here();
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Ident(name)) => Ok(Expr::Ident(name)),
            Some(Token::True) => Ok(Expr::Bool(true)),
            Some(Token::False) => Ok(Expr::Bool(false)),
            Some(Token::Null) => Ok(Expr::Null),
            Some(Token::Undefined) => Ok(Expr::Undefined),
            Some(Token::LParen) => {
                let inner = self.ternary()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(ExprError::Syntax {
                pos,
                msg: match other {
                    Some(t) => format!("unexpected token {:?}", t),
                    None => "unexpected end of expression".into(),
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let p = Program::compile("1 + 2 * 3 == 7").unwrap();
        assert!(p.eval(&Scope::new()).unwrap().truthy());
    }

    #[test]
    fn test_ternary_parse() {
        let p = Program::compile("true ? 'a' : 'b'").unwrap();
        assert_eq!(p.eval(&Scope::new()).unwrap(), Value::Str("a".into()));
    }

    #[test]
    fn test_member_and_index_params() {
        let p = Program::compile("todo.items[i].name").unwrap();
        assert_eq!(p.params(), ["todo", "i"]);
    }

    #[test]
    fn test_property_names_not_params() {
        let p = Program::compile("user.name + user.email").unwrap();
        assert_eq!(p.params(), ["user"]);
    }

    #[test]
    fn test_syntax_errors() {
        assert!(Program::compile("").is_err());
        assert!(Program::compile("1 +").is_err());
        assert!(Program::compile("(1 + 2").is_err());
        assert!(Program::compile("a.").is_err());
        assert!(Program::compile("1 2").is_err());
        assert!(Program::compile("a ? b").is_err());
    }
}
