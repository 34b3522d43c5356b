//! Tree-walking evaluator

use std::collections::HashMap;

use crate::ExprError;
use crate::parser::{BinaryOp, Expr, UnaryOp};
use crate::value::Value;

/// Named parameter bindings for one evaluation
///
/// An identifier absent from the scope evaluates to `undefined`; a
/// subsequent property read through it is the error the author sees.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a parameter name to a value
    pub fn bind(&mut self, name: &str, value: Value) -> &mut Self {
        self.vars.insert(name.to_string(), value);
        self
    }

    /// Look up a binding
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

pub(crate) fn eval(expr: &Expr, scope: &Scope) -> Result<Value, ExprError> {
    match expr {
        Expr::Undefined => Ok(Value::Undefined),
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Ident(name) => Ok(scope.get(name).cloned().unwrap_or(Value::Undefined)),
        Expr::Member(base, name) => eval(base, scope)?.member(name),
        Expr::Index(base, index) => {
            let base = eval(base, scope)?;
            let index = eval(index, scope)?;
            base.index(&index)
        }
        Expr::Unary(op, inner) => {
            let v = eval(inner, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!v.truthy())),
                UnaryOp::Neg => match v {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    other => Err(ExprError::Type(format!("cannot negate {}", other.kind()))),
                },
            }
        }
        Expr::Binary(op, left, right) => eval_binary(*op, left, right, scope),
        Expr::Ternary(cond, then, alt) => {
            if eval(cond, scope)?.truthy() {
                eval(then, scope)
            } else {
                eval(alt, scope)
            }
        }
    }
}

fn eval_binary(op: BinaryOp, left: &Expr, right: &Expr, scope: &Scope) -> Result<Value, ExprError> {
    // Short-circuit forms return the deciding operand, JS-style.
    match op {
        BinaryOp::Or => {
            let l = eval(left, scope)?;
            return if l.truthy() { Ok(l) } else { eval(right, scope) };
        }
        BinaryOp::And => {
            let l = eval(left, scope)?;
            return if l.truthy() { eval(right, scope) } else { Ok(l) };
        }
        _ => {}
    }

    let l = eval(left, scope)?;
    let r = eval(right, scope)?;

    match op {
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&l, &r))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(&l, &r))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (&l, &r) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                _ => None,
            };
            let Some(ordering) = ordering else {
                return Err(ExprError::Type(format!(
                    "cannot compare {} with {}",
                    l.kind(),
                    r.kind()
                )));
            };
            let result = match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Add => match (&l, &r) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Ok(Value::Str(format!("{}{}", l.render(), r.render())))
            }
            _ => Err(ExprError::Type(format!(
                "cannot add {} and {}",
                l.kind(),
                r.kind()
            ))),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => match (&l, &r) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(match op {
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                _ => a / b,
            })),
            _ => Err(ExprError::Type(format!(
                "arithmetic needs numbers, got {} and {}",
                l.kind(),
                r.kind()
            ))),
        },
        BinaryOp::Or | BinaryOp::And => unreachable!(),
    }
}

fn values_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        // null and undefined compare equal to each other, like JS `==`.
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        _ => l == r,
    }
}
