//! Lexer for the attribute expression language

use crate::ExprError;

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    Undefined,
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Question,
    Colon,
    Dot,
    LBracket,
    RBracket,
    LParen,
    RParen,
}

/// A token with its source position
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: usize,
}

/// Tokenize an expression source string
pub fn lex(src: &str) -> Result<Vec<Spanned>, ExprError> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let c = bytes[i] as char;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let token = match c {
            '+' => {
                i += 1;
                Token::Plus
            }
            '-' => {
                i += 1;
                Token::Minus
            }
            '*' => {
                i += 1;
                Token::Star
            }
            '/' => {
                i += 1;
                Token::Slash
            }
            '?' => {
                i += 1;
                Token::Question
            }
            ':' => {
                i += 1;
                Token::Colon
            }
            '.' => {
                i += 1;
                Token::Dot
            }
            '(' => {
                i += 1;
                Token::LParen
            }
            ')' => {
                i += 1;
                Token::RParen
            }
            '[' => {
                i += 1;
                Token::LBracket
            }
            ']' => {
                i += 1;
                Token::RBracket
            }
            '!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    i += 2;
                    Token::NotEq
                } else {
                    i += 1;
                    Token::Bang
                }
            }
            '=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    i += 2;
                    Token::EqEq
                } else {
                    return Err(ExprError::Syntax {
                        pos: start,
                        msg: "expected '=='".into(),
                    });
                }
            }
            '<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    i += 2;
                    Token::Le
                } else {
                    i += 1;
                    Token::Lt
                }
            }
            '>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    i += 2;
                    Token::Ge
                } else {
                    i += 1;
                    Token::Gt
                }
            }
            '&' => {
                if bytes.get(i + 1) == Some(&b'&') {
                    i += 2;
                    Token::AndAnd
                } else {
                    return Err(ExprError::Syntax {
                        pos: start,
                        msg: "expected '&&'".into(),
                    });
                }
            }
            '|' => {
                if bytes.get(i + 1) == Some(&b'|') {
                    i += 2;
                    Token::OrOr
                } else {
                    return Err(ExprError::Syntax {
                        pos: start,
                        msg: "expected '||'".into(),
                    });
                }
            }
            '"' | '\'' => {
                let quote = c;
                i += 1;
                let mut s = String::new();
                // Decode from the source string: literals may hold any
                // UTF-8 text, not just ASCII.
                loop {
                    let Some(ch) = src[i..].chars().next() else {
                        return Err(ExprError::Syntax {
                            pos: start,
                            msg: "unterminated string".into(),
                        });
                    };
                    if ch == quote {
                        i += 1;
                        break;
                    }
                    if ch == '\\' {
                        let escaped =
                            src[i + 1..]
                                .chars()
                                .next()
                                .ok_or(ExprError::Syntax {
                                    pos: i,
                                    msg: "dangling escape".into(),
                                })?;
                        s.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                        i += 1 + escaped.len_utf8();
                    } else {
                        s.push(ch);
                        i += ch.len_utf8();
                    }
                }
                Token::Str(s)
            }
            c if c.is_ascii_digit() => {
                let mut end = i;
                while end < bytes.len()
                    && ((bytes[end] as char).is_ascii_digit() || bytes[end] == b'.')
                {
                    // `a.b` after a number belongs to the number only once.
                    if bytes[end] == b'.'
                        && !bytes
                            .get(end + 1)
                            .is_some_and(|&b| (b as char).is_ascii_digit())
                    {
                        break;
                    }
                    end += 1;
                }
                let text = &src[i..end];
                let n: f64 = text.parse().map_err(|_| ExprError::Syntax {
                    pos: start,
                    msg: format!("bad number '{}'", text),
                })?;
                i = end;
                Token::Number(n)
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                let mut end = i;
                while end < bytes.len() {
                    let ch = bytes[end] as char;
                    if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
                        end += 1;
                    } else {
                        break;
                    }
                }
                let word = &src[i..end];
                i = end;
                match word {
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    "undefined" => Token::Undefined,
                    _ => Token::Ident(word.to_string()),
                }
            }
            _ => {
                let full = src[i..].chars().next().unwrap_or(c);
                return Err(ExprError::Syntax {
                    pos: start,
                    msg: format!("unexpected character '{}'", full),
                });
            }
        };

        out.push(Spanned { token, pos: start });
    }

    Ok(out)
}
