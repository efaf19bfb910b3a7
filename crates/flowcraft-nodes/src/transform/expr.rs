//! Tiny expression evaluator backing the code node
//!
//! Recursive-descent over a token stream: numbers, string literals,
//! identifiers resolved from a scope map, unary minus, `+ - * / %`,
//! and parentheses. `+` concatenates when either side is a string.
//! This is the whole simulated language; anything else is an error.

use std::collections::HashMap;

use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '"' | '\'' => {
                let quote = c;
                i += 1;
                let start = i;
                while i < chars.len() && chars[i] != quote {
                    i += 1;
                }
                if i >= chars.len() {
                    return Err("Unterminated string literal".to_string());
                }
                tokens.push(Token::Str(chars[start..i].iter().collect()));
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid number '{text}'"))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(format!("Unexpected character '{other}'")),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    scope: &'a HashMap<String, Value>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Value, String> {
        let mut left = self.term()?;
        while let Some(op) = self.peek().cloned() {
            match op {
                Token::Plus => {
                    self.pos += 1;
                    let right = self.term()?;
                    left = add(&left, &right)?;
                }
                Token::Minus => {
                    self.pos += 1;
                    let right = self.term()?;
                    left = numeric(&left, &right, "-", |a, b| Ok(a - b))?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<Value, String> {
        let mut left = self.unary()?;
        while let Some(op) = self.peek().cloned() {
            match op {
                Token::Star => {
                    self.pos += 1;
                    let right = self.unary()?;
                    left = numeric(&left, &right, "*", |a, b| Ok(a * b))?;
                }
                Token::Slash => {
                    self.pos += 1;
                    let right = self.unary()?;
                    left = numeric(&left, &right, "/", |a, b| {
                        if b == 0.0 {
                            Err("division by zero".to_string())
                        } else {
                            Ok(a / b)
                        }
                    })?;
                }
                Token::Percent => {
                    self.pos += 1;
                    let right = self.unary()?;
                    left = numeric(&left, &right, "%", |a, b| {
                        if b == 0.0 {
                            Err("division by zero".to_string())
                        } else {
                            Ok(a % b)
                        }
                    })?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Value, String> {
        if self.peek() == Some(&Token::Minus) {
            self.pos += 1;
            let value = self.unary()?;
            return match value.as_f64() {
                Some(n) => Ok(number(-n)),
                None => Err("Unary minus requires a number".to_string()),
            };
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Value, String> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(number(n)),
            Some(Token::Str(s)) => Ok(json!(s)),
            Some(Token::Ident(name)) => match self.scope.get(&name) {
                Some(value) => Ok(value.clone()),
                None => Err(format!("Unknown variable '{name}'")),
            },
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("Expected ')'".to_string()),
                }
            }
            other => Err(format!("Unexpected token {other:?}")),
        }
    }
}

/// Integers stay integers so `2 + 2` reads as `4`, not `4.0`.
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9e15 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

fn add(left: &Value, right: &Value) -> Result<Value, String> {
    if left.is_string() || right.is_string() {
        let mut out = match left {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out.push_str(&match right {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        return Ok(json!(out));
    }
    numeric(left, right, "+", |a, b| Ok(a + b))
}

fn numeric(
    left: &Value,
    right: &Value,
    op: &str,
    apply: impl Fn(f64, f64) -> Result<f64, String>,
) -> Result<Value, String> {
    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Err(format!("Operator '{op}' requires numeric operands"));
    };
    apply(a, b).map(number)
}

/// Evaluate a single expression against the given scope.
pub fn evaluate(source: &str, scope: &HashMap<String, Value>) -> Result<Value, String> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err("Empty expression".to_string());
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        scope,
    };
    let value = parser.expr()?;
    if parser.pos != tokens.len() {
        return Err("Trailing input after expression".to_string());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_arithmetic_precedence() {
        let empty = HashMap::new();
        assert_eq!(evaluate("2 + 3 * 4", &empty).unwrap(), json!(14));
        assert_eq!(evaluate("(2 + 3) * 4", &empty).unwrap(), json!(20));
        assert_eq!(evaluate("10 / 4", &empty).unwrap(), json!(2.5));
    }

    #[test]
    fn test_variables_from_scope() {
        let scope = scope(&[("x", json!(10)), ("y", json!(3))]);
        assert_eq!(evaluate("x % y", &scope).unwrap(), json!(1));
    }

    #[test]
    fn test_string_concat() {
        let scope = scope(&[("name", json!("world"))]);
        assert_eq!(
            evaluate("'hello ' + name", &scope).unwrap(),
            json!("hello world")
        );
    }

    #[test]
    fn test_division_by_zero() {
        let empty = HashMap::new();
        let err = evaluate("1 / 0", &empty).unwrap_err();
        assert!(err.contains("division by zero"));
    }

    #[test]
    fn test_unknown_variable() {
        let empty = HashMap::new();
        assert!(evaluate("missing + 1", &empty).is_err());
    }

    #[test]
    fn test_unary_minus() {
        let empty = HashMap::new();
        assert_eq!(evaluate("-5 + 3", &empty).unwrap(), json!(-2));
    }
}
