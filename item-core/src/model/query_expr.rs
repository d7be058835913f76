/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Free-form query expression: `field op 'literal'` terms joined by `and`.
//!
//! Fields `ItemName`, `DataType`, `AppScope` and `NetScope` address item metadata; any
//! other field name is looked up in the item's application properties.

use crate::error::CoreError;
use crate::model::item::Item;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprField {
    ItemName,
    DataType,
    AppScope,
    NetScope,
    AppProp(String),
}

impl ExprField {
    fn from_ident(ident: &str) -> Self {
        match ident.to_ascii_lowercase().as_str() {
            "itemname" | "name" => ExprField::ItemName,
            "datatype" => ExprField::DataType,
            "appscope" => ExprField::AppScope,
            "netscope" => ExprField::NetScope,
            _ => ExprField::AppProp(ident.to_string()),
        }
    }

    fn value<'a>(&self, item: &'a Item) -> Option<&'a str> {
        match self {
            ExprField::ItemName => Some(item.name.as_str()),
            ExprField::DataType => Some(item.data_type.as_str()),
            ExprField::AppScope => Some(item.app_scope.as_str()),
            ExprField::NetScope => Some(item.net_scope.as_str()),
            ExprField::AppProp(key) => item.app_props.get(key),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExprOp {
    Eq,
    NotEq,
    Like,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExprTerm {
    pub field: ExprField,
    pub op: ExprOp,
    pub literal: String,
}

impl ExprTerm {
    fn matches(&self, item: &Item) -> bool {
        let value = self.field.value(item);
        match self.op {
            ExprOp::Eq => value == Some(self.literal.as_str()),
            // A missing property is "not equal" to any literal.
            ExprOp::NotEq => value != Some(self.literal.as_str()),
            ExprOp::Like => value.is_some_and(|value| wildcard_match(&self.literal, value)),
        }
    }
}

/// Parsed conjunction of terms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryExpr {
    terms: Vec<ExprTerm>,
}

impl QueryExpr {
    pub fn terms(&self) -> &[ExprTerm] {
        &self.terms
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.terms.iter().all(|term| term.matches(item))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Ident(String),
    Literal(String),
    Eq,
    NotEq,
}

fn tokenize(input: &str) -> Result<Vec<Token>, CoreError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else if ch == '=' {
            chars.next();
            tokens.push(Token::Eq);
        } else if ch == '!' {
            chars.next();
            match chars.next() {
                Some((_, '=')) => tokens.push(Token::NotEq),
                _ => {
                    return Err(CoreError::InvalidQuery(format!(
                        "expected '=' after '!' at offset {pos}"
                    )))
                }
            }
        } else if ch == '\'' {
            chars.next();
            let mut literal = String::new();
            let mut closed = false;
            for (_, next) in chars.by_ref() {
                if next == '\'' {
                    closed = true;
                    break;
                }
                literal.push(next);
            }
            if !closed {
                return Err(CoreError::InvalidQuery(format!(
                    "unterminated literal starting at offset {pos}"
                )));
            }
            tokens.push(Token::Literal(literal));
        } else if ch.is_alphanumeric() || ch == '_' || ch == '.' {
            let mut ident = String::new();
            while let Some(&(_, next)) = chars.peek() {
                if next.is_alphanumeric() || next == '_' || next == '.' {
                    ident.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Ident(ident));
        } else {
            return Err(CoreError::InvalidQuery(format!(
                "unexpected character '{ch}' at offset {pos}"
            )));
        }
    }

    Ok(tokens)
}

impl FromStr for QueryExpr {
    type Err = CoreError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut tokens = tokenize(input)?.into_iter();
        let mut terms = Vec::new();

        loop {
            let field = match tokens.next() {
                Some(Token::Ident(ident)) => ExprField::from_ident(&ident),
                other => {
                    return Err(CoreError::InvalidQuery(format!(
                        "expected field name, found {other:?}"
                    )))
                }
            };
            let op = match tokens.next() {
                Some(Token::Eq) => ExprOp::Eq,
                Some(Token::NotEq) => ExprOp::NotEq,
                Some(Token::Ident(ident)) if ident.eq_ignore_ascii_case("like") => ExprOp::Like,
                other => {
                    return Err(CoreError::InvalidQuery(format!(
                        "expected operator, found {other:?}"
                    )))
                }
            };
            let literal = match tokens.next() {
                Some(Token::Literal(literal)) => literal,
                other => {
                    return Err(CoreError::InvalidQuery(format!(
                        "expected quoted literal, found {other:?}"
                    )))
                }
            };
            terms.push(ExprTerm { field, op, literal });

            match tokens.next() {
                None => break,
                Some(Token::Ident(ident)) if ident.eq_ignore_ascii_case("and") => continue,
                Some(other) => {
                    return Err(CoreError::InvalidQuery(format!(
                        "expected 'and', found {other:?}"
                    )))
                }
            }
        }

        Ok(Self { terms })
    }
}

/// Glob match where `*` spans any run of characters.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&ch| ch == '*')
}
