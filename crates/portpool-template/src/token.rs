// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template tokenizer.
//!
//! A template is split into literal runs and brace placeholders before any
//! pattern is built. Placeholder recognition follows one fixed rule table:
//!
//! | Token                         | Placeholder          |
//! |-------------------------------|----------------------|
//! | `{otp}` (any case)            | [`Placeholder::Otp`] |
//! | `{date}`                      | [`Placeholder::Date`]|
//! | `{datetime}`                  | [`Placeholder::DateTime`] |
//! | `{time}`                      | [`Placeholder::Time`]|
//! | `{random}`                    | [`Placeholder::Random`] |
//! | any other `{...}` without `{` | [`Placeholder::Any`] |
//!
//! A `{` with no closing `}` before the next `{` is literal text.

use strum::Display;

/// A recognized placeholder kind.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Placeholder {
    Otp,
    Date,
    DateTime,
    Time,
    Random,
    /// `{any}` and every unrecognized brace token; holds the inner text.
    #[strum(to_string = "any")]
    Any(String),
}

impl Placeholder {
    fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "otp" => Self::Otp,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "time" => Self::Time,
            "random" => Self::Random,
            _ => Self::Any(name.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Placeholder(Placeholder),
}

/// Split `template` into literal and placeholder tokens.
///
/// Adjacent literal text is merged into one token.
pub fn tokenize(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let close = after.find('}');
        let nested = after.find('{');
        match close {
            Some(close) if nested.is_none_or(|n| n > close) => {
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Placeholder(Placeholder::from_name(&after[..close])));
                rest = &after[close + 1..];
            }
            _ => {
                literal.push('{');
                rest = after;
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

/// Number of `{otp}` placeholders among `tokens`.
pub fn count_otp(tokens: &[Token]) -> usize {
    tokens
        .iter()
        .filter(|t| matches!(t, Token::Placeholder(Placeholder::Otp)))
        .count()
}
