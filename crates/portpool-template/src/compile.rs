// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pattern building and OTP extraction.

use portpool_core::{single_line, TemplateError};
use regex::{Regex, RegexBuilder};

use crate::token::{count_otp, tokenize, Placeholder, Token};

/// Name of the capture group holding the code.
pub const OTP_GROUP: &str = "otp";

const OTP_PATTERN: &str = r"(?P<otp>[A-Za-z0-9\-]{3,12})";
const WILDCARD: &str = ".*";
const RANDOM_PATTERN: &str = "[A-Za-z0-9]{3,15}";

fn placeholder_pattern(placeholder: &Placeholder) -> &'static str {
    match placeholder {
        Placeholder::Otp => OTP_PATTERN,
        Placeholder::Date | Placeholder::DateTime | Placeholder::Time => WILDCARD,
        Placeholder::Random => RANDOM_PATTERN,
        Placeholder::Any(_) => WILDCARD,
    }
}

/// Emit the pattern for a literal run.
///
/// Whitespace runs match zero or more whitespace, a colon matches either an
/// ASCII or full-width colon (or none), a period matches any span, and
/// everything else matches itself.
fn push_literal(pattern: &mut String, literal: &str) {
    let mut in_space = false;
    for c in literal.chars() {
        if c.is_whitespace() {
            if !in_space {
                pattern.push_str(r"\s*");
            }
            in_space = true;
            continue;
        }
        in_space = false;
        match c {
            ':' | '：' => pattern.push_str("[:：]?"),
            '.' => pattern.push_str(WILDCARD),
            _ => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
}

/// Build the regex source for a tokenized template.
pub fn build_pattern(tokens: &[Token]) -> String {
    let mut pattern = String::new();
    for token in tokens {
        match token {
            Token::Literal(text) => push_literal(&mut pattern, text),
            Token::Placeholder(p) => pattern.push_str(placeholder_pattern(p)),
        }
    }
    pattern
}

/// A code extracted from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpMatch {
    pub otp: String,
    /// Position of the matching template within its set.
    pub template_index: usize,
}

/// One template compiled into a case-insensitive matcher.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    source: String,
    regex: Regex,
}

impl CompiledTemplate {
    /// Compile a template that must contain exactly one `{otp}`.
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        let source = single_line(template);
        let tokens = tokenize(&source);
        match count_otp(&tokens) {
            0 => return Err(TemplateError::MissingOtp),
            1 => {}
            count => return Err(TemplateError::MultipleOtp { count }),
        }

        let regex = RegexBuilder::new(&build_pattern(&tokens))
            .case_insensitive(true)
            .build()
            .map_err(|e| TemplateError::InvalidPattern(e.to_string()))?;
        Ok(Self { source, regex })
    }

    /// The single-line template this matcher was built from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Extract the code from `message`, if the template matches with a
    /// non-empty capture.
    pub fn extract(&self, message: &str) -> Option<String> {
        let text = single_line(message);
        self.regex
            .captures(&text)
            .and_then(|caps| caps.name(OTP_GROUP))
            .map(|m| m.as_str().to_string())
            .filter(|otp| !otp.is_empty())
    }
}

/// A service's templates, compiled in definition order.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: Vec<CompiledTemplate>,
}

impl TemplateSet {
    /// Compile every template; the first invalid one fails the whole set.
    pub fn compile<S: AsRef<str>>(templates: &[S]) -> Result<Self, TemplateError> {
        let templates = templates
            .iter()
            .map(|t| CompiledTemplate::compile(t.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { templates })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Try each template in order; the first non-empty capture wins.
    pub fn extract(&self, message: &str) -> Option<OtpMatch> {
        self.templates
            .iter()
            .enumerate()
            .find_map(|(template_index, t)| {
                t.extract(message).map(|otp| OtpMatch {
                    otp,
                    template_index,
                })
            })
    }
}
