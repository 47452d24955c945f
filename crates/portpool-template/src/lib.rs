// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OTP templates for portpool.
//!
//! A template is an SMS body with the code replaced by `{otp}` and the
//! volatile parts replaced by other placeholders. This crate tokenizes and
//! compiles templates into case-insensitive matchers, extracts codes from
//! messages, and runs the bounded propose/validate loop that produces new
//! templates from sample messages.

pub mod compile;
pub mod generator;
pub mod heuristic;
pub mod prompt;
pub mod token;

pub use compile::{CompiledTemplate, OtpMatch, TemplateSet, OTP_GROUP};
pub use generator::{
    FailureCategory, FailureReason, GeneratedTemplate, GenerationFailure, GenerationOutcome,
    GeneratorState, HeuristicProposer, ProviderProposer, TemplateGenerator, TemplateProposer,
};
pub use heuristic::propose_template;
pub use token::{tokenize, Placeholder, Token};
