// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Propose/validate loop that turns a sample SMS into a working template.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! Proposing(n, feedback) --candidate--> Validating(n, candidate)
//!        ^                                   |          |
//!        |                          rejected |          | extracts a code
//!        +----- n < max_attempts ------------+          v
//!                                            |       Accepted
//!                                            v
//!                                        Exhausted
//! ```
//!
//! A proposal that times out or comes back empty is rejected like an invalid
//! candidate and consumes the attempt. Any other proposer error aborts the
//! loop and is returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use portpool_config::model::GeneratorConfig;
use portpool_core::{
    PortpoolError, ProviderAdapter, ProviderMessage, ProviderRequest, TemplateError,
};
use serde::Serialize;
use strum::Display;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::compile::CompiledTemplate;
use crate::heuristic::propose_template;
use crate::prompt::{build_user_prompt, SYSTEM_PROMPT};

/// Why a candidate template was rejected.
///
/// The `Display` text is fed back to the proposer on the next attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("No {{otp}} placeholder found in template")]
    MissingOtp,

    #[error(
        "Template contains multiple {{otp}} placeholders ({count}). Only one {{otp}} placeholder is allowed per template."
    )]
    MultipleOtp { count: usize },

    #[error("Could not extract OTP from SMS using the generated template")]
    NoMatch,

    #[error("Failed to build matcher from template: {0}")]
    InvalidPattern(String),

    #[error("Completion service returned an empty template")]
    EmptyResponse,

    #[error("Template proposal timed out after {0:?}")]
    Timeout(Duration),
}

impl From<TemplateError> for FailureReason {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::MissingOtp => Self::MissingOtp,
            TemplateError::MultipleOtp { count } => Self::MultipleOtp { count },
            TemplateError::InvalidPattern(msg) => Self::InvalidPattern(msg),
        }
    }
}

impl FailureReason {
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::MissingOtp => FailureCategory::NoPlaceholder,
            Self::MultipleOtp { .. } => FailureCategory::DuplicatePlaceholder,
            Self::NoMatch => FailureCategory::NoExtraction,
            Self::InvalidPattern(_) | Self::EmptyResponse | Self::Timeout(_) => {
                FailureCategory::Other
            }
        }
    }
}

/// Coarse grouping of rejection reasons, used to pick a remediation hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    NoPlaceholder,
    DuplicatePlaceholder,
    NoExtraction,
    Other,
}

impl FailureCategory {
    /// Operator-facing remediation hint for this category.
    pub fn remediation(&self) -> &'static str {
        match self {
            Self::DuplicatePlaceholder => {
                "The generated template marked the code more than once. This usually happens when the SMS repeats the code.\n\n\
                 Suggested solutions:\n\
                 1. Keep only the first occurrence of the code in the sample SMS\n\
                 2. Remove repeated code references such as a trailing #5672\n\
                 3. Example: for \"Dear customer, 5672 is your OTP... #5672\", use \"Dear customer, 5672 is your OTP...\""
            }
            Self::NoPlaceholder => {
                "The generated template has no {otp} placeholder, so no code was identified in the SMS.\n\n\
                 Suggested solutions:\n\
                 1. Make sure the SMS contains a clear code (digits or letters and digits)\n\
                 2. Make sure the code is not obscured by special characters or formatting"
            }
            Self::NoExtraction => {
                "A template was generated but it does not extract the code from the SMS. This is usually caused by unusual formatting.\n\n\
                 Suggested solutions:\n\
                 1. Remove unnecessary details from the sample SMS\n\
                 2. Make sure the code uses a standard format (4 to 6 digits or alphanumeric)\n\
                 3. Avoid repeating the code in the message\n\
                 4. Contact support with the exact SMS for a manual template"
            }
            Self::Other => {
                "Template generation failed.\n\n\
                 General advice:\n\
                 - Keep the sample SMS clear and concise\n\
                 - Avoid repeated code references\n\
                 - If this persists, contact support with the exact SMS text"
            }
        }
    }
}

/// A template that compiled and extracted a code from its sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedTemplate {
    pub template: String,
    pub otp: String,
    /// Attempt on which the template was accepted, starting at 1.
    pub attempts: u32,
}

/// The loop ran out of attempts without an acceptable template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationFailure {
    pub attempts: u32,
    pub last_reason: FailureReason,
}

impl GenerationFailure {
    pub fn category(&self) -> FailureCategory {
        self.last_reason.category()
    }

    pub fn explanation(&self) -> String {
        match self.category() {
            FailureCategory::Other => format!(
                "{}\n\nLast failure: {}",
                FailureCategory::Other.remediation(),
                self.last_reason
            ),
            category => category.remediation().to_string(),
        }
    }
}

/// Terminal result of one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Accepted(GeneratedTemplate),
    Exhausted(GenerationFailure),
}

/// States of the propose/validate loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorState {
    Proposing {
        attempt: u32,
        feedback: Option<FailureReason>,
    },
    Validating {
        attempt: u32,
        candidate: String,
    },
    Accepted(GeneratedTemplate),
    Exhausted(GenerationFailure),
}

impl GeneratorState {
    pub fn start() -> Self {
        Self::Proposing {
            attempt: 1,
            feedback: None,
        }
    }

    /// State after `attempt` was rejected for `reason`.
    pub fn rejected(attempt: u32, max_attempts: u32, reason: FailureReason) -> Self {
        if attempt >= max_attempts {
            Self::Exhausted(GenerationFailure {
                attempts: attempt,
                last_reason: reason,
            })
        } else {
            Self::Proposing {
                attempt: attempt + 1,
                feedback: Some(reason),
            }
        }
    }

    /// Check `candidate` against `sample` and move to the next state.
    pub fn validated(sample: &str, attempt: u32, max_attempts: u32, candidate: String) -> Self {
        match validate_candidate(sample, &candidate) {
            Ok(otp) => Self::Accepted(GeneratedTemplate {
                template: candidate,
                otp,
                attempts: attempt,
            }),
            Err(reason) => Self::rejected(attempt, max_attempts, reason),
        }
    }
}

/// Compile `candidate` and run it against `sample`, returning the extracted code.
pub fn validate_candidate(sample: &str, candidate: &str) -> Result<String, FailureReason> {
    let compiled = CompiledTemplate::compile(candidate)?;
    compiled.extract(sample).ok_or(FailureReason::NoMatch)
}

/// Remove quotes and code fences a completion service tends to wrap answers in.
pub fn strip_wrapping(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '`')
        .trim()
}

/// Source of candidate templates.
#[async_trait]
pub trait TemplateProposer: Send + Sync {
    /// Propose a template for `sms`. `feedback` explains why the previous
    /// candidate was rejected.
    async fn propose(
        &self,
        sms: &str,
        feedback: Option<&FailureReason>,
    ) -> Result<String, PortpoolError>;
}

/// Proposes templates through a chat-completion provider.
pub struct ProviderProposer {
    provider: Arc<dyn ProviderAdapter>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ProviderProposer {
    pub fn new(provider: Arc<dyn ProviderAdapter>, config: &GeneratorConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl TemplateProposer for ProviderProposer {
    async fn propose(
        &self,
        sms: &str,
        feedback: Option<&FailureReason>,
    ) -> Result<String, PortpoolError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![
                ProviderMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ProviderMessage {
                    role: "user".to_string(),
                    content: build_user_prompt(sms, feedback),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let response = self.provider.complete(request).await?;
        Ok(response.content)
    }
}

/// Deterministic keyword-based proposer for offline use.
///
/// When the SMS has no candidate code it echoes the text back unchanged, which
/// the validator rejects as missing a placeholder.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicProposer;

#[async_trait]
impl TemplateProposer for HeuristicProposer {
    async fn propose(
        &self,
        sms: &str,
        _feedback: Option<&FailureReason>,
    ) -> Result<String, PortpoolError> {
        Ok(propose_template(sms).unwrap_or_else(|| sms.to_string()))
    }
}

/// Runs the bounded propose/validate loop.
///
/// Holds no per-run state, so one generator can serve concurrent requests.
pub struct TemplateGenerator {
    proposer: Arc<dyn TemplateProposer>,
    max_attempts: u32,
    timeout: Duration,
}

impl TemplateGenerator {
    pub fn new(proposer: Arc<dyn TemplateProposer>, max_attempts: u32, timeout: Duration) -> Self {
        Self {
            proposer,
            max_attempts: max_attempts.max(1),
            timeout,
        }
    }

    /// Generator backed by a completion provider, bounded by `config`.
    pub fn with_provider(provider: Arc<dyn ProviderAdapter>, config: &GeneratorConfig) -> Self {
        Self::new(
            Arc::new(ProviderProposer::new(provider, config)),
            config.max_attempts,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Single-attempt generator using [`HeuristicProposer`]; retrying a
    /// deterministic proposer cannot change the outcome.
    pub fn heuristic(timeout: Duration) -> Self {
        Self::new(Arc::new(HeuristicProposer), 1, timeout)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Produce a validated template for `sms`.
    ///
    /// Returns `Err` only for an empty sample or a proposer failure other
    /// than a timeout; running out of attempts is a normal outcome.
    pub async fn generate(&self, sms: &str) -> Result<GenerationOutcome, PortpoolError> {
        if sms.trim().is_empty() {
            return Err(PortpoolError::Parse {
                message: "SMS text is required".to_string(),
            });
        }

        let mut state = GeneratorState::start();
        loop {
            state = match state {
                GeneratorState::Proposing { attempt, feedback } => {
                    debug!(attempt, feedback = ?feedback, "proposing template");
                    match self.propose(sms, feedback.as_ref()).await? {
                        Ok(candidate) => GeneratorState::Validating { attempt, candidate },
                        Err(reason) => GeneratorState::rejected(attempt, self.max_attempts, reason),
                    }
                }
                GeneratorState::Validating { attempt, candidate } => {
                    debug!(attempt, candidate = %candidate, "validating template");
                    GeneratorState::validated(sms, attempt, self.max_attempts, candidate)
                }
                GeneratorState::Accepted(accepted) => {
                    info!(attempts = accepted.attempts, "template accepted");
                    return Ok(GenerationOutcome::Accepted(accepted));
                }
                GeneratorState::Exhausted(failure) => {
                    warn!(
                        attempts = failure.attempts,
                        reason = %failure.last_reason,
                        category = %failure.category(),
                        "template generation exhausted"
                    );
                    return Ok(GenerationOutcome::Exhausted(failure));
                }
            };
        }
    }

    /// One bounded proposal. The outer error aborts the loop; the inner one
    /// rejects the attempt.
    async fn propose(
        &self,
        sms: &str,
        feedback: Option<&FailureReason>,
    ) -> Result<Result<String, FailureReason>, PortpoolError> {
        let proposal = tokio::time::timeout(self.timeout, self.proposer.propose(sms, feedback)).await;
        match proposal {
            Err(_) => Ok(Err(FailureReason::Timeout(self.timeout))),
            Ok(Err(PortpoolError::Timeout { duration })) => Ok(Err(FailureReason::Timeout(duration))),
            Ok(Err(e)) => Err(e),
            Ok(Ok(raw)) => {
                let candidate = strip_wrapping(&raw);
                if candidate.is_empty() {
                    Ok(Err(FailureReason::EmptyResponse))
                } else {
                    Ok(Ok(candidate.to_string()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned proposals and records the feedback it was given.
    struct Scripted {
        answers: Mutex<VecDeque<Result<String, PortpoolError>>>,
        feedback: Mutex<Vec<Option<FailureReason>>>,
    }

    impl Scripted {
        fn new(answers: Vec<Result<String, PortpoolError>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                feedback: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TemplateProposer for Scripted {
        async fn propose(
            &self,
            _sms: &str,
            feedback: Option<&FailureReason>,
        ) -> Result<String, PortpoolError> {
            self.feedback.lock().unwrap().push(feedback.cloned());
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    /// Never answers.
    struct Stalled;

    #[async_trait]
    impl TemplateProposer for Stalled {
        async fn propose(
            &self,
            _sms: &str,
            _feedback: Option<&FailureReason>,
        ) -> Result<String, PortpoolError> {
            std::future::pending().await
        }
    }

    const SMS: &str = "Your OTP is 4521";

    fn generator(proposer: Arc<dyn TemplateProposer>, max: u32) -> TemplateGenerator {
        TemplateGenerator::new(proposer, max, Duration::from_secs(5))
    }

    #[test]
    fn strip_wrapping_removes_quotes_and_fences() {
        assert_eq!(strip_wrapping("  \"Your OTP is {otp}\"\n"), "Your OTP is {otp}");
        assert_eq!(strip_wrapping("```\nYour OTP is {otp}\n```"), "Your OTP is {otp}");
        assert_eq!(strip_wrapping("\"\""), "");
    }

    #[test]
    fn validation_classifies_failures() {
        assert_eq!(validate_candidate(SMS, "Your OTP is {otp}"), Ok("4521".to_string()));
        assert_eq!(validate_candidate(SMS, "Your OTP is 4521"), Err(FailureReason::MissingOtp));
        assert_eq!(
            validate_candidate(SMS, "{otp} {otp}"),
            Err(FailureReason::MultipleOtp { count: 2 })
        );
        assert_eq!(validate_candidate(SMS, "Balance {otp}"), Err(FailureReason::NoMatch));
    }

    #[test]
    fn transitions_respect_the_ceiling() {
        assert_eq!(
            GeneratorState::rejected(1, 3, FailureReason::NoMatch),
            GeneratorState::Proposing {
                attempt: 2,
                feedback: Some(FailureReason::NoMatch)
            }
        );
        assert!(matches!(
            GeneratorState::rejected(3, 3, FailureReason::NoMatch),
            GeneratorState::Exhausted(GenerationFailure { attempts: 3, .. })
        ));
        assert!(matches!(
            GeneratorState::validated(SMS, 1, 3, "Your OTP is {otp}".into()),
            GeneratorState::Accepted(_)
        ));
    }

    #[tokio::test]
    async fn accepts_first_valid_candidate() {
        let proposer = Scripted::new(vec![Ok("\"Your OTP is {otp}\"".into())]);
        let outcome = generator(proposer.clone(), 5).generate(SMS).await.unwrap();
        assert_eq!(
            outcome,
            GenerationOutcome::Accepted(GeneratedTemplate {
                template: "Your OTP is {otp}".into(),
                otp: "4521".into(),
                attempts: 1,
            })
        );
        assert_eq!(*proposer.feedback.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn feeds_back_previous_reason() {
        let proposer = Scripted::new(vec![
            Ok("{otp} is OTP #{otp}".into()),
            Ok("Your OTP is {otp}".into()),
        ]);
        let outcome = generator(proposer.clone(), 5).generate(SMS).await.unwrap();
        assert!(matches!(
            outcome,
            GenerationOutcome::Accepted(GeneratedTemplate { attempts: 2, .. })
        ));
        assert_eq!(
            *proposer.feedback.lock().unwrap(),
            vec![None, Some(FailureReason::MultipleOtp { count: 2 })]
        );
    }

    #[tokio::test]
    async fn exhaustion_carries_last_reason() {
        let proposer = Scripted::new(vec![
            Ok("no placeholder".into()),
            Ok("Balance {otp}".into()),
        ]);
        let outcome = generator(proposer, 2).generate(SMS).await.unwrap();
        let GenerationOutcome::Exhausted(failure) = outcome else {
            panic!("expected exhaustion");
        };
        assert_eq!(failure.attempts, 2);
        assert_eq!(failure.last_reason, FailureReason::NoMatch);
        assert_eq!(failure.category(), FailureCategory::NoExtraction);
        assert!(failure.explanation().contains("does not extract the code"));
    }

    #[tokio::test]
    async fn empty_answers_consume_attempts() {
        let proposer = Scripted::new(vec![Ok("  ".into()), Ok("``".into())]);
        let outcome = generator(proposer, 2).generate(SMS).await.unwrap();
        assert!(matches!(
            outcome,
            GenerationOutcome::Exhausted(GenerationFailure {
                last_reason: FailureReason::EmptyResponse,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn provider_errors_abort_the_loop() {
        let proposer = Scripted::new(vec![Err(PortpoolError::Provider {
            message: "boom".into(),
            source: None,
        })]);
        let err = generator(proposer, 5).generate(SMS).await.unwrap_err();
        assert!(matches!(err, PortpoolError::Provider { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_proposals_time_out() {
        let generator = TemplateGenerator::new(Arc::new(Stalled), 2, Duration::from_secs(30));
        let outcome = generator.generate(SMS).await.unwrap();
        assert_eq!(
            outcome,
            GenerationOutcome::Exhausted(GenerationFailure {
                attempts: 2,
                last_reason: FailureReason::Timeout(Duration::from_secs(30)),
            })
        );
    }

    #[tokio::test]
    async fn empty_sample_is_rejected() {
        let err = generator(Scripted::new(vec![]), 3).generate(" \n").await.unwrap_err();
        assert!(matches!(err, PortpoolError::Parse { .. }));
    }

    #[tokio::test]
    async fn heuristic_generator_runs_once() {
        let generator = TemplateGenerator::heuristic(Duration::from_secs(1));
        assert_eq!(generator.max_attempts(), 1);
        let GenerationOutcome::Accepted(t) = generator.generate("Login code: 773311").await.unwrap()
        else {
            panic!("expected acceptance");
        };
        assert_eq!(t.template, "Login code: {otp}");
        assert_eq!(t.otp, "773311");

        let outcome = generator.generate("no code here").await.unwrap();
        assert!(matches!(
            outcome,
            GenerationOutcome::Exhausted(GenerationFailure {
                last_reason: FailureReason::MissingOtp,
                attempts: 1,
            })
        ));
    }

    #[test]
    fn zero_attempts_is_clamped() {
        assert_eq!(generator(Scripted::new(vec![]), 0).max_attempts(), 1);
    }
}
