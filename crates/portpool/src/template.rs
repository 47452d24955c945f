// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `portpool template "<sms>"`: run the generator once on a sample SMS.

use portpool_config::model::PortpoolConfig;
use portpool_core::PortpoolError;
use portpool_template::GenerationOutcome;
use serde_json::{json, Value};

use crate::serve::build_generator;

pub async fn run_template(
    config: &PortpoolConfig,
    sms: &str,
) -> Result<GenerationOutcome, PortpoolError> {
    build_generator(&config.generator)?.generate(sms).await
}

/// JSON printed for an outcome.
pub fn render_outcome(outcome: &GenerationOutcome) -> Value {
    match outcome {
        GenerationOutcome::Accepted(t) => json!({
            "template": t.template,
            "extractedOtp": t.otp,
            "attempts": t.attempts,
            "success": true,
        }),
        GenerationOutcome::Exhausted(f) => json!({
            "success": false,
            "attempts": f.attempts,
            "details": f.last_reason.to_string(),
            "category": f.category().to_string(),
            "assistantExplanation": f.explanation(),
        }),
    }
}
