// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompts sent to the completion service when proposing templates.

use crate::generator::FailureReason;

/// System turn for every proposal request.
pub const SYSTEM_PROMPT: &str = "You are an expert SMS template generator. Return ONLY the template string, no explanations. Ensure the template contains exactly one {otp} placeholder and can extract the OTP from the SMS. Follow the user's instructions precisely, especially about using only one {otp} and handling repeated OTPs with {any}.";

const PROPOSAL_PROMPT: &str = r#"Convert the following SMS message into a template using the placeholder rules below. The template must extract the OTP from the SMS when matched against it.

CRITICAL RULES:
- Use exactly ONE {otp} placeholder in the entire template
- If the SMS contains the OTP more than once, replace the first occurrence and use {any} for the rest
- The template must follow the exact structure of the SMS, including punctuation and spacing

Placeholders:
- {otp}: the code itself, 3 to 12 letters, digits or hyphens (ONLY ONE PER TEMPLATE)
- {date}, {datetime}, {time}: durations, dates and times
- {random}: purely alphanumeric random strings, 3 to 15 characters, no symbols
- {any}: anything else (links, tokens containing / + or ., repeated OTP references)

Matching rules:
1. Runs of spaces match any amount of whitespace
2. : matches : or the full-width colon
3. . matches any text
4. # followed by digits should become #{any}
5. @ inside URLs should be kept or covered by {any}
6. All other static text is kept exactly as-is

Example 1:
SMS: "<#> 1770 is your OTP to login into Airtel Thanks app. Valid for 100 secs. Do not share with anyone. If this was not you click i.airtel.in/Contact N9BWuqauU1y"
Template: "<#> {otp} is your OTP to login into Airtel Thanks app. Valid for {time}. Do not share with anyone. If this was not you click {any} {random}"

Example 2 (repeated OTP):
SMS: "Dear customer, 5672 is the one Time Password from Vi. Expires in 3 min. Please do not share this OTP with anyone.OTP @www.myvi.in #5672"
Template: "Dear customer, {otp} is the one Time Password from Vi. Expires in {time}. Please do not share this OTP with anyone.OTP @www.myvi.in #{any}"
{feedback}
Now convert this SMS:
"{sms}"

Return ONLY the template string, nothing else."#;

const FEEDBACK_PROMPT: &str = r#"
Previous attempt failed: {reason}

ANALYSIS: {analysis}

Generate a new template that contains exactly ONE {otp} placeholder, matches the SMS structure precisely, uses {any} for repeated OTP references and URL fragments, and uses {time} for durations like "3 min".
"#;

/// Build the user turn for one proposal attempt.
///
/// `feedback` is the reason the previous candidate was rejected; it is absent
/// on the first attempt.
pub fn build_user_prompt(sms: &str, feedback: Option<&FailureReason>) -> String {
    let feedback = feedback
        .map(|reason| {
            FEEDBACK_PROMPT
                .replace("{reason}", &reason.to_string())
                .replace("{analysis}", analysis(reason))
        })
        .unwrap_or_default();
    PROPOSAL_PROMPT
        .replace("{feedback}", &feedback)
        .replace("{sms}", sms)
}

fn analysis(reason: &FailureReason) -> &'static str {
    match reason {
        FailureReason::MultipleOtp { .. } => {
            "The template contained multiple {otp} placeholders, which is not allowed."
        }
        FailureReason::MissingOtp => "The template did not mark the OTP with {otp}.",
        _ => "The template could not extract the OTP from the SMS.",
    }
}
