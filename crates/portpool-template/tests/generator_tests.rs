// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template generation driven through a completion provider.

use std::sync::Arc;

use portpool_config::model::GeneratorConfig;
use portpool_template::{
    FailureCategory, FailureReason, GenerationOutcome, TemplateGenerator, TemplateSet,
};
use portpool_test_utils::MockProvider;

const VI_SMS: &str = "Dear customer, 5672 is the one Time Password from Vi. Expires in 3 min. Please do not share this OTP with anyone.OTP @www.myvi.in #5672";

fn config(max_attempts: u32) -> GeneratorConfig {
    GeneratorConfig {
        max_attempts,
        ..GeneratorConfig::default()
    }
}

#[tokio::test]
async fn repeated_code_is_fixed_after_feedback() {
    let provider = Arc::new(MockProvider::with_responses(vec![
        "\"Dear customer, {otp} is the one Time Password from Vi. Expires in {time}. Please do not share this OTP with anyone.OTP @www.myvi.in #{otp}\"".to_string(),
        "Dear customer, {otp} is the one Time Password from Vi. Expires in {time}. Please do not share this OTP with anyone.OTP @www.myvi.in #{any}".to_string(),
    ]));
    let generator = TemplateGenerator::with_provider(provider.clone(), &config(5));

    let GenerationOutcome::Accepted(accepted) = generator.generate(VI_SMS).await.unwrap() else {
        panic!("expected an accepted template");
    };
    assert_eq!(accepted.otp, "5672");
    assert_eq!(accepted.attempts, 2);

    // The accepted template extracts the same code when stored and recompiled.
    let set = TemplateSet::compile(&[accepted.template.as_str()]).unwrap();
    assert_eq!(set.extract(VI_SMS).unwrap().otp, "5672");

    let requests = provider.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].model, "gpt-3.5-turbo");
    assert_eq!(requests[0].messages[0].role, "system");
    assert!(!requests[0].messages[1].content.contains("Previous attempt failed"));
    assert!(requests[1].messages[1]
        .content
        .contains("Previous attempt failed: Template contains multiple {otp}"));
    assert!(requests[1].messages[1].content.contains(VI_SMS));
}

#[tokio::test]
async fn exhaustion_reports_category_and_hint() {
    let provider = Arc::new(MockProvider::with_responses(vec![
        "Your balance is {otp}".to_string(),
        "Your balance is {otp}".to_string(),
        "Your balance is {otp}".to_string(),
    ]));
    let generator = TemplateGenerator::with_provider(provider.clone(), &config(3));

    let GenerationOutcome::Exhausted(failure) =
        generator.generate("Your OTP is 4521").await.unwrap()
    else {
        panic!("expected exhaustion");
    };
    assert_eq!(failure.attempts, 3);
    assert_eq!(failure.last_reason, FailureReason::NoMatch);
    assert_eq!(failure.category(), FailureCategory::NoExtraction);
    assert!(failure.explanation().contains("Suggested solutions"));
    assert_eq!(provider.requests().await.len(), 3);
}

#[tokio::test]
async fn empty_completions_count_as_attempts() {
    let provider = Arc::new(MockProvider::new());
    let generator = TemplateGenerator::with_provider(provider, &config(2));
    let outcome = generator.generate("Your OTP is 4521").await.unwrap();
    let GenerationOutcome::Exhausted(failure) = outcome else {
        panic!("expected exhaustion");
    };
    assert_eq!(failure.last_reason, FailureReason::EmptyResponse);
    assert_eq!(failure.category(), FailureCategory::Other);
}

#[tokio::test]
async fn provider_failure_is_an_error() {
    let provider = Arc::new(MockProvider::new());
    provider.add_failure("upstream unavailable".to_string()).await;
    let generator = TemplateGenerator::with_provider(provider, &config(5));
    let err = generator.generate("Your OTP is 4521").await.unwrap_err();
    assert!(err.to_string().contains("upstream unavailable"));
}
