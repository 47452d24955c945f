// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline `{otp}` proposer used when no completion service is configured.

use std::sync::LazyLock;

use regex::Regex;

/// A 4-8 digit run shortly after an OTP keyword.
static KEYWORD_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(otp|code|password|pass|pin|verification)[^\d]{0,10}(\d{4,8})").unwrap()
});

/// Any standalone 4-8 digit run.
static STANDALONE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4,8}\b").unwrap());

/// Replace the most likely code in `sms` with `{otp}`.
///
/// A digit run following an OTP keyword is preferred; its first standalone
/// occurrence in the text is the one replaced. Without a keyword hit the
/// first standalone 4-8 digit run is used. Returns `None` when the text has
/// no candidate at all.
pub fn propose_template(sms: &str) -> Option<String> {
    let keyword_hit = KEYWORD_CODE
        .captures(sms)
        .and_then(|caps| caps.get(2))
        .and_then(|code| {
            STANDALONE_CODE
                .find_iter(sms)
                .find(|m| m.as_str() == code.as_str())
                .map(|m| m.range())
        });

    let range = keyword_hit.or_else(|| STANDALONE_CODE.find(sms).map(|m| m.range()))?;

    let mut template = String::with_capacity(sms.len());
    template.push_str(&sms[..range.start]);
    template.push_str("{otp}");
    template.push_str(&sms[range.end..]);
    Some(template)
}
