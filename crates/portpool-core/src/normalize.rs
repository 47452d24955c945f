// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number canonicalization.
//!
//! Every number that enters the system (webhook receivers, panel serials,
//! slot phone numbers) is reduced to its bare local-subscriber form so that
//! numbers from different sources compare equal. Length is the deciding
//! signal for dial-code stripping: a 10-digit subscriber number that happens
//! to begin with the dial-code digits is never truncated.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel used wherever a number or port cannot be determined.
pub const UNKNOWN: &str = "Unknown";

/// Length of a local subscriber number.
pub const SUBSCRIBER_DIGITS: usize = 10;

/// A phone number in canonical (dial-code-stripped) form, or the `Unknown` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalNumber(String);

impl CanonicalNumber {
    /// The `Unknown` sentinel.
    pub fn unknown() -> Self {
        Self(UNKNOWN.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the canonical digits, `None` for the sentinel.
    pub fn as_i64(&self) -> Option<i64> {
        if self.is_unknown() {
            return None;
        }
        self.0.parse().ok()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalize a raw phone number string.
///
/// 1. All non-digit characters are dropped.
/// 2. If exactly `len(dial_code) + 10` digits remain and they start with the
///    dial code, the dial code is stripped.
/// 3. Otherwise anything longer than 10 digits keeps its trailing 10 digits.
/// 4. Shorter strings are returned unchanged; empty input yields `Unknown`.
pub fn normalize(raw: &str, dial_code: u32) -> CanonicalNumber {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return CanonicalNumber::unknown();
    }

    let prefix = dial_code.to_string();
    if digits.len() == prefix.len() + SUBSCRIBER_DIGITS && digits.starts_with(&prefix) {
        return CanonicalNumber(digits[prefix.len()..].to_string());
    }

    if digits.len() > SUBSCRIBER_DIGITS {
        return CanonicalNumber(digits[digits.len() - SUBSCRIBER_DIGITS..].to_string());
    }

    CanonicalNumber(digits)
}

/// Collapse a block of text onto one line: newlines and whitespace runs
/// become single spaces, and the ends are trimmed.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The forms under which a canonical number may appear in inbound traffic:
/// bare, dial-code prefixed, and `+`-prefixed international.
pub fn dialed_forms(number: &CanonicalNumber, dial_code: u32) -> Vec<String> {
    if number.is_unknown() {
        return Vec::new();
    }
    vec![
        number.as_str().to_string(),
        format!("{dial_code}{number}"),
        format!("+{dial_code}{number}"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_dial_code_from_twelve_digits() {
        assert_eq!(normalize("919876543210", 91).as_str(), "9876543210");
    }

    #[test]
    fn keeps_ten_digit_number_starting_with_dial_code() {
        assert_eq!(normalize("9156789012", 91).as_str(), "9156789012");
    }

    #[test]
    fn strips_formatting_characters() {
        assert_eq!(normalize("+91 98765-43210", 91).as_str(), "9876543210");
        assert_eq!(normalize("(987) 654 3210", 91).as_str(), "9876543210");
    }

    #[test]
    fn long_numbers_keep_last_ten_digits() {
        assert_eq!(normalize("00919876543210", 91).as_str(), "9876543210");
        assert_eq!(normalize("449876543210", 91).as_str(), "9876543210");
    }

    #[test]
    fn short_numbers_are_untouched() {
        assert_eq!(normalize("91234", 91).as_str(), "91234");
    }

    #[test]
    fn empty_and_non_numeric_input_is_unknown() {
        assert!(normalize("", 91).is_unknown());
        assert!(normalize("VM-HDFC", 91).is_unknown());
        assert_eq!(normalize("  ", 91).as_i64(), None);
    }

    #[test]
    fn three_digit_dial_code() {
        assert_eq!(normalize("8801712345678", 880).as_str(), "1712345678");
    }

    #[test]
    fn single_line_collapses_whitespace() {
        assert_eq!(single_line("  Your OTP\n is \t 4521 \r\n"), "Your OTP is 4521");
    }

    #[test]
    fn dialed_forms_cover_all_prefixes() {
        let n = normalize("9876543210", 91);
        assert_eq!(
            dialed_forms(&n, 91),
            vec!["9876543210", "919876543210", "+919876543210"]
        );
        assert!(dialed_forms(&CanonicalNumber::unknown(), 91).is_empty());
    }

    proptest! {
        #[test]
        fn twelve_digit_prefixed_yields_trailing_ten(sub in "[0-9]{10}") {
            let raw = format!("91{sub}");
            let n = normalize(&raw, 91);
            prop_assert_eq!(n.as_str(), sub.as_str());
        }

        #[test]
        fn ten_digit_input_is_identity(sub in "[0-9]{10}") {
            let n = normalize(&sub, 91);
            prop_assert_eq!(n.as_str(), sub.as_str());
        }

        #[test]
        fn normalize_is_idempotent(raw in "[0-9+ ()-]{0,16}") {
            let once = normalize(&raw, 91);
            if !once.is_unknown() {
                let twice = normalize(once.as_str(), 91);
                prop_assert_eq!(twice, once);
            }
        }
    }
}
