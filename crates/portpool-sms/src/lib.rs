// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound SMS payload parsing for portpool.
//!
//! Two wire formats arrive at the webhooks: structured JSON from Android
//! forwarders and raw labeled-line dumps from GSM gateways. Both become the
//! same canonical [`Message`], with numbers run through the normalizer and
//! every missing field degraded to a safe default.

pub mod error;
mod raw;
pub mod scts;
mod structured;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use portpool_config::model::SmsConfig;
use portpool_core::{Message, PortpoolError};

pub use error::ParseError;

/// Turns webhook bodies into canonical messages.
#[derive(Debug, Clone, Copy)]
pub struct SmsParser {
    dial_code: u32,
    scts_offset: FixedOffset,
}

impl SmsParser {
    pub fn new(dial_code: u32, scts_offset: FixedOffset) -> Self {
        Self {
            dial_code,
            scts_offset,
        }
    }

    pub fn from_config(config: &SmsConfig) -> Result<Self, PortpoolError> {
        let offset = FixedOffset::east_opt(config.scts_utc_offset_minutes * 60).ok_or_else(|| {
            PortpoolError::Config(format!(
                "invalid SCTS UTC offset: {} minutes",
                config.scts_utc_offset_minutes
            ))
        })?;
        Ok(Self::new(config.dial_code, offset))
    }

    pub fn dial_code(&self) -> u32 {
        self.dial_code
    }

    /// Parse a JSON forwarder payload.
    pub fn parse_structured(
        &self,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Message, ParseError> {
        structured::parse(body, self.dial_code, now)
    }

    /// Parse a raw labeled-line carrier dump.
    pub fn parse_raw(&self, body: &str, now: DateTime<Utc>) -> Result<Message, ParseError> {
        raw::parse(body, self.dial_code, self.scts_offset, now)
    }
}

impl Default for SmsParser {
    /// Default dial code with SCTS read as UTC.
    fn default() -> Self {
        Self::new(SmsConfig::default().dial_code, Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn from_config_rejects_out_of_range_offset() {
        let config = SmsConfig {
            dial_code: 91,
            scts_utc_offset_minutes: 24 * 60,
        };
        assert!(SmsParser::from_config(&config).is_err());
    }

    #[test]
    fn both_formats_agree_on_canonical_receiver() {
        let parser = SmsParser::default();
        let now = Utc::now();
        let raw = parser
            .parse_raw("Receiver: \"3\" 919876543210\nOTP 1234", now)
            .unwrap();
        let structured = parser
            .parse_structured(br#"{"recipient": "+91-98765-43210", "message": "OTP 1234"}"#, now)
            .unwrap();
        assert_eq!(raw.receiver, structured.receiver);
        assert_eq!(raw.text, structured.text);
    }

    proptest! {
        #[test]
        fn raw_parser_never_panics(body in ".{0,200}") {
            let parser = SmsParser::default();
            let _ = parser.parse_raw(&body, Utc::now());
        }

        #[test]
        fn raw_text_is_single_line(lines in proptest::collection::vec("[a-z0-9 ]{0,20}", 1..6)) {
            let parser = SmsParser::default();
            if let Ok(msg) = parser.parse_raw(&lines.join("\n"), Utc::now()) {
                prop_assert!(!msg.text.contains('\n'));
                prop_assert!(!msg.text.contains("  "));
            }
        }
    }
}
