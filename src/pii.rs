//! PII scrubbing
//!
//! Replaces email addresses and phone-number patterns with fixed
//! placeholders before any review text leaves the pipeline.

use once_cell::sync::Lazy;
use regex::Regex;

const EMAIL_PLACEHOLDER: &str = "[EMAIL]";
const PHONE_PLACEHOLDER: &str = "[PHONE]";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email regex")
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{10}\b|\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("phone regex")
});

/// Scrubs emails and phone numbers out of a text
pub fn scrub(text: &str) -> String {
    let scrubbed = EMAIL_RE.replace_all(text, EMAIL_PLACEHOLDER);
    PHONE_RE.replace_all(&scrubbed, PHONE_PLACEHOLDER).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrubs_emails() {
        assert_eq!(
            scrub("contact me at jane.doe+app@example.co.uk please"),
            "contact me at [EMAIL] please"
        );
    }

    #[test]
    fn scrubs_phone_numbers() {
        assert_eq!(scrub("call 9876543210 now"), "call [PHONE] now");
        assert_eq!(scrub("call 987-654-3210 now"), "call [PHONE] now");
        assert_eq!(scrub("call 987.654.3210 now"), "call [PHONE] now");
    }

    #[test]
    fn scrubs_both_in_one_text() {
        let scrubbed = scrub("refund to a@b.com or 1234567890");
        assert_eq!(scrubbed, "refund to [EMAIL] or [PHONE]");
    }

    #[test]
    fn leaves_clean_text_alone() {
        let text = "version 4.2 is fine, 5 stars";
        assert_eq!(scrub(text), text);
    }
}
