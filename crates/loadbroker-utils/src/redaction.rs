//! Secret redaction for log lines and user-facing error text.
//!
//! Carrier registry URLs carry the web key as a query parameter and reqwest
//! echoes full URLs in its errors, so every error string that reaches a log
//! or the terminal passes through [`redact_secrets`].

use once_cell::sync::Lazy;
use regex::Regex;

/// Replacement marker for redacted values
pub const REDACTED: &str = "[REDACTED]";

static QUERY_SECRET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(webKey|api_key|apikey|key|token)=([^&\s)]+)").expect("valid regex")
});

static BEARER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bBearer\s+[A-Za-z0-9._\-]+").expect("valid regex"));

static OPENAI_STYLE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bsk-[A-Za-z0-9_\-]{8,}").expect("valid regex"));

/// Redact credentials from a free-form string.
///
/// Handles `webKey=`/`key=`/`token=` query values, `Bearer` tokens and
/// `sk-` prefixed API keys.
#[must_use]
pub fn redact_secrets(input: &str) -> String {
    let step = QUERY_SECRET.replace_all(input, |caps: &regex::Captures<'_>| {
        format!("{}={}", &caps[1], REDACTED)
    });
    let step = BEARER.replace_all(&step, format!("Bearer {REDACTED}").as_str());
    OPENAI_STYLE_KEY.replace_all(&step, REDACTED).into_owned()
}
