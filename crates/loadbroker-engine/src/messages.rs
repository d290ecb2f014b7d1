//! Caller-facing message templates

/// Whole dollars with thousands separators, e.g. `2400.0` -> `$2,400`.
///
/// The amount is rounded half-to-even first.
#[must_use]
pub fn format_dollars(amount: f64) -> String {
    let whole = amount.round_ties_even();
    let digits = format!("{:.0}", whole.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if whole < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub(crate) fn accept(rate: f64) -> String {
    format!(
        "Sounds good. Confirming at {}. Transferring you to a human rep.",
        format_dollars(rate)
    )
}

pub(crate) fn counter(target: f64) -> String {
    format!("I can do {}. Does that work?", format_dollars(target))
}

pub(crate) const REJECT_ATTEMPT_CAP: &str =
    "I appreciate the negotiation. We’re not aligned on rate, so I’ll have to pass this time.";

pub(crate) const REJECT_OUT_OF_BAND: &str = "We’re too far apart on rate for this load.";
