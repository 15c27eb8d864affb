use super::conflict::Interval;

/// Billable total for a shift: hours in `window` times `hourly_rate`.
///
/// No rounding happens here. Stored totals keep full precision so repeated
/// edits never accumulate error; round with [`round_to_cents`] when presenting.
pub fn shift_cost(window: &Interval, hourly_rate: f64) -> f64 {
    let hours = window.duration().as_seconds_f64() / 3600.0;
    hours * hourly_rate
}

pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
