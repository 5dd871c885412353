//! Expiry policy evaluation
//!
//! A domain is due for renewal when the time left before it expires is
//! strictly shorter than its `min_days_remaining` threshold. A negative
//! threshold disables renewal entirely. The current instant is always passed
//! in by the caller so the decision is deterministic.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::error::{Error, Result};

/// Layout the registrar uses for expiry instants (`2026-01-02T15:04:05.000Z`)
pub const EXPIRY_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Outcome of an expiry evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalMode {
    /// Remaining time is below the threshold
    Renew,
    /// Nothing to do
    Skip,
}

/// Parse a registrar expiry timestamp
pub fn parse_expiry(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, EXPIRY_LAYOUT)
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::malformed_timestamp(value, e))
}

/// Render an instant in the registrar layout
pub fn format_expiry(instant: DateTime<Utc>) -> String {
    instant.format(EXPIRY_LAYOUT).to_string()
}

/// Decide whether a domain expiring at `expires` must be renewed at `now`
pub fn evaluate_mode(expires: &str, min_days_remaining: i64, now: DateTime<Utc>) -> Result<RenewalMode> {
    let expires = parse_expiry(expires)?;
    Ok(evaluate_mode_at(expires, min_days_remaining, now))
}

/// [`evaluate_mode`] over an already-parsed expiry
pub fn evaluate_mode_at(
    expires: DateTime<Utc>,
    min_days_remaining: i64,
    now: DateTime<Utc>,
) -> RenewalMode {
    if min_days_remaining < 0 {
        return RenewalMode::Skip;
    }

    let remaining = expires - now;
    match TimeDelta::try_days(min_days_remaining) {
        Some(threshold) if remaining < threshold => RenewalMode::Renew,
        Some(_) => RenewalMode::Skip,
        // A threshold too large to represent is longer than any remaining time.
        None => RenewalMode::Renew,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn expiring_in(delta: TimeDelta) -> String {
        format_expiry(now() + delta)
    }

    #[test]
    fn negative_threshold_never_renews() {
        for expires in [
            expiring_in(TimeDelta::days(-10)),
            expiring_in(TimeDelta::days(1)),
            expiring_in(TimeDelta::days(367)),
        ] {
            for min_days in [-1, -30, i64::MIN] {
                assert_eq!(evaluate_mode(&expires, min_days, now()).unwrap(), RenewalMode::Skip);
            }
        }
    }

    #[test]
    fn renews_when_remaining_is_below_threshold() {
        let in_one_day = expiring_in(TimeDelta::days(1));
        assert_eq!(evaluate_mode(&in_one_day, 30, now()).unwrap(), RenewalMode::Renew);

        let in_a_year = expiring_in(TimeDelta::days(365));
        assert_eq!(evaluate_mode(&in_a_year, 367, now()).unwrap(), RenewalMode::Renew);
    }

    #[test]
    fn skips_when_remaining_exceeds_threshold() {
        let in_31_days = expiring_in(TimeDelta::days(31));
        assert_eq!(evaluate_mode(&in_31_days, 30, now()).unwrap(), RenewalMode::Skip);

        let in_367_days = expiring_in(TimeDelta::days(367));
        assert_eq!(evaluate_mode(&in_367_days, 30, now()).unwrap(), RenewalMode::Skip);
    }

    #[test]
    fn threshold_is_strict() {
        let exactly_30 = expiring_in(TimeDelta::days(30));
        assert_eq!(evaluate_mode(&exactly_30, 30, now()).unwrap(), RenewalMode::Skip);

        let just_under = expiring_in(TimeDelta::days(30) - TimeDelta::milliseconds(1));
        assert_eq!(evaluate_mode(&just_under, 30, now()).unwrap(), RenewalMode::Renew);
    }

    #[test]
    fn expired_domain_with_zero_threshold_renews() {
        let expired = now() - TimeDelta::hours(1);
        assert_eq!(evaluate_mode_at(expired, 0, now()), RenewalMode::Renew);
    }

    #[test]
    fn huge_threshold_renews() {
        let in_a_year = now() + TimeDelta::days(365);
        assert_eq!(evaluate_mode_at(in_a_year, i64::MAX, now()), RenewalMode::Renew);
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        let err = evaluate_mode("next tuesday", 30, now()).unwrap_err();
        assert!(matches!(err, Error::MalformedTimestamp { ref value, .. } if value == "next tuesday"));
    }

    #[test]
    fn layout_round_trips() {
        let text = "2027-06-15T08:30:00.250Z";
        let parsed = parse_expiry(text).unwrap();
        assert_eq!(format_expiry(parsed), text);
    }
}
