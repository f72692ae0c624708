//! # Date Math
//!
//! Relative date expressions used as arguments of relational specs on Date
//! rules: `now`, `+1h`, `-2 days`, `+3mo`.
//!
//! | unit         | aliases                                 |
//! |--------------|-----------------------------------------|
//! | years        | `years`, `year`, `yr`, `Y`              |
//! | months       | `months`, `month`, `mo`, `M`            |
//! | weeks        | `weeks`, `week`, `w`                    |
//! | days         | `days`, `day`, `d`                      |
//! | hours        | `hours`, `hour`, `h`                    |
//! | minutes      | `minutes`, `minute`, `m`                |
//! | seconds      | `seconds`, `second`, `s`                |
//! | milliseconds | `milliseconds`, `millisecond`, `ms`     |

use chrono::{DateTime, Months, TimeDelta, Utc};
use strum_macros::{Display, EnumString};
use thiserror::Error;

pub const NOW: &str = "now";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateMathError {
    #[error("`{0}` is not a date expression; expected `now`, `+N<unit>` or `-N<unit>`")]
    Malformed(String),
    #[error("invalid range: `{0}`")]
    UnknownUnit(String),
    #[error("`{0}` is out of the representable date range")]
    OutOfRange(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum Unit {
    #[strum(serialize = "years", serialize = "year", serialize = "yr", serialize = "Y")]
    Years,
    #[strum(serialize = "months", serialize = "month", serialize = "mo", serialize = "M")]
    Months,
    #[strum(serialize = "weeks", serialize = "week", serialize = "w")]
    Weeks,
    #[strum(serialize = "days", serialize = "day", serialize = "d")]
    Days,
    #[strum(serialize = "hours", serialize = "hour", serialize = "h")]
    Hours,
    #[strum(serialize = "minutes", serialize = "minute", serialize = "m")]
    Minutes,
    #[strum(serialize = "seconds", serialize = "second", serialize = "s")]
    Seconds,
    #[strum(serialize = "milliseconds", serialize = "millisecond", serialize = "ms")]
    Milliseconds,
}

/// Resolves date expressions against some notion of "now".
pub trait DateResolver: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn resolve(&self, expression: &str) -> Result<DateTime<Utc>, DateMathError> {
        resolve_at(expression, self.now())
    }
}

/// Resolves against the wall clock at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl DateResolver for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Resolves against a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl DateResolver for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Splits `+N unit` into its sign, quantity and unit.
pub fn parse(expression: &str) -> Result<Option<(i64, Unit)>, DateMathError> {
    let expression = expression.trim();
    if expression == NOW {
        return Ok(None);
    }
    let malformed = || DateMathError::Malformed(expression.to_string());

    let (sign, rest) = match expression.chars().next() {
        Some('+') => (1, &expression[1..]),
        Some('-') => (-1, &expression[1..]),
        _ => return Err(malformed()),
    };
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return Err(malformed());
    }
    let quantity: i64 = rest[..digits].parse().map_err(|_| malformed())?;
    let unit_text = rest[digits..].trim();
    let unit = unit_text
        .parse::<Unit>()
        .map_err(|_| DateMathError::UnknownUnit(unit_text.to_string()))?;
    Ok(Some((sign * quantity, unit)))
}

pub fn is_expression(expression: &str) -> bool {
    parse(expression).is_ok()
}

/// Applies `expression` to `now`.
pub fn resolve_at(expression: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, DateMathError> {
    let Some((quantity, unit)) = parse(expression)? else {
        return Ok(now);
    };
    let out_of_range = || DateMathError::OutOfRange(expression.trim().to_string());

    let shifted = match unit {
        Unit::Years | Unit::Months => {
            let months = if unit == Unit::Years {
                quantity.checked_mul(12).ok_or_else(out_of_range)?
            } else {
                quantity
            };
            let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| out_of_range())?;
            if months >= 0 {
                now.checked_add_months(Months::new(magnitude))
            } else {
                now.checked_sub_months(Months::new(magnitude))
            }
        }
        _ => {
            let delta = match unit {
                Unit::Weeks => TimeDelta::try_weeks(quantity),
                Unit::Days => TimeDelta::try_days(quantity),
                Unit::Hours => TimeDelta::try_hours(quantity),
                Unit::Minutes => TimeDelta::try_minutes(quantity),
                Unit::Seconds => TimeDelta::try_seconds(quantity),
                _ => TimeDelta::try_milliseconds(quantity),
            }
            .ok_or_else(out_of_range)?;
            now.checked_add_signed(delta)
        }
    };
    shifted.ok_or_else(out_of_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_now() {
        assert_eq!(resolve_at("now", at()).unwrap(), at());
        assert_eq!(FixedClock(at()).resolve(" now ").unwrap(), at());
    }

    #[test]
    fn test_units() {
        let cases = [
            ("+1h", Utc.with_ymd_and_hms(2020, 1, 31, 13, 0, 0).unwrap()),
            ("-90 minutes", Utc.with_ymd_and_hms(2020, 1, 31, 10, 30, 0).unwrap()),
            ("+2d", Utc.with_ymd_and_hms(2020, 2, 2, 12, 0, 0).unwrap()),
            ("-1w", Utc.with_ymd_and_hms(2020, 1, 24, 12, 0, 0).unwrap()),
            ("+1mo", Utc.with_ymd_and_hms(2020, 2, 29, 12, 0, 0).unwrap()),
            ("-1Y", Utc.with_ymd_and_hms(2019, 1, 31, 12, 0, 0).unwrap()),
            ("+30s", Utc.with_ymd_and_hms(2020, 1, 31, 12, 0, 30).unwrap()),
        ];
        for (expression, expected) in cases {
            assert_eq!(resolve_at(expression, at()).unwrap(), expected, "{expression}");
        }
        assert_eq!(
            resolve_at("+250ms", at()).unwrap() - at(),
            TimeDelta::milliseconds(250)
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            resolve_at("tomorrow", at()),
            Err(DateMathError::Malformed("tomorrow".into()))
        );
        assert_eq!(
            resolve_at("+h", at()),
            Err(DateMathError::Malformed("+h".into()))
        );
        assert_eq!(
            resolve_at("+3 fortnights", at()),
            Err(DateMathError::UnknownUnit("fortnights".into()))
        );
        assert!(matches!(
            resolve_at("+999999999999Y", at()),
            Err(DateMathError::OutOfRange(_))
        ));
        assert!(!is_expression("2020-01-01"));
        assert!(is_expression("-5 days"));
    }
}
