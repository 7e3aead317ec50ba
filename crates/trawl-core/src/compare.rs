//! Human-readable size and age comparisons such as `"<10kb"` or
//! `">= 2 days"`.

use std::str::FromStr;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ExpressionError;

const SECS_PER_MINUTE: f64 = 60.0;
const SECS_PER_HOUR: f64 = 60.0 * SECS_PER_MINUTE;
const SECS_PER_DAY: f64 = 24.0 * SECS_PER_HOUR;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum Operator {
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessOrEqual,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterOrEqual,
    #[strum(serialize = "=", serialize = "==")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
}

impl Operator {
    /// Apply the operator to `actual <op> expected`.
    pub fn holds(self, actual: f64, expected: f64) -> bool {
        match self {
            Self::Less => actual < expected,
            Self::LessOrEqual => actual <= expected,
            Self::Greater => actual > expected,
            Self::GreaterOrEqual => actual >= expected,
            Self::Equal => actual == expected,
            Self::NotEqual => actual != expected,
        }
    }
}

/// Split an expression into operator, number and unit suffix.
fn split(expression: &str) -> Result<(Operator, f64, String), ExpressionError> {
    let s = expression.trim();
    if s.is_empty() {
        return Err(ExpressionError::new(expression, "empty expression"));
    }

    let op_len = s
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '!'))
        .unwrap_or(s.len());
    let (op_str, rest) = s.split_at(op_len);
    let op = if op_str.is_empty() {
        Operator::Equal
    } else {
        Operator::from_str(op_str)
            .map_err(|_| ExpressionError::new(expression, format!("unknown operator `{op_str}`")))?
    };

    let rest = rest.trim_start();
    let num_len = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let (num_str, unit) = rest.split_at(num_len);
    if num_str.is_empty() {
        return Err(ExpressionError::new(expression, "missing number"));
    }
    let value: f64 = num_str
        .parse()
        .map_err(|_| ExpressionError::new(expression, format!("invalid number `{num_str}`")))?;

    Ok((op, value, unit.trim().to_lowercase()))
}

/// A comparison against a byte count, e.g. `"<10kb"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeComparison {
    /// Operator.
    pub op: Operator,
    /// Right-hand side in bytes.
    pub bytes: f64,
}

impl SizeComparison {
    /// Parse a size expression. A bare number is a byte count.
    pub fn parse(expression: &str) -> Result<Self, ExpressionError> {
        let (op, value, unit) = split(expression)?;
        let multiplier: f64 = match unit.as_str() {
            "" | "b" => 1.0,
            "k" | "kb" => 1024.0,
            "m" | "mb" => 1024.0 * 1024.0,
            "g" | "gb" => 1024.0 * 1024.0 * 1024.0,
            "t" | "tb" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
            other => {
                return Err(ExpressionError::new(
                    expression,
                    format!("unknown size unit `{other}`"),
                ));
            }
        };
        Ok(Self {
            op,
            bytes: value * multiplier,
        })
    }

    /// Whether a byte count satisfies the comparison.
    pub fn matches(&self, size: u64) -> bool {
        self.op.holds(size as f64, self.bytes)
    }
}

/// A comparison against the age of a timestamp, e.g. `"< 2 days"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeComparison {
    /// Operator.
    pub op: Operator,
    /// Right-hand side in seconds.
    pub seconds: f64,
}

impl AgeComparison {
    /// Parse an age expression. A bare number is a count of days.
    pub fn parse(expression: &str) -> Result<Self, ExpressionError> {
        let (op, value, unit) = split(expression)?;
        let multiplier = match unit.as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
            "min" | "mins" | "minute" | "minutes" => SECS_PER_MINUTE,
            "h" | "hr" | "hrs" | "hour" | "hours" => SECS_PER_HOUR,
            "" | "d" | "day" | "days" => SECS_PER_DAY,
            "w" | "week" | "weeks" => 7.0 * SECS_PER_DAY,
            "month" | "months" => 30.0 * SECS_PER_DAY,
            "y" | "year" | "years" => 365.0 * SECS_PER_DAY,
            other => {
                return Err(ExpressionError::new(
                    expression,
                    format!("unknown time unit `{other}`"),
                ));
            }
        };
        Ok(Self {
            op,
            seconds: value * multiplier,
        })
    }

    /// Whether the age of `time` relative to `now` satisfies the
    /// comparison. Timestamps in the future have age zero.
    pub fn matches_at(&self, time: SystemTime, now: SystemTime) -> bool {
        let age = now.duration_since(time).unwrap_or(Duration::ZERO);
        self.op.holds(age.as_secs_f64(), self.seconds)
    }

    /// Whether the age of `time` right now satisfies the comparison.
    pub fn matches(&self, time: SystemTime) -> bool {
        self.matches_at(time, SystemTime::now())
    }
}
