use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Textual forms of the "no data" marker written by the crop model.
pub const MISSING_TOKENS: &[&str] = &["-99", "-99.0", "-99.9", "-99.99"];

/// Numeric forms of the same marker. Compared exactly, not with a tolerance.
pub const MISSING_NUMBERS: &[f64] = &[-99.0, -99.9, -99.99];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Value {
    #[default]
    Absent,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    /// Coerces one raw token from a data row. Sentinels and empty tokens become
    /// `Absent`, numbers become `Number`, and everything else is kept as `Text`.
    pub fn parse(token: &str) -> Self {
        let trimmed = token.trim();
        if trimmed.is_empty() || is_missing_token(trimmed) {
            return Value::Absent;
        }
        match trimmed.parse::<f64>() {
            Ok(number) => Value::number(number),
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }

    /// Wraps a float, folding sentinels and NaN into `Absent`.
    pub fn number(value: f64) -> Self {
        if value.is_nan() || is_missing_number(value) {
            Value::Absent
        } else {
            Value::Number(value)
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() || is_missing_token(value.trim()) {
            Value::Absent
        } else {
            Value::Text(value)
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Numeric view of the value. Text is re-parsed so that identifiers kept as
    /// text (e.g. treatment numbers) still compare numerically.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => match s.trim().parse::<f64>() {
                Ok(n) if !n.is_nan() && !is_missing_number(n) => Some(n),
                _ => None,
            },
            Value::Absent | Value::Date(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Absent => String::new(),
            Value::Number(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::text(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

pub fn is_missing_token(value: &str) -> bool {
    MISSING_TOKENS.contains(&value)
}

pub fn is_missing_number(value: f64) -> bool {
    MISSING_NUMBERS.contains(&value)
}

/// Splits on runs of whitespace. Data rows and header lines are both
/// tokenized this way.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Forces a token list to exactly `width` entries, padding with empty tokens
/// (which coerce to `Absent`) or dropping the tail.
pub fn fit_row(mut tokens: Vec<String>, width: usize) -> Vec<String> {
    tokens.resize(width, String::new());
    tokens
}
