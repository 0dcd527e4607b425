//! Semantic column classification.
//!
//! A column's kind is decided once from the share of its non-missing values
//! that read as dates or numbers. The cut-offs live in [`InferenceThresholds`]
//! so callers and tests can move them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    data::Value,
    dates,
    error::{ReadError, ReadResult},
};

pub const DEFAULT_DATE_RATIO: f64 = 0.8;
pub const DEFAULT_NUMERIC_RATIO: f64 = 0.8;
pub const DEFAULT_CATEGORICAL_RATIO: f64 = 0.3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    DateTime,
    Text,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::DateTime => "datetime",
            ColumnKind::Text => "text",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InferenceThresholds {
    /// Share of values that must be dates for `DateTime`.
    pub date_ratio: f64,
    /// Share of values that must be numeric for `Numeric`.
    pub numeric_ratio: f64,
    /// Share of values that must be numeric for `Categorical`.
    pub categorical_ratio: f64,
}

impl Default for InferenceThresholds {
    fn default() -> Self {
        Self {
            date_ratio: DEFAULT_DATE_RATIO,
            numeric_ratio: DEFAULT_NUMERIC_RATIO,
            categorical_ratio: DEFAULT_CATEGORICAL_RATIO,
        }
    }
}

impl InferenceThresholds {
    pub fn validate(&self) -> ReadResult<()> {
        for (name, ratio) in [
            ("date_ratio", self.date_ratio),
            ("numeric_ratio", self.numeric_ratio),
            ("categorical_ratio", self.categorical_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(ReadError::config(format!(
                    "inference.{name} must be between 0 and 1 (got {ratio})"
                )));
            }
        }
        if self.categorical_ratio > self.numeric_ratio {
            return Err(ReadError::config(
                "inference.categorical_ratio cannot exceed inference.numeric_ratio",
            ));
        }
        Ok(())
    }

    /// Classifies a sequence of values. Missing values are not counted; a
    /// column with no observed values is `Text`.
    pub fn classify<'a, I>(&self, values: I) -> ColumnKind
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut candidate = TypeCandidate::default();
        for value in values {
            candidate.update(value);
        }
        candidate.decide(self)
    }
}

#[derive(Debug, Clone, Default)]
struct TypeCandidate {
    observed: usize,
    date_matches: usize,
    numeric_matches: usize,
}

impl TypeCandidate {
    fn update(&mut self, value: &Value) {
        match value {
            Value::Absent => return,
            Value::Date(_) => self.date_matches += 1,
            Value::Number(_) => self.numeric_matches += 1,
            Value::Text(text) => {
                if dates::looks_like_date(text) {
                    self.date_matches += 1;
                } else if value.as_f64().is_some() {
                    self.numeric_matches += 1;
                }
            }
        }
        self.observed += 1;
    }

    fn ratio(&self, count: usize) -> f64 {
        count as f64 / self.observed as f64
    }

    fn decide(&self, thresholds: &InferenceThresholds) -> ColumnKind {
        if self.observed == 0 {
            return ColumnKind::Text;
        }
        if self.ratio(self.date_matches) > thresholds.date_ratio {
            ColumnKind::DateTime
        } else if self.ratio(self.numeric_matches) > thresholds.numeric_ratio {
            ColumnKind::Numeric
        } else if self.ratio(self.numeric_matches) > thresholds.categorical_ratio {
            ColumnKind::Categorical
        } else {
            ColumnKind::Text
        }
    }
}
