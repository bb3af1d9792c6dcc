//! Partitions: a value seen at some generalization level

pub mod value;

pub use value::Value;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Token used for a fully suppressed value
pub const SUPPRESSED: &str = "*";

/// Representation of one or more raw values at a generalization level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Partition {
    /// A single value, possibly the suppression token
    Item(Value),

    /// A hierarchy node holding a set of values
    Set(BTreeSet<Value>),

    /// Inclusive integer interval
    IntRange { min: i64, max: i64 },

    /// Closed float interval
    FloatRange { min: f64, max: f64 },
}

impl Partition {
    pub fn item(value: impl Into<Value>) -> Self {
        Partition::Item(value.into())
    }

    /// Build a set partition from any collection of values
    pub fn set<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Partition::Set(values.into_iter().map(Into::into).collect())
    }

    /// Integer interval; inverted bounds collapse to the lower one
    pub fn int_range(min: i64, max: i64) -> Self {
        Partition::IntRange { min, max: max.max(min) }
    }

    /// Float interval; inverted bounds collapse to the lower one
    pub fn float_range(min: f64, max: f64) -> Self {
        Partition::FloatRange { min, max: if max < min { min } else { max } }
    }

    pub fn suppressed() -> Self {
        Partition::Item(Value::Text(SUPPRESSED.to_string()))
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Partition::Item(Value::Text(s)) if s == SUPPRESSED)
    }

    /// True when the partition stands for exactly one value
    pub fn is_point(&self) -> bool {
        match self {
            Partition::Item(_) => !self.is_suppressed(),
            Partition::Set(values) => values.len() == 1,
            Partition::IntRange { min, max } => min == max,
            Partition::FloatRange { min, max } => min == max,
        }
    }

    /// Whether a raw value falls inside this partition
    pub fn contains(&self, value: &Value) -> bool {
        match self {
            Partition::Item(_) if self.is_suppressed() => true,
            Partition::Item(item) => item == value,
            Partition::Set(values) => values.contains(value),
            Partition::IntRange { min, max } => match value {
                Value::Int(v) => min <= v && v <= max,
                _ => false,
            },
            Partition::FloatRange { min, max } => match value.as_f64() {
                Some(v) => *min <= v && v <= *max,
                None => false,
            },
        }
    }

    /// Whether every value covered by `other` is covered by `self`
    pub fn contains_partition(&self, other: &Partition) -> bool {
        if self.is_suppressed() {
            return true;
        }
        match other {
            Partition::Item(value) if !other.is_suppressed() => self.contains(value),
            Partition::Item(_) => false,
            Partition::Set(values) => values.iter().all(|v| self.contains(v)),
            Partition::IntRange { min: lo, max: hi } => match self {
                Partition::IntRange { min, max } => min <= lo && hi <= max,
                Partition::FloatRange { min, max } => *min <= *lo as f64 && *hi as f64 <= *max,
                _ => lo == hi && self.contains(&Value::Int(*lo)),
            },
            Partition::FloatRange { min: lo, max: hi } => match self {
                Partition::FloatRange { min, max } => min <= lo && hi <= max,
                _ => lo == hi && self.contains(&Value::Float(*lo)),
            },
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Item(value) => write!(f, "{}", value),
            Partition::Set(values) => write!(f, "[{}]", values.iter().join(", ")),
            Partition::IntRange { min, max } if min == max => write!(f, "[{}]", min),
            Partition::IntRange { min, max } => write!(f, "[{}..{}]", min, max),
            Partition::FloatRange { min, max } if min == max => write!(f, "({:.6})", min),
            Partition::FloatRange { min, max } => write!(f, "({:.6}..{:.6})", min, max),
        }
    }
}
