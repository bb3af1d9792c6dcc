//! Range generalizers
//!
//! The domain is bisected repeatedly; every bisection step is one level.
//! Level 0 is the exact value and the coarsest level is the whole domain.
//! Values in a shallower branch of the bisection reach the exact value
//! earlier, so they keep it for the extra levels below.

use crate::generalization::Generalizer;
use crate::partition::{Partition, Value};

/// Float ranges are not split once narrower than this
pub const FLOAT_RESOLUTION: f64 = 1e-9;

/// A closed interval that can be bisected
trait Span: Copy + PartialEq {
    fn split(&self) -> Option<(Self, Self)>;
    fn covers(&self, other: &Self) -> bool;
    fn is_point(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct IntSpan {
    min: i64,
    max: i64,
}

impl Span for IntSpan {
    fn split(&self) -> Option<(Self, Self)> {
        if self.min >= self.max {
            return None;
        }
        // i128 keeps the full i64 domain from overflowing
        let mid = (self.min as i128 + (self.max as i128 - self.min as i128) / 2) as i64;
        Some((
            IntSpan { min: self.min, max: mid },
            IntSpan { min: mid + 1, max: self.max },
        ))
    }

    fn covers(&self, other: &Self) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    fn is_point(&self) -> bool {
        self.min == self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FloatSpan {
    min: f64,
    max: f64,
}

impl Span for FloatSpan {
    fn split(&self) -> Option<(Self, Self)> {
        let width = self.max - self.min;
        if width.is_finite() && width <= FLOAT_RESOLUTION {
            return None;
        }
        let mid = if width.is_finite() {
            self.min + width / 2.0
        } else {
            self.min / 2.0 + self.max / 2.0
        };
        // no representable value strictly inside the span
        if !(self.min < mid && mid < self.max) {
            return None;
        }
        Some((
            FloatSpan { min: self.min, max: mid },
            FloatSpan { min: mid, max: self.max },
        ))
    }

    fn covers(&self, other: &Self) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    fn is_point(&self) -> bool {
        self.min == self.max
    }
}

/// Ranges from the root down to `target`, root first
///
/// A point target below the finest range is appended as the last step.
/// Returns `None` when `target` is not one of the bisection ranges.
fn ancestors<S: Span>(root: S, target: S) -> Option<Vec<S>> {
    if !root.covers(&target) {
        return None;
    }

    let mut path = vec![root];
    let mut current = root;
    while current != target {
        match current.split() {
            Some((low, _)) if low.covers(&target) => current = low,
            Some((_, high)) if high.covers(&target) => current = high,
            _ => break,
        }
        path.push(current);
    }

    if current != target {
        if !target.is_point() {
            return None;
        }
        path.push(target);
    }
    Some(path)
}

/// Number of levels: the deepest path is the one down to `min`
fn span_levels<S: Span>(root: S, min: S) -> usize {
    ancestors(root, min).map_or(1, |path| path.len())
}

fn generalize_span<S: Span>(root: S, levels: usize, target: S, level: usize) -> Option<S> {
    if level >= levels {
        return None;
    }

    let path = ancestors(root, target)?;
    let depth = path.len() - 1;
    // Rounding can leave a float branch one bisection deeper than `min`
    let own_level = levels.saturating_sub(depth + 1);
    if level <= own_level {
        return Some(target);
    }
    path.get(levels - 1 - level).copied()
}

/// Bisecting generalizer over an inclusive integer domain
#[derive(Debug, Clone)]
pub struct IntRangeGeneralizer {
    domain: IntSpan,
    levels: usize,
}

impl IntRangeGeneralizer {
    pub fn new(min: i64, max: i64) -> Self {
        let domain = IntSpan { min, max: max.max(min) };
        let levels = span_levels(domain, IntSpan { min, max: min });
        Self { domain, levels }
    }
}

impl Generalizer for IntRangeGeneralizer {
    fn generalize(&self, partition: &Partition, level: usize) -> Option<Partition> {
        let Partition::IntRange { min, max } = *partition else {
            return None;
        };
        generalize_span(self.domain, self.levels, IntSpan { min, max }, level)
            .map(|span| Partition::int_range(span.min, span.max))
    }

    fn levels(&self) -> usize {
        self.levels
    }

    fn init_item(&self, value: Value) -> Partition {
        match value {
            Value::Int(v) => Partition::int_range(v, v),
            other => Partition::Item(other),
        }
    }
}

/// Bisecting generalizer over a closed float domain
#[derive(Debug, Clone)]
pub struct FloatRangeGeneralizer {
    domain: FloatSpan,
    levels: usize,
}

impl FloatRangeGeneralizer {
    pub fn new(min: f64, max: f64) -> Self {
        let domain = FloatSpan { min, max: if max < min { min } else { max } };
        let levels = span_levels(domain, FloatSpan { min, max: min });
        Self { domain, levels }
    }
}

impl Generalizer for FloatRangeGeneralizer {
    fn generalize(&self, partition: &Partition, level: usize) -> Option<Partition> {
        let Partition::FloatRange { min, max } = *partition else {
            return None;
        };
        generalize_span(self.domain, self.levels, FloatSpan { min, max }, level)
            .map(|span| Partition::float_range(span.min, span.max))
    }

    fn levels(&self) -> usize {
        self.levels
    }

    fn init_item(&self, value: Value) -> Partition {
        match value.as_f64() {
            Some(v) => Partition::float_range(v, v),
            None => Partition::Item(value),
        }
    }
}
