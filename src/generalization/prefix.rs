//! Word-prefix generalization for free text

use crate::generalization::Generalizer;
use crate::partition::{Partition, Value};

/// Treats text as a sequence of at most `max_words` words
///
/// Level n keeps the first `max_words - n` words, so with `max_words = 5`
/// the text "cats are wild" generalizes to "cats are" at level 3. Level
/// `max_words` is the suppression token. Whitespace is normalized to single
/// spaces.
#[derive(Debug, Clone)]
pub struct PrefixGeneralizer {
    max_words: usize,
}

impl PrefixGeneralizer {
    pub fn new(max_words: usize) -> Self {
        Self { max_words }
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }
}

impl Generalizer for PrefixGeneralizer {
    fn generalize(&self, partition: &Partition, level: usize) -> Option<Partition> {
        if level >= self.levels() {
            return None;
        }

        let text = match partition {
            Partition::Item(Value::Text(text)) => text,
            _ => return Some(Partition::suppressed()),
        };
        if level == self.max_words || text.trim().is_empty() {
            return Some(Partition::suppressed());
        }

        let prefix = text
            .split_whitespace()
            .take(self.max_words - level)
            .collect::<Vec<_>>()
            .join(" ");
        Some(Partition::item(prefix))
    }

    fn levels(&self) -> usize {
        self.max_words + 1
    }
}
