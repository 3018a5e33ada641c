// ============================================================
// Layer 4 — Word Counter
// ============================================================
// Scans a framed corpus and counts every token except the
// first one on each line. The first token is the line's id or
// label slot; once a line is framed it is the begin token.
//
// The counter also remembers how many tokens it counted so the
// vocabulary builder can check that no mass was lost.
//
// Reference: Rust Book §8 (Storing Keys with Associated Values)

use anyhow::Result;
use std::collections::HashMap;

use crate::data::corpus::{tokenize, SentenceFramer};
use crate::domain::traits::LineSource;
use crate::domain::vocabulary::WordCount;

/// Word → frequency table built from one corpus pass.
#[derive(Debug, Clone, Default)]
pub struct WordCounts {
    counts:       HashMap<String, f64>,
    total_tokens: f64,
    lines:        usize,
}

impl WordCounts {
    pub fn add(&mut self, word: &str) {
        *self.counts.entry(word.to_string()).or_insert(0.0) += 1.0;
        self.total_tokens += 1.0;
    }

    pub fn get(&self, word: &str) -> Option<f64> {
        self.counts.get(word).copied()
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total_tokens(&self) -> f64 {
        self.total_tokens
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Distinct words whose count is strictly above `cutoff`.
    /// A non-positive cutoff keeps every word.
    pub fn count_above_cutoff(&self, cutoff: i64) -> usize {
        if cutoff <= 0 {
            return self.counts.len();
        }
        let threshold = cutoff as f64;
        self.counts.values().filter(|&&c| c > threshold).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = WordCount> + '_ {
        self.counts.iter().map(|(w, &c)| WordCount::new(w.clone(), c))
    }
}

/// Count every framed line of `source`.
pub fn count_words(source: &dyn LineSource, framer: &SentenceFramer) -> Result<WordCounts> {
    let mut counts = WordCounts::default();

    for line in source.lines()? {
        let framed = framer.frame(&line?);
        for token in tokenize(&framed).skip(1) {
            counts.add(token);
        }
        counts.lines += 1;
    }

    tracing::debug!(
        "Counted {} tokens over {} lines ({} distinct words)",
        counts.total_tokens,
        counts.lines,
        counts.len()
    );
    Ok(counts)
}
