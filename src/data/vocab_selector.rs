// ============================================================
// Layer 4 — Top-K Vocabulary Selection
// ============================================================
// Keeps the most frequent words and folds everything else into
// a single unknown-word bucket.
//
//   budget = target_vocab_size - 1     (one slot is reserved for UNK)
//
//   pop words from a max-heap until the budget is spent:
//     - an UNK word pulled from the heap is added to the bucket
//       and does not consume budget
//     - every other word is kept
//   every word left in the heap goes into the bucket
//
// Heap order is (count desc, word asc), so equal counts always
// come out in lexicographic order and runs are reproducible.
//
// Reference: std::collections::BinaryHeap documentation
//            Rust Book §8 (Collections)

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::domain::vocabulary::WordCount;

/// Heap item ordered by count, then by reversed word.
#[derive(Debug, Clone, PartialEq)]
pub struct PrioritizedWord(pub WordCount);

impl Eq for PrioritizedWord {}

impl Ord for PrioritizedWord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .count
            .total_cmp(&other.0.count)
            .then_with(|| other.0.word.cmp(&self.0.word))
    }
}

impl PartialOrd for PrioritizedWord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Result of top-K selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Kept words in extraction order (most frequent first)
    pub selected:  Vec<WordCount>,

    /// Total count folded into the unknown-word entry
    pub unk_count: f64,
}

/// Keep the top `target_vocab_size - 1` words, bucketing the rest.
pub fn select_top_k(
    words:             impl IntoIterator<Item = WordCount>,
    target_vocab_size: usize,
    unk_token:         &str,
) -> Selection {
    let mut heap: BinaryHeap<PrioritizedWord> =
        words.into_iter().map(PrioritizedWord).collect();

    let mut budget    = target_vocab_size.saturating_sub(1);
    let mut pulled    = 0usize;
    let mut unk_count = 0.0;
    let mut selected  = Vec::with_capacity(budget);

    while pulled < budget {
        let Some(PrioritizedWord(item)) = heap.pop() else { break };
        pulled += 1;
        if item.word == unk_token {
            unk_count += item.count;
            budget += 1;
        } else {
            selected.push(item);
        }
    }

    let folded = heap.len();
    unk_count += heap.into_iter().map(|p| p.0.count).sum::<f64>();

    tracing::debug!(
        "Selected {} words, folded {} into '{}' (count {})",
        selected.len(),
        folded,
        unk_token,
        unk_count
    );

    Selection { selected, unk_count }
}

/// Selected words plus the UNK entry, re-extracted most frequent first.
pub fn by_descending_frequency(selection: &Selection, unk_token: &str) -> Vec<WordCount> {
    let mut heap: BinaryHeap<PrioritizedWord> = selection
        .selected
        .iter()
        .cloned()
        .map(PrioritizedWord)
        .collect();
    heap.push(PrioritizedWord(WordCount::new(unk_token, selection.unk_count)));

    let mut ordered = Vec::with_capacity(heap.len());
    while let Some(PrioritizedWord(item)) = heap.pop() {
        ordered.push(item);
    }
    ordered
}
