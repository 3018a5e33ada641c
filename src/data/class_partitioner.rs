// ============================================================
// Layer 4 — Frequency-Balanced Class Partitioner
// ============================================================
// Splits a frequency-ordered vocabulary into `num_classes`
// contiguous classes carrying roughly equal "sqrt mass":
//
//   total = Σ count
//   norm  = Σ sqrt(count / total)
//   df   += sqrt(count / total) / norm      (clamped to 1)
//
// df is updated with a word's own mass before the word is
// placed: once df passes the boundary (class_id + 1) /
// num_classes the id moves on, and the word that crossed the
// boundary opens the next class. The id advances at most one
// step per word and never past the last class.
//
// Why check for empty classes at all?
//   A single heavy head word can carry more than 1/num_classes
//   of the mass and skip class 0, and a tiny vocabulary cannot
//   fill many classes. Either leaves a hole in the start-index
//   table, which must strictly increase, so it is reported.
//
// Indices are handed out in input order, which is also the
// order the vocabulary file is written in.
//
// Reference: Mikolov et al. (2011) class-based RNN LM output layer
//            Rust Book §8 (Vectors)

use std::collections::HashMap;

use crate::domain::errors::ActionError;
use crate::domain::vocabulary::{ClassAssignment, VocabularyEntry, VocabularyTables, WordCount};

/// Assign indices and, when `num_classes > 0`, classes.
///
/// `ordered` must already be sorted most frequent first.
pub fn assemble(ordered: Vec<WordCount>, num_classes: usize) -> Result<VocabularyTables, ActionError> {
    if num_classes == 0 {
        let entries = ordered
            .into_iter()
            .enumerate()
            .map(|(index, w)| VocabularyEntry { index, count: w.count, word: w.word, class_index: 0 })
            .collect();
        return Ok(VocabularyTables { entries, classes: None });
    }

    let class_ids = partition(&ordered, num_classes);

    let mut entries       = Vec::with_capacity(ordered.len());
    let mut word_to_class = HashMap::with_capacity(ordered.len());
    let mut first_index   = vec![None; num_classes];

    for (index, (w, class_index)) in ordered.into_iter().zip(class_ids).enumerate() {
        // left boundary of this class
        first_index[class_index].get_or_insert(index);
        word_to_class.insert(w.word.clone(), class_index);
        entries.push(VocabularyEntry { index, count: w.count, word: w.word, class_index });
    }

    let mut class_starts = Vec::with_capacity(num_classes);
    for (class_index, start) in first_index.into_iter().enumerate() {
        let Some(start) = start else {
            return Err(ActionError::data(format!(
                "class {class_index} of {num_classes} received no words; \
                 lower the class count or enlarge the vocabulary"
            )));
        };
        class_starts.push(start);
    }

    Ok(VocabularyTables {
        entries,
        classes: Some(ClassAssignment::new(word_to_class, class_starts)),
    })
}

/// Class id for each word of `ordered`, in order.
pub fn partition(ordered: &[WordCount], num_classes: usize) -> Vec<usize> {
    let total: f64 = ordered.iter().map(|w| w.count).sum();
    if total <= 0.0 || num_classes == 0 {
        return vec![0; ordered.len()];
    }
    let norm: f64 = ordered.iter().map(|w| (w.count / total).sqrt()).sum();

    let last_class   = num_classes - 1;
    let mut df       = 0.0f64;
    let mut class_id = 0usize;
    let mut ids      = Vec::with_capacity(ordered.len());

    for w in ordered {
        df = (df + (w.count / total).sqrt() / norm).min(1.0);

        let boundary = (class_id + 1) as f64 / num_classes as f64;
        if df > boundary && class_id < last_class {
            class_id += 1;
        }
        ids.push(class_id);
    }
    ids
}
