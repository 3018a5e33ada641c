// ============================================================
// Layer 3 — Vocabulary Domain Types
// ============================================================
// Plain data describing a class-based vocabulary:
//
//   WordCount        — one word and how often it was seen
//   VocabularyEntry  — one row of the final vocabulary table
//   ClassAssignment  — word → class id, plus the first vocabulary
//                      index of every class
//   VocabularyTables — everything the emitter writes to disk
//
// Two structural guarantees hold for every ClassAssignment
// built by data::class_partitioner:
//   - words of one class are contiguous in index order
//   - class start indices are strictly increasing
//
// Reference: Rust Book §5 (Structs), §8 (HashMap)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A word and its (real-valued) frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCount {
    pub word:  String,
    pub count: f64,
}

impl WordCount {
    pub fn new(word: impl Into<String>, count: f64) -> Self {
        Self { word: word.into(), count }
    }
}

/// One line of the vocabulary file: `index count word classIndex`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub index:       usize,
    pub count:       f64,
    pub word:        String,
    pub class_index: usize,
}

/// Word → class mapping together with the class → start index table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassAssignment {
    word_to_class: HashMap<String, usize>,
    class_starts:  Vec<usize>,
}

impl ClassAssignment {
    pub fn new(word_to_class: HashMap<String, usize>, class_starts: Vec<usize>) -> Self {
        Self { word_to_class, class_starts }
    }

    pub fn class_of(&self, word: &str) -> Option<usize> {
        self.word_to_class.get(word).copied()
    }

    /// First vocabulary index of each class, ordered by class id.
    pub fn class_starts(&self) -> &[usize] {
        &self.class_starts
    }

    pub fn num_classes(&self) -> usize {
        self.class_starts.len()
    }

    /// Start indices strictly increase with class id.
    pub fn is_strictly_increasing(&self) -> bool {
        self.class_starts.windows(2).all(|w| w[0] < w[1])
    }
}

/// The complete result of a vocabulary build.
#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyTables {
    pub entries: Vec<VocabularyEntry>,

    /// `None` when the build was run without classes
    pub classes: Option<ClassAssignment>,
}

impl VocabularyTables {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all emitted counts, UNK bucket included.
    pub fn total_count(&self) -> f64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Class id per vocabulary index — the word→class file body.
    pub fn word_to_class_column(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.class_index).collect()
    }

    /// Class ids never decrease when scanning by index.
    pub fn classes_are_contiguous(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| w[0].class_index <= w[1].class_index)
    }

    pub fn entry(&self, word: &str) -> Option<&VocabularyEntry> {
        self.entries.iter().find(|e| e.word == word)
    }
}
