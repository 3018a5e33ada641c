// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Turns raw text into vocabulary tables and label lists.
//
// The vocabulary pipeline flows in this order:
//
//   corpus file
//       │
//       ▼
//   TextCorpus + SentenceFramer  → lines framed with <s> … </s>
//       │
//       ▼
//   count_words                  → word → frequency table
//       │
//       ▼
//   select_top_k                 → kept words + UNK bucket
//       │
//       ▼
//   by_descending_frequency      → re-extracted, most frequent first
//       │
//       ▼
//   assemble                     → indices, classes, class starts
//
// Each module is responsible for exactly one step.

/// Corpus line source and sentence boundary framing
pub mod corpus;

/// Word frequency counting
pub mod word_counter;

/// Heap-based top-K selection with unknown-word bucketing
pub mod vocab_selector;

/// Frequency-balanced class assignment
pub mod class_partitioner;

/// Distinct label extraction for label maps
pub mod label_reader;
