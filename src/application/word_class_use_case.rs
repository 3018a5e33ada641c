// ============================================================
// Layer 2 — WordClassUseCase (write-word-and-class)
// ============================================================
// Builds the vocabulary tables for a class-based output layer:
//
//   Step 1: Validate the configuration
//   Step 2: Make mode: stop if every output is up to date  (Layer 6 - infra)
//   Step 3: Frame and count the corpus                      (Layer 4 - data)
//   Step 4: Apply the cutoff, clamp the vocabulary size     (Layer 4 - data)
//   Step 5: Top-K selection with UNK bucketing              (Layer 4 - data)
//   Step 6: Order by frequency, partition into classes      (Layer 4 - data)
//   Step 7: Write vocabulary, word2cls and cls2index        (Layer 6 - infra)
//
// Every count the corpus produced ends up in exactly one
// vocabulary line (the UNK line absorbs the rest), so the
// vocabulary counts always sum to the number of tokens read.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::{
    class_partitioner::assemble,
    corpus::{SentenceFramer, TextCorpus},
    vocab_selector::{by_descending_frequency, select_top_k},
    word_counter::count_words,
};
use crate::domain::errors::ActionError;
use crate::domain::traits::FreshnessOracle;
use crate::domain::vocabulary::VocabularyTables;
use crate::infra::{
    freshness::FileFreshness,
    table_writer::{write_class_to_index, write_vocabulary, write_word_to_class},
};

// ─── Configuration ───────────────────────────────────────────────────────────
/// Settings of one `write-word-and-class` run.
///
/// `vocab_size` counts the UNK entry, so a size of N keeps the
/// N-1 most frequent words. `cutoff` is compared with `>`: a
/// word seen exactly `cutoff` times does not count toward the
/// size. Both class outputs are required once `nbr_class > 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordClassConfig {
    pub input_file:        PathBuf,
    pub output_vocab_file: PathBuf,
    pub output_word2cls:   Option<PathBuf>,
    pub output_cls2index:  Option<PathBuf>,
    pub vocab_size:        usize,
    pub nbr_class:         usize,
    pub cutoff:            i64,
    pub unk:               String,
    pub begin_sequence:    String,
    pub end_sequence:      String,
    pub make_mode:         bool,
}

impl Default for WordClassConfig {
    fn default() -> Self {
        Self {
            input_file:        PathBuf::new(),
            output_vocab_file: PathBuf::new(),
            output_word2cls:   None,
            output_cls2index:  None,
            vocab_size:        0,
            nbr_class:         0,
            cutoff:            1,
            unk:               "<unk>".to_string(),
            begin_sequence:    String::new(),
            end_sequence:      String::new(),
            make_mode:         true,
        }
    }
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq)]
pub enum WordClassOutcome {
    /// Make mode found nothing to do; no file was touched
    UpToDate,

    /// Tables were rebuilt and written; `total_tokens` equals the
    /// sum of all vocabulary counts
    Written {
        tables:       VocabularyTables,
        total_tokens: f64,
    },
}

// ─── WordClassUseCase ────────────────────────────────────────────────────────
/// Corpus in, vocabulary tables out.
///
/// Why is the freshness check a type parameter?
///   Make mode compares modification times, which tests cannot
///   control reliably. Production code uses `FileFreshness`;
///   tests pass an oracle that answers directly.
pub struct WordClassUseCase<F: FreshnessOracle = FileFreshness> {
    config:    WordClassConfig,
    freshness: F,
}

impl WordClassUseCase<FileFreshness> {
    /// Use case that checks freshness against file timestamps.
    pub fn new(config: WordClassConfig) -> Self {
        Self::with_freshness(config, FileFreshness)
    }
}

impl<F: FreshnessOracle> WordClassUseCase<F> {
    pub fn with_freshness(config: WordClassConfig, freshness: F) -> Self {
        Self { config, freshness }
    }

    /// Run all seven steps.
    ///
    /// Configuration problems fail before the corpus is opened.
    /// When make mode finds every output newer than the input the
    /// result is `UpToDate` and nothing is read or written.
    pub fn execute(&self) -> Result<WordClassOutcome> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        let framer = SentenceFramer::new(&cfg.begin_sequence, &cfg.end_sequence)?;
        if cfg.vocab_size < 2 {
            bail!(ActionError::config(format!(
                "vocabulary size must be at least 2 (one word plus '{}'), got {}",
                cfg.unk, cfg.vocab_size
            )));
        }
        let class_outputs = self.class_outputs()?;

        // ── Step 2: Make mode ─────────────────────────────────────────────────
        let mut outputs: Vec<&Path> = vec![cfg.output_vocab_file.as_path()];
        if let Some((w2c, c2i)) = class_outputs {
            outputs.push(w2c);
            outputs.push(c2i);
        }
        if cfg.make_mode
            && outputs
                .iter()
                .all(|out| self.freshness.is_up_to_date(out, &cfg.input_file))
        {
            tracing::info!("All output files up to date");
            return Ok(WordClassOutcome::UpToDate);
        }

        // ── Step 3: Count ─────────────────────────────────────────────────────
        tracing::info!("Counting words in '{}'", cfg.input_file.display());
        let counts = count_words(&TextCorpus::new(&cfg.input_file), &framer)?;
        tracing::info!(
            "Read {} lines, {} tokens, {} distinct words",
            counts.lines(),
            counts.total_tokens(),
            counts.len()
        );

        // ── Step 4: Cutoff ────────────────────────────────────────────────────
        let above_cutoff = counts.count_above_cutoff(cfg.cutoff);
        if above_cutoff == 0 {
            bail!(ActionError::data(format!(
                "no word occurs more than {} times in '{}'",
                cfg.cutoff,
                cfg.input_file.display()
            )));
        }

        let mut vocab_size = cfg.vocab_size;
        if vocab_size > above_cutoff {
            tracing::warn!(
                "Required vocabulary size {} is larger than the number of words above cutoff; \
                 actual size {} (size after cutoff {})",
                cfg.vocab_size,
                above_cutoff,
                above_cutoff
            );
            vocab_size = above_cutoff;
        }
        if vocab_size < 2 {
            bail!(ActionError::data(format!(
                "only {above_cutoff} word(s) above cutoff {}; a vocabulary needs at least 2 entries",
                cfg.cutoff
            )));
        }

        // ── Step 5: Top-K ─────────────────────────────────────────────────────
        let selection = select_top_k(counts.iter(), vocab_size, &cfg.unk);

        // ── Step 6: Order and partition ───────────────────────────────────────
        let ordered = by_descending_frequency(&selection, &cfg.unk);
        let tables  = assemble(ordered, cfg.nbr_class)?;

        // ── Step 7: Write ─────────────────────────────────────────────────────
        write_vocabulary(&cfg.output_vocab_file, &tables)?;
        if let (Some((w2c, c2i)), Some(classes)) = (class_outputs, &tables.classes) {
            write_word_to_class(w2c, &tables)?;
            write_class_to_index(c2i, classes.class_starts())?;
        }

        tracing::info!(
            "Vocabulary of {} words ({} in '{}'), {} classes",
            tables.len(),
            selection.unk_count,
            cfg.unk,
            cfg.nbr_class
        );
        Ok(WordClassOutcome::Written { tables, total_tokens: counts.total_tokens() })
    }

    /// Both class tables are required as soon as classes are requested.
    fn class_outputs(&self) -> Result<Option<(&Path, &Path)>> {
        let cfg = &self.config;
        if cfg.nbr_class == 0 {
            return Ok(None);
        }
        match (&cfg.output_word2cls, &cfg.output_cls2index) {
            (Some(w2c), Some(c2i)) => Ok(Some((w2c.as_path(), c2i.as_path()))),
            _ => bail!(ActionError::config(
                "outputWord2Cls and outputCls2Index are required when nbrClass > 0"
            )),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::category;
    use std::fs;
    use tempfile::TempDir;

    struct AlwaysFresh;

    impl FreshnessOracle for AlwaysFresh {
        fn is_up_to_date(&self, _output: &Path, _input: &Path) -> bool {
            true
        }
    }

    fn setup(corpus: &str) -> (TempDir, WordClassConfig) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("train.txt");
        fs::write(&input, corpus).unwrap();
        let config = WordClassConfig {
            input_file:        input,
            output_vocab_file: dir.path().join("out/vocab.txt"),
            vocab_size:        3,
            cutoff:            0,
            begin_sequence:    "<s>".into(),
            end_sequence:      "</s>".into(),
            ..Default::default()
        };
        (dir, config)
    }

    fn written(outcome: WordClassOutcome) -> (VocabularyTables, f64) {
        match outcome {
            WordClassOutcome::Written { tables, total_tokens } => (tables, total_tokens),
            other => panic!("expected Written, got {other:?}"),
        }
    }

    #[test]
    fn test_single_line_vocabulary() {
        let (_dir, config) = setup("a a a a b b c\n");
        let vocab_path = config.output_vocab_file.clone();
        let (tables, total) = written(WordClassUseCase::new(config).execute().unwrap());

        assert_eq!(total, 8.0);
        let words: Vec<(&str, f64)> =
            tables.entries.iter().map(|e| (e.word.as_str(), e.count)).collect();
        assert_eq!(words, vec![("a", 4.0), ("<unk>", 2.0), ("b", 2.0)]);
        assert_eq!(
            fs::read_to_string(vocab_path).unwrap(),
            "     0\t     4\ta\t0\n     1\t     2\t<unk>\t0\n     2\t     2\tb\t0\n"
        );
    }

    #[test]
    fn test_counts_are_conserved() {
        let corpus = "the cat sat on the mat\nthe dog sat\na cat and a dog\n";
        let (_dir, mut config) = setup(corpus);
        config.vocab_size = 5;
        let (tables, total) = written(WordClassUseCase::new(config).execute().unwrap());
        assert_eq!(tables.total_count(), total);
        assert_eq!(tables.len(), 5);
    }

    #[test]
    fn test_classes_written_and_contiguous() {
        let (dir, mut config) = setup("a a a a b b c\n");
        config.vocab_size       = 10;
        config.nbr_class        = 2;
        config.output_word2cls  = Some(dir.path().join("out/word2cls.txt"));
        config.output_cls2index = Some(dir.path().join("out/cls2idx.txt"));

        let (tables, _) = written(WordClassUseCase::new(config).execute().unwrap());

        // clamped to the 4 distinct words: a, b, </s>, then <unk> holding c
        let words: Vec<&str> = tables.entries.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["a", "b", "</s>", "<unk>"]);
        assert!(tables.classes_are_contiguous());

        let classes = tables.classes.as_ref().unwrap();
        // b pushes df past the halfway boundary and opens class 1
        assert_eq!(classes.class_starts(), &[0, 1]);
        assert!(classes.is_strictly_increasing());
        assert_eq!(
            fs::read_to_string(dir.path().join("out/word2cls.txt")).unwrap(),
            "0\n1\n1\n1\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("out/cls2idx.txt")).unwrap(),
            "0\n1\n"
        );
    }

    #[test]
    fn test_unk_in_corpus_takes_no_vocabulary_slot() {
        let (_dir, config) = setup("<unk> <unk> <unk> a a b c\n");
        let (tables, total) = written(WordClassUseCase::new(config).execute().unwrap());

        // a and </s> fill the two word slots; b and c join the corpus <unk>s
        let words: Vec<(&str, f64)> =
            tables.entries.iter().map(|e| (e.word.as_str(), e.count)).collect();
        assert_eq!(words, vec![("<unk>", 5.0), ("a", 2.0), ("</s>", 1.0)]);
        assert_eq!(tables.entries.iter().map(|e| e.count).sum::<f64>(), total);
    }

    #[test]
    fn test_small_vocabulary_many_classes() {
        let (dir, mut config) = setup("a b c\n");
        config.vocab_size       = 4;
        config.nbr_class        = 4;
        config.output_word2cls  = Some(dir.path().join("out/word2cls.txt"));
        config.output_cls2index = Some(dir.path().join("out/cls2idx.txt"));

        let (tables, _) = written(WordClassUseCase::new(config).execute().unwrap());

        let words: Vec<&str> = tables.entries.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["</s>", "<unk>", "a", "b"]);
        assert_eq!(tables.classes.as_ref().unwrap().class_starts(), &[0, 1, 2, 3]);
        assert_eq!(
            fs::read_to_string(dir.path().join("out/word2cls.txt")).unwrap(),
            "0\n1\n2\n3\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("out/cls2idx.txt")).unwrap(),
            "0\n1\n2\n3\n"
        );
    }

    #[test]
    fn test_latin1_corpus_is_counted() {
        let (_dir, config) = setup("");
        fs::write(&config.input_file, b"caf\xe9 caf\xe9 bar\n").unwrap();
        let (tables, total) = written(WordClassUseCase::new(config).execute().unwrap());

        assert_eq!(total, 4.0);
        assert_eq!(tables.entries[0].word, "caf\u{FFFD}");
        assert_eq!(tables.entries[0].count, 2.0);
    }

    #[test]
    fn test_second_run_is_up_to_date() {
        let (_dir, config) = setup("a a a a b b c\n");
        let use_case = WordClassUseCase::new(config);
        assert!(matches!(use_case.execute().unwrap(), WordClassOutcome::Written { .. }));
        assert_eq!(use_case.execute().unwrap(), WordClassOutcome::UpToDate);
    }

    #[test]
    fn test_make_mode_off_always_rebuilds() {
        let (_dir, mut config) = setup("a a a a b b c\n");
        config.make_mode = false;
        let use_case = WordClassUseCase::with_freshness(config, AlwaysFresh);
        assert!(matches!(use_case.execute().unwrap(), WordClassOutcome::Written { .. }));
    }

    #[test]
    fn test_up_to_date_writes_nothing() {
        let (dir, config) = setup("a b\n");
        let use_case = WordClassUseCase::with_freshness(config, AlwaysFresh);
        assert_eq!(use_case.execute().unwrap(), WordClassOutcome::UpToDate);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_missing_sequence_tokens_is_config_error() {
        let (_dir, mut config) = setup("a b\n");
        config.end_sequence = String::new();
        let err = WordClassUseCase::new(config).execute().unwrap_err();
        assert!(matches!(category(&err), Some(ActionError::Config(_))));
    }

    #[test]
    fn test_classes_without_outputs_is_config_error() {
        let (_dir, mut config) = setup("a b\n");
        config.nbr_class = 2;
        let err = WordClassUseCase::new(config).execute().unwrap_err();
        assert!(matches!(category(&err), Some(ActionError::Config(_))));
    }

    #[test]
    fn test_tiny_vocab_size_is_config_error() {
        let (_dir, mut config) = setup("a b\n");
        config.vocab_size = 1;
        let err = WordClassUseCase::new(config).execute().unwrap_err();
        assert!(matches!(category(&err), Some(ActionError::Config(_))));
    }

    #[test]
    fn test_nothing_above_cutoff_is_data_error() {
        let (_dir, mut config) = setup("a b c\n");
        config.cutoff = 5;
        let err = WordClassUseCase::new(config).execute().unwrap_err();
        assert!(matches!(category(&err), Some(ActionError::Data(_))));
    }

    #[test]
    fn test_missing_corpus_is_data_error() {
        let (dir, mut config) = setup("a b\n");
        config.input_file = dir.path().join("missing.txt");
        config.make_mode  = false;
        let err = WordClassUseCase::new(config).execute().unwrap_err();
        assert!(matches!(category(&err), Some(ActionError::Data(_))));
    }
}
