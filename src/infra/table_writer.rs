// ============================================================
// Layer 6 — Vocabulary and Label Table Writers
// ============================================================
// Writes the plain-text tables consumed by class-based output
// layers and label-aware readers.
//
// Vocabulary file, one word per line:
//   "     {index}\t     {count}\t{word}\t{class}"
//
//        0	     4	a	0
//        1	     2	<unk>	0
//        2	     2	b	1
//
// Word-to-class file:  one class id per line, by word index
// Class-to-index file: one start index per line, by class id
// Label mapping file:  one label per line
//
// Counts are printed like a C++ stream with default precision
// (6 significant digits, %g style), so tables stay byte-for-byte
// compatible with existing tooling.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use std::{io::Write, path::Path};

use crate::domain::vocabulary::VocabularyTables;
use crate::infra::atomic_file::write_atomically;

pub fn write_vocabulary(path: &Path, tables: &VocabularyTables) -> Result<()> {
    write_atomically(path, |w| {
        for e in &tables.entries {
            writeln!(
                w,
                "     {}\t     {}\t{}\t{}",
                e.index,
                format_general(e.count),
                e.word,
                e.class_index
            )?;
        }
        Ok(())
    })?;
    tracing::info!(
        "Created vocabulary file '{}' with {} entries",
        path.display(),
        tables.len()
    );
    Ok(())
}

pub fn write_word_to_class(path: &Path, tables: &VocabularyTables) -> Result<()> {
    let column = tables.word_to_class_column();
    write_integer_column(path, &column)?;
    tracing::info!(
        "Created word-to-class map '{}' with {} entries",
        path.display(),
        column.len()
    );
    Ok(())
}

pub fn write_class_to_index(path: &Path, class_starts: &[usize]) -> Result<()> {
    write_integer_column(path, class_starts)?;
    tracing::info!(
        "Created class-to-index map '{}' with {} entries",
        path.display(),
        class_starts.len()
    );
    Ok(())
}

pub fn write_label_mapping(path: &Path, labels: &[String]) -> Result<()> {
    write_atomically(path, |w| {
        for label in labels {
            writeln!(w, "{label}")?;
        }
        Ok(())
    })
}

fn write_integer_column(path: &Path, values: &[usize]) -> Result<()> {
    write_atomically(path, |w| {
        for v in values {
            writeln!(w, "{v}")?;
        }
        Ok(())
    })
}

/// `%g` with precision 6: fixed notation for exponents in
/// [-4, 6), scientific otherwise, trailing zeros removed.
pub fn format_general(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }

    // Rounded to 6 significant digits first so 999999.5 → 1e+06
    let sci = format!("{v:.5e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", strip_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (5 - exponent) as usize;
        strip_zeros(&format!("{v:.decimals$}")).to_string()
    }
}

fn strip_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vocabulary::VocabularyEntry;
    use std::fs;

    #[test]
    fn test_format_general_matches_stream_output() {
        assert_eq!(format_general(0.0), "0");
        assert_eq!(format_general(4.0), "4");
        assert_eq!(format_general(42068.0), "42068");
        assert_eq!(format_general(999999.0), "999999");
        assert_eq!(format_general(1234567.0), "1.23457e+06");
        assert_eq!(format_general(1.0e6), "1e+06");
        assert_eq!(format_general(0.5), "0.5");
        assert_eq!(format_general(0.0001), "0.0001");
        assert_eq!(format_general(0.00001), "1e-05");
        assert_eq!(format_general(2.0 / 3.0), "0.666667");
    }

    #[test]
    fn test_vocabulary_line_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.txt");
        let tables = VocabularyTables {
            entries: vec![
                VocabularyEntry { index: 0, count: 42068.0, word: "</s>".into(), class_index: 0 },
                VocabularyEntry { index: 1, count: 50770.0, word: "the".into(), class_index: 0 },
            ],
            classes: None,
        };
        write_vocabulary(&path, &tables).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "     0\t     42068\t</s>\t0\n     1\t     50770\tthe\t0\n"
        );
    }

    #[test]
    fn test_integer_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cls2idx.txt");
        write_class_to_index(&path, &[0, 3, 9]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0\n3\n9\n");
    }
}
