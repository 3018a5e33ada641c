// ============================================================
// Layer 4 — Corpus Reader and Sentence Framer
// ============================================================
// Reads the training text one line at a time and frames every
// line with sentence boundary tokens before it is counted.
//
// Framing steps (applied in order):
//   1. Strip leading and trailing spaces (tabs are kept)
//   2. Prepend "<begin> " unless the line already starts with it
//   3. Append " <end>" unless the line already ends with it
//
// Example with begin="<s>", end="</s>":
//   "  the cat sat "   →  "<s> the cat sat </s>"
//   "<s> the cat </s>" →  "<s> the cat </s>"     (unchanged)
//
// Lines are read as raw bytes and decoded lossily: corpora in
// Latin-1 or another 8-bit encoding still count, with each
// invalid byte turned into U+FFFD instead of failing the run.
//
// Reference: Rust Book §8 (Strings), §12 (Reading a File)

use anyhow::Result;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use crate::domain::errors::ActionError;
use crate::domain::traits::LineSource;

/// A plain-text corpus on disk.
pub struct TextCorpus {
    path: PathBuf,
}

impl TextCorpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LineSource for TextCorpus {
    fn lines(&self) -> Result<Box<dyn Iterator<Item = Result<String>> + '_>> {
        let file = File::open(&self.path).map_err(|e| {
            ActionError::data(format!(
                "failed to open input file '{}': {e}",
                self.path.display()
            ))
        })?;

        let path       = self.path.clone();
        let mut reader = BufReader::new(file);
        let mut buf    = Vec::new();
        let lines = std::iter::from_fn(move || -> Option<Result<String>> {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => None,
                Ok(_) => Some(Ok(decode_line(&buf))),
                Err(e) => Some(Err(ActionError::data(format!(
                    "failed while reading '{}': {e}",
                    path.display()
                ))
                .into())),
            }
        });
        Ok(Box::new(lines))
    }
}

/// One line without its terminator, invalid UTF-8 replaced.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// In-memory corpus, handy for tests and small tools.
pub struct StringCorpus {
    text: String,
}

impl StringCorpus {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl LineSource for StringCorpus {
    fn lines(&self) -> Result<Box<dyn Iterator<Item = Result<String>> + '_>> {
        Ok(Box::new(self.text.lines().map(|l| Ok(l.to_string()))))
    }
}

/// Adds sentence boundary tokens to corpus lines.
#[derive(Debug, Clone)]
pub struct SentenceFramer {
    begin_pattern: String,
    end_pattern:   String,
}

impl SentenceFramer {
    /// Both tokens are mandatory.
    pub fn new(begin: &str, end: &str) -> Result<Self, ActionError> {
        if begin.is_empty() || end.is_empty() {
            return Err(ActionError::config(
                "please specify both the begin-sequence and end-sequence tokens",
            ));
        }
        Ok(Self {
            begin_pattern: format!("{begin} "),
            end_pattern:   format!(" {end}"),
        })
    }

    pub fn frame(&self, line: &str) -> String {
        let trimmed = line.trim_matches(' ');

        let mut framed = String::with_capacity(
            trimmed.len() + self.begin_pattern.len() + self.end_pattern.len(),
        );
        if !trimmed.starts_with(&self.begin_pattern) {
            framed.push_str(&self.begin_pattern);
        }
        framed.push_str(trimmed);
        if !framed.ends_with(&self.end_pattern) {
            framed.push_str(&self.end_pattern);
        }
        framed
    }
}

/// Split on tabs and spaces, dropping empty pieces.
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c| c == ' ' || c == '\t').filter(|t| !t.is_empty())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_frame_adds_missing_tokens() {
        let f = SentenceFramer::new("<s>", "</s>").unwrap();
        assert_eq!(f.frame("  the cat sat "), "<s> the cat sat </s>");
    }

    #[test]
    fn test_frame_keeps_existing_tokens() {
        let f = SentenceFramer::new("<s>", "</s>").unwrap();
        assert_eq!(f.frame("<s> the cat </s>"), "<s> the cat </s>");
        assert_eq!(f.frame("<s> the cat"), "<s> the cat </s>");
    }

    #[test]
    fn test_frame_empty_line() {
        let f = SentenceFramer::new("<s>", "</s>").unwrap();
        let framed = f.frame("");
        assert_eq!(tokenize(&framed).collect::<Vec<_>>(), vec!["<s>", "</s>"]);
    }

    #[test]
    fn test_missing_boundary_tokens_rejected() {
        assert!(matches!(SentenceFramer::new("", "</s>"), Err(ActionError::Config(_))));
        assert!(matches!(SentenceFramer::new("<s>", ""), Err(ActionError::Config(_))));
    }

    #[test]
    fn test_tokenize_mixed_separators() {
        let toks: Vec<_> = tokenize("a\tb  c \t d").collect();
        assert_eq!(toks, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_text_corpus_reads_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "first line").unwrap();
        writeln!(file, "second line").unwrap();

        let corpus = TextCorpus::new(file.path());
        let lines: Vec<String> = corpus.lines().unwrap().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["first line", "second line"]);
    }

    #[test]
    fn test_text_corpus_handles_crlf_and_missing_final_newline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"first\r\nsecond").unwrap();

        let corpus = TextCorpus::new(file.path());
        let lines: Vec<String> = corpus.lines().unwrap().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn test_non_utf8_bytes_are_replaced() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"caf\xe9 au lait\nplain\n").unwrap();

        let corpus = TextCorpus::new(file.path());
        let lines: Vec<String> = corpus.lines().unwrap().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["caf\u{FFFD} au lait", "plain"]);
    }

    #[test]
    fn test_missing_corpus_is_data_error() {
        let corpus = TextCorpus::new("/definitely/not/here.txt");
        let err = corpus.lines().err().unwrap();
        assert!(matches!(
            crate::domain::errors::category(&err),
            Some(ActionError::Data(_))
        ));
    }
}
