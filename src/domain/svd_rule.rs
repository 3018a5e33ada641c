// ============================================================
// Layer 3 — SVD Rules
// ============================================================
// An SVD rule pairs a parameter-name regex with a keep ratio:
//
//   W0         1.0
//   W[1-5]     0.4
//
// Rules come either from one inline (regex, ratio) pair on the
// command line or from a rule file with one rule per line.
//
// Matching policy:
//   - a pattern must match the WHOLE parameter name
//   - when several rules match, the first one in source order wins
//
// Reference: regex crate documentation
//            Rust Book §9 (Recoverable Errors)

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::errors::ActionError;

/// Text shown whenever a rule file is rejected.
pub const RULE_FILE_USAGE: &str = "\
usage of the SVD rule file
Each line selects a group of learnable parameters with a regex and
gives the keep ratio (fraction of singular-value energy) for that group.
Fields are separated by spaces or tabs. An example:
W0         1.0
W[1-5]     0.4";

/// One (pattern, keep ratio) pair, uncompiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvdRule {
    pub pattern:    String,
    pub keep_ratio: f64,
}

impl SvdRule {
    pub fn new(pattern: impl Into<String>, keep_ratio: f64) -> Self {
        Self { pattern: pattern.into(), keep_ratio }
    }
}

/// Why a rule file was rejected. Any of these yields zero rules.
#[derive(Error, Debug, PartialEq)]
pub enum RuleFileError {
    #[error("line {line}: expected 2 fields (pattern, keep ratio), found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: keep ratio '{value}' is not a positive number")]
    BadRatio { line: usize, value: String },
}

/// Parse rule-file text. All-or-nothing: one bad line rejects the file.
pub fn parse_rule_file(text: &str) -> Result<Vec<SvdRule>, RuleFileError> {
    let mut rules = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line
            .split(|c| c == ' ' || c == '\t')
            .filter(|f| !f.is_empty())
            .collect();

        // A trailing newline or spacer line carries no rule
        if fields.is_empty() {
            continue;
        }
        if fields.len() != 2 {
            return Err(RuleFileError::FieldCount { line: i + 1, found: fields.len() });
        }

        let keep_ratio = match fields[1].parse::<f64>() {
            Ok(r) if r.is_finite() && r > 0.0 => r,
            _ => {
                return Err(RuleFileError::BadRatio {
                    line:  i + 1,
                    value: fields[1].to_string(),
                })
            }
        };
        rules.push(SvdRule::new(fields[0], keep_ratio));
    }

    Ok(rules)
}

/// Rules compiled for matching, in source order.
#[derive(Debug, Clone)]
pub struct SvdRuleSet {
    rules: Vec<(Regex, SvdRule)>,
}

impl SvdRuleSet {
    /// Compile every pattern as a whole-name match.
    pub fn compile(rules: Vec<SvdRule>) -> Result<Self, ActionError> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let anchored = format!("^(?:{})$", rule.pattern);
                Regex::new(&anchored)
                    .map(|re| (re, rule.clone()))
                    .map_err(|e| {
                        ActionError::config(format!("invalid parameter regex '{}': {e}", rule.pattern))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Compiled patterns with their rules, in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&Regex, &SvdRule)> {
        self.rules.iter().map(|(re, rule)| (re, rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_file() {
        let text = "W0\t1.0\nW[1-5]   0.4\n\nB.*  0.25\n";
        let rules = parse_rule_file(text).unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[1], SvdRule::new("W[1-5]", 0.4));
    }

    #[test]
    fn test_one_bad_line_rejects_everything() {
        let text = "W0 1.0\nW1 0.4 extra\nW2 0.3\n";
        let err = parse_rule_file(text).unwrap_err();
        assert_eq!(err, RuleFileError::FieldCount { line: 2, found: 3 });

        let text = "W0 1.0\nW1\n";
        assert!(parse_rule_file(text).is_err());
    }

    #[test]
    fn test_bad_ratio_rejected() {
        assert!(matches!(
            parse_rule_file("W0 lots\n"),
            Err(RuleFileError::BadRatio { line: 1, .. })
        ));
        assert!(parse_rule_file("W0 0\n").is_err());
        assert!(parse_rule_file("W0 -0.5\n").is_err());
    }

    #[test]
    fn test_rules_keep_source_order() {
        let set = SvdRuleSet::compile(vec![
            SvdRule::new("W1", 0.9),
            SvdRule::new("W.*", 0.5),
        ])
        .unwrap();
        let ratios: Vec<f64> = set.iter().map(|(_, rule)| rule.keep_ratio).collect();
        assert_eq!(ratios, vec![0.9, 0.5]);
    }

    #[test]
    fn test_patterns_match_whole_name() {
        let set = SvdRuleSet::compile(vec![SvdRule::new("W1", 0.5)]).unwrap();
        let (re, _) = set.iter().next().unwrap();
        assert!(re.is_match("W1"));
        assert!(!re.is_match("W12"));
        assert!(!re.is_match("xW1"));
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let err = SvdRuleSet::compile(vec![SvdRule::new("W[", 0.5)]).unwrap_err();
        assert!(matches!(err, ActionError::Config(_)));
    }
}
