// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// One subcommand per action:
//
//   write-word-and-class  vocabulary + class tables from text
//   svd                   low-rank compression of a model
//   create-label-map      label mapping files from a dataset
//   plot                  DOT topology, optionally rendered
//
// Flag names follow the action settings they feed, in kebab
// case (outputVocabFile → --output-vocab-file).
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{ArgAction, Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    label_map_use_case::{LabelMapConfig, LabelStream},
    plot_use_case::PlotConfig,
    svd_use_case::SvdConfig,
    word_class_use_case::WordClassConfig,
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a vocabulary and frequency-balanced word classes from a text corpus
    WriteWordAndClass(WordClassArgs),

    /// Replace selected model parameters by low-rank SVD products
    Svd(SvdArgs),

    /// Write the label mapping file(s) of a labelled text dataset
    CreateLabelMap(LabelMapArgs),

    /// Write a model topology as DOT and optionally render it
    Plot(PlotArgs),
}

// ─── write-word-and-class ────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct WordClassArgs {
    /// Training text, one sentence per line
    #[arg(long)]
    pub input_file: PathBuf,

    /// Vocabulary output file
    #[arg(long)]
    pub output_vocab_file: PathBuf,

    /// Word-to-class output file (required with --nbr-class > 0)
    #[arg(long)]
    pub output_word2cls: Option<PathBuf>,

    /// Class-to-start-index output file (required with --nbr-class > 0)
    #[arg(long)]
    pub output_cls2index: Option<PathBuf>,

    /// Number of vocabulary entries, the unknown-word entry included
    #[arg(long)]
    pub vocab_size: usize,

    /// Number of word classes; 0 disables classes
    #[arg(long, default_value_t = 0)]
    pub nbr_class: usize,

    /// Words seen this many times or fewer do not count toward the vocabulary size
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub cutoff: i64,

    /// Token that collects every word left out of the vocabulary
    #[arg(long, default_value = "<unk>")]
    pub unk: String,

    /// Sentence start token, prepended to every line
    #[arg(long)]
    pub begin_sequence: String,

    /// Sentence end token, appended to every line
    #[arg(long)]
    pub end_sequence: String,

    /// Skip the build when all outputs are newer than the input
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub make_mode: bool,
}

impl From<WordClassArgs> for WordClassConfig {
    fn from(a: WordClassArgs) -> Self {
        WordClassConfig {
            input_file:        a.input_file,
            output_vocab_file: a.output_vocab_file,
            output_word2cls:   a.output_word2cls,
            output_cls2index:  a.output_cls2index,
            vocab_size:        a.vocab_size,
            nbr_class:         a.nbr_class,
            cutoff:            a.cutoff,
            unk:               a.unk,
            begin_sequence:    a.begin_sequence,
            end_sequence:      a.end_sequence,
            make_mode:         a.make_mode,
        }
    }
}

// ─── svd ─────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct SvdArgs {
    /// Model to compress
    #[arg(long)]
    pub model_path: Option<PathBuf>,

    /// Where to save the compressed model; not saved when omitted
    #[arg(long)]
    pub output_model_path: Option<PathBuf>,

    /// Fraction of singular-value energy to keep (with --node-name-regex)
    #[arg(long, default_value_t = 0.4)]
    pub keep_ratio: f64,

    /// Kept ranks are rounded up to a multiple of this
    #[arg(long, default_value_t = 8)]
    pub aligned_size: usize,

    /// Parameters whose full name matches this regex are compressed
    #[arg(long)]
    pub node_name_regex: Option<String>,

    /// Rule file with "PATTERN KEEP_RATIO" lines, used without --node-name-regex
    #[arg(long)]
    pub svd_config: Option<PathBuf>,
}

impl From<SvdArgs> for SvdConfig {
    fn from(a: SvdArgs) -> Self {
        SvdConfig {
            model_path:        a.model_path.unwrap_or_default(),
            output_model_path: a.output_model_path,
            keep_ratio:        a.keep_ratio,
            aligned_size:      a.aligned_size,
            node_name_regex:   a.node_name_regex,
            svd_config:        a.svd_config,
        }
    }
}

// ─── create-label-map ────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct LabelMapArgs {
    /// Dataset with space or tab separated columns
    #[arg(long)]
    pub input_file: PathBuf,

    /// Label stream as NAME:COLUMN or NAME:COLUMN:MAPPING_FILE (repeatable)
    #[arg(long = "label", value_name = "NAME:COLUMN[:FILE]")]
    pub labels: Vec<LabelStream>,

    /// Mapping file for streams that do not name their own
    #[arg(long)]
    pub label_mapping_file: Option<PathBuf>,
}

impl From<LabelMapArgs> for LabelMapConfig {
    fn from(a: LabelMapArgs) -> Self {
        LabelMapConfig {
            input_file:         a.input_file,
            label_streams:      a.labels,
            label_mapping_file: a.label_mapping_file,
        }
    }
}

// ─── plot ────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct PlotArgs {
    /// Model to plot
    #[arg(long)]
    pub model_path: PathBuf,

    /// DOT output (default: the model path with ".dot" appended)
    #[arg(long)]
    pub output_dot_file: Option<PathBuf>,

    /// Rendered diagram; needs --render-cmd
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Render command with <IN> and <OUT> placeholders, e.g. "dot -Tsvg <IN> -o <OUT>"
    #[arg(long)]
    pub render_cmd: Option<String>,
}

impl From<PlotArgs> for PlotConfig {
    fn from(a: PlotArgs) -> Self {
        PlotConfig {
            model_path:      a.model_path,
            output_dot_file: a.output_dot_file,
            output_file:     a.output_file,
            render_cmd:      a.render_cmd,
        }
    }
}
