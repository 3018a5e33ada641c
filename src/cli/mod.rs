// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and hands each action to
// its use case in Layer 2. This layer only routes and prints a
// one-line result; all work happens below it.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, LabelMapArgs, PlotArgs, SvdArgs, WordClassArgs};

use crate::application::{
    label_map_use_case::{LabelMapOutcome, LabelMapUseCase},
    plot_use_case::PlotUseCase,
    svd_use_case::{SvdOutcome, SvdUseCase},
    word_class_use_case::{WordClassOutcome, WordClassUseCase},
};

#[derive(Parser, Debug)]
#[command(
    name = "nn-actions",
    version,
    about = "Auxiliary actions for neural network models: vocabularies, SVD compression, label maps and topology plots."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::WriteWordAndClass(args) => run_word_class(args),
            Commands::Svd(args)               => run_svd(args),
            Commands::CreateLabelMap(args)    => run_label_map(args),
            Commands::Plot(args)              => run_plot(args),
        }
    }
}

fn run_word_class(args: WordClassArgs) -> Result<()> {
    match WordClassUseCase::new(args.into()).execute()? {
        WordClassOutcome::UpToDate => println!("All output files up to date."),
        WordClassOutcome::Written { tables, total_tokens } => println!(
            "Wrote vocabulary of {} entries ({} tokens counted).",
            tables.len(),
            total_tokens
        ),
    }
    Ok(())
}

fn run_svd(args: SvdArgs) -> Result<()> {
    match SvdUseCase::new(args.into()).execute()? {
        SvdOutcome::Skipped { reason } => println!("SVD skipped: {reason}."),
        SvdOutcome::Compressed { report, saved_to } => {
            println!(
                "Compressed {} parameter(s): {} → {} learnable values.",
                report.compressed.len(),
                report.parameters_before,
                report.parameters_after
            );
            if let Some(path) = saved_to {
                println!("Saved to {}", path.display());
            }
        }
    }
    Ok(())
}

fn run_label_map(args: LabelMapArgs) -> Result<()> {
    match LabelMapUseCase::new(args.into()).execute()? {
        LabelMapOutcome::AlreadyExists { mapping_file } => {
            println!("{} already exists, nothing to do.", mapping_file.display())
        }
        LabelMapOutcome::Written(summaries) => {
            for s in summaries {
                println!(
                    "{}: {} labels from {} records → {}",
                    s.stream,
                    s.labels,
                    s.records,
                    s.mapping_file.display()
                );
            }
        }
    }
    Ok(())
}

fn run_plot(args: PlotArgs) -> Result<()> {
    let outcome = PlotUseCase::new(args.into()).execute()?;
    println!("Wrote {}", outcome.dot_file.display());
    if let Some(path) = outcome.rendered {
        println!("Rendered {}", path.display());
    }
    Ok(())
}
