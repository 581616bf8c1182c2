// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seitenwerk — PDF page composition, watermarking, and image extraction.
//
// Entry point. Parses the command line, initialises logging, runs one command,
// and reports failures in plain language.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use seitenwerk_core::human_errors::{Severity, humanize_error};

#[derive(Parser)]
#[command(
    name = "seitenwerk",
    about = "Merge, split, insert, replace, watermark, and protect PDF documents",
    version
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Directory results are written to (default: config, then current directory)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output file name; a name prefix for `split`, a directory name for `extract-images`
    #[arg(short, long, global = true)]
    pub name: Option<String>,

    /// Replace existing output files
    #[arg(short, long, global = true)]
    pub force: bool,

    /// Settings file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Concatenate PDFs in the given order
    Merge {
        /// Input PDF files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Split a PDF into single pages, fixed-size parts, or one range extract
    Split {
        /// Input PDF file
        input: PathBuf,

        #[command(flatten)]
        mode: SplitMode,
    },

    /// Insert pages of one PDF into another
    Insert {
        /// PDF receiving the pages
        target: PathBuf,

        /// PDF supplying the pages
        insertion: PathBuf,

        /// Pages of the insertion PDF to use, e.g. "1-3,5" (default: all)
        #[arg(long, default_value = "")]
        pages: String,

        #[command(flatten)]
        at: InsertAt,
    },

    /// Replace pages of one PDF with pages of another
    Replace {
        /// PDF whose pages are replaced
        target: PathBuf,

        /// PDF supplying the replacement pages
        replacement: PathBuf,

        /// Target pages, e.g. "2,4"
        #[arg(long)]
        targets: String,

        /// Replacement pages, paired with the targets in ascending order
        #[arg(long)]
        sources: String,
    },

    /// Add a text or image watermark to every page
    Watermark {
        /// Input PDF file
        input: PathBuf,

        #[command(flatten)]
        overlay: OverlayChoice,

        /// Text size in points
        #[arg(long)]
        font_size: Option<f32>,

        /// Image scale in percent
        #[arg(long)]
        scale: Option<u32>,

        /// Image rotation in degrees, counter-clockwise
        #[arg(long)]
        rotation: Option<f32>,

        /// Opacity in percent (0-100)
        #[arg(long, value_name = "PERCENT")]
        opacity: Option<f32>,

        /// Single watermark at center, top-left, top-right, bottom-left or bottom-right
        #[arg(long, conflicts_with = "tiled")]
        position: Option<String>,

        /// Repeat the watermark across the whole page
        #[arg(long)]
        tiled: bool,
    },

    /// Save the images embedded in a PDF
    ExtractImages {
        /// Input PDF file
        input: PathBuf,

        /// Pages to scan, e.g. "1-3,5" (default: all)
        #[arg(long, default_value = "")]
        pages: String,
    },

    /// Password-protect a PDF
    Encrypt {
        /// Input PDF file
        input: PathBuf,

        /// Password required to open the result
        #[arg(long)]
        password: String,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SplitMode {
    /// One file per page
    #[arg(long)]
    pub single: bool,

    /// One file per N pages
    #[arg(long, value_name = "N")]
    pub every: Option<usize>,

    /// One file with the selected pages, e.g. "1-3,7"
    #[arg(long, value_name = "EXPR")]
    pub ranges: Option<String>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct InsertAt {
    /// Before the first page
    #[arg(long)]
    pub head: bool,

    /// After the last page
    #[arg(long)]
    pub tail: bool,

    /// After the first N pages (0 = before page 1)
    #[arg(long, value_name = "N")]
    pub at: Option<usize>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct OverlayChoice {
    /// Watermark text
    #[arg(long)]
    pub text: Option<String>,

    /// Watermark image (PNG, JPEG, ...)
    #[arg(long, value_name = "FILE")]
    pub image: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.global.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match commands::run(&cli.global, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = %err, "command failed");
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            ExitCode::from(match human.severity {
                Severity::InputProblem => 2,
                Severity::FileProblem => 3,
                Severity::Internal => 1,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn split_requires_exactly_one_mode() {
        assert!(Cli::try_parse_from(["seitenwerk", "split", "a.pdf"]).is_err());
        assert!(
            Cli::try_parse_from(["seitenwerk", "split", "a.pdf", "--single", "--every", "2"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["seitenwerk", "split", "a.pdf", "--every", "2"]).is_ok());
    }

    #[test]
    fn watermark_position_conflicts_with_tiled() {
        let parsed = Cli::try_parse_from([
            "seitenwerk",
            "watermark",
            "a.pdf",
            "--text",
            "DRAFT",
            "--position",
            "center",
            "--tiled",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "seitenwerk",
            "merge",
            "a.pdf",
            "b.pdf",
            "--force",
            "--output-dir",
            "out",
        ])
        .unwrap();
        assert!(cli.global.force);
        assert_eq!(cli.global.output_dir, Some(PathBuf::from("out")));
        assert!(matches!(cli.command, Command::Merge { inputs } if inputs.len() == 2));
    }
}
