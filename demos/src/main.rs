// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use alignstack::AlignOptions;
use clap::Parser;
use log::debug;

mod lexer;
mod passes;

/// Align assignments and trailing comments of a C-like source file.
#[derive(Debug, Parser)]
#[command(name = "align-demo", version, about)]
struct Cli {
    /// Source file to align; reads stdin when omitted.
    input: Option<PathBuf>,

    /// Options file with `name = value` lines.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Overrides align_assign_span.
    #[arg(long, value_name = "LINES")]
    assign_span: Option<usize>,

    /// Overrides align_assign_thresh.
    #[arg(long, value_name = "COLUMNS")]
    assign_thresh: Option<usize>,

    /// Overrides align_right_cmt_span.
    #[arg(long, value_name = "LINES")]
    comment_span: Option<usize>,

    /// Pad alignment gaps with tabs (align_with_tabs).
    #[arg(long)]
    with_tabs: bool,
}

fn load_options(cli: &Cli) -> Result<AlignOptions, String> {
    let mut options = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("unable to read '{}': {e}", path.display()))?;
            AlignOptions::parse(&text).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => AlignOptions::default(),
    };
    if let Some(span) = cli.assign_span {
        options.align_assign_span = span;
    }
    if let Some(thresh) = cli.assign_thresh {
        options.align_assign_thresh = thresh;
    }
    if let Some(span) = cli.comment_span {
        options.align_right_cmt_span = span;
    }
    if cli.with_tabs {
        options.align_with_tabs = true;
    }
    Ok(options)
}

fn read_input(input: Option<&PathBuf>) -> Result<String, String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("unable to read '{}': {e}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| format!("unable to read stdin: {e}"))?;
            Ok(text)
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let options = load_options(cli)?;
    debug!("{options:?}");
    let source = read_input(cli.input.as_ref())?;
    print!("{}", passes::align_source(&source, &options));
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_overrides_apply_over_defaults() {
        let cli = Cli::parse_from(["align-demo", "--assign-span", "3", "--comment-span", "2"]);
        let options = load_options(&cli).unwrap();
        assert_eq!(options.align_assign_span, 3);
        assert_eq!(options.align_assign_thresh, 0);
        assert_eq!(options.align_right_cmt_span, 2);
        assert!(!options.align_with_tabs);

        let cli = Cli::parse_from(["align-demo", "--with-tabs"]);
        assert!(load_options(&cli).unwrap().align_with_tabs);
    }

    #[test]
    fn test_missing_config_file_is_reported() {
        let cli = Cli::parse_from(["align-demo", "-c", "/nonexistent/align.cfg"]);
        let error = load_options(&cli).unwrap_err();
        assert!(error.contains("/nonexistent/align.cfg"));
    }
}
