//! Streaming command line tool over semantic versions

mod stream;

use std::io::{self, Read, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use verge_semver::Constraint;

use crate::stream::{
    Decorate, FilterConstraint, FirstOnly, InvalidOnly, JsonArray, LastOnly, ParseVersions,
    Pipeline, RenderVersions, SortVersions,
};

#[derive(Parser, Debug)]
#[command(name = "verge")]
#[command(version)]
#[command(about = "Filter, sort and render semantic versions")]
struct Cli {
    /// Sort input versions
    #[arg(short = 's', long)]
    sort: bool,

    /// Sort descending instead of ascending
    #[arg(short = 'd', long)]
    desc: bool,

    /// Keep only versions matching the given constraint
    #[arg(short = 'c', long = "filter", value_name = "CONSTRAINT")]
    filter: Option<String>,

    /// Emit only the tokens that are not valid versions
    #[arg(long)]
    invalid: bool,

    /// Fail on invalid versions instead of skipping them
    #[arg(long)]
    valid: bool,

    /// Keep only the first version
    #[arg(short = 'f', long)]
    first: bool,

    /// Keep only the last version
    #[arg(short = 'l', long)]
    last: bool,

    /// Emit the versions as a JSON array
    #[arg(short = 'j', long)]
    json: bool,

    /// Versions to process; read from stdin when omitted
    #[arg(value_name = "VERSION")]
    versions: Vec<String>,
}

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("{} {err:#}", style("error:").red().bold());
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let input = if cli.versions.is_empty() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("reading stdin")?;
        buffer
    } else {
        cli.versions.join("\n")
    };

    let mut pipeline = build_pipeline(&cli)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    pipeline.run(input.split_whitespace(), &mut out)?;
    out.flush()?;
    Ok(())
}

fn build_pipeline(cli: &Cli) -> Result<Pipeline> {
    let mut pipeline = Pipeline::new();

    if cli.invalid {
        pipeline.pipe(InvalidOnly);
        if cli.first {
            pipeline.pipe(FirstOnly::default());
        } else if cli.last {
            pipeline.pipe(LastOnly::default());
        }
        pipeline.pipe(Decorate::new("- ", "\n"));
        return Ok(pipeline);
    }

    pipeline.pipe(ParseVersions {
        skip_invalid: !cli.valid,
    });

    if let Some(filter) = &cli.filter {
        let constraint = Constraint::parse(filter)
            .with_context(|| format!("invalid filter constraint {filter:?}"))?;
        pipeline.pipe(FilterConstraint::new(constraint));
    }

    if cli.sort {
        pipeline.pipe(SortVersions::new(!cli.desc));
    }

    if cli.first {
        pipeline.pipe(FirstOnly::default());
    } else if cli.last {
        pipeline.pipe(LastOnly::default());
    }

    if cli.json {
        pipeline.pipe(JsonArray::default());
    } else {
        pipeline.pipe(RenderVersions);
        pipeline.pipe(Decorate::new("- ", "\n"));
    }

    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_cli(args: &[&str], input: &str) -> String {
        let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
        let mut pipeline = build_pipeline(&cli).unwrap();
        let mut out = Vec::new();
        pipeline.run(input.split_whitespace(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_sort_desc_first() {
        let got = run_cli(&["verge", "-s", "-d", "-f"], "1.0.4 1.1.1 1.2.2 2.3.4");
        assert_eq!(got, "- 2.3.4\n");
    }

    #[test]
    fn test_default_lines() {
        let got = run_cli(&["verge"], "0.0.4 1.2.3");
        assert_eq!(got, "- 0.0.4\n- 1.2.3\n");
    }

    #[test]
    fn test_filter_flag() {
        let got = run_cli(&["verge", "-c", "1.x"], "0.0.4 1.2.3");
        assert_eq!(got, "- 1.2.3\n");
    }

    #[test]
    fn test_json_flag() {
        let got = run_cli(&["verge", "-s", "-j"], "1.2.3 0.0.4");
        assert_eq!(got, "[\"0.0.4\",\"1.2.3\"]\n");
    }

    #[test]
    fn test_invalid_flag() {
        let got = run_cli(&["verge", "--invalid"], "0.0.4 1.2.3 tomate");
        assert_eq!(got, "- tomate\n");
    }

    #[test]
    fn test_rejects_bad_filter() {
        let cli = Cli::try_parse_from(["verge", "-c", ">= foo"]).unwrap();
        assert!(build_pipeline(&cli).is_err());
    }
}
