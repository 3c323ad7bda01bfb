//! tpdoc: assess transfer-pricing documentation obligations.
//!
//! Usage:
//!   tpdoc rules.yaml client.yaml
//!   tpdoc rules.yaml client.yaml --format json
//!   tpdoc rules.yaml client.yaml --group-logic labelled -v

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tpdoc_core::{
    assess_sources, AssessmentConfig, FileSource, GroupLogicMode, JsonReport, ReportSink,
    TextReport,
};

#[derive(Parser, Debug)]
#[command(name = "tpdoc", version)]
#[command(about = "Assess Master File, Local File and CbCR obligations per entity")]
struct Cli {
    /// Country rules library (YAML, or JSON with a .json extension)
    rules: PathBuf,

    /// Client facts (YAML, or JSON with a .json extension)
    facts: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Assessment configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How condition groups of a rule are combined; overrides the config file
    #[arg(long, value_enum)]
    group_logic: Option<GroupLogicArg>,

    /// Verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GroupLogicArg {
    AnyGroup,
    Labelled,
}

impl From<GroupLogicArg> for GroupLogicMode {
    fn from(arg: GroupLogicArg) -> Self {
        match arg {
            GroupLogicArg::AnyGroup => GroupLogicMode::AnyGroup,
            GroupLogicArg::Labelled => GroupLogicMode::Labelled,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                // clap includes the usage line in its error output
                let _ = err.print();
                return ExitCode::FAILURE;
            }
        },
    };

    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<AssessmentConfig> {
    let mut config = match &cli.config {
        Some(path) => AssessmentConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AssessmentConfig::default(),
    };

    if let Some(mode) = cli.group_logic {
        config.group_logic = mode.into();
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    debug!(group_logic = %config.group_logic, "Using configuration");

    let report = assess_sources(
        &FileSource::new(&cli.rules),
        &FileSource::new(&cli.facts),
        &config,
    )
    .context("Failed to load sources")?;

    let sink: Box<dyn ReportSink> = match cli.format {
        OutputFormat::Text => Box::new(TextReport::new()),
        OutputFormat::Json => Box::new(JsonReport::new()),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    sink.write_report(&report, &mut out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "tpdoc",
            "rules.yaml",
            "facts.yaml",
            "--format",
            "json",
            "--group-logic",
            "labelled",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.group_logic, Some(GroupLogicArg::Labelled));
        assert!(cli.verbose);
        assert_eq!(load_config(&cli).unwrap().group_logic, GroupLogicMode::Labelled);
    }

    #[test]
    fn test_missing_positionals_rejected() {
        let err = Cli::try_parse_from(["tpdoc", "rules.yaml"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }
}
