//! # covzero
//!
//! A CLI tool that writes an empty coverage.py baseline for a project's
//! Python sources.
//!
//! ## Overview
//!
//! covzero is built on top of covzerolib. It searches `bin/`, `node_scripts/`,
//! `src/` and `scripts/` under the given base directory, keeps `.py` files and
//! extensionless scripts that sniff as Python, and writes a `.coverage` file
//! recording zero executed lines for each of them. Later coverage runs can
//! then report against a known-empty starting point.
//!
//! ## Usage
//!
//! ```bash
//! # Write ./.coverage for the project in ~/work/app
//! covzero ~/work/app
//!
//! # Write the baseline somewhere else (created if missing)
//! covzero ~/work/app --output build/coverage
//!
//! # See which files were picked up
//! RUST_LOG=covzerolib=debug covzero ~/work/app -o /tmp/cov
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{value_parser, Arg, ArgMatches, Command};
use console::Style;
use covzerolib::{generate, MagicSniffer};
use tracing_subscriber::EnvFilter;

/// Build the clap Command structure
fn build_command() -> Command {
    Command::new("covzero")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Arthur Debert")
        .about("Write an empty coverage.py baseline for a project's Python sources")
        .arg(
            Arg::new("base_dir")
                .value_name("BASE_DIR")
                .help("Project directory to search for Python sources")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_DIR")
                .help("Directory to write the .coverage file into")
                .default_value(".")
                .value_parser(value_parser!(PathBuf)),
        )
}

/// Send logs to stderr, filtered by RUST_LOG (warnings only by default).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let base_dir = matches
        .get_one::<PathBuf>("base_dir")
        .context("missing base directory")?;
    let output_dir = matches
        .get_one::<PathBuf>("output")
        .context("missing output directory")?;

    generate(base_dir, output_dir, &MagicSniffer).with_context(|| {
        format!(
            "could not write coverage baseline for '{}'",
            base_dir.display()
        )
    })?;

    Ok(())
}

fn main() -> ExitCode {
    // clap exits with a usage error before anything touches the filesystem
    let matches = build_command().get_matches();
    init_logging();

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let label = Style::new().for_stderr().red().bold().apply_to("Error:");
            eprintln!("{} {:#}", label, err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        build_command().debug_assert();
    }

    #[test]
    fn test_output_defaults_to_cwd() {
        let matches = build_command().get_matches_from(["covzero", "project"]);

        assert_eq!(
            matches.get_one::<PathBuf>("base_dir"),
            Some(&PathBuf::from("project"))
        );
        assert_eq!(
            matches.get_one::<PathBuf>("output"),
            Some(&PathBuf::from("."))
        );
    }

    #[test]
    fn test_short_and_long_output_flags() {
        for flag in ["-o", "--output"] {
            let matches = build_command().get_matches_from(["covzero", "project", flag, "out"]);
            assert_eq!(
                matches.get_one::<PathBuf>("output"),
                Some(&PathBuf::from("out"))
            );
        }
    }

    #[test]
    fn test_base_dir_is_required() {
        let err = build_command()
            .try_get_matches_from(["covzero"])
            .unwrap_err();

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_unknown_flags_are_rejected() {
        let result = build_command().try_get_matches_from(["covzero", "project", "--verbose"]);

        assert!(result.is_err());
    }
}
