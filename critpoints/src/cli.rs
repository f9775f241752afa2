//! The `critpoints` critical point extraction CLI.
//!
//! The extraction itself and the feature distance metric are provided by the [`critpoints_lib`] crate.

use anyhow::Context;
use clap::Parser;
use log::info;

use crate::{compare, extract, logging};

static HELP_TEMPLATE: &str = "{before-help}{name} (v{version}) - {author-with-newline}{about-with-newline}\n{usage-heading} {usage}\n\n{all-args}{after-help}";

#[derive(Clone, Debug, clap::Parser)]
#[command(
    name = "critpoints",
    author = "Critpoints developers",
    about = "Critical point extraction from 3D scalar fields and comparison of original and lossy reconstructed fields",
    version,
    propagate_version = true,
    help_template = HELP_TEMPLATE,
)]
struct CommandlineArgs {
    /// Enable quiet mode (no output except for severe panic messages), overrides verbosity level
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
    /// Print more verbose output, use multiple "v"s for even more verbose output (-v, -vv)
    #[arg(short, action = clap::ArgAction::Count, global = true)]
    verbosity: u8,
    /// Subcommands
    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(Clone, Debug, clap::Parser)]
enum Subcommand {
    /// Extract the critical points of a scalar field or a sequence of fields
    #[command(help_template = HELP_TEMPLATE)]
    Extract(extract::ExtractSubcommandArgs),
    /// Compare the critical points of original and lossy reconstructed fields
    #[command(help_template = HELP_TEMPLATE)]
    Compare(compare::CompareSubcommandArgs),
}

/// A simple on/off switch for command line arguments.
///
/// For example an argument defined as:
/// ```rust ignore
/// /// Enable multithreading to process multiple input files in parallel
/// #[arg(
///     long = "mt-files",
///     default_value = "off",
///     value_name = "off|on",
///     ignore_case = true,
///     require_equals = true
/// )]
/// pub parallelize_over_files: Switch,
/// ```
/// can be used in the CLI as `--mt-files=on` or `--mt-files=off`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Switch {
    Off,
    On,
}

impl Switch {
    pub(crate) fn into_bool(self) -> bool {
        match self {
            Switch::Off => false,
            Switch::On => true,
        }
    }
}

/// Runs the critpoints CLI with the provided command line arguments.
///
/// This function behaves like the binary `critpoints` command line tool including output to stdout
/// and stderr. It will also exit the process depending on the command line arguments, so it should
/// not be used in typical library contexts.
/// Note that the first argument is always ignored, this is typically the binary name when called using
/// `std::env::args()` from the terminal:
/// ```
/// critpoints::cli::run_critpoints(["critpoints", "--version"]);
/// ```
/// If no placeholder for the binary name is provided it will return an error (and print a help message):
/// ```should_panic
/// critpoints::cli::run_critpoints(["--version"]);
/// ```
pub fn run_critpoints<I, T>(args: I) -> Result<(), anyhow::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    run_critpoints_impl(args).inspect_err(logging::log_error)
}

fn run_critpoints_impl<I, T>(args: I) -> Result<(), anyhow::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cmd_args = CommandlineArgs::parse_from(args);

    let verbosity = VerbosityLevel::from(cmd_args.verbosity);
    logging::initialize_logging(verbosity, cmd_args.quiet).context("Failed to initialize logging")?;
    logging::log_program_info();

    let result = match &cmd_args.subcommand {
        Subcommand::Extract(cmd_args) => extract::extract_subcommand(cmd_args),
        Subcommand::Compare(cmd_args) => compare::compare_subcommand(cmd_args),
    };

    info!("Timings:");
    match critpoints_lib::profiling::write_to_string() {
        Ok(timings) => timings
            .lines()
            .filter(|l| !l.is_empty())
            .for_each(|l| info!("{}", l)),
        Err(err) => info!("Unable to collect timings: {}", err),
    }

    info!(
        "Finished at {}.",
        chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, false)
    );

    result
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum VerbosityLevel {
    None,
    Verbose,
    VeryVerbose,
    VeryVeryVerbose,
}

impl From<u8> for VerbosityLevel {
    fn from(value: u8) -> Self {
        match value {
            0 => VerbosityLevel::None,
            1 => VerbosityLevel::Verbose,
            2 => VerbosityLevel::VeryVerbose,
            _ => VerbosityLevel::VeryVeryVerbose,
        }
    }
}

impl VerbosityLevel {
    /// Maps this verbosity level to a log filter
    pub fn into_filter(self) -> Option<log::LevelFilter> {
        match self {
            VerbosityLevel::None => None,
            VerbosityLevel::Verbose => Some(log::LevelFilter::Info),
            VerbosityLevel::VeryVerbose => Some(log::LevelFilter::Debug),
            VerbosityLevel::VeryVeryVerbose => Some(log::LevelFilter::Trace),
        }
    }
}

#[cfg(test)]
mod cli_args_tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn verify_main_cli() {
        use clap::CommandFactory;
        CommandlineArgs::command().debug_assert()
    }

    #[test]
    fn verify_extract_cli() {
        use clap::CommandFactory;
        crate::extract::ExtractSubcommandArgs::command().debug_assert()
    }

    #[test]
    fn verify_compare_cli() {
        use clap::CommandFactory;
        crate::compare::CompareSubcommandArgs::command().debug_assert()
    }

    #[test]
    fn test_main_cli() {
        // Display help
        for args in [
            vec!["critpoints", "--help"],
            vec!["critpoints", "extract", "--help"],
            vec!["critpoints", "compare", "--help"],
        ] {
            assert_eq!(
                CommandlineArgs::try_parse_from(args)
                    .expect_err("this command is supposed to fail")
                    .kind(),
                clap::error::ErrorKind::DisplayHelp
            );
        }

        // Minimum arguments: input file
        let Subcommand::Extract(extract_args) =
            CommandlineArgs::try_parse_from(["critpoints", "extract", "field.json"])
                .expect("this command is supposed to work")
                .subcommand
        else {
            panic!("expected the extract subcommand");
        };
        assert_eq!(
            extract_args.input_file_or_sequence,
            PathBuf::from("field.json")
        );
        assert_eq!(extract_args.extraction.double_precision, Switch::On);
        assert_eq!(extract_args.extraction.parallelize_over_files, Switch::Off);

        // Sequence with range, dims, switches and global verbosity
        let cmd_args = CommandlineArgs::try_parse_from([
            "critpoints",
            "extract",
            "field_{}.raw",
            "-o",
            "out_{}.vtk",
            "-s",
            "2",
            "-e",
            "5",
            "--dims",
            "10",
            "12",
            "14",
            "--mt-files=on",
            "-n",
            "4",
            "-vv",
        ])
        .expect("this command is supposed to work");
        assert_eq!(VerbosityLevel::from(cmd_args.verbosity), VerbosityLevel::VeryVerbose);
        let Subcommand::Extract(extract_args) = cmd_args.subcommand else {
            panic!("expected the extract subcommand");
        };
        assert_eq!(extract_args.start_index, Some(2));
        assert_eq!(extract_args.end_index, Some(5));
        assert_eq!(extract_args.extraction.dims, Some(vec![10, 12, 14]));
        assert_eq!(extract_args.extraction.parallelize_over_files, Switch::On);
        assert_eq!(extract_args.extraction.num_threads, Some(4));

        // Too many dims
        assert!(
            CommandlineArgs::try_parse_from([
                "critpoints",
                "extract",
                "field.raw",
                "--dims",
                "10",
                "12",
                "14",
                "16",
            ])
            .is_err()
        );

        // Switches require an equals sign
        assert!(
            CommandlineArgs::try_parse_from(["critpoints", "extract", "field.raw", "--mt-files", "on"])
                .is_err()
        );

        // Compare needs two inputs
        assert!(CommandlineArgs::try_parse_from(["critpoints", "compare", "a.raw"]).is_err());
        let Subcommand::Compare(compare_args) = CommandlineArgs::try_parse_from([
            "critpoints",
            "compare",
            "orig_{}.raw",
            "lossy_{}.raw",
            "--features-dir",
            "features",
            "--types=maximum,minimum",
        ])
        .expect("this command is supposed to work")
        .subcommand
        else {
            panic!("expected the compare subcommand");
        };
        assert_eq!(compare_args.output_file, PathBuf::from("comparison.csv"));
        assert_eq!(compare_args.features_dir, Some(PathBuf::from("features")));
        assert_eq!(compare_args.extraction.types.len(), 2);
    }
}
