//! Implementation of the `extract` subcommand of the critpoints CLI.

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::value_parser;
use critpoints_lib::{
    CriticalPointType, CriticalPointTypeFlags, FeatureSet, GridDims, Parameters, Real,
    extract_features_from_field, profile,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;

use crate::cli::Switch;
use crate::sequence::{self, SequenceFile};
use crate::{io, logging};

pub(crate) static ARGS_IO: &str = "Input/output";
pub(crate) static ARGS_EXTRACTION: &str = "Extraction parameters";
pub(crate) static ARGS_ADV: &str = "Advanced parameters";
static ARGS_OTHER: &str = "Remaining options";

/// Extraction parameters shared by all subcommands
#[derive(Clone, Debug, clap::Args)]
pub(crate) struct ExtractionArgs {
    /// Grid dimensions of raw input files (x varies fastest in the file), required for raw binary input (.raw, .bin, .dat, .f64)
    #[arg(
        help_heading = ARGS_IO,
        long,
        number_of_values = 3,
        value_names = ["NX", "NY", "NZ"],
    )]
    pub dims: Option<Vec<usize>>,

    /// Comma separated list of the types of critical points to report (maximum, minimum, saddle, degenerate)
    #[arg(
        help_heading = ARGS_EXTRACTION,
        short = 't',
        long,
        value_delimiter = ',',
        default_value = "maximum",
    )]
    pub types: Vec<CriticalPointType>,
    /// Critical points closer to each other than this distance (in grid units) are reported only once, 0 disables merging
    #[arg(help_heading = ARGS_EXTRACTION, long, default_value = "1e-6")]
    pub merge_distance: f64,
    /// Tolerance for negative barycentric coordinates when locating a gradient zero inside a simplex
    #[arg(help_heading = ARGS_EXTRACTION, long, default_value = "1e-10")]
    pub barycentric_tolerance: f64,

    /// Enable the use of double precision for all computations
    #[arg(
        help_heading = ARGS_ADV,
        short = 'd',
        long,
        default_value = "on",
        value_name = "off|on",
        ignore_case = true,
        require_equals = true
    )]
    pub double_precision: Switch,
    /// Enable multithreading for a single field by processing slabs of simplices in parallel
    #[arg(
        help_heading = ARGS_ADV,
        long = "mt-simplices",
        default_value = "on",
        value_name = "off|on",
        ignore_case = true,
        require_equals = true
    )]
    pub parallelize_over_simplices: Switch,
    /// Enable multithreading to process multiple input files in parallel
    #[arg(
        help_heading = ARGS_ADV,
        long = "mt-files",
        default_value = "off",
        value_name = "off|on",
        ignore_case = true,
        require_equals = true
    )]
    pub parallelize_over_files: Switch,
    /// Number of threads of the global thread pool (default: number of logical cores)
    #[arg(help_heading = ARGS_ADV, short = 'n', long, value_parser = value_parser!(u16).range(1..))]
    pub num_threads: Option<u16>,
}

/// Command line arguments for the `extract` subcommand
#[derive(Clone, Debug, clap::Parser)]
#[command(next_help_heading = ARGS_OTHER)]
pub(crate) struct ExtractSubcommandArgs {
    /// Path to the input file with the scalar field (supported formats: raw f64 binary, JSON), use "{}" in the filename to indicate a placeholder for a sequence.
    #[arg(help_heading = ARGS_IO, value_parser = value_parser!(PathBuf))]
    pub input_file_or_sequence: PathBuf,
    /// Filename for writing the critical points to disk (supported formats: TXT, CSV, JSON, VTK, default: "{original_filename}_features.csv")
    #[arg(help_heading = ARGS_IO, short = 'o', long, value_parser = value_parser!(PathBuf))]
    pub output_file: Option<PathBuf>,
    /// Optional base directory for all output files (default: current working directory)
    #[arg(help_heading = ARGS_IO, long, value_parser = value_parser!(PathBuf))]
    pub output_dir: Option<PathBuf>,
    /// Index of the first input file to process when processing a sequence of files (default: lowest index of the sequence)
    #[arg(help_heading = ARGS_IO, short = 's', long)]
    pub start_index: Option<usize>,
    /// Index of the last input file to process when processing a sequence of files (default: highest index of the sequence)
    #[arg(help_heading = ARGS_IO, short = 'e', long)]
    pub end_index: Option<usize>,

    #[command(flatten)]
    pub extraction: ExtractionArgs,
}

/// All extraction arguments converted to useful types
#[derive(Clone, Debug)]
pub struct ExtractionRunnerArgs {
    /// Parameters passed directly to the feature extraction
    pub params: Parameters<f64>,
    pub use_double_precision: bool,
    pub parallelize_over_files: bool,
    pub input_format: io::InputFormatParameters,
}

impl TryFrom<&ExtractionArgs> for ExtractionRunnerArgs {
    type Error = anyhow::Error;

    fn try_from(args: &ExtractionArgs) -> Result<Self, Self::Error> {
        let dims = match args.dims.as_deref() {
            Some(&[nx, ny, nz]) => {
                Some(GridDims::new(nx, ny, nz).context("Invalid grid dimensions")?)
            }
            Some(dims) => {
                return Err(anyhow!(
                    "Expected three grid dimensions, got {}",
                    dims.len()
                ));
            }
            None => None,
        };

        if !(args.merge_distance >= 0.0) {
            return Err(anyhow!(
                "The merge distance has to be non-negative (got {})",
                args.merge_distance
            ));
        }
        if !(args.barycentric_tolerance >= 0.0) {
            return Err(anyhow!(
                "The barycentric tolerance has to be non-negative (got {})",
                args.barycentric_tolerance
            ));
        }

        let accepted_types = args
            .types
            .iter()
            .fold(CriticalPointTypeFlags::empty(), |flags, t| flags | t.flag());

        let params = Parameters {
            enable_multi_threading: args.parallelize_over_simplices.into_bool(),
            accepted_types,
            barycentric_tolerance: args.barycentric_tolerance,
            merge_distance: (args.merge_distance > 0.0).then_some(args.merge_distance),
            bounds: None,
        };

        Ok(Self {
            params,
            use_double_precision: args.double_precision.into_bool(),
            parallelize_over_files: args.parallelize_over_files.into_bool(),
            input_format: io::InputFormatParameters { dims },
        })
    }
}

/// Initializes the global thread pool if a thread count was given
pub(crate) fn initialize_threads(num_threads: Option<u16>) {
    if let Some(num_threads) = num_threads {
        match critpoints_lib::initialize_thread_pool(num_threads as usize) {
            Ok(()) => info!("Using {} threads.", num_threads),
            Err(err) => warn!("Unable to initialize thread pool: {}", err),
        }
    }
}

/// Input and output file of a single extraction task
#[derive(Clone, Debug)]
pub(crate) struct ExtractionRunnerPaths {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
}

/// Default output file name: `{stem}_features.csv`, or `{stem}` with the placeholder replaced by `features_{}` for sequences
fn default_output_filename(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    if sequence::is_sequence_pattern(input) {
        format!("{}.csv", stem.replace(sequence::PLACEHOLDER, "features_{}")).into()
    } else {
        format!("{}_features.csv", stem).into()
    }
}

/// Pairs every input file with its output file
fn collect_paths(
    args: &ExtractSubcommandArgs,
) -> Result<Vec<ExtractionRunnerPaths>, anyhow::Error> {
    let input = &args.input_file_or_sequence;
    let is_sequence = sequence::is_sequence_pattern(input);

    let output_file = match &args.output_file {
        Some(output_file) => {
            if is_sequence && !sequence::is_sequence_pattern(output_file) {
                return Err(anyhow!(
                    "The output filename \"{}\" does not contain a place holder \"{{}}\"",
                    output_file.display()
                ));
            }
            output_file.clone()
        }
        None => default_output_filename(input),
    };
    let output_file = match &args.output_dir {
        Some(output_dir) => output_dir.join(output_file),
        None => output_file,
    };

    let inputs = sequence::collect_input_files(input, (args.start_index, args.end_index))?;
    Ok(inputs
        .into_iter()
        .map(|SequenceFile { label, path, .. }| ExtractionRunnerPaths {
            input_file: path,
            output_file: if is_sequence {
                sequence::apply_placeholder(&output_file, &label)
            } else {
                output_file.clone()
            },
        })
        .collect())
}

/// Creates the progress bar for sequences with more than one step and registers it with the logger
pub(crate) fn start_progress(num_steps: usize) -> Option<ProgressBar> {
    if num_steps <= 1 {
        return None;
    }

    let pb = ProgressBar::new(num_steps as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) - remaining: [{eta_precise}]",
    )
    .map(|style| style.progress_chars("=> "))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    logging::set_progress_bar(Some(pb.downgrade()));
    Some(pb)
}

/// Finishes the progress bar and unregisters it from the logger
pub(crate) fn finish_progress(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish();
        logging::set_progress_bar(None);
    }
}

pub(crate) fn inc_progress() {
    if let Some(pb) = logging::get_progress_bar() {
        pb.inc(1)
    }
}

/// Executes the `extract` subcommand
pub(crate) fn extract_subcommand(cmd_args: &ExtractSubcommandArgs) -> Result<(), anyhow::Error> {
    profile!("extract subcommand");

    initialize_threads(cmd_args.extraction.num_threads);
    let paths = collect_paths(cmd_args)
        .context("Failed parsing input file path(s) from command line")?;
    let args = ExtractionRunnerArgs::try_from(&cmd_args.extraction)
        .context("Failed processing parameters from command line")?;

    if paths.is_empty() {
        return Err(anyhow!(
            "No input files found for \"{}\"",
            cmd_args.input_file_or_sequence.display()
        ));
    }

    let pb = start_progress(paths.len());
    let run = |path: &ExtractionRunnerPaths| {
        extraction_pipeline_from_args(&path.input_file, Some(&path.output_file), &args)
            .with_context(|| {
                format!(
                    "Error while processing input file \"{}\"",
                    path.input_file.display()
                )
            })
            .map(|_| inc_progress())
    };

    let result = if args.parallelize_over_files {
        paths.par_iter().try_for_each(|path| {
            // Already log the error in case there are multiple errors
            run(path).inspect_err(logging::log_error)
        })
    } else {
        paths.iter().try_for_each(run)
    };
    finish_progress(pb);

    if result.is_ok() {
        info!("Successfully finished processing all inputs.");
    }

    result
}

/// Calls the extraction pipeline for single or double precision depending on the runtime parameters
///
/// Returns the number of extracted critical points.
pub fn extraction_pipeline_from_args(
    input_file: &Path,
    output_file: Option<&Path>,
    args: &ExtractionRunnerArgs,
) -> Result<usize, anyhow::Error> {
    if args.use_double_precision {
        info!("Using double precision (f64) for feature extraction.");
        let features = extraction_pipeline::<f64>(
            input_file,
            output_file,
            &args.input_format,
            &args.params,
        )?;
        Ok(features.len())
    } else {
        info!("Using single precision (f32) for feature extraction.");
        let params = args
            .params
            .try_convert::<f32>()
            .ok_or_else(|| anyhow!("Unable to convert extraction parameters to f32"))?;
        let features =
            extraction_pipeline::<f32>(input_file, output_file, &args.input_format, &params)?;
        Ok(features.len())
    }
}

/// Loads the scalar field from the input file, extracts its critical points and optionally writes them to the output file
pub fn extraction_pipeline<R: Real>(
    input_file: &Path,
    output_file: Option<&Path>,
    input_format: &io::InputFormatParameters,
    params: &Parameters<R>,
) -> Result<FeatureSet<R>, anyhow::Error> {
    let field = io::read_scalar_field::<R, _>(input_file, input_format).with_context(|| {
        format!(
            "Failed to load scalar field from file \"{}\"",
            input_file.display()
        )
    })?;

    let features = {
        profile!("extraction");
        extract_features_from_field(&field, params)
    };

    if let Some(output_file) = output_file {
        io::write_features(&features, output_file).with_context(|| {
            format!(
                "Failed to write critical points to file \"{}\"",
                output_file.display()
            )
        })?;
    }

    Ok(features)
}
