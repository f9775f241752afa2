//! Implementation of the `compare` subcommand of the critpoints CLI.
//!
//! Pairs the steps of an original and a lossy reconstructed field sequence by their index,
//! extracts the critical points of both fields of every pair and reports the distance of the
//! resulting feature sets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::value_parser;
use critpoints_lib::{DistanceRecord, Parameters, Real, profile};
use log::{info, warn};
use rayon::prelude::*;

use crate::extract::{
    self, ARGS_IO, ExtractionArgs, ExtractionRunnerArgs, extraction_pipeline,
};
use crate::sequence::{self, SequenceFile};
use crate::{io, logging};

/// Command line arguments for the `compare` subcommand
#[derive(Clone, Debug, clap::Parser)]
pub(crate) struct CompareSubcommandArgs {
    /// Path to the original scalar field (supported formats: raw f64 binary, JSON), use "{}" in the filename to indicate a placeholder for a sequence.
    #[arg(help_heading = ARGS_IO, value_parser = value_parser!(PathBuf))]
    pub original: PathBuf,
    /// Path to the lossy reconstructed scalar field, has to be a sequence pattern if the original is one
    #[arg(help_heading = ARGS_IO, value_parser = value_parser!(PathBuf))]
    pub lossy: PathBuf,
    /// Filename for writing the per-step comparison report (supported formats: CSV, JSON)
    #[arg(
        help_heading = ARGS_IO,
        short = 'o',
        long,
        default_value = "comparison.csv",
        value_parser = value_parser!(PathBuf)
    )]
    pub output_file: PathBuf,
    /// Optional base directory for all output files (default: current working directory)
    #[arg(help_heading = ARGS_IO, long, value_parser = value_parser!(PathBuf))]
    pub output_dir: Option<PathBuf>,
    /// Optional directory for writing the critical points of every original and lossy field as CSV files
    #[arg(help_heading = ARGS_IO, long, value_parser = value_parser!(PathBuf))]
    pub features_dir: Option<PathBuf>,
    /// Index of the first step to compare when processing sequences (default: lowest index of the sequence)
    #[arg(help_heading = ARGS_IO, short = 's', long)]
    pub start_index: Option<usize>,
    /// Index of the last step to compare when processing sequences (default: highest index of the sequence)
    #[arg(help_heading = ARGS_IO, short = 'e', long)]
    pub end_index: Option<usize>,

    #[command(flatten)]
    pub extraction: ExtractionArgs,
}

/// Original and lossy input file of one step
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepPair {
    pub step: usize,
    pub label: String,
    pub original: PathBuf,
    pub lossy: PathBuf,
}

/// Pairs the files of two sequences by their step index, steps missing in one of the sequences are skipped with a warning
///
/// If several lossy files share a step index, the first one is used and the others are skipped with a warning.
pub fn pair_steps(original: Vec<SequenceFile>, lossy: Vec<SequenceFile>) -> Vec<StepPair> {
    let mut lossy_by_step = BTreeMap::<usize, SequenceFile>::new();
    for file in lossy {
        if let Some(kept) = lossy_by_step.get(&file.index) {
            warn!(
                "Multiple lossy fields found for step {}, ignoring \"{}\" in favor of \"{}\".",
                file.index,
                file.path.display(),
                kept.path.display()
            );
        } else {
            lossy_by_step.insert(file.index, file);
        }
    }

    let mut pairs = Vec::with_capacity(original.len());
    for original in original {
        match lossy_by_step.remove(&original.index) {
            Some(lossy) => pairs.push(StepPair {
                step: original.index,
                label: original.label,
                original: original.path,
                lossy: lossy.path,
            }),
            None => warn!(
                "No lossy field found for step {} (\"{}\"), skipping.",
                original.index,
                original.path.display()
            ),
        }
    }
    for unmatched in lossy_by_step.values() {
        warn!(
            "No original field found for step {} (\"{}\"), skipping.",
            unmatched.index,
            unmatched.path.display()
        );
    }

    pairs.sort_by_key(|p| p.step);
    pairs
}

fn collect_pairs(args: &CompareSubcommandArgs) -> Result<Vec<StepPair>, anyhow::Error> {
    let range = (args.start_index, args.end_index);
    match (
        sequence::is_sequence_pattern(&args.original),
        sequence::is_sequence_pattern(&args.lossy),
    ) {
        (true, true) => Ok(pair_steps(
            sequence::find_sequence_files(&args.original, range)?,
            sequence::find_sequence_files(&args.lossy, range)?,
        )),
        (false, false) => Ok(pair_steps(
            sequence::collect_input_files(&args.original, range)?,
            sequence::collect_input_files(&args.lossy, range)?,
        )),
        _ => Err(anyhow!(
            "Either both or none of the original (\"{}\") and lossy (\"{}\") inputs have to be sequence patterns",
            args.original.display(),
            args.lossy.display()
        )),
    }
}

/// Output files for the critical points of one step pair
fn feature_files(features_dir: &Path, pair: &StepPair) -> (PathBuf, PathBuf) {
    let name = |prefix: &str, path: &Path| {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        features_dir.join(format!("{}_{}_features.csv", prefix, stem))
    };
    (name("original", &pair.original), name("lossy", &pair.lossy))
}

/// Executes the `compare` subcommand
pub(crate) fn compare_subcommand(cmd_args: &CompareSubcommandArgs) -> Result<(), anyhow::Error> {
    profile!("compare subcommand");

    extract::initialize_threads(cmd_args.extraction.num_threads);
    let pairs = collect_pairs(cmd_args)
        .context("Failed parsing input file path(s) from command line")?;
    let args = ExtractionRunnerArgs::try_from(&cmd_args.extraction)
        .context("Failed processing parameters from command line")?;

    if pairs.is_empty() {
        return Err(anyhow!("No pairs of original and lossy fields to compare"));
    }

    let features_dir = cmd_args
        .features_dir
        .as_ref()
        .map(|dir| match &cmd_args.output_dir {
            Some(output_dir) => output_dir.join(dir),
            None => dir.clone(),
        });
    let output_file = match &cmd_args.output_dir {
        Some(output_dir) => output_dir.join(&cmd_args.output_file),
        None => cmd_args.output_file.clone(),
    };

    let pb = extract::start_progress(pairs.len());
    let run = |pair: &StepPair| {
        let outputs = features_dir.as_deref().map(|dir| feature_files(dir, pair));
        compare_pair_from_args(pair, outputs, &args)
            .with_context(|| {
                format!(
                    "Error while comparing step {} (\"{}\" and \"{}\")",
                    pair.step,
                    pair.original.display(),
                    pair.lossy.display()
                )
            })
            .inspect(|_| extract::inc_progress())
    };

    let records = if args.parallelize_over_files {
        pairs
            .par_iter()
            .map(|pair| run(pair).inspect_err(logging::log_error))
            .collect::<Result<Vec<_>, _>>()
    } else {
        pairs.iter().map(run).collect::<Result<Vec<_>, _>>()
    };
    extract::finish_progress(pb);
    let records = records?;

    for r in &records {
        info!(
            "Step {}: {} original vs. {} lossy critical points, difference {}, normalized {:.4}",
            r.step, r.n_first, r.n_second, r.distance.difference, r.distance.normalized
        );
    }
    io::write_report(&records, &output_file)?;

    info!("Successfully finished comparing all inputs.");
    Ok(())
}

/// Calls the comparison for single or double precision depending on the runtime parameters
pub fn compare_pair_from_args(
    pair: &StepPair,
    feature_files: Option<(PathBuf, PathBuf)>,
    args: &ExtractionRunnerArgs,
) -> Result<DistanceRecord, anyhow::Error> {
    if args.use_double_precision {
        compare_pair::<f64>(pair, feature_files, &args.input_format, &args.params)
    } else {
        let params = args
            .params
            .try_convert::<f32>()
            .ok_or_else(|| anyhow!("Unable to convert extraction parameters to f32"))?;
        compare_pair::<f32>(pair, feature_files, &args.input_format, &params)
    }
}

/// Extracts the critical points of the original and the lossy field of a step and computes their distance
///
/// If `feature_files` are given, the critical points of the original and the lossy field are written to these files.
pub fn compare_pair<R: Real>(
    pair: &StepPair,
    feature_files: Option<(PathBuf, PathBuf)>,
    input_format: &io::InputFormatParameters,
    params: &Parameters<R>,
) -> Result<DistanceRecord, anyhow::Error> {
    let (original_out, lossy_out) = match feature_files {
        Some((original, lossy)) => (Some(original), Some(lossy)),
        None => (None, None),
    };

    let original =
        extraction_pipeline(&pair.original, original_out.as_deref(), input_format, params)?;
    let lossy = extraction_pipeline(&pair.lossy, lossy_out.as_deref(), input_format, params)?;

    Ok(DistanceRecord::new(pair.step, &original, &lossy))
}
