//! Discovery of numbered file sequences given by a `{}` placeholder in the file name

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use log::info;
use regex::{Regex, escape};
use walkdir::WalkDir;

/// Placeholder for the step index in file names of sequences
pub const PLACEHOLDER: &str = "{}";

/// One input file of a sequence (or a single input file)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceFile {
    /// Step index parsed from the file name, `0` for single files
    pub index: usize,
    /// The digits that replaced the placeholder (including leading zeros), empty for single files
    pub label: String,
    /// Path of the file
    pub path: PathBuf,
}

/// Returns whether the file name of the path contains the sequence placeholder
pub fn is_sequence_pattern(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().contains(PLACEHOLDER))
        .unwrap_or(false)
}

/// Replaces the placeholder in the file name of the pattern with the given label
pub fn apply_placeholder(pattern: &Path, label: &str) -> PathBuf {
    match pattern.file_name() {
        Some(name) => {
            pattern.with_file_name(name.to_string_lossy().replace(PLACEHOLDER, label))
        }
        None => pattern.to_path_buf(),
    }
}

/// Checks that an inclusive index range is not reversed
pub fn check_range(range: (Option<usize>, Option<usize>)) -> Result<(), anyhow::Error> {
    if let (Some(start), Some(end)) = range {
        if start > end {
            return Err(anyhow!(
                "Invalid input sequence range: \"{} to {}\"",
                start,
                end
            ));
        }
    }
    Ok(())
}

/// Returns all input files given by the path, either the single file or all files of a sequence pattern
pub fn collect_input_files(
    path: &Path,
    range: (Option<usize>, Option<usize>),
) -> Result<Vec<SequenceFile>, anyhow::Error> {
    if path.file_name().is_none() {
        return Err(anyhow!(
            "The input file path \"{}\" does not end with a filename",
            path.display()
        ));
    }

    if is_sequence_pattern(path) {
        find_sequence_files(path, range)
    } else if path.is_file() {
        Ok(vec![SequenceFile {
            index: 0,
            label: String::new(),
            path: path.to_path_buf(),
        }])
    } else {
        Err(anyhow!("Input file does not exist: \"{}\"", path.display()))
    }
}

/// Finds all files in the directory of the pattern whose name matches the pattern with digits in place of the placeholder
///
/// Only files with an index in the inclusive `range` are returned. Files are returned in natural
/// order of their names.
pub fn find_sequence_files(
    pattern: &Path,
    range: (Option<usize>, Option<usize>),
) -> Result<Vec<SequenceFile>, anyhow::Error> {
    check_range(range)?;

    let file_pattern = pattern
        .file_name()
        .ok_or_else(|| anyhow!("Sequence pattern \"{}\" has no file name", pattern.display()))?
        .to_string_lossy();
    let (prefix, suffix) = file_pattern.split_once(PLACEHOLDER).ok_or_else(|| {
        anyhow!(
            "The file name \"{}\" does not contain a placeholder \"{}\"",
            file_pattern,
            PLACEHOLDER
        )
    })?;

    let re_str = format!(r"^{}(\d+){}$", escape(prefix), escape(suffix));
    let re = Regex::new(&re_str).context("Failed to build sequence regex")?;

    let dir = pattern.parent().unwrap_or(Path::new(""));
    let root = if dir == Path::new("") {
        Path::new(".")
    } else {
        dir
    };
    if !root.is_dir() {
        return Err(anyhow!(
            "The directory \"{}\" of the sequence pattern \"{}\" does not exist",
            root.display(),
            pattern.display()
        ));
    }
    info!("Looking for sequence files in root \"{}\"", root.display());

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by(|a, b| {
            let a = a.file_name().to_string_lossy();
            let b = b.file_name().to_string_lossy();
            lexical_sort::natural_cmp(&a, &b)
        })
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let name = entry.file_name().to_string_lossy();
        let Some(captures) = re.captures(&name) else {
            continue;
        };

        let label = &captures[1];
        let index: usize = label
            .parse()
            .with_context(|| format!("Sequence index \"{}\" is out of range", label))?;
        if range.0.is_some_and(|start| index < start) || range.1.is_some_and(|end| index > end) {
            continue;
        }

        files.push(SequenceFile {
            index,
            label: label.to_string(),
            path: dir.join(entry.file_name()),
        });
    }

    info!(
        "Found {} files matching the pattern \"{}\" in range {} to {}",
        files.len(),
        re_str,
        range.0.map(|i| i.to_string()).unwrap_or_else(|| "*".to_string()),
        range.1.map(|i| i.to_string()).unwrap_or_else(|| "*".to_string()),
    );

    Ok(files)
}
