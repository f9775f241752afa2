//! Helper functions for plain text and CSV feature files and comparison reports
//!
//! The plain text format stores one critical point per line as whitespace separated
//! `x y z value`. It does not store the type of the critical points. The CSV format has the header
//! `x,y,z,value,type`. Values are written with the shortest representation that reads back exactly.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, anyhow};

use crate::io::io_utils::create_parent_dir;
use crate::{CriticalPoint, CriticalPointType, DistanceRecord, FeatureSet, Real};
use nalgebra::Vector3;

/// Header line of feature CSV files
pub const FEATURES_CSV_HEADER: &str = "x,y,z,value,type";
/// Header line of comparison report CSV files
pub const REPORT_CSV_HEADER: &str = "step,n_first,n_second,difference,normalized";

fn create_writer(path: &Path) -> Result<BufWriter<File>, anyhow::Error> {
    create_parent_dir(path)?;
    let file = File::create(path)
        .with_context(|| anyhow!("Cannot create output file \"{}\"", path.display()))?;
    Ok(BufWriter::new(file))
}

fn open_reader(path: &Path) -> Result<BufReader<File>, anyhow::Error> {
    let file = File::open(path)
        .with_context(|| anyhow!("Cannot open file \"{}\" for reading", path.display()))?;
    Ok(BufReader::new(file))
}

fn parse_real<R: Real>(token: &str, line_number: usize) -> Result<R, anyhow::Error> {
    let value: f64 = token
        .trim()
        .parse()
        .with_context(|| anyhow!("Invalid number \"{}\" in line {}", token, line_number))?;
    R::from_f64(value).ok_or_else(|| {
        anyhow!(
            "Value {} in line {} cannot be represented by the target type",
            value,
            line_number
        )
    })
}

/// Writes the feature set to a plain text file with one `x y z value` line per critical point
pub fn features_to_txt<R: Real, P: AsRef<Path>>(
    features: &FeatureSet<R>,
    txt_file: P,
) -> Result<(), anyhow::Error> {
    let path = txt_file.as_ref();
    let mut writer = create_writer(path)?;
    for [x, y, z, v] in features.to_rows() {
        writeln!(
            writer,
            "{} {} {} {}",
            x.to_f64_unchecked(),
            y.to_f64_unchecked(),
            z.to_f64_unchecked(),
            v.to_f64_unchecked()
        )?;
    }
    writer
        .flush()
        .with_context(|| anyhow!("Failed to write feature file \"{}\"", path.display()))
}

/// Reads a feature set from a plain text file, all points are assigned the given type
///
/// Empty lines and lines starting with `#` are skipped.
pub fn features_from_txt<R: Real, P: AsRef<Path>>(
    txt_file: P,
    kind: CriticalPointType,
) -> Result<FeatureSet<R>, anyhow::Error> {
    let path = txt_file.as_ref();
    let mut rows = Vec::new();
    for (i, line) in open_reader(path)?.lines().enumerate() {
        let line = line.with_context(|| anyhow!("Failed to read \"{}\"", path.display()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens = line.split_whitespace().collect::<Vec<_>>();
        if tokens.len() != 4 {
            return Err(anyhow!(
                "Expected 4 values (x y z value) in line {} of \"{}\", found {}",
                i + 1,
                path.display(),
                tokens.len()
            ));
        }

        let mut row = [R::zero(); 4];
        for (value, token) in row.iter_mut().zip(tokens) {
            *value = parse_real(token, i + 1)?;
        }
        rows.push(row);
    }

    Ok(FeatureSet::from_rows(&rows, kind))
}

/// Writes the feature set to a CSV file with the columns `x,y,z,value,type`
pub fn features_to_csv<R: Real, P: AsRef<Path>>(
    features: &FeatureSet<R>,
    csv_file: P,
) -> Result<(), anyhow::Error> {
    let path = csv_file.as_ref();
    let mut writer = create_writer(path)?;
    writeln!(writer, "{}", FEATURES_CSV_HEADER)?;
    for p in features {
        writeln!(
            writer,
            "{},{},{},{},{}",
            p.position.x.to_f64_unchecked(),
            p.position.y.to_f64_unchecked(),
            p.position.z.to_f64_unchecked(),
            p.value.to_f64_unchecked(),
            p.kind
        )?;
    }
    writer
        .flush()
        .with_context(|| anyhow!("Failed to write feature file \"{}\"", path.display()))
}

/// Reads a feature set from a CSV file written by [`features_to_csv`]
pub fn features_from_csv<R: Real, P: AsRef<Path>>(
    csv_file: P,
) -> Result<FeatureSet<R>, anyhow::Error> {
    let path = csv_file.as_ref();
    let mut lines = open_reader(path)?.lines();

    let header = lines
        .next()
        .transpose()?
        .ok_or_else(|| anyhow!("CSV file \"{}\" is empty", path.display()))?;
    if header.trim() != FEATURES_CSV_HEADER {
        return Err(anyhow!(
            "Unexpected header \"{}\" in \"{}\", expected \"{}\"",
            header.trim(),
            path.display(),
            FEATURES_CSV_HEADER
        ));
    }

    let mut points = Vec::new();
    for (i, line) in lines.enumerate() {
        let line_number = i + 2;
        let line = line.with_context(|| anyhow!("Failed to read \"{}\"", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }

        let fields = line.split(',').collect::<Vec<_>>();
        let [x, y, z, value, kind] = fields.as_slice() else {
            return Err(anyhow!(
                "Expected 5 columns in line {} of \"{}\", found {}",
                line_number,
                path.display(),
                fields.len()
            ));
        };

        points.push(CriticalPoint {
            position: Vector3::new(
                parse_real(x, line_number)?,
                parse_real(y, line_number)?,
                parse_real(z, line_number)?,
            ),
            value: parse_real(value, line_number)?,
            kind: kind
                .parse()
                .with_context(|| anyhow!("Invalid type in line {}", line_number))?,
        });
    }

    Ok(FeatureSet::from_points(points))
}

/// Writes a comparison report to a CSV file with the columns `step,n_first,n_second,difference,normalized`
pub fn report_to_csv<P: AsRef<Path>>(
    records: &[DistanceRecord],
    csv_file: P,
) -> Result<(), anyhow::Error> {
    let path = csv_file.as_ref();
    let mut writer = create_writer(path)?;
    writeln!(writer, "{}", REPORT_CSV_HEADER)?;
    for r in records {
        writeln!(
            writer,
            "{},{},{},{},{}",
            r.step, r.n_first, r.n_second, r.distance.difference, r.distance.normalized
        )?;
    }
    writer
        .flush()
        .with_context(|| anyhow!("Failed to write report file \"{}\"", path.display()))
}
