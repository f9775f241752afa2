//! Helper functions for the JSON file format

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, anyhow};
use serde_json::{Value, json};

use crate::io::io_utils::{create_parent_dir, try_convert_scalar_slice};
use crate::{DistanceRecord, FeatureSet, GridDims, Real, ScalarField};

/// Convenience function for loading a scalar field from a JSON file
///
/// The file is expected to contain an object with the C-order shape of the grid (slowest varying
/// axis first) and the flat samples, for example:
/// ```json
/// { "shape": [2, 3, 4], "data": [0.0, 1.0, ...] }
/// ```
/// The shape `[s0, s1, s2]` corresponds to the grid dimensions `nx = s2`, `ny = s1`, `nz = s0`.
pub fn field_from_json<R: Real, P: AsRef<Path>>(
    json_file: P,
) -> Result<ScalarField<R>, anyhow::Error> {
    let path = json_file.as_ref();
    let file = File::open(path).context("Cannot open file for JSON parsing")?;
    let reader = BufReader::new(file);

    let json: Value = serde_json::from_reader(reader)
        .context("Reading of file to JSON structure failed. Not a valid JSON file.")?;

    let shape = serde_json::from_value::<[usize; 3]>(json["shape"].clone())
        .context("Parsing of the field shape failed. Expected an array of three sample counts like e.g. '\"shape\": [64, 64, 64]'.")?;
    let data = serde_json::from_value::<Vec<f64>>(json["data"].clone())
        .context("Parsing of the field samples failed. Expected a flat array of numbers like e.g. '\"data\": [1.0, 2.0, 3.0]'.")?;

    let dims = GridDims::from_c_order_shape(shape)?;
    let data = try_convert_scalar_slice(&data, R::from_f64)?;
    Ok(ScalarField::from_vec(dims, data)?)
}

/// Writes a scalar field to a JSON file, see [`field_from_json`] for the layout
pub fn field_to_json<R: Real, P: AsRef<Path>>(
    field: &ScalarField<R>,
    json_file: P,
) -> Result<(), anyhow::Error> {
    let data = try_convert_scalar_slice(field.data(), |v: R| v.to_f64())?;
    let json = json!({
        "shape": field.dims().c_order_shape(),
        "data": data,
    });
    write_json(&json, json_file.as_ref())
}

/// Writes a feature set to a JSON file with one object per critical point
pub fn features_to_json<R: Real, P: AsRef<Path>>(
    features: &FeatureSet<R>,
    json_file: P,
) -> Result<(), anyhow::Error> {
    let points = features
        .iter()
        .map(|p| {
            json!({
                "position": [
                    p.position.x.to_f64_unchecked(),
                    p.position.y.to_f64_unchecked(),
                    p.position.z.to_f64_unchecked(),
                ],
                "value": p.value.to_f64_unchecked(),
                "type": p.kind.as_str(),
            })
        })
        .collect::<Vec<_>>();

    write_json(
        &json!({ "count": features.len(), "points": points }),
        json_file.as_ref(),
    )
}

/// Writes a comparison report to a JSON file as an array with one object per step
pub fn report_to_json<P: AsRef<Path>>(
    records: &[DistanceRecord],
    json_file: P,
) -> Result<(), anyhow::Error> {
    let rows = records
        .iter()
        .map(|r| {
            json!({
                "step": r.step,
                "n_first": r.n_first,
                "n_second": r.n_second,
                "difference": r.distance.difference,
                "normalized": r.distance.normalized,
            })
        })
        .collect::<Vec<_>>();
    write_json(&Value::Array(rows), json_file.as_ref())
}

fn write_json(json: &Value, path: &Path) -> Result<(), anyhow::Error> {
    create_parent_dir(path)?;
    let file = File::create(path)
        .with_context(|| anyhow!("Cannot create JSON file \"{}\"", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, json).context("Failed to serialize JSON")?;
    writer.flush().context("Failed to write JSON file")?;
    Ok(())
}
