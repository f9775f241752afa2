use std::path::Path;

use anyhow::{Context, anyhow};
use critpoints_lib::io::{json_format, raw_format, text_format, vtk_format};
use critpoints_lib::{DistanceRecord, FeatureSet, GridDims, Real, ScalarField, profile};
use log::info;

/// File extensions that are read as raw native endian `f64` samples
pub const RAW_EXTENSIONS: [&str; 4] = ["raw", "bin", "dat", "f64"];

/// File format parameters for input files
#[derive(Clone, Debug, Default)]
pub struct InputFormatParameters {
    /// Grid dimensions `(nx, ny, nz)` of raw input files, these files do not store their shape
    pub dims: Option<GridDims>,
}

fn lowercase_extension(file: &Path) -> Result<String, anyhow::Error> {
    let extension = file.extension().ok_or_else(|| {
        anyhow!(
            "Unable to detect file format of \"{}\" (file name has to end with supported extension)",
            file.display()
        )
    })?;
    Ok(extension
        .to_str()
        .ok_or(anyhow!("Invalid extension of file \"{}\"", file.display()))?
        .to_lowercase())
}

/// Loads a scalar field from the given file path, automatically detects the file format
pub fn read_scalar_field<R: Real, P: AsRef<Path>>(
    input_file: P,
    format_params: &InputFormatParameters,
) -> Result<ScalarField<R>, anyhow::Error> {
    let input_file = input_file.as_ref();
    info!("Reading scalar field from \"{}\"...", input_file.display());

    let field = {
        profile!("loading scalar field");

        let extension = lowercase_extension(input_file)?;
        match extension.as_str() {
            "json" => json_format::field_from_json(input_file)?,
            ext if RAW_EXTENSIONS.contains(&ext) => {
                let dims = format_params.dims.ok_or_else(|| {
                    anyhow!(
                        "Grid dimensions are required to read raw file \"{}\" (use --dims NX NY NZ)",
                        input_file.display()
                    )
                })?;
                raw_format::field_from_raw(input_file, dims)?
            }
            _ => {
                return Err(anyhow!(
                    "Unsupported file format extension \"{}\" for reading scalar fields",
                    extension
                ));
            }
        }
    };

    let [nx, ny, nz] = *field.dims().as_array();
    info!(
        "Successfully read scalar field with {}x{}x{} samples.",
        nx, ny, nz
    );

    Ok(field)
}

/// Writes a feature set to the given file path, automatically detects the file format
pub fn write_features<R: Real, P: AsRef<Path>>(
    features: &FeatureSet<R>,
    output_file: P,
) -> Result<(), anyhow::Error> {
    let output_file = output_file.as_ref();
    info!(
        "Writing {} critical points to \"{}\"...",
        features.len(),
        output_file.display()
    );

    {
        profile!("writing features");

        let extension = lowercase_extension(output_file)?;
        match extension.as_str() {
            "txt" => text_format::features_to_txt(features, output_file)?,
            "csv" => text_format::features_to_csv(features, output_file)?,
            "json" => json_format::features_to_json(features, output_file)?,
            "vtk" => vtk_format::features_to_vtk(features, output_file)?,
            _ => {
                return Err(anyhow!(
                    "Unsupported file format extension \"{}\" for writing features",
                    extension
                ));
            }
        }
    }

    info!("Done.");
    Ok(())
}

/// Writes the per-step comparison report to a CSV or JSON file depending on its extension
pub fn write_report<P: AsRef<Path>>(
    records: &[DistanceRecord],
    output_file: P,
) -> Result<(), anyhow::Error> {
    let output_file = output_file.as_ref();
    info!(
        "Writing comparison report with {} steps to \"{}\"...",
        records.len(),
        output_file.display()
    );

    let extension = lowercase_extension(output_file)?;
    let result = match extension.as_str() {
        "csv" => text_format::report_to_csv(records, output_file),
        "json" => json_format::report_to_json(records, output_file),
        _ => Err(anyhow!(
            "Unsupported file format extension \"{}\" for writing comparison reports",
            extension
        )),
    };
    result.with_context(|| format!("Failed to write report \"{}\"", output_file.display()))
}
