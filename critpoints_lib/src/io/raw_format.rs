//! Helper functions for raw binary scalar field files
//!
//! A raw file is a plain dump of the samples as native endian `f64` values with the x-coordinate
//! varying fastest. The file does not store the grid dimensions.

use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use log::info;

use crate::io::io_utils::{create_parent_dir, try_convert_scalar_slice};
use crate::{GridDims, Real, ScalarField, profile};

const SAMPLE_SIZE: usize = std::mem::size_of::<f64>();

/// Number of bytes of a raw file with the given grid dimensions
fn raw_size_of(dims: &GridDims) -> Result<usize, anyhow::Error> {
    dims.num_points().checked_mul(SAMPLE_SIZE).ok_or_else(|| {
        anyhow!(
            "Grid dimensions {:?} exceed the addressable size of a raw field file",
            dims.as_array()
        )
    })
}

/// Reads a scalar field with the given dimensions from a raw binary file of `f64` samples
pub fn field_from_raw<R: Real, P: AsRef<Path>>(
    raw_file: P,
    dims: GridDims,
) -> Result<ScalarField<R>, anyhow::Error> {
    profile!("field_from_raw");
    let path = raw_file.as_ref();
    let bytes = fs::read(path)
        .with_context(|| format!("Unable to read raw field file \"{}\"", path.display()))?;

    let expected_bytes = raw_size_of(&dims)?;
    if bytes.len() != expected_bytes {
        return Err(anyhow!(
            "Size of raw field file \"{}\" ({} bytes) does not match the grid dimensions {:?} ({} bytes of f64 samples expected)",
            path.display(),
            bytes.len(),
            dims.as_array(),
            expected_bytes
        ));
    }

    // Copy into an f64 buffer as the byte buffer is not necessarily aligned
    let samples: Vec<f64> = bytemuck::pod_collect_to_vec::<u8, f64>(bytes.as_slice());
    let samples = try_convert_scalar_slice(&samples, R::from_f64)?;
    info!(
        "Read {} samples from raw file \"{}\".",
        samples.len(),
        path.display()
    );

    Ok(ScalarField::from_vec(dims, samples)?)
}

/// Writes the samples of the scalar field as native endian `f64` values to a raw binary file
pub fn field_to_raw<R: Real, P: AsRef<Path>>(
    field: &ScalarField<R>,
    raw_file: P,
) -> Result<(), anyhow::Error> {
    profile!("field_to_raw");
    let path = raw_file.as_ref();
    let samples = try_convert_scalar_slice(field.data(), |v: R| v.to_f64())?;

    create_parent_dir(path)?;
    fs::write(path, bytemuck::cast_slice::<f64, u8>(&samples))
        .with_context(|| format!("Unable to write raw field file \"{}\"", path.display()))
}
