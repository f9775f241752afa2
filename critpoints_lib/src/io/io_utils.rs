//! Helpers shared by the file format implementations

use anyhow::{Context, anyhow};
use std::fmt::Debug;
use std::fs::create_dir_all;
use std::path::Path;

/// Converts a slice of scalar values to a vector of the same length, returns an error if conversion fails
pub fn try_convert_scalar_slice<
    ScalarFrom: Copy + Debug,
    ScalarTo,
    F: Fn(ScalarFrom) -> Option<ScalarTo>,
>(
    values: &[ScalarFrom],
    f: F,
) -> Result<Vec<ScalarTo>, anyhow::Error> {
    values
        .iter()
        .copied()
        .map(|v| {
            f(v).ok_or_else(|| {
                anyhow!(
                    "failed to convert value {:?} from type {} to {}",
                    v,
                    std::any::type_name::<ScalarFrom>(),
                    std::any::type_name::<ScalarTo>()
                )
            })
        })
        .collect()
}

/// Creates the parent directory of the given output file if it does not exist yet
pub fn create_parent_dir(path: &Path) -> Result<(), anyhow::Error> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        create_dir_all(dir).with_context(|| {
            format!(
                "Failed to create parent directory of output file \"{}\"",
                path.display()
            )
        })?;
    }
    Ok(())
}
