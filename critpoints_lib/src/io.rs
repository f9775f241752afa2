//! Convenience functions for importing and exporting scalar fields, feature sets and comparison reports
//!
//! Scalar fields can be read from raw binary files containing native endian `f64` samples (the
//! grid dimensions have to be supplied separately) or from JSON files that store the C-order shape
//! of the grid together with the samples. Feature sets can be written as plain text with one
//! `x y z value` line per critical point, as CSV, as JSON or as VTK point cloud for visualization.

pub mod io_utils;
pub mod json_format;
pub mod raw_format;
pub mod text_format;
pub mod vtk_format;
