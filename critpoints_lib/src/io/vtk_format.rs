//! Helper functions for the VTK file format

use std::path::Path;

use anyhow::{Context, anyhow};
use vtkio::IOBuffer;
use vtkio::model::{
    Attribute, Attributes, ByteOrder, CellType, Cells, DataSet, UnstructuredGridPiece, Version,
    VertexNumbers, Vtk,
};

use crate::io::io_utils::create_parent_dir;
use crate::{CriticalPointType, FeatureSet, Real, profile};

/// Name of the point attribute storing the scalar value at each critical point
pub const VALUE_ATTRIBUTE: &str = "value";
/// Name of the point attribute storing the type of each critical point (index into [`CriticalPointType::ALL`])
pub const TYPE_ATTRIBUTE: &str = "type";

/// Converts a feature set into a VTK point cloud with one vertex cell per critical point
impl<R: Real> From<&FeatureSet<R>> for UnstructuredGridPiece {
    fn from(features: &FeatureSet<R>) -> Self {
        let mut points = Vec::with_capacity(features.len() * 3);
        let mut values = Vec::with_capacity(features.len());
        let mut types = Vec::with_capacity(features.len());
        for p in features {
            points.extend(p.position.iter().map(|c| c.to_f64_unchecked()));
            values.push(p.value.to_f64_unchecked());
            types.push(
                CriticalPointType::ALL
                    .iter()
                    .position(|t| *t == p.kind)
                    .unwrap_or_default() as u32,
            );
        }

        // Each critical point has a cell of type `Vertex`
        let vertices = (0..features.len() as u32)
            .flat_map(|i| [1, i])
            .collect::<Vec<_>>();

        let mut data = Attributes::new();
        data.point
            .push(Attribute::scalars(VALUE_ATTRIBUTE, 1).with_data(IOBuffer::F64(values)));
        data.point
            .push(Attribute::scalars(TYPE_ATTRIBUTE, 1).with_data(IOBuffer::U32(types)));

        UnstructuredGridPiece {
            points: IOBuffer::F64(points),
            cells: Cells {
                cell_verts: VertexNumbers::Legacy {
                    num_cells: features.len() as u32,
                    vertices,
                },
                types: vec![CellType::Vertex; features.len()],
            },
            data,
        }
    }
}

/// Writes the feature set as point cloud with `value` and `type` point attributes to a VTK file
pub fn features_to_vtk<R: Real, P: AsRef<Path>>(
    features: &FeatureSet<R>,
    vtk_file: P,
) -> Result<(), anyhow::Error> {
    write_vtk(
        UnstructuredGridPiece::from(features),
        vtk_file,
        "critical points",
    )
}

/// Tries to write an unstructured grid piece into a big endian legacy VTK file
pub fn write_vtk<P: AsRef<Path>>(
    piece: UnstructuredGridPiece,
    filename: P,
    title: &str,
) -> Result<(), anyhow::Error> {
    profile!("write_vtk");
    let vtk_file = Vtk {
        version: Version::new((4, 2)),
        title: title.to_string(),
        file_path: None,
        byte_order: ByteOrder::BigEndian,
        data: DataSet::inline(piece),
    };

    let filename = filename.as_ref();
    create_parent_dir(filename)?;
    vtk_file
        .export_be(filename)
        .with_context(|| anyhow!("Error while writing VTK output to file \"{}\"", filename.display()))
}

/// Tries to read the given VTK file and returns its first unstructured grid piece
pub fn read_vtk_piece<P: AsRef<Path>>(filename: P) -> Result<UnstructuredGridPiece, anyhow::Error> {
    let filename = filename.as_ref();
    let mut vtk_file = Vtk::import(filename)
        .with_context(|| anyhow!("Failed to load VTK file \"{}\"", filename.display()))?;
    vtk_file.load_all_pieces()?;

    let file_path = vtk_file.file_path.as_deref();
    match vtk_file.data {
        DataSet::UnstructuredGrid { pieces, .. } => Ok(pieces
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No pieces in VTK file \"{}\"", filename.display()))?
            .into_loaded_piece_data(file_path)?),
        _ => Err(anyhow!(
            "VTK file \"{}\" does not contain an unstructured grid",
            filename.display()
        )),
    }
}
