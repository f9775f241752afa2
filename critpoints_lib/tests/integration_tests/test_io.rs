use std::path::PathBuf;

use critpoints_lib::io::{json_format, raw_format, text_format, vtk_format};
use critpoints_lib::vtkio::IOBuffer;
use critpoints_lib::{
    CriticalPoint, CriticalPointType, DistanceRecord, FeatureSet, GridDims, ScalarField,
};
use nalgebra::Vector3;

fn out_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join("critpoints_lib_io_tests")
        .join(name)
}

fn test_features() -> FeatureSet<f64> {
    FeatureSet::from_points(vec![
        CriticalPoint {
            position: Vector3::new(4.3, 5.6, 6.2),
            value: 2.4999999999999996,
            kind: CriticalPointType::Maximum,
        },
        CriticalPoint {
            position: Vector3::new(1.0 / 3.0, 7.0, 1e-7),
            value: -0.125,
            kind: CriticalPointType::Saddle,
        },
    ])
}

fn test_field() -> ScalarField<f64> {
    let dims = GridDims::new(3, 4, 5).unwrap();
    ScalarField::from_fn(dims, |[i, j, k]| i as f64 * 0.5 - j as f64 + (k * k) as f64 / 3.0)
}

#[test]
fn raw_field_roundtrip() {
    let field = test_field();
    let path = out_path("field.raw");
    raw_format::field_to_raw(&field, &path).unwrap();

    let read = raw_format::field_from_raw::<f64, _>(&path, *field.dims()).unwrap();
    assert_eq!(read.data(), field.data());

    // Wrong dimensions are detected from the file size
    let wrong_dims = GridDims::new(3, 4, 4).unwrap();
    assert!(raw_format::field_from_raw::<f64, _>(&path, wrong_dims).is_err());
}

#[test]
fn json_field_roundtrip() {
    let field = test_field();
    let path = out_path("field.json");
    json_format::field_to_json(&field, &path).unwrap();

    let read = json_format::field_from_json::<f32, _>(&path).unwrap();
    assert_eq!(read.dims(), field.dims());
    for (a, b) in read.data().iter().zip(field.data()) {
        assert!((*a as f64 - b).abs() < 1e-6);
    }

    let content = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["shape"], serde_json::json!([5, 4, 3]));
}

#[test]
fn txt_features_roundtrip() {
    let features = test_features();
    let path = out_path("features.txt");
    text_format::features_to_txt(&features, &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert_eq!(content.lines().next(), Some("4.3 5.6 6.2 2.4999999999999996"));

    let read = text_format::features_from_txt::<f64, _>(&path, CriticalPointType::Maximum).unwrap();
    assert_eq!(read.to_rows(), features.to_rows());
    assert!(read.iter().all(|p| p.kind == CriticalPointType::Maximum));
}

#[test]
fn csv_features_roundtrip() {
    let features = test_features();
    let path = out_path("features.csv");
    text_format::features_to_csv(&features, &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().next(), Some(text_format::FEATURES_CSV_HEADER));

    let read = text_format::features_from_csv::<f64, _>(&path).unwrap();
    assert_eq!(read, features);
}

#[test]
fn malformed_text_is_rejected() {
    let path = out_path("malformed.txt");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "1 2 3\n").unwrap();
    assert!(text_format::features_from_txt::<f64, _>(&path, CriticalPointType::Maximum).is_err());

    let path = out_path("malformed.csv");
    std::fs::write(&path, "x,y,z,value,type\n1,2,3,4,peak\n").unwrap();
    assert!(text_format::features_from_csv::<f64, _>(&path).is_err());
}

#[test]
fn report_csv_and_json() {
    let records = vec![
        DistanceRecord::new(0, &test_features(), &test_features()),
        DistanceRecord::new(1, &test_features(), &FeatureSet::default()),
    ];

    let csv_path = out_path("report.csv");
    text_format::report_to_csv(&records, &csv_path).unwrap();
    let content = std::fs::read_to_string(&csv_path).unwrap();
    let lines = content.lines().collect::<Vec<_>>();
    assert_eq!(
        lines,
        vec![text_format::REPORT_CSV_HEADER, "0,2,2,0,0", "1,2,0,2,2"]
    );

    let json_path = out_path("report.json");
    json_format::report_to_json(&records, &json_path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json[1]["difference"], 2);
    assert_eq!(json[1]["normalized"], 2.0);
}

#[test]
fn features_to_json_file() {
    let path = out_path("features.json");
    json_format::features_to_json(&test_features(), &path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["count"], 2);
    assert_eq!(json["points"][1]["type"], "saddle");
}

#[test]
fn vtk_point_cloud() {
    let features = test_features();
    let path = out_path("features.vtk");
    vtk_format::features_to_vtk(&features, &path).unwrap();

    let piece = vtk_format::read_vtk_piece(&path).unwrap();
    assert_eq!(piece.num_points(), 2);
    match &piece.points {
        IOBuffer::F64(coords) => assert_eq!(coords[0..3], [4.3, 5.6, 6.2]),
        other => panic!("unexpected point buffer {:?}", other),
    }
}
