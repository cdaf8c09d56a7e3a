//! Tests for result table persistence.

use labelscan::results::{load_results, save_results};
use labelscan::{LabelScanError, ResultRow, build_histogram};

#[test]
fn saved_rows_load_back_with_commas_intact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("images_results.csv");
    let rows = vec![
        ResultRow::new("cat.jpg", "cat,cat,dog"),
        ResultRow::new("x.jpg", ""),
        ResultRow::new("quote\"d.png", "poster,\"film\" noir"),
    ];

    save_results(&rows, &path).unwrap();
    let loaded = load_results(&path).unwrap();

    assert_eq!(loaded, rows);
}

#[test]
fn histogram_over_reloaded_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");

    save_results(&[ResultRow::new("cat.jpg", "cat,cat,dog")], &path).unwrap();
    let histogram = build_histogram(&load_results(&path).unwrap());

    assert_eq!(histogram.get("cat"), Some(2));
    assert_eq!(histogram.get("dog"), Some(1));
    assert_eq!(histogram.len(), 2);
}

#[test]
fn saving_no_rows_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");

    let result = save_results(&[], &path);

    assert!(matches!(result, Err(LabelScanError::InvalidInput(_))));
    assert!(!path.exists());
}

#[test]
fn loading_missing_file_is_io_error() {
    let result = load_results(std::path::Path::new("/nonexistent/results.csv"));
    assert!(matches!(result, Err(LabelScanError::Io { .. })));
}

#[test]
fn loading_empty_path_is_invalid_input() {
    let result = load_results(std::path::Path::new(""));
    assert!(matches!(result, Err(LabelScanError::InvalidInput(_))));
}

#[test]
fn empty_file_loads_no_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    std::fs::write(&path, "").unwrap();

    assert!(load_results(&path).unwrap().is_empty());
}
