use chrono::NaiveDate;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use sales_forecast::data::{DatasetContext, SalesDataset};
use sales_forecast::ForecastError;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_dataset_from_csv() {
    let file = write_csv(&[
        "Row ID,Order Date,Ship Mode,Category,Sub-Category,Region,Sales",
        "1,11/08/2016,Second Class,Furniture,Bookcases,South,261.96",
        "2,11/08/2016,Second Class,Furniture,Chairs,South,731.94",
        "3,06/12/2016,Second Class,Office Supplies,Labels,West,14.62",
        "4,10/11/2015,Standard Class,Technology,Phones,East,957",
    ]);

    let dataset = SalesDataset::from_csv(file.path()).unwrap();

    assert_eq!(dataset.len(), 4);
    let first = &dataset.rows()[0];
    assert_eq!(first.order_date, NaiveDate::from_ymd_opt(2016, 11, 8).unwrap());
    assert_eq!(first.category, "Furniture");
    assert_eq!(first.region, "South");
    assert_eq!(first.sales, 261.96);
    assert_eq!(dataset.rows()[3].sales, 957.0);

    let filters = dataset.filter_options();
    assert_eq!(
        filters.categories,
        vec!["All Categories", "Furniture", "Office Supplies", "Technology"]
    );
    assert_eq!(filters.regions, vec!["All Regions", "East", "South", "West"]);
}

#[test]
fn test_dataset_from_dataframe_skips_incomplete_rows() {
    let df = df!(
        "Order-Date" => &["2015-01-03", "2015-02-10", "2015-02-11"],
        "Sales" => &[Some(10.0), None, Some(5.0)],
        "Category" => &["Furniture", "Furniture", "Technology"],
        "Region" => &["West", "West", "East"]
    )
    .unwrap();

    let dataset = SalesDataset::from_dataframe(&df).unwrap();

    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.rows()[1].category, "Technology");
}

#[test]
fn test_dataset_missing_column() {
    let df = df!(
        "Order Date" => &["2015-01-03"],
        "Category" => &["Furniture"],
        "Region" => &["West"]
    )
    .unwrap();

    match SalesDataset::from_dataframe(&df) {
        Err(ForecastError::DataError(msg)) => assert!(msg.contains("Sales")),
        other => panic!("Expected DataError, got {:?}", other),
    }
}

#[test]
fn test_context_load_success() {
    let file = write_csv(&[
        "Order Date,Category,Region,Sales",
        "2015-01-03,Furniture,West,10.5",
        "2015-02-03,Furniture,West,20.5",
    ]);

    let context = DatasetContext::load(file.path());

    assert_eq!(context.status(), "Success");
    assert_eq!(context.dataset().unwrap().len(), 2);
}

#[test]
fn test_context_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("superstore.csv");

    let context = DatasetContext::load(&path);

    assert_eq!(
        context.status(),
        format!("Error: file not found at: {}", path.display())
    );
    assert!(matches!(
        context.dataset(),
        Err(ForecastError::UpstreamLoadFailure(_))
    ));
}

#[test]
fn test_context_load_bad_schema() {
    let file = write_csv(&[
        "Order Date,Category,Region,Profit",
        "2015-01-03,Furniture,West,10.5",
    ]);

    let context = DatasetContext::load(file.path());

    assert!(context.status().starts_with("Error loading data:"));
    assert!(context.dataset().is_err());
}

#[test]
fn test_context_load_bad_date() {
    let file = write_csv(&[
        "Order Date,Category,Region,Sales",
        "someday,Furniture,West,10.5",
    ]);

    let context = DatasetContext::load(file.path());

    assert!(context.status().starts_with("Error loading data:"));
    assert!(context.status().contains("someday"));
}
