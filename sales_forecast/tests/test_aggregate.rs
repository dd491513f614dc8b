use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use sales_forecast::aggregate::{aggregate, MonthlySeries};
use sales_forecast::data::{FilterSelection, TransactionRow, ALL_CATEGORIES, ALL_REGIONS};
use sales_forecast::features::{derive_features, FeatureRow, SEASONAL_LAG};
use sales_forecast::ForecastError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn create_test_rows() -> Vec<TransactionRow> {
    vec![
        TransactionRow::new(date(2015, 1, 3), 100.0, "Furniture", "West"),
        TransactionRow::new(date(2015, 1, 28), 40.0, "Technology", "West"),
        TransactionRow::new(date(2015, 2, 14), 60.0, "Furniture", "East"),
        TransactionRow::new(date(2015, 5, 1), 25.0, "Furniture", "West"),
        TransactionRow::new(date(2015, 5, 31), 5.0, "Technology", "East"),
    ]
}

#[test]
fn test_aggregate_all_slices() {
    let rows = create_test_rows();
    let (series, has_data) = aggregate(&rows, &FilterSelection::default());

    assert!(has_data);
    assert_eq!(
        series.dates(),
        &[
            date(2015, 1, 31),
            date(2015, 2, 28),
            date(2015, 3, 31),
            date(2015, 4, 30),
            date(2015, 5, 31)
        ]
    );
    assert_eq!(series.values(), &[140.0, 60.0, 0.0, 0.0, 30.0]);
}

#[test]
fn test_aggregate_single_slice() {
    let rows = create_test_rows();

    let (series, has_data) = aggregate(&rows, &FilterSelection::new("Furniture", "West"));
    assert!(has_data);
    assert_eq!(series.values(), &[100.0, 0.0, 0.0, 0.0, 25.0]);

    let (series, has_data) = aggregate(&rows, &FilterSelection::new("Technology", ALL_REGIONS));
    assert!(has_data);
    assert_eq!(series.values(), &[40.0, 0.0, 0.0, 0.0, 5.0]);

    let (series, has_data) = aggregate(&rows, &FilterSelection::new(ALL_CATEGORIES, "East"));
    assert!(has_data);
    assert_eq!(series.dates()[0], date(2015, 2, 28));
    assert_eq!(series.values(), &[60.0, 0.0, 0.0, 5.0]);
}

#[test]
fn test_aggregate_no_match() {
    let rows = create_test_rows();
    let (series, has_data) = aggregate(&rows, &FilterSelection::new("Office Supplies", "West"));

    assert!(!has_data);
    assert!(series.is_empty());
}

#[test]
fn test_aggregate_total_is_preserved() {
    let rows = create_test_rows();
    let (series, _) = aggregate(&rows, &FilterSelection::default());

    let total: f64 = rows.iter().map(|r| r.sales).sum();
    assert_eq!(series.values().iter().sum::<f64>(), total);
}

#[test]
fn test_history_payload() {
    let series = MonthlySeries::from_values(date(2016, 11, 8), vec![1.0, 2.0, 3.0]);
    let history = series.to_history();

    assert_eq!(history.index, vec!["2016-11-30", "2016-12-31", "2017-01-31"]);
    assert_eq!(history.data, vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_series_slice() {
    let series = MonthlySeries::from_values(date(2015, 1, 1), (0..6).map(|v| v as f64).collect());
    let train = series.slice(0, 4);

    assert_eq!(train.len(), 4);
    assert_eq!(train.last_date(), Some(date(2015, 4, 30)));
    assert_eq!(series.slice(4, 10).values(), &[4.0, 5.0]);
}

#[test]
fn test_derive_features_lag_and_backfill() {
    let values: Vec<f64> = (1..=15).map(|v| v as f64 * 10.0).collect();
    let series = MonthlySeries::from_values(date(2015, 1, 1), values.clone());
    let (features, target) = derive_features(&series).unwrap();

    assert_eq!(features.len(), 15);
    assert_eq!(target, values);

    // No true lag before month 13: back-filled from the first observed lag
    for row in &features[..SEASONAL_LAG] {
        assert_eq!(row.lag_12, 10.0);
    }
    assert_eq!(features[12].lag_12, 10.0);
    assert_eq!(features[13].lag_12, 20.0);
    assert_eq!(features[14].lag_12, 30.0);

    assert_eq!(
        features[14],
        FeatureRow {
            month: 3,
            year: 2016,
            quarter: 1,
            lag_12: 30.0
        }
    );
}

#[test]
fn test_derive_features_requires_thirteen_months() {
    let series = MonthlySeries::from_values(date(2015, 1, 1), vec![1.0; 12]);

    match derive_features(&series) {
        Err(ForecastError::InsufficientHistory {
            required,
            available,
            ..
        }) => {
            assert_eq!(required, 13);
            assert_eq!(available, 12);
        }
        other => panic!("Expected InsufficientHistory, got {:?}", other),
    }
}
