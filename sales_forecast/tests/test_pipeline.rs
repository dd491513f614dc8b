use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use sales_forecast::data::{DatasetContext, FilterSelection, SalesDataset, TransactionRow};
use sales_forecast::pipeline::{EvaluationResponse, ForecastPipeline, ForecastResponse};
use sales_forecast::{ForecastError, PipelineConfig};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Three years of Furniture/West and Technology/East, ten months of Office Supplies/South
fn create_test_rows() -> Vec<TransactionRow> {
    let mut rows = Vec::new();
    for i in 0..36u32 {
        let year = 2014 + (i / 12) as i32;
        let month = i % 12 + 1;
        let seasonal = [0.6, 0.4, 0.8, 0.7, 0.6, 0.9, 0.8, 0.9, 1.4, 1.0, 1.6, 1.7][(i % 12) as usize];
        let wobble = (i as f64 * 1.3).sin() * 20.0;
        rows.push(TransactionRow::new(
            date(year, month, 5),
            500.0 * seasonal + wobble + 3.0 * i as f64,
            "Furniture",
            "West",
        ));
        rows.push(TransactionRow::new(
            date(year, month, 20),
            150.0 * seasonal + wobble,
            "Furniture",
            "West",
        ));
        rows.push(TransactionRow::new(
            date(year, month, 11),
            900.0 * seasonal - wobble,
            "Technology",
            "East",
        ));
        if i < 10 {
            rows.push(TransactionRow::new(date(year, month, 15), 42.0, "Office Supplies", "South"));
        }
    }
    rows
}

fn loaded_pipeline() -> ForecastPipeline {
    let context = DatasetContext::from_dataset(SalesDataset::from_rows(create_test_rows()));
    ForecastPipeline::new(context, PipelineConfig::default())
}

#[fixture]
fn pipeline() -> ForecastPipeline {
    loaded_pipeline()
}

fn failed_pipeline() -> ForecastPipeline {
    let context = DatasetContext::failed("Error: file not found at: /data/superstore.csv");
    ForecastPipeline::new(context, PipelineConfig::default())
}

#[rstest]
fn test_filters(pipeline: ForecastPipeline) {
    let filters = pipeline.filters().unwrap();

    assert_eq!(
        filters.categories,
        vec!["All Categories", "Furniture", "Office Supplies", "Technology"]
    );
    assert_eq!(filters.regions, vec!["All Regions", "East", "South", "West"]);
}

#[rstest]
fn test_xgboost_forecast_response(pipeline: ForecastPipeline) {
    let selection = FilterSelection::new("Furniture", "West");
    let response = pipeline.forecast("xgboost", &selection, 6).unwrap();

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["model_used"], "xgboost");
    assert_eq!(json["history"]["index"].as_array().unwrap().len(), 36);
    assert_eq!(json["history"]["index"][0], "2014-01-31");
    assert_eq!(json["history"]["data"].as_array().unwrap().len(), 36);

    let forecast = json["forecast"].as_array().unwrap();
    assert_eq!(forecast.len(), 6);
    assert_eq!(forecast[0]["Date"], "2017-01-31");
    assert_eq!(forecast[5]["Date"], "2017-06-30");
    assert!(forecast[0]["Sales Forecast"].is_number());
    assert!(forecast[0]["Lower Bound"].is_null());
    assert!(forecast[0]["Upper Bound"].is_null());
}

#[rstest]
fn test_sarima_forecast_response(pipeline: ForecastPipeline) {
    let selection = FilterSelection::new("Technology", "East");
    let response = pipeline.forecast("sarima", &selection, 12).unwrap();

    match response {
        ForecastResponse::Forecast {
            status,
            model_used,
            history,
            forecast,
        } => {
            assert_eq!(status, "success");
            assert_eq!(model_used.as_str(), "sarima");
            assert_eq!(history.index.last().unwrap(), "2016-12-31");
            assert_eq!(forecast.len(), 12);
            for record in &forecast {
                let lower = record.lower_bound.unwrap();
                let upper = record.upper_bound.unwrap();
                assert!(lower <= record.sales_forecast && record.sales_forecast <= upper);
            }
        }
        other => panic!("Expected forecast, got {:?}", other),
    }
}

#[rstest]
fn test_no_data_is_not_an_error(pipeline: ForecastPipeline) {
    let selection = FilterSelection::new("Furniture", "South");

    let response = pipeline.forecast("sarima", &selection, 12).unwrap();
    assert_eq!(
        response,
        ForecastResponse::NoData {
            status: "error",
            message: "No data found for Furniture/South.".to_string(),
        }
    );

    let response = pipeline.evaluate("xgboost", &selection).unwrap();
    assert_eq!(
        response,
        EvaluationResponse::NoData {
            status: "error",
            message: "No data found for Furniture/South.".to_string(),
        }
    );
}

#[rstest]
fn test_short_history_is_rejected(pipeline: ForecastPipeline) {
    let selection = FilterSelection::new("Office Supplies", "South");

    let result = pipeline.forecast("sarima", &selection, 12);
    match result {
        Err(ForecastError::InsufficientHistory {
            required,
            available,
            ..
        }) => {
            assert_eq!(required, 24);
            assert_eq!(available, 10);
        }
        other => panic!("Expected InsufficientHistory, got {:?}", other),
    }

    assert!(matches!(
        pipeline.forecast("xgboost", &selection, 12),
        Err(ForecastError::InsufficientHistory { .. })
    ));
}

#[rstest]
fn test_zero_steps_is_rejected(pipeline: ForecastPipeline) {
    let result = pipeline.forecast("xgboost", &FilterSelection::default(), 0);
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
}

#[rstest]
#[case("arima")]
#[case("Sarima")]
#[case("lstm")]
#[case("")]
fn test_unknown_strategy_before_data_work(#[case] strategy: &str) {
    // Rejected even when the dataset never loaded
    for pipeline in [loaded_pipeline(), failed_pipeline()] {
        assert!(matches!(
            pipeline.forecast(strategy, &FilterSelection::default(), 12),
            Err(ForecastError::UnknownStrategy(_))
        ));
        assert!(matches!(
            pipeline.evaluate(strategy, &FilterSelection::default()),
            Err(ForecastError::UnknownStrategy(_))
        ));
    }
}

#[test]
fn test_failed_load_is_reported_on_every_request() {
    let pipeline = failed_pipeline();
    let expected = "Data not loaded. Reason: Error: file not found at: /data/superstore.csv";

    assert_eq!(pipeline.status(), "Error: file not found at: /data/superstore.csv");

    let errors = [
        pipeline.filters().unwrap_err(),
        pipeline
            .forecast("sarima", &FilterSelection::default(), 12)
            .unwrap_err(),
        pipeline
            .evaluate("xgboost", &FilterSelection::default())
            .unwrap_err(),
    ];
    for error in errors {
        assert!(matches!(error, ForecastError::UpstreamLoadFailure(_)));
        assert_eq!(error.to_string(), expected);
        assert!(!error.is_client_error());
    }
}

#[rstest]
fn test_evaluate_response(pipeline: ForecastPipeline) {
    let selection = FilterSelection::new("Furniture", "West");
    let response = pipeline.evaluate("xgboost", &selection).unwrap();

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "Success");
    assert_eq!(json["model_used"], "xgboost");
    assert!(json["mape"].as_f64().unwrap() >= 0.0);
    assert!(json["rmse"].as_f64().unwrap() >= 0.0);
}

#[rstest]
fn test_concurrent_requests(pipeline: ForecastPipeline) {
    let selection = FilterSelection::new("Technology", "East");
    let expected = pipeline.forecast("xgboost", &selection, 12).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pipeline = pipeline.clone();
                let selection = selection.clone();
                scope.spawn(move || pipeline.forecast("xgboost", &selection, 12).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
