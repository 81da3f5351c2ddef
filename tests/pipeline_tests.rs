use std::cell::Cell;

use rusty_forecast::data::loader::encode_table;
use rusty_forecast::pipeline::{self, prepare};
use rusty_forecast::plot::ChartSpec;
use rusty_forecast::wire::{self, Payload};
use rusty_forecast::{
    ArtifactStore, ChartRenderer, ForecastError, ForecastRequest, ForecastResult, HorizonPolicy,
    InferenceClient, MemoryStore, PipelineConfig, PngRenderer, Quantiles, RenderConfig, Result,
};

/// Forecasts a flat continuation of each series' last value.
struct NaiveClient {
    skip: Option<&'static str>,
    calls: Cell<usize>,
}

impl NaiveClient {
    fn new() -> Self {
        Self {
            skip: None,
            calls: Cell::new(0),
        }
    }

    fn skipping(item_id: &'static str) -> Self {
        Self {
            skip: Some(item_id),
            calls: Cell::new(0),
        }
    }
}

impl InferenceClient for NaiveClient {
    fn invoke(&self, request: &ForecastRequest) -> Result<ForecastResult> {
        self.calls.set(self.calls.get() + 1);
        let mut result = ForecastResult::default();
        for record in &request.records {
            if Some(record.item_id.as_str()) == self.skip {
                continue;
            }
            let last = *record.target.last().unwrap();
            result.items.insert(
                record.item_id.clone(),
                Quantiles {
                    mean: vec![last; request.horizon],
                    p10: vec![last - 1.0; request.horizon],
                    p90: vec![last + 1.0; request.horizon],
                },
            );
        }
        Ok(result)
    }
}

struct FailingClient;

impl InferenceClient for FailingClient {
    fn invoke(&self, _request: &ForecastRequest) -> Result<ForecastResult> {
        Err(ForecastError::Inference("endpoint unavailable".to_string()))
    }
}

struct FailingStore;

impl ArtifactStore for FailingStore {
    fn store(&self, _image: &[u8]) -> Result<String> {
        Err(ForecastError::Store("bucket not found".to_string()))
    }
}

/// Records chart titles instead of drawing.
#[derive(Default)]
struct RecordingRenderer {
    titles: std::cell::RefCell<Vec<String>>,
}

impl ChartRenderer for RecordingRenderer {
    fn render(&self, chart: &ChartSpec, _config: &RenderConfig) -> Result<Vec<u8>> {
        self.titles.borrow_mut().push(chart.title.clone());
        Ok(chart.title.as_bytes().to_vec())
    }
}

const TWO_SERIES: &str = "\
item_id,sales,promo
A,10,0
A,12,1
A,11,0
A,,1
A,,0
B,5,1
B,6,0
B,,1
B,,1
";

fn small_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.render.width = 200;
    config.render.height = 150;
    config
}

#[test]
fn end_to_end_reports_in_series_order() {
    let client = NaiveClient::new();
    let store = MemoryStore::new();
    let reports = pipeline::run(
        &encode_table(TWO_SERIES),
        &small_config(),
        &client,
        &PngRenderer,
        &store,
    )
    .unwrap();

    assert_eq!(client.calls.get(), 1);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].item_id, "A");
    assert_eq!(reports[1].item_id, "B");

    let a = &reports[0];
    assert_eq!(a.history_mean, 11.0);
    assert_eq!(a.history_stddev, 0.82);
    assert_eq!(a.last_value, 11.0);
    assert_eq!(a.forecast_mean, vec![11.0, 11.0]);
    assert_eq!(a.image_ref, "memory://0");
    assert!(a.text.contains("![Sales Forecast](memory://0)"));
    assert_eq!(reports[1].image_ref, "memory://1");

    let images = store.images();
    assert_eq!(images.len(), 2);
    assert!(images.iter().all(|img| img.starts_with(b"\x89PNG")));
}

#[test]
fn prepared_request_matches_wire_contract() {
    let batch = prepare(&encode_table(TWO_SERIES), &PipelineConfig::default()).unwrap();
    assert_eq!(batch.request.horizon, 2);

    let value: serde_json::Value =
        serde_json::from_str(&wire::request_to_json(&batch.request).unwrap()).unwrap();
    assert_eq!(value["parameters"]["prediction_length"], 2);
    assert_eq!(value["inputs"][0]["item_id"], "A");
    assert_eq!(value["inputs"][0]["target"], serde_json::json!([10.0, 12.0, 11.0]));
    assert_eq!(
        value["inputs"][0]["past_covariates"]["promo"],
        serde_json::json!([0.0, 1.0, 0.0])
    );
    assert_eq!(
        value["inputs"][0]["future_covariates"]["promo"],
        serde_json::json!([1.0, 0.0])
    );

    let back = wire::request_from_json(&wire::request_to_json(&batch.request).unwrap()).unwrap();
    assert_eq!(back, batch.request);
}

#[test]
fn record_invariants_hold() {
    let csv = "item_id,y,a,b\nA,1,1,1\nA,2,,2\nA,,3,3\nB,4,4,\nB,,5,5\nB,,6,6\n";
    let batch = prepare(&encode_table(csv), &PipelineConfig::default());
    // B's future window has two values per column but A's has one.
    match batch {
        Err(ForecastError::InconsistentHorizon {
            item_id,
            expected,
            found,
        }) => assert_eq!((item_id.as_str(), expected, found), ("B", 1, 2)),
        other => panic!("unexpected: {other:?}"),
    }

    let config = PipelineConfig {
        horizon_policy: HorizonPolicy::LastWins,
        ..Default::default()
    };
    let batch = prepare(&encode_table(csv), &config).unwrap();
    assert_eq!(batch.request.horizon, 2);
    for record in &batch.request.records {
        for values in record.past_covariates.as_ref().unwrap().values() {
            assert_eq!(values.len(), record.target.len());
        }
    }
}

#[test]
fn item_id_scenario_with_partial_covariate() {
    // Only rows 0-2 carry `feature`: neither series has a future window.
    let csv = "item_id,value,feature\nA,1,10\nA,2,11\nA,3,12\nB,4,\nB,5,\n";
    let err = prepare(&encode_table(csv), &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, ForecastError::MissingHorizon));

    // With extra covariate-only rows for A, A alone sets the horizon.
    let csv = "item_id,value,feature\nA,1,10\nA,2,11\nA,3,12\nB,4,\nB,5,\nA,,13\n";
    let batch = prepare(&encode_table(csv), &PipelineConfig::default()).unwrap();
    let (a, b) = (&batch.request.records[0], &batch.request.records[1]);
    assert_eq!(a.target.len(), 3);
    assert_eq!(b.target.len(), 2);
    assert_eq!(a.future_covariates.as_ref().unwrap()["feature"], vec![13.0]);
    assert!(b.future_covariates.is_none());
    assert_eq!(batch.request.horizon, 1);
}

#[test]
fn single_synthetic_series_without_item_id() {
    let csv = "sales,promo\n1,0\n2,1\n3,0\n,1\n";
    let batch = prepare(&encode_table(csv), &PipelineConfig::default()).unwrap();
    assert_eq!(batch.histories.len(), 1);
    assert_eq!(batch.histories[0].item_id, "item_a");
    assert_eq!(batch.histories[0].target, vec![1.0, 2.0, 3.0]);
}

#[test]
fn ingestion_errors_abort_before_dispatch() {
    let client = NaiveClient::new();
    let store = MemoryStore::new();
    let config = PipelineConfig::default();

    let err = pipeline::run("%%%", &config, &client, &PngRenderer, &store).unwrap_err();
    assert!(matches!(err, ForecastError::Decode(_)));

    let err = pipeline::run(&encode_table("name\nx\n"), &config, &client, &PngRenderer, &store)
        .unwrap_err();
    assert!(matches!(err, ForecastError::NoNumericColumn));

    assert_eq!(client.calls.get(), 0);
    assert!(store.images().is_empty());
}

#[test]
fn missing_result_aborts_whole_batch() {
    let client = NaiveClient::skipping("B");
    let renderer = RecordingRenderer::default();
    let store = MemoryStore::new();

    let err = pipeline::run(&encode_table(TWO_SERIES), &small_config(), &client, &renderer, &store)
        .unwrap_err();
    match err {
        ForecastError::MissingItem { item_id } => assert_eq!(item_id, "B"),
        other => panic!("unexpected: {other:?}"),
    }
    // Nothing was drawn or stored for A either.
    assert!(renderer.titles.borrow().is_empty());
    assert!(store.images().is_empty());
}

#[test]
fn collaborator_errors_pass_through() {
    let config = small_config();
    let encoded = encode_table(TWO_SERIES);

    let err = pipeline::run(&encoded, &config, &FailingClient, &PngRenderer, &MemoryStore::new())
        .unwrap_err();
    assert_eq!(err.to_string(), "inference failed: endpoint unavailable");

    let err = pipeline::run(&encoded, &config, &NaiveClient::new(), &PngRenderer, &FailingStore)
        .unwrap_err();
    assert!(matches!(err, ForecastError::Store(ref msg) if msg == "bucket not found"));
}

#[test]
fn report_bundle_from_json_text() {
    let bundle = r#"{
        "inputs": {"inputs": [{"target": [10, 12, 11], "item_id": "A"}],
                   "parameters": {"prediction_length": 2}},
        "results": {"predictions": [
            {"item_id": "A", "mean": [12.345, 13.678], "0.1": [11, 12], "0.9": [14, 15]}
        ]}
    }"#;
    let renderer = RecordingRenderer::default();
    let store = MemoryStore::new();

    let reports = pipeline::report_bundle(
        Payload::Raw(bundle.to_string()),
        &renderer,
        &store,
        &RenderConfig::default(),
    )
    .unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].forecast_mean, vec![12.35, 13.68]);
    assert!(reports[0].text.contains("- Last value: 11\n"));
    assert!(reports[0].text.contains("[12.35, 13.68]"));
    assert_eq!(
        renderer.titles.borrow().as_slice(),
        ["Time Series Forecast for A".to_string()]
    );
}

#[test]
fn report_bundle_from_analysis_output() {
    // The analysis step's own shape: records plus a top-level prediction_length.
    let bundle = serde_json::json!({
        "inputs": {"inputs": [{"target": [10, 12, 11], "item_id": "A"},
                              {"target": [5, 6], "item_id": "B"}],
                   "prediction_length": 2},
        "results": {"predictions": [
            {"item_id": "B", "mean": [6, 6], "0.1": [5, 5], "0.9": [7, 7]},
            {"item_id": "A", "mean": [11, 11], "0.1": [10, 10], "0.9": [12, 12]}
        ]}
    });
    let renderer = RecordingRenderer::default();

    let reports = pipeline::report_bundle(
        Payload::Raw(bundle.to_string()),
        &renderer,
        &MemoryStore::new(),
        &RenderConfig::default(),
    )
    .unwrap();

    let ids: Vec<_> = reports.iter().map(|r| r.item_id.as_str()).collect();
    assert_eq!(ids, ["A", "B"]);
    assert_eq!(reports[1].forecast_mean, vec![6.0, 6.0]);
    assert_eq!(renderer.titles.borrow().len(), 2);
}

#[test]
fn predict_from_request_payload() {
    let batch = prepare(&encode_table(TWO_SERIES), &PipelineConfig::default()).unwrap();
    let text = wire::request_to_json(&batch.request).unwrap();
    let client = NaiveClient::new();

    let from_text = pipeline::predict_payload(&client, Payload::Raw(text)).unwrap();
    let structured = Payload::Structured(wire::WireRequest::from(batch.request.clone()));
    let from_value = pipeline::predict_payload(&client, structured).unwrap();

    assert_eq!(client.calls.get(), 2);
    assert_eq!(from_text, from_value);
    assert_eq!(from_text.get("A").unwrap().mean, vec![11.0, 11.0]);

    let err = pipeline::predict_payload(&client, Payload::Raw("{'inputs': []}".to_string()))
        .unwrap_err();
    assert!(matches!(err, ForecastError::Json(_)));
    assert_eq!(client.calls.get(), 2);
}

#[test]
fn report_from_result_payload() {
    let batch = prepare(&encode_table(TWO_SERIES), &PipelineConfig::default()).unwrap();
    let result = r#"{"predictions": [
        {"item_id": "A", "mean": [0.125, 2.675], "0.1": [0, 2], "0.9": [1, 3]},
        {"item_id": "B", "mean": [6, 6], "0.1": [5, 5], "0.9": [7, 7]}
    ]}"#;
    let store = MemoryStore::new();

    let reports = pipeline::report_payload(
        &batch.histories,
        Payload::Raw(result.to_string()),
        Some(batch.request.horizon),
        &RecordingRenderer::default(),
        &store,
        &RenderConfig::default(),
    )
    .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].forecast_mean, vec![0.12, 2.67]);
    assert_eq!(store.images().len(), 2);

    let partial: wire::WireResult = serde_json::from_str(
        r#"{"predictions": [{"item_id": "A", "mean": [1], "0.1": [0], "0.9": [2]}]}"#,
    )
    .unwrap();
    let err = pipeline::report_payload(
        &batch.histories,
        Payload::Structured(partial),
        None,
        &RecordingRenderer::default(),
        &store,
        &RenderConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ForecastError::MissingItem { ref item_id } if item_id == "B"));
    assert_eq!(store.images().len(), 2);
}

#[test]
fn report_is_deterministic() {
    let run = || {
        pipeline::run(
            &encode_table(TWO_SERIES),
            &small_config(),
            &NaiveClient::new(),
            &RecordingRenderer::default(),
            &MemoryStore::new(),
        )
        .unwrap()
    };
    assert_eq!(run(), run());
}
