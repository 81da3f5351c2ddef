//! JSON shapes exchanged with the inference service and the tool layer.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::data::model::{ForecastRequest, ForecastResult, Quantiles, SeriesHistory, SeriesRecord};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Payload – a JSON document either still encoded or already parsed
// ---------------------------------------------------------------------------

/// Values crossing the tool boundary arrive either as JSON text or as an
/// already-structured value. Text is parsed as strict JSON and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload<T> {
    Structured(T),
    Raw(String),
}

impl<T: DeserializeOwned> Payload<T> {
    pub fn resolve(self) -> Result<T> {
        match self {
            Payload::Structured(value) => Ok(value),
            Payload::Raw(text) => Ok(serde_json::from_str(&text)?),
        }
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub prediction_length: usize,
}

/// `{"inputs": [...], "parameters": {"prediction_length": n}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
    pub inputs: Vec<SeriesRecord>,
    pub parameters: Parameters,
}

impl From<ForecastRequest> for WireRequest {
    fn from(req: ForecastRequest) -> Self {
        Self {
            inputs: req.records,
            parameters: Parameters {
                prediction_length: req.horizon,
            },
        }
    }
}

impl From<WireRequest> for ForecastRequest {
    fn from(wire: WireRequest) -> Self {
        Self {
            records: wire.inputs,
            horizon: wire.parameters.prediction_length,
        }
    }
}

pub fn request_to_json(req: &ForecastRequest) -> Result<String> {
    Ok(serde_json::to_string(&WireRequest::from(req.clone()))?)
}

pub fn request_from_json(text: &str) -> Result<ForecastRequest> {
    let wire: WireRequest = serde_json::from_str(text)?;
    Ok(wire.into())
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePrediction {
    pub item_id: String,
    #[serde(flatten)]
    pub quantiles: Quantiles,
}

/// `{"predictions": [{"item_id": ..., "mean": [...], "0.1": [...], "0.9": [...]}]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireResult {
    pub predictions: Vec<WirePrediction>,
}

impl From<WireResult> for ForecastResult {
    fn from(wire: WireResult) -> Self {
        let mut items = BTreeMap::new();
        for p in wire.predictions {
            if items.insert(p.item_id.clone(), p.quantiles).is_some() {
                log::warn!("duplicate prediction for '{}', keeping the last one", p.item_id);
            }
        }
        ForecastResult { items }
    }
}

pub fn result_from_json(text: &str) -> Result<ForecastResult> {
    let wire: WireResult = serde_json::from_str(text)?;
    Ok(wire.into())
}

// ---------------------------------------------------------------------------
// Prediction bundle – what the reporting step receives
// ---------------------------------------------------------------------------

/// Output of the table analysis step: the records plus the horizon at the
/// top level, `{"inputs": [...], "prediction_length": n}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedInputs {
    pub inputs: Vec<SeriesRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction_length: Option<usize>,
}

/// The inputs half of a bundle: the full request, the analysis output, or
/// just the records. Variants are tried in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BundleInputs {
    Request(WireRequest),
    Analyzed(AnalyzedInputs),
    Records(Vec<SeriesRecord>),
}

impl BundleInputs {
    fn records(&self) -> &[SeriesRecord] {
        match self {
            BundleInputs::Request(req) => &req.inputs,
            BundleInputs::Analyzed(analyzed) => &analyzed.inputs,
            BundleInputs::Records(records) => records,
        }
    }

    /// The horizon the inputs were prepared for, when they carry one.
    pub fn horizon(&self) -> Option<usize> {
        match self {
            BundleInputs::Request(req) => Some(req.parameters.prediction_length),
            BundleInputs::Analyzed(analyzed) => analyzed.prediction_length,
            BundleInputs::Records(_) => None,
        }
    }

    pub fn histories(&self) -> Vec<SeriesHistory> {
        self.records()
            .iter()
            .map(|r| SeriesHistory {
                item_id: r.item_id.clone(),
                target: r.target.clone(),
            })
            .collect()
    }
}

/// `{"inputs": <request, analysis output or records>, "results": <result>}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionBundle {
    pub inputs: BundleInputs,
    pub results: WireResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_request() -> ForecastRequest {
        let mut past = BTreeMap::new();
        past.insert("feature".to_string(), vec![Some(1.0), None]);
        let mut future = BTreeMap::new();
        future.insert("feature".to_string(), vec![3.0, 4.0]);
        ForecastRequest {
            records: vec![
                SeriesRecord {
                    target: vec![10.0, 12.0],
                    item_id: "B".to_string(),
                    past_covariates: Some(past),
                    future_covariates: Some(future),
                },
                SeriesRecord {
                    target: vec![5.5],
                    item_id: "A".to_string(),
                    past_covariates: None,
                    future_covariates: None,
                },
            ],
            horizon: 2,
        }
    }

    #[test]
    fn request_round_trip_preserves_series_order() {
        let req = sample_request();
        let text = request_to_json(&req).unwrap();
        assert_eq!(request_from_json(&text).unwrap(), req);
    }

    #[test]
    fn request_wire_shape() {
        let value: serde_json::Value =
            serde_json::from_str(&request_to_json(&sample_request()).unwrap()).unwrap();
        assert_eq!(value["parameters"], json!({"prediction_length": 2}));
        assert_eq!(value["inputs"][0]["past_covariates"]["feature"], json!([1.0, null]));
        assert_eq!(value["inputs"][1], json!({"target": [5.5], "item_id": "A"}));
    }

    #[test]
    fn result_wire_shape() {
        let result = result_from_json(
            r#"{"predictions": [
                {"item_id": "A", "mean": [1.0, 2.0], "0.1": [0.5, 1.5], "0.9": [1.5, 2.5]}
            ]}"#,
        )
        .unwrap();
        let a = result.get("A").unwrap();
        assert_eq!(a.mean, vec![1.0, 2.0]);
        assert_eq!(a.p90, vec![1.5, 2.5]);
    }

    #[test]
    fn duplicate_predictions_keep_last() {
        let result = result_from_json(
            r#"{"predictions": [
                {"item_id": "A", "mean": [1.0], "0.1": [1.0], "0.9": [1.0]},
                {"item_id": "A", "mean": [2.0], "0.1": [2.0], "0.9": [2.0]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("A").unwrap().mean, vec![2.0]);
    }

    #[test]
    fn payload_accepts_text_or_value() {
        let raw: Payload<WireResult> = Payload::Raw(r#"{"predictions": []}"#.to_string());
        assert!(raw.resolve().unwrap().predictions.is_empty());

        let structured: Payload<WireResult> =
            serde_json::from_value(json!({"predictions": []})).unwrap();
        assert!(matches!(structured, Payload::Structured(_)));

        let encoded: Payload<WireResult> =
            serde_json::from_value(json!("{\"predictions\": []}")).unwrap();
        assert!(matches!(encoded, Payload::Raw(_)));
        assert!(encoded.resolve().is_ok());
    }

    #[test]
    fn payload_rejects_non_json_text() {
        // Python-literal syntax is not JSON and must not be evaluated.
        let raw: Payload<WireResult> = Payload::Raw("{'predictions': []}".to_string());
        assert!(matches!(raw.resolve(), Err(crate::ForecastError::Json(_))));
    }

    #[test]
    fn bundle_accepts_every_input_nesting() {
        let results = json!({"predictions": []});
        let request: PredictionBundle = serde_json::from_value(json!({
            "inputs": {"inputs": [{"target": [1.0], "item_id": "A"}],
                       "parameters": {"prediction_length": 1}},
            "results": results.clone(),
        }))
        .unwrap();
        let analyzed: PredictionBundle = serde_json::from_value(json!({
            "inputs": {"inputs": [{"target": [1.0], "item_id": "A"}],
                       "prediction_length": 3},
            "results": results.clone(),
        }))
        .unwrap();
        let flat: PredictionBundle = serde_json::from_value(json!({
            "inputs": [{"target": [1.0], "item_id": "A"}],
            "results": results,
        }))
        .unwrap();

        assert!(matches!(request.inputs, BundleInputs::Request(_)));
        assert!(matches!(analyzed.inputs, BundleInputs::Analyzed(_)));
        assert_eq!(request.inputs.horizon(), Some(1));
        assert_eq!(analyzed.inputs.horizon(), Some(3));
        assert_eq!(flat.inputs.horizon(), None);
        assert_eq!(analyzed.inputs.histories(), flat.inputs.histories());
        assert_eq!(request.inputs.histories(), flat.inputs.histories());
        assert_eq!(flat.inputs.histories()[0].item_id, "A");
    }

    #[test]
    fn analyzed_inputs_without_length() {
        let inputs: BundleInputs =
            serde_json::from_value(json!({"inputs": [{"target": [2.0], "item_id": "X"}]}))
                .unwrap();
        assert!(matches!(inputs, BundleInputs::Analyzed(_)));
        assert_eq!(inputs.horizon(), None);
    }
}
