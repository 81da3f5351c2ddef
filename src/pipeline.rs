use crate::collab::{ArtifactStore, ChartRenderer, InferenceClient};
use crate::config::{PipelineConfig, RenderConfig};
use crate::data::loader::decode_table;
use crate::data::model::{ForecastRequest, ForecastResult, SeriesHistory, SeriesReport};
use crate::data::request::build_request;
use crate::data::split::{series_ids, split_series};
use crate::data::window::{window_series, ColumnRoles};
use crate::error::{ForecastError, Result};
use crate::plot::build_chart;
use crate::reconcile::reconcile;
use crate::summary::{format_report, round2, summarize};
use crate::wire::{Payload, PredictionBundle, WireRequest, WireResult};

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// A request ready for dispatch, plus the histories needed to read its
/// result back.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedBatch {
    pub request: ForecastRequest,
    pub histories: Vec<SeriesHistory>,
}

/// Decode, split, window and assemble. Any failure aborts before a request
/// exists.
pub fn prepare(encoded: &str, config: &PipelineConfig) -> Result<PreparedBatch> {
    let table = decode_table(encoded, config.delimiter_byte())?;
    let roles = ColumnRoles::detect(&table)?;
    let ids = series_ids(&table, &config.synthetic_id)?;

    let numeric: Vec<&str> = std::iter::once(roles.target)
        .chain(roles.covariates.iter().copied())
        .map(|c| table.columns[c].name.as_str())
        .collect();
    log::info!(
        "decoded {} rows; numeric columns {:?}, target '{}', series {:?}",
        table.len(),
        numeric,
        table.columns[roles.target].name,
        ids
    );

    let windows = split_series(&table, &ids)?
        .iter()
        .map(|group| window_series(&table, &roles, group, config.horizon_policy))
        .collect::<Result<Vec<_>>>()?;

    let request = build_request(windows, config.horizon_policy)?;
    log::info!(
        "built request for {} series, horizon {}",
        request.records.len(),
        request.horizon
    );

    Ok(PreparedBatch {
        histories: request.histories(),
        request,
    })
}

/// Send the prepared request. Client errors pass through unchanged.
pub fn predict(client: &dyn InferenceClient, batch: &PreparedBatch) -> Result<ForecastResult> {
    client.invoke(&batch.request)
}

/// [`predict`] for a request handed over by the tool layer, either as JSON
/// text or as an already-parsed value.
pub fn predict_payload(
    client: &dyn InferenceClient,
    request: Payload<WireRequest>,
) -> Result<ForecastResult> {
    let request = ForecastRequest::from(request.resolve()?);
    log::info!(
        "dispatching {} series, horizon {}",
        request.records.len(),
        request.horizon
    );
    client.invoke(&request)
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// Reconcile, chart, store and summarise every series, in input order.
///
/// Every series is matched before anything is rendered, so a missing result
/// produces no images and no reports.
pub fn report(
    histories: &[SeriesHistory],
    result: &ForecastResult,
    horizon: Option<usize>,
    renderer: &dyn ChartRenderer,
    store: &dyn ArtifactStore,
    config: &RenderConfig,
) -> Result<Vec<SeriesReport>> {
    let reconciled = reconcile(histories, result, horizon)?;

    reconciled
        .iter()
        .map(|series| -> Result<SeriesReport> {
            let summary = summarize(&series.history, &series.forecast.mean).ok_or_else(|| {
                ForecastError::EmptyHistory {
                    item_id: series.item_id.clone(),
                }
            })?;

            let chart = build_chart(series, config);
            let image = renderer.render(&chart, config)?;
            let image_ref = store.store(&image)?;
            let text = format_report(&series.item_id, &summary, &image_ref, config);

            Ok(SeriesReport {
                item_id: series.item_id.clone(),
                history_mean: round2(summary.history_mean),
                history_stddev: round2(summary.history_stddev),
                last_value: summary.last_value,
                forecast_mean: summary.forecast_mean,
                image_ref,
                text,
            })
        })
        .collect()
}

/// [`report`] for a result document that arrives as JSON text or as an
/// already-parsed value.
pub fn report_payload(
    histories: &[SeriesHistory],
    result: Payload<WireResult>,
    horizon: Option<usize>,
    renderer: &dyn ChartRenderer,
    store: &dyn ArtifactStore,
    config: &RenderConfig,
) -> Result<Vec<SeriesReport>> {
    let result = ForecastResult::from(result.resolve()?);
    report(histories, &result, horizon, renderer, store, config)
}

/// [`report`] for a bundle handed over by the tool layer, either as JSON
/// text or as an already-parsed value.
pub fn report_bundle(
    bundle: Payload<PredictionBundle>,
    renderer: &dyn ChartRenderer,
    store: &dyn ArtifactStore,
    config: &RenderConfig,
) -> Result<Vec<SeriesReport>> {
    let bundle = bundle.resolve()?;
    let histories = bundle.inputs.histories();
    report_payload(
        &histories,
        Payload::Structured(bundle.results),
        bundle.inputs.horizon(),
        renderer,
        store,
        config,
    )
}

/// Full round trip: ingest, predict, report.
pub fn run(
    encoded: &str,
    config: &PipelineConfig,
    client: &dyn InferenceClient,
    renderer: &dyn ChartRenderer,
    store: &dyn ArtifactStore,
) -> Result<Vec<SeriesReport>> {
    let batch = prepare(encoded, config)?;
    let result = predict(client, &batch)?;
    report(
        &batch.histories,
        &result,
        Some(batch.request.horizon),
        renderer,
        store,
        &config.render,
    )
}
