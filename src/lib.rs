//! Reshapes a tabular dataset into per-series forecast requests, and turns
//! forecast results back into per-series charts and text reports.
//!
//! ```text
//!  base64(csv) ─► data ─► ForecastRequest ─► InferenceClient
//!                                                  │
//!  SeriesReport ◄─ summary ◄─ plot ◄─ reconcile ◄──┘
//! ```
//!
//! The inference service, the chart rasteriser and the artifact store are
//! reached through the traits in [`collab`].

pub mod collab;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod plot;
pub mod reconcile;
pub mod summary;
pub mod wire;

pub use collab::{ArtifactStore, ChartRenderer, DirectoryStore, InferenceClient, MemoryStore};
pub use config::{Delimiter, HorizonPolicy, PipelineConfig, RenderConfig};
pub use data::model::{ForecastRequest, ForecastResult, Quantiles, SeriesRecord, SeriesReport};
pub use error::{ForecastError, Result};
pub use plot::PngRenderer;
