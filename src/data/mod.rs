/// Data layer: table decoding, series grouping, windowing and request assembly.
///
/// Architecture:
/// ```text
///  base64(csv)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  decode + parse → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  split    │  item_id → row groups
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  window   │  target / past / future covariates per series
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  request  │  records + one horizon → ForecastRequest
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod request;
pub mod split;
pub mod window;
