use serde::{Deserialize, Serialize};

use crate::color::ChartPalette;
use crate::error::Result;

/// Identifier given to every row when the table has no `item_id` column.
pub const DEFAULT_SYNTHETIC_ID: &str = "item_a";

// ---------------------------------------------------------------------------
// Horizon policy
// ---------------------------------------------------------------------------

/// How per-series horizons are combined into the request horizon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HorizonPolicy {
    /// All series with future covariates must agree, and every future
    /// covariate of a series must have the same length.
    #[default]
    Strict,
    /// No checks; the last series with future covariates sets the horizon.
    LastWins,
}

// ---------------------------------------------------------------------------
// Renderer configuration
// ---------------------------------------------------------------------------

/// Chart and report presentation settings, passed explicitly per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Title is `"{title_prefix} {item_id}"`.
    pub title_prefix: String,
    pub x_label: String,
    pub y_label: String,
    pub history_label: String,
    pub forecast_label: String,
    pub band_label: String,
    /// Alt text of the Markdown image link in reports.
    pub image_label: String,
    /// Opacity of the p10–p90 band, 0.0..=1.0.
    pub band_opacity: f32,
    pub palette: ChartPalette,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            title_prefix: "Time Series Forecast for".to_string(),
            x_label: "Time".to_string(),
            y_label: "Value".to_string(),
            history_label: "History".to_string(),
            forecast_label: "Forecast Mean".to_string(),
            band_label: "80% Confidence Interval".to_string(),
            image_label: "Sales Forecast".to_string(),
            band_opacity: 0.3,
            palette: ChartPalette::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline configuration
// ---------------------------------------------------------------------------

/// Field delimiter of the ingested table. Only single ASCII characters are
/// accepted, both in code and when a configuration is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub struct Delimiter(u8);

impl Delimiter {
    pub const COMMA: Delimiter = Delimiter(b',');

    pub fn byte(self) -> u8 {
        self.0
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::COMMA
    }
}

impl TryFrom<char> for Delimiter {
    type Error = String;

    fn try_from(c: char) -> std::result::Result<Self, Self::Error> {
        u8::try_from(c)
            .ok()
            .filter(u8::is_ascii)
            .map(Delimiter)
            .ok_or_else(|| format!("delimiter {c:?} is not a single ASCII character"))
    }
}

impl From<Delimiter> for char {
    fn from(d: Delimiter) -> Self {
        char::from(d.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub horizon_policy: HorizonPolicy,
    pub synthetic_id: String,
    pub delimiter: Delimiter,
    pub render: RenderConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            horizon_policy: HorizonPolicy::default(),
            synthetic_id: DEFAULT_SYNTHETIC_ID.to_string(),
            delimiter: Delimiter::COMMA,
            render: RenderConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON configuration document. Absent keys take defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The delimiter as the byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.byte()
    }
}
