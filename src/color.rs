use palette::{Hsl, IntoColor, Srgb};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Rgb – a serialisable 8-bit colour
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([255, 255, 255]);
    pub const BLACK: Rgb = Rgb([0, 0, 0]);

    /// Build a colour from hue (degrees), saturation and lightness.
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let hsl = Hsl::new(hue, saturation, lightness);
        let rgb: Srgb = hsl.into_color();
        Rgb([
            (rgb.red * 255.0).round() as u8,
            (rgb.green * 255.0).round() as u8,
            (rgb.blue * 255.0).round() as u8,
        ])
    }

    /// Alpha-composite `self` over `base`.
    pub fn over(self, base: Rgb, alpha: f32) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        let mut out = [0u8; 3];
        for (i, slot) in out.iter_mut().enumerate() {
            let v = self.0[i] as f32 * a + base.0[i] as f32 * (1.0 - a);
            *slot = v.round() as u8;
        }
        Rgb(out)
    }
}

// ---------------------------------------------------------------------------
// Chart palette
// ---------------------------------------------------------------------------

/// Colours of the chart elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartPalette {
    pub history: Rgb,
    pub forecast: Rgb,
    pub band: Rgb,
    pub grid: Rgb,
    pub axis: Rgb,
    pub background: Rgb,
}

impl Default for ChartPalette {
    fn default() -> Self {
        let forecast = Rgb::from_hsl(0.0, 0.75, 0.5);
        Self {
            history: Rgb::from_hsl(220.0, 0.75, 0.45),
            forecast,
            band: forecast,
            grid: Rgb([225, 225, 225]),
            axis: Rgb([90, 90, 90]),
            background: Rgb::WHITE,
        }
    }
}
