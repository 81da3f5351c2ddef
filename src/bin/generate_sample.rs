//! Writes `sample_data.csv`: a few seasonal series with a covariate that
//! extends past the end of each target, plus a matching dummy result
//! document `sample_result.json` so `rusty-forecast run` works offline.

use std::collections::BTreeMap;

use serde_json::json;

/// Seeded Gaussian noise: SplitMix64 uniforms fed to the Marsaglia polar
/// method, which yields values in pairs.
struct Noise {
    state: u64,
    spare: Option<f64>,
}

impl Noise {
    fn seeded(seed: u64) -> Self {
        Noise { state: seed, spare: None }
    }

    fn uniform(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }

    fn sample(&mut self, std_dev: f64) -> f64 {
        if let Some(z) = self.spare.take() {
            return z * std_dev;
        }
        loop {
            let u = 2.0 * self.uniform() - 1.0;
            let v = 2.0 * self.uniform() - 1.0;
            let s = u * u + v * v;
            if s > 0.0 && s < 1.0 {
                let scale = (-2.0 * s.ln() / s).sqrt();
                self.spare = Some(v * scale);
                return u * scale * std_dev;
            }
        }
    }
}

const HISTORY: usize = 36;
const HORIZON: usize = 6;

fn main() -> anyhow::Result<()> {
    let mut noise = Noise::seeded(42);

    // (item_id, level, trend, seasonal amplitude)
    let items = [
        ("store_1", 120.0, 0.8, 15.0),
        ("store_2", 80.0, -0.3, 8.0),
        ("store_3", 200.0, 1.5, 25.0),
    ];

    let mut writer = csv::Writer::from_path("sample_data.csv")?;
    writer.write_record(["item_id", "sales", "promo"])?;

    let mut predictions = Vec::new();
    for &(item, level, trend, amplitude) in &items {
        let season = |t: usize| amplitude * (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin();

        for t in 0..HISTORY + HORIZON {
            let promo = if t % 5 == 0 { 1.0 } else { 0.0 };
            let sales = if t < HISTORY {
                let value = level + trend * t as f64 + season(t) + 10.0 * promo;
                format!("{:.2}", value + noise.sample(3.0))
            } else {
                // Future rows: covariate only.
                String::new()
            };
            writer.write_record([item.to_string(), sales, format!("{promo}")])?;
        }

        let mean: Vec<f64> = (HISTORY..HISTORY + HORIZON)
            .map(|t| level + trend * t as f64 + season(t))
            .collect();
        let mut entry = BTreeMap::new();
        entry.insert("item_id", json!(item));
        entry.insert("0.1", json!(mean.iter().map(|m| m - 8.0).collect::<Vec<_>>()));
        entry.insert("0.9", json!(mean.iter().map(|m| m + 8.0).collect::<Vec<_>>()));
        entry.insert("mean", json!(mean));
        predictions.push(entry);
    }
    writer.flush()?;

    let result = json!({ "predictions": predictions });
    std::fs::write("sample_result.json", serde_json::to_string_pretty(&result)?)?;

    println!(
        "Wrote {} series ({HISTORY} history + {HORIZON} future rows each) to sample_data.csv \
         and a matching result to sample_result.json",
        items.len()
    );
    Ok(())
}
