use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::StringArray;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{json, Map as JsonMap, Value as JsonValue};

const COLUMNS: [&str; 7] = [
    "sentence",
    "language",
    "latitude",
    "longitude",
    "mango",
    "maplibre",
    "maptiler",
];

/// (language, sentence, anchor lat, anchor lon)
const SEEDS: [(&str, &str, f64, f64); 8] = [
    ("German", "Ich esse gern Mangos.", 47.3, 11.4),
    ("English", "The map loads in a second.", 51.5, -0.1),
    ("Spanish", "El mapa tiene muchas capas.", 40.4, -3.7),
    ("Japanese", "地図はとても便利です。", 35.7, 139.7),
    ("Maori", "He pai te mahere nei.", -41.3, 174.8),
    ("Samoan", "Ua manaia le faafanua.", -13.8, -171.8),
    ("Arabic", "الخريطة جميلة جدا.", 30.0, 31.2),
    ("Portuguese", "O mapa mostra frases.", -23.5, -46.6),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn jitter(&mut self, spread: f64) -> f64 {
        (self.next_f64() * 2.0 - 1.0) * spread
    }

    fn flag(&mut self, p_true: f64) -> &'static str {
        if self.next_f64() < p_true {
            "TRUE"
        } else {
            "FALSE"
        }
    }
}

/// Rows of string cells in `COLUMNS` order.
fn generate_rows(per_language: usize, rng: &mut SimpleRng) -> Vec<[String; 7]> {
    let mut rows = Vec::new();
    for (language, sentence, lat, lon) in SEEDS {
        for i in 0..per_language {
            let lat = (lat + rng.jitter(2.0)).clamp(-85.0, 85.0);
            let mut lon = lon + rng.jitter(3.0);
            if lon > 180.0 {
                lon -= 360.0;
            } else if lon < -180.0 {
                lon += 360.0;
            }
            rows.push([
                format!("{sentence} ({})", i + 1),
                language.to_string(),
                format!("{lat:.4}"),
                format!("{lon:.4}"),
                rng.flag(0.4).to_string(),
                rng.flag(0.5).to_string(),
                rng.flag(0.3).to_string(),
            ]);
        }
    }

    // Rows without usable coordinates.
    rows.push([
        "Somewhere, nowhere.".to_string(),
        "English".to_string(),
        "unknown".to_string(),
        "0".to_string(),
        "TRUE".to_string(),
        "FALSE".to_string(),
        "FALSE".to_string(),
    ]);
    rows.push([
        "Sin coordenadas.".to_string(),
        "Spanish".to_string(),
        String::new(),
        String::new(),
        "FALSE".to_string(),
        "TRUE".to_string(),
        "TRUE".to_string(),
    ]);
    rows
}

fn write_json(path: &Path, rows: &[[String; 7]]) -> Result<()> {
    let features: Vec<JsonValue> = rows
        .iter()
        .map(|row| {
            let properties: JsonMap<String, JsonValue> = COLUMNS
                .iter()
                .zip(row)
                .map(|(k, v)| (k.to_string(), json!(v)))
                .collect();
            json!({ "type": "Feature", "properties": properties, "geometry": null })
        })
        .collect();
    let doc = json!({ "type": "FeatureCollection", "features": features });
    std::fs::write(path, serde_json::to_string_pretty(&doc)?).context("writing JSON")
}

fn write_csv(path: &Path, rows: &[[String; 7]]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush().context("flushing CSV")
}

fn write_parquet(path: &Path, rows: &[[String; 7]]) -> Result<()> {
    let schema = Arc::new(Schema::new(
        COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, false))
            .collect::<Vec<_>>(),
    ));
    let columns = (0..COLUMNS.len())
        .map(|c| {
            let values: Vec<&str> = rows.iter().map(|r| r[c].as_str()).collect();
            Arc::new(StringArray::from(values)) as arrow::array::ArrayRef
        })
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_sentences.json".to_string());
    let path = Path::new(&output);

    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(6, &mut rng);

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "json" | "geojson" => write_json(path, &rows)?,
        "csv" => write_csv(path, &rows)?,
        "parquet" | "pq" => write_parquet(path, &rows)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    println!("Wrote {} sentences to {output}", rows.len());
    Ok(())
}
