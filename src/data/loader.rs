use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::filter::TRUTHY_MARKER;
use super::model::PointRecord;

const FALSY_MARKER: &str = "FALSE";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load point records from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json` / `.geojson` – a GeoJSON FeatureCollection (records are the
///   features' `properties`), a single Feature, or a bare array of objects
/// * `.csv`               – header row, one record per row
/// * `.parquet`           – one record per row, every column read as text
pub fn load_file(path: &Path) -> Result<Vec<PointRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "json" | "geojson" => load_json(path),
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Vec<PointRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    records_from_json(&root)
}

/// Extract records from an already-parsed JSON document.
///
/// ```json
/// { "type": "FeatureCollection",
///   "features": [ { "type": "Feature",
///                   "properties": { "latitude": "47.3", "longitude": "11.4", ... },
///                   "geometry": null } ] }
/// ```
///
/// A FeatureCollection without `features` yields no records.
pub fn records_from_json(root: &JsonValue) -> Result<Vec<PointRecord>> {
    match root {
        JsonValue::Object(obj) if is_feature(obj) => Ok(vec![feature_record(obj, 0)?]),
        JsonValue::Object(obj) => {
            let Some(features) = obj.get("features") else {
                return Ok(Vec::new());
            };
            let features = features
                .as_array()
                .context("'features' is not a JSON array")?;
            features
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let obj = f
                        .as_object()
                        .with_context(|| format!("Feature {i} is not a JSON object"))?;
                    feature_record(obj, i)
                })
                .collect()
        }
        JsonValue::Array(rows) => rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let obj = row
                    .as_object()
                    .with_context(|| format!("Row {i} is not a JSON object"))?;
                if is_feature(obj) {
                    feature_record(obj, i)
                } else {
                    Ok(object_record(obj))
                }
            })
            .collect(),
        _ => bail!("Expected a FeatureCollection object or a top-level JSON array"),
    }
}

fn is_feature(obj: &JsonMap<String, JsonValue>) -> bool {
    obj.get("type").and_then(JsonValue::as_str) == Some("Feature")
}

fn feature_record(obj: &JsonMap<String, JsonValue>, i: usize) -> Result<PointRecord> {
    match obj.get("properties") {
        Some(JsonValue::Object(props)) => Ok(object_record(props)),
        None | Some(JsonValue::Null) => Ok(PointRecord::default()),
        Some(_) => bail!("Feature {i}: 'properties' is not a JSON object"),
    }
}

fn object_record(obj: &JsonMap<String, JsonValue>) -> PointRecord {
    obj.iter()
        .filter_map(|(key, val)| json_to_text(val).map(|text| (key.clone(), text)))
        .collect()
}

/// Stringify a scalar. `null` drops the key; booleans use the flag markers.
fn json_to_text(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(bool_marker(*b).to_string()),
        JsonValue::Null => None,
        other => Some(other.to_string()),
    }
}

fn bool_marker(b: bool) -> &'static str {
    if b {
        TRUTHY_MARKER
    } else {
        FALSY_MARKER
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with property names, one record per row.
/// Cells are kept verbatim, empty ones included.
fn load_csv(path: &Path) -> Result<Vec<PointRecord>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let properties: BTreeMap<String, String> = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        records.push(PointRecord::new(properties));
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of point records.
///
/// Every column becomes a property. Strings are kept, numbers are printed,
/// booleans map to `TRUE` / `FALSE`, nulls drop the key.
fn load_parquet(path: &Path) -> Result<Vec<PointRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let columns: Vec<(String, &Arc<dyn Array>)> = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(f, c)| (f.name().clone(), c))
            .collect();

        for row in 0..batch.num_rows() {
            let mut properties = BTreeMap::new();
            for (name, col) in &columns {
                let value = extract_text(col, row)
                    .with_context(|| format!("Row {row}: failed to read '{name}'"))?;
                if let Some(value) = value {
                    properties.insert(name.clone(), value);
                }
            }
            records.push(PointRecord::new(properties));
        }
    }

    Ok(records)
}

/// Read one cell as text, `None` for null.
fn extract_text(col: &Arc<dyn Array>, row: usize) -> Result<Option<String>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let text = match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .context("expected StringArray")?
            .value(row)
            .to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .value(row)
            .to_string(),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .value(row)
            .to_string(),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .value(row)
            .to_string(),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .value(row)
            .to_string(),
        DataType::Boolean => {
            let arr = col
                .as_any()
                .downcast_ref::<BooleanArray>()
                .context("expected BooleanArray")?;
            bool_marker(arr.value(row)).to_string()
        }
        _ => array_value_to_string(col, row).context("formatting parquet value")?,
    };
    Ok(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sentence-map-{}-{name}", std::process::id()))
    }

    #[test]
    fn feature_collection_properties_become_records() {
        let root = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature",
                  "properties": { "latitude": "47.3", "longitude": 11.4, "mango": "TRUE", "note": null },
                  "geometry": null },
                { "type": "Feature", "properties": { "sentence": "Hi", "maptiler": true } }
            ]
        });
        let records = records_from_json(&root).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("latitude"), Some("47.3"));
        assert_eq!(records[0].get("longitude"), Some("11.4"));
        assert_eq!(records[0].get("note"), None);
        assert_eq!(records[1].get("maptiler"), Some("TRUE"));
    }

    #[test]
    fn missing_features_is_empty() {
        let root = json!({ "type": "FeatureCollection" });
        assert!(records_from_json(&root).unwrap().is_empty());
        assert!(records_from_json(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn bare_array_of_objects() {
        let root = json!([{ "latitude": "1", "longitude": "2" }, { "sentence": "x" }]);
        let records = records_from_json(&root).unwrap();
        assert_eq!(records[0].get("longitude"), Some("2"));
        assert_eq!(records[1].get("sentence"), Some("x"));
    }

    #[test]
    fn rejects_scalars() {
        assert!(records_from_json(&json!(42)).is_err());
        assert!(records_from_json(&json!({ "features": 3 })).is_err());
    }

    #[test]
    fn csv_rows_in_order() {
        let path = temp_path("rows.csv");
        std::fs::write(
            &path,
            "latitude,longitude,sentence,mango\n47.3,11.4,Hello,TRUE\nbad,11.4,\"Oops, no\",FALSE\n",
        )
        .unwrap();
        let records = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("sentence"), Some("Hello"));
        assert_eq!(records[1].get("sentence"), Some("Oops, no"));
        assert_eq!(records[1].get("latitude"), Some("bad"));
    }

    #[test]
    fn parquet_columns_become_text() {
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("latitude", DataType::Float64, true),
            Field::new("longitude", DataType::Utf8, true),
            Field::new("mango", DataType::Boolean, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![Some(47.5), None])),
                Arc::new(StringArray::from(vec![Some("11.4"), Some("x")])),
                Arc::new(BooleanArray::from(vec![Some(true), Some(false)])),
            ],
        )
        .unwrap();

        let path = temp_path("rows.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let records = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("latitude"), Some("47.5"));
        assert_eq!(records[0].get("mango"), Some("TRUE"));
        assert_eq!(records[1].get("latitude"), None);
        assert_eq!(records[1].get("mango"), Some("FALSE"));
    }

    #[test]
    fn unknown_extension_is_an_error() {
        assert!(load_file(Path::new("points.xlsx")).is_err());
    }
}
