use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Min/max/mean block as written into the dataset summary.
#[derive(Debug, Default, Serialize)]
pub struct MinMaxMean {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
}

impl MinMaxMean {
    pub fn from_values(values: &[u64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sum: u64 = values.iter().sum();
        let mean = sum as f64 / values.len() as f64;
        Some(MinMaxMean {
            min: *values.iter().min().unwrap_or(&0),
            max: *values.iter().max().unwrap_or(&0),
            mean: (mean * 100.0).round() / 100.0,
        })
    }

    pub fn to_value(values: &[u64]) -> Value {
        match Self::from_values(values) {
            Some(stats) => serde_json::to_value(stats).unwrap_or(Value::Null),
            None => serde_json::to_value(MinMaxMean::default()).unwrap_or(Value::Null),
        }
    }
}

fn load_summary(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse summary JSON {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn save_summary(path: &Path, summaries: &Map<String, Value>) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summaries)
        .with_context(|| format!("Failed to write summary JSON {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write summary JSON {}", path.display()))?;
    Ok(())
}

/// Replaces the dataset's whole summary entry.
pub fn write_dataset_summary(
    path: impl AsRef<Path>,
    dataset: &str,
    entry: Map<String, Value>,
) -> Result<()> {
    let path = path.as_ref();
    let mut summaries = load_summary(path)?;
    summaries.insert(dataset.to_string(), Value::Object(entry));
    save_summary(path, &summaries)
}

/// Merges keys into the dataset's existing summary entry, creating it if
/// absent. Existing keys not in `patch` are kept.
pub fn merge_dataset_summary(
    path: impl AsRef<Path>,
    dataset: &str,
    patch: Map<String, Value>,
) -> Result<()> {
    let path = path.as_ref();
    let mut summaries = load_summary(path)?;
    let entry = summaries
        .entry(dataset.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(map) = entry {
        for (key, value) in patch {
            map.insert(key, value);
        }
    }
    save_summary(path, &summaries)
}
