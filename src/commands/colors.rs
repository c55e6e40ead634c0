use crate::tree::load_auspice;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};

#[derive(Serialize)]
struct ColorEntry {
    title: String,
    colors: BTreeMap<String, String>,
}

pub fn run(json: String, output: String) -> Result<()> {
    let doc = load_auspice(&json)?;

    let mut colors_data: BTreeMap<String, ColorEntry> = BTreeMap::new();
    let colorings = doc.meta.as_ref().map(|meta| meta.colorings.as_slice()).unwrap_or(&[]);
    for coloring in colorings {
        // Only categorical colorings with explicit scales are exportable.
        if coloring.scale_type.as_deref() != Some("categorical") {
            continue;
        }
        let Some(scale) = coloring.scale.as_ref().and_then(|s| s.as_array()) else {
            continue;
        };

        let mut color_map = BTreeMap::new();
        for entry in scale {
            let Some(pair) = entry.as_array() else { continue };
            if let (Some(value), Some(color)) =
                (pair.first().and_then(|v| v.as_str()), pair.get(1).and_then(|v| v.as_str()))
            {
                color_map.insert(value.to_string(), color.to_string());
            }
        }

        colors_data.insert(
            coloring.key.clone(),
            ColorEntry {
                title: coloring.title.clone().unwrap_or_else(|| coloring.key.clone()),
                colors: color_map,
            },
        );
    }

    let file =
        File::create(&output).with_context(|| format!("Failed to create {}", output))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &colors_data)?;
    writer.flush()?;

    if colors_data.is_empty() {
        println!("No categorical color mappings found in Auspice JSON");
    } else {
        println!("Extracted color mappings for {} fields:", colors_data.len());
        for (key, entry) in &colors_data {
            println!("  - {}: {} ({} values)", key, entry.title, entry.colors.len());
        }
    }
    Ok(())
}
