use crate::traj::branches::{BranchTable, SplitLabel};
use crate::traj::summary::{write_dataset_summary, MinMaxMean};
use crate::traj::trajectory::write_trajectory;
use crate::utils::fasta::read_records;
use crate::utils::progress;
use crate::utils::sanitize::sanitize_filename;
use anyhow::{Context, Result};
use serde_json::{json, Map};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub fn run(
    branches: String,
    alignment: String,
    output_dir: String,
    compress: bool,
    summary: Option<String>,
    dataset: Option<String>,
    url: Option<String>,
) -> Result<()> {
    println!("Loading branches...");
    let table = BranchTable::parse(&branches)?;

    println!("Loading sequences...");
    let records = read_records(&alignment)?;
    let seq_length = records.first().map(|(_, seq)| seq.len()).unwrap_or(0);
    let sequences: HashMap<String, String> = records.into_iter().collect();

    let tips = table.tips();
    println!("Found {} tips", tips.len());

    let branch_distances: Vec<u64> = table.hamming_of.values().copied().collect();
    let zero_distance_branches = branch_distances.iter().filter(|&&d| d == 0).count();

    let output_dir = PathBuf::from(output_dir);
    let has_labels = table.has_labels();
    let (train_dir, test_dir) = if has_labels {
        let train_dir = output_dir.join("forwards-train");
        let test_dir = output_dir.join("forwards-test");
        fs::create_dir_all(&train_dir)
            .with_context(|| format!("Failed to create {}", train_dir.display()))?;
        fs::create_dir_all(&test_dir)
            .with_context(|| format!("Failed to create {}", test_dir.display()))?;
        (train_dir, test_dir)
    } else {
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
        (output_dir.clone(), output_dir.clone())
    };

    let ext = if compress { ".fasta.zst" } else { ".fasta" };
    println!(
        "Writing trajectory files{}...",
        if compress { " (compressed)" } else { "" }
    );

    let mut tip_distances: Vec<u64> = Vec::new();
    let mut path_depths: Vec<u64> = Vec::new();
    let mut train_tips: u64 = 0;
    let mut test_tips: u64 = 0;
    let mut failed: u64 = 0;

    let bar = progress::counted(tips.len() as u64, "Processing tips");
    for tip in &tips {
        bar.inc(1);

        let mut path = table.path_to_root(tip);
        path.reverse();

        let dir = if has_labels {
            if table.label(tip) == SplitLabel::Test {
                // Cut away shared train ancestry: the trajectory starts at
                // the first test node on the root-to-tip path.
                if let Some(boundary) = table.test_boundary(&path) {
                    path.drain(..boundary);
                }
                test_tips += 1;
                &test_dir
            } else {
                train_tips += 1;
                &train_dir
            }
        } else {
            &train_dir
        };

        let out_path = dir.join(format!("{}{}", sanitize_filename(tip), ext));
        match write_one(&path, &sequences, &table, &out_path, compress) {
            Ok(stats) => {
                tip_distances.push(stats.tip_distance);
                path_depths.push(stats.depth as u64);
            }
            Err(e) => {
                // One bad tip should not sink the batch.
                failed += 1;
                eprintln!("Warning: failed to write trajectory for {}: {:#}", tip, e);
            }
        }
    }
    bar.finish_and_clear();

    if has_labels {
        println!(
            "Done! Wrote {} train and {} test trajectory files to {}",
            train_tips,
            test_tips,
            output_dir.display()
        );
    } else {
        println!(
            "Done! Wrote {} trajectory files to {}",
            tips.len() as u64 - failed,
            output_dir.display()
        );
    }

    if let (Some(summary), Some(dataset)) = (summary, dataset) {
        let mut entry = Map::new();
        entry.insert("url".to_string(), json!(url));
        entry.insert("num_tips".to_string(), json!(tips.len()));
        entry.insert("num_nodes".to_string(), json!(sequences.len()));
        entry.insert("sequence_length".to_string(), json!(seq_length));
        entry.insert(
            "hamming_from_root".to_string(),
            MinMaxMean::to_value(&tip_distances),
        );
        entry.insert("path_depth".to_string(), MinMaxMean::to_value(&path_depths));
        entry.insert("total_branches".to_string(), json!(branch_distances.len()));
        entry.insert(
            "zero_distance_branches".to_string(),
            json!(zero_distance_branches),
        );
        entry.insert(
            "per_branch_hamming".to_string(),
            MinMaxMean::to_value(&branch_distances),
        );
        if has_labels {
            entry.insert("train_tips".to_string(), json!(train_tips));
            entry.insert("test_tips".to_string(), json!(test_tips));
        }
        write_dataset_summary(&summary, &dataset, entry)?;
        println!("Wrote summary for '{}' to {}", dataset, summary);
    }

    Ok(())
}

fn write_one(
    path: &[String],
    sequences: &HashMap<String, String>,
    table: &BranchTable,
    out_path: &Path,
    compress: bool,
) -> Result<crate::traj::trajectory::TrajectoryStats> {
    let file = File::create(out_path)
        .with_context(|| format!("Failed to create {}", out_path.display()))?;
    if compress {
        let mut encoder = zstd::Encoder::new(file, 0)?;
        let stats = write_trajectory(path, sequences, table, &mut encoder)?;
        encoder.finish()?;
        Ok(stats)
    } else {
        let mut writer = BufWriter::new(file);
        let stats = write_trajectory(path, sequences, table, &mut writer)?;
        writer.flush()?;
        Ok(stats)
    }
}
