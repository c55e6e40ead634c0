use crate::traj::branches::{BranchTable, SplitLabel};
use crate::traj::pairwise::{
    clade_membership, locate, nth_pair, pair_count, select_pair_indices, write_pair,
};
use crate::traj::summary::{merge_dataset_summary, MinMaxMean};
use crate::utils::fasta::load_sequences;
use crate::utils::progress;
use crate::utils::sanitize::sanitize_filename;
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Map};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[allow(clippy::too_many_arguments)]
pub fn run(
    branches: String,
    alignment: String,
    output_dir: String,
    train_limit: Option<u64>,
    test_limit: Option<u64>,
    seed: u64,
    summary: Option<String>,
    dataset: Option<String>,
    url: Option<String>,
) -> Result<()> {
    println!("Loading branches and alignment...");
    let table = BranchTable::parse(&branches)?;
    let sequences = load_sequences(&alignment, false)?;

    let tips = table.tips();
    let train_tips: Vec<String> = tips
        .iter()
        .filter(|tip| table.label(tip) == SplitLabel::Train)
        .cloned()
        .collect();
    let test_tips: Vec<String> = tips
        .iter()
        .filter(|tip| table.label(tip) == SplitLabel::Test)
        .cloned()
        .collect();
    println!(
        "Found {} train tips and {} test tips",
        train_tips.len(),
        test_tips.len()
    );

    let output_dir = Path::new(&output_dir);
    let train_dir = output_dir.join("pairwise-train");
    let test_dir = output_dir.join("pairwise-test");
    fs::create_dir_all(&train_dir)
        .with_context(|| format!("Failed to create {}", train_dir.display()))?;
    fs::create_dir_all(&test_dir)
        .with_context(|| format!("Failed to create {}", test_dir.display()))?;

    let mut rng = StdRng::seed_from_u64(seed);

    // Train pairs: any two train tips.
    let train_total = pair_count(train_tips.len() as u64);
    let train_planned = train_limit.unwrap_or(train_total).min(train_total);
    println!("Writing {} train pairs...", train_planned);
    let bar = progress::counted(train_planned, "Train pairs");
    let mut train_distances: Vec<u64> = Vec::new();
    for k in select_pair_indices(train_total, train_limit, &mut rng) {
        bar.inc(1);
        let (i, j) = nth_pair(k);
        let a = &train_tips[i as usize];
        let b = &train_tips[j as usize];
        if let Some(distance) = emit_pair(a, b, &sequences, &train_dir)? {
            train_distances.push(distance);
        }
    }
    bar.finish_and_clear();

    // Test pairs: only within a single test clade, indexed through one
    // global space laid over the per-clade pair blocks.
    let clades: Vec<(String, Vec<String>)> =
        clade_membership(&test_tips, &table).into_iter().collect();
    let n_clades = clades.len();
    println!("Found {} test clades", n_clades);

    let mut offsets: Vec<u64> = Vec::with_capacity(clades.len());
    let mut test_total: u64 = 0;
    for (_, members) in &clades {
        offsets.push(test_total);
        test_total += pair_count(members.len() as u64);
    }

    let test_planned = test_limit.unwrap_or(test_total).min(test_total);
    println!("Writing {} test pairs...", test_planned);
    let bar = progress::counted(test_planned, "Test pairs");
    let mut test_distances: Vec<u64> = Vec::new();
    for k in select_pair_indices(test_total, test_limit, &mut rng) {
        bar.inc(1);
        let (clade, local) = locate(&offsets, k);
        let members = &clades[clade].1;
        let (i, j) = nth_pair(local);
        let a = &members[i as usize];
        let b = &members[j as usize];
        if let Some(distance) = emit_pair(a, b, &sequences, &test_dir)? {
            test_distances.push(distance);
        }
    }
    bar.finish_and_clear();

    println!(
        "Done! Wrote {} train and {} test pairs",
        train_distances.len(),
        test_distances.len()
    );

    if let (Some(summary), Some(dataset)) = (summary, dataset) {
        let mut patch = Map::new();
        if let Some(url) = url {
            patch.insert("url".to_string(), json!(url));
        }
        patch.insert(
            "pairwise_train_pairs".to_string(),
            json!(train_distances.len()),
        );
        patch.insert(
            "pairwise_test_pairs".to_string(),
            json!(test_distances.len()),
        );
        patch.insert("pairwise_test_clades".to_string(), json!(n_clades));
        if let Some(stats) = MinMaxMean::from_values(&train_distances) {
            patch.insert(
                "pairwise_train_hamming".to_string(),
                serde_json::to_value(stats)?,
            );
        }
        if let Some(stats) = MinMaxMean::from_values(&test_distances) {
            patch.insert(
                "pairwise_test_hamming".to_string(),
                serde_json::to_value(stats)?,
            );
        }
        merge_dataset_summary(&summary, &dataset, patch)?;
        println!("Updated summary at {}", summary);
    }

    Ok(())
}

/// Writes one pair file, logging and skipping failures so a bad pair does
/// not abort the batch. Missing sequences skip silently, matching the
/// trajectory side.
fn emit_pair(
    a: &str,
    b: &str,
    sequences: &HashMap<String, String>,
    dir: &Path,
) -> Result<Option<u64>> {
    let file_name = format!("{}__{}.fasta", sanitize_filename(a), sanitize_filename(b));
    match write_pair(a, b, sequences, &dir.join(file_name)) {
        Ok(result) => Ok(result),
        Err(e) => {
            eprintln!("Warning: failed to write pair {} / {}: {:#}", a, b, e);
            Ok(None)
        }
    }
}
