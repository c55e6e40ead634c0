use crate::traj::branches::MISSING_DISTANCE;
use crate::tree::{load_auspice, TreeNode};
use crate::utils::fasta::load_sequences;
use crate::utils::hamming::hamming_distance;
use crate::utils::progress;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};

struct BranchRow {
    parent: String,
    child: String,
    hamming: Option<u64>,
    train_test: String,
}

pub fn run(
    json: String,
    alignment: String,
    output: String,
    strip_prefix: Option<String>,
) -> Result<()> {
    let progress = progress::spinner("Loading tree from JSON...");
    let doc = load_auspice(&json)?;

    progress.set_message("Loading sequences...");
    let mut sequences = load_sequences(&alignment, true)?;
    // Index sequences under the stripped name too, so either naming works.
    if let Some(prefix) = &strip_prefix {
        let stripped: Vec<(String, String)> = sequences
            .iter()
            .filter_map(|(id, seq)| {
                id.strip_prefix(prefix.as_str())
                    .map(|short| (short.to_string(), seq.clone()))
            })
            .collect();
        sequences.extend(stripped);
    }
    progress.finish_with_message(format!("Loaded {} sequences", sequences.len()));

    println!("Extracting branches and computing Hamming distances...");
    let mut rows = Vec::new();
    let mut truncated_pairs: u64 = 0;
    let mut stack: Vec<(&TreeNode, Option<&str>)> = vec![(&doc.tree, None)];
    while let Some((node, parent_name)) = stack.pop() {
        let name = node.name.as_deref();
        if let (Some(name), Some(parent_name)) = (name, parent_name) {
            let child_name = strip(name, &strip_prefix);
            let parent_clean = strip(parent_name, &strip_prefix);

            let hamming = match (sequences.get(&parent_clean), sequences.get(&child_name)) {
                (Some(parent_seq), Some(child_seq)) => {
                    if parent_seq.len() != child_seq.len() {
                        truncated_pairs += 1;
                    }
                    Some(hamming_distance(parent_seq, child_seq))
                }
                // One or both sequences missing (common for internal nodes).
                _ => None,
            };

            let train_test = node
                .node_attrs
                .as_ref()
                .and_then(|attrs| attrs.train_test.as_ref())
                .map(|label| label.value.clone())
                .unwrap_or_default();

            rows.push(BranchRow {
                parent: parent_clean,
                child: child_name,
                hamming,
                train_test,
            });
        }
        for child in node.children.iter().rev() {
            stack.push((child, name));
        }
    }

    let missing = rows.iter().filter(|row| row.hamming.is_none()).count();
    println!("Found {} total branches", rows.len());
    if missing > 0 {
        println!(
            "  {} branches have missing sequences (marked with '{}' for hamming)",
            missing, MISSING_DISTANCE
        );
    }
    if truncated_pairs > 0 {
        eprintln!(
            "Warning: {} branch pairs had unequal sequence lengths; distances were computed over the shorter sequence",
            truncated_pairs
        );
    }

    println!("Writing to {}...", output);
    let file =
        File::create(&output).with_context(|| format!("Failed to create {}", output))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "parent\tchild\thamming\ttrain_test")?;
    for row in &rows {
        let hamming = match row.hamming {
            Some(d) => d.to_string(),
            None => MISSING_DISTANCE.to_string(),
        };
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            row.parent, row.child, hamming, row.train_test
        )?;
    }
    writer.flush()?;

    report_distance_stats(&rows);
    Ok(())
}

fn strip(name: &str, prefix: &Option<String>) -> String {
    match prefix {
        Some(prefix) => name.strip_prefix(prefix.as_str()).unwrap_or(name).to_string(),
        None => name.to_string(),
    }
}

fn report_distance_stats(rows: &[BranchRow]) {
    let values: Vec<u64> = rows.iter().filter_map(|row| row.hamming).collect();
    if values.is_empty() {
        println!("\nNo branches with valid sequences found");
        println!("  Total branches: {}", rows.len());
        return;
    }

    let sum: u64 = values.iter().sum();
    let min = values.iter().min().copied().unwrap_or(0);
    let max = values.iter().max().copied().unwrap_or(0);
    println!("\nHamming distance statistics (for branches with sequences):");
    println!("  Mean: {:.1}", sum as f64 / values.len() as f64);
    println!("  Min: {}", min);
    println!("  Max: {}", max);
    println!("  Branches with sequences: {}/{}", values.len(), rows.len());

    println!("\nDistance distribution:");
    let bins: [u64; 10] = [0, 1, 5, 10, 20, 50, 100, 200, 500, 1000];
    let mut histogram: HashMap<usize, u64> = HashMap::new();
    for &value in &values {
        for i in 0..bins.len() - 1 {
            if value >= bins[i] && value < bins[i + 1] {
                *histogram.entry(i).or_default() += 1;
                break;
            }
        }
    }
    for i in 0..bins.len() - 1 {
        if let Some(count) = histogram.get(&i) {
            let pct = 100.0 * *count as f64 / values.len() as f64;
            println!(
                "  [{:4}-{:4}): {:5} ({:5.1}%)",
                bins[i],
                bins[i + 1],
                count,
                pct
            );
        }
    }
}
