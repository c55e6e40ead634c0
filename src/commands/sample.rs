use crate::utils::fasta::{read_records, write_wrapped};
use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufWriter, Write};

/// Internal node records carry this prefix in reconstructed alignments.
const INTERNAL_NODE_PREFIX: &str = "NODE_";

pub fn run(
    input: String,
    output: String,
    fraction: f64,
    include_nodes: bool,
    seed: u64,
) -> Result<()> {
    if !(0.0..=1.0).contains(&fraction) || fraction == 0.0 {
        bail!("Sample fraction must be between 0.0 and 1.0");
    }

    let records = read_records(&input)?;
    let total_loaded = records.len();

    let (filtered, description): (Vec<_>, _) = if include_nodes {
        (records, "all sequences")
    } else {
        (
            records
                .into_iter()
                .filter(|(id, _)| !id.starts_with(INTERNAL_NODE_PREFIX))
                .collect(),
            "tip sequences only",
        )
    };

    if filtered.is_empty() {
        bail!("No sequences found after filtering for {}", description);
    }

    let n_samples = ((filtered.len() as f64 * fraction) as usize).max(1);
    let mut rng = StdRng::seed_from_u64(seed);
    let picks = rand::seq::index::sample(&mut rng, filtered.len(), n_samples);

    let file =
        File::create(&output).with_context(|| format!("Failed to create {}", output))?;
    let mut writer = BufWriter::new(file);
    for idx in picks.iter() {
        let (id, seq) = &filtered[idx];
        write_wrapped(&mut writer, id, seq)?;
    }
    writer.flush()?;

    println!(
        "Filtered to {} {} from {} total sequences",
        filtered.len(),
        description,
        total_loaded
    );
    println!(
        "Sampled {} out of {} sequences ({:.1}%)",
        n_samples,
        filtered.len(),
        fraction * 100.0
    );
    println!("Sampled sequences saved to {}", output);
    Ok(())
}
