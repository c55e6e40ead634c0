use crate::traj::branches::BranchTable;
use crate::utils::fasta::write_wrapped;
use crate::utils::hamming::hamming_distance;
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Number of unordered pairs over `n` items.
pub fn pair_count(n: u64) -> u64 {
    n * n.saturating_sub(1) / 2
}

/// Inverts a pair index to `(i, j)`, `i < j`, under the triangular
/// enumeration (0,1); (0,2),(1,2); (0,3),(1,3),(2,3); and so on. Pair `k`
/// lives in the block of its larger member `j`, at offset `k - j*(j-1)/2`,
/// so sampling never materializes a pair list.
pub fn nth_pair(k: u64) -> (u64, u64) {
    let mut j = ((1.0 + (1.0 + 8.0 * k as f64).sqrt()) / 2.0) as u64;
    // Guard against float rounding at block boundaries.
    while j * j.saturating_sub(1) / 2 > k {
        j -= 1;
    }
    while (j + 1) * j / 2 <= k {
        j += 1;
    }
    let i = k - j * (j - 1) / 2;
    (i, j)
}

/// Which pair indices to emit: everything, or a seeded sample without
/// replacement.
pub fn select_pair_indices(
    total: u64,
    limit: Option<u64>,
    rng: &mut StdRng,
) -> Box<dyn Iterator<Item = u64>> {
    match limit {
        Some(limit) if limit < total => {
            let sampled = rand::seq::index::sample(rng, total as usize, limit as usize);
            Box::new(sampled.into_iter().map(|k| k as u64))
        }
        _ => Box::new(0..total),
    }
}

/// Test tips grouped by the root of the clade they belong to, sorted by
/// clade root so cross-run iteration order is stable. Tips whose ancestry
/// never reaches a clade root (possible when the tree root itself is test)
/// are left out, matching the upstream labeling contract.
pub fn clade_membership(test_tips: &[String], table: &BranchTable) -> BTreeMap<String, Vec<String>> {
    let roots = table.test_clade_roots();
    let mut clades: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for tip in test_tips {
        if let Some(root) = table.clade_root_of(tip, &roots) {
            clades.entry(root).or_default().push(tip.clone());
        }
    }
    clades
}

/// Locates a global pair index within per-clade blocks laid out by
/// `offsets` (cumulative pair counts). Returns the clade position and the
/// local pair index inside it.
pub fn locate(offsets: &[u64], k: u64) -> (usize, u64) {
    let clade = offsets.partition_point(|&offset| offset <= k) - 1;
    (clade, k - offsets[clade])
}

/// Writes one pair file: the first sequence annotated `|0`, the second with
/// the pairwise Hamming distance. Returns the distance, or `None` (no file)
/// when either sequence is absent from the alignment.
pub fn write_pair(
    a: &str,
    b: &str,
    sequences: &HashMap<String, String>,
    path: &Path,
) -> Result<Option<u64>> {
    let (Some(seq_a), Some(seq_b)) = (sequences.get(a), sequences.get(b)) else {
        return Ok(None);
    };

    let distance = hamming_distance(seq_a, seq_b);
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_wrapped(&mut writer, &format!("{}|0", a), seq_a)?;
    write_wrapped(&mut writer, &format!("{}|{}", b, distance), seq_b)?;
    writer.flush()?;
    Ok(Some(distance))
}
