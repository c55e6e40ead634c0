use crate::traj::branches::BranchTable;
use crate::utils::fasta::write_wrapped;
use anyhow::Result;
use std::collections::HashMap;
use std::io::Write;

/// What one trajectory contributed to the run's statistics.
pub struct TrajectoryStats {
    /// Cumulative Hamming distance at the tip.
    pub tip_distance: u64,
    /// Number of frames actually written.
    pub depth: usize,
}

/// Writes one tip's trajectory: the root-to-tip path as FASTA entries
/// annotated `>{name}|{cumulative distance}`.
///
/// Intermediate nodes whose incoming branch has distance zero are collapsed
/// away (the terminal tip is always kept), and nodes without a sequence in
/// the alignment are skipped. Cumulative distances are monotonically
/// non-decreasing along the emitted path.
pub fn write_trajectory(
    path: &[String],
    sequences: &HashMap<String, String>,
    table: &BranchTable,
    out: &mut dyn Write,
) -> Result<TrajectoryStats> {
    let mut cumulative: u64 = 0;
    let mut depth = 0;

    for (i, node) in path.iter().enumerate() {
        if i > 0 {
            let branch = table.branch_distance(&path[i - 1], node);
            cumulative += branch;
            let is_terminal = i + 1 == path.len();
            if branch == 0 && !is_terminal {
                continue;
            }
        }

        let Some(seq) = sequences.get(node) else {
            continue;
        };
        write_wrapped(out, &format!("{}|{}", node, cumulative), seq)?;
        depth += 1;
    }

    Ok(TrajectoryStats {
        tip_distance: cumulative,
        depth,
    })
}
