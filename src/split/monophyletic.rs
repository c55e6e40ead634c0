use crate::split::{target_tip_count, Selection};
use crate::tree::TreeIndex;
use anyhow::{bail, Result};
use std::collections::HashSet;

/// Picks the one subtree whose tip count falls within
/// `target * (1 ± tolerance)` and lies closest to the target, ties going to
/// the first candidate in pre-order. The whole clade becomes the test set.
///
/// Errors when no subtree satisfies the window; a near miss is never
/// silently substituted.
pub fn select_monophyletic_clade(
    index: &TreeIndex,
    test_proportion: f64,
    tolerance: f64,
) -> Result<Selection> {
    let total_tips = index.total_tips();
    let target = target_tip_count(total_tips, test_proportion);
    let lower = target as f64 * (1.0 - tolerance);
    let upper = target as f64 * (1.0 + tolerance);

    let mut best: Option<(usize, usize)> = None; // (arena idx, |tips - target|)
    for (idx, node) in index.nodes() {
        let tips = node.tip_count;
        if (tips as f64) < lower || (tips as f64) > upper {
            continue;
        }
        let diff = tips.abs_diff(target);
        // Strict comparison keeps the first pre-order candidate on ties.
        if best.map_or(true, |(_, best_diff)| diff < best_diff) {
            best = Some((idx, diff));
        }
    }

    let Some((clade_root, _)) = best else {
        bail!("No clade found with size near {}", target);
    };

    let mut test_nodes = HashSet::new();
    let mut test_tips = HashSet::new();
    for idx in index.descendant_indices(clade_root) {
        let node = index.get(idx);
        let Some(name) = &node.name else { continue };
        test_nodes.insert(name.clone());
        if node.is_tip() {
            test_tips.insert(name.clone());
        }
    }

    Ok(Selection {
        test_nodes,
        test_tips,
        target_tip_count: target,
    })
}
