use crate::split::{target_tip_count, Selection};
use crate::tree::{walker, TreeIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Grows the test set one clade at a time: draw a seed tip, walk back
/// `mutations_back` mutations to a candidate ancestor, and mark its whole
/// clade unless it exceeds the size cap. Seeds are consumed in an order fully
/// determined by `rng`, so a fixed seed reproduces the selection exactly.
///
/// May stop short of the target when every remaining candidate clade is
/// oversized; callers are expected to report the achieved proportion.
pub fn select_random_clades(
    index: &TreeIndex,
    test_proportion: f64,
    mutations_back: u64,
    max_clade_proportion: f64,
    gene: &str,
    window: Option<(usize, usize)>,
    rng: &mut StdRng,
) -> Selection {
    let tips = index.tip_indices();
    let total_tips = tips.len();
    let target = target_tip_count(total_tips, test_proportion);
    let max_clade_tips = (total_tips as f64 * max_clade_proportion).floor() as usize;

    let mut available = tips;
    available.shuffle(rng);

    let mut tried: HashSet<usize> = HashSet::new();
    let mut test_nodes: HashSet<String> = HashSet::new();
    let mut test_tip_indices: HashSet<usize> = HashSet::new();

    while test_tip_indices.len() < target {
        let Some(seed) = next_seed(&mut available, &tried, &test_tip_indices) else {
            break;
        };
        tried.insert(seed);

        let ancestor = walker::walk_back(index, seed, mutations_back, gene, window);
        if index.get(ancestor).tip_count > max_clade_tips {
            // Clade too large; the seed is spent and never retried.
            continue;
        }
        mark_clade(index, ancestor, &mut test_nodes, &mut test_tip_indices);
    }

    let test_tips = test_tip_indices
        .into_iter()
        .filter_map(|idx| index.get(idx).name.clone())
        .collect();

    Selection {
        test_nodes,
        test_tips,
        target_tip_count: target,
    }
}

/// Pops seeds until one is untried and not already in the test set.
fn next_seed(
    available: &mut Vec<usize>,
    tried: &HashSet<usize>,
    test_tips: &HashSet<usize>,
) -> Option<usize> {
    while let Some(candidate) = available.pop() {
        if !tried.contains(&candidate) && !test_tips.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Marks every named descendant of `ancestor` (tips and internal nodes).
fn mark_clade(
    index: &TreeIndex,
    ancestor: usize,
    test_nodes: &mut HashSet<String>,
    test_tip_indices: &mut HashSet<usize>,
) {
    for idx in index.descendant_indices(ancestor) {
        let node = index.get(idx);
        let Some(name) = &node.name else { continue };
        test_nodes.insert(name.clone());
        if node.is_tip() {
            test_tip_indices.insert(idx);
        }
    }
}
