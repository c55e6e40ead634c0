pub mod annotate;
pub mod monophyletic;
pub mod random;

pub use annotate::{add_split_coloring, annotate_nodes};

use crate::tree::TreeIndex;
use anyhow::Result;
use rand::rngs::StdRng;
use std::collections::HashSet;

pub const TRAIN_LABEL: &str = "train";
pub const TEST_LABEL: &str = "test";

/// What a split strategy hands back: the node names to mark as test, the
/// tips among them, and the tip count the strategy was aiming for.
pub struct Selection {
    pub test_nodes: HashSet<String>,
    pub test_tips: HashSet<String>,
    pub target_tip_count: usize,
}

/// How the test partition is chosen. Both variants honor the same contract:
/// the returned node set is downward-closed (whole clades, never a node
/// without its descendants).
pub enum SplitStrategy {
    /// Iteratively seed clades from randomly drawn tips, walking back a fixed
    /// mutation count and skipping clades over the size cap.
    RandomClades {
        mutations_back: u64,
        max_clade_proportion: f64,
        gene: String,
        window: Option<(usize, usize)>,
    },
    /// Pick the single subtree whose tip count best matches the target.
    Monophyletic { tolerance: f64 },
}

impl SplitStrategy {
    pub fn select(
        &self,
        index: &TreeIndex,
        test_proportion: f64,
        rng: &mut StdRng,
    ) -> Result<Selection> {
        match self {
            SplitStrategy::RandomClades {
                mutations_back,
                max_clade_proportion,
                gene,
                window,
            } => Ok(random::select_random_clades(
                index,
                test_proportion,
                *mutations_back,
                *max_clade_proportion,
                gene,
                *window,
                rng,
            )),
            SplitStrategy::Monophyletic { tolerance } => {
                monophyletic::select_monophyletic_clade(index, test_proportion, *tolerance)
            }
        }
    }
}

pub(crate) fn target_tip_count(total_tips: usize, test_proportion: f64) -> usize {
    ((total_tips as f64 * test_proportion).round() as usize).max(1)
}
