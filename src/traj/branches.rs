use anyhow::{bail, Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Marker written in place of a distance when either sequence is unknown.
pub const MISSING_DISTANCE: &str = "?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitLabel {
    Train,
    Test,
}

/// The parent/child table exported alongside a labeled tree: per-branch
/// Hamming distances and per-node train/test labels, keyed by node name.
///
/// Unknown distances (`?` rows) are stored as zero so trajectory
/// accumulation treats them as "no change". Unlabeled nodes default to
/// train.
pub struct BranchTable {
    pub parent_of: HashMap<String, String>,
    pub hamming_of: HashMap<(String, String), u64>,
    pub train_test_of: HashMap<String, SplitLabel>,
}

impl BranchTable {
    pub fn parse(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let mut lines = BufReader::new(file).lines();

        let header = match lines.next() {
            Some(line) => line?,
            None => bail!("{} is empty", path.display()),
        };
        let columns: Vec<&str> = header.split('\t').collect();
        let col = |name: &str| {
            columns
                .iter()
                .position(|c| *c == name)
                .with_context(|| format!("{} is missing a '{}' column", path.display(), name))
        };
        let parent_col = col("parent")?;
        let child_col = col("child")?;
        let hamming_col = col("hamming")?;
        let label_col = columns.iter().position(|c| *c == "train_test");

        let mut table = BranchTable {
            parent_of: HashMap::new(),
            hamming_of: HashMap::new(),
            train_test_of: HashMap::new(),
        };

        for (line_no, line) in lines.enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let field = |idx: usize| {
                fields.get(idx).copied().with_context(|| {
                    format!("{} line {} is truncated", path.display(), line_no + 2)
                })
            };
            let parent = field(parent_col)?.to_string();
            let child = field(child_col)?.to_string();
            let hamming = match field(hamming_col)? {
                MISSING_DISTANCE => 0,
                raw => raw.parse::<u64>().with_context(|| {
                    format!(
                        "{} line {} has a bad hamming value '{}'",
                        path.display(),
                        line_no + 2,
                        raw
                    )
                })?,
            };

            if let Some(idx) = label_col {
                match fields.get(idx).copied().unwrap_or("") {
                    "" => {}
                    "train" => {
                        table.train_test_of.insert(child.clone(), SplitLabel::Train);
                    }
                    "test" => {
                        table.train_test_of.insert(child.clone(), SplitLabel::Test);
                    }
                    other => bail!(
                        "{} line {} has an unknown train_test label '{}'",
                        path.display(),
                        line_no + 2,
                        other
                    ),
                }
            }

            table
                .hamming_of
                .insert((parent.clone(), child.clone()), hamming);
            table.parent_of.insert(child, parent);
        }

        Ok(table)
    }

    /// Nodes that appear as children but never as parents, sorted so every
    /// downstream iteration (and any sampling driven by it) is reproducible.
    pub fn tips(&self) -> Vec<String> {
        let parents: HashSet<&String> = self.parent_of.values().collect();
        let mut tips: Vec<String> = self
            .parent_of
            .keys()
            .filter(|child| !parents.contains(child))
            .cloned()
            .collect();
        tips.sort_unstable();
        tips
    }

    pub fn label(&self, node: &str) -> SplitLabel {
        self.train_test_of
            .get(node)
            .copied()
            .unwrap_or(SplitLabel::Train)
    }

    pub fn has_labels(&self) -> bool {
        !self.train_test_of.is_empty()
    }

    pub fn branch_distance(&self, parent: &str, child: &str) -> u64 {
        self.hamming_of
            .get(&(parent.to_string(), child.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Path from `tip` up to the root, tip first.
    pub fn path_to_root(&self, tip: &str) -> Vec<String> {
        let mut path = vec![tip.to_string()];
        let mut current = tip;
        while let Some(parent) = self.parent_of.get(current) {
            path.push(parent.clone());
            current = parent;
        }
        path
    }

    /// Index of the first test-labeled node in a root-to-tip path.
    pub fn test_boundary(&self, root_to_tip: &[String]) -> Option<usize> {
        root_to_tip
            .iter()
            .position(|node| self.label(node) == SplitLabel::Test)
    }

    /// Test nodes whose parent is train: the roots of the test clades.
    pub fn test_clade_roots(&self) -> HashSet<String> {
        self.parent_of
            .iter()
            .filter(|(child, parent)| {
                self.label(child) == SplitLabel::Test && self.label(parent) == SplitLabel::Train
            })
            .map(|(child, _)| child.clone())
            .collect()
    }

    /// The clade root a test tip belongs to, found by walking up the tree.
    pub fn clade_root_of(&self, tip: &str, roots: &HashSet<String>) -> Option<String> {
        let mut current = tip;
        loop {
            if roots.contains(current) {
                return Some(current.to_string());
            }
            current = self.parent_of.get(current)?;
        }
    }
}
