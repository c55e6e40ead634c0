use crate::tree::types::{Mutation, TreeNode};
use std::collections::HashMap;

/// A flattened, addressable view of an Auspice tree.
///
/// Nodes live in an arena in pre-order; parent/child links are arena indices,
/// so arbitrarily deep trees are handled without recursion. Named nodes are
/// additionally reachable by name. Unnamed nodes are traversed (their
/// subtrees still count) but cannot be addressed, walked through by name, or
/// selected as clade roots.
pub struct TreeIndex {
    arena: Vec<IndexedNode>,
    by_name: HashMap<String, usize>,
}

pub struct IndexedNode {
    pub name: Option<String>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub tip_count: usize,
    /// Raw mutation descriptors on the incoming branch, keyed by gene.
    pub mutations: HashMap<String, Vec<String>>,
}

impl IndexedNode {
    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }
}

impl TreeIndex {
    pub fn build(root: &TreeNode) -> Self {
        let mut arena: Vec<IndexedNode> = Vec::new();
        let mut by_name = HashMap::new();

        let mut stack: Vec<(&TreeNode, Option<usize>)> = vec![(root, None)];
        while let Some((node, parent)) = stack.pop() {
            let idx = arena.len();
            arena.push(IndexedNode {
                name: node.name.clone(),
                parent,
                children: Vec::new(),
                tip_count: 0,
                mutations: node
                    .branch_attrs
                    .as_ref()
                    .map(|attrs| attrs.mutations.clone())
                    .unwrap_or_default(),
            });
            if let Some(parent) = parent {
                arena[parent].children.push(idx);
            }
            if let Some(name) = &node.name {
                by_name.insert(name.clone(), idx);
            }
            // Reversed push keeps pre-order arena placement in child order.
            for child in node.children.iter().rev() {
                stack.push((child, Some(idx)));
            }
        }

        // In pre-order every descendant sits after its ancestor, so a reverse
        // sweep sees children before parents.
        for idx in (0..arena.len()).rev() {
            let count = if arena[idx].children.is_empty() {
                1
            } else {
                arena[idx]
                    .children
                    .iter()
                    .map(|&child| arena[child].tip_count)
                    .sum()
            };
            arena[idx].tip_count = count;
        }

        TreeIndex { arena, by_name }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn get(&self, idx: usize) -> &IndexedNode {
        &self.arena[idx]
    }

    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Pre-order iteration over the arena.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, &IndexedNode)> {
        self.arena.iter().enumerate()
    }

    /// Parent index, provided the parent is addressable by name. Mirrors a
    /// name-keyed parent map: a walk stops where the chain loses its names.
    pub fn named_parent(&self, idx: usize) -> Option<usize> {
        let parent = self.arena[idx].parent?;
        self.arena[parent].name.as_ref().map(|_| parent)
    }

    /// Named tips in pre-order encounter order.
    pub fn tip_indices(&self) -> Vec<usize> {
        self.arena
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_tip() && node.name.is_some())
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn total_tips(&self) -> usize {
        self.tip_indices().len()
    }

    /// Arena indices of `idx` and everything below it.
    pub fn descendant_indices(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.arena[current].children.iter().copied());
        }
        out
    }

    /// Mutations in `gene` on the incoming branch of `idx`, optionally
    /// restricted to an inclusive 1-indexed position window. Without a window
    /// the raw descriptor count is used; with one, descriptors that fail to
    /// parse are left out of the count.
    pub fn count_mutations(&self, idx: usize, gene: &str, window: Option<(usize, usize)>) -> usize {
        let Some(muts) = self.arena[idx].mutations.get(gene) else {
            return 0;
        };
        match window {
            None => muts.len(),
            Some(_) => muts
                .iter()
                .filter_map(|raw| raw.parse::<Mutation>().ok())
                .filter(|m| m.in_window(window))
                .count(),
        }
    }
}
