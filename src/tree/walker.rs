use crate::tree::index::TreeIndex;

/// Walks the ancestor chain from `tip`, accumulating the mutation count in
/// `gene` on each branch left behind, and returns the first node at which the
/// running total reaches `target_count`, or the last addressable ancestor
/// (the root) if the chain runs out first.
///
/// The count on a branch is added before the threshold check, so a target of
/// zero returns the tip itself. Terminates in at most tree-depth steps.
pub fn walk_back(
    index: &TreeIndex,
    tip: usize,
    target_count: u64,
    gene: &str,
    window: Option<(usize, usize)>,
) -> usize {
    let mut current = tip;
    let mut accumulated: u64 = 0;

    while let Some(parent) = index.named_parent(current) {
        accumulated += index.count_mutations(current, gene, window) as u64;
        if accumulated >= target_count {
            return current;
        }
        current = parent;
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::types::AuspiceJson;

    fn chain_index() -> TreeIndex {
        // ROOT -> N1 -(2 muts)-> N2 -(1 mut)-> TIP
        let raw = r#"{
            "tree": {
                "name": "ROOT",
                "children": [
                    {"name": "N1", "children": [
                        {"name": "N2", "branch_attrs": {"mutations": {"nuc": ["A5T", "C9G"]}}, "children": [
                            {"name": "TIP", "branch_attrs": {"mutations": {"nuc": ["G3C"]}}}
                        ]}
                    ]}
                ]
            }
        }"#;
        let doc: AuspiceJson = serde_json::from_str(raw).unwrap();
        TreeIndex::build(&doc.tree)
    }

    fn name_of(index: &TreeIndex, idx: usize) -> &str {
        index.get(idx).name.as_deref().unwrap()
    }

    #[test]
    fn zero_target_returns_the_tip() {
        let index = chain_index();
        let tip = index.resolve("TIP").unwrap();
        let reached = walk_back(&index, tip, 0, "nuc", None);
        assert_eq!(name_of(&index, reached), "TIP");
    }

    #[test]
    fn stops_where_the_count_is_reached() {
        let index = chain_index();
        let tip = index.resolve("TIP").unwrap();
        assert_eq!(name_of(&index, walk_back(&index, tip, 1, "nuc", None)), "TIP");
        assert_eq!(name_of(&index, walk_back(&index, tip, 2, "nuc", None)), "N2");
        assert_eq!(name_of(&index, walk_back(&index, tip, 3, "nuc", None)), "N2");
    }

    #[test]
    fn exhausted_chain_returns_the_root() {
        let index = chain_index();
        let tip = index.resolve("TIP").unwrap();
        let reached = walk_back(&index, tip, 100, "nuc", None);
        assert_eq!(name_of(&index, reached), "ROOT");
    }

    #[test]
    fn window_restricts_the_accumulation() {
        let index = chain_index();
        let tip = index.resolve("TIP").unwrap();
        // Only positions 1-4 count: the tip branch carries G3C, N2's branch
        // carries nothing in range, so 2 mutations are never reached.
        let reached = walk_back(&index, tip, 2, "nuc", Some((1, 4)));
        assert_eq!(name_of(&index, reached), "ROOT");
    }
}
