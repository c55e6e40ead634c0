use crate::tree::types::Mutation;
use crate::tree::{load_auspice, TreeNode};
use crate::utils::fasta::write_wrapped;
use crate::utils::progress;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Depth-first traversal step: entering a node applies its incoming-branch
/// mutations to the working sequence, and the matching exit undoes them, so
/// each node's sequence is materialized without re-walking the root path.
enum Step<'a> {
    Enter { node: &'a TreeNode, apply: bool },
    Exit { undo: Vec<(usize, u8)> },
}

pub fn run(
    json: String,
    output: String,
    gene: String,
    tips_only: bool,
    strip_prefix: Option<String>,
) -> Result<()> {
    let doc = load_auspice(&json)?;
    let root_seq = find_root_sequence(Path::new(&json), &doc.root_sequence, &gene)?;

    let file =
        File::create(&output).with_context(|| format!("Failed to create {}", output))?;
    let mut writer = BufWriter::new(file);

    let progress = progress::spinner("Reconstructing node sequences...");
    let mut seq: Vec<u8> = root_seq.into_bytes();
    let mut written: u64 = 0;
    let mut dropped_stops: u64 = 0;
    let mut skipped_mutations: u64 = 0;

    // The root's own branch_attrs describe no branch, so they are not applied.
    let mut stack: Vec<Step> = vec![Step::Enter {
        node: &doc.tree,
        apply: false,
    }];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter { node, apply } => {
                let mut undo = Vec::new();
                if apply {
                    for raw in node.mutations(&gene) {
                        let Ok(mutation) = raw.parse::<Mutation>() else {
                            skipped_mutations += 1;
                            continue;
                        };
                        let site = mutation.position - 1;
                        if site >= seq.len() {
                            skipped_mutations += 1;
                            continue;
                        }
                        undo.push((site, seq[site]));
                        seq[site] = mutation.alternate as u8;
                    }
                }
                stack.push(Step::Exit { undo });
                for child in node.children.iter().rev() {
                    stack.push(Step::Enter { node: child, apply: true });
                }

                if let Some(name) = &node.name {
                    if !tips_only || node.is_tip() {
                        // Trim trailing stop codons; drop records with
                        // premature stops entirely.
                        let text = String::from_utf8_lossy(&seq);
                        let stripped = text.trim_end_matches('*');
                        if stripped.contains('*') {
                            dropped_stops += 1;
                        } else {
                            let id = match &strip_prefix {
                                Some(prefix) => name.strip_prefix(prefix.as_str()).unwrap_or(name),
                                None => name,
                            };
                            write_wrapped(&mut writer, id, stripped)?;
                            written += 1;
                            progress.set_message(format!("Wrote {} sequences", written));
                        }
                    }
                }
            }
            Step::Exit { undo } => {
                // Reverse order restores sites mutated more than once.
                for (site, base) in undo.into_iter().rev() {
                    seq[site] = base;
                }
            }
        }
    }
    writer.flush()?;
    progress.finish_with_message(format!("Wrote {} sequences to {}", written, output));

    if dropped_stops > 0 {
        println!("Dropped {} sequences with internal stop codons", dropped_stops);
    }
    if skipped_mutations > 0 {
        eprintln!(
            "Warning: skipped {} unparsable or out-of-range mutations",
            skipped_mutations
        );
    }
    Ok(())
}

/// The root sequence comes from a `{stem}_root-sequence.json` sidecar when
/// one exists, else from the document's embedded `root_sequence` block.
fn find_root_sequence(
    json_path: &Path,
    embedded: &Option<HashMap<String, String>>,
    gene: &str,
) -> Result<String> {
    let sidecar = sidecar_path(json_path);
    if sidecar.exists() {
        let file = File::open(&sidecar)
            .with_context(|| format!("Failed to open {}", sidecar.display()))?;
        let root: HashMap<String, String> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse {}", sidecar.display()))?;
        return root.get(gene).cloned().with_context(|| {
            format!(
                "Root sequence for gene '{}' not found in sidecar file {}",
                gene,
                sidecar.display()
            )
        });
    }

    if let Some(root) = embedded {
        return root.get(gene).cloned().with_context(|| {
            format!(
                "Root sequence for gene '{}' not found in the root_sequence field",
                gene
            )
        });
    }

    bail!(
        "No root sequence found. Expected either a sidecar file at {} or a 'root_sequence' field in the Auspice JSON",
        sidecar.display()
    )
}

fn sidecar_path(json_path: &Path) -> PathBuf {
    let stem = json_path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.strip_suffix(".json").unwrap_or(name))
        .unwrap_or_default();
    json_path.with_file_name(format!("{}_root-sequence.json", stem))
}
