use crate::tree::{load_auspice, TreeNode};
use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};

struct NodeRow {
    name: String,
    parent: Option<String>,
    fields: HashMap<String, String>,
}

/// Dumps every categorical (string-valued) node attribute as a TSV, one row
/// per named node, with columns discovered from the tree itself.
pub fn run(json: String, output: String, strip_prefix: Option<String>) -> Result<()> {
    let doc = load_auspice(&json)?;

    let strip = |name: &str| -> String {
        match &strip_prefix {
            Some(prefix) => name.strip_prefix(prefix.as_str()).unwrap_or(name).to_string(),
            None => name.to_string(),
        }
    };

    let mut rows: Vec<NodeRow> = Vec::new();
    let mut fields_present: BTreeSet<String> = BTreeSet::new();

    let mut stack: Vec<(&TreeNode, Option<&str>)> = vec![(&doc.tree, None)];
    while let Some((node, parent_name)) = stack.pop() {
        let name = node.name.as_deref();
        if let Some(name) = name {
            let mut fields = HashMap::new();
            if let Some(attrs) = &node.node_attrs {
                if let Some(label) = &attrs.train_test {
                    fields.insert("train_test".to_string(), label.value.clone());
                }
                for (key, value) in &attrs.extra {
                    // Categorical attributes look like {"value": "..."};
                    // numeric attributes (div, num_date) fall through.
                    if let Some(text) = value.get("value").and_then(|v| v.as_str()) {
                        fields.insert(key.clone(), text.to_string());
                    }
                }
            }
            fields_present.extend(fields.keys().cloned());
            rows.push(NodeRow {
                name: strip(name),
                parent: parent_name.map(|parent| strip(parent)),
                fields,
            });
        }
        for child in node.children.iter().rev() {
            stack.push((child, name));
        }
    }

    let file =
        File::create(&output).with_context(|| format!("Failed to create {}", output))?;
    let mut writer = BufWriter::new(file);

    let mut headers = vec!["name".to_string(), "parent".to_string()];
    headers.extend(fields_present.iter().cloned());
    writeln!(writer, "{}", headers.join("\t"))?;

    for row in &rows {
        let mut cells = vec![row.name.clone(), row.parent.clone().unwrap_or_default()];
        for field in &fields_present {
            cells.push(row.fields.get(field).cloned().unwrap_or_default());
        }
        writeln!(writer, "{}", cells.join("\t"))?;
    }
    writer.flush()?;

    println!(
        "Wrote metadata for {} nodes ({} fields) to {}",
        rows.len(),
        fields_present.len(),
        output
    );
    Ok(())
}
