use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// A full Auspice v2 document: display metadata, the tree itself, and an
/// optional embedded root sequence. Fields this tool does not own are kept
/// verbatim in `extra` so a round trip through the split tool only touches
/// train/test labels and the split coloring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuspiceJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    pub tree: TreeNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_sequence: Option<HashMap<String, String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colorings: Vec<Coloring>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of `meta.colorings`. `scale` stays untyped: categorical scales
/// are `[value, color]` string pairs but continuous scales mix in numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coloring {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub scale_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_attrs: Option<NodeAttrs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_attrs: Option<BranchAttrs>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TreeNode {
    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }

    /// Raw mutation descriptors on this node's incoming branch for `gene`.
    pub fn mutations(&self, gene: &str) -> &[String] {
        self.branch_attrs
            .as_ref()
            .and_then(|attrs| attrs.mutations.get(gene))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub div: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_test: Option<AttrValue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Auspice wraps scalar node attributes as `{"value": ...}` objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttrValue {
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AttrValue {
    pub fn new(value: impl Into<String>) -> Self {
        AttrValue {
            value: value.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchAttrs {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub mutations: HashMap<String, Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single-position substitution in `<ref><position><alt>` form, with the
/// position 1-indexed as in the source annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    pub reference: char,
    pub position: usize,
    pub alternate: char,
}

impl Mutation {
    pub fn in_window(&self, window: Option<(usize, usize)>) -> bool {
        match window {
            Some((begin, end)) => self.position >= begin && self.position <= end,
            None => true,
        }
    }
}

impl FromStr for Mutation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() < 3 {
            return Err(anyhow!("invalid mutation descriptor '{}'", s));
        }
        let digits: String = chars[1..chars.len() - 1].iter().collect();
        let position: usize = digits
            .parse()
            .map_err(|_| anyhow!("invalid mutation descriptor '{}'", s))?;
        if position == 0 {
            return Err(anyhow!("mutation position must be 1-indexed in '{}'", s));
        }
        Ok(Mutation {
            reference: chars[0],
            position,
            alternate: chars[chars.len() - 1],
        })
    }
}

pub fn load_auspice(path: impl AsRef<Path>) -> Result<AuspiceJson> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse Auspice JSON from {}", path.display()))
}

/// Writes the document compactly, the way Auspice datasets ship.
pub fn save_auspice(path: impl AsRef<Path>, doc: &AuspiceJson) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, doc)
        .with_context(|| format!("Failed to write Auspice JSON to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write Auspice JSON to {}", path.display()))
}
