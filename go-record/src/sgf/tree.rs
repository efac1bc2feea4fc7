use std::fs;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::SgfError;
use super::parser::parse;
use super::serialize::to_sgf;
use crate::stone::Stone;

/// One SGF node: its properties and the variations that follow it.
///
/// Property keys are unique within a node and keep their insertion order;
/// the order of a key's values is significant. The first child continues
/// the main line, further children are alternate variations. Children are
/// owned by their parent and hold no back-reference.
///
/// A main line is a chain of nested children, so every whole-tree trait
/// (`Clone`, `PartialEq`, `Drop`, serde) walks the tree with an explicit
/// stack instead of recursing once per node.
#[derive(Debug, Default)]
pub struct SgfTree {
    properties: Vec<(String, Vec<String>)>,
    children: Vec<SgfTree>,
}

impl SgfTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SgfTree::set_property`].
    pub fn with_property<K, I, V>(mut self, key: K, values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.set_property(key, values);
        self
    }

    /// Builder form of [`SgfTree::add_child`].
    pub fn with_child(mut self, child: SgfTree) -> Self {
        self.add_child(child);
        self
    }

    /// Set a property, replacing any values already stored under `key`.
    pub fn set_property<K, I, V>(&mut self, key: K, values: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let key = key.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = values,
            None => self.properties.push((key, values)),
        }
    }

    /// Append one value to a property, creating it if needed.
    pub fn push_value(&mut self, key: &str, value: impl Into<String>) {
        match self.properties.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => existing.push(value.into()),
            None => self.properties.push((key.to_string(), vec![value.into()])),
        }
    }

    pub fn remove_property(&mut self, key: &str) -> Option<Vec<String>> {
        let i = self.properties.iter().position(|(k, _)| k == key)?;
        Some(self.properties.remove(i).1)
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// First value of a property.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn children(&self) -> &[SgfTree] {
        &self.children
    }

    pub fn add_child(&mut self, child: SgfTree) {
        self.children.push(child);
    }

    pub(crate) fn set_children(&mut self, children: Vec<SgfTree>) {
        self.children = children;
    }

    /// Drop every variation below this node, making it the end of the line.
    pub fn truncate(&mut self) -> Vec<SgfTree> {
        std::mem::take(&mut self.children)
    }

    /// True for a node with neither properties nor children.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.children.is_empty()
    }

    /// This node followed by the first child at every level.
    pub fn main_line(&self) -> MainLine<'_> {
        MainLine { next: Some(self) }
    }

    /// `(color, sgf coordinate)` for every main-line node carrying a move.
    /// `B` is checked before `W`.
    pub fn move_sequence(&self) -> Vec<(Stone, String)> {
        self.main_line()
            .filter_map(|node| node.node_move())
            .map(|(stone, value)| (stone, value.to_string()))
            .collect()
    }

    /// The move stored on this node, if any.
    pub fn node_move(&self) -> Option<(Stone, &str)> {
        [Stone::Black, Stone::White]
            .into_iter()
            .find_map(|stone| {
                self.get(stone.letter())
                    .map(|v| (stone, v.first().map_or("", String::as_str)))
            })
    }

    /// Nodes in pre-order, each with the index of its parent.
    fn flatten(&self) -> Vec<FlatNodeRef<'_>> {
        let mut out = Vec::new();
        let mut stack = vec![(self, None)];
        while let Some((node, parent)) = stack.pop() {
            let index = out.len();
            out.push(FlatNodeRef {
                properties: &node.properties,
                parent,
            });
            stack.extend(node.children.iter().rev().map(|c| (c, Some(index))));
        }
        out
    }

    /// Inverse of [`SgfTree::flatten`]. Every parent index must point at an
    /// earlier node, and only the first node may lack one.
    fn from_flat(flat: Vec<FlatNode>) -> Result<Self, String> {
        let mut nodes = Vec::with_capacity(flat.len());
        for (i, node) in flat.into_iter().enumerate() {
            match (i, node.parent) {
                (0, None) => {}
                (i, Some(p)) if p < i => {}
                (i, parent) => return Err(format!("node {i} has invalid parent {parent:?}")),
            }
            let tree = SgfTree {
                properties: node.properties,
                children: Vec::new(),
            };
            nodes.push((tree, node.parent));
        }

        // Descendants follow their ancestor in pre-order, so each popped node
        // is already complete. Siblings arrive last-first.
        while let Some((mut node, parent)) = nodes.pop() {
            node.children.reverse();
            match parent {
                Some(p) => nodes[p].0.children.push(node),
                None => return Ok(node),
            }
        }
        Err("empty tree".to_string())
    }

    /// Full SGF text of this tree, wrapped in parentheses.
    pub fn to_sgf(&self) -> String {
        to_sgf(self)
    }

    /// Read and parse an SGF file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SgfError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SgfError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        parse(&text)
    }

    /// Write this tree to `path` and return the text written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<String, SgfError> {
        let text = self.to_sgf();
        fs::write(path, &text)?;
        Ok(text)
    }
}

/// Properties compare as a mapping (key order is ignored), values and
/// children compare in order.
impl PartialEq for SgfTree {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            let same_properties = a.properties.len() == b.properties.len()
                && a
                    .properties
                    .iter()
                    .all(|(k, v)| b.get(k) == Some(v.as_slice()));
            if !same_properties || a.children.len() != b.children.len() {
                return false;
            }
            stack.extend(a.children.iter().zip(&b.children));
        }
        true
    }
}

impl Eq for SgfTree {}

impl Clone for SgfTree {
    fn clone(&self) -> Self {
        let flat = self
            .flatten()
            .into_iter()
            .map(|n| FlatNode {
                properties: n.properties.to_vec(),
                parent: n.parent,
            })
            .collect();
        // A flattened tree always rebuilds.
        SgfTree::from_flat(flat).unwrap_or_default()
    }
}

impl Drop for SgfTree {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

// -- Serde --
//
// A tree travels as a flat pre-order list of `{properties, parent}` records.

#[derive(Serialize)]
struct FlatNodeRef<'a> {
    properties: &'a [(String, Vec<String>)],
    parent: Option<usize>,
}

#[derive(Deserialize)]
struct FlatNode {
    properties: Vec<(String, Vec<String>)>,
    parent: Option<usize>,
}

impl Serialize for SgfTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.flatten().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SgfTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let flat = Vec::<FlatNode>::deserialize(deserializer)?;
        SgfTree::from_flat(flat).map_err(D::Error::custom)
    }
}

pub struct MainLine<'a> {
    next: Option<&'a SgfTree>,
}

impl<'a> Iterator for MainLine<'a> {
    type Item = &'a SgfTree;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.children.first();
        Some(node)
    }
}
