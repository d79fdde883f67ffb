//! Lookup trees used by the base-info step: data-grade labels and the department hierarchy.

use serde::{Deserialize, Serialize};

/// Common read access to the recursive lookup trees.
pub trait TreeNode: Sized {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn children(&self) -> &[Self];

    /// Depth-first search for a node by id.
    fn find(&self, id: &str) -> Option<&Self> {
        if self.id() == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    /// Names from this node down to the node with `id`, inclusive.
    fn path_names(&self, id: &str) -> Option<Vec<String>> {
        if self.id() == id {
            return Some(vec![self.name().to_string()]);
        }
        for child in self.children() {
            if let Some(mut tail) = child.path_names(id) {
                tail.insert(0, self.name().to_string());
                return Some(tail);
            }
        }
        None
    }
}

/// Searches a forest of roots for `id`.
pub fn find_in<'a, T: TreeNode>(roots: &'a [T], id: &str) -> Option<&'a T> {
    roots.iter().find_map(|root| root.find(id))
}

/// Node of the data-grade label tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelNode {
    pub id: String,
    pub name: String,
    /// Display colour for the grade tag.
    #[serde(default)]
    pub color: Option<String>,
    /// Group nodes only organise labels and cannot be selected.
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub children: Vec<LabelNode>,
}

impl TreeNode for LabelNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

/// Node of the organisational department tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub children: Vec<DepartmentNode>,
}

impl TreeNode for DepartmentNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}
