//! Logic tree model and mutations
//!
//! A logic tree is a plain ownership tree: every node owns its children and
//! nothing points back up. Mutations validate first and only then touch the
//! tree, so a failed operation leaves it exactly as it was.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Id given to the root of a freshly created tree
pub const ROOT_ID: &str = "root";

/// Node identifier, unique within a tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn root() -> Self {
        Self(ROOT_ID.to_string())
    }

    /// Fresh id for a new node: `node-<uuid>`
    pub fn generate() -> Self {
        Self(format!("node-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Who wrote a node's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeOrigin {
    /// Typed by the user
    #[default]
    Manual,
    /// Suggested by the idea generator
    Ai,
}

impl NodeOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeOrigin::Manual => "manual",
            NodeOrigin::Ai => "ai",
        }
    }
}

impl fmt::Display for NodeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeOrigin {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(NodeOrigin::Manual),
            "ai" => Ok(NodeOrigin::Ai),
            other => Err(format!("unknown origin '{}' (expected 'manual' or 'ai')", other)),
        }
    }
}

/// Where a dragged node lands relative to the drop target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    /// Last child of the target
    #[default]
    Into,
    /// Sibling immediately before the target
    Before,
    /// Sibling immediately after the target
    After,
}

impl FromStr for DropPosition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "into" => Ok(DropPosition::Into),
            "before" => Ok(DropPosition::Before),
            "after" => Ok(DropPosition::After),
            other => Err(format!("unknown drop position '{}'", other)),
        }
    }
}

/// Sibling reordering direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node '{0}' not found")]
    NodeNotFound(NodeId),

    #[error("the root node cannot be deleted, moved or given siblings")]
    RootImmutable,

    #[error("node text must not be blank")]
    EmptyText,

    #[error("cannot drop node '{0}' onto itself")]
    MoveIntoSelf(NodeId),

    #[error("cannot move '{node}' under its own descendant '{target}'")]
    MoveIntoDescendant { node: NodeId, target: NodeId },

    #[error("duplicate node id '{0}'")]
    DuplicateId(NodeId),

    #[error("node '{0}' has no sibling in that direction")]
    AtBoundary(NodeId),
}

pub type Result<T> = std::result::Result<T, TreeError>;

/// A single node and, recursively, its subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub text: String,
    #[serde(default)]
    pub origin: NodeOrigin,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(id: NodeId, text: impl Into<String>, origin: NodeOrigin) -> Self {
        Self {
            id,
            text: text.into(),
            origin,
            children: Vec::new(),
        }
    }

    /// Childless node with a generated id
    pub fn leaf(text: impl Into<String>, origin: NodeOrigin) -> Self {
        Self::new(NodeId::generate(), text, origin)
    }

    pub fn is_ai(&self) -> bool {
        self.origin == NodeOrigin::Ai
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn find(&self, id: &NodeId) -> Option<&TreeNode> {
        if self.id == *id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: &NodeId) -> Option<&mut TreeNode> {
        if self.id == *id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// True when `id` is this node or lies somewhere below it
    pub fn contains(&self, id: &NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Number of nodes in this subtree, including self
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::subtree_size).sum::<usize>()
    }
}

/// Pre-order traversal yielding `(depth, node)`
pub struct PreOrder<'a> {
    stack: Vec<(usize, &'a TreeNode)>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        for child in node.children.iter().rev() {
            self.stack.push((depth + 1, child));
        }
        Some((depth, node))
    }
}

/// A whole logic tree. Serializes as its root node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicTree {
    pub root: TreeNode,
}

impl LogicTree {
    /// Tree with a single manual root node. Blank root text is rejected.
    pub fn new(root_text: &str) -> Result<Self> {
        let text = normalize_text(root_text)?;
        Ok(Self {
            root: TreeNode::new(NodeId::root(), text, NodeOrigin::Manual),
        })
    }

    /// Wrap an existing root after checking the tree invariants
    pub fn from_root(root: TreeNode) -> Result<Self> {
        let tree = Self { root };
        tree.validate()?;
        Ok(tree)
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn is_root(&self, id: &NodeId) -> bool {
        self.root.id == *id
    }

    pub fn find(&self, id: &NodeId) -> Option<&TreeNode> {
        self.root.find(id)
    }

    pub fn find_mut(&mut self, id: &NodeId) -> Option<&mut TreeNode> {
        self.root.find_mut(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.root.contains(id)
    }

    pub fn node_count(&self) -> usize {
        self.root.subtree_size()
    }

    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            stack: vec![(0, &self.root)],
        }
    }

    /// Index path from the root down to `id` (empty for the root itself)
    pub fn path_to(&self, id: &NodeId) -> Option<Vec<usize>> {
        fn walk(node: &TreeNode, id: &NodeId, path: &mut Vec<usize>) -> bool {
            if node.id == *id {
                return true;
            }
            for (i, child) in node.children.iter().enumerate() {
                path.push(i);
                if walk(child, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        walk(&self.root, id, &mut path).then_some(path)
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<&TreeNode> {
        let mut path = self.path_to(id)?;
        path.pop()?;
        Some(self.node_at(&path))
    }

    /// Ancestors of `id`, root first, excluding the node itself
    pub fn ancestors(&self, id: &NodeId) -> Vec<&TreeNode> {
        let Some(path) = self.path_to(id) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(path.len());
        let mut node = &self.root;
        for &i in &path {
            out.push(node);
            node = &node.children[i];
        }
        out
    }

    /// Ids from the root down to and including `id`
    pub fn id_path(&self, id: &NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut ids: Vec<NodeId> = self.ancestors(id).iter().map(|n| n.id.clone()).collect();
        ids.push(id.clone());
        ids
    }

    pub fn depth_of(&self, id: &NodeId) -> Option<usize> {
        self.path_to(id).map(|p| p.len())
    }

    /// True when `id` lies in the subtree rooted at `ancestor`.
    /// A node counts as its own descendant.
    pub fn is_descendant(&self, ancestor: &NodeId, id: &NodeId) -> bool {
        self.find(ancestor).map(|a| a.contains(id)).unwrap_or(false)
    }

    /// Check id uniqueness and that no node has blank text
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (_, node) in self.iter() {
            if !seen.insert(&node.id) {
                return Err(TreeError::DuplicateId(node.id.clone()));
            }
            if node.text.trim().is_empty() {
                return Err(TreeError::EmptyText);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new leaf under `parent` and return its id
    pub fn add_child(&mut self, parent: &NodeId, text: &str, origin: NodeOrigin) -> Result<NodeId> {
        let text = normalize_text(text)?;
        let parent = self
            .find_mut(parent)
            .ok_or_else(|| TreeError::NodeNotFound(parent.clone()))?;
        let node = TreeNode::leaf(text, origin);
        let id = node.id.clone();
        parent.children.push(node);
        Ok(id)
    }

    /// Append one leaf per non-blank text
    pub fn add_children<I, S>(&mut self, parent: &NodeId, texts: I, origin: NodeOrigin) -> Result<Vec<NodeId>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parent = self
            .find_mut(parent)
            .ok_or_else(|| TreeError::NodeNotFound(parent.clone()))?;
        let new_nodes: Vec<TreeNode> = texts
            .into_iter()
            .filter_map(|t| normalize_text(t.as_ref()).ok())
            .map(|t| TreeNode::leaf(t, origin))
            .collect();
        let ids = new_nodes.iter().map(|n| n.id.clone()).collect();
        parent.children.extend(new_nodes);
        Ok(ids)
    }

    pub fn edit_text(&mut self, id: &NodeId, text: &str) -> Result<()> {
        let text = normalize_text(text)?;
        let node = self
            .find_mut(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
        node.text = text;
        Ok(())
    }

    /// Remove a node with its whole subtree and hand it back
    pub fn delete(&mut self, id: &NodeId) -> Result<TreeNode> {
        if self.is_root(id) {
            return Err(TreeError::RootImmutable);
        }
        let (parent_path, index) = self
            .locate(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
        Ok(self.node_at_mut(&parent_path).children.remove(index))
    }

    /// Drag-and-drop: move `dragged` (with its subtree) relative to `target`
    pub fn move_node(&mut self, dragged: &NodeId, target: &NodeId, position: DropPosition) -> Result<()> {
        if dragged == target {
            return Err(TreeError::MoveIntoSelf(dragged.clone()));
        }
        if !self.contains(dragged) {
            return Err(TreeError::NodeNotFound(dragged.clone()));
        }
        if !self.contains(target) {
            return Err(TreeError::NodeNotFound(target.clone()));
        }
        if self.is_root(dragged) {
            return Err(TreeError::RootImmutable);
        }
        if self.is_descendant(dragged, target) {
            return Err(TreeError::MoveIntoDescendant {
                node: dragged.clone(),
                target: target.clone(),
            });
        }
        if position != DropPosition::Into && self.is_root(target) {
            return Err(TreeError::RootImmutable);
        }

        // target is outside the dragged subtree, so it survives the detach
        let node = self.delete(dragged)?;
        match position {
            DropPosition::Into => {
                let parent = self
                    .find_mut(target)
                    .ok_or_else(|| TreeError::NodeNotFound(target.clone()))?;
                parent.children.push(node);
            }
            DropPosition::Before | DropPosition::After => {
                let (parent_path, index) = self
                    .locate(target)
                    .ok_or_else(|| TreeError::NodeNotFound(target.clone()))?;
                let at = if position == DropPosition::Before { index } else { index + 1 };
                self.node_at_mut(&parent_path).children.insert(at, node);
            }
        }
        Ok(())
    }

    /// Swap a node with its previous or next sibling
    pub fn reorder(&mut self, id: &NodeId, direction: Direction) -> Result<()> {
        if self.is_root(id) {
            return Err(TreeError::RootImmutable);
        }
        let (parent_path, index) = self
            .locate(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
        let siblings = &mut self.node_at_mut(&parent_path).children;
        let other = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < siblings.len() => index + 1,
            _ => return Err(TreeError::AtBoundary(id.clone())),
        };
        siblings.swap(index, other);
        Ok(())
    }

    /// Drop the AI-generated children of `parent` (with their subtrees) and
    /// append fresh AI leaves for `ideas`. Manual children stay put.
    pub fn replace_ai_children<S: AsRef<str>>(&mut self, parent: &NodeId, ideas: &[S]) -> Result<Vec<NodeId>> {
        let node = self
            .find_mut(parent)
            .ok_or_else(|| TreeError::NodeNotFound(parent.clone()))?;
        node.children.retain(|child| !child.is_ai());
        self.add_children(parent, ideas, NodeOrigin::Ai)
    }

    /// Append AI leaves without touching existing children
    pub fn append_ai_children<S: AsRef<str>>(&mut self, parent: &NodeId, ideas: &[S]) -> Result<Vec<NodeId>> {
        self.add_children(parent, ideas, NodeOrigin::Ai)
    }

    // ========================================================================
    // Path helpers
    // ========================================================================

    /// (path to parent, index within parent) for a non-root node
    fn locate(&self, id: &NodeId) -> Option<(Vec<usize>, usize)> {
        let mut path = self.path_to(id)?;
        let index = path.pop()?;
        Some((path, index))
    }

    fn node_at(&self, path: &[usize]) -> &TreeNode {
        let mut node = &self.root;
        for &i in path {
            node = &node.children[i];
        }
        node
    }

    fn node_at_mut(&mut self, path: &[usize]) -> &mut TreeNode {
        let mut node = &mut self.root;
        for &i in path {
            node = &mut node.children[i];
        }
        node
    }
}

fn normalize_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(TreeError::EmptyText)
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    /// root
    /// ├── a
    /// │   ├── a1
    /// │   └── a2
    /// └── b
    fn sample() -> LogicTree {
        let mut a = TreeNode::new(id("a"), "A", NodeOrigin::Manual);
        a.children.push(TreeNode::new(id("a1"), "A1", NodeOrigin::Manual));
        a.children.push(TreeNode::new(id("a2"), "A2", NodeOrigin::Ai));
        let b = TreeNode::new(id("b"), "B", NodeOrigin::Manual);
        let mut root = TreeNode::new(NodeId::root(), "Root", NodeOrigin::Manual);
        root.children = vec![a, b];
        LogicTree::from_root(root).unwrap()
    }

    fn child_ids(tree: &LogicTree, parent: &str) -> Vec<String> {
        tree.find(&id(parent))
            .unwrap()
            .children
            .iter()
            .map(|c| c.id.to_string())
            .collect()
    }

    #[test]
    fn test_new_tree_has_single_root() {
        let tree = LogicTree::new("  Increase revenue  ").unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.root().id, NodeId::root());
        assert_eq!(tree.root().text, "Increase revenue");
    }

    #[test]
    fn test_new_tree_rejects_blank_root() {
        assert_eq!(LogicTree::new("  \t "), Err(TreeError::EmptyText));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = NodeId::generate();
        let b = NodeId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("node-"));
    }

    #[test]
    fn test_iter_is_preorder_with_depth() {
        let tree = sample();
        let visited: Vec<(usize, &str)> = tree.iter().map(|(d, n)| (d, n.id.as_str())).collect();
        assert_eq!(visited, vec![(0, "root"), (1, "a"), (2, "a1"), (2, "a2"), (1, "b")]);
    }

    #[test]
    fn test_parent_and_ancestors() {
        let tree = sample();
        assert_eq!(tree.parent_of(&id("a2")).unwrap().id, id("a"));
        assert!(tree.parent_of(&NodeId::root()).is_none());
        let ancestors: Vec<&str> = tree.ancestors(&id("a1")).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ancestors, vec!["root", "a"]);
        assert_eq!(tree.id_path(&id("a1")), vec![id("root"), id("a"), id("a1")]);
        assert_eq!(tree.depth_of(&id("a1")), Some(2));
        assert_eq!(tree.depth_of(&id("zzz")), None);
    }

    #[test]
    fn test_is_descendant_includes_self() {
        let tree = sample();
        assert!(tree.is_descendant(&id("a"), &id("a")));
        assert!(tree.is_descendant(&id("a"), &id("a2")));
        assert!(!tree.is_descendant(&id("a"), &id("b")));
        assert!(!tree.is_descendant(&id("missing"), &id("a")));
    }

    #[test]
    fn test_add_child_appends_manual_leaf() {
        let mut tree = sample();
        let new_id = tree.add_child(&id("b"), " New element ", NodeOrigin::Manual).unwrap();
        let node = tree.find(&new_id).unwrap();
        assert_eq!(node.text, "New element");
        assert_eq!(node.origin, NodeOrigin::Manual);
        assert_eq!(child_ids(&tree, "b"), vec![new_id.to_string()]);
    }

    #[test]
    fn test_add_child_to_unknown_parent_fails() {
        let mut tree = sample();
        let before = tree.clone();
        let err = tree.add_child(&id("nope"), "x", NodeOrigin::Manual).unwrap_err();
        assert_eq!(err, TreeError::NodeNotFound(id("nope")));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_add_child_rejects_blank_text() {
        let mut tree = sample();
        assert_eq!(
            tree.add_child(&id("a"), "   ", NodeOrigin::Manual).unwrap_err(),
            TreeError::EmptyText
        );
    }

    #[test]
    fn test_edit_text() {
        let mut tree = sample();
        tree.edit_text(&id("a1"), "Renamed").unwrap();
        assert_eq!(tree.find(&id("a1")).unwrap().text, "Renamed");
    }

    #[test]
    fn test_edit_with_blank_text_keeps_old_text() {
        let mut tree = sample();
        assert_eq!(tree.edit_text(&id("a1"), " \t").unwrap_err(), TreeError::EmptyText);
        assert_eq!(tree.find(&id("a1")).unwrap().text, "A1");
    }

    #[test]
    fn test_delete_removes_subtree() {
        let mut tree = sample();
        let removed = tree.delete(&id("a")).unwrap();
        assert_eq!(removed.subtree_size(), 3);
        assert_eq!(tree.node_count(), 2);
        assert!(!tree.contains(&id("a1")));
    }

    #[test]
    fn test_delete_root_fails() {
        let mut tree = sample();
        assert_eq!(tree.delete(&NodeId::root()).unwrap_err(), TreeError::RootImmutable);
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_move_into_appends_to_target() {
        let mut tree = sample();
        tree.move_node(&id("a1"), &id("b"), DropPosition::Into).unwrap();
        assert_eq!(child_ids(&tree, "a"), vec!["a2"]);
        assert_eq!(child_ids(&tree, "b"), vec!["a1"]);
    }

    #[test]
    fn test_move_before_and_after() {
        let mut tree = sample();
        tree.move_node(&id("b"), &id("a2"), DropPosition::Before).unwrap();
        assert_eq!(child_ids(&tree, "a"), vec!["a1", "b", "a2"]);

        tree.move_node(&id("a1"), &id("a2"), DropPosition::After).unwrap();
        assert_eq!(child_ids(&tree, "a"), vec!["b", "a2", "a1"]);
        assert_eq!(child_ids(&tree, "root"), vec!["a"]);
    }

    #[test]
    fn test_move_within_same_parent_reorders() {
        let mut tree = sample();
        tree.move_node(&id("b"), &id("a"), DropPosition::Before).unwrap();
        assert_eq!(child_ids(&tree, "root"), vec!["b", "a"]);
    }

    #[test]
    fn test_move_into_current_parent_moves_to_end() {
        let mut tree = sample();
        tree.move_node(&id("a1"), &id("a"), DropPosition::Into).unwrap();
        assert_eq!(child_ids(&tree, "a"), vec!["a2", "a1"]);
    }

    #[test]
    fn test_move_into_descendant_is_rejected() {
        let mut tree = sample();
        let before = tree.clone();
        let err = tree.move_node(&id("a"), &id("a2"), DropPosition::Into).unwrap_err();
        assert_eq!(
            err,
            TreeError::MoveIntoDescendant {
                node: id("a"),
                target: id("a2")
            }
        );
        assert_eq!(tree, before);
    }

    #[test]
    fn test_move_onto_self_is_rejected() {
        let mut tree = sample();
        assert_eq!(
            tree.move_node(&id("a"), &id("a"), DropPosition::Into).unwrap_err(),
            TreeError::MoveIntoSelf(id("a"))
        );
    }

    #[test]
    fn test_root_cannot_move_or_get_siblings() {
        let mut tree = sample();
        assert_eq!(
            tree.move_node(&NodeId::root(), &id("b"), DropPosition::Into).unwrap_err(),
            TreeError::RootImmutable
        );
        assert_eq!(
            tree.move_node(&id("b"), &NodeId::root(), DropPosition::Before).unwrap_err(),
            TreeError::RootImmutable
        );
        // dropping into the root is fine
        tree.move_node(&id("a1"), &NodeId::root(), DropPosition::Into).unwrap();
        assert_eq!(child_ids(&tree, "root"), vec!["a", "b", "a1"]);
    }

    #[test]
    fn test_move_unknown_nodes() {
        let mut tree = sample();
        assert_eq!(
            tree.move_node(&id("x"), &id("a"), DropPosition::Into).unwrap_err(),
            TreeError::NodeNotFound(id("x"))
        );
        assert_eq!(
            tree.move_node(&id("a"), &id("y"), DropPosition::Into).unwrap_err(),
            TreeError::NodeNotFound(id("y"))
        );
    }

    #[test]
    fn test_reorder_siblings() {
        let mut tree = sample();
        tree.reorder(&id("a2"), Direction::Up).unwrap();
        assert_eq!(child_ids(&tree, "a"), vec!["a2", "a1"]);
        assert_eq!(
            tree.reorder(&id("a2"), Direction::Up).unwrap_err(),
            TreeError::AtBoundary(id("a2"))
        );
        tree.reorder(&id("a"), Direction::Down).unwrap();
        assert_eq!(child_ids(&tree, "root"), vec!["b", "a"]);
        assert_eq!(tree.reorder(&NodeId::root(), Direction::Down).unwrap_err(), TreeError::RootImmutable);
    }

    #[test]
    fn test_replace_ai_children_keeps_manual_ones() {
        let mut tree = sample();
        let ids = tree.replace_ai_children(&id("a"), &["Idea 1", " ", "Idea 2"]).unwrap();
        assert_eq!(ids.len(), 2);

        let a = tree.find(&id("a")).unwrap();
        let texts: Vec<&str> = a.children.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["A1", "Idea 1", "Idea 2"]);
        assert!(!tree.contains(&id("a2")));
        assert!(a.children[1].is_ai());
        assert!(!a.children[0].is_ai());
    }

    #[test]
    fn test_replace_ai_children_drops_their_subtrees() {
        let mut tree = sample();
        tree.add_child(&id("a2"), "Grandchild", NodeOrigin::Manual).unwrap();
        assert_eq!(tree.node_count(), 6);
        tree.replace_ai_children(&id("a"), &["Fresh"]).unwrap();
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_append_ai_children_keeps_existing() {
        let mut tree = sample();
        tree.append_ai_children(&id("a"), &["More"]).unwrap();
        assert_eq!(child_ids(&tree, "a").len(), 3);
        assert!(tree.contains(&id("a2")));
    }

    #[test]
    fn test_validate_catches_duplicates_and_blank_text() {
        let mut root = TreeNode::new(NodeId::root(), "Root", NodeOrigin::Manual);
        root.children.push(TreeNode::new(id("x"), "X", NodeOrigin::Manual));
        root.children.push(TreeNode::new(id("x"), "X again", NodeOrigin::Manual));
        assert_eq!(LogicTree::from_root(root).unwrap_err(), TreeError::DuplicateId(id("x")));

        let mut root = TreeNode::new(NodeId::root(), "Root", NodeOrigin::Manual);
        root.children.push(TreeNode::new(id("x"), "  ", NodeOrigin::Manual));
        assert_eq!(LogicTree::from_root(root).unwrap_err(), TreeError::EmptyText);
    }

    #[test]
    fn test_serializes_as_root_node() {
        let tree = sample();
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["id"], "root");
        assert_eq!(json["children"][0]["children"][1]["origin"], "ai");

        let back: LogicTree = serde_json::from_value(json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_deserialize_defaults_origin_and_children() {
        let tree: LogicTree = serde_json::from_str(r#"{"id":"root","text":"Topic"}"#).unwrap();
        assert_eq!(tree.root().origin, NodeOrigin::Manual);
        assert!(tree.root().is_leaf());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("AI".parse::<NodeOrigin>().unwrap(), NodeOrigin::Ai);
        assert_eq!(" manual".parse::<NodeOrigin>().unwrap(), NodeOrigin::Manual);
        assert!("robot".parse::<NodeOrigin>().is_err());
        assert_eq!("After".parse::<DropPosition>().unwrap(), DropPosition::After);
        assert_eq!("down".parse::<Direction>().unwrap(), Direction::Down);
    }
}
