use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hash::Hash;

/// position of a node inside a [`Tree`] arena
pub type NodeId = usize;

/// a single directory or file node
///
/// directories carry children and no hash, files carry a hash and no children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<Hash>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeId>,
}

impl TreeNode {
    fn new(name: impl Into<String>, hash: Option<Hash>) -> Self {
        Self {
            name: name.into(),
            hash,
            children: vec![],
        }
    }

    /// child ids in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// is this node a file
    pub fn is_file(&self) -> bool {
        self.hash.is_some() && self.children.is_empty()
    }

    /// is this node a directory
    pub fn is_directory(&self) -> bool {
        !self.is_file()
    }
}

/// snapshot hierarchy built from flat `(path, hash)` pairs
///
/// nodes live in one vector; node 0 is the root and every child is pushed
/// after its parent, so child ids are always greater than their parent's.
/// sibling identity is by name only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TreeNode>", into = "Vec<TreeNode>")]
pub struct Tree {
    nodes: Vec<TreeNode>,
    lookup: HashMap<(NodeId, String), NodeId>,
}

impl Tree {
    /// id of the root node
    pub const ROOT: NodeId = 0;

    /// name given to the root directory
    pub const ROOT_NAME: &'static str = ".";

    /// create a tree holding only the root directory
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::new(Self::ROOT_NAME, None)],
            lookup: HashMap::new(),
        }
    }

    /// build a tree from flat entries, in iteration order
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Hash)>,
    {
        let mut tree = Self::new();
        for (path, hash) in entries {
            tree.add_entry(path, hash);
        }
        tree
    }

    /// insert a file at a `/` separated path
    ///
    /// intermediate directories are found by name or created. a leaf whose
    /// name already exists at that level takes over the existing node.
    /// empty paths are ignored.
    pub fn add_entry(&mut self, path: &str, hash: Hash) {
        let components: Vec<&str> = path
            .split('/')
            .filter(|c| !c.is_empty() && *c != ".")
            .collect();
        let Some((leaf, dirs)) = components.split_last() else {
            return;
        };

        let mut current = Self::ROOT;
        for dir in dirs {
            current = match self.child(current, dir) {
                Some(id) => id,
                None => self.push_node(current, dir, None),
            };
        }

        match self.child(current, leaf) {
            Some(id) => self.nodes[id].hash = Some(hash),
            None => {
                self.push_node(current, leaf, Some(hash));
            }
        }
    }

    /// node by id
    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    /// the root directory node
    pub fn root(&self) -> &TreeNode {
        &self.nodes[Self::ROOT]
    }

    /// find a direct child of `parent` by name
    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.lookup.get(&(parent, name.to_string())).copied()
    }

    /// look up the hash of the file at `path`
    pub fn get(&self, path: &str) -> Option<Hash> {
        let mut current = Self::ROOT;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            current = self.child(current, component)?;
        }
        let node = &self.nodes[current];
        if node.is_file() {
            node.hash
        } else {
            None
        }
    }

    /// number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// true when the root has no children
    pub fn is_empty(&self) -> bool {
        self.nodes[Self::ROOT].children.is_empty()
    }

    /// flatten back into `(path, hash)` pairs, depth first in child order
    pub fn files(&self) -> Vec<(String, Hash)> {
        let mut files = Vec::new();
        let mut stack: Vec<(NodeId, String)> = self.nodes[Self::ROOT]
            .children
            .iter()
            .rev()
            .map(|&id| (id, self.nodes[id].name.clone()))
            .collect();

        while let Some((id, path)) = stack.pop() {
            let node = &self.nodes[id];
            if node.is_file() {
                if let Some(hash) = node.hash {
                    files.push((path, hash));
                }
                continue;
            }
            for &child in node.children.iter().rev() {
                stack.push((child, format!("{}/{}", path, self.nodes[child].name)));
            }
        }

        files
    }

    fn push_node(&mut self, parent: NodeId, name: &str, hash: Option<Hash>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TreeNode::new(name, hash));
        self.nodes[parent].children.push(id);
        self.lookup.insert((parent, name.to_string()), id);
        id
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<TreeNode>> for Tree {
    type Error = String;

    fn try_from(nodes: Vec<TreeNode>) -> Result<Self, Self::Error> {
        if nodes.is_empty() {
            return Err("tree has no root node".to_string());
        }

        let mut lookup = HashMap::new();
        let mut has_parent = vec![false; nodes.len()];
        for (parent, node) in nodes.iter().enumerate() {
            if node.hash.is_some() && !node.children.is_empty() {
                return Err(format!("node {} is both a file and a directory", parent));
            }
            for &child in &node.children {
                if child <= parent || child >= nodes.len() {
                    return Err(format!("invalid child id {} under node {}", child, parent));
                }
                if std::mem::replace(&mut has_parent[child], true) {
                    return Err(format!("node {} has more than one parent", child));
                }
                let name = &nodes[child].name;
                if !is_valid_name(name) {
                    return Err(format!("invalid entry name {:?}", name));
                }
                if lookup.insert((parent, name.clone()), child).is_some() {
                    return Err(format!("duplicate child name {:?}", name));
                }
            }
        }
        if let Some(orphan) = (1..nodes.len()).find(|&id| !has_parent[id]) {
            return Err(format!("node {} is not reachable from the root", orphan));
        }

        Ok(Self { nodes, lookup })
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/') && !name.contains('\0')
}

impl From<Tree> for Vec<TreeNode> {
    fn from(tree: Tree) -> Self {
        tree.nodes
    }
}

/// box-drawing rendering, one node per line
impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root().name)?;

        // (node, prefix for its children, is last sibling)
        let mut stack: Vec<(NodeId, String, bool)> = Vec::new();
        let push_children = |stack: &mut Vec<(NodeId, String, bool)>, id: NodeId, prefix: &str| {
            let children = &self.nodes[id].children;
            for (i, &child) in children.iter().enumerate().rev() {
                stack.push((child, prefix.to_string(), i == children.len() - 1));
            }
        };
        push_children(&mut stack, Self::ROOT, "");

        while let Some((id, prefix, is_last)) = stack.pop() {
            let branch = if is_last { "└── " } else { "├── " };
            write!(f, "\n{}{}{}", prefix, branch, self.nodes[id].name)?;

            let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
            push_children(&mut stack, id, &child_prefix);
        }

        Ok(())
    }
}
