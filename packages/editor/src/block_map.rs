//! # Block Map
//!
//! Id-keyed index of every node in a document. The map *is* the live tree:
//! each entry stores its ordered child ids, so lookup by id is O(1) and shape
//! changes touch only the entries involved.
//!
//! Mutation goes through [`BlockMapBuilder`], which stages changes on a copy
//! and materializes a fresh map on `build()`. Entries are reference-counted,
//! so the copy shares every untouched node with the source map and the source
//! stays valid until the caller swaps the new map in.
//!
//! All walks are breadth-first over an explicit queue.

use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::block::{Block, BlockData, BlockType, DocumentRoot, TreeNode};
use crate::errors::DocumentError;

/// The document root as stored in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootNode {
    pub(crate) id: String,
    pub(crate) children: Vec<String>,
}

impl RootNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }
}

/// A block as stored in the index: its own fields plus child ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNode {
    pub(crate) id: String,
    pub(crate) data: BlockData,
    pub(crate) parent_id: String,
    pub(crate) children: Option<Vec<String>>,
}

impl BlockNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &BlockData {
        &self.data
    }

    pub fn block_type(&self) -> BlockType {
        self.data.block_type()
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn children(&self) -> Option<&[String]> {
        self.children.as_deref()
    }

    /// Shallow index entry for a block; child blocks become child ids.
    fn from_block(block: &Block) -> Self {
        Self {
            id: block.id.clone(),
            data: block.data.clone(),
            parent_id: block.parent_id.clone(),
            children: block
                .children
                .as_ref()
                .map(|children| children.iter().map(|c| c.id.clone()).collect()),
        }
    }
}

/// Entry of the index: the root or a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Root(RootNode),
    Block(BlockNode),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Root(root) => &root.id,
            Node::Block(block) => &block.id,
        }
    }

    /// `None` for the root.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Node::Root(_) => None,
            Node::Block(block) => Some(&block.parent_id),
        }
    }

    pub fn children(&self) -> Option<&[String]> {
        match self {
            Node::Root(root) => Some(&root.children),
            Node::Block(block) => block.children(),
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<String>> {
        match self {
            Node::Root(root) => Some(&mut root.children),
            Node::Block(block) => block.children.as_mut(),
        }
    }

    pub fn as_block(&self) -> Option<&BlockNode> {
        match self {
            Node::Block(block) => Some(block),
            Node::Root(_) => None,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Node::Root(_))
    }
}

/// True for the root always; for a block, iff its type is children-capable.
pub fn block_can_have_children(node: &Node) -> bool {
    match node {
        Node::Root(_) => true,
        Node::Block(block) => block.block_type().can_have_children(),
    }
}

/// Id → node index covering the root and every block reachable from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMap {
    nodes: HashMap<String, Rc<Node>>,
}

impl BlockMap {
    /// Index holding only an empty root.
    pub fn with_root(root_id: &str) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            root_id.to_string(),
            Rc::new(Node::Root(RootNode {
                id: root_id.to_string(),
                children: Vec::new(),
            })),
        );
        Self { nodes }
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id).map(Rc::as_ref)
    }

    pub fn get_block(&self, id: &str) -> Option<&BlockNode> {
        self.get(id).and_then(Node::as_block)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().map(Rc::as_ref)
    }

    /// Whether `ancestor_id` is on the parent chain of `id` (walking up to the root).
    pub fn is_ancestor(&self, ancestor_id: &str, id: &str) -> bool {
        let mut current = self.get(id).and_then(Node::parent_id);
        let mut steps = 0;
        while let Some(parent_id) = current {
            if parent_id == ancestor_id {
                return true;
            }
            // a corrupted parent chain must not spin forever
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            current = self.get(parent_id).and_then(Node::parent_id);
        }
        false
    }

    /// Ids of `id` and all of its descendants, breadth-first.
    pub fn subtree_ids(&self, id: &str) -> Vec<String> {
        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([id.to_string()]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(children) = self.get(&current).and_then(Node::children) {
                queue.extend(children.iter().cloned());
            }
            ids.push(current);
        }

        ids
    }

    /// Materialize owned, nested blocks for the given top-level ids.
    pub fn materialize(&self, ids: &[String]) -> Result<Vec<Block>, DocumentError> {
        materialize(ids, |id| self.get_block(id))
    }

    /// Materialize the whole tree under `root_id`.
    pub fn to_root(&self, root_id: &str) -> Result<DocumentRoot, DocumentError> {
        let children = match self.get(root_id) {
            Some(Node::Root(root)) => self.materialize(&root.children)?,
            _ => {
                return Err(DocumentError::IndexOutOfSync {
                    block_id: root_id.to_string(),
                })
            }
        };

        Ok(DocumentRoot {
            id: root_id.to_string(),
            children,
        })
    }
}

/// Breadth-first build of the index for `root`. Every reachable node is
/// inserted exactly once, keyed by its id.
pub fn build_index_from_root(root: &DocumentRoot) -> BlockMap {
    let mut builder = BlockMapBuilder::new(&BlockMap::default()).add_block(Node::Root(RootNode {
        id: root.id.clone(),
        children: root.children.iter().map(|c| c.id.clone()).collect(),
    }));

    let mut queue: VecDeque<&Block> = root.children.iter().collect();
    while let Some(block) = queue.pop_front() {
        builder = builder.add_block(Node::Block(BlockNode::from_block(block)));
        queue.extend(block.child_blocks());
    }

    builder.build()
}

/// Breadth-first build of the index straight from a document value that
/// already passed [`validate_document_value`](crate::validate_document_value).
///
/// No nested `DocumentRoot` is deserialized, so nesting depth costs heap, not
/// stack.
pub fn build_index_from_value(value: &Value, root_id: &str) -> Result<BlockMap, DocumentError> {
    let structure = |reason: String| DocumentError::InvalidDocumentStructure { reason };
    let child_ids = |children: &[Value]| -> Vec<String> {
        children
            .iter()
            .filter_map(|child| child.get("id").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    };

    let root_children = value
        .get("children")
        .and_then(Value::as_array)
        .ok_or_else(|| structure("root must have a children array".to_string()))?;
    let mut builder = BlockMapBuilder::new(&BlockMap::default()).add_block(Node::Root(RootNode {
        id: root_id.to_string(),
        children: child_ids(root_children),
    }));

    let mut queue: VecDeque<(&Value, &str)> =
        root_children.iter().map(|child| (child, root_id)).collect();
    while let Some((block, parent_id)) = queue.pop_front() {
        let id = block
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| structure(format!("block under {parent_id:?} has no id")))?;

        let mut envelope = Map::new();
        for key in ["type", "data"] {
            if let Some(field) = block.get(key) {
                envelope.insert(key.to_string(), field.clone());
            }
        }
        let data: BlockData = serde_json::from_value(Value::Object(envelope))
            .map_err(|e| structure(format!("block {id:?}: {e}")))?;

        let children = block.get("children").and_then(Value::as_array);
        builder = builder.add_block(Node::Block(BlockNode {
            id: id.to_string(),
            data,
            parent_id: parent_id.to_string(),
            children: children.map(|c| child_ids(c)),
        }));
        if let Some(children) = children {
            queue.extend(children.iter().map(|child| (child, id)));
        }
    }

    Ok(builder.build())
}

/// Visit every node of a forest breadth-first, level by level.
///
/// Pass a node's children to visit its descendants without the node itself.
pub fn traverse<'a, N: TreeNode>(nodes: &'a [N], mut visit: impl FnMut(&'a N)) {
    let mut queue: VecDeque<&'a N> = nodes.iter().collect();
    while let Some(node) = queue.pop_front() {
        visit(node);
        queue.extend(node.child_nodes());
    }
}

/// Assemble nested blocks bottom-up from flat nodes.
///
/// Nodes are collected breadth-first, then built in reverse order so every
/// node's children exist by the time the node itself is built.
pub(crate) fn materialize<'a>(
    ids: &[String],
    lookup: impl Fn(&str) -> Option<&'a BlockNode>,
) -> Result<Vec<Block>, DocumentError> {
    let mut order: Vec<&'a BlockNode> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = ids.iter().map(String::as_str).collect();

    while let Some(id) = queue.pop_front() {
        let node = lookup(id).ok_or_else(|| DocumentError::IndexOutOfSync {
            block_id: id.to_string(),
        })?;
        if !seen.insert(node.id.as_str()) {
            return Err(DocumentError::IndexOutOfSync {
                block_id: id.to_string(),
            });
        }
        if let Some(children) = &node.children {
            queue.extend(children.iter().map(String::as_str));
        }
        order.push(node);
    }

    let mut built: HashMap<&str, Block> = HashMap::with_capacity(order.len());
    for node in order.into_iter().rev() {
        let children = match &node.children {
            Some(child_ids) => Some(take_built(&mut built, child_ids)?),
            None => None,
        };
        built.insert(
            node.id.as_str(),
            Block {
                id: node.id.clone(),
                data: node.data.clone(),
                parent_id: node.parent_id.clone(),
                children,
            },
        );
    }

    take_built(&mut built, ids)
}

fn take_built(built: &mut HashMap<&str, Block>, ids: &[String]) -> Result<Vec<Block>, DocumentError> {
    ids.iter()
        .map(|id| {
            built
                .remove(id.as_str())
                .ok_or_else(|| DocumentError::IndexOutOfSync { block_id: id.clone() })
        })
        .collect()
}

/// Staged edit of a [`BlockMap`].
///
/// Each operation consumes and returns the builder so edits chain;
/// `build()` yields the new map and leaves the source map untouched.
#[derive(Debug, Clone)]
pub struct BlockMapBuilder {
    nodes: HashMap<String, Rc<Node>>,
}

impl BlockMapBuilder {
    pub fn new(map: &BlockMap) -> Self {
        Self {
            nodes: map.nodes.clone(),
        }
    }

    /// Insert one node under its own id. Its children are not touched.
    pub fn add_block(mut self, node: Node) -> Self {
        self.nodes.insert(node.id().to_string(), Rc::new(node));
        self
    }

    /// Insert `block` and all of its descendants.
    pub fn add_subtree(mut self, block: &Block) -> Self {
        traverse(std::slice::from_ref(block), |b| {
            self.nodes
                .insert(b.id.clone(), Rc::new(Node::Block(BlockNode::from_block(b))));
        });
        self
    }

    /// Remove only `id`. Its children stay in the map as orphaned entries.
    pub fn remove(mut self, id: &str) -> Self {
        self.nodes.remove(id);
        self
    }

    /// Remove `id` and all of its descendants.
    pub fn remove_subtree(mut self, id: &str) -> Self {
        let mut queue = VecDeque::from([id.to_string()]);
        while let Some(current) = queue.pop_front() {
            if let Some(node) = self.nodes.remove(&current) {
                if let Some(children) = node.children() {
                    queue.extend(children.iter().cloned());
                }
            }
        }
        self
    }

    /// Insert `child_id` into `parent_id`'s children at `index` (clamped).
    pub fn insert_child(mut self, parent_id: &str, index: usize, child_id: &str) -> Self {
        if let Some(children) = self.children_mut(parent_id) {
            let index = index.min(children.len());
            children.insert(index, child_id.to_string());
        }
        self
    }

    /// Insert `child_id` next to `sibling_id` in `parent_id`'s children.
    /// Appends when the sibling is not listed.
    pub fn insert_child_beside(
        mut self,
        parent_id: &str,
        sibling_id: &str,
        after: bool,
        child_id: &str,
    ) -> Self {
        if let Some(children) = self.children_mut(parent_id) {
            let index = match children.iter().position(|c| c == sibling_id) {
                Some(i) if after => i + 1,
                Some(i) => i,
                None => children.len(),
            };
            children.insert(index, child_id.to_string());
        }
        self
    }

    /// Drop `child_id` from `parent_id`'s children.
    pub fn detach_child(mut self, parent_id: &str, child_id: &str) -> Self {
        if let Some(children) = self.children_mut(parent_id) {
            children.retain(|c| c != child_id);
        }
        self
    }

    /// Put `new_id` in the slot `old_id` occupies among `parent_id`'s children.
    pub fn replace_child(mut self, parent_id: &str, old_id: &str, new_id: &str) -> Self {
        if let Some(children) = self.children_mut(parent_id) {
            if let Some(slot) = children.iter_mut().find(|c| c.as_str() == old_id) {
                *slot = new_id.to_string();
            }
        }
        self
    }

    /// Point each listed block's `parent_id` at `parent_id`.
    pub fn reparent(mut self, ids: &[String], parent_id: &str) -> Self {
        for id in ids {
            if let Some(entry) = self.nodes.get_mut(id) {
                if let Node::Block(block) = Rc::make_mut(entry) {
                    block.parent_id = parent_id.to_string();
                }
            }
        }
        self
    }

    pub fn build(self) -> BlockMap {
        BlockMap { nodes: self.nodes }
    }

    fn children_mut(&mut self, parent_id: &str) -> Option<&mut Vec<String>> {
        self.nodes
            .get_mut(parent_id)
            .and_then(|entry| Rc::make_mut(entry).children_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockData;

    fn block(id: &str, parent: &str, data: BlockData, children: Option<Vec<Block>>) -> Block {
        Block {
            id: id.to_string(),
            data,
            parent_id: parent.to_string(),
            children,
        }
    }

    fn sample_root() -> DocumentRoot {
        DocumentRoot {
            id: "root".to_string(),
            children: vec![
                block(
                    "list",
                    "root",
                    BlockData::bullet_list("items"),
                    Some(vec![
                        block("a", "list", BlockData::text("a"), None),
                        block(
                            "toggle",
                            "list",
                            BlockData::toggle_list("more", true),
                            Some(vec![block("deep", "toggle", BlockData::quote("q"), None)]),
                        ),
                    ]),
                ),
                block("h", "root", BlockData::heading("Title", 1), None),
            ],
        }
    }

    #[test]
    fn test_build_index_covers_every_node_once() {
        let map = build_index_from_root(&sample_root());

        assert_eq!(map.len(), 6);
        for id in ["root", "list", "a", "toggle", "deep", "h"] {
            assert!(map.contains(id), "missing {id}");
        }
        assert!(map.get("root").unwrap().is_root());
        assert_eq!(
            map.get("list").unwrap().children().unwrap(),
            &["a".to_string(), "toggle".to_string()]
        );
        assert_eq!(map.get_block("deep").unwrap().parent_id(), "toggle");
    }

    #[test]
    fn test_traverse_is_breadth_first() {
        let root = sample_root();
        let mut visited = Vec::new();
        traverse(&root.children, |b| visited.push(b.id.clone()));

        assert_eq!(visited, vec!["list", "h", "a", "toggle", "deep"]);
    }

    #[test]
    fn test_materialize_round_trips_tree() {
        let root = sample_root();
        let map = build_index_from_root(&root);

        assert_eq!(map.to_root("root").unwrap(), root);
    }

    #[test]
    fn test_builder_leaves_source_untouched() {
        let map = build_index_from_root(&sample_root());
        let next = BlockMapBuilder::new(&map)
            .detach_child("root", "list")
            .remove_subtree("list")
            .build();

        assert_eq!(map.len(), 6);
        assert_eq!(next.len(), 2);
        assert!(next.contains("h"));
        assert!(!next.contains("deep"));
        assert_eq!(next.get("root").unwrap().children().unwrap(), &["h".to_string()]);
    }

    #[test]
    fn test_shallow_remove_orphans_children() {
        let map = build_index_from_root(&sample_root());
        let next = BlockMapBuilder::new(&map).remove("toggle").build();

        assert!(!next.contains("toggle"));
        assert!(next.contains("deep"));
    }

    #[test]
    fn test_add_subtree_and_reparent() {
        let map = build_index_from_root(&sample_root());
        let graft = block(
            "t2",
            "root",
            BlockData::toggle_list("new", false),
            Some(vec![block("t2-a", "t2", BlockData::text("x"), None)]),
        );

        let next = BlockMapBuilder::new(&map)
            .add_subtree(&graft)
            .insert_child_beside("root", "list", true, "t2")
            .reparent(&["a".to_string()], "t2")
            .build();

        assert_eq!(
            next.get("root").unwrap().children().unwrap(),
            &["list".to_string(), "t2".to_string(), "h".to_string()]
        );
        assert!(next.contains("t2-a"));
        assert_eq!(next.get_block("a").unwrap().parent_id(), "t2");
        assert_eq!(map.get_block("a").unwrap().parent_id(), "list");
    }

    #[test]
    fn test_is_ancestor_walks_parent_chain() {
        let map = build_index_from_root(&sample_root());

        assert!(map.is_ancestor("list", "deep"));
        assert!(map.is_ancestor("root", "deep"));
        assert!(!map.is_ancestor("deep", "list"));
        assert!(!map.is_ancestor("h", "a"));
    }

    #[test]
    fn test_materialize_reports_dangling_child() {
        let map = build_index_from_root(&sample_root());
        let broken = BlockMapBuilder::new(&map).remove("deep").build();

        assert!(matches!(
            broken.to_root("root"),
            Err(DocumentError::IndexOutOfSync { block_id }) if block_id == "deep"
        ));
    }

    #[test]
    fn test_capability_check() {
        let map = build_index_from_root(&sample_root());

        assert!(block_can_have_children(map.get("root").unwrap()));
        assert!(block_can_have_children(map.get("toggle").unwrap()));
        assert!(!block_can_have_children(map.get("h").unwrap()));
    }
}
