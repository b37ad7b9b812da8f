//! # Editor Document
//!
//! The mutable aggregate: a root id plus the [`BlockMap`] arena holding the
//! live tree. Every mutation validates fully, stages its edits on a
//! [`BlockMapBuilder`] and swaps the built map in at the end, so a failed call
//! leaves the document exactly as it was.
//!
//! Reads never hand out the live entries mutably: [`EditorDocument::get_root`]
//! and [`EditorDocument::get_block`] materialize owned snapshots, and the
//! index is only reachable through shared references.
//!
//! ## Lifecycle
//!
//! ```text
//! JSON / DocumentRoot ─validate─▶ BlockMap ─mutate (builder)─▶ BlockMap ─materialize─▶ JSON
//! ```

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::actions::{ChildrenStrategy, InsertStrategy};
use crate::block::{Block, BlockPayload, DocumentRoot, ROOT_ID};
use crate::block_map::{
    block_can_have_children, build_index_from_root, build_index_from_value, traverse, BlockMap,
    BlockMapBuilder, BlockNode, Node,
};
use crate::errors::DocumentError;
use crate::validators::{validate_block_data, validate_document_value, validate_payload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorDocument {
    root_id: String,
    index: BlockMap,
}

impl EditorDocument {
    /// Empty document under the default root id.
    pub fn new() -> Self {
        Self::with_root_id(ROOT_ID)
    }

    /// Empty document under a custom root id.
    pub fn with_root_id(root_id: impl Into<String>) -> Self {
        let root_id = root_id.into();
        Self {
            index: BlockMap::with_root(&root_id),
            root_id,
        }
    }

    /// Build from an owned tree, running the same checks as JSON import.
    pub fn from_root(root: &DocumentRoot) -> Result<Self, DocumentError> {
        let value = serde_json::to_value(root).map_err(|e| DocumentError::Serialization {
            reason: e.to_string(),
        })?;
        validate_document_value(&value, &root.id)?;

        Ok(Self {
            root_id: root.id.clone(),
            index: build_index_from_root(root),
        })
    }

    /// Parse and validate a serialized document rooted at the default root id.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Self::from_json_with_root_id(json, ROOT_ID)
    }

    pub fn from_json_with_root_id(json: &str, root_id: &str) -> Result<Self, DocumentError> {
        let value = parse_json(json).map_err(|e| DocumentError::InvalidDocumentJson {
            reason: e.to_string(),
        })?;
        validate_document_value(&value, root_id)?;

        let index = build_index_from_value(&value, root_id)?;
        debug!(root_id = %root_id, size = index.len(), "document hydrated from json");

        Ok(Self {
            root_id: root_id.to_string(),
            index,
        })
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string(&self.get_root()?).map_err(|e| DocumentError::Serialization {
            reason: e.to_string(),
        })
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Owned snapshot of the whole tree.
    pub fn get_root(&self) -> Result<DocumentRoot, DocumentError> {
        self.index.to_root(&self.root_id)
    }

    /// Owned snapshot of one block and its subtree. `None` for unknown ids and the root.
    pub fn get_block(&self, id: &str) -> Result<Option<Block>, DocumentError> {
        if self.index.get_block(id).is_none() {
            return Ok(None);
        }
        Ok(self.index.materialize(&[id.to_string()])?.into_iter().next())
    }

    pub fn get_block_or_root(&self, id: &str) -> Option<&Node> {
        self.index.get(id)
    }

    pub fn index(&self) -> &BlockMap {
        &self.index
    }

    /// Number of tracked ids, the root included.
    pub fn size(&self) -> usize {
        self.index.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Append `payload` as the last child of `parent_id`.
    pub fn append_child(
        &mut self,
        parent_id: &str,
        payload: &BlockPayload,
    ) -> Result<(), DocumentError> {
        let parent = self
            .index
            .get(parent_id)
            .ok_or_else(|| DocumentError::ParentBlockNotFound {
                parent_id: parent_id.to_string(),
            })?;
        if !block_can_have_children(parent) {
            return Err(DocumentError::ParentBlockCannotHaveChildren {
                parent_id: parent_id.to_string(),
            });
        }
        self.check_new_subtree(payload)?;

        self.index = add_payload(BlockMapBuilder::new(&self.index), payload, parent_id)
            .insert_child(parent_id, usize::MAX, &payload.id)
            .build();

        debug!(block_id = %payload.id, parent_id = %parent_id, "block appended");
        Ok(())
    }

    /// Place `payload` before or after `target_id`, or append it to `target_id`.
    pub fn insert_relative(
        &mut self,
        target_id: &str,
        strategy: InsertStrategy,
        payload: &BlockPayload,
    ) -> Result<(), DocumentError> {
        if strategy == InsertStrategy::Append {
            return self.append_child(target_id, payload);
        }

        let target = self
            .index
            .get(target_id)
            .ok_or_else(|| DocumentError::BlockNotFound {
                block_id: target_id.to_string(),
            })?;
        let parent_id = match target.parent_id() {
            Some(parent_id) => parent_id.to_string(),
            None => return Err(DocumentError::relative_to_root(strategy, &self.root_id)),
        };
        self.check_parent(&parent_id)?;
        self.check_new_subtree(payload)?;

        self.index = add_payload(BlockMapBuilder::new(&self.index), payload, &parent_id)
            .insert_child_beside(
                &parent_id,
                target_id,
                strategy == InsertStrategy::After,
                &payload.id,
            )
            .build();

        debug!(block_id = %payload.id, target_id = %target_id, %strategy, "block inserted");
        Ok(())
    }

    /// Remove `block_id` and its whole subtree.
    pub fn remove_block(&mut self, block_id: &str) -> Result<(), DocumentError> {
        if block_id == self.root_id {
            return Err(DocumentError::CannotRemoveRoot {
                root_id: self.root_id.clone(),
            });
        }

        let block = self
            .index
            .get_block(block_id)
            .ok_or_else(|| DocumentError::BlockToRemoveNotFound {
                block_id: block_id.to_string(),
            })?;
        let parent_id = block.parent_id();
        let parent = self
            .index
            .get(parent_id)
            .ok_or_else(|| DocumentError::BlockToRemoveHasNoParent {
                block_id: block_id.to_string(),
                parent_id: parent_id.to_string(),
            })?;
        let listed = parent
            .children()
            .is_some_and(|children| children.iter().any(|c| c == block_id));
        if !listed {
            return Err(DocumentError::ParentOfBlockHasNoChildren {
                block_id: block_id.to_string(),
                parent_id: parent_id.to_string(),
            });
        }

        let parent_id = parent_id.to_string();
        self.index = BlockMapBuilder::new(&self.index)
            .detach_child(&parent_id, block_id)
            .remove_subtree(block_id)
            .build();

        debug!(block_id = %block_id, "block removed");
        Ok(())
    }

    /// Move `block_id` next to `target_id`, or to the end of the root with `append`.
    pub fn move_block(
        &mut self,
        block_id: &str,
        target_id: &str,
        strategy: InsertStrategy,
    ) -> Result<(), DocumentError> {
        if block_id == self.root_id {
            return Err(DocumentError::CannotMoveRoot {
                root_id: self.root_id.clone(),
            });
        }
        let block = self
            .index
            .get_block(block_id)
            .ok_or_else(|| DocumentError::BlockNotFound {
                block_id: block_id.to_string(),
            })?;
        if block_id == target_id {
            return Err(DocumentError::CannotMoveBlockToItself {
                block_id: block_id.to_string(),
            });
        }
        let target = self
            .index
            .get(target_id)
            .ok_or_else(|| DocumentError::BlockNotFound {
                block_id: target_id.to_string(),
            })?;
        if self.index.is_ancestor(block_id, target_id) {
            return Err(DocumentError::CannotMoveBlockToDescendant {
                block_id: block_id.to_string(),
                target_id: target_id.to_string(),
            });
        }

        let old_parent_id = block.parent_id().to_string();
        let builder = match strategy {
            InsertStrategy::Append => {
                if target_id != self.root_id {
                    return Err(DocumentError::CanOnlyAppendToRoot {
                        block_id: block_id.to_string(),
                        target_id: target_id.to_string(),
                    });
                }
                BlockMapBuilder::new(&self.index)
                    .detach_child(&old_parent_id, block_id)
                    .reparent(&[block_id.to_string()], &self.root_id)
                    .insert_child(&self.root_id, usize::MAX, block_id)
            }
            InsertStrategy::Before | InsertStrategy::After => {
                let new_parent_id = match target.parent_id() {
                    Some(parent_id) => parent_id.to_string(),
                    None => return Err(DocumentError::relative_to_root(strategy, &self.root_id)),
                };
                self.check_parent(&new_parent_id)?;

                BlockMapBuilder::new(&self.index)
                    .detach_child(&old_parent_id, block_id)
                    .reparent(&[block_id.to_string()], &new_parent_id)
                    .insert_child_beside(
                        &new_parent_id,
                        target_id,
                        strategy == InsertStrategy::After,
                        block_id,
                    )
            }
        };

        self.index = builder.build();
        debug!(block_id = %block_id, target_id = %target_id, %strategy, "block moved");
        Ok(())
    }

    /// Replace `block_id` with `payload`, handling the old children per `strategy`.
    ///
    /// The new block takes the old block's slot in its parent.
    pub fn update_block(
        &mut self,
        block_id: &str,
        payload: &BlockPayload,
        strategy: ChildrenStrategy,
    ) -> Result<(), DocumentError> {
        if block_id == self.root_id {
            return Err(DocumentError::CannotUpdateRoot {
                root_id: self.root_id.clone(),
            });
        }
        let old = self
            .index
            .get_block(block_id)
            .ok_or_else(|| DocumentError::BlockNotFound {
                block_id: block_id.to_string(),
            })?;
        let parent_id = old.parent_id().to_string();
        if !self.index.contains(&parent_id) {
            return Err(DocumentError::ParentBlockNotFound { parent_id });
        }

        let builder = match strategy {
            ChildrenStrategy::Drop => {
                let own = without_children(payload);
                validate_payload(&own, &self.root_id)?;
                self.check_replacement_id(block_id, &own.id, true)?;

                add_payload(
                    BlockMapBuilder::new(&self.index).remove_subtree(block_id),
                    &own,
                    &parent_id,
                )
            }
            ChildrenStrategy::Preserve => {
                let new_type = payload.block_type();
                if !old.block_type().can_have_children() || !new_type.can_have_children() {
                    return Err(DocumentError::IncompatibleChildrenStrategy {
                        block_id: block_id.to_string(),
                        strategy,
                        old_type: old.block_type(),
                        new_type,
                    });
                }
                let own = without_children(payload);
                validate_payload(&own, &self.root_id)?;
                self.check_replacement_id(block_id, &own.id, false)?;

                let kept: Vec<String> = old.children().map(<[String]>::to_vec).unwrap_or_default();
                BlockMapBuilder::new(&self.index)
                    .remove(block_id)
                    .add_block(Node::Block(BlockNode {
                        id: own.id.clone(),
                        data: own.data.clone(),
                        parent_id: parent_id.clone(),
                        children: Some(kept.clone()),
                    }))
                    .reparent(&kept, &own.id)
            }
            ChildrenStrategy::Replace => {
                self.check_replacement_children(block_id, payload)?;
                validate_payload(payload, &self.root_id)?;
                self.check_replacement_id(block_id, &payload.id, true)?;

                add_payload(
                    BlockMapBuilder::new(&self.index).remove_subtree(block_id),
                    payload,
                    &parent_id,
                )
            }
        };

        self.index = builder
            .replace_child(&parent_id, block_id, &payload.id)
            .build();

        debug!(block_id = %block_id, new_block_id = %payload.id, %strategy, "block updated");
        Ok(())
    }

    /// Verify the structural invariants on the live arena: every id unique
    /// (the root id included), parent links matching structure, `children`
    /// present exactly on capable blocks, no cycles, and no entry in the
    /// index that is unreachable from the root.
    pub fn check_invariants(&self) -> Result<(), DocumentError> {
        let out_of_sync = |id: &str| DocumentError::IndexOutOfSync {
            block_id: id.to_string(),
        };

        let root = match self.index.get(&self.root_id) {
            Some(Node::Root(root)) if root.id() == self.root_id => root,
            _ => return Err(out_of_sync(&self.root_id)),
        };

        let mut seen: HashSet<&str> = HashSet::from([self.root_id.as_str()]);
        let mut queue: VecDeque<(&str, &str)> = root
            .children()
            .iter()
            .map(|id| (id.as_str(), self.root_id.as_str()))
            .collect();

        while let Some((id, parent_id)) = queue.pop_front() {
            if id == self.root_id {
                return Err(DocumentError::ReservedBlockId {
                    block_id: id.to_string(),
                });
            }
            let block = self.index.get_block(id).ok_or_else(|| out_of_sync(id))?;
            if !seen.insert(block.id()) {
                return Err(DocumentError::BlockAlreadyExists {
                    block_id: id.to_string(),
                });
            }
            if block.parent_id() != parent_id {
                return Err(DocumentError::ParentLinkMismatch {
                    block_id: id.to_string(),
                    declared_parent_id: block.parent_id().to_string(),
                    actual_parent_id: parent_id.to_string(),
                });
            }
            if block.block_type().can_have_children() != block.children().is_some() {
                return Err(DocumentError::InvalidBlockStructure {
                    block_id: id.to_string(),
                    block_type: block.block_type(),
                    reason: "children presence does not match block type".to_string(),
                });
            }
            validate_block_data(id, block.data())?;

            if let Some(children) = block.children() {
                queue.extend(children.iter().map(|c| (c.as_str(), block.id())));
            }
        }

        if let Some(stray) = self.index.ids().find(|id| !seen.contains(id)) {
            return Err(out_of_sync(stray));
        }

        Ok(())
    }

    fn check_parent(&self, parent_id: &str) -> Result<(), DocumentError> {
        let parent = self
            .index
            .get(parent_id)
            .ok_or_else(|| DocumentError::ParentBlockNotFound {
                parent_id: parent_id.to_string(),
            })?;
        if block_can_have_children(parent) {
            Ok(())
        } else {
            Err(DocumentError::ParentBlockCannotHaveChildren {
                parent_id: parent_id.to_string(),
            })
        }
    }

    /// Payload checks plus collisions with ids already in the tree.
    fn check_new_subtree(&self, payload: &BlockPayload) -> Result<(), DocumentError> {
        validate_payload(payload, &self.root_id)?;

        let mut collision = None;
        traverse(std::slice::from_ref(payload), |node| {
            if collision.is_none() && self.index.contains(&node.id) {
                collision = Some(node.id.clone());
            }
        });

        match collision {
            Some(block_id) => Err(DocumentError::BlockAlreadyExists { block_id }),
            None => Ok(()),
        }
    }

    /// The replacement's id may reuse the old id, or an id leaving the tree
    /// with the old subtree; anything else that survives the update collides.
    fn check_replacement_id(
        &self,
        old_id: &str,
        new_id: &str,
        drops_subtree: bool,
    ) -> Result<(), DocumentError> {
        if new_id == old_id || !self.index.contains(new_id) {
            return Ok(());
        }
        if drops_subtree && self.index.is_ancestor(old_id, new_id) {
            return Ok(());
        }
        Err(DocumentError::BlockAlreadyExists {
            block_id: new_id.to_string(),
        })
    }

    fn check_replacement_children(
        &self,
        block_id: &str,
        payload: &BlockPayload,
    ) -> Result<(), DocumentError> {
        let mut result = Ok(());
        traverse(payload.child_payloads(), |child| {
            if result.is_err() {
                return;
            }
            if child.id == payload.id {
                result = Err(DocumentError::ChildBlockIdConflictsWithSubtreeRoot {
                    block_id: child.id.clone(),
                });
            } else if self.index.contains(&child.id) {
                result = Err(DocumentError::ChildBlockIdAlreadyExists {
                    block_id: child.id.clone(),
                    parent_id: block_id.to_string(),
                });
            }
        });
        result
    }
}

impl Default for EditorDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes as the materialized [`DocumentRoot`].
impl Serialize for EditorDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get_root()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl TryFrom<&DocumentRoot> for EditorDocument {
    type Error = DocumentError;

    fn try_from(root: &DocumentRoot) -> Result<Self, Self::Error> {
        Self::from_root(root)
    }
}

/// Parse JSON text into a value with no nesting limit; deep documents grow
/// the stack on demand instead of overflowing it.
pub(crate) fn parse_json(json: &str) -> Result<Value, serde_json::Error> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(value)
}

fn without_children(payload: &BlockPayload) -> BlockPayload {
    BlockPayload {
        id: payload.id.clone(),
        data: payload.data.clone(),
        children: None,
    }
}

/// Add every node of `payload` to the builder, stamping parent ids level by
/// level. Capable blocks without children get an empty list.
fn add_payload(
    mut builder: BlockMapBuilder,
    payload: &BlockPayload,
    parent_id: &str,
) -> BlockMapBuilder {
    let mut queue: VecDeque<(&BlockPayload, String)> =
        VecDeque::from([(payload, parent_id.to_string())]);

    while let Some((node, parent_id)) = queue.pop_front() {
        let children = node.block_type().can_have_children().then(|| {
            node.child_payloads()
                .iter()
                .map(|c| c.id.clone())
                .collect::<Vec<_>>()
        });
        queue.extend(node.child_payloads().iter().map(|c| (c, node.id.clone())));

        builder = builder.add_block(Node::Block(BlockNode {
            id: node.id.clone(),
            data: node.data.clone(),
            parent_id,
            children,
        }));
    }

    builder
}
