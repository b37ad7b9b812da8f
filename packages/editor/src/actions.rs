//! # Editor Actions
//!
//! The closed set of actions the dispatcher accepts. On the wire an action is
//! `{ "type": "block:insert", "payload": { ... } }`.

use serde::{Deserialize, Serialize};

use crate::block::{BlockPayload, DocumentRoot};
use crate::document::EditorDocument;

/// Placement of a block relative to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertStrategy {
    Before,
    After,
    Append,
}

impl InsertStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsertStrategy::Before => "before",
            InsertStrategy::After => "after",
            InsertStrategy::Append => "append",
        }
    }
}

impl std::fmt::Display for InsertStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to a block's existing children when it is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildrenStrategy {
    Drop,
    Preserve,
    Replace,
}

impl ChildrenStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChildrenStrategy::Drop => "drop",
            ChildrenStrategy::Preserve => "preserve",
            ChildrenStrategy::Replace => "replace",
        }
    }
}

impl std::fmt::Display for ChildrenStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertBlockPayload {
    pub new_block: BlockPayload,
    pub target_id: String,
    pub strategy: InsertStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBlockPayload {
    pub block_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlockPayload {
    pub block_id: String,
    pub new_block: BlockPayload,
    pub children_strategy: ChildrenStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveBlockPayload {
    pub block_id: String,
    pub target_id: String,
    pub strategy: InsertStrategy,
}

/// Replacement document for `document:swap`.
///
/// JSON text and roots are accepted from the wire; a live document can only be
/// passed in-process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SwapElement {
    Json(String),
    Root(DocumentRoot),
    #[serde(skip_deserializing)]
    Document(EditorDocument),
}

impl From<String> for SwapElement {
    fn from(json: String) -> Self {
        SwapElement::Json(json)
    }
}

impl From<&str> for SwapElement {
    fn from(json: &str) -> Self {
        SwapElement::Json(json.to_string())
    }
}

impl From<DocumentRoot> for SwapElement {
    fn from(root: DocumentRoot) -> Self {
        SwapElement::Root(root)
    }
}

impl From<EditorDocument> for SwapElement {
    fn from(document: EditorDocument) -> Self {
        SwapElement::Document(document)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapDocumentPayload {
    pub element: SwapElement,
    #[serde(default)]
    pub clear_history: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UndoPayload {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedoPayload {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpPayload {
    pub index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetHistoryPayload {
    pub history: Vec<String>,
}

/// Every action the editor can dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EditorAction {
    #[serde(rename = "block:insert")]
    InsertBlock(InsertBlockPayload),
    #[serde(rename = "block:delete")]
    DeleteBlock(DeleteBlockPayload),
    #[serde(rename = "block:update")]
    UpdateBlock(UpdateBlockPayload),
    #[serde(rename = "block:move")]
    MoveBlock(MoveBlockPayload),
    #[serde(rename = "document:swap")]
    SwapDocument(SwapDocumentPayload),
    #[serde(rename = "history:undo")]
    Undo(UndoPayload),
    #[serde(rename = "history:redo")]
    Redo(RedoPayload),
    #[serde(rename = "history:jump")]
    Jump(JumpPayload),
    #[serde(rename = "history:set")]
    SetHistory(SetHistoryPayload),
}

impl EditorAction {
    pub fn insert(
        new_block: BlockPayload,
        target_id: impl Into<String>,
        strategy: InsertStrategy,
    ) -> Self {
        EditorAction::InsertBlock(InsertBlockPayload {
            new_block,
            target_id: target_id.into(),
            strategy,
        })
    }

    pub fn delete(block_id: impl Into<String>) -> Self {
        EditorAction::DeleteBlock(DeleteBlockPayload {
            block_id: block_id.into(),
        })
    }

    pub fn update(
        block_id: impl Into<String>,
        new_block: BlockPayload,
        children_strategy: ChildrenStrategy,
    ) -> Self {
        EditorAction::UpdateBlock(UpdateBlockPayload {
            block_id: block_id.into(),
            new_block,
            children_strategy,
        })
    }

    pub fn move_block(
        block_id: impl Into<String>,
        target_id: impl Into<String>,
        strategy: InsertStrategy,
    ) -> Self {
        EditorAction::MoveBlock(MoveBlockPayload {
            block_id: block_id.into(),
            target_id: target_id.into(),
            strategy,
        })
    }

    pub fn swap(element: impl Into<SwapElement>, clear_history: bool) -> Self {
        EditorAction::SwapDocument(SwapDocumentPayload {
            element: element.into(),
            clear_history,
        })
    }

    pub fn undo() -> Self {
        EditorAction::Undo(UndoPayload {})
    }

    pub fn redo() -> Self {
        EditorAction::Redo(RedoPayload {})
    }

    pub fn jump(index: i64) -> Self {
        EditorAction::Jump(JumpPayload { index })
    }

    pub fn set_history(history: Vec<String>) -> Self {
        EditorAction::SetHistory(SetHistoryPayload { history })
    }

    /// Wire name of the action, e.g. `block:insert`.
    pub fn action_type(&self) -> &'static str {
        match self {
            EditorAction::InsertBlock(_) => "block:insert",
            EditorAction::DeleteBlock(_) => "block:delete",
            EditorAction::UpdateBlock(_) => "block:update",
            EditorAction::MoveBlock(_) => "block:move",
            EditorAction::SwapDocument(_) => "document:swap",
            EditorAction::Undo(_) => "history:undo",
            EditorAction::Redo(_) => "history:redo",
            EditorAction::Jump(_) => "history:jump",
            EditorAction::SetHistory(_) => "history:set",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockData;
    use serde_json::json;

    #[test]
    fn test_action_wire_format() {
        let action = EditorAction::insert(
            BlockPayload::new("b1", BlockData::text("hello")),
            "root",
            InsertStrategy::Append,
        );

        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "block:insert",
                "payload": {
                    "newBlock": { "id": "b1", "type": "text", "data": { "text": "hello" } },
                    "targetId": "root",
                    "strategy": "append"
                }
            })
        );
    }

    #[test]
    fn test_parse_actions_from_json() {
        let undo: EditorAction =
            serde_json::from_value(json!({ "type": "history:undo", "payload": {} })).unwrap();
        assert_eq!(undo, EditorAction::undo());

        let update: EditorAction = serde_json::from_value(json!({
            "type": "block:update",
            "payload": {
                "blockId": "b1",
                "newBlock": { "id": "b2", "type": "quote", "data": { "text": "q" } },
                "childrenStrategy": "drop"
            }
        }))
        .unwrap();
        assert_eq!(update.action_type(), "block:update");
    }

    #[test]
    fn test_swap_element_accepts_text_or_root() {
        let from_text: SwapDocumentPayload = serde_json::from_value(json!({
            "element": "{\"id\":\"root\",\"children\":[]}"
        }))
        .unwrap();
        assert!(matches!(from_text.element, SwapElement::Json(_)));
        assert!(!from_text.clear_history);

        let from_root: SwapDocumentPayload = serde_json::from_value(json!({
            "element": { "id": "root", "children": [] },
            "clearHistory": true
        }))
        .unwrap();
        assert_eq!(from_root.element, SwapElement::Root(DocumentRoot::default()));
        assert!(from_root.clear_history);
    }

    #[test]
    fn test_unknown_action_type_is_rejected() {
        let result: Result<EditorAction, _> =
            serde_json::from_value(json!({ "type": "block:copy", "payload": {} }));
        assert!(result.is_err());
    }
}
