//! Error types for the editor
//!
//! Errors are grouped by namespace (`document`, `history`, `command`, `event`).
//! Every variant carries the identifiers relevant to the failure and maps to a
//! stable, namespaced code such as `DOCUMENT:BLOCK_ALREADY_EXISTS`, so callers
//! can branch on `code()` instead of parsing messages.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::actions::{ChildrenStrategy, InsertStrategy};
use crate::block::BlockType;
use crate::events::EventName;

/// Namespace an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorNamespace {
    Document,
    History,
    Command,
    Event,
}

impl ErrorNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorNamespace::Document => "document",
            ErrorNamespace::History => "history",
            ErrorNamespace::Command => "command",
            ErrorNamespace::Event => "event",
        }
    }
}

impl std::fmt::Display for ErrorNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural and content errors raised by the document tree.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DocumentError {
    #[error("Document JSON could not be parsed: {reason}")]
    InvalidDocumentJson { reason: String },

    #[error("Invalid document structure: {reason}")]
    InvalidDocumentStructure { reason: String },

    #[error("Child {index} of {parent_id} is not an object")]
    BlockNotObject { parent_id: String, index: usize },

    #[error("Child {index} of {parent_id} has a missing or invalid id")]
    InvalidBlockId { parent_id: String, index: usize },

    #[error("Block {block_id} has a missing or invalid parentId")]
    InvalidBlockParentId { block_id: String },

    #[error("Block {block_id} has unknown type {found}")]
    InvalidBlockType { block_id: String, found: String },

    #[error("Block {block_id} ({block_type}) is malformed: {reason}")]
    InvalidBlockStructure {
        block_id: String,
        block_type: BlockType,
        reason: String,
    },

    #[error("Block {block_id} declares parent {declared_parent_id} but is listed under {actual_parent_id}")]
    ParentLinkMismatch {
        block_id: String,
        declared_parent_id: String,
        actual_parent_id: String,
    },

    #[error("Block {block_id} already exists")]
    BlockAlreadyExists { block_id: String },

    #[error("Block id {block_id} is reserved for the document root")]
    ReservedBlockId { block_id: String },

    #[error("Block not found: {block_id}")]
    BlockNotFound { block_id: String },

    #[error("Parent block not found: {parent_id}")]
    ParentBlockNotFound { parent_id: String },

    #[error("Parent block {parent_id} cannot have children")]
    ParentBlockCannotHaveChildren { parent_id: String },

    #[error("Block {block_id} of type {block_type} cannot have children")]
    BlockCannotHaveChildren {
        block_id: String,
        block_type: BlockType,
    },

    #[error("Cannot insert before the document root {root_id}")]
    CannotInsertBeforeRoot { root_id: String },

    #[error("Cannot insert after the document root {root_id}")]
    CannotInsertAfterRoot { root_id: String },

    #[error("Cannot remove the document root {root_id}")]
    CannotRemoveRoot { root_id: String },

    #[error("Block to remove not found: {block_id}")]
    BlockToRemoveNotFound { block_id: String },

    #[error("Block {block_id} points to missing parent {parent_id}")]
    BlockToRemoveHasNoParent { block_id: String, parent_id: String },

    #[error("Parent {parent_id} does not list block {block_id} among its children")]
    ParentOfBlockHasNoChildren { block_id: String, parent_id: String },

    #[error("Cannot move the document root {root_id}")]
    CannotMoveRoot { root_id: String },

    #[error("Cannot move block {block_id} relative to itself")]
    CannotMoveBlockToItself { block_id: String },

    #[error("Cannot move block {block_id} into its own descendant {target_id}")]
    CannotMoveBlockToDescendant { block_id: String, target_id: String },

    #[error("Block {block_id} can only be appended to the root, not to {target_id}")]
    CanOnlyAppendToRoot { block_id: String, target_id: String },

    #[error("Cannot update the document root {root_id}")]
    CannotUpdateRoot { root_id: String },

    #[error("Cannot {strategy} children when updating {block_id} from {old_type} to {new_type}")]
    IncompatibleChildrenStrategy {
        block_id: String,
        strategy: ChildrenStrategy,
        old_type: BlockType,
        new_type: BlockType,
    },

    #[error("Child block id {block_id} already exists in the document")]
    ChildBlockIdAlreadyExists { block_id: String, parent_id: String },

    #[error("Child block id {block_id} conflicts with the id of its subtree root")]
    ChildBlockIdConflictsWithSubtreeRoot { block_id: String },

    #[error("Block index is out of sync with the tree at {block_id}")]
    IndexOutOfSync { block_id: String },

    #[error("Document could not be serialized: {reason}")]
    Serialization { reason: String },
}

impl DocumentError {
    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::InvalidDocumentJson { .. } => "DOCUMENT:INVALID_JSON",
            DocumentError::InvalidDocumentStructure { .. } => "DOCUMENT:INVALID_STRUCTURE",
            DocumentError::BlockNotObject { .. } => "DOCUMENT:BLOCK_NOT_OBJECT",
            DocumentError::InvalidBlockId { .. } => "DOCUMENT:INVALID_BLOCK_ID",
            DocumentError::InvalidBlockParentId { .. } => "DOCUMENT:INVALID_BLOCK_PARENT_ID",
            DocumentError::InvalidBlockType { .. } => "DOCUMENT:INVALID_BLOCK_TYPE",
            DocumentError::InvalidBlockStructure { .. } => "DOCUMENT:INVALID_BLOCK_STRUCTURE",
            DocumentError::ParentLinkMismatch { .. } => "DOCUMENT:PARENT_LINK_MISMATCH",
            DocumentError::BlockAlreadyExists { .. } => "DOCUMENT:BLOCK_ALREADY_EXISTS",
            DocumentError::ReservedBlockId { .. } => "DOCUMENT:RESERVED_BLOCK_ID",
            DocumentError::BlockNotFound { .. } => "DOCUMENT:BLOCK_NOT_FOUND",
            DocumentError::ParentBlockNotFound { .. } => "DOCUMENT:PARENT_BLOCK_NOT_FOUND",
            DocumentError::ParentBlockCannotHaveChildren { .. } => {
                "DOCUMENT:PARENT_BLOCK_CANNOT_HAVE_CHILDREN"
            }
            DocumentError::BlockCannotHaveChildren { .. } => "DOCUMENT:BLOCK_CANNOT_HAVE_CHILDREN",
            DocumentError::CannotInsertBeforeRoot { .. } => "DOCUMENT:CANNOT_INSERT_BEFORE_ROOT",
            DocumentError::CannotInsertAfterRoot { .. } => "DOCUMENT:CANNOT_INSERT_AFTER_ROOT",
            DocumentError::CannotRemoveRoot { .. } => "DOCUMENT:CANNOT_REMOVE_ROOT",
            DocumentError::BlockToRemoveNotFound { .. } => "DOCUMENT:BLOCK_TO_REMOVE_NOT_FOUND",
            DocumentError::BlockToRemoveHasNoParent { .. } => {
                "DOCUMENT:BLOCK_TO_REMOVE_HAS_NO_PARENT"
            }
            DocumentError::ParentOfBlockHasNoChildren { .. } => {
                "DOCUMENT:PARENT_OF_BLOCK_HAS_NO_CHILDREN"
            }
            DocumentError::CannotMoveRoot { .. } => "DOCUMENT:CANNOT_MOVE_ROOT",
            DocumentError::CannotMoveBlockToItself { .. } => "DOCUMENT:CANNOT_MOVE_BLOCK_TO_ITSELF",
            DocumentError::CannotMoveBlockToDescendant { .. } => {
                "DOCUMENT:CANNOT_MOVE_BLOCK_TO_DESCENDANT"
            }
            DocumentError::CanOnlyAppendToRoot { .. } => "DOCUMENT:CAN_ONLY_APPEND_TO_ROOT",
            DocumentError::CannotUpdateRoot { .. } => "DOCUMENT:CANNOT_UPDATE_ROOT",
            DocumentError::IncompatibleChildrenStrategy { .. } => {
                "DOCUMENT:INCOMPATIBLE_CHILDREN_STRATEGY"
            }
            DocumentError::ChildBlockIdAlreadyExists { .. } => {
                "DOCUMENT:CHILD_BLOCK_ID_ALREADY_EXISTS"
            }
            DocumentError::ChildBlockIdConflictsWithSubtreeRoot { .. } => {
                "DOCUMENT:CHILD_BLOCK_ID_CONFLICTS_WITH_SUBTREE_ROOT"
            }
            DocumentError::IndexOutOfSync { .. } => "DOCUMENT:INDEX_OUT_OF_SYNC",
            DocumentError::Serialization { .. } => "DOCUMENT:SERIALIZATION_FAILED",
        }
    }

    /// Error for a before/after placement targeting the root.
    pub(crate) fn relative_to_root(strategy: InsertStrategy, root_id: &str) -> Self {
        let root_id = root_id.to_string();
        match strategy {
            InsertStrategy::After => DocumentError::CannotInsertAfterRoot { root_id },
            InsertStrategy::Before | InsertStrategy::Append => {
                DocumentError::CannotInsertBeforeRoot { root_id }
            }
        }
    }
}

/// Errors raised by the snapshot history.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HistoryError {
    #[error("History must be seeded with a non-empty document snapshot")]
    EmptyInitialHistoryJson {},

    #[error("History limit must be at least 1, got {limit}")]
    InvalidHistoryLimit { limit: usize },

    #[error("History index {index} is out of range for {length} records")]
    HistoryIndexOutOfRange { index: i64, length: usize },
}

impl HistoryError {
    pub fn code(&self) -> &'static str {
        match self {
            HistoryError::EmptyInitialHistoryJson { .. } => "HISTORY:EMPTY_INITIAL_HISTORY_JSON",
            HistoryError::InvalidHistoryLimit { .. } => "HISTORY:INVALID_HISTORY_LIMIT",
            HistoryError::HistoryIndexOutOfRange { .. } => "HISTORY:INDEX_OUT_OF_RANGE",
        }
    }
}

/// Errors raised while validating an action against editor state.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandError {
    #[error("{action}: block not found: {block_id}")]
    BlockNotFound {
        action: &'static str,
        block_id: String,
    },

    #[error("Last history record does not match the current document")]
    HistoryRecordMismatch {
        expected: String,
        received: Option<String>,
    },
}

impl CommandError {
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::BlockNotFound { .. } => "COMMAND:BLOCK_NOT_FOUND",
            CommandError::HistoryRecordMismatch { .. } => "COMMAND:HISTORY_RECORD_MISMATCH",
        }
    }
}

/// Misuse of the event bus.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventError {
    #[error("No handler {subscription_id} registered for {event}")]
    HandlerNotFound {
        event: EventName,
        subscription_id: u64,
    },
}

impl EventError {
    pub fn code(&self) -> &'static str {
        match self {
            EventError::HandlerNotFound { .. } => "EVENT:HANDLER_NOT_FOUND",
        }
    }
}

/// Any error the editor core can raise.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Event(#[from] EventError),
}

impl EditorError {
    /// Namespaced machine code, e.g. `DOCUMENT:BLOCK_ALREADY_EXISTS`.
    pub fn code(&self) -> &'static str {
        match self {
            EditorError::Document(e) => e.code(),
            EditorError::History(e) => e.code(),
            EditorError::Command(e) => e.code(),
            EditorError::Event(e) => e.code(),
        }
    }

    pub fn namespace(&self) -> ErrorNamespace {
        match self {
            EditorError::Document(_) => ErrorNamespace::Document,
            EditorError::History(_) => ErrorNamespace::History,
            EditorError::Command(_) => ErrorNamespace::Command,
            EditorError::Event(_) => ErrorNamespace::Event,
        }
    }

    /// Identifiers relevant to the failure as a JSON object.
    pub fn context(&self) -> Value {
        let value = match self {
            EditorError::Document(e) => serde_json::to_value(e),
            EditorError::History(e) => serde_json::to_value(e),
            EditorError::Command(e) => serde_json::to_value(e),
            EditorError::Event(e) => serde_json::to_value(e),
        };

        match value {
            Ok(Value::Object(map)) => Value::Object(map),
            _ => Value::Object(Map::new()),
        }
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code() == code
    }

    pub fn is_document_error(&self) -> bool {
        matches!(self, EditorError::Document(_))
    }

    pub fn is_history_error(&self) -> bool {
        matches!(self, EditorError::History(_))
    }

    pub fn is_command_error(&self) -> bool {
        matches!(self, EditorError::Command(_))
    }

    pub fn is_event_error(&self) -> bool {
        matches!(self, EditorError::Event(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_codes_are_namespaced() {
        let err: EditorError = DocumentError::BlockAlreadyExists {
            block_id: "b1".to_string(),
        }
        .into();

        assert_eq!(err.code(), "DOCUMENT:BLOCK_ALREADY_EXISTS");
        assert_eq!(err.namespace(), ErrorNamespace::Document);
        assert!(err.has_code("DOCUMENT:BLOCK_ALREADY_EXISTS"));
        assert!(err.is_document_error());
        assert!(!err.is_history_error());
    }

    #[test]
    fn test_context_carries_identifiers() {
        let err: EditorError = DocumentError::CannotMoveBlockToDescendant {
            block_id: "x".to_string(),
            target_id: "x-child".to_string(),
        }
        .into();

        assert_eq!(
            err.context(),
            json!({ "block_id": "x", "target_id": "x-child" })
        );
    }

    #[test]
    fn test_context_of_fieldless_error_is_empty_object() {
        let err: EditorError = HistoryError::EmptyInitialHistoryJson {}.into();
        assert_eq!(err.context(), json!({}));
        assert_eq!(err.namespace().as_str(), "history");
    }

    #[test]
    fn test_context_serializes_enums_by_wire_name() {
        let err: EditorError = DocumentError::IncompatibleChildrenStrategy {
            block_id: "b1".to_string(),
            strategy: ChildrenStrategy::Preserve,
            old_type: BlockType::ToggleList,
            new_type: BlockType::Text,
        }
        .into();

        let context = err.context();
        assert_eq!(context["strategy"], "preserve");
        assert_eq!(context["old_type"], "toggleList");
        assert_eq!(context["new_type"], "text");
    }

    #[test]
    fn test_message_is_human_readable() {
        let err: EditorError = HistoryError::HistoryIndexOutOfRange { index: 7, length: 3 }.into();
        assert_eq!(err.to_string(), "History index 7 is out of range for 3 records");
    }
}
