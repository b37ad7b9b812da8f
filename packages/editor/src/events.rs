//! # Editor Events
//!
//! Named notifications published on the [`EventBus`](crate::EventBus).
//! Domain events describe what a command did; `editor:change` and
//! `editor:persist` follow every mutating action with the resulting state.

use serde::{Deserialize, Serialize};

use crate::actions::{ChildrenStrategy, InsertStrategy};
use crate::block::DocumentRoot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    #[serde(rename = "block:insert")]
    BlockInsert,
    #[serde(rename = "block:delete")]
    BlockDelete,
    #[serde(rename = "block:update")]
    BlockUpdate,
    #[serde(rename = "block:move")]
    BlockMove,
    #[serde(rename = "document:swap")]
    DocumentSwap,
    #[serde(rename = "history:undo")]
    HistoryUndo,
    #[serde(rename = "history:redo")]
    HistoryRedo,
    #[serde(rename = "history:jump")]
    HistoryJump,
    #[serde(rename = "history:set")]
    HistorySet,
    #[serde(rename = "editor:change")]
    EditorChange,
    #[serde(rename = "editor:persist")]
    EditorPersist,
}

impl EventName {
    pub const ALL: [EventName; 11] = [
        EventName::BlockInsert,
        EventName::BlockDelete,
        EventName::BlockUpdate,
        EventName::BlockMove,
        EventName::DocumentSwap,
        EventName::HistoryUndo,
        EventName::HistoryRedo,
        EventName::HistoryJump,
        EventName::HistorySet,
        EventName::EditorChange,
        EventName::EditorPersist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::BlockInsert => "block:insert",
            EventName::BlockDelete => "block:delete",
            EventName::BlockUpdate => "block:update",
            EventName::BlockMove => "block:move",
            EventName::DocumentSwap => "document:swap",
            EventName::HistoryUndo => "history:undo",
            EventName::HistoryRedo => "history:redo",
            EventName::HistoryJump => "history:jump",
            EventName::HistorySet => "history:set",
            EventName::EditorChange => "editor:change",
            EventName::EditorPersist => "editor:persist",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == name)
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInsertEvent {
    pub block_id: String,
    pub target_id: String,
    pub strategy: InsertStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDeleteEvent {
    pub block_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockUpdateEvent {
    pub block_id: String,
    pub new_block_id: String,
    pub children_strategy: ChildrenStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMoveEvent {
    pub block_id: String,
    pub target_id: String,
    pub strategy: InsertStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSwapEvent {
    pub clear_history: bool,
}

/// `changed` is false when there was nothing to undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryUndoEvent {
    pub position: Option<usize>,
    pub changed: bool,
}

/// `changed` is false when there was nothing to redo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRedoEvent {
    pub position: Option<usize>,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryJumpEvent {
    pub index: usize,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySetEvent {
    pub history: Vec<String>,
    pub current_position: Option<usize>,
    pub current_record: Option<String>,
}

/// Full editor state after a mutating action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorChangeEvent {
    #[serde(rename = "documentJSON")]
    pub document_json: String,
    pub history: Vec<String>,
    pub current_position_in_history: Option<usize>,
    pub root: DocumentRoot,
    pub trigger_action: String,
}

/// What a host needs to persist after a mutating action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorPersistEvent {
    #[serde(rename = "documentJSON")]
    pub document_json: String,
    pub history: Vec<String>,
    pub trigger_action: String,
}

/// Any event carried by the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum EditorEvent {
    #[serde(rename = "block:insert")]
    BlockInsert(BlockInsertEvent),
    #[serde(rename = "block:delete")]
    BlockDelete(BlockDeleteEvent),
    #[serde(rename = "block:update")]
    BlockUpdate(BlockUpdateEvent),
    #[serde(rename = "block:move")]
    BlockMove(BlockMoveEvent),
    #[serde(rename = "document:swap")]
    DocumentSwap(DocumentSwapEvent),
    #[serde(rename = "history:undo")]
    HistoryUndo(HistoryUndoEvent),
    #[serde(rename = "history:redo")]
    HistoryRedo(HistoryRedoEvent),
    #[serde(rename = "history:jump")]
    HistoryJump(HistoryJumpEvent),
    #[serde(rename = "history:set")]
    HistorySet(HistorySetEvent),
    #[serde(rename = "editor:change")]
    EditorChange(EditorChangeEvent),
    #[serde(rename = "editor:persist")]
    EditorPersist(EditorPersistEvent),
}

/// A payload type bound to exactly one event name.
pub trait Event: Clone + 'static {
    const NAME: EventName;

    /// Borrow the payload out of an event of this kind.
    fn from_event(event: &EditorEvent) -> Option<&Self>;
}

macro_rules! impl_event {
    ($($payload:ident => $variant:ident),* $(,)?) => {
        impl EditorEvent {
            pub fn name(&self) -> EventName {
                match self {
                    $(EditorEvent::$variant(_) => EventName::$variant,)*
                }
            }
        }

        $(
            impl Event for $payload {
                const NAME: EventName = EventName::$variant;

                fn from_event(event: &EditorEvent) -> Option<&Self> {
                    match event {
                        EditorEvent::$variant(payload) => Some(payload),
                        _ => None,
                    }
                }
            }

            impl From<$payload> for EditorEvent {
                fn from(payload: $payload) -> Self {
                    EditorEvent::$variant(payload)
                }
            }
        )*
    };
}

impl_event! {
    BlockInsertEvent => BlockInsert,
    BlockDeleteEvent => BlockDelete,
    BlockUpdateEvent => BlockUpdate,
    BlockMoveEvent => BlockMove,
    DocumentSwapEvent => DocumentSwap,
    HistoryUndoEvent => HistoryUndo,
    HistoryRedoEvent => HistoryRedo,
    HistoryJumpEvent => HistoryJump,
    HistorySetEvent => HistorySet,
    EditorChangeEvent => EditorChange,
    EditorPersistEvent => EditorPersist,
}
