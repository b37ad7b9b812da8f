//! # Folio Editor
//!
//! In-memory engine for block-structured documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ EditorAction (tagged union, pure data)      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ CommandDispatcher → Command                 │
//! │  - validate against the live document       │
//! │  - mutate EditorDocument (staged, atomic)   │
//! │  - append snapshot to DocumentHistory       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ EventBus: domain event → editor:change      │
//! │           → editor:persist                  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Actions are the only write path**: reads return owned snapshots
//! 2. **Validate, then mutate**: a failed action leaves no trace
//! 3. **Snapshot history**: undo/redo restore serialized documents
//! 4. **Synchronous events**: handlers run before dispatch returns
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::{BlockData, BlockPayload, Editor, EditorAction, EditorConfig, InsertStrategy};
//!
//! let editor = Editor::new(EditorConfig::default())?;
//! let changes = editor.subscribe::<EditorChangeEvent>(|e| println!("{}", e.document_json));
//!
//! editor.dispatch_action(EditorAction::insert(
//!     BlockPayload::new("b1", BlockData::text("hi")),
//!     "root",
//!     InsertStrategy::Append,
//! ))?;
//!
//! editor.undo()?;
//! changes.unsubscribe();
//! ```

mod actions;
mod block;
mod block_map;
mod commands;
mod config;
mod dispatcher;
mod document;
mod editor;
mod errors;
mod event_bus;
mod events;
mod history;
mod stream;
mod validators;

pub use actions::{
    ChildrenStrategy, DeleteBlockPayload, EditorAction, InsertBlockPayload, InsertStrategy,
    JumpPayload, MoveBlockPayload, RedoPayload, SetHistoryPayload, SwapDocumentPayload,
    SwapElement, UndoPayload, UpdateBlockPayload,
};
pub use block::{
    Block, BlockData, BlockPayload, BlockType, BulletListData, CalloutData, DocumentRoot,
    HeadingData, QuoteData, TextData, ToggleListData, TreeNode, ROOT_ID,
};
pub use block_map::{
    block_can_have_children, build_index_from_root, build_index_from_value, traverse, BlockMap,
    BlockMapBuilder, BlockNode, Node, RootNode,
};
pub use commands::{
    Command, CommandContext, DeleteBlockCommand, InsertBlockCommand, JumpCommand,
    MoveBlockCommand, RedoCommand, SetHistoryCommand, SwapDocumentCommand, UndoCommand,
    UpdateBlockCommand,
};
pub use config::{ConfigError, EditorConfig, DEFAULT_CONFIG_NAME};
pub use dispatcher::CommandDispatcher;
pub use document::EditorDocument;
pub use editor::Editor;
pub use errors::{
    CommandError, DocumentError, EditorError, ErrorNamespace, EventError, HistoryError,
};
pub use event_bus::{EventBus, Handler, Subscription, SubscriptionId};
pub use events::{
    BlockDeleteEvent, BlockInsertEvent, BlockMoveEvent, BlockUpdateEvent, DocumentSwapEvent,
    EditorChangeEvent, EditorEvent, EditorPersistEvent, Event, EventName, HistoryJumpEvent,
    HistoryRedoEvent, HistorySetEvent, HistoryUndoEvent,
};
pub use history::{DocumentHistory, DEFAULT_HISTORY_LIMIT};
pub use stream::{Sink, Stream};
pub use validators::{
    validate_block_data, validate_block_value, validate_document_value, validate_payload,
    validate_root_shape, variant_validator, CheckedBlock, VariantValidator,
};
