//! # Commands
//!
//! One command per [`EditorAction`](crate::EditorAction) variant. A command
//! validates its payload against the current state, mutates the document,
//! records the new snapshot in history and publishes its events:
//!
//! ```text
//! validate → mutate → history.add → domain event → editor:change → editor:persist
//! ```
//!
//! History navigation (`undo`, `redo`, `jump`) rehydrates the document from
//! the selected record instead of adding one.

mod block;
mod document;
mod history;

use std::cell::RefCell;

use tracing::trace;

use crate::document::EditorDocument;
use crate::errors::{CommandError, EditorError};
use crate::event_bus::EventBus;
use crate::events::{EditorChangeEvent, EditorEvent, EditorPersistEvent};
use crate::history::DocumentHistory;

pub use block::{DeleteBlockCommand, InsertBlockCommand, MoveBlockCommand, UpdateBlockCommand};
pub use document::SwapDocumentCommand;
pub use history::{JumpCommand, RedoCommand, SetHistoryCommand, UndoCommand};

/// A validated, executable editor action.
pub trait Command {
    /// Wire name of the action this command runs, e.g. `block:insert`
    fn name(&self) -> &'static str;

    /// Check the payload against current state without changing anything.
    fn validate(&self) -> Result<(), EditorError>;

    /// Validate, apply and publish.
    fn execute(&self) -> Result<(), EditorError>;
}

/// Editor state a command works on.
///
/// Borrows are taken per step and released before any event is emitted, so
/// handlers can read the editor or dispatch nested actions.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    pub document: &'a RefCell<EditorDocument>,
    pub history: &'a RefCell<DocumentHistory>,
    pub bus: &'a EventBus,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        document: &'a RefCell<EditorDocument>,
        history: &'a RefCell<DocumentHistory>,
        bus: &'a EventBus,
    ) -> Self {
        Self {
            document,
            history,
            bus,
        }
    }

    /// Fail with a command error when `block_id` is neither a block nor the root.
    pub(crate) fn require_block(
        &self,
        action: &'static str,
        block_id: &str,
    ) -> Result<(), EditorError> {
        if self.document.borrow().contains(block_id) {
            Ok(())
        } else {
            Err(CommandError::BlockNotFound {
                action,
                block_id: block_id.to_string(),
            }
            .into())
        }
    }

    /// Append the current document snapshot to history.
    pub(crate) fn commit(&self) -> Result<(), EditorError> {
        let json = self.document.borrow().to_json()?;
        self.history.borrow_mut().add(json);
        Ok(())
    }

    /// Replace the live document with a history record.
    pub(crate) fn rehydrate(&self, json: &str) -> Result<(), EditorError> {
        let root_id = self.document.borrow().root_id().to_string();
        let document = EditorDocument::from_json_with_root_id(json, &root_id)?;
        *self.document.borrow_mut() = document;
        Ok(())
    }

    pub(crate) fn emit(&self, event: impl Into<EditorEvent>) {
        self.bus.emit(&event.into());
    }

    /// Publish `editor:change` then `editor:persist`, each built from the
    /// state current at the time it is sent.
    pub(crate) fn emit_change(&self, trigger_action: &str) -> Result<(), EditorError> {
        let change = {
            let document = self.document.borrow();
            let history = self.history.borrow();
            EditorChangeEvent {
                document_json: document.to_json()?,
                history: history.records().to_vec(),
                current_position_in_history: history.position(),
                root: document.get_root()?,
                trigger_action: trigger_action.to_string(),
            }
        };
        self.emit(change);

        let persist = {
            let document = self.document.borrow();
            EditorPersistEvent {
                document_json: document.to_json()?,
                history: self.history.borrow().records().to_vec(),
                trigger_action: trigger_action.to_string(),
            }
        };
        self.emit(persist);

        trace!(trigger = trigger_action, "change published");
        Ok(())
    }
}

impl std::fmt::Debug for CommandContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("bus", self.bus)
            .finish_non_exhaustive()
    }
}
