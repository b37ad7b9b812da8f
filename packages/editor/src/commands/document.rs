//! Whole-document replacement.

use tracing::info;

use super::{Command, CommandContext};
use crate::actions::{SwapDocumentPayload, SwapElement};
use crate::document::EditorDocument;
use crate::errors::{DocumentError, EditorError};
use crate::events::DocumentSwapEvent;

#[derive(Debug)]
pub struct SwapDocumentCommand<'a> {
    payload: SwapDocumentPayload,
    ctx: CommandContext<'a>,
}

impl<'a> SwapDocumentCommand<'a> {
    pub fn new(payload: SwapDocumentPayload, ctx: CommandContext<'a>) -> Self {
        Self { payload, ctx }
    }

    /// Build the replacement under the live document's root id.
    fn build_document(&self) -> Result<EditorDocument, EditorError> {
        let root_id = self.ctx.document.borrow().root_id().to_string();
        let mismatch = |found: &str| DocumentError::InvalidDocumentStructure {
            reason: format!("root id must be {root_id:?}, found {found:?}"),
        };

        let document = match &self.payload.element {
            SwapElement::Json(json) => EditorDocument::from_json_with_root_id(json, &root_id)?,
            SwapElement::Root(root) if root.id != root_id => return Err(mismatch(&root.id).into()),
            SwapElement::Root(root) => EditorDocument::from_root(root)?,
            SwapElement::Document(document) if document.root_id() != root_id => {
                return Err(mismatch(document.root_id()).into())
            }
            SwapElement::Document(document) => document.clone(),
        };
        Ok(document)
    }
}

impl Command for SwapDocumentCommand<'_> {
    fn name(&self) -> &'static str {
        "document:swap"
    }

    fn validate(&self) -> Result<(), EditorError> {
        self.build_document().map(|_| ())
    }

    fn execute(&self) -> Result<(), EditorError> {
        let document = self.build_document()?;
        let json = document.to_json()?;
        let size = document.size();
        let clear_history = self.payload.clear_history;

        *self.ctx.document.borrow_mut() = document;
        {
            let mut history = self.ctx.history.borrow_mut();
            if clear_history {
                history.clear();
            }
            history.add(json);
        }
        info!(size, clear_history, "document swapped");

        self.ctx.emit(DocumentSwapEvent { clear_history });
        self.ctx.emit_change(self.name())
    }
}
