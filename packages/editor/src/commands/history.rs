//! History navigation and replacement.
//!
//! Navigation moves the cursor and rehydrates the document from the selected
//! record. It never adds a record, so navigation itself cannot be undone.
//! A no-op move (undo at the oldest record, redo at the newest, jump to the
//! current index) leaves the document untouched but still publishes.

use tracing::debug;

use super::{Command, CommandContext};
use crate::actions::{JumpPayload, RedoPayload, SetHistoryPayload, UndoPayload};
use crate::document::parse_json;
use crate::errors::{CommandError, EditorError, HistoryError};
use crate::events::{HistoryJumpEvent, HistoryRedoEvent, HistorySetEvent, HistoryUndoEvent};

#[derive(Debug, Clone, Copy)]
enum Step {
    Back,
    Forward,
}

/// Move one step and rehydrate. On a failed rehydration the cursor goes back
/// to where it was. Returns whether anything changed.
fn step(ctx: &CommandContext<'_>, direction: Step) -> Result<bool, EditorError> {
    let (previous, record) = {
        let mut history = ctx.history.borrow_mut();
        let previous = history.position();
        let record = match direction {
            Step::Back => history.undo(),
            Step::Forward => history.redo(),
        }
        .map(str::to_string);
        (previous, record)
    };

    let Some(record) = record else {
        return Ok(false);
    };
    if let Err(err) = ctx.rehydrate(&record) {
        restore_position(ctx, previous)?;
        return Err(err);
    }
    Ok(true)
}

fn restore_position(ctx: &CommandContext<'_>, position: Option<usize>) -> Result<(), EditorError> {
    if let Some(position) = position {
        ctx.history.borrow_mut().jump_to(position)?;
    }
    Ok(())
}

#[derive(Debug)]
pub struct UndoCommand<'a> {
    ctx: CommandContext<'a>,
}

impl<'a> UndoCommand<'a> {
    pub fn new(_payload: UndoPayload, ctx: CommandContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Command for UndoCommand<'_> {
    fn name(&self) -> &'static str {
        "history:undo"
    }

    fn validate(&self) -> Result<(), EditorError> {
        Ok(())
    }

    fn execute(&self) -> Result<(), EditorError> {
        let changed = step(&self.ctx, Step::Back)?;
        let position = self.ctx.history.borrow().position();
        debug!(?position, changed, "undo");

        self.ctx.emit(HistoryUndoEvent { position, changed });
        self.ctx.emit_change(self.name())
    }
}

#[derive(Debug)]
pub struct RedoCommand<'a> {
    ctx: CommandContext<'a>,
}

impl<'a> RedoCommand<'a> {
    pub fn new(_payload: RedoPayload, ctx: CommandContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Command for RedoCommand<'_> {
    fn name(&self) -> &'static str {
        "history:redo"
    }

    fn validate(&self) -> Result<(), EditorError> {
        Ok(())
    }

    fn execute(&self) -> Result<(), EditorError> {
        let changed = step(&self.ctx, Step::Forward)?;
        let position = self.ctx.history.borrow().position();
        debug!(?position, changed, "redo");

        self.ctx.emit(HistoryRedoEvent { position, changed });
        self.ctx.emit_change(self.name())
    }
}

#[derive(Debug)]
pub struct JumpCommand<'a> {
    payload: JumpPayload,
    ctx: CommandContext<'a>,
}

impl<'a> JumpCommand<'a> {
    pub fn new(payload: JumpPayload, ctx: CommandContext<'a>) -> Self {
        Self { payload, ctx }
    }

    fn target_index(&self) -> Result<usize, EditorError> {
        let length = self.ctx.history.borrow().len();
        let out_of_range = || HistoryError::HistoryIndexOutOfRange {
            index: self.payload.index,
            length,
        };

        let index = usize::try_from(self.payload.index).map_err(|_| out_of_range())?;
        if index >= length {
            return Err(out_of_range().into());
        }
        Ok(index)
    }
}

impl Command for JumpCommand<'_> {
    fn name(&self) -> &'static str {
        "history:jump"
    }

    fn validate(&self) -> Result<(), EditorError> {
        self.target_index().map(|_| ())
    }

    fn execute(&self) -> Result<(), EditorError> {
        let index = self.target_index()?;

        let (previous, record) = {
            let mut history = self.ctx.history.borrow_mut();
            let previous = history.position();
            let record = history.jump_to(index)?.map(str::to_string);
            (previous, record)
        };

        let changed = record.is_some();
        if let Some(record) = record {
            if let Err(err) = self.ctx.rehydrate(&record) {
                restore_position(&self.ctx, previous)?;
                return Err(err);
            }
        }
        debug!(index, changed, "jump");

        self.ctx.emit(HistoryJumpEvent { index, changed });
        self.ctx.emit_change(self.name())
    }
}

/// Two snapshots match when they are the same text or the same JSON value.
fn records_match(left: &str, right: &str) -> bool {
    if left == right {
        return true;
    }
    match (parse_json(left), parse_json(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}

#[derive(Debug)]
pub struct SetHistoryCommand<'a> {
    payload: SetHistoryPayload,
    ctx: CommandContext<'a>,
}

impl<'a> SetHistoryCommand<'a> {
    pub fn new(payload: SetHistoryPayload, ctx: CommandContext<'a>) -> Self {
        Self { payload, ctx }
    }
}

impl Command for SetHistoryCommand<'_> {
    fn name(&self) -> &'static str {
        "history:set"
    }

    /// The last record must be the live document, or history and state drift apart.
    fn validate(&self) -> Result<(), EditorError> {
        let expected = self.ctx.document.borrow().to_json()?;

        match self.payload.history.last() {
            Some(last) if records_match(last, &expected) => Ok(()),
            received => Err(CommandError::HistoryRecordMismatch {
                expected,
                received: received.cloned(),
            }
            .into()),
        }
    }

    fn execute(&self) -> Result<(), EditorError> {
        self.validate()?;

        let event = {
            let mut history = self.ctx.history.borrow_mut();
            history.set_history(self.payload.history.clone());
            HistorySetEvent {
                history: history.records().to_vec(),
                current_position: history.position(),
                current_record: history.current().map(str::to_string),
            }
        };
        debug!(len = event.history.len(), "history replaced");

        self.ctx.emit(event);
        self.ctx.emit_change(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::records_match;

    #[test]
    fn test_records_match_ignores_formatting() {
        assert!(records_match(
            r#"{"id":"root","children":[]}"#,
            r#"{ "children": [], "id": "root" }"#
        ));
        assert!(!records_match(
            r#"{"id":"root","children":[]}"#,
            r#"{"id":"page","children":[]}"#
        ));
        assert!(!records_match("not json", r#"{"id":"root","children":[]}"#));
    }
}
