//! # Command Dispatcher
//!
//! Maps each [`EditorAction`] variant to its command and runs it. The action
//! enum is closed, so the mapping is an exhaustive `match`.

use tracing::{debug, instrument, warn};

use crate::actions::EditorAction;
use crate::commands::{
    Command, CommandContext, DeleteBlockCommand, InsertBlockCommand, JumpCommand,
    MoveBlockCommand, RedoCommand, SetHistoryCommand, SwapDocumentCommand, UndoCommand,
    UpdateBlockCommand,
};
use crate::errors::EditorError;

#[derive(Debug, Clone, Copy)]
pub struct CommandDispatcher<'a> {
    ctx: CommandContext<'a>,
}

impl<'a> CommandDispatcher<'a> {
    pub fn new(ctx: CommandContext<'a>) -> Self {
        Self { ctx }
    }

    #[instrument(skip_all, fields(action = %action.action_type()))]
    pub fn process_action(&self, action: EditorAction) -> Result<(), EditorError> {
        let command = self.create_command(action);
        debug!(command = command.name(), "dispatching");

        command
            .execute()
            .inspect_err(|e| warn!(code = e.code(), error = %e, "action rejected"))
    }

    fn create_command(&self, action: EditorAction) -> Box<dyn Command + 'a> {
        let ctx = self.ctx;
        match action {
            EditorAction::InsertBlock(payload) => Box::new(InsertBlockCommand::new(payload, ctx)),
            EditorAction::DeleteBlock(payload) => Box::new(DeleteBlockCommand::new(payload, ctx)),
            EditorAction::UpdateBlock(payload) => Box::new(UpdateBlockCommand::new(payload, ctx)),
            EditorAction::MoveBlock(payload) => Box::new(MoveBlockCommand::new(payload, ctx)),
            EditorAction::SwapDocument(payload) => {
                Box::new(SwapDocumentCommand::new(payload, ctx))
            }
            EditorAction::Undo(payload) => Box::new(UndoCommand::new(payload, ctx)),
            EditorAction::Redo(payload) => Box::new(RedoCommand::new(payload, ctx)),
            EditorAction::Jump(payload) => Box::new(JumpCommand::new(payload, ctx)),
            EditorAction::SetHistory(payload) => Box::new(SetHistoryCommand::new(payload, ctx)),
        }
    }
}
