//! Structural block commands: insert, delete, update, move.

use tracing::debug;

use super::{Command, CommandContext};
use crate::actions::{DeleteBlockPayload, InsertBlockPayload, MoveBlockPayload, UpdateBlockPayload};
use crate::errors::EditorError;
use crate::events::{BlockDeleteEvent, BlockInsertEvent, BlockMoveEvent, BlockUpdateEvent};

#[derive(Debug)]
pub struct InsertBlockCommand<'a> {
    payload: InsertBlockPayload,
    ctx: CommandContext<'a>,
}

impl<'a> InsertBlockCommand<'a> {
    pub fn new(payload: InsertBlockPayload, ctx: CommandContext<'a>) -> Self {
        Self { payload, ctx }
    }
}

impl Command for InsertBlockCommand<'_> {
    fn name(&self) -> &'static str {
        "block:insert"
    }

    fn validate(&self) -> Result<(), EditorError> {
        self.ctx.require_block(self.name(), &self.payload.target_id)
    }

    fn execute(&self) -> Result<(), EditorError> {
        self.validate()?;
        let InsertBlockPayload {
            new_block,
            target_id,
            strategy,
        } = &self.payload;

        self.ctx
            .document
            .borrow_mut()
            .insert_relative(target_id, *strategy, new_block)?;
        self.ctx.commit()?;
        debug!(block_id = %new_block.id, target_id = %target_id, "insert committed");

        self.ctx.emit(BlockInsertEvent {
            block_id: new_block.id.clone(),
            target_id: target_id.clone(),
            strategy: *strategy,
        });
        self.ctx.emit_change(self.name())
    }
}

#[derive(Debug)]
pub struct DeleteBlockCommand<'a> {
    payload: DeleteBlockPayload,
    ctx: CommandContext<'a>,
}

impl<'a> DeleteBlockCommand<'a> {
    pub fn new(payload: DeleteBlockPayload, ctx: CommandContext<'a>) -> Self {
        Self { payload, ctx }
    }
}

impl Command for DeleteBlockCommand<'_> {
    fn name(&self) -> &'static str {
        "block:delete"
    }

    fn validate(&self) -> Result<(), EditorError> {
        self.ctx.require_block(self.name(), &self.payload.block_id)
    }

    fn execute(&self) -> Result<(), EditorError> {
        self.validate()?;
        let block_id = &self.payload.block_id;

        self.ctx.document.borrow_mut().remove_block(block_id)?;
        self.ctx.commit()?;
        debug!(block_id = %block_id, "delete committed");

        self.ctx.emit(BlockDeleteEvent {
            block_id: block_id.clone(),
        });
        self.ctx.emit_change(self.name())
    }
}

#[derive(Debug)]
pub struct UpdateBlockCommand<'a> {
    payload: UpdateBlockPayload,
    ctx: CommandContext<'a>,
}

impl<'a> UpdateBlockCommand<'a> {
    pub fn new(payload: UpdateBlockPayload, ctx: CommandContext<'a>) -> Self {
        Self { payload, ctx }
    }
}

impl Command for UpdateBlockCommand<'_> {
    fn name(&self) -> &'static str {
        "block:update"
    }

    fn validate(&self) -> Result<(), EditorError> {
        self.ctx.require_block(self.name(), &self.payload.block_id)
    }

    fn execute(&self) -> Result<(), EditorError> {
        self.validate()?;
        let UpdateBlockPayload {
            block_id,
            new_block,
            children_strategy,
        } = &self.payload;

        self.ctx
            .document
            .borrow_mut()
            .update_block(block_id, new_block, *children_strategy)?;
        self.ctx.commit()?;
        debug!(block_id = %block_id, new_block_id = %new_block.id, "update committed");

        self.ctx.emit(BlockUpdateEvent {
            block_id: block_id.clone(),
            new_block_id: new_block.id.clone(),
            children_strategy: *children_strategy,
        });
        self.ctx.emit_change(self.name())
    }
}

#[derive(Debug)]
pub struct MoveBlockCommand<'a> {
    payload: MoveBlockPayload,
    ctx: CommandContext<'a>,
}

impl<'a> MoveBlockCommand<'a> {
    pub fn new(payload: MoveBlockPayload, ctx: CommandContext<'a>) -> Self {
        Self { payload, ctx }
    }
}

impl Command for MoveBlockCommand<'_> {
    fn name(&self) -> &'static str {
        "block:move"
    }

    fn validate(&self) -> Result<(), EditorError> {
        self.ctx.require_block(self.name(), &self.payload.block_id)?;
        self.ctx.require_block(self.name(), &self.payload.target_id)
    }

    fn execute(&self) -> Result<(), EditorError> {
        self.validate()?;
        let MoveBlockPayload {
            block_id,
            target_id,
            strategy,
        } = &self.payload;

        self.ctx
            .document
            .borrow_mut()
            .move_block(block_id, target_id, *strategy)?;
        self.ctx.commit()?;
        debug!(block_id = %block_id, target_id = %target_id, "move committed");

        self.ctx.emit(BlockMoveEvent {
            block_id: block_id.clone(),
            target_id: target_id.clone(),
            strategy: *strategy,
        });
        self.ctx.emit_change(self.name())
    }
}
