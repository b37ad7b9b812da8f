//! # Editor
//!
//! Facade owning one document, its history and its event bus. Every change
//! goes through [`Editor::dispatch_action`]; reads return owned snapshots.
//!
//! The editor is single-threaded. Handlers run synchronously inside
//! `dispatch_action` and may dispatch further actions through a handle to
//! the editor (e.g. an `Rc<Editor>` or `Weak<Editor>`); nested dispatches
//! complete before the outer emission continues.

use std::cell::RefCell;

use tracing::info;

use crate::actions::{EditorAction, SwapElement};
use crate::block::{Block, DocumentRoot};
use crate::commands::CommandContext;
use crate::config::EditorConfig;
use crate::dispatcher::CommandDispatcher;
use crate::document::EditorDocument;
use crate::errors::{DocumentError, EditorError};
use crate::event_bus::{EventBus, Subscription, SubscriptionId};
use crate::events::{EditorEvent, Event, EventName};
use crate::history::DocumentHistory;
use crate::stream::Stream;

#[derive(Debug)]
pub struct Editor {
    document: RefCell<EditorDocument>,
    history: RefCell<DocumentHistory>,
    bus: EventBus,
    config: EditorConfig,
}

impl Editor {
    /// Empty document under the configured root id.
    pub fn new(config: EditorConfig) -> Result<Self, EditorError> {
        let document = EditorDocument::with_root_id(config.root_id.clone());
        Self::with_document(document, config)
    }

    /// Wrap an existing document; history is seeded with its snapshot.
    pub fn with_document(
        document: EditorDocument,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        if document.root_id() != config.root_id {
            return Err(DocumentError::InvalidDocumentStructure {
                reason: format!(
                    "root id must be {:?}, found {:?}",
                    config.root_id,
                    document.root_id()
                ),
            }
            .into());
        }

        let history = DocumentHistory::new(document.to_json()?, config.history_limit)?;
        info!(
            root_id = %config.root_id,
            size = document.size(),
            history_limit = config.history_limit,
            "editor created"
        );

        Ok(Self {
            document: RefCell::new(document),
            history: RefCell::new(history),
            bus: EventBus::new(),
            config,
        })
    }

    pub fn from_json(json: &str, config: EditorConfig) -> Result<Self, EditorError> {
        let document = EditorDocument::from_json_with_root_id(json, &config.root_id)?;
        Self::with_document(document, config)
    }

    fn context(&self) -> CommandContext<'_> {
        CommandContext::new(&self.document, &self.history, &self.bus)
    }

    pub fn dispatch_action(&self, action: EditorAction) -> Result<(), EditorError> {
        CommandDispatcher::new(self.context()).process_action(action)
    }

    pub fn root(&self) -> Result<DocumentRoot, EditorError> {
        Ok(self.document.borrow().get_root()?)
    }

    pub fn block(&self, id: &str) -> Result<Option<Block>, EditorError> {
        Ok(self.document.borrow().get_block(id)?)
    }

    pub fn document_json(&self) -> Result<String, EditorError> {
        Ok(self.document.borrow().to_json()?)
    }

    pub fn history(&self) -> Vec<String> {
        self.history.borrow().records().to_vec()
    }

    /// Replace the whole history. The last record must match the live document.
    pub fn set_history(&self, history: Vec<String>) -> Result<(), EditorError> {
        self.dispatch_action(EditorAction::set_history(history))
    }

    pub fn current_history_record(&self) -> Option<String> {
        self.history.borrow().current().map(str::to_string)
    }

    pub fn current_position_in_history(&self) -> Option<usize> {
        self.history.borrow().position()
    }

    pub fn jump_to_point_in_history(&self, index: i64) -> Result<(), EditorError> {
        self.dispatch_action(EditorAction::jump(index))
    }

    pub fn undo(&self) -> Result<(), EditorError> {
        self.dispatch_action(EditorAction::undo())
    }

    pub fn redo(&self) -> Result<(), EditorError> {
        self.dispatch_action(EditorAction::redo())
    }

    pub fn swap_document(
        &self,
        element: impl Into<SwapElement>,
        clear_history: bool,
    ) -> Result<(), EditorError> {
        self.dispatch_action(EditorAction::swap(element, clear_history))
    }

    pub fn subscribe<E: Event>(&self, handler: impl Fn(&E) + 'static) -> Subscription {
        self.bus.on::<E>(handler)
    }

    pub fn subscribe_event(
        &self,
        name: EventName,
        handler: impl Fn(&EditorEvent) + 'static,
    ) -> Subscription {
        self.bus.on_event(name, handler)
    }

    pub fn unsubscribe(&self, name: EventName, id: SubscriptionId) -> Result<(), EditorError> {
        Ok(self.bus.off(name, id)?)
    }

    /// Lazy stream of one typed event.
    pub fn on<E: Event>(&self) -> Stream<E> {
        self.bus.stream::<E>()
    }

    /// Lazy stream of raw events published under `name`.
    pub fn on_any(&self, name: EventName) -> Stream<EditorEvent> {
        self.bus.stream_event(name)
    }

    /// Run `f` against a snapshot of the current document.
    ///
    /// The snapshot shares its nodes with the live arena, so taking it is
    /// cheap. Actions dispatched from inside `f` apply to the live document
    /// and are not visible through the snapshot.
    pub fn read<R>(&self, f: impl FnOnce(&EditorDocument) -> R) -> R {
        let snapshot = self.document.borrow().clone();
        f(&snapshot)
    }

    /// Drop every event handler.
    pub fn cleanup(&self) {
        self.bus.cleanup();
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::InsertStrategy;
    use crate::block::{BlockData, BlockPayload};
    use crate::errors::HistoryError;

    #[test]
    fn test_new_editor_seeds_history() {
        let editor = Editor::new(EditorConfig::default()).unwrap();

        assert_eq!(editor.history(), vec![r#"{"id":"root","children":[]}"#]);
        assert_eq!(editor.current_position_in_history(), Some(0));
        assert_eq!(editor.root().unwrap(), DocumentRoot::default());
    }

    #[test]
    fn test_zero_history_limit_is_rejected() {
        let result = Editor::new(EditorConfig::default().with_history_limit(0));

        assert!(matches!(
            result,
            Err(EditorError::History(HistoryError::InvalidHistoryLimit { limit: 0 }))
        ));
    }

    #[test]
    fn test_dispatch_inside_read_uses_live_document() {
        let editor = Editor::new(EditorConfig::default()).unwrap();

        let size_seen = editor.read(|doc| {
            editor
                .dispatch_action(EditorAction::insert(
                    BlockPayload::new("b1", BlockData::text("hi")),
                    "root",
                    InsertStrategy::Append,
                ))
                .unwrap();
            doc.size()
        });

        assert_eq!(size_seen, 1);
        assert_eq!(editor.read(|doc| doc.size()), 2);
        assert!(editor.block("b1").unwrap().is_some());
    }

    #[test]
    fn test_root_id_must_match_config() {
        let result = Editor::with_document(
            EditorDocument::with_root_id("page"),
            EditorConfig::default(),
        );
        assert!(result.is_err());

        let editor = Editor::new(EditorConfig::default().with_root_id("page")).unwrap();
        editor
            .dispatch_action(EditorAction::insert(
                BlockPayload::new("b1", BlockData::text("hi")),
                "page",
                InsertStrategy::Append,
            ))
            .unwrap();
        assert_eq!(editor.read(|doc| doc.size()), 2);
    }
}
