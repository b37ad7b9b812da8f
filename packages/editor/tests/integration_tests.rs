//! Integration tests for the editor facade

use std::cell::RefCell;
use std::rc::Rc;

use folio_editor::{
    BlockData, BlockDeleteEvent, BlockInsertEvent, BlockPayload, ChildrenStrategy, CommandError,
    DocumentError, DocumentRoot, Editor, EditorAction, EditorChangeEvent, EditorConfig,
    EditorDocument, EditorError, EditorEvent, EditorPersistEvent, EventName, HistoryError,
    HistoryUndoEvent, InsertStrategy,
};
use serde_json::json;

fn editor() -> Editor {
    Editor::new(EditorConfig::default()).unwrap()
}

fn text(id: &str) -> BlockPayload {
    BlockPayload::new(id, BlockData::text(id))
}

fn append(editor: &Editor, payload: BlockPayload, target: &str) {
    editor
        .dispatch_action(EditorAction::insert(payload, target, InsertStrategy::Append))
        .unwrap();
}

#[test]
fn test_insert_into_empty_document() {
    let editor = editor();

    editor
        .dispatch_action(EditorAction::insert(
            BlockPayload::new("b1", BlockData::text("hi")),
            "root",
            InsertStrategy::Append,
        ))
        .unwrap();

    let root = editor.root().unwrap();
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].id, "b1");
    assert_eq!(root.children[0].parent_id, "root");
    assert_eq!(editor.history().len(), 2);
    assert_eq!(editor.current_position_in_history(), Some(1));
}

#[test]
fn test_update_with_drop_removes_old_subtree() {
    let editor = editor();
    append(
        &editor,
        BlockPayload::new("b1", BlockData::toggle_list("toggle", true)).with_children(vec![text("c1")]),
        "root",
    );

    editor
        .dispatch_action(EditorAction::update(
            "b1",
            BlockPayload::new("t1", BlockData::text("plain")),
            ChildrenStrategy::Drop,
        ))
        .unwrap();

    let json = editor.document_json().unwrap();
    assert!(!json.contains("c1"));
    editor.read(|doc| {
        assert!(!doc.contains("b1"));
        assert!(!doc.contains("c1"));
        assert!(doc.contains("t1"));
        assert!(doc.check_invariants().is_ok());
    });
}

#[test]
fn test_move_into_own_descendant_is_rejected() {
    let editor = editor();
    append(
        &editor,
        BlockPayload::new("x", BlockData::bullet_list("x"))
            .with_children(vec![BlockPayload::new("x-child", BlockData::toggle_list("c", true))]),
        "root",
    );
    let before = editor.document_json().unwrap();
    let history_before = editor.history();

    let err = editor
        .dispatch_action(EditorAction::move_block("x", "x-child", InsertStrategy::Append))
        .unwrap_err();

    assert!(matches!(
        err,
        EditorError::Document(DocumentError::CannotMoveBlockToDescendant { .. })
    ));
    assert_eq!(err.code(), "DOCUMENT:CANNOT_MOVE_BLOCK_TO_DESCENDANT");
    assert_eq!(editor.document_json().unwrap(), before);
    assert_eq!(editor.history(), history_before);
}

#[test]
fn test_set_history_with_mismatched_tail_is_rejected() {
    let editor = editor();
    append(&editor, text("a"), "root");
    let history_before = editor.history();

    let err = editor
        .set_history(vec![r#"{"id":"root","children":[]}"#.to_string()])
        .unwrap_err();

    assert!(matches!(
        err,
        EditorError::Command(CommandError::HistoryRecordMismatch { .. })
    ));
    assert_eq!(editor.history(), history_before);

    let err = editor.set_history(Vec::new()).unwrap_err();
    assert_eq!(err.code(), "COMMAND:HISTORY_RECORD_MISMATCH");
}

#[test]
fn test_set_history_accepts_equivalent_json() {
    let editor = editor();
    append(&editor, text("a"), "root");
    let current = editor.document_json().unwrap();
    let reformatted = serde_json::to_string_pretty(
        &serde_json::from_str::<serde_json::Value>(&current).unwrap(),
    )
    .unwrap();

    editor
        .set_history(vec!["{\"id\":\"root\",\"children\":[]}".to_string(), reformatted])
        .unwrap();

    assert_eq!(editor.history().len(), 2);
    assert_eq!(editor.current_position_in_history(), Some(1));
}

#[test]
fn test_swap_with_clear_history() {
    let editor = editor();
    append(&editor, text("a"), "root");
    append(&editor, text("b"), "root");

    let replacement = json!({
        "id": "root",
        "children": [
            { "id": "n1", "type": "quote", "data": { "text": "quoted" }, "parentId": "root" }
        ]
    })
    .to_string();
    editor.swap_document(replacement, true).unwrap();

    let history = editor.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0], editor.document_json().unwrap());
    assert_eq!(editor.current_position_in_history(), Some(0));
    assert!(editor.block("n1").unwrap().is_some());
}

#[test]
fn test_swap_without_clear_appends() {
    let editor = editor();
    append(&editor, text("a"), "root");

    let mut document = EditorDocument::new();
    document.append_child("root", &text("z")).unwrap();
    editor.swap_document(document, false).unwrap();

    assert_eq!(editor.history().len(), 3);
    assert!(editor.block("a").unwrap().is_none());

    editor.undo().unwrap();
    assert!(editor.block("a").unwrap().is_some());

    editor.swap_document(DocumentRoot::default(), false).unwrap();
    assert!(editor.root().unwrap().children.is_empty());
}

#[test]
fn test_swap_rejects_invalid_json() {
    let editor = editor();

    let err = editor.swap_document("{ not json", false).unwrap_err();
    assert_eq!(err.code(), "DOCUMENT:INVALID_JSON");

    let err = editor
        .swap_document(r#"{"id":"other","children":[]}"#, false)
        .unwrap_err();
    assert_eq!(err.code(), "DOCUMENT:INVALID_STRUCTURE");
    assert_eq!(editor.history().len(), 1);
}

#[test]
fn test_events_fire_in_fixed_order() {
    let editor = editor();
    let log = Rc::new(RefCell::new(Vec::new()));

    let mut subscriptions = Vec::new();
    for name in [
        EventName::BlockInsert,
        EventName::EditorChange,
        EventName::EditorPersist,
    ] {
        let log = Rc::clone(&log);
        subscriptions.push(
            editor.subscribe_event(name, move |event| log.borrow_mut().push(event.name())),
        );
    }

    append(&editor, text("a"), "root");

    assert_eq!(
        *log.borrow(),
        vec![
            EventName::BlockInsert,
            EventName::EditorChange,
            EventName::EditorPersist
        ]
    );
}

#[test]
fn test_change_and_persist_payloads() {
    let editor = editor();
    let changes = Rc::new(RefCell::new(Vec::<EditorChangeEvent>::new()));
    let persists = Rc::new(RefCell::new(Vec::<EditorPersistEvent>::new()));

    let sink = Rc::clone(&changes);
    let _change = editor.subscribe::<EditorChangeEvent>(move |e| sink.borrow_mut().push(e.clone()));
    let sink = Rc::clone(&persists);
    let _persist =
        editor.subscribe::<EditorPersistEvent>(move |e| sink.borrow_mut().push(e.clone()));

    append(&editor, text("a"), "root");

    let change = &changes.borrow()[0];
    assert_eq!(change.trigger_action, "block:insert");
    assert_eq!(change.current_position_in_history, Some(1));
    assert_eq!(change.history.len(), 2);
    assert_eq!(change.root.children[0].id, "a");
    assert_eq!(change.document_json, editor.document_json().unwrap());

    let persist = &persists.borrow()[0];
    assert_eq!(persist.trigger_action, "block:insert");
    assert_eq!(persist.document_json, change.document_json);
}

#[test]
fn test_failed_action_emits_nothing() {
    let editor = editor();
    let count = Rc::new(RefCell::new(0));

    let counter = Rc::clone(&count);
    let _sub = editor.subscribe::<EditorChangeEvent>(move |_| *counter.borrow_mut() += 1);

    let err = editor
        .dispatch_action(EditorAction::delete("missing"))
        .unwrap_err();

    assert_eq!(err.code(), "COMMAND:BLOCK_NOT_FOUND");
    assert_eq!(*count.borrow(), 0);
}

#[test]
fn test_no_op_undo_still_publishes() {
    let editor = editor();
    let undo_events = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&undo_events);
    let _sub = editor.subscribe::<HistoryUndoEvent>(move |e| sink.borrow_mut().push(e.clone()));

    editor.undo().unwrap();

    assert_eq!(
        *undo_events.borrow(),
        vec![HistoryUndoEvent {
            position: Some(0),
            changed: false
        }]
    );
    assert_eq!(editor.history().len(), 1);
}

#[test]
fn test_nested_dispatch_completes_before_outer_emission_continues() {
    let editor = Rc::new(editor());
    let log = Rc::new(RefCell::new(Vec::new()));

    let handle = Rc::downgrade(&editor);
    let nested_log = Rc::clone(&log);
    let _nested = editor.subscribe::<BlockInsertEvent>(move |e| {
        nested_log.borrow_mut().push(format!("insert:{}", e.block_id));
        if e.block_id == "a" {
            if let Some(editor) = handle.upgrade() {
                editor
                    .dispatch_action(EditorAction::delete("a"))
                    .unwrap();
            }
        }
    });

    let change_log = Rc::clone(&log);
    let _change = editor.subscribe::<EditorChangeEvent>(move |e| {
        change_log.borrow_mut().push(format!("change:{}", e.trigger_action));
    });

    let delete_log = Rc::clone(&log);
    let _delete = editor.subscribe::<BlockDeleteEvent>(move |e| {
        delete_log.borrow_mut().push(format!("delete:{}", e.block_id));
    });

    append(&editor, text("a"), "root");

    assert_eq!(
        *log.borrow(),
        vec![
            "insert:a",
            "delete:a",
            "change:block:delete",
            "change:block:insert"
        ]
    );
    assert!(editor.root().unwrap().children.is_empty());
    assert_eq!(editor.history().len(), 3);
}

#[test]
fn test_streams_filter_map_and_unsubscribe() {
    let editor = editor();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&seen);
    let sub = editor
        .on::<BlockInsertEvent>()
        .filter(|e| e.target_id == "list")
        .map(|e| e.block_id.to_uppercase())
        .subscribe(move |id| sink.borrow_mut().push(id.clone()));

    append(
        &editor,
        BlockPayload::new("list", BlockData::bullet_list("items")),
        "root",
    );
    append(&editor, text("a"), "list");
    sub.unsubscribe();
    append(&editor, text("b"), "list");

    assert_eq!(*seen.borrow(), vec!["A"]);
}

#[test]
fn test_on_any_stream_sees_raw_events() {
    let editor = editor();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&seen);
    let _sub = editor
        .on_any(EventName::EditorPersist)
        .tap(move |event| {
            if let EditorEvent::EditorPersist(persist) = event {
                sink.borrow_mut().push(persist.trigger_action.clone());
            }
        })
        .subscribe(|_| {});

    append(&editor, text("a"), "root");
    editor.undo().unwrap();

    assert_eq!(*seen.borrow(), vec!["block:insert", "history:undo"]);
}

#[test]
fn test_unsubscribe_by_id_and_cleanup() {
    let editor = editor();
    let sub = editor.subscribe::<EditorChangeEvent>(|_| {});
    let id = sub.id().unwrap();

    editor.unsubscribe(EventName::EditorChange, id).unwrap();
    let err = editor
        .unsubscribe(EventName::EditorChange, id)
        .unwrap_err();
    assert_eq!(err.code(), "EVENT:HANDLER_NOT_FOUND");
    assert!(err.is_event_error());

    let count = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&count);
    let _sub = editor.subscribe::<EditorChangeEvent>(move |_| *counter.borrow_mut() += 1);
    editor.cleanup();
    append(&editor, text("a"), "root");

    assert_eq!(*count.borrow(), 0);
}

#[test]
fn test_jump_out_of_range() {
    let editor = editor();
    append(&editor, text("a"), "root");

    for index in [-1, 2] {
        let err = editor.jump_to_point_in_history(index).unwrap_err();
        assert!(matches!(
            err,
            EditorError::History(HistoryError::HistoryIndexOutOfRange { length: 2, .. })
        ));
    }

    editor.jump_to_point_in_history(0).unwrap();
    assert!(editor.root().unwrap().children.is_empty());
    assert_eq!(editor.history().len(), 2);
}

#[test]
fn test_actions_from_wire_json() {
    let editor = editor();
    let actions: Vec<EditorAction> = serde_json::from_value(json!([
        {
            "type": "block:insert",
            "payload": {
                "newBlock": {
                    "id": "t1", "type": "toggleList", "data": { "text": "t", "open": false },
                    "children": [{ "id": "c1", "type": "heading", "data": { "text": "h", "level": 2 } }]
                },
                "targetId": "root",
                "strategy": "append"
            }
        },
        { "type": "block:move", "payload": { "blockId": "c1", "targetId": "t1", "strategy": "after" } },
        { "type": "history:undo", "payload": {} },
        { "type": "history:redo", "payload": {} }
    ]))
    .unwrap();

    for action in actions {
        editor.dispatch_action(action).unwrap();
    }

    let root = editor.root().unwrap();
    let ids: Vec<&str> = root.children.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "c1"]);
    assert_eq!(root.children[1].parent_id, "root");
    assert_eq!(editor.block("t1").unwrap().unwrap().children, Some(vec![]));
}
