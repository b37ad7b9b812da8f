use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use folio_editor::{Editor, EditorAction, EditorConfig, EditorEvent, EventName, Subscription};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON file holding an array of actions
    pub actions: PathBuf,

    /// Starting document (defaults to an empty one)
    #[arg(short, long)]
    pub document: Option<PathBuf>,

    /// Write the final document JSON here
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Continue after a rejected action
    #[arg(long)]
    pub keep_going: bool,
}

pub fn replay(args: ReplayArgs, config: &EditorConfig) -> Result<()> {
    let actions = load_actions(&args.actions)?;
    let editor = match &args.document {
        Some(path) => Editor::from_json(&read(path)?, config.clone())?,
        None => Editor::new(config.clone())?,
    };

    println!(
        "▶ {} {} actions",
        "Replaying".green().bold(),
        actions.len()
    );

    info!(
        actions = actions.len(),
        seeded = args.document.is_some(),
        "replay started"
    );

    let subscriptions = print_domain_events(&editor);
    let rejected = apply_all(&editor, actions, args.keep_going)?;
    for subscription in subscriptions {
        subscription.unsubscribe();
    }

    let json = editor.document_json()?;
    match &args.out {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("   Output: {}", path.display());
        }
        None => println!("{json}"),
    }

    println!();
    println!(
        "✨ {} history has {} records, {} rejected",
        "Done".green().bold(),
        editor.history().len(),
        rejected
    );
    Ok(())
}

/// Run every action, returning how many were rejected.
fn apply_all(editor: &Editor, actions: Vec<EditorAction>, keep_going: bool) -> Result<usize> {
    let mut rejected = 0;
    for (index, action) in actions.into_iter().enumerate() {
        let action_type = action.action_type();
        debug!(index, action = action_type, "replaying action");
        if let Err(e) = editor.dispatch_action(action) {
            warn!(index, action = action_type, code = e.code(), "replayed action rejected");
            if !keep_going {
                return Err(anyhow!("action #{index} ({action_type}) rejected: {e}"));
            }
            rejected += 1;
            eprintln!(
                "  {} #{} {} - {}",
                "✗".red(),
                index,
                action_type,
                e.code().red()
            );
        }
    }
    Ok(rejected)
}

fn print_domain_events(editor: &Editor) -> Vec<Subscription> {
    let printer: Rc<dyn Fn(&EditorEvent)> = Rc::new(|event| {
        let payload = serde_json::to_value(event)
            .ok()
            .and_then(|mut value| value.get_mut("payload").map(serde_json::Value::take))
            .unwrap_or_default();
        println!("  {} {} {}", "✓".green(), event.name().as_str().cyan(), payload);
    });

    EventName::ALL
        .into_iter()
        .filter(|name| !matches!(name, EventName::EditorChange | EventName::EditorPersist))
        .map(|name| {
            let printer = Rc::clone(&printer);
            editor.subscribe_event(name, move |event| printer(event))
        })
        .collect()
}

fn load_actions(path: &Path) -> Result<Vec<EditorAction>> {
    serde_json::from_str(&read(path)?)
        .with_context(|| format!("Invalid action list in {}", path.display()))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_writes_final_document() {
        let dir = tempfile::tempdir().unwrap();
        let actions = dir.path().join("actions.json");
        let out = dir.path().join("out.json");
        fs::write(
            &actions,
            r#"[
                {"type":"block:insert","payload":{"newBlock":{"id":"a","type":"text","data":{"text":"hi"}},"targetId":"root","strategy":"append"}},
                {"type":"block:delete","payload":{"blockId":"missing"}},
                {"type":"history:undo","payload":{}},
                {"type":"history:redo","payload":{}}
            ]"#,
        )
        .unwrap();

        let args = ReplayArgs {
            actions: actions.clone(),
            document: None,
            out: Some(out.clone()),
            keep_going: true,
        };
        replay(args, &EditorConfig::default()).unwrap();

        let written = fs::read_to_string(&out).unwrap();
        assert!(written.contains(r#""id":"a""#));

        let strict = ReplayArgs {
            actions,
            document: None,
            out: None,
            keep_going: false,
        };
        assert!(replay(strict, &EditorConfig::default()).is_err());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_apply_all_logs_each_action() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let editor = Editor::new(EditorConfig::default()).unwrap();
        let actions = vec![EditorAction::undo(), EditorAction::delete("missing")];
        let rejected = tracing::subscriber::with_default(subscriber, || {
            apply_all(&editor, actions, true).unwrap()
        });

        assert_eq!(rejected, 1);
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("replaying action").count(), 2);
        assert!(output.contains("replayed action rejected"));
        assert!(output.contains("COMMAND:BLOCK_NOT_FOUND"));
    }
}
