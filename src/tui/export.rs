use crate::model::Snapshot;
use anyhow::Result;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Plain-text rendering of what is on screen: the reading in divination mode,
/// the current card otherwise. `None` when there is nothing to copy.
pub fn snapshot_text(snapshot: &Snapshot) -> Option<String> {
    if let Some(spread) = snapshot.spread.as_ref() {
        spread.reading.as_ref()?;
    }
    let summary = crate::text_summary::build_text_summary(snapshot, &[]);
    if summary.lines.is_empty() {
        None
    } else {
        Some(summary.lines.join("\n"))
    }
}

/// Initialize the clipboard manager thread if not already initialized.
/// Clipboard instances are kept alive for a while after each write so that
/// clipboard managers on Linux have time to read the contents.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Queue `text` for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}
