//! Text summary builder for CLI output.
//!
//! Formats a session snapshot and the cards drawn during a one-shot run as
//! human-readable lines for text mode and clipboard export.

use crate::model::{CardView, Mode, Snapshot};

/// Pre-formatted lines for text output.
pub struct TextSummary {
    pub lines: Vec<String>,
}

fn push_card(lines: &mut Vec<String>, card: &CardView) {
    lines.push(card.title.clone());
    if !card.description.trim().is_empty() {
        lines.push(format!("  {}", card.description));
    }
    if let Some(url) = card.image_url.as_deref() {
        lines.push(format!("  Image: {url}"));
    }
}

/// Build a text summary from a snapshot and any cards drawn along the way.
///
/// When `drawn` is empty the snapshot's current card (if any) is used instead.
pub fn build_text_summary(snapshot: &Snapshot, drawn: &[CardView]) -> TextSummary {
    let mut lines = Vec::new();

    match &snapshot.mode {
        Mode::Divination => {
            if let Some(spread) = snapshot.spread.as_ref() {
                lines.push(spread.counter.clone());
                match spread.reading.as_ref() {
                    Some(reading) => {
                        for entry in reading {
                            lines.push(entry.heading.clone());
                            if !entry.description.trim().is_empty() {
                                lines.push(format!("  {}", entry.description));
                            }
                        }
                    }
                    None => {
                        if let Some(prompt) = spread.prompt.as_deref() {
                            lines.push(prompt.to_string());
                        }
                    }
                }
            }
        }
        Mode::Simple | Mode::HiddenText(_) => {
            if drawn.is_empty() {
                if let Some(card) = snapshot.current_card.as_ref() {
                    push_card(&mut lines, card);
                }
            } else {
                for (n, card) in drawn.iter().enumerate() {
                    if drawn.len() > 1 {
                        lines.push(format!("[{}]", n + 1));
                    }
                    push_card(&mut lines, card);
                }
            }
        }
    }

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LoadStatus, ReadingEntry, SpreadView};

    fn snapshot(mode: Mode) -> Snapshot {
        Snapshot {
            mode,
            pool_size: 0,
            card_list: Vec::new(),
            current_card: None,
            spread: None,
            loading: false,
            status: LoadStatus::Idle,
            status_message: String::new(),
            show_images: true,
        }
    }

    fn view(title: &str, description: &str) -> CardView {
        CardView {
            index: 0,
            title: title.into(),
            description: description.into(),
            image_url: None,
        }
    }

    #[test]
    fn numbers_multiple_draws() {
        let snap = snapshot(Mode::Simple);
        let summary = build_text_summary(&snap, &[view("Fool", "begin"), view("Star", "")]);
        assert_eq!(summary.lines, vec!["[1]", "Fool", "  begin", "[2]", "Star"]);
    }

    #[test]
    fn falls_back_to_current_card() {
        let mut snap = snapshot(Mode::HiddenText("en".into()));
        snap.current_card = Some(CardView {
            image_url: Some("imgs/x.png".into()),
            ..view("Hidden Word No.3", "O Son of Spirit")
        });
        let summary = build_text_summary(&snap, &[]);
        assert_eq!(
            summary.lines,
            vec!["Hidden Word No.3", "  O Son of Spirit", "  Image: imgs/x.png"]
        );
    }

    #[test]
    fn lists_reading_in_order() {
        let mut snap = snapshot(Mode::Divination);
        snap.spread = Some(SpreadView {
            slots: vec![],
            selected: vec![2, 0],
            counter: "✦ 挑選完成 ✦".into(),
            prompt: None,
            reading: Some(vec![
                ReadingEntry {
                    ordinal: 1,
                    index: 2,
                    heading: "第 1 張：C".into(),
                    description: "c".into(),
                },
                ReadingEntry {
                    ordinal: 2,
                    index: 0,
                    heading: "第 2 張：A".into(),
                    description: String::new(),
                },
            ]),
        });
        let summary = build_text_summary(&snap, &[]);
        assert_eq!(
            summary.lines,
            vec!["✦ 挑選完成 ✦", "第 1 張：C", "  c", "第 2 張：A"]
        );
    }
}
