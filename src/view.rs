//! Display text for cards, readings and status lines.

use crate::config::AppConfig;
use crate::model::{Card, CardView, LoadStatus, Mode, ReadingEntry};
use crate::session::SPREAD_SIZE;

pub const UNNAMED_CARD: &str = "未命名卡牌";
pub const UNNAMED_READING_CARD: &str = "未命名";
pub const LOADING_MESSAGE: &str = "正在載入資料...";
pub const SPREAD_PROMPT: &str = "請繼續挑選，感受卡片的訊息...";
pub const SPREAD_COMPLETE: &str = "✦ 挑選完成 ✦";

const DEFAULT_TEXT_PREFIX: &str = "No.";

/// Title of `card` as shown in `mode`.
///
/// Text-only modes prefix the name with the configured `title_prefix`; cards
/// without a name fall back to `id_prefix` + id, and cards without either use
/// their 1-based pool position.
pub fn card_title(cfg: &AppConfig, mode: &Mode, card: &Card, index: usize) -> String {
    match mode {
        Mode::HiddenText(_) => {
            let settings = cfg.settings_for(mode);
            let title_prefix = settings
                .and_then(|s| s.title_prefix.as_deref())
                .unwrap_or(DEFAULT_TEXT_PREFIX);
            let id_prefix = settings
                .and_then(|s| s.id_prefix.as_deref())
                .unwrap_or(DEFAULT_TEXT_PREFIX);
            match (card.name(), card.id()) {
                (Some(name), _) => format!("{title_prefix}{name}"),
                (None, Some(id)) => format!("{id_prefix}{id}"),
                (None, None) => format!("{id_prefix}{}", index + 1),
            }
        }
        Mode::Simple | Mode::Divination => card
            .name()
            .map(|n| n.to_string())
            .unwrap_or_else(|| UNNAMED_CARD.to_string()),
    }
}

pub fn card_view(
    cfg: &AppConfig,
    mode: &Mode,
    card: &Card,
    index: usize,
    show_images: bool,
) -> CardView {
    // Text-only modes never carry images.
    let image_url = if show_images && !matches!(mode, Mode::HiddenText(_)) {
        card.image().map(|img| cfg.image_url(img))
    } else {
        None
    };
    CardView {
        index,
        title: card_title(cfg, mode, card, index),
        description: card.description().to_string(),
        image_url,
    }
}

/// Card list label for the simple mode browser.
pub fn list_label(card: &Card, index: usize) -> String {
    match card.name() {
        Some(name) => name.to_string(),
        None => format!("{UNNAMED_CARD} #{}", index + 1),
    }
}

pub fn reading_entry(ordinal: usize, card: &Card, index: usize) -> ReadingEntry {
    let name = card
        .name()
        .map(|n| n.to_string())
        .unwrap_or_else(|| UNNAMED_READING_CARD.to_string());
    ReadingEntry {
        ordinal,
        index,
        heading: format!("第 {ordinal} 張：{name}"),
        description: card.description().to_string(),
    }
}

pub fn selection_counter(count: usize) -> String {
    if count < SPREAD_SIZE {
        format!("請繼續挑選 ({count} / {SPREAD_SIZE})")
    } else {
        SPREAD_COMPLETE.to_string()
    }
}

pub fn status_message(cfg: &AppConfig, mode: &Mode, status: &LoadStatus, selected: usize) -> String {
    match status {
        LoadStatus::Idle => String::new(),
        LoadStatus::Loading { .. } => LOADING_MESSAGE.to_string(),
        LoadStatus::Failed { key, .. } => {
            format!("資料載入失敗，請確認網頁目錄下是否有 {key}")
        }
        LoadStatus::Loaded { count, .. } => match mode {
            Mode::Simple => format!("已載入卡池：共 {count} 張卡。"),
            Mode::Divination => selection_counter(selected),
            Mode::HiddenText(lang) => {
                let label = cfg
                    .settings_for(mode)
                    .and_then(|s| s.label.clone())
                    .unwrap_or_else(|| format!("隱言經({lang})"));
                format!("已載入{label}：共 {count} 條聖言。")
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden(lang: &str) -> Mode {
        Mode::HiddenText(lang.to_string())
    }

    #[test]
    fn text_titles_prefer_name_then_id() {
        let cfg = AppConfig::default();
        let named = Card::named("12");
        assert_eq!(card_title(&cfg, &hidden("en"), &named, 0), "Hidden Word No.12");

        let by_id = Card {
            id: Some(7u64.into()),
            ..Default::default()
        };
        assert_eq!(card_title(&cfg, &hidden("en"), &by_id, 0), "No.7");
        assert_eq!(card_title(&cfg, &hidden("zh"), &by_id, 0), "編號 7");
    }

    #[test]
    fn unconfigured_language_uses_plain_prefix() {
        let cfg = AppConfig::default();
        let bare = Card::default();
        assert_eq!(card_title(&cfg, &hidden("fr"), &bare, 4), "No.5");
    }

    #[test]
    fn simple_titles_use_placeholder() {
        let cfg = AppConfig::default();
        assert_eq!(card_title(&cfg, &Mode::Simple, &Card::default(), 0), UNNAMED_CARD);
        assert_eq!(list_label(&Card::default(), 2), "未命名卡牌 #3");
    }

    #[test]
    fn images_resolve_against_base_path_and_respect_toggle() {
        let cfg = AppConfig::default();
        let card = Card {
            image: Some("Fool.png".into()),
            ..Card::named("Fool")
        };
        let shown = card_view(&cfg, &Mode::Simple, &card, 0, true);
        assert_eq!(shown.image_url.as_deref(), Some("imgs/Fool.png"));
        assert!(card_view(&cfg, &Mode::Simple, &card, 0, false).image_url.is_none());
        assert!(card_view(&cfg, &hidden("en"), &card, 0, true).image_url.is_none());
    }

    #[test]
    fn reading_heading_counts_from_one() {
        let entry = reading_entry(3, &Card::named("Star"), 9);
        assert_eq!(entry.heading, "第 3 張：Star");
        assert_eq!(reading_entry(1, &Card::default(), 0).heading, "第 1 張：未命名");
    }

    #[test]
    fn status_lines_per_mode() {
        let cfg = AppConfig::default();
        let loaded = LoadStatus::Loaded {
            key: "k".into(),
            count: 22,
        };
        assert_eq!(
            status_message(&cfg, &Mode::Simple, &loaded, 0),
            "已載入卡池：共 22 張卡。"
        );
        assert_eq!(
            status_message(&cfg, &hidden("en"), &loaded, 0),
            "已載入隱言經(英)：共 22 條聖言。"
        );
        assert_eq!(
            status_message(&cfg, &Mode::Divination, &loaded, 2),
            "請繼續挑選 (2 / 6)"
        );
        assert_eq!(
            status_message(&cfg, &Mode::Divination, &loaded, 6),
            SPREAD_COMPLETE
        );
    }
}
