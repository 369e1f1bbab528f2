use crate::error::{LoadErrorKind, UnknownMode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A card `name` or `id`. Sources use both strings and bare numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CardLabel {
    Text(String),
    Number(serde_json::Number),
}

impl CardLabel {
    fn is_blank(&self) -> bool {
        match self {
            CardLabel::Text(s) => s.trim().is_empty(),
            CardLabel::Number(_) => false,
        }
    }
}

impl fmt::Display for CardLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardLabel::Text(s) => f.write_str(s),
            CardLabel::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for CardLabel {
    fn from(s: &str) -> Self {
        CardLabel::Text(s.to_string())
    }
}

impl From<u64> for CardLabel {
    fn from(n: u64) -> Self {
        CardLabel::Number(n.into())
    }
}

// Strings and numbers are kept; any other JSON type reads as absent.
fn lenient_label<'de, D>(de: D) -> Result<Option<CardLabel>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::String(s)) => Some(CardLabel::Text(s)),
        Some(Value::Number(n)) => Some(CardLabel::Number(n)),
        _ => None,
    })
}

fn lenient_text<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_label(de)?.map(|label| label.to_string()))
}

/// One drawable card record as stored in the source JSON.
///
/// Every field is optional; unknown fields are ignored, and a field of the
/// wrong JSON type decodes as missing. Empty strings are treated the same as
/// missing values by the accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default, deserialize_with = "lenient_label", skip_serializing_if = "Option::is_none")]
    pub id: Option<CardLabel>,
    #[serde(default, deserialize_with = "lenient_label", skip_serializing_if = "Option::is_none")]
    pub name: Option<CardLabel>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Card {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn name(&self) -> Option<&CardLabel> {
        self.name.as_ref().filter(|n| !n.is_blank())
    }

    pub fn id(&self) -> Option<&CardLabel> {
        self.id.as_ref().filter(|n| !n.is_blank())
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// The active presentation mode of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mode {
    /// Single random card with image and card list.
    #[default]
    Simple,
    /// Six-card spread picked from a shuffled face-down deck.
    Divination,
    /// Text-only passages for one language, e.g. `hiddenen`.
    HiddenText(String),
}

impl Mode {
    const HIDDEN_PREFIX: &'static str = "hidden";

    pub fn name(&self) -> String {
        match self {
            Mode::Simple => "simple".to_string(),
            Mode::Divination => "divination".to_string(),
            Mode::HiddenText(lang) => format!("{}{}", Self::HIDDEN_PREFIX, lang),
        }
    }

    /// Modes where `draw_random` is meaningful.
    pub fn draws_single_card(&self) -> bool {
        matches!(self, Mode::Simple | Mode::HiddenText(_))
    }

    pub fn is_divination(&self) -> bool {
        matches!(self, Mode::Divination)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "simple" => Ok(Mode::Simple),
            "divination" => Ok(Mode::Divination),
            _ => match s.strip_prefix(Self::HIDDEN_PREFIX) {
                Some(lang) if !lang.is_empty() && lang.chars().all(|c| c.is_ascii_alphabetic()) => {
                    Ok(Mode::HiddenText(lang.to_ascii_lowercase()))
                }
                _ => Err(UnknownMode(s.to_string())),
            },
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = UnknownMode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.name()
    }
}

/// Load state of the current pool.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading {
        key: String,
    },
    Loaded {
        key: String,
        count: usize,
    },
    Failed {
        key: String,
        kind: LoadErrorKind,
        error: String,
    },
}

/// A card prepared for display in the current mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    /// Index into the pool the card was taken from.
    pub index: usize,
    pub title: String,
    pub description: String,
    /// `None` when the card has no image or images are switched off.
    pub image_url: Option<String>,
}

/// One line of a completed divination reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingEntry {
    /// 1-based position in selection order.
    pub ordinal: usize,
    pub index: usize,
    pub heading: String,
    pub description: String,
}

/// One face-down position of the spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpreadSlot {
    /// Pool index of the card at this position.
    pub index: usize,
    /// 1-based pick position, if the card is selected.
    pub ordinal: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadView {
    /// Positions in shuffled presentation order.
    pub slots: Vec<SpreadSlot>,
    /// Selected pool indices in selection order.
    pub selected: Vec<usize>,
    pub counter: String,
    /// Shown while fewer than six cards are selected.
    pub prompt: Option<String>,
    /// Present once the spread is complete, in selection order.
    pub reading: Option<Vec<ReadingEntry>>,
}

/// Immutable render input produced by the session controller.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub pool_size: usize,
    /// Display labels for the card list, in pool order (simple mode only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub card_list: Vec<String>,
    pub current_card: Option<CardView>,
    pub spread: Option<SpreadView>,
    pub loading: bool,
    pub status: LoadStatus,
    pub status_message: String,
    pub show_images: bool,
}

/// Events emitted by the orchestrator and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Snapshot(Box<Snapshot>),
    Drawn { card: CardView },
    Info(InfoEvent),
}

/// Structured info events about pool loading.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoEvent {
    Message(String),
    CacheHit { key: String },
    FetchStarted { key: String },
    StaleDiscarded { key: String },
    LoadFailed {
        key: String,
        kind: LoadErrorKind,
        error: String,
    },
    /// A seventh pick was refused.
    SpreadFull,
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::CacheHit { key } => format!("Using cached pool for {key}"),
            InfoEvent::FetchStarted { key } => format!("Fetching {key}"),
            InfoEvent::StaleDiscarded { key } => {
                format!("Discarded outdated response for {key}")
            }
            InfoEvent::LoadFailed { key, kind, error } => {
                format!("Loading {key} failed ({}): {error}", kind.label())
            }
            InfoEvent::SpreadFull => "Spread is full; return a card to pick another".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_names_round_trip_through_parse() {
        for name in ["simple", "divination", "hiddenen", "hiddenzh"] {
            let mode: Mode = name.parse().unwrap();
            assert_eq!(mode.name(), name);
        }
        assert_eq!(
            "hiddenzh".parse::<Mode>().unwrap(),
            Mode::HiddenText("zh".into())
        );
    }

    #[test]
    fn unknown_mode_names_are_rejected() {
        assert!("".parse::<Mode>().is_err());
        assert!("hidden".parse::<Mode>().is_err());
        assert!("hidden-en".parse::<Mode>().is_err());
        assert_eq!(
            "tarot".parse::<Mode>(),
            Err(UnknownMode("tarot".to_string()))
        );
    }

    #[test]
    fn card_fields_default_when_missing() {
        let card: Card = serde_json::from_str(r#"{"id": 7, "extra": true}"#).unwrap();
        assert_eq!(card.id(), Some(&CardLabel::from(7u64)));
        assert!(card.name().is_none());
        assert_eq!(card.description(), "");
        assert!(card.image().is_none());
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let card: Card =
            serde_json::from_str(r#"{"name": "  ", "image": "", "description": null}"#).unwrap();
        assert!(card.name().is_none());
        assert!(card.image().is_none());
        assert_eq!(card.description(), "");
    }

    #[test]
    fn numeric_names_display_without_quotes() {
        let card: Card = serde_json::from_str(r#"{"name": 12}"#).unwrap();
        assert_eq!(card.name().unwrap().to_string(), "12");
    }

    #[test]
    fn wrong_field_types_read_as_missing() {
        let card: Card = serde_json::from_str(
            r#"{"name": true, "id": [1], "description": 5, "image": {"src": "x.png"}}"#,
        )
        .unwrap();
        assert!(card.name().is_none());
        assert!(card.id().is_none());
        assert_eq!(card.description(), "5");
        assert!(card.image().is_none());
    }
}
