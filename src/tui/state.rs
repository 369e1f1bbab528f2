use crate::model::{Mode, SessionEvent, Snapshot};

/// Width of one face-down card cell in the spread grid, including spacing.
pub const SPREAD_CELL_WIDTH: u16 = 5;

/// Number of spread cells that fit on one row of `area_width`.
pub fn spread_columns(area_width: u16) -> usize {
    // Account for borders (1 char on each side)
    (area_width.saturating_sub(2) / SPREAD_CELL_WIDTH).max(1) as usize
}

/// UI-thread state. Holds the latest session snapshot plus cursor positions;
/// never mutated from outside the UI thread.
pub struct UiState {
    pub tab: usize,
    pub info: String,
    pub modes: Vec<Mode>,
    pub snapshot: Option<Snapshot>,
    pub spread_cursor: usize,
    pub list_cursor: usize,
}

impl UiState {
    pub fn new(modes: Vec<Mode>) -> Self {
        Self {
            tab: 0,
            info: String::new(),
            modes,
            snapshot: None,
            spread_cursor: 0,
            list_cursor: 0,
        }
    }

    pub fn apply_event(&mut self, ev: SessionEvent) {
        match ev {
            SessionEvent::Snapshot(snap) => {
                let mode_changed = self.mode() != Some(&snap.mode);
                self.snapshot = Some(*snap);
                if mode_changed {
                    self.spread_cursor = 0;
                    self.list_cursor = 0;
                }
                self.clamp_cursors();
            }
            SessionEvent::Drawn { card } => {
                self.info = format!("Drew: {}", card.title);
            }
            SessionEvent::Info(info) => {
                self.info = info.to_message();
            }
        }
    }

    pub fn mode(&self) -> Option<&Mode> {
        self.snapshot.as_ref().map(|s| &s.mode)
    }

    /// Position of the active mode in the mode tabs.
    pub fn mode_index(&self) -> Option<usize> {
        let mode = self.mode()?;
        self.modes.iter().position(|m| m == mode)
    }

    /// Mode after the active one, wrapping around.
    pub fn next_mode(&self) -> Option<Mode> {
        if self.modes.is_empty() {
            return None;
        }
        let next = self.mode_index().map(|i| (i + 1) % self.modes.len()).unwrap_or(0);
        self.modes.get(next).cloned()
    }

    fn spread_len(&self) -> usize {
        self.snapshot
            .as_ref()
            .and_then(|s| s.spread.as_ref())
            .map(|sp| sp.slots.len())
            .unwrap_or(0)
    }

    fn list_len(&self) -> usize {
        self.snapshot.as_ref().map(|s| s.card_list.len()).unwrap_or(0)
    }

    fn clamp_cursors(&mut self) {
        self.spread_cursor = self.spread_cursor.min(self.spread_len().saturating_sub(1));
        self.list_cursor = self.list_cursor.min(self.list_len().saturating_sub(1));
    }

    pub fn move_spread_cursor(&mut self, delta: isize) {
        let len = self.spread_len();
        if len == 0 {
            return;
        }
        let next = self.spread_cursor as isize + delta;
        self.spread_cursor = next.clamp(0, len as isize - 1) as usize;
    }

    pub fn move_list_cursor(&mut self, delta: isize) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let next = self.list_cursor as isize + delta;
        self.list_cursor = next.clamp(0, len as isize - 1) as usize;
    }

    /// Pool index of the spread card under the cursor.
    pub fn cursor_pool_index(&self) -> Option<usize> {
        self.snapshot
            .as_ref()?
            .spread
            .as_ref()?
            .slots
            .get(self.spread_cursor)
            .map(|slot| slot.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CardView, InfoEvent, LoadStatus, SpreadSlot, SpreadView};

    fn divination_snapshot(order: Vec<usize>) -> Snapshot {
        Snapshot {
            mode: Mode::Divination,
            pool_size: order.len(),
            card_list: Vec::new(),
            current_card: None,
            spread: Some(SpreadView {
                slots: order
                    .into_iter()
                    .map(|index| SpreadSlot { index, ordinal: None })
                    .collect(),
                selected: Vec::new(),
                counter: String::new(),
                prompt: None,
                reading: None,
            }),
            loading: false,
            status: LoadStatus::Idle,
            status_message: String::new(),
            show_images: true,
        }
    }

    fn modes() -> Vec<Mode> {
        vec![Mode::Simple, Mode::Divination, Mode::HiddenText("en".into())]
    }

    #[test]
    fn cursor_maps_through_shuffled_order() {
        let mut state = UiState::new(modes());
        state.apply_event(SessionEvent::Snapshot(Box::new(divination_snapshot(vec![3, 0, 2, 1]))));
        state.move_spread_cursor(2);
        assert_eq!(state.cursor_pool_index(), Some(2));
        state.move_spread_cursor(10);
        assert_eq!(state.cursor_pool_index(), Some(1));
        state.move_spread_cursor(-10);
        assert_eq!(state.cursor_pool_index(), Some(3));
    }

    #[test]
    fn mode_change_resets_cursors() {
        let mut state = UiState::new(modes());
        state.apply_event(SessionEvent::Snapshot(Box::new(divination_snapshot(vec![0, 1, 2]))));
        state.move_spread_cursor(2);

        let mut simple = divination_snapshot(vec![]);
        simple.mode = Mode::Simple;
        simple.spread = None;
        state.apply_event(SessionEvent::Snapshot(Box::new(simple)));
        assert_eq!(state.spread_cursor, 0);
        assert_eq!(state.mode_index(), Some(0));
        assert_eq!(state.next_mode(), Some(Mode::Divination));
    }

    #[test]
    fn next_mode_wraps() {
        let mut state = UiState::new(modes());
        let mut snap = divination_snapshot(vec![]);
        snap.mode = Mode::HiddenText("en".into());
        state.apply_event(SessionEvent::Snapshot(Box::new(snap)));
        assert_eq!(state.next_mode(), Some(Mode::Simple));
    }

    #[test]
    fn info_and_draw_events_update_message() {
        let mut state = UiState::new(modes());
        state.apply_event(SessionEvent::Info(InfoEvent::FetchStarted {
            key: "cards_filled.json".into(),
        }));
        assert_eq!(state.info, "Fetching cards_filled.json");
        state.apply_event(SessionEvent::Drawn {
            card: CardView {
                index: 0,
                title: "Fool".into(),
                description: String::new(),
                image_url: None,
            },
        });
        assert_eq!(state.info, "Drew: Fool");
    }

    #[test]
    fn spread_columns_never_zero() {
        assert_eq!(spread_columns(0), 1);
        assert_eq!(spread_columns(52), 10);
    }
}
