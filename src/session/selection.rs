/// Number of cards in a complete divination spread.
pub const SPREAD_SIZE: usize = 6;

/// Result of toggling one pool index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Added at this 1-based position in the reading.
    Selected(usize),
    Deselected,
    /// Spread already full; nothing changed.
    Full,
}

/// Pool indices picked for a spread, kept in pick order and capped at
/// [`SPREAD_SIZE`]. A full selection never evicts older picks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    picks: Vec<usize>,
}

impl Selection {
    pub fn toggle(&mut self, index: usize) -> Toggle {
        if let Some(pos) = self.picks.iter().position(|&i| i == index) {
            self.picks.remove(pos);
            Toggle::Deselected
        } else if self.picks.len() < SPREAD_SIZE {
            self.picks.push(index);
            Toggle::Selected(self.picks.len())
        } else {
            Toggle::Full
        }
    }

    /// 1-based reading position of `index`, if picked.
    pub fn ordinal_of(&self, index: usize) -> Option<usize> {
        self.picks.iter().position(|&i| i == index).map(|p| p + 1)
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_complete(&self) -> bool {
        self.picks.len() == SPREAD_SIZE
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.picks
    }

    pub fn clear(&mut self) {
        self.picks.clear();
    }
}
