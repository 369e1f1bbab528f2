//! Session controller.
//!
//! Owns the active mode, the loaded pool, the per-source cache and the
//! divination selection. All state changes go through the methods here; render
//! layers only ever see [`Snapshot`]s.
//!
//! Loading is split into [`SessionController::begin_load`] and
//! [`SessionController::complete_load`] so the fetch itself can run elsewhere.
//! Every `begin_load` bumps a sequence number and fetches carry it in their
//! [`LoadTicket`]; a completion whose ticket is older than the latest load is
//! stale and never replaces the pool.

mod cache;
mod selection;

pub use cache::{CardPool, PoolCache};
use selection::Selection;
pub use selection::{Toggle, SPREAD_SIZE};

use crate::config::AppConfig;
use crate::error::LoadError;
use crate::model::{Card, CardView, LoadStatus, Mode, Snapshot, SpreadSlot, SpreadView};
use crate::source::{fetch_with_timeout, CardSource};
use crate::view;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Identifies one started fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    key: String,
}

impl LoadTicket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// What `begin_load` needs from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStart {
    /// Pool came from the cache and is already adopted.
    Cached,
    /// Caller must fetch `ticket.key()` and hand the result to `complete_load`.
    Fetch(LoadTicket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { count: usize },
    Failed,
    /// A newer load started after this one; result was not adopted.
    Stale,
}

pub struct SessionController {
    config: AppConfig,
    mode: Mode,
    pool: CardPool,
    cache: PoolCache,
    selection: Selection,
    spread_order: Vec<usize>,
    current: Option<usize>,
    status: LoadStatus,
    show_images: bool,
    load_seq: u64,
    rng: StdRng,
}

impl SessionController {
    /// New session with an entropy-seeded RNG; draws are not reproducible.
    pub fn new(config: AppConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: AppConfig, rng: StdRng) -> Self {
        Self {
            config,
            mode: Mode::Simple,
            pool: CardPool::default(),
            cache: PoolCache::default(),
            selection: Selection::default(),
            spread_order: Vec::new(),
            current: None,
            status: LoadStatus::Idle,
            show_images: true,
            load_seq: 0,
            rng,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn pool(&self) -> &[Card] {
        &self.pool
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, LoadStatus::Loading { .. })
    }

    pub fn selected(&self) -> &[usize] {
        self.selection.as_slice()
    }

    pub fn spread_order(&self) -> &[usize] {
        &self.spread_order
    }

    pub fn cache(&self) -> &PoolCache {
        &self.cache
    }

    pub fn set_show_images(&mut self, show: bool) {
        self.show_images = show;
    }

    fn is_ready(&self) -> bool {
        matches!(self.status, LoadStatus::Loaded { .. })
    }

    /// Enter `mode` from any state. Re-entering the active mode is a full
    /// reset as well.
    pub fn switch_mode(&mut self, mode: Mode) -> LoadStart {
        tracing::info!(from = %self.mode, to = %mode, "switching mode");
        self.mode = mode;
        self.selection.clear();
        self.spread_order.clear();
        self.current = None;

        if self.config.settings_for(&self.mode).is_none() {
            tracing::warn!(mode = %self.mode, "no source configured for mode, using simple source");
        }
        let key = self.config.source_for(&self.mode).to_string();
        self.begin_load(&key)
    }

    /// Start loading `key`. A cached pool is adopted immediately.
    pub fn begin_load(&mut self, key: &str) -> LoadStart {
        self.load_seq += 1;
        if let Some(pool) = self.cache.get(key) {
            tracing::debug!(key, "pool cache hit");
            self.adopt(key, pool);
            return LoadStart::Cached;
        }

        tracing::debug!(key, seq = self.load_seq, "pool cache miss, fetch required");
        self.status = LoadStatus::Loading {
            key: key.to_string(),
        };
        LoadStart::Fetch(LoadTicket {
            seq: self.load_seq,
            key: key.to_string(),
        })
    }

    /// Finish a fetch started by `begin_load`.
    ///
    /// Successful payloads are cached even when stale, since the data is valid
    /// for its key. Only the latest load may change the pool or the status.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Card>, LoadError>,
    ) -> LoadOutcome {
        let stale = ticket.seq != self.load_seq;
        match result {
            Ok(cards) => {
                let pool = self.cache.insert(&ticket.key, cards);
                if stale {
                    tracing::debug!(key = %ticket.key, seq = ticket.seq, latest = self.load_seq, "discarding stale pool");
                    return LoadOutcome::Stale;
                }
                let count = pool.len();
                tracing::info!(key = %ticket.key, count, "card pool loaded");
                self.adopt(&ticket.key, pool);
                LoadOutcome::Applied { count }
            }
            Err(err) => {
                if stale {
                    tracing::debug!(key = %ticket.key, error = %err, "ignoring stale load failure");
                    return LoadOutcome::Stale;
                }
                tracing::warn!(key = %ticket.key, error = %err, "card pool load failed");
                self.status = LoadStatus::Failed {
                    key: ticket.key,
                    kind: err.kind(),
                    error: err.to_string(),
                };
                LoadOutcome::Failed
            }
        }
    }

    /// Load `key`, fetching through `source` on a cache miss.
    pub async fn load_pool(&mut self, source: &dyn CardSource, key: &str) -> LoadOutcome {
        let start = self.begin_load(key);
        self.drive_load(source, start).await
    }

    /// `switch_mode` followed by the fetch it requires, if any.
    pub async fn enter_mode(&mut self, source: &dyn CardSource, mode: Mode) -> LoadOutcome {
        let start = self.switch_mode(mode);
        self.drive_load(source, start).await
    }

    async fn drive_load(&mut self, source: &dyn CardSource, start: LoadStart) -> LoadOutcome {
        match start {
            LoadStart::Cached => LoadOutcome::Applied {
                count: self.pool.len(),
            },
            LoadStart::Fetch(ticket) => {
                let result =
                    fetch_with_timeout(source, ticket.key(), self.config.fetch_timeout).await;
                self.complete_load(ticket, result)
            }
        }
    }

    fn adopt(&mut self, key: &str, pool: CardPool) {
        let count = pool.len();
        self.pool = pool;
        self.current = None;
        self.status = LoadStatus::Loaded {
            key: key.to_string(),
            count,
        };
        if self.mode.is_divination() {
            self.reset_spread();
        }
    }

    /// Draw one card uniformly at random. No-op outside the single-card modes
    /// or without a loaded, non-empty pool.
    pub fn draw_random(&mut self) -> Option<CardView> {
        if !self.mode.draws_single_card() || !self.is_ready() || self.pool.is_empty() {
            tracing::debug!(mode = %self.mode, status = ?self.status, "draw ignored");
            return None;
        }
        let index = self.rng.gen_range(0..self.pool.len());
        self.current = Some(index);
        Some(self.card_view(index))
    }

    /// Show a specific card from the simple mode card list.
    pub fn show_card(&mut self, index: usize) -> Option<CardView> {
        if self.mode != Mode::Simple || !self.is_ready() || index >= self.pool.len() {
            tracing::debug!(index, "show ignored");
            return None;
        }
        self.current = Some(index);
        Some(self.card_view(index))
    }

    /// Select or deselect a card of the divination spread.
    pub fn toggle_select(&mut self, index: usize) -> &[usize] {
        self.pick(index);
        self.selection.as_slice()
    }

    /// Like `toggle_select`, but reports what happened. `None` when the pick
    /// was ignored (wrong mode, no loaded pool, index out of range).
    pub fn pick(&mut self, index: usize) -> Option<Toggle> {
        if !self.mode.is_divination() || !self.is_ready() || index >= self.pool.len() {
            tracing::debug!(index, mode = %self.mode, "selection ignored");
            return None;
        }
        let outcome = self.selection.toggle(index);
        tracing::debug!(index, ?outcome, selected = self.selection.len(), "spread toggle");
        Some(outcome)
    }

    /// The six selected cards in selection order, once the spread is complete.
    pub fn reading(&self) -> Option<Vec<&Card>> {
        if !self.selection.is_complete() {
            return None;
        }
        self.selection
            .as_slice()
            .iter()
            .map(|&i| self.pool.get(i))
            .collect()
    }

    /// Clear the selection and lay out a fresh uniformly shuffled spread.
    pub fn reset_spread(&mut self) {
        self.selection.clear();
        let mut order: Vec<usize> = (0..self.pool.len()).collect();
        order.shuffle(&mut self.rng);
        self.spread_order = order;
    }

    pub fn toggle_images(&mut self) -> bool {
        self.show_images = !self.show_images;
        self.show_images
    }

    fn card_view(&self, index: usize) -> CardView {
        view::card_view(
            &self.config,
            &self.mode,
            &self.pool[index],
            index,
            self.show_images,
        )
    }

    fn spread_view(&self) -> SpreadView {
        let complete = self.selection.is_complete();
        let reading = complete.then(|| {
            self.selection
                .as_slice()
                .iter()
                .enumerate()
                .filter_map(|(n, &i)| self.pool.get(i).map(|c| view::reading_entry(n + 1, c, i)))
                .collect()
        });
        SpreadView {
            slots: self
                .spread_order
                .iter()
                .map(|&index| SpreadSlot {
                    index,
                    ordinal: self.selection.ordinal_of(index),
                })
                .collect(),
            selected: self.selection.as_slice().to_vec(),
            counter: view::selection_counter(self.selection.len()),
            prompt: (!complete).then(|| view::SPREAD_PROMPT.to_string()),
            reading,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let current_card = self
            .current
            .filter(|&i| i < self.pool.len())
            .map(|i| self.card_view(i));
        let card_list = if self.mode == Mode::Simple && self.is_ready() {
            self.pool
                .iter()
                .enumerate()
                .map(|(i, c)| view::list_label(c, i))
                .collect()
        } else {
            Vec::new()
        };
        Snapshot {
            mode: self.mode.clone(),
            pool_size: self.pool.len(),
            card_list,
            current_card,
            spread: self.mode.is_divination().then(|| self.spread_view()),
            loading: self.is_loading(),
            status: self.status.clone(),
            status_message: view::status_message(
                &self.config,
                &self.mode,
                &self.status,
                self.selection.len(),
            ),
            show_images: self.show_images,
        }
    }
}
