use std::collections::HashMap;

use chrono::Utc;
use once_cell::sync::Lazy;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    ai::{ClassificationRequest, ClassifyError},
    config::{env::DEFAULT_SITE_ORIGIN, PipelineConfig},
    domain::{ClassificationMap, HiddenReason, HiddenVideosSnapshot, QueueSnapshot, Settings},
    dom::{MutationRecord, NodeId, Page},
    tasks::queue::{BatchQueue, PendingBatch},
};

use super::{
    cache::ClassificationCache,
    extract::{extract_title, extract_video_url, CARD_SELECTOR},
    keywords::matching_keyword,
    ledger::HiddenLedger,
    tracker::{ElementState, ElementTracker},
    visibility,
};

static DEFAULT_ORIGIN: Lazy<Url> =
    Lazy::new(|| Url::parse(DEFAULT_SITE_ORIGIN).expect("valid default origin"));

pub type BatchId = u64;

/// A flushed batch ready to be sent to the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub id: BatchId,
    pub generation: u64,
    pub request: ClassificationRequest,
}

/// All pipeline state for one page: settings snapshot, AI decision cache,
/// per-card states, the debounced queue, batches in flight and the hidden
/// ledger. Synchronous; time is passed in so callers control the clock.
pub struct FilterEngine {
    config: PipelineConfig,
    origin: Url,
    settings: Settings,
    cache: ClassificationCache,
    tracker: ElementTracker,
    queue: BatchQueue,
    in_flight: HashMap<BatchId, PendingBatch>,
    in_flight_titles: HashMap<String, BatchId>,
    ledger: HiddenLedger,
    generation: u64,
    next_batch: BatchId,
    last_url: Option<String>,
    settle_deadline: Option<Instant>,
    initialized: bool,
}

impl FilterEngine {
    pub fn new(config: PipelineConfig) -> Self {
        let origin = Url::parse(&config.site_origin).unwrap_or_else(|err| {
            warn!(
                target: "filter",
                origin = %config.site_origin,
                error = %err,
                "invalid site origin; using default"
            );
            DEFAULT_ORIGIN.clone()
        });
        Self {
            queue: BatchQueue::new(config.debounce),
            ledger: HiddenLedger::new(config.history_limit),
            config,
            origin,
            settings: Settings::default(),
            cache: ClassificationCache::new(),
            tracker: ElementTracker::new(),
            in_flight: HashMap::new(),
            in_flight_titles: HashMap::new(),
            generation: 0,
            next_batch: 1,
            last_url: None,
            settle_deadline: None,
            initialized: false,
        }
    }

    /// Installs the loader styles and filters every card already on the page.
    /// Does nothing when already initialized.
    pub fn init<P: Page + ?Sized>(&mut self, page: &mut P, settings: Settings, now: Instant) {
        if self.initialized {
            debug!(target: "filter", "filter already initialized");
            return;
        }
        self.settings = settings;
        visibility::install_styles(page);
        self.last_url = Some(page.url().to_string());
        self.initialized = true;
        let cards = self.process_existing(page, now);
        info!(
            target: "filter",
            cards,
            keywords = self.settings.keywords.len(),
            ai = self.settings.ai_active(),
            "filter initialized"
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Feeds one observer callback's worth of childList records.
    pub fn handle_mutations<P: Page + ?Sized>(
        &mut self,
        page: &mut P,
        records: &[MutationRecord],
        now: Instant,
    ) {
        if records
            .iter()
            .any(|r| matches!(r, MutationRecord::Removed(_)))
        {
            self.forget_detached(page);
        }
        self.check_navigation(page, now);

        let mut discovered = Vec::new();
        for record in records {
            if let MutationRecord::Added(node) = record {
                self.discover(page, *node, &mut discovered);
            }
        }
        if !discovered.is_empty() {
            self.dispatch(page, discovered, now);
        }
    }

    /// Detects a same-document navigation. On a URL change the ledger,
    /// loaders and card states are reset and a rescan is scheduled after the
    /// settle delay.
    pub fn check_navigation<P: Page + ?Sized>(&mut self, page: &mut P, now: Instant) -> bool {
        let url = page.url().to_string();
        if self.last_url.as_deref() == Some(url.as_str()) {
            return false;
        }
        let previous = self.last_url.replace(url.clone());
        info!(target: "filter", from = ?previous, to = %url, "page navigation detected");

        self.ledger.clear();
        self.tracker.clear();
        self.forget_detached(page);
        visibility::remove_all_loaders(page);
        self.settle_deadline = Some(now + self.config.settle_delay);
        true
    }

    /// Earliest instant at which `poll` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.queue.deadline(), self.settle_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Runs due timers: the post-navigation rescan and the debounced flush.
    pub fn poll<P: Page + ?Sized>(&mut self, page: &mut P, now: Instant) -> Option<BatchJob> {
        if self.settle_deadline.is_some_and(|deadline| now >= deadline) {
            self.settle_deadline = None;
            let cards = self.process_existing(page, now);
            debug!(target: "filter", cards, "rescanned after navigation");
        }
        if self.queue.is_due(now) {
            return self.flush();
        }
        None
    }

    /// Moves every queued title into a new in-flight batch.
    pub fn flush(&mut self) -> Option<BatchJob> {
        let QueueSnapshot {
            pending_titles,
            pending_elements,
        } = self.queue.snapshot();
        let cards = self.queue.take();
        if cards.is_empty() {
            return None;
        }

        let id = self.next_batch;
        self.next_batch += 1;
        let titles: Vec<String> = cards.keys().cloned().collect();
        for title in &titles {
            self.in_flight_titles.insert(title.clone(), id);
        }
        self.in_flight.insert(id, cards);

        info!(
            target: "queue",
            batch = id,
            titles = pending_titles,
            cards = pending_elements,
            "flushing AI batch"
        );
        Some(BatchJob {
            id,
            generation: self.generation,
            request: ClassificationRequest {
                titles,
                criteria: self.settings.ai_filter.clone(),
                api_key: self.settings.api_key.clone(),
            },
        })
    }

    /// Applies a classifier outcome to every card waiting on the batch.
    /// Failures fail open and leave the cache untouched. Results for a batch
    /// that a reload superseded are dropped.
    pub fn complete_batch<P: Page + ?Sized>(
        &mut self,
        page: &mut P,
        id: BatchId,
        outcome: Result<ClassificationMap, ClassifyError>,
    ) {
        let Some(cards) = self.in_flight.remove(&id) else {
            debug!(target: "filter", batch = id, "discarding result of a superseded batch");
            return;
        };
        self.in_flight_titles.retain(|_, owner| *owner != id);

        match outcome {
            Ok(results) => {
                self.cache.extend(&results);
                let mut hidden = 0usize;
                for (title, waiting) in cards {
                    let hide = results.get(&title).copied().unwrap_or(false);
                    for card in waiting {
                        if !self.is_awaiting(page, card) {
                            continue;
                        }
                        if hide {
                            self.hide_card(page, card, &title, HiddenReason::Ai);
                            hidden += 1;
                        } else {
                            self.settle_visible(page, card);
                        }
                    }
                }
                info!(
                    target: "filter",
                    batch = id,
                    decisions = results.len(),
                    hidden,
                    "AI batch applied"
                );
            }
            Err(err) => {
                warn!(
                    target: "filter",
                    batch = id,
                    error = %err,
                    "AI batch failed; showing queued videos"
                );
                for card in cards.into_values().flatten() {
                    if self.is_awaiting(page, card) {
                        self.settle_visible(page, card);
                    }
                }
            }
        }
    }

    /// Swaps in new settings and refilters everything from scratch.
    pub fn reload_settings<P: Page + ?Sized>(
        &mut self,
        page: &mut P,
        settings: Settings,
        now: Instant,
    ) {
        self.settings = settings;
        let loaders = self.reset(page);
        let cards = self.process_existing(page, now);
        info!(
            target: "filter",
            generation = self.generation,
            loaders,
            cards,
            "settings reloaded; refiltered page"
        );
    }

    /// Reveals anything still undecided and drops all state.
    pub fn teardown<P: Page + ?Sized>(&mut self, page: &mut P) {
        let undecided = self
            .tracker
            .in_state(ElementState::PreHidden)
            .into_iter()
            .chain(self.tracker.in_state(ElementState::AwaitingAi));
        for card in undecided {
            if page.contains(card) {
                visibility::show(page, card);
            }
        }
        self.reset(page);
        self.initialized = false;
        debug!(target: "filter", "filter torn down");
    }

    /// Starts a new settings generation: forgets every card, AI decision,
    /// queued title and ledger record, and strips all loaders. Results of
    /// batches already in flight will be discarded. Returns how many loaders
    /// were removed.
    pub fn reset<P: Page + ?Sized>(&mut self, page: &mut P) -> usize {
        self.generation += 1;
        self.tracker.clear();
        self.cache.clear();
        self.ledger.clear();
        self.queue.clear();
        self.in_flight.clear();
        self.in_flight_titles.clear();
        self.settle_deadline = None;
        visibility::remove_all_loaders(page)
    }

    pub fn snapshot(&self) -> HiddenVideosSnapshot {
        self.ledger.snapshot()
    }

    pub fn state(&self, card: NodeId) -> Option<ElementState> {
        self.tracker.state(card)
    }

    pub fn cached_decision(&self, title: &str) -> Option<bool> {
        self.cache.get(title)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn queue_snapshot(&self) -> QueueSnapshot {
        self.queue.snapshot()
    }

    pub fn batches_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Drops every card the page no longer holds from the tracker, the
    /// pending queue and the batches in flight. In-flight titles stay
    /// registered: their result still reaches the cache and later cards with
    /// the same title can still join.
    fn forget_detached<P: Page + ?Sized>(&mut self, page: &P) {
        let evicted = self.tracker.sweep(page);
        let dequeued = self.queue.retain_cards(|card| page.contains(card));
        let mut orphaned = 0;
        for waiting in self.in_flight.values_mut().flat_map(|batch| batch.values_mut()) {
            let before = waiting.len();
            waiting.retain(|card| page.contains(*card));
            orphaned += before - waiting.len();
        }
        if evicted + dequeued + orphaned > 0 {
            debug!(target: "filter", evicted, dequeued, orphaned, "forgot removed cards");
        }
    }

    fn process_existing<P: Page + ?Sized>(&mut self, page: &mut P, now: Instant) -> usize {
        let body = page.body();
        let cards = page.query_all(body, &CARD_SELECTOR);
        self.dispatch(page, cards, now)
    }

    fn discover<P: Page + ?Sized>(&self, page: &P, node: NodeId, out: &mut Vec<NodeId>) {
        if !page.contains(node) {
            return;
        }
        let mut push = |card: NodeId| {
            if !out.contains(&card) {
                out.push(card);
            }
        };
        if page.matches(node, &CARD_SELECTOR) {
            push(node);
        } else if let Some(card) = page.closest(node, &CARD_SELECTOR) {
            // late content inside a card that had no title yet
            if self.tracker.state(card).is_none() {
                push(card);
            }
        }
        for card in page.query_all(node, &CARD_SELECTOR) {
            push(card);
        }
    }

    /// Pre-hides every not yet processed card first, then classifies them.
    fn dispatch<P: Page + ?Sized>(&mut self, page: &mut P, cards: Vec<NodeId>, now: Instant) -> usize {
        let fresh: Vec<NodeId> = cards
            .into_iter()
            .filter(|card| self.tracker.state(*card).is_none())
            .collect();
        for card in &fresh {
            visibility::pre_hide(page, *card);
            self.apply(*card, ElementState::PreHidden);
        }
        for card in &fresh {
            self.classify_card(page, *card, now);
        }
        fresh.len()
    }

    fn classify_card<P: Page + ?Sized>(&mut self, page: &mut P, card: NodeId, now: Instant) {
        let title = extract_title(page, card);
        if title.is_empty() {
            visibility::show(page, card);
            self.tracker.forget(card);
            return;
        }

        if let Some(keyword) = matching_keyword(&title, &self.settings.keywords) {
            debug!(target: "filter", %title, keyword, "keyword match");
            self.hide_card(page, card, &title, HiddenReason::Keyword);
            return;
        }

        if !self.settings.ai_active() {
            self.settle_visible(page, card);
            return;
        }

        match self.cache.get(&title) {
            Some(true) => self.hide_card(page, card, &title, HiddenReason::Ai),
            Some(false) => self.settle_visible(page, card),
            None => {
                if self.apply(card, ElementState::AwaitingAi) {
                    visibility::show_with_loader(page, card);
                    self.enqueue(&title, card, now);
                }
            }
        }
    }

    fn enqueue(&mut self, title: &str, card: NodeId, now: Instant) {
        if let Some(id) = self.in_flight_titles.get(title) {
            if let Some(waiting) = self
                .in_flight
                .get_mut(id)
                .and_then(|batch| batch.get_mut(title))
            {
                if !waiting.contains(&card) {
                    waiting.push(card);
                }
                debug!(target: "queue", %title, batch = id, "joined in-flight batch");
                return;
            }
        }
        self.queue.push(title, card, now);
    }

    fn hide_card<P: Page + ?Sized>(
        &mut self,
        page: &mut P,
        card: NodeId,
        title: &str,
        reason: HiddenReason,
    ) {
        if !self.apply(card, ElementState::HiddenFinal(reason)) {
            return;
        }
        visibility::hide(page, card, reason);
        let url = extract_video_url(page, card, &self.origin);
        let timestamp = Utc::now().timestamp_millis();
        if self.ledger.record(title, reason, url, timestamp) {
            info!(target: "filter", %title, %reason, "video hidden");
        }
    }

    fn settle_visible<P: Page + ?Sized>(&mut self, page: &mut P, card: NodeId) {
        if self.apply(card, ElementState::VisibleFinal) {
            visibility::show(page, card);
        }
    }

    fn is_awaiting<P: Page + ?Sized>(&self, page: &P, card: NodeId) -> bool {
        page.contains(card) && self.tracker.state(card) == Some(ElementState::AwaitingAi)
    }

    fn apply(&mut self, card: NodeId, state: ElementState) -> bool {
        match self.tracker.transition(card, state) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    target: "filter",
                    from = ?err.from,
                    to = ?err.to,
                    "ignored invalid visibility transition"
                );
                false
            }
        }
    }
}
