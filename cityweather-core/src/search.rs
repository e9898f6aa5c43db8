//! Debounced city search with suggestion navigation.
//!
//! [`SearchController`] owns the query text and the suggestion list. Typing
//! schedules a geocoder lookup after a quiet period; each keystroke bumps a
//! generation counter so that only the latest lookup may touch the list.
//! Whatever the user finally picks is sent to the receiver returned by
//! [`SearchController::new`].

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{Location, LookupError, provider::Geocoder};

pub const NOT_FOUND_MESSAGE: &str = "City not found.";
pub const LOOKUP_FAILED_MESSAGE: &str = "Error fetching location.";
pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a city name.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub debounce: Duration,
    pub suggestion_limit: usize,
    /// Queries shorter than this (after trimming) never hit the geocoder.
    pub min_query_chars: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            suggestion_limit: 5,
            min_query_chars: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    Searching,
    /// Idle, with `error_message` set.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub suggestions: Vec<Location>,
    pub active_index: Option<usize>,
    pub status: SearchStatus,
    pub error_message: Option<String>,
    pub dismissed: bool,
}

impl SearchState {
    pub fn suggestions_visible(&self) -> bool {
        !self.suggestions.is_empty() && !self.dismissed
    }

    pub fn active_suggestion(&self) -> Option<&Location> {
        self.active_index.and_then(|i| self.suggestions.get(i))
    }

    fn close_suggestions(&mut self) {
        self.suggestions.clear();
        self.active_index = None;
    }
}

#[derive(Debug)]
struct Shared {
    state: SearchState,
    /// Bumped by every operation that makes earlier lookups irrelevant.
    generation: u64,
    /// Generation whose suggestion lookup is currently in flight.
    fetching: Option<u64>,
    /// `true` while a lookup for the current generation is scheduled or running.
    lookup_pending: watch::Sender<bool>,
}

impl Shared {
    fn new() -> (Self, watch::Receiver<bool>) {
        let (lookup_pending, rx) = watch::channel(false);
        let shared = Self {
            state: SearchState::default(),
            generation: 0,
            fetching: None,
            lookup_pending,
        };
        (shared, rx)
    }

    /// Invalidate every scheduled or in-flight suggestion lookup.
    fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        if self.fetching.take().is_some() && self.state.status == SearchStatus::Searching {
            self.state.status = SearchStatus::Idle;
        }
        self.lookup_pending.send_replace(false);
        self.generation
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Autocomplete controller for one search box.
///
/// Must be driven from inside a tokio runtime: [`set_query`](Self::set_query)
/// spawns the debounce timer.
#[derive(Debug)]
pub struct SearchController {
    geocoder: Arc<dyn Geocoder>,
    options: SearchOptions,
    shared: Arc<Mutex<Shared>>,
    pending: Option<JoinHandle<()>>,
    settled: watch::Receiver<bool>,
    selected: mpsc::UnboundedSender<Location>,
}

impl SearchController {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        options: SearchOptions,
    ) -> (Self, mpsc::UnboundedReceiver<Location>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shared, settled) = Shared::new();
        let controller = Self {
            geocoder,
            options,
            shared: Arc::new(Mutex::new(shared)),
            pending: None,
            settled,
            selected: tx,
        };
        (controller, rx)
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SearchState {
        lock(&self.shared).state.clone()
    }

    pub fn suggestions_visible(&self) -> bool {
        lock(&self.shared).state.suggestions_visible()
    }

    /// Resolve once the latest query's suggestion lookup has completed,
    /// immediately if none is scheduled.
    ///
    /// A lookup superseded by a later call also counts as completed.
    pub async fn wait_for_suggestions(&self) {
        let mut settled = self.settled.clone();
        if settled.wait_for(|pending| !pending).await.is_err() {
            debug!("Search state dropped while waiting for suggestions");
        }
    }

    /// Replace the query text and schedule a debounced suggestion lookup.
    pub fn set_query(&mut self, text: impl Into<String>) {
        let text = text.into();
        let too_short = text.trim().chars().count() < self.options.min_query_chars;

        let generation = {
            let mut shared = lock(&self.shared);
            Self::cancel_timer(&mut self.pending, &shared);
            let generation = shared.invalidate();
            if !too_short {
                shared.lookup_pending.send_replace(true);
            }

            let state = &mut shared.state;
            state.query = text.clone();
            state.dismissed = false;
            state.error_message = None;
            if state.status == SearchStatus::Error {
                state.status = SearchStatus::Idle;
            }
            if too_short {
                state.close_suggestions();
            }
            generation
        };

        if too_short {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let geocoder = Arc::clone(&self.geocoder);
        let debounce = self.options.debounce;
        let limit = self.options.suggestion_limit;
        let query = text.trim().to_string();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            fetch_suggestions(shared, geocoder, generation, query, limit).await;
        }));
    }

    /// Pick a suggestion and hand it to the consumer.
    ///
    /// Returns `None` (and changes nothing) when `index` is out of range.
    pub fn select_by_index(&mut self, index: usize) -> Option<Location> {
        let location = lock(&self.shared).state.suggestions.get(index).cloned()?;
        self.accept(&location);
        Some(location)
    }

    /// Move the highlighted suggestion, wrapping at both ends.
    ///
    /// Does nothing while the list is hidden.
    pub fn move_selection(&mut self, direction: Direction) {
        let mut shared = lock(&self.shared);
        let state = &mut shared.state;
        if !state.suggestions_visible() {
            return;
        }
        let len = state.suggestions.len();

        state.active_index = Some(match (direction, state.active_index) {
            (Direction::Down, None) => 0,
            (Direction::Down, Some(i)) => (i + 1) % len,
            (Direction::Up, None) | (Direction::Up, Some(0)) => len - 1,
            (Direction::Up, Some(i)) => (i - 1).min(len - 1),
        });
    }

    /// Accept the highlighted suggestion, or resolve the raw query text.
    ///
    /// On failure the error is recorded in the state and `None` is returned.
    pub async fn confirm_selection(&mut self) -> Option<Location> {
        let (active, query) = {
            let shared = lock(&self.shared);
            let state = &shared.state;
            (state.active_suggestion().cloned(), state.query.trim().to_string())
        };

        if let Some(location) = active {
            self.accept(&location);
            return Some(location);
        }

        if query.is_empty() {
            self.fail(EMPTY_QUERY_MESSAGE);
            return None;
        }

        {
            let mut shared = lock(&self.shared);
            Self::cancel_timer(&mut self.pending, &shared);
            shared.invalidate();
            shared.state.status = SearchStatus::Searching;
            shared.state.error_message = None;
        }

        let result = self
            .geocoder
            .resolve(&query, 1)
            .await
            .and_then(|found| {
                found
                    .into_iter()
                    .next()
                    .ok_or_else(|| LookupError::NoResults(query.clone()))
            });

        match result {
            Ok(location) => {
                {
                    let mut shared = lock(&self.shared);
                    let state = &mut shared.state;
                    state.status = SearchStatus::Idle;
                    state.query = location.to_string();
                    state.close_suggestions();
                }
                self.emit(&location);
                Some(location)
            }
            Err(err) => {
                warn!(query = %query, error = %err, "City lookup failed");
                let message = if err.is_no_results() {
                    NOT_FOUND_MESSAGE
                } else {
                    LOOKUP_FAILED_MESSAGE
                };
                self.fail(message);
                None
            }
        }
    }

    /// Hide the list without touching the query.
    pub fn dismiss_suggestions(&mut self) {
        let mut shared = lock(&self.shared);
        shared.state.dismissed = true;
        shared.state.active_index = None;
    }

    /// Make `location` the final answer: canonical query, closed list, emitted.
    fn accept(&mut self, location: &Location) {
        {
            let mut shared = lock(&self.shared);
            Self::cancel_timer(&mut self.pending, &shared);
            shared.invalidate();

            let state = &mut shared.state;
            state.query = location.to_string();
            state.close_suggestions();
        }
        self.emit(location);
    }

    fn fail(&self, message: &str) {
        let mut shared = lock(&self.shared);
        shared.state.status = SearchStatus::Error;
        shared.state.error_message = Some(message.to_string());
    }

    fn emit(&self, location: &Location) {
        if self.selected.send(location.clone()).is_err() {
            debug!(%location, "No consumer for selected location");
        }
    }

    /// Abort the debounce timer unless its lookup is already on the wire.
    fn cancel_timer(pending: &mut Option<JoinHandle<()>>, shared: &Shared) {
        if let Some(handle) = pending.take() {
            if shared.fetching != Some(shared.generation) {
                handle.abort();
            }
        }
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

async fn fetch_suggestions(
    shared: Arc<Mutex<Shared>>,
    geocoder: Arc<dyn Geocoder>,
    generation: u64,
    query: String,
    limit: usize,
) {
    {
        let mut guard = lock(&shared);
        if guard.generation != generation {
            return;
        }
        guard.fetching = Some(generation);
        guard.state.status = SearchStatus::Searching;
    }

    debug!(query = %query, "Fetching suggestions");
    let result = geocoder.resolve(&query, limit).await;

    let mut guard = lock(&shared);
    if guard.generation != generation {
        debug!(query = %query, "Discarding stale suggestions");
        return;
    }
    guard.fetching = None;
    guard.lookup_pending.send_replace(false);

    let state = &mut guard.state;
    state.status = SearchStatus::Idle;
    state.active_index = None;
    match result {
        Ok(mut found) => {
            found.truncate(limit);
            state.suggestions = found;
        }
        Err(err) => {
            debug!(query = %query, error = %err, "Suggestion lookup failed");
            state.suggestions.clear();
        }
    }
}
