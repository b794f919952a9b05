//! Explicit state machine behind the catalog view. It never awaits: triggers
//! return a [`PageRequest`] and the front-end hands the result to
//! [`ViewController::complete`].

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::{debug, warn};

use crate::fetcher::{FetchError, ListFetcher, PageQuery};
use crate::filters::{FilterError, FilterState, FilterTables};
use crate::model::{Category, ListPage, Record};
use crate::observer::{Sentinel, SentinelObserver};
use crate::route::{self, Route};

// process-wide, so tickets never repeat across controller instances
static GENERATIONS: AtomicU64 = AtomicU64::new(0);

fn next_generation() -> u64 {
    GENERATIONS.fetch_add(1, Ordering::Relaxed) + 1
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadCause {
    Mount,
    CategorySwitch,
    FilterClear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub generation: u64,
    pub category: Category,
    pub page: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub query: PageQuery,
}

impl PageRequest {
    pub fn ticket(&self) -> Ticket {
        Ticket {
            generation: self.generation,
            category: self.query.category,
            page: self.query.page,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading {
        cause: LoadCause,
        ticket: Ticket,
    },
    LoadingMore {
        ticket: Ticket,
    },
    Searching {
        ticket: Ticket,
        params: String,
        was_filtered: bool,
    },
    Filtered,
    Closed,
}

impl Phase {
    fn ticket(&self) -> Option<Ticket> {
        match self {
            Self::Loading { ticket, .. }
            | Self::LoadingMore { ticket }
            | Self::Searching { ticket, .. } => Some(*ticket),
            Self::Idle | Self::Filtered | Self::Closed => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading {
                cause: LoadCause::CategorySwitch,
                ..
            } => "switching category",
            Self::Loading { .. } => "loading",
            Self::LoadingMore { .. } => "loading more",
            Self::Searching { .. } => "searching",
            Self::Filtered => "filtered",
            Self::Closed => "closed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageState {
    accumulated: Vec<Record>,
    current_page: u32,
    max_pages: u32,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            accumulated: Vec::new(),
            current_page: 0,
            max_pages: 1,
        }
    }
}

impl PageState {
    pub fn records(&self) -> &[Record] {
        &self.accumulated
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.max_pages
    }

    fn apply_page(&mut self, page: u32, mut list: ListPage) -> usize {
        let added = list.records.len();
        self.accumulated.append(&mut list.records);
        self.current_page = page;
        self.max_pages = list.total_pages.max(page).max(1);
        added
    }

    fn replace_with(&mut self, list: ListPage) -> usize {
        let count = list.records.len();
        self.accumulated = list.records;
        self.current_page = 1;
        self.max_pages = list.total_pages.max(1);
        count
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Appended { page: u32, added: usize },
    Replaced { count: usize },
    Empty,
    Failed,
    Stale,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown category '{requested}'")]
pub struct Redirect {
    pub requested: String,
}

#[derive(Debug)]
pub struct ViewController {
    category: Category,
    phase: Phase,
    generation: u64,
    characters: PageState,
    locations: PageState,
    episodes: PageState,
    filters: FilterState,
    filter_params: String,
    observer: SentinelObserver,
}

impl ViewController {
    /// Reads the view query and starts the first load. Filter fields in the
    /// query make that first load the filtered search.
    pub fn mount(query: &str, tables: FilterTables) -> Result<(Self, PageRequest), Redirect> {
        let (category, params) = match route::resolve(query) {
            Route::Main { category, params } => (category, params),
            Route::Redirect { requested } => {
                warn!(%requested, "unrecognised category in view query");
                return Err(Redirect { requested });
            }
        };
        let mut view = Self {
            category,
            phase: Phase::Idle,
            generation: 0,
            characters: PageState::default(),
            locations: PageState::default(),
            episodes: PageState::default(),
            filters: FilterState::new(tables),
            filter_params: String::new(),
            observer: SentinelObserver::default(),
        };
        let request = view.enter(category, &params, LoadCause::Mount);
        Ok((view, request))
    }

    pub fn navigate(&mut self, query: &str) -> Result<Option<PageRequest>, Redirect> {
        if self.is_closed() {
            return Ok(None);
        }
        match route::resolve(query) {
            Route::Redirect { requested } => Err(Redirect { requested }),
            Route::Main { category, params } => {
                if category == self.category && params.is_empty() {
                    return Ok(None);
                }
                Ok(Some(self.enter(category, &params, LoadCause::CategorySwitch)))
            }
        }
    }

    pub fn switch_category(&mut self, category: Category) -> Option<PageRequest> {
        if self.is_closed() || category == self.category {
            return None;
        }
        Some(self.enter(category, &[], LoadCause::CategorySwitch))
    }

    fn enter(
        &mut self,
        category: Category,
        params: &[(String, String)],
        cause: LoadCause,
    ) -> PageRequest {
        debug!(from = %self.category, to = %category, ?cause, "resolving category");
        self.category = category;
        self.characters = PageState::default();
        self.locations = PageState::default();
        self.episodes = PageState::default();
        self.filter_params.clear();
        self.observer.unobserve();
        self.generation = next_generation();

        // a query that names filter fields defines the whole filter set
        let fields = self.filters.tables().fields(category);
        if params
            .iter()
            .any(|(k, _)| fields.iter().any(|f| f.name == k.as_str()))
        {
            self.filters.reset_category(category);
        }
        let seeded = self.filters.apply_pairs(
            category,
            params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );
        if seeded > 0 && self.filters.can_search(category) {
            return self.begin_search(false);
        }
        self.begin_load(cause)
    }

    fn next_request(&self, page: u32, params: String) -> PageRequest {
        PageRequest {
            generation: self.generation,
            query: PageQuery {
                category: self.category,
                page,
                params,
            },
        }
    }

    fn begin_load(&mut self, cause: LoadCause) -> PageRequest {
        let request = self.next_request(1, String::new());
        self.phase = Phase::Loading {
            cause,
            ticket: request.ticket(),
        };
        request
    }

    fn begin_search(&mut self, was_filtered: bool) -> PageRequest {
        let params = self.filters.serialize(self.category);
        let request = self.next_request(1, params.clone());
        self.phase = Phase::Searching {
            ticket: request.ticket(),
            params,
            was_filtered,
        };
        request
    }

    pub fn sentinel(&self) -> Sentinel {
        Sentinel {
            category: self.category,
            position: self.page_state(self.category).accumulated.len(),
            generation: self.generation,
        }
    }

    pub fn sync_sentinel(&mut self) -> Option<Sentinel> {
        if self.is_closed() {
            return None;
        }
        let sentinel = self.sentinel();
        self.observer.observe(sentinel);
        self.observer.target()
    }

    pub fn on_intersection(&mut self, sentinel: Sentinel, visible_ratio: f32) -> Option<PageRequest> {
        if !self.observer.intersects(sentinel, visible_ratio) {
            return None;
        }
        match self.phase {
            Phase::Idle => {}
            Phase::Loading { .. } | Phase::LoadingMore { .. } | Phase::Searching { .. } => {
                debug!(category = %self.category, "scroll trigger dropped, request in flight");
                return None;
            }
            Phase::Filtered | Phase::Closed => return None,
        }
        let state = self.page_state(self.category);
        if state.current_page + 1 > state.max_pages {
            return None;
        }
        let request = self.next_request(state.current_page + 1, String::new());
        debug!(category = %self.category, page = request.query.page, "loading next page");
        self.phase = Phase::LoadingMore {
            ticket: request.ticket(),
        };
        Some(request)
    }

    pub fn load_more(&mut self) -> Option<PageRequest> {
        let sentinel = self.sync_sentinel()?;
        self.on_intersection(sentinel, 1.0)
    }

    pub fn set_filter(&mut self, field: &str, value: &str) -> Result<(), FilterError> {
        self.filters.set_field(self.category, field, value)
    }

    pub fn search(&mut self) -> Option<PageRequest> {
        let was_filtered = match self.phase {
            Phase::Idle => false,
            Phase::Filtered => true,
            _ => return None,
        };
        if !self.filters.can_search(self.category) {
            return None;
        }
        debug!(category = %self.category, params = %self.filters.serialize(self.category), "searching");
        Some(self.begin_search(was_filtered))
    }

    pub fn clear_filters(&mut self) -> Option<PageRequest> {
        if self.is_closed() {
            return None;
        }
        self.filters.reset();
        self.filter_params.clear();
        *self.page_state_mut(self.category) = PageState::default();
        self.observer.unobserve();
        self.generation = next_generation();
        Some(self.begin_load(LoadCause::FilterClear))
    }

    /// Applies the outcome of `request`. Results for anything other than the
    /// request currently in flight are discarded.
    pub fn complete(
        &mut self,
        request: &PageRequest,
        result: Result<ListPage, FetchError>,
    ) -> Completion {
        let ticket = request.ticket();
        if self.phase.ticket() != Some(ticket) {
            debug!(?ticket, phase = self.phase.label(), "discarding stale completion");
            return Completion::Stale;
        }

        let (page, failed) = match result {
            Ok(page) => (page, false),
            Err(e) => {
                warn!(error = %e, category = %ticket.category, page = ticket.page, "list fetch failed");
                (ListPage::empty(), true)
            }
        };
        let usable = page.total_pages > 0;

        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        let completion = match phase {
            Phase::Loading { .. } | Phase::LoadingMore { .. } if usable => {
                let added = self
                    .page_state_mut(ticket.category)
                    .apply_page(ticket.page, page);
                Completion::Appended {
                    page: ticket.page,
                    added,
                }
            }
            Phase::Searching { params, .. } if usable => {
                let count = self.page_state_mut(ticket.category).replace_with(page);
                self.filter_params = params;
                self.phase = Phase::Filtered;
                Completion::Replaced { count }
            }
            Phase::Searching { was_filtered, .. } => {
                if was_filtered {
                    self.phase = Phase::Filtered;
                }
                if failed {
                    Completion::Failed
                } else {
                    Completion::Empty
                }
            }
            _ if failed => Completion::Failed,
            _ => Completion::Empty,
        };

        if matches!(completion, Completion::Empty) {
            debug!(?ticket, "page was empty or malformed; paging stops here");
        }
        completion
    }

    // holds the controller for the whole round trip; batch mode only
    pub async fn run<F>(&mut self, fetcher: &F, request: PageRequest) -> Completion
    where
        F: ListFetcher + ?Sized,
    {
        let result = fetcher.fetch(&request.query).await;
        self.complete(&request, result)
    }

    pub fn teardown(&mut self) {
        self.observer.disconnect();
        self.phase = Phase::Closed;
    }

    pub fn location(&self) -> String {
        match self.phase {
            Phase::Filtered => route::location(self.category, &self.filter_params),
            _ => route::location(self.category, ""),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.phase.ticket().is_some()
    }

    pub fn has_filters(&self) -> bool {
        matches!(self.phase, Phase::Filtered)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.phase, Phase::Closed)
    }

    pub fn filter_params(&self) -> &str {
        &self.filter_params
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn observer(&self) -> &SentinelObserver {
        &self.observer
    }

    pub fn records(&self) -> &[Record] {
        self.page_state(self.category).records()
    }

    pub fn page_state(&self, category: Category) -> &PageState {
        match category {
            Category::Characters => &self.characters,
            Category::Locations => &self.locations,
            Category::Episodes => &self.episodes,
        }
    }

    fn page_state_mut(&mut self, category: Category) -> &mut PageState {
        match category {
            Category::Characters => &mut self.characters,
            Category::Locations => &mut self.locations,
            Category::Episodes => &mut self.episodes,
        }
    }

    pub fn can_load_more(&self) -> bool {
        matches!(self.phase, Phase::Idle) && self.page_state(self.category).has_next()
    }
}
