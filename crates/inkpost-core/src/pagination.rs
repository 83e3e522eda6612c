//! Page slicing for ordered feeds.
//!
//! Page numbers are 1-based. Missing or non-numeric numbers mean the first
//! page, and numbers outside `1..=total_pages` are clamped to the nearest
//! valid page. An empty result still has one (empty) page.

use serde::Serialize;

/// Posts shown per feed page.
pub const POSTS_PER_PAGE: u64 = 10;

/// The page a client asked for, before it is checked against the result size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    requested: i64,
    per_page: u64,
}

impl PageRequest {
    pub fn new(requested: i64, per_page: u64) -> Self {
        Self {
            requested,
            per_page: per_page.max(1),
        }
    }

    pub fn first() -> Self {
        Self::new(1, POSTS_PER_PAGE)
    }

    /// Parse the raw `page` query parameter.
    pub fn parse(raw: Option<&str>) -> Self {
        let requested = raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1);
        Self::new(requested, POSTS_PER_PAGE)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Clamp the request against the total number of items.
    pub fn resolve(&self, total_items: u64) -> PageWindow {
        let total_pages = total_items.div_ceil(self.per_page).max(1);
        let number = self.requested.clamp(1, total_pages as i64) as u64;
        PageWindow {
            number,
            total_pages,
            total_items,
            per_page: self.per_page,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// A resolved page position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub per_page: u64,
}

impl PageWindow {
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }
}

/// One page of results plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub per_page: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Build a page from items already cut to `window`.
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            total_pages: window.total_pages,
            total_items: window.total_items,
            per_page: window.per_page,
            has_next: window.number < window.total_pages,
            has_previous: window.number > 1,
        }
    }

    /// Cut a full ordered result down to the requested page.
    pub fn from_all(all: Vec<T>, request: PageRequest) -> Self {
        let window = request.resolve(all.len() as u64);
        let items = all
            .into_iter()
            .skip(window.offset() as usize)
            .take(window.limit() as usize)
            .collect();
        Self::new(items, window)
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next.then_some(self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous.then(|| self.number - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            total_pages: self.total_pages,
            total_items: self.total_items,
            per_page: self.per_page,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
