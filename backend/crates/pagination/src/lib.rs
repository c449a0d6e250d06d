//! Page requests and the `{data, meta, links}` envelope shared by listing
//! endpoints.
//!
//! Handlers parse a [`PageRequest`] from query parameters, repositories answer
//! with a [`Page`], and the inbound adapter renders it as a [`Paginated`]
//! envelope. Page numbers are one-based.

use serde::{Deserialize, Serialize};
use url::Url;

/// Page size used when the client does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 15;
/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 100;

/// Validation errors raised by [`PageRequest::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    /// Page numbers start at one.
    #[error("page must be at least 1, got {page}")]
    PageOutOfRange {
        /// Rejected page number.
        page: u32,
    },
    /// Page size outside `1..=MAX_PER_PAGE`.
    #[error("perPage must be between 1 and {max}, got {per_page}")]
    PerPageOutOfRange {
        /// Rejected page size.
        per_page: u32,
        /// Largest accepted page size.
        max: u32,
    },
}

/// A validated one-based page request.
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let request = PageRequest::new(3, 20).expect("valid page");
/// assert_eq!(request.offset(), 40);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Validate and build a page request.
    ///
    /// # Errors
    /// Returns [`PageRequestError`] when `page` is zero or `per_page` falls
    /// outside `1..=MAX_PER_PAGE`.
    pub const fn new(page: u32, per_page: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::PageOutOfRange { page });
        }
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(PageRequestError::PerPageOutOfRange {
                per_page,
                max: MAX_PER_PAGE,
            });
        }
        Ok(Self { page, per_page })
    }

    /// Build a request from optional query values, applying defaults.
    ///
    /// # Errors
    /// Same as [`PageRequest::new`].
    pub fn from_optional(
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<Self, PageRequestError> {
        Self::new(page.unwrap_or(1), per_page.unwrap_or(DEFAULT_PER_PAGE))
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Number of items skipped before this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    /// Maximum number of items on this page.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.per_page as u64
    }
}

/// One page of results plus the total number of matching items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    items: Vec<T>,
    total: u64,
    request: PageRequest,
}

impl<T> Page<T> {
    /// Wrap already-sliced items.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            request,
        }
    }

    /// An empty page for `request`.
    #[must_use]
    pub const fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), 0, request)
    }

    /// Slice a full, already-ordered collection into the requested page.
    #[must_use]
    pub fn from_full(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let skip = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(request.limit()).unwrap_or(usize::MAX);
        let items = all.into_iter().skip(skip).take(take).collect();
        Self::new(items, total, request)
    }

    /// Items on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Total number of matching items across all pages.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// The request that produced this page.
    #[must_use]
    pub const fn request(&self) -> PageRequest {
        self.request
    }

    /// Consume the page, returning its items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Convert every item, keeping totals and the request.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }

    /// Fallibly convert every item, stopping at the first error.
    ///
    /// # Errors
    /// Returns the first error produced by `f`.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total: self.total,
            request: self.request,
        })
    }

    /// Summary metadata for the envelope.
    #[must_use]
    pub fn meta(&self) -> PageMeta {
        let per_page = u64::from(self.request.per_page());
        let last_page = self.total.div_ceil(per_page).max(1);
        let offset = self.request.offset();
        let count = self.items.len() as u64;
        let (from, to) = if count == 0 {
            (None, None)
        } else {
            (Some(offset + 1), Some(offset + count))
        };
        PageMeta {
            current_page: self.request.page(),
            per_page: self.request.per_page(),
            total: self.total,
            last_page,
            from,
            to,
        }
    }
}

/// Envelope metadata describing the position of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// One-based number of this page.
    pub current_page: u32,
    /// Requested page size.
    pub per_page: u32,
    /// Total number of matching items.
    pub total: u64,
    /// Number of the last page (at least 1).
    pub last_page: u64,
    /// One-based index of the first item on this page.
    pub from: Option<u64>,
    /// One-based index of the last item on this page.
    pub to: Option<u64>,
}

/// Navigation links for the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLinks {
    /// Link to the first page.
    pub first: String,
    /// Link to the last page.
    pub last: String,
    /// Link to the previous page, absent on the first page.
    pub prev: Option<String>,
    /// Link to the next page, absent on the last page.
    pub next: Option<String>,
}

impl PageLinks {
    /// Build links from the request URL, preserving unrelated query
    /// parameters and rewriting `page` and `perPage`.
    #[must_use]
    pub fn build(base: &Url, meta: &PageMeta) -> Self {
        let link = |page: u64| page_url(base, page, meta.per_page);
        let current = u64::from(meta.current_page);
        Self {
            first: link(1),
            last: link(meta.last_page),
            prev: (current > 1).then(|| link(current - 1)),
            next: (current < meta.last_page).then(|| link(current + 1)),
        }
    }
}

fn page_url(base: &Url, page: u64, per_page: u32) -> String {
    let mut url = base.clone();
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != "page" && key != "perPage")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair("page", &page.to_string())
        .append_pair("perPage", &per_page.to_string());
    url.to_string()
}

/// Serialized `{data, meta, links}` envelope returned by listing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Position metadata.
    pub meta: PageMeta,
    /// Navigation links, when the request URL is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<PageLinks>,
}

impl<T> Paginated<T> {
    /// Build an envelope without links.
    #[must_use]
    pub fn from_page(page: Page<T>) -> Self {
        let meta = page.meta();
        Self {
            data: page.into_items(),
            meta,
            links: None,
        }
    }

    /// Attach navigation links derived from `base`.
    #[must_use]
    pub fn with_links(mut self, base: &Url) -> Self {
        self.links = Some(PageLinks::build(base, &self.meta));
        self
    }
}
