//! Page arithmetic and paged result lists.
//!
//! Page numbers are 1-based. A requested page outside `1..=total_pages` is
//! clipped into range, and an empty result still reports one page so the
//! navigation flags stay consistent.

use std::future::Future;
use std::num::NonZeroUsize;

use serde::Serialize;

/// Navigation metadata for one page of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub total_items: usize,
    pub total_pages: usize,

    /// The effective page after clipping.
    pub page: usize,
    pub size: usize,
    pub is_first: bool,
    pub is_last: bool,
    pub is_next: bool,
    pub is_previous: bool,
}

impl PageInfo {
    /// Computes page metadata for `total_items` items split into pages of `size`.
    pub fn new(total_items: usize, page: i64, size: NonZeroUsize) -> Self {
        let size = size.get();
        let total_pages = total_items.div_ceil(size);
        let page = clip_page(page, total_pages);

        Self {
            total_items,
            total_pages,
            page,
            size,
            is_first: page == 1,
            is_last: page >= total_pages,
            is_next: page < total_pages,
            is_previous: page > 1,
        }
    }

    /// Number of items preceding the effective page.
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.size
    }

    /// Maximum number of items on a page.
    pub fn limit(&self) -> usize {
        self.size
    }

    /// Cuts the effective page out of a full, ordered sequence.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.limit())
            .collect()
    }
}

/// Computes page metadata. Shorthand for [`PageInfo::new`].
pub fn paginate(total_items: usize, page: i64, size: NonZeroUsize) -> PageInfo {
    PageInfo::new(total_items, page, size)
}

fn clip_page(page: i64, total_pages: usize) -> usize {
    let upper = i64::try_from(total_pages.max(1)).unwrap_or(i64::MAX);
    // clamped into 1..=upper, so the conversion cannot fail
    usize::try_from(page.clamp(1, upper)).unwrap_or(1)
}

/// One page of items plus its navigation metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagedList<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub info: PageInfo,
}

impl<T> PagedList<T> {
    /// Wraps items that already make up the requested page.
    pub fn new(items: Vec<T>, total_items: usize, page: i64, size: NonZeroUsize) -> Self {
        Self {
            items,
            info: PageInfo::new(total_items, page, size),
        }
    }

    /// Builds a page from a complete, already ordered sequence.
    pub fn from_sequence(items: Vec<T>, page: i64, size: NonZeroUsize) -> Self {
        let info = PageInfo::new(items.len(), page, size);
        Self {
            items: info.slice(items),
            info,
        }
    }

    /// Two-phase paging: the caller supplies the total count, then `fetch` is
    /// asked for the effective page.
    ///
    /// `fetch` receives the clipped page number and the page size. Its result
    /// is sliced only if it returns more than one page worth of items, so a
    /// fetcher that honours paging is never offset twice.
    pub async fn fetch<F, Fut, E>(
        total_items: usize,
        page: i64,
        size: NonZeroUsize,
        fetch: F,
    ) -> Result<Self, E>
    where
        F: FnOnce(usize, NonZeroUsize) -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let info = PageInfo::new(total_items, page, size);
        let fetched = fetch(info.page, size).await?;
        let items = if fetched.len() > info.size {
            info.slice(fetched)
        } else {
            fetched
        };
        Ok(Self { items, info })
    }

    pub fn map<U, F>(self, f: F) -> PagedList<U>
    where
        F: FnMut(T) -> U,
    {
        PagedList {
            items: self.items.into_iter().map(f).collect(),
            info: self.info,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
