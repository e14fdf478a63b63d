//! Pagination controller.
//!
//! Splits the era-ordered collection into fixed-size pages.  Out-of-range
//! page requests are not errors: they clamp to the nearest valid page.
//!
//! # Example
//!
//! ```rust
//! use memlane_layout::pagination::Paginator;
//!
//! let items: Vec<u32> = (0..25).collect();
//! let mut pager = Paginator::new(12);
//! pager.set_total(items.len());
//!
//! assert_eq!(pager.page_count(), 3);
//! assert!(pager.next());
//! assert!(pager.next());
//! assert_eq!(pager.page(&items), &[24]);
//!
//! // Already on the last page.
//! assert!(!pager.next());
//! ```

use std::ops::Range;

/// Items per page in immersive mode.
pub const IMMERSIVE_PAGE_SIZE: usize = 12;

/// Number of pages needed for `total` items: `ceil(total / page_size)`.
///
/// A `page_size` of zero is treated as one.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Clamp `page_index` into `[0, page_count - 1]` (or 0 for an empty
/// collection).
pub fn clamp_page_index(page_index: usize, total: usize, page_size: usize) -> usize {
    page_index.min(page_count(total, page_size).saturating_sub(1))
}

/// The slice of `items` shown on page `page_index` (clamped).
pub fn paginate<T>(items: &[T], page_size: usize, page_index: usize) -> &[T] {
    &items[page_range(items.len(), page_size, page_index)]
}

fn page_range(total: usize, page_size: usize, page_index: usize) -> Range<usize> {
    let page_size = page_size.max(1);
    let index = clamp_page_index(page_index, total, page_size);
    let start = (index * page_size).min(total);
    let end = (start + page_size).min(total);
    start..end
}

// ─────────────────────────────────────────────────────────────────────────────
// Paginator
// ─────────────────────────────────────────────────────────────────────────────

/// Session-local page cursor over a collection of `total` items.
///
/// The cursor only moves through [`next`][Paginator::next],
/// [`previous`][Paginator::previous] and [`go_to`][Paginator::go_to], or when
/// a shrinking collection invalidates the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    page_index: usize,
    total: usize,
}

impl Paginator {
    /// Create a cursor on page 0 of an empty collection.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page_index: 0,
            total: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Total page count; zero for an empty collection.
    pub fn page_count(&self) -> usize {
        page_count(self.total, self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page_index + 1 < self.page_count()
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 0
    }

    /// Update the collection size.
    ///
    /// The current page is kept when it is still valid; otherwise it clamps
    /// down to the last valid page.  Returns `true` when the index moved.
    pub fn set_total(&mut self, total: usize) -> bool {
        self.total = total;
        let clamped = clamp_page_index(self.page_index, total, self.page_size);
        let moved = clamped != self.page_index;
        self.page_index = clamped;
        moved
    }

    /// Advance one page.  Returns `false` (and stays put) on the last page.
    pub fn next(&mut self) -> bool {
        if self.has_next() {
            self.page_index += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page.  Returns `false` (and stays put) on the first page.
    pub fn previous(&mut self) -> bool {
        if self.has_previous() {
            self.page_index -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to `page_index`, clamping silently.  Returns the resulting index.
    pub fn go_to(&mut self, page_index: usize) -> usize {
        self.page_index = clamp_page_index(page_index, self.total, self.page_size);
        self.page_index
    }

    /// Index range of the current page within the collection.
    pub fn range(&self) -> Range<usize> {
        page_range(self.total, self.page_size, self.page_index)
    }

    /// The current page of `items`.
    ///
    /// `items` should be the collection whose length was last passed to
    /// [`set_total`][Paginator::set_total]; a shorter slice is clamped.
    pub fn page<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.range();
        let end = range.end.min(items.len());
        let start = range.start.min(end);
        &items[start..end]
    }
}
