//! Stateless page arithmetic over the ordered image list
//!
//! Requests outside the valid domain are clamped rather than rejected:
//! `page` below 1 becomes 1, `limit` is forced into `1..=max`, and a page
//! past the end simply resolves to an empty range.

use std::ops::Range;

/// Resolved bounds for one page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    /// Effective page number after clamping, 1-based
    pub page: usize,
    /// Effective page size after clamping
    pub page_size: usize,
    /// Total items across all pages
    pub total_count: usize,
    /// Number of pages at the effective page size
    pub total_pages: usize,
    offset: usize,
}

impl PageBounds {
    /// Index range this page addresses within the full ordered list.
    pub fn range(&self) -> Range<usize> {
        let start = self.offset.min(self.total_count);
        let end = self
            .offset
            .saturating_add(self.page_size)
            .min(self.total_count);
        start..end
    }
}

/// Resolve a page request against the current total.
pub fn resolve(
    page: usize,
    page_size: usize,
    total_count: usize,
    max_page_size: usize,
) -> PageBounds {
    let page = page.max(1);
    let page_size = page_size.clamp(1, max_page_size.max(1));
    let total_pages = if total_count == 0 {
        0
    } else {
        (total_count + page_size - 1) / page_size
    };
    PageBounds {
        page,
        page_size,
        total_count,
        total_pages,
        offset: (page - 1).saturating_mul(page_size),
    }
}
