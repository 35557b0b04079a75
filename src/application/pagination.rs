//! Page-number pagination helpers.
//!
//! Listings are addressed by a 1-based page number carried in the query
//! string. Out-of-range numbers clamp: anything below 1 (including an
//! unparseable value) becomes page 1, anything beyond the end becomes the
//! last page. An empty result set still has one valid, empty page.

use std::num::NonZeroU32;

/// A bounded, ordered slice of a larger result set.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn previous_number(&self) -> u32 {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_number(&self) -> u32 {
        (self.number + 1).min(self.total_pages)
    }
}

/// Parse a raw `?page=` value; anything unparseable or below 1 is page 1.
pub fn requested_page(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|number| *number >= 1)
        .unwrap_or(1)
}

pub fn total_pages(total_items: u64, per_page: NonZeroU32) -> u32 {
    let per = u64::from(per_page.get());
    let pages = total_items.div_ceil(per).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp a requested page number into the valid range for the result set.
pub fn clamp_page(requested: u32, total_items: u64, per_page: NonZeroU32) -> u32 {
    requested.max(1).min(total_pages(total_items, per_page))
}

pub fn offset(number: u32, per_page: NonZeroU32) -> u32 {
    (number - 1).saturating_mul(per_page.get())
}
