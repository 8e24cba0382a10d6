//! Common types

use serde::{Deserialize, Serialize};

/// A validated page request. `page` is 1-based; `page_size` has already been
/// bounded to the configured maximum by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

/// Paginated result envelope returned by listing and search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    /// Assemble an envelope from a total count and one page worth of rows.
    /// A page past the end of the result set yields empty `data`.
    pub fn assemble(req: PageRequest, total: i64, data: Vec<T>) -> Self {
        let total_pages = if total <= 0 {
            0
        } else {
            ((total as u64).div_ceil(req.page_size as u64)) as u32
        };
        Self {
            total,
            page: req.page,
            page_size: req.page_size,
            total_pages,
            data,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}
