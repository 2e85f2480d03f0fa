use serde::{Deserialize, Serialize};

use crate::domain::customer::Customer;

/// Default and maximum size for list requests.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// A validated pagination request. `resolve` clamps raw caller input: the
/// page index defaults to 0 and is floored at 0; the page size defaults to
/// [`DEFAULT_PAGE_SIZE`] and any value outside `1..=DEFAULT_PAGE_SIZE` resets
/// to the default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn resolve(page: Option<i64>, page_size: Option<i64>) -> Self {
        let mut page = page.unwrap_or(0);
        let mut page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page < 0 {
            page = 0;
        }
        if page_size < 1 || page_size > DEFAULT_PAGE_SIZE {
            page_size = DEFAULT_PAGE_SIZE;
        }
        Self { page, page_size }
    }

    pub fn offset(&self) -> i64 {
        self.page * self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, page_size: DEFAULT_PAGE_SIZE }
    }
}

/// One page of customer results from a list operation. Read-model only,
/// never persisted. `customers.len() <= page_size` always holds, and the
/// `first`/`last` flags reflect the position of `page` within
/// `number_of_pages`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPage {
    pub customers: Vec<Customer>,
    pub number_of_pages: i64,
    pub page: i64,
    pub page_size: i64,
    pub first: bool,
    pub last: bool,
}

impl CustomerPage {
    /// Wrap one already-sliced page of results. `total_records` counts the
    /// whole result set, not just this slice.
    pub fn assemble(customers: Vec<Customer>, total_records: i64, request: PageRequest) -> Self {
        debug_assert!(customers.len() as i64 <= request.page_size);
        let number_of_pages =
            if total_records == 0 { 0 } else { (total_records + request.page_size - 1) / request.page_size };
        Self {
            customers,
            number_of_pages,
            page: request.page,
            page_size: request.page_size,
            first: request.page == 0,
            last: request.page + 1 >= number_of_pages,
        }
    }

    /// Slice one page out of a fully materialized result set.
    pub fn from_all(all: Vec<Customer>, request: PageRequest) -> Self {
        let total_records = all.len() as i64;
        let customers: Vec<Customer> = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.page_size as usize)
            .collect();
        Self::assemble(customers, total_records, request)
    }
}
