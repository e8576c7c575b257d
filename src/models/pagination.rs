//! Pagination helpers shared by listings

use serde::{Deserialize, Serialize};

/// Page request (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Clamp to page >= 1 and 1..=100 items per page.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Pull a page past the end back to the last page.
    pub fn clamp_to_total(&self, total: i64) -> Self {
        let per_page = self.per_page.max(1) as u64;
        let last = ((total.max(0) as u64 + per_page - 1) / per_page).max(1);
        Self {
            page: (self.page as u64).min(last) as u32,
            per_page: self.per_page,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// One page of results plus the totals needed for navigation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 || self.total <= 0 {
            return 0;
        }
        ((self.total as u64 + self.per_page as u64 - 1) / self.per_page as u64) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_list_params_clamps() {
        let params = ListParams::new(0, 500);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 100);
        assert_eq!(ListParams::new(3, 5).offset(), 10);
    }

    #[test]
    fn test_page_past_the_end_goes_to_last_page() {
        assert_eq!(ListParams::new(99, 2).clamp_to_total(3).page, 2);
        assert_eq!(ListParams::new(2, 2).clamp_to_total(3).page, 2);
        assert_eq!(ListParams::new(1, 2).clamp_to_total(3).page, 1);
        assert_eq!(ListParams::new(5, 10).clamp_to_total(0).page, 1);
    }

    #[test]
    fn test_page_navigation() {
        let result = PagedResult::new(vec![1, 2, 3, 4, 5], 12, &ListParams::new(2, 5));
        assert_eq!(result.total_pages(), 3);
        assert!(result.has_next());
        assert!(result.has_prev());

        let empty: PagedResult<i32> = PagedResult::new(vec![], 0, &ListParams::default());
        assert_eq!(empty.total_pages(), 0);
        assert!(!empty.has_next());
    }

    proptest! {
        #[test]
        fn prop_pages_cover_total(total in 0i64..10_000, per_page in 1u32..100) {
            let result: PagedResult<()> = PagedResult::new(vec![], total, &ListParams::new(1, per_page));
            let pages = result.total_pages() as i64;
            prop_assert!(pages * per_page as i64 >= total);
            prop_assert!(pages == 0 || (pages - 1) * (per_page as i64) < total);
        }
    }
}
