use serde::{Deserialize, Serialize};

use crate::web::error::AppError;

pub const MAX_PAGE_SIZE: u64 = 100;

/// `?page=&limit=` query parameters. Pages are 1-based.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageParams {
    /// Returns `(page, limit)` with defaults applied and the limit capped.
    /// Pages whose row offset does not fit a signed 64-bit integer are rejected.
    pub fn resolve(&self, default_limit: u64) -> Result<(u64, u64), AppError> {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(default_limit)
            .clamp(1, MAX_PAGE_SIZE);
        match page.checked_mul(limit) {
            Some(end) if end <= i64::MAX as u64 => Ok((page, limit)),
            _ => Err(AppError::InvalidInput("Page number is too large.".to_string())),
        }
    }
}

/// One page of a listing. `next` and `previous` are page numbers.
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<u64>,
    pub previous: Option<u64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: u64, page: u64, limit: u64) -> Self {
        let next = (page.saturating_mul(limit) < count).then_some(page + 1);
        let previous = (page > 1).then(|| page - 1);
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_applies_defaults_and_cap() {
        assert_eq!(PageParams::default().resolve(6).unwrap(), (1, 6));
        let params = PageParams {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(params.resolve(6).unwrap(), (1, MAX_PAGE_SIZE));
    }

    #[test]
    fn resolve_rejects_offsets_past_i64() {
        let huge = PageParams {
            page: Some(u64::MAX),
            limit: Some(MAX_PAGE_SIZE),
        };
        assert!(matches!(huge.resolve(6), Err(AppError::InvalidInput(_))));

        let past_signed = PageParams {
            page: Some(i64::MAX as u64),
            limit: Some(2),
        };
        assert!(past_signed.resolve(6).is_err());

        let last_ok = PageParams {
            page: Some(i64::MAX as u64),
            limit: Some(1),
        };
        assert_eq!(last_ok.resolve(6).unwrap(), (i64::MAX as u64, 1));
    }

    #[test]
    fn page_links() {
        let first: Page<i32> = Page::new(vec![1, 2], 5, 1, 2);
        assert_eq!((first.previous, first.next), (None, Some(2)));

        let last: Page<i32> = Page::new(vec![5], 5, 3, 2);
        assert_eq!((last.previous, last.next), (Some(2), None));

        let empty: Page<i32> = Page::new(vec![], 0, 1, 6);
        assert_eq!((empty.previous, empty.next), (None, None));
    }
}
