use serde::Serialize;

use crate::error::DomainError;

pub const MAX_PAGE_SIZE: u32 = 100;

/// Validated pagination parameters. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Result<Self, DomainError> {
        if page < 1 {
            return Err(DomainError::PageOutOfRange);
        }
        if page_size < 1 || page_size > MAX_PAGE_SIZE {
            return Err(DomainError::PageSizeOutOfRange(MAX_PAGE_SIZE));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
        }
    }
}

/// Page envelope returned by every list endpoint.
///
/// Pure data assembly: no re-querying happens here. Callers obtain `total`
/// and `items` from the same filter predicates so the two cannot disagree
/// except under concurrent writes between the two queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn assemble(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let page_size = u64::from(request.page_size());
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(page_size)
        };
        Self {
            items,
            total,
            page: request.page(),
            page_size: request.page_size(),
            total_pages,
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::assemble(Vec::new(), 0, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_page_minus_one_times_size() {
        let request = PageRequest::new(3, 25).unwrap();
        assert_eq!(request.offset(), 50);
        assert_eq!(request.limit(), 25);
    }

    #[test]
    fn first_page_has_zero_offset() {
        let request = PageRequest::new(1, 10).unwrap();
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn page_zero_is_rejected() {
        assert_eq!(PageRequest::new(0, 10), Err(DomainError::PageOutOfRange));
    }

    #[test]
    fn page_size_bounds_are_enforced() {
        assert_eq!(
            PageRequest::new(1, 0),
            Err(DomainError::PageSizeOutOfRange(MAX_PAGE_SIZE))
        );
        assert_eq!(
            PageRequest::new(1, 101),
            Err(DomainError::PageSizeOutOfRange(MAX_PAGE_SIZE))
        );
        assert!(PageRequest::new(1, 100).is_ok());
    }

    #[test]
    fn empty_page_has_zero_total_pages() {
        let request = PageRequest::new(1, 10).unwrap();
        let page: Page<i32> = Page::assemble(vec![], 0, request);
        assert_eq!(page.items.len(), 0);
        assert_eq!(page.total, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let request = PageRequest::new(1, 10).unwrap();
        assert_eq!(Page::assemble(vec![1], 11, request).total_pages, 2);
        assert_eq!(Page::assemble(vec![1], 20, request).total_pages, 2);
        assert_eq!(Page::assemble(vec![1], 21, request).total_pages, 3);
        assert_eq!(Page::assemble(vec![1], 1, request).total_pages, 1);
    }
}
