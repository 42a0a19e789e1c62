pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// 1-based page request, already clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Slices an in-memory, already ordered result set.
    pub fn slice<T: Clone>(&self, all: &[T]) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(0);
        all.iter().skip(offset).take(limit).cloned().collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: vec![],
            total: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_and_limit() {
        let req = PageRequest::new(0, 1000);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, MAX_PAGE_SIZE);

        let req = PageRequest::new(3, 0);
        assert_eq!(req.limit, 1);
    }

    #[test]
    fn default_page_size_is_ten() {
        assert_eq!(PageRequest::default().limit, 10);
    }

    #[test]
    fn slice_takes_requested_window() {
        let all: Vec<i32> = (1..=25).collect();
        assert_eq!(PageRequest::new(3, 10).slice(&all), vec![21, 22, 23, 24, 25]);
        assert!(PageRequest::new(4, 10).slice(&all).is_empty());
    }

    #[test]
    fn huge_page_saturates_instead_of_overflowing() {
        let req = PageRequest::new(i64::MAX, MAX_PAGE_SIZE);
        assert_eq!(req.offset(), i64::MAX);
        assert!(req.slice(&[1, 2, 3]).is_empty());
    }
}
