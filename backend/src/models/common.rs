/// Page-based pagination shared by list endpoints.
///
/// `page` defaults to 1. `limit` defaults to 10; a value outside
/// `1..=max_limit` falls back to the default rather than being clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const MAX_PAGE_LIMIT_ADMIN: i64 = 1000;

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>, max_limit: i64) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = match limit {
            Some(l) if (1..=max_limit).contains(&l) => l,
            _ => DEFAULT_PAGE_LIMIT,
        };
        Self { page, limit }
    }

    /// Saturates on absurd page numbers; such a page is simply empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}
