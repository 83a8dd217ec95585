// src/common/pagination.rs

use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

// Página já normalizada (page >= 1, 1 <= limit <= MAX_LIMIT)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn limit(&self) -> i64 {
        self.limit as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: PageRequest, total: i64) -> Self {
        let limit = page.limit as i64;
        Self {
            data,
            page: page.page,
            limit: page.limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_page_and_limit() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, limit: DEFAULT_LIMIT });
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(Some(3), Some(500)).limit, MAX_LIMIT);
        assert_eq!(PageRequest::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn computes_total_pages() {
        let page = PageRequest::new(Some(1), Some(10));
        assert_eq!(Paginated::new(Vec::<u8>::new(), page, 0).total_pages, 0);
        assert_eq!(Paginated::new(Vec::<u8>::new(), page, 10).total_pages, 1);
        assert_eq!(Paginated::new(Vec::<u8>::new(), page, 11).total_pages, 2);
    }
}
