use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

/// Query parameters shared by every list endpoint.
///
/// `active` filters currencies, `status` filters price lists and products;
/// each listing ignores the flag that does not apply to it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub active: Option<bool>,
    pub status: Option<bool>,
}

impl ListParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page())
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page().saturating_sub(1)) * self.limit()
    }

    /// `LIKE` pattern for a substring match, `None` when no search was given.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s))
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page(),
            per_page: params.per_page(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ListParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 10);
        assert_eq!(params.offset(), 0);
        assert_eq!(params.search_pattern(), None);
    }

    #[test]
    fn test_offset() {
        let params = ListParams {
            page: Some(3),
            per_page: Some(25),
            ..Default::default()
        };
        assert_eq!(params.limit(), 25);
        assert_eq!(params.offset(), 50);
    }

    #[test]
    fn test_search_pattern() {
        let params = ListParams {
            search: Some(" eur ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.search_pattern().as_deref(), Some("%eur%"));

        let blank = ListParams {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.search_pattern(), None);
    }
}
