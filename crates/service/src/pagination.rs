//! Pagination utilities for upstream list endpoints
//!
//! Printify pages are 1-based and cap `limit` at 50.

use serde::Deserialize;

/// Pagination parameters
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Pagination {
    /// 1-based page index
    #[serde(default = "default_page")]
    pub page: u32,
    /// items per page
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 { 1 }
fn default_limit() -> u32 { 10 }

impl Pagination {
    pub const MAX_LIMIT: u32 = 50;

    /// Clamp to sane defaults
    pub fn normalize(self) -> (u32, u32) {
        let page = if self.page == 0 { 1 } else { self.page };
        let limit = self.limit.clamp(1, Self::MAX_LIMIT);
        (page, limit)
    }

    /// Render as the query string expected by the upstream API.
    pub fn to_query(self) -> String {
        let (page, limit) = self.normalize();
        format!("page={page}&limit={limit}")
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: default_page(), limit: default_limit() } }
}
