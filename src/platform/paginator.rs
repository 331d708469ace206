//! Page-number pagination over `listFiles`

use crate::error::Result;
use crate::platform::assets::{Assets, ListFilesQuery, DEFAULT_PAGE_SIZE};
use serde_json::Value;

/// Walks `listFiles` pages until the server reports no further page
#[derive(Debug, Clone)]
pub struct ListFilesPaginator {
    assets: Assets,
    query: ListFilesQuery,
    page_no: u32,
    has_next: bool,
}

impl ListFilesPaginator {
    pub fn new(assets: Assets, query: ListFilesQuery) -> Self {
        let page_no = query.page_no.unwrap_or(1);
        Self {
            assets,
            query,
            page_no,
            has_next: true,
        }
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    /// Page number the next call to [`ListFilesPaginator::next`] will fetch
    pub fn page_no(&self) -> u32 {
        self.page_no
    }

    /// Fetch the next page, or `None` once the last page has been returned
    pub async fn next(&mut self) -> Result<Option<Value>> {
        if !self.has_next {
            return Ok(None);
        }

        let query = ListFilesQuery {
            page_no: Some(self.page_no),
            page_size: Some(self.query.page_size.unwrap_or(DEFAULT_PAGE_SIZE)),
            ..self.query.clone()
        };
        let data = self.assets.list_files(&query).await?;

        let page = &data["page"];
        self.has_next = page["hasNext"].as_bool().unwrap_or(false);
        self.page_no = page["current"]
            .as_u64()
            .and_then(|current| u32::try_from(current).ok())
            .map_or(self.page_no.saturating_add(1), |current| current.saturating_add(1));
        log::debug!(
            "listFiles page fetched, next page {} (has_next: {})",
            self.page_no,
            self.has_next
        );
        Ok(Some(data))
    }
}
