use async_trait::async_trait;
use bookhub_core::book::{
    BookDetails, SearchPage, SearchResponse, WorkResponse, normalize_query, search_url, work_url,
};
use reqwest::Method;
use tracing::debug;

use crate::error::BookhubClientResult;
use crate::http_client::HttpClient;
use crate::store::BookCatalog;

#[derive(Debug, Clone)]
/// Клиент каталога Open Library.
pub(crate) struct CatalogClient {
    http: HttpClient,
    base_url: String,
    covers_url: String,
}

impl CatalogClient {
    pub(crate) fn new(http: HttpClient, base_url: impl Into<String>, covers_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            covers_url: covers_url.into(),
        }
    }
}

#[async_trait]
impl BookCatalog for CatalogClient {
    async fn search(&self, query: &str, page: u32, limit: u32) -> BookhubClientResult<SearchPage> {
        let query = normalize_query(query)?;
        let url = search_url(&self.base_url, &query, page, limit)?;
        debug!(%query, page, limit, "catalog search");

        let response: SearchResponse = self
            .http
            .send(self.http.request(Method::GET, url.as_str()))
            .await?;
        Ok(SearchPage::from_response(response, page, limit, &self.covers_url))
    }

    async fn work_details(&self, key: &str) -> BookhubClientResult<BookDetails> {
        let url = work_url(&self.base_url, key);
        debug!(%key, "catalog work details");

        let response: WorkResponse = self.http.send(self.http.request(Method::GET, &url)).await?;
        Ok(response.into())
    }
}
