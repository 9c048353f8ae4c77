use std::future::Future;
use std::time::Duration;

use crate::catalog::element_set::ElementSet;
use crate::catalog::error::FetchError;
use crate::catalog::group::ObjectGroup;
use crate::catalog::parse::parse_feed;

/// Where element sets for a group come from.
pub trait CatalogSource: Send + Sync + 'static {
    fn fetch(
        &self,
        group: &ObjectGroup,
    ) -> impl Future<Output = Result<Vec<ElementSet>, FetchError>> + Send;
}

/// Reads group feeds over HTTP(S) or from local files.
pub struct FeedSource {
    client: reqwest::Client,
}

impl FeedSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sat-fusion/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn read(&self, location: &str) -> Result<String, FetchError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let response = self.client.get(location).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status));
            }
            Ok(response.text().await?)
        } else {
            let path = location.strip_prefix("file://").unwrap_or(location);
            Ok(tokio::fs::read_to_string(path).await?)
        }
    }
}

impl CatalogSource for FeedSource {
    async fn fetch(&self, group: &ObjectGroup) -> Result<Vec<ElementSet>, FetchError> {
        let body = self.read(&group.source).await?;
        parse_feed(&body)
    }
}
