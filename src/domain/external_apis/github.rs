use crate::domain::models::repo::RepositorySummary;
use anyhow::Error;
use async_trait::async_trait;

/// Port for the source control hosting API the summaries are fetched from.
#[async_trait]
pub trait GitHubApi {
    /// List up to `count` repositories owned by `owner` (user or
    /// organization), most recently updated first.
    async fn fetch_owner_repositories(
        &self,
        owner: &str,
        count: u8,
    ) -> Result<Vec<RepositorySummary>, Error>;
}
