use crate::application::use_cases::list_repository_summaries::{
    ListRepositorySummariesInteractor, ListRepositorySummariesUseCase,
    ListRepositorySummariesUseCaseInput,
};
use crate::domain::external_apis::github::GitHubApi;
use crate::domain::models::repo::RepositorySummary;
use anyhow::{Context, Error};
use async_stream::try_stream;
use futures_util::Stream;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Seconds between refresh passes.
const REFRESH_WAIT_SECONDS: u64 = 60;

/// Seconds to wait before retrying when a pass yields no repositories.
const EMPTY_RESULT_WAIT_SECONDS: u64 = 300;

#[derive(Debug, Clone, Default)]
pub struct StreamRepositorySummariesUseCaseInput {}

#[derive(Serialize, Debug, Clone)]
pub struct StreamRepositorySummariesUseCaseOutput {
    pub repositories: Vec<RepositorySummary>,
}

pub trait StreamRepositorySummariesUseCase {
    fn execute(
        &self,
        input: StreamRepositorySummariesUseCaseInput,
    ) -> impl Stream<Item = Result<StreamRepositorySummariesUseCaseOutput, Error>> + Send;
}

pub struct StreamRepositorySummariesInteractor<G: GitHubApi + Send + Sync + 'static> {
    list_use_case: Arc<ListRepositorySummariesInteractor<G>>,
}

impl<G: GitHubApi + Send + Sync + 'static> StreamRepositorySummariesInteractor<G> {
    pub fn new(list_use_case: Arc<ListRepositorySummariesInteractor<G>>) -> Self {
        Self { list_use_case }
    }
}

impl<G: GitHubApi + Send + Sync + 'static> StreamRepositorySummariesUseCase
    for StreamRepositorySummariesInteractor<G>
{
    fn execute(
        &self,
        _input: StreamRepositorySummariesUseCaseInput,
    ) -> impl Stream<Item = Result<StreamRepositorySummariesUseCaseOutput, Error>> + Send {
        let list_use_case = self.list_use_case.clone();

        try_stream! {
            loop {
                tracing::info!("Refreshing repository snapshot...");
                let snapshot = list_use_case
                    .execute(ListRepositorySummariesUseCaseInput::default())
                    .await
                    .context("Failed to assemble repository snapshot")?;

                if snapshot.repositories.is_empty() {
                    tracing::warn!("Snapshot is empty, waiting before retrying...");
                    tokio::time::sleep(Duration::from_secs(EMPTY_RESULT_WAIT_SECONDS)).await;
                    continue;
                }

                tracing::info!("Yielding {} repositories", snapshot.repositories.len());
                yield StreamRepositorySummariesUseCaseOutput {
                    repositories: snapshot.repositories,
                };

                tracing::debug!("Waiting for {} seconds...", REFRESH_WAIT_SECONDS);
                tokio::time::sleep(Duration::from_secs(REFRESH_WAIT_SECONDS)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::list_repository_summaries::MAX_TRACKED_OWNERS;

    /// GitHub's rate limit for authenticated requests.
    const GITHUB_API_RATE_LIMIT_PER_HOUR: u32 = 5_000;

    #[test]
    fn refresh_loop_stays_under_rate_limit() {
        // One API call per tracked owner per refresh pass.
        let api_calls_per_pass = MAX_TRACKED_OWNERS as u32;
        let passes_per_hour = (3600 / REFRESH_WAIT_SECONDS) as u32;
        let max_api_calls_per_hour = api_calls_per_pass * passes_per_hour;

        assert!(
            max_api_calls_per_hour <= GITHUB_API_RATE_LIMIT_PER_HOUR,
            "worst case of {max_api_calls_per_hour} calls/hour exceeds the \
             GitHub rate limit of {GITHUB_API_RATE_LIMIT_PER_HOUR} calls/hour"
        );
    }

    #[test]
    fn refresh_loop_leaves_headroom_for_other_consumers() {
        // Stay under 80% of the quota so interactive tooling sharing the
        // token is never starved.
        let recommended_max = (GITHUB_API_RATE_LIMIT_PER_HOUR as f64 * 0.8) as u32;

        let api_calls_per_pass = MAX_TRACKED_OWNERS as u32;
        let passes_per_hour = (3600 / REFRESH_WAIT_SECONDS) as u32;
        let max_api_calls_per_hour = api_calls_per_pass * passes_per_hour;

        assert!(max_api_calls_per_hour <= recommended_max);
    }
}
