use crate::domain::external_apis::github::GitHubApi;
use crate::domain::models::repo::RepositorySummary;
use anyhow::{Context, Error};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Upper bound on configured owners per fetch pass.
pub(crate) const MAX_TRACKED_OWNERS: usize = 10;

/// Repositories fetched per owner.
pub(crate) const MAX_REPOSITORIES_PER_OWNER: u8 = 30;

#[derive(Debug, Clone, Default)]
pub struct ListRepositorySummariesUseCaseInput {}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ListRepositorySummariesUseCaseOutput {
    pub repositories: Vec<RepositorySummary>,
}

#[async_trait]
pub trait ListRepositorySummariesUseCase {
    async fn execute(
        &self,
        input: ListRepositorySummariesUseCaseInput,
    ) -> Result<ListRepositorySummariesUseCaseOutput, Error>;
}

pub struct ListRepositorySummariesInteractor<G: GitHubApi + Send + Sync + 'static> {
    github_api: Arc<G>,
    owners: Vec<String>,
}

impl<G: GitHubApi + Send + Sync + 'static> ListRepositorySummariesInteractor<G> {
    pub fn new(github_api: Arc<G>, owners: Vec<String>) -> Self {
        let mut owners = owners;
        if owners.len() > MAX_TRACKED_OWNERS {
            tracing::warn!(
                "Tracking only the first {} of {} configured owners",
                MAX_TRACKED_OWNERS,
                owners.len()
            );
            owners.truncate(MAX_TRACKED_OWNERS);
        }
        Self { github_api, owners }
    }
}

#[async_trait]
impl<G: GitHubApi + Send + Sync + 'static> ListRepositorySummariesUseCase
    for ListRepositorySummariesInteractor<G>
{
    async fn execute(
        &self,
        _input: ListRepositorySummariesUseCaseInput,
    ) -> Result<ListRepositorySummariesUseCaseOutput, Error> {
        let mut repositories: Vec<RepositorySummary> = Vec::new();

        for owner in &self.owners {
            tracing::debug!("Fetching repositories for {}", owner);
            let fetched = self
                .github_api
                .fetch_owner_repositories(owner, MAX_REPOSITORIES_PER_OWNER)
                .await
                .with_context(|| format!("Failed to fetch repositories for {owner}"))?;
            repositories.extend(fetched);
        }

        // One repository can surface under two configured owners; a snapshot
        // carries each id at most once. First occurrence wins.
        let mut seen_ids: HashSet<u64> = HashSet::new();
        repositories.retain(|repo| seen_ids.insert(repo.id));

        repositories.sort_by(|a, b| {
            b.stargazers_count
                .cmp(&a.stargazers_count)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });

        tracing::info!("Assembled snapshot of {} repositories", repositories.len());
        Ok(ListRepositorySummariesUseCaseOutput { repositories })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::repo::Owner;
    use chrono::{TimeZone, Utc};

    struct StubGitHubApi;

    fn repo(id: u64, name: &str, owner: &str, stars: u64, day: u32) -> RepositorySummary {
        RepositorySummary {
            id,
            name: name.to_string(),
            stargazers_count: stars,
            language: Some("Rust".to_string()),
            description: None,
            forks_count: 1,
            updated_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            fork: false,
            default_branch: "main".to_string(),
            owner: Owner {
                login: owner.to_string(),
            },
        }
    }

    #[async_trait]
    impl GitHubApi for StubGitHubApi {
        async fn fetch_owner_repositories(
            &self,
            owner: &str,
            _count: u8,
        ) -> Result<Vec<RepositorySummary>, Error> {
            match owner {
                "alpha" => Ok(vec![
                    repo(1, "launcher", "alpha", 5, 1),
                    repo(2, "docs", "alpha", 90, 2),
                ]),
                "beta" => Ok(vec![
                    // Same id as alpha's launcher: the mirror listing case.
                    repo(1, "launcher", "beta", 5, 1),
                    repo(3, "site", "beta", 90, 3),
                ]),
                other => Err(anyhow::anyhow!("unexpected owner {other}")),
            }
        }
    }

    #[tokio::test]
    async fn merges_owners_drops_duplicate_ids_and_sorts_for_display() {
        let interactor = ListRepositorySummariesInteractor::new(
            Arc::new(StubGitHubApi),
            vec!["alpha".to_string(), "beta".to_string()],
        );

        let output = interactor
            .execute(ListRepositorySummariesUseCaseInput::default())
            .await
            .unwrap();

        let ids: Vec<u64> = output.repositories.iter().map(|r| r.id).collect();
        // id 1 appears once; equal star counts break on recency.
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(output.repositories[2].owner.login, "alpha");
    }

    #[test]
    fn owner_list_is_capped() {
        let owners: Vec<String> = (0..MAX_TRACKED_OWNERS + 5)
            .map(|i| format!("owner{i}"))
            .collect();
        let interactor = ListRepositorySummariesInteractor::new(Arc::new(StubGitHubApi), owners);
        assert_eq!(interactor.owners.len(), MAX_TRACKED_OWNERS);
    }

    #[tokio::test]
    async fn fetch_failure_carries_owner_context() {
        let interactor = ListRepositorySummariesInteractor::new(
            Arc::new(StubGitHubApi),
            vec!["gamma".to_string()],
        );
        let err = interactor
            .execute(ListRepositorySummariesUseCaseInput::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("gamma"));
    }
}
