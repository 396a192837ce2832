use crate::domain::external_apis::github::GitHubApi;
use crate::domain::models::repo::{Owner, RepositorySummary};
use anyhow::Error;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};
use thiserror::Error as ThisError;
use tokio::time::{Duration, sleep};

const MAX_RETRIES: u32 = 5;
const INITIAL_WAIT_SECS: f64 = 1.0;
const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Errors from the GitHub REST adapter. Propagated as `anyhow::Error` at the
/// port boundary.
#[derive(Debug, ThisError)]
pub enum GitHubApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GitHub returned {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("repository {id} has a malformed updated_at timestamp {value:?}: {source}")]
    Timestamp {
        id: u64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl GitHubApiError {
    /// Transport failures, rate responses and server errors heal on retry;
    /// everything else fails the fetch immediately.
    fn is_transient(&self) -> bool {
        match self {
            GitHubApiError::Transport { .. } => true,
            GitHubApiError::Status { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || *status == StatusCode::FORBIDDEN
            }
            GitHubApiError::Decode { .. } | GitHubApiError::Timestamp { .. } => false,
        }
    }
}

/// Decode a count that the hosting API serves as a number but older payload
/// shapes carried as a numeric string.
fn u64_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Deserialize, Debug, Clone)]
struct GitHubRepositoryResponse {
    id: u64,
    name: String,
    stargazers_count: u64,
    language: Option<String>,
    description: Option<String>,
    #[serde(deserialize_with = "u64_from_number_or_string")]
    forks_count: u64,
    updated_at: String, // ISO 8601, parsed during domain model conversion
    fork: bool,
    default_branch: String,
    owner: GitHubOwnerResponse,
}

#[derive(Deserialize, Debug, Clone)]
struct GitHubOwnerResponse {
    login: String,
}

impl GitHubRepositoryResponse {
    fn into_summary(self) -> Result<RepositorySummary, GitHubApiError> {
        let updated_at = chrono::DateTime::parse_from_rfc3339(&self.updated_at)
            .map_err(|source| GitHubApiError::Timestamp {
                id: self.id,
                value: self.updated_at.clone(),
                source,
            })?
            .with_timezone(&chrono::Utc);

        Ok(RepositorySummary {
            id: self.id,
            name: self.name,
            stargazers_count: self.stargazers_count,
            language: self.language,
            description: self.description,
            forks_count: self.forks_count,
            updated_at,
            fork: self.fork,
            default_branch: self.default_branch,
            owner: Owner {
                login: self.owner.login,
            },
        })
    }
}

pub struct GitHubApiAdapter {
    client: Client,
    base_url: String,
    github_token: String,
}

impl GitHubApiAdapter {
    pub fn new(base_url: String, github_token: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            github_token,
        }
    }

    async fn get_json_with_retry<T: serde::de::DeserializeOwned>(
        &self,
        operation_name: &str,
        url: &str,
    ) -> Result<T, GitHubApiError> {
        let mut retries = 0;
        let mut wait_time = INITIAL_WAIT_SECS;

        loop {
            match self.request_once(url).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() && retries < MAX_RETRIES => {
                    tracing::warn!(
                        "{} failed, retry {} of {}: {}",
                        operation_name,
                        retries + 1,
                        MAX_RETRIES,
                        e
                    );
                }
                Err(e) => return Err(e),
            }

            retries += 1;
            sleep(Duration::from_secs_f64(wait_time)).await;
            wait_time *= BACKOFF_MULTIPLIER;
        }
    }

    async fn request_once<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, GitHubApiError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.github_token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "repo-dashboard-rust-app")
            .send()
            .await
            .map_err(|source| GitHubApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GitHubApiError::Status {
                status,
                url: url.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| GitHubApiError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

#[async_trait]
impl GitHubApi for GitHubApiAdapter {
    #[tracing::instrument(name = "GitHubApiAdapter::fetch_owner_repositories", skip(self))]
    async fn fetch_owner_repositories(
        &self,
        owner: &str,
        count: u8,
    ) -> Result<Vec<RepositorySummary>, Error> {
        let url = format!(
            "{}/users/{}/repos?type=owner&sort=updated&direction=desc&per_page={}",
            self.base_url, owner, count
        );

        let response_items: Vec<GitHubRepositoryResponse> = self
            .get_json_with_retry(&format!("repositories for {owner}"), &url)
            .await?;

        let repositories = response_items
            .into_iter()
            .map(GitHubRepositoryResponse::into_summary)
            .collect::<Result<Vec<RepositorySummary>, GitHubApiError>>()?;

        Ok(repositories)
    }
}
