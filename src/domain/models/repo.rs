use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One repository as the frontend displays it: an immutable snapshot of the
/// hosting service's record at fetch time, reduced to the rendered fields.
///
/// Serialized field names are the contract the frontend consumes, so they
/// stay snake_case as the hosting API spells them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub id: u64,
    pub name: String,
    pub stargazers_count: u64,
    /// Primary detected language; the API reports null for e.g. empty repos.
    pub language: Option<String>,
    pub description: Option<String>,
    pub forks_count: u64,
    pub updated_at: DateTime<Utc>,
    pub fork: bool,
    pub default_branch: String,
    pub owner: Owner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}
