//! Runtime configuration resolved once at startup.
//!
//! Missing settings are fatal before any document is read.
use crate::cli::{CheckArgs, RunArgs, SourceArgs};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not set; pass {flag} or set the {name} environment variable")]
    Missing {
        name: &'static str,
        flag: &'static str,
    },
    #[error("API_URL must be an http(s) URL, got `{0}`")]
    InvalidApiUrl(String),
}

/// Source-control settings needed to resolve repository metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: String,
    pub repository: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Registry base URL, always ending with `/`.
    pub api_url: String,
    /// Present only for commands that submit.
    pub github: Option<GitHubConfig>,
    pub proposals_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

impl Config {
    pub fn for_check(args: &CheckArgs) -> Result<Self, ConfigError> {
        Self::from_source(&args.source, None)
    }

    pub fn for_run(args: &RunArgs) -> Result<Self, ConfigError> {
        let token = non_empty(args.token.clone())
            .or_else(|| non_empty(env::var("GITHUB_TOKEN").ok()));
        let github = GitHubConfig {
            api_url: args.github_api_url.clone(),
            token: require(token, "GH_TOKEN", "--token")?,
            repository: require(args.repository.clone(), "GITHUB_REPOSITORY", "--repository")?,
        };
        Self::from_source(&args.source, Some(github))
    }

    fn from_source(source: &SourceArgs, github: Option<GitHubConfig>) -> Result<Self, ConfigError> {
        let api_url = require(source.api_url.clone(), "API_URL", "--api-url")?;
        Ok(Self {
            api_url: normalize_api_url(&api_url)?,
            github,
            proposals_dir: source.proposals_dir.clone(),
            files: source.files.clone(),
        })
    }
}

/// Trim and require an http(s) scheme; append a trailing `/` if missing.
pub fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidApiUrl(trimmed.to_string()));
    }
    let mut url = trimmed.trim_end_matches('/').to_string();
    url.push('/');
    Ok(url)
}

fn require(
    value: Option<String>,
    name: &'static str,
    flag: &'static str,
) -> Result<String, ConfigError> {
    non_empty(value).ok_or(ConfigError::Missing { name, flag })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
