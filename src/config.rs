//! Process configuration read from the environment.
//!
//! Everything is read once at start-up into an immutable [`Config`] that is
//! passed down explicitly; nothing else in the crate touches the environment.

use std::path::PathBuf;

use tracing::warn;

use crate::completion::DEFAULT_MODEL;
use crate::{ConfigError, ConfigResult, Credentials, FetchWindow, DEFAULT_API_BASE_URL};

pub const API_KEY_VAR: &str = "X_API_KEY";
pub const API_SECRET_VAR: &str = "X_API_SECRET";
pub const ACCESS_TOKEN_VAR: &str = "X_ACCESS_TOKEN";
pub const ACCESS_TOKEN_SECRET_VAR: &str = "X_ACCESS_TOKEN_SECRET";
pub const BEARER_TOKEN_VAR: &str = "X_API_BEARER_TOKEN";
pub const USERNAME_VAR: &str = "X_USERNAME";
pub const MAX_TWEETS_VAR: &str = "MAX_TWEETS";
pub const DAYS_BACK_VAR: &str = "DAYS_BACK";
pub const API_BASE_URL_VAR: &str = "X_API_BASE_URL";
pub const ANTHROPIC_API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_MODEL_VAR: &str = "ANTHROPIC_MODEL";

/// Where the workflow reads and writes its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub posts: PathBuf,
    pub topics: PathBuf,
    pub report: PathBuf,
    pub prompt_template: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        OutputPaths {
            posts: PathBuf::from("liked_tweets.json"),
            topics: PathBuf::from("blog_topics.txt"),
            report: PathBuf::from("blog_topics_summary.json"),
            prompt_template: PathBuf::from("blog_prompt.txt"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials<'static>,
    /// App-only token for the user lookup; `None` disables it.
    pub bearer_token: Option<String>,
    pub username: String,
    pub window: FetchWindow,
    pub api_base_url: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub paths: OutputPaths,
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`; empty values count as unset.
    ///
    /// # Errors
    ///
    /// Any of the four OAuth variables or the username missing, or a
    /// malformed number. A missing bearer token only logs a warning.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::MissingVar(name));

        let credentials = Credentials::new(require(API_KEY_VAR)?, require(API_SECRET_VAR)?)
            .token(require(ACCESS_TOKEN_VAR)?, require(ACCESS_TOKEN_SECRET_VAR)?)
            .validate()?;

        let bearer_token = get(BEARER_TOKEN_VAR);
        if bearer_token.is_none() {
            warn!("no bearer token found, user lookup will not work");
        }

        let defaults = FetchWindow::default();
        let window = FetchWindow {
            max_results: parse_number(MAX_TWEETS_VAR, get(MAX_TWEETS_VAR))?
                .unwrap_or(defaults.max_results),
            days_back: parse_number(DAYS_BACK_VAR, get(DAYS_BACK_VAR))?
                .unwrap_or(defaults.days_back),
        };

        Ok(Config {
            credentials,
            bearer_token,
            username: require(USERNAME_VAR)?
                .trim()
                .trim_start_matches('@')
                .to_string(),
            window,
            api_base_url: get(API_BASE_URL_VAR).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            anthropic_api_key: get(ANTHROPIC_API_KEY_VAR),
            anthropic_model: get(ANTHROPIC_MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            paths: OutputPaths::default(),
        })
    }
}

fn parse_number<N: std::str::FromStr>(
    var: &'static str,
    value: Option<String>,
) -> ConfigResult<Option<N>> {
    value
        .map(|raw| {
            raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var,
                value: raw.clone(),
            })
        })
        .transpose()
}
