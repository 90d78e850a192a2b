//! File based configuration of a validation run.
//!
//! ```toml
//! retry_attempts = 2
//! exclude = ["https://example\\.com/private/.*"]
//! skip_localhost = true
//!
//! [[group]]
//! pattern = "https://api\\.example\\.com/.*"
//! bearer_token_env = "EXAMPLE_TOKEN"
//! rate_limit = { requests = 10, interval_ms = 1000 }
//! continuation = [{ kind = "at-most", status = 429, count = 0 }]
//!
//! [[group]]
//! preset = "github-raw"
//! bearer_token_env = "GITHUB_TOKEN"
//! ```
//!
//! Top-level keys can be overridden with `LINKWARD_` environment variables,
//! e.g. `LINKWARD_RETRY_ATTEMPTS=3`.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;

use crate::core::{AlwaysValid, GitHubRawFragmentValidator, RequestsPerInterval, count_at_least, count_at_most};
use crate::effects::{DEFAULT_OVERALL_TIMEOUT, DEFAULT_RETRY_ATTEMPTS, LinkStream};
use crate::error::{Error, Result};
use crate::group::{LinkGroup, github_html_blob_links, github_raw_blob_links};

const ENV_PREFIX: &str = "LINKWARD_";

/// Settings of a whole run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    pub retry_attempts: u32,
    pub overall_timeout_ms: u64,
    pub concurrency: usize,
    /// Patterns of resolved URIs to skip.
    pub exclude: Vec<String>,
    /// Resolved URIs to skip.
    pub exclude_uris: Vec<String>,
    /// When set, only resolved URIs matching this pattern are checked.
    pub include: Option<String>,
    pub skip_localhost: bool,
    #[serde(rename = "group")]
    pub groups: Vec<GroupConfig>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            overall_timeout_ms: DEFAULT_OVERALL_TIMEOUT.as_millis() as u64,
            concurrency: 1,
            exclude: Vec::new(),
            exclude_uris: Vec::new(),
            include: None,
            skip_localhost: false,
            groups: Vec::new(),
        }
    }
}

/// One `[[group]]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Required unless a preset provides it.
    pub pattern: Option<String>,
    pub preset: Option<Preset>,
    pub headers: BTreeMap<String, String>,
    pub basic_auth: Option<BasicAuth>,
    /// Name of the environment variable holding the bearer token.
    pub bearer_token_env: Option<String>,
    pub rate_limit: Option<RateLimitConfig>,
    pub random_order: bool,
    pub continuation: Vec<PolicyConfig>,
    #[serde(rename = "final")]
    pub final_policies: Vec<PolicyConfig>,
    pub fragments: FragmentMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    GithubRaw,
    GithubHtml,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimitConfig {
    pub requests: u32,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PolicyConfig {
    pub kind: PolicyKind,
    pub status: i32,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    AtLeast,
    AtMost,
}

/// How fragments of a group's links are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FragmentMode {
    /// HTML ids and anchors, or the preset's validator.
    #[default]
    Default,
    GithubRaw,
    None,
}

impl CheckConfig {
    /// Loads `path` and merges `LINKWARD_*` environment variables over it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file is missing or malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let config = Figment::new()
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()?;
        Ok(config)
    }

    /// Parses a TOML document, without environment overrides.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Ok(Figment::new().merge(Toml::string(toml)).extract()?)
    }

    /// Configures `stream` with these settings, reading tokens from the
    /// process environment.
    pub fn apply(&self, stream: LinkStream) -> Result<LinkStream> {
        self.apply_with_env(stream, |name| std::env::var(name).ok())
    }

    /// Like [`apply`](Self::apply), looking environment variables up with `env`.
    pub fn apply_with_env(
        &self,
        stream: LinkStream,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<LinkStream> {
        let mut stream = stream
            .retry_attempts(self.retry_attempts)
            .overall_timeout(Duration::from_millis(self.overall_timeout_ms))
            .concurrency(self.concurrency)
            .exclude_resolved_uris(self.exclude_uris.iter().cloned());
        for pattern in &self.exclude {
            stream = stream.exclude_resolved(pattern)?;
        }
        if let Some(include) = &self.include {
            stream = stream.include_resolved(include)?;
        }
        if self.skip_localhost {
            stream = stream.exclude_localhost();
        }
        for group in &self.groups {
            stream = group.apply(stream, &env)?.end_group()?;
        }
        Ok(stream)
    }
}

impl GroupConfig {
    fn apply(&self, stream: LinkStream, env: &impl Fn(&str) -> Option<String>) -> Result<LinkGroup> {
        let token = match &self.bearer_token_env {
            Some(name) => Some(env(name).ok_or_else(|| Error::MissingEnv(name.clone()))?),
            None => None,
        };

        let mut group = match (self.preset, &self.pattern) {
            (Some(preset), pattern) => {
                let token = token.as_deref().unwrap_or_default();
                let group = match preset {
                    Preset::GithubRaw => stream.group_with(github_raw_blob_links(token)?)?,
                    Preset::GithubHtml => stream.group_with(github_html_blob_links(token)?)?,
                };
                match pattern {
                    Some(pattern) => group.pattern(pattern)?,
                    None => group,
                }
            }
            (None, Some(pattern)) => {
                let group = stream.group(pattern)?;
                match &token {
                    Some(token) => group.bearer_token(token),
                    None => group,
                }
            }
            (None, None) => stream.group(".*")?,
        };

        for (name, value) in &self.headers {
            group = group.header(name.as_str(), value.as_str());
        }
        if let Some(auth) = &self.basic_auth {
            group = group.basic_auth(&auth.username, &auth.password);
        }
        if let Some(limit) = self.rate_limit {
            group = group.rate_limit(RequestsPerInterval::new(
                limit.requests,
                Duration::from_millis(limit.interval_ms),
            ));
        }
        if self.random_order {
            group = group.random_order();
        }
        for policy in &self.continuation {
            group = match policy.kind {
                PolicyKind::AtLeast => group.continuation_policy(count_at_least(policy.status, policy.count)),
                PolicyKind::AtMost => group.continuation_policy(count_at_most(policy.status, policy.count)),
            };
        }
        for policy in &self.final_policies {
            group = match policy.kind {
                PolicyKind::AtLeast => group.final_policy(count_at_least(policy.status, policy.count)),
                PolicyKind::AtMost => group.final_policy(count_at_most(policy.status, policy.count)),
            };
        }
        Ok(match self.fragments {
            FragmentMode::Default => group,
            FragmentMode::GithubRaw => group.fragment_validator(GitHubRawFragmentValidator),
            FragmentMode::None => group.fragment_validator(AlwaysValid),
        })
    }
}
