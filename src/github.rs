use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Public GitHub API root
pub const DEFAULT_API_ROOT: &str = "https://api.github.com";

/// A remote repository as listed by the forge API
///
/// Only the two fields needed for mirroring are kept; everything else in the
/// API object is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepoDescriptor {
    /// `<owner>/<name>`, also used as the relative local path
    pub full_name: String,
    /// HTTPS clone URL
    pub clone_url: String,
}

/// Whose repositories to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingTarget {
    /// The owner of the API token
    AuthenticatedUser,
    /// Another account by login name
    User(String),
}

impl ListingTarget {
    pub fn from_user(user: Option<String>) -> Self {
        match user {
            Some(name) => ListingTarget::User(name),
            None => ListingTarget::AuthenticatedUser,
        }
    }

    /// API path relative to the API root
    pub fn path(&self) -> String {
        match self {
            ListingTarget::AuthenticatedUser => "user/repos".to_string(),
            ListingTarget::User(name) => format!("users/{}/repos", name),
        }
    }
}

/// Fatal repository listing failures
#[derive(Debug, Error)]
pub enum ListError {
    #[error("GitHub API request failed: {url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("GitHub API request failed: could not reach {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GitHub API request failed: {url} did not return a repository list")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// GitHub API client for listing repositories
pub struct GitHubClient {
    http: reqwest::Client,
    api_root: String,
}

impl GitHubClient {
    /// Create a client that authenticates every request with `token`
    pub fn new(api_root: &str, token: &str) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("token {}", token))
            .context("API token contains characters that are not allowed in an HTTP header")?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(concat!("gh-mirror/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            api_root: api_root.trim_end_matches('/').to_string(),
        })
    }

    /// First page URL for a listing target
    pub fn listing_url(&self, target: &ListingTarget) -> String {
        format!("{}/{}", self.api_root, target.path())
    }

    /// Fetch every page of the listing, following `rel="next"` links
    ///
    /// Any unsuccessful page aborts the whole listing; nothing fetched so far
    /// is returned.
    pub async fn list_repositories(
        &self,
        target: &ListingTarget,
    ) -> Result<Vec<RepoDescriptor>, ListError> {
        let mut repositories = Vec::new();
        let mut next_url = Some(self.listing_url(target));
        let mut page = 1u32;

        while let Some(url) = next_url.take() {
            info!("downloading page number {}", page);

            let response = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|source| ListError::Transport {
                    url: url.clone(),
                    source,
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(ListError::Status { url, status });
            }

            next_url = response
                .headers()
                .get_all(header::LINK)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .find_map(next_link);

            let items: Vec<RepoDescriptor> = response
                .json()
                .await
                .map_err(|source| ListError::Decode { url, source })?;

            debug!("Page {} listed {} repositories", page, items.len());
            repositories.extend(items);
            page += 1;
        }

        debug!("Listed {} repositories in total", repositories.len());
        Ok(repositories)
    }
}

/// Extract the `rel="next"` target from a `Link` header value
///
/// Targets are taken verbatim from between `<` and `>`, so commas inside a
/// URL do not split the entry.
pub fn next_link(link_header: &str) -> Option<String> {
    let mut rest = link_header;

    loop {
        let start = rest.find('<')?;
        let after = &rest[start + 1..];
        let end = after.find('>')?;
        let url = &after[..end];
        let (params, tail) = split_link_params(&after[end + 1..]);

        if has_next_relation(params) {
            return Some(url.to_string());
        }
        rest = tail;
    }
}

/// Split the `;`-parameters of one link entry from the entries after it
///
/// Commas inside quoted parameter values do not end the entry.
fn split_link_params(input: &str) -> (&str, &str) {
    let mut in_quotes = false;

    for (index, c) in input.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return (&input[..index], &input[index + 1..]),
            _ => {}
        }
    }

    (input, "")
}

fn has_next_relation(params: &str) -> bool {
    params
        .split(';')
        .filter_map(|param| param.split_once('='))
        .any(|(key, value)| {
            key.trim().eq_ignore_ascii_case("rel")
                && value
                    .trim()
                    .trim_matches('"')
                    .split_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        })
}
