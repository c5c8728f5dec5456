use std::fmt;

use log::debug;
use miette::Diagnostic;
use reqwest::{Client, Response, Url};

use crate::release::ReleaseRecord;

pub(crate) const DEFAULT_API_URL: &str = "https://api.github.com";

/// A GitHub repository and the API that serves it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Repository {
    pub(crate) api_url: String,
    pub(crate) owner: String,
    pub(crate) repo: String,
}

impl Repository {
    /// Parse `owner/repo`, the format of `GITHUB_REPOSITORY`.
    pub(crate) fn parse(api_url: &str, full_name: &str) -> Option<Self> {
        let (owner, repo) = full_name.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

pub(crate) async fn get_release_by_tag(
    client: &Client,
    repository: &Repository,
    tag: &str,
    token: &str,
) -> Result<ReleaseRecord, Error> {
    let url = release_url(repository, tag)?;
    debug!("Fetching {url}");

    client
        .get(url)
        .header("Accept", "application/vnd.github+json")
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .and_then(Response::error_for_status)
        .map_err(|err| Error::ApiRequest {
            err: err.to_string(),
            activity: format!("fetching release {tag} from {repository}"),
        })?
        .json()
        .await
        .map_err(|source| Error::ApiResponse {
            source,
            activity: "fetching a release by tag",
        })
}

/// `{api_url}/repos/{owner}/{repo}/releases/tags/{tag}`, with each part encoded as a single path
/// segment so tags like `knope/v0.13.4` stay intact.
fn release_url(repository: &Repository, tag: &str) -> Result<Url, Error> {
    let Repository {
        api_url,
        owner,
        repo,
    } = repository;
    let mut url = Url::parse(api_url).map_err(|err| Error::InvalidApiUrl {
        url: api_url.clone(),
        err: err.to_string(),
    })?;
    url.path_segments_mut()
        .map_err(|()| Error::InvalidApiUrl {
            url: api_url.clone(),
            err: "it cannot be a base URL".to_string(),
        })?
        .pop_if_empty()
        .extend(["repos", owner.as_str(), repo.as_str(), "releases", "tags", tag]);
    Ok(url)
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("The GitHub API URL {url} is not valid: {err}")]
    #[diagnostic(
        code(github::invalid_api_url),
        help("GITHUB_API_URL (or --api-url) should look like https://api.github.com")
    )]
    InvalidApiUrl { url: String, err: String },
    #[error("Trouble communicating with GitHub while {activity}: {err}")]
    #[diagnostic(
        code(github::api_request_error),
        help(
            "There was a problem communicating with GitHub, this may be a network issue, a permissions issue, or the tag may not have a release."
        )
    )]
    ApiRequest { err: String, activity: String },
    #[error("Trouble decoding the response from GitHub while {activity}: {source}")]
    #[diagnostic(
        code(github::api_response_error),
        help("GitHub returned something that doesn't look like a release.")
    )]
    ApiResponse {
        source: reqwest::Error,
        activity: &'static str,
    },
}
