use std::{fs, path::PathBuf};

use log::info;
use miette::Diagnostic;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::integrations::github;

/// Release bodies longer than this are cut off and linked back to the full release.
pub(crate) const MAX_BODY_LENGTH: usize = 1500;

/// The parts of a GitHub release object this tool cares about.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub(crate) struct ReleaseRecord {
    pub(crate) tag_name: String,
    /// GitHub sends `null` for releases created without notes.
    #[serde(default)]
    pub(crate) body: Option<String>,
    pub(crate) html_url: String,
}

/// Where the release to announce comes from.
#[derive(Debug)]
pub(crate) enum ReleaseSource {
    /// The release that triggered this run, taken from the event payload.
    FromEvent(ReleaseRecord),
    /// A release fetched by tag name, when one was configured explicitly.
    FromLookup {
        repository: github::Repository,
        tag: String,
        token: String,
    },
}

impl ReleaseSource {
    /// Get the release this run should announce, fetching it from GitHub if needed.
    pub(crate) async fn resolve(self, client: &Client) -> Result<ReleaseContext, Error> {
        let record = match self {
            Self::FromLookup {
                repository,
                tag,
                token,
            } => {
                info!("Manually fetching release {tag}");
                github::get_release_by_tag(client, &repository, &tag, &token).await?
            }
            Self::FromEvent(record) => {
                info!("Using release from initiating webhook");
                record
            }
        };
        Ok(ReleaseContext::from(record))
    }
}

/// The release as it will be presented: a version label, a link, and a body of bounded length.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ReleaseContext {
    pub(crate) body: String,
    pub(crate) version: String,
    pub(crate) url: String,
}

impl From<ReleaseRecord> for ReleaseContext {
    fn from(record: ReleaseRecord) -> Self {
        let ReleaseRecord {
            tag_name,
            body,
            html_url,
        } = record;
        Self {
            body: truncate_body(body.unwrap_or_default(), &html_url),
            version: tag_name,
            url: html_url,
        }
    }
}

fn truncate_body(body: String, url: &str) -> String {
    if body.chars().count() < MAX_BODY_LENGTH {
        return body;
    }
    let end = body
        .char_indices()
        .nth(MAX_BODY_LENGTH)
        .map_or(body.len(), |(index, _)| index);
    format!("{} ([...]({url}))", &body[..end])
}

/// Read the release out of the JSON event payload that triggered this run.
pub(crate) fn load_event(path: PathBuf) -> Result<ReleaseRecord, EventError> {
    #[derive(Deserialize)]
    struct ReleaseEvent {
        release: Option<ReleaseRecord>,
    }

    let contents = fs::read_to_string(&path).map_err(|source| EventError::Read {
        path: path.clone(),
        source,
    })?;
    let event: ReleaseEvent =
        serde_json::from_str(&contents).map_err(|source| EventError::Parse {
            path: path.clone(),
            source,
        })?;
    event.release.ok_or(EventError::NoRelease { path })
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum EventError {
    #[error("Could not read the event payload at {}: {source}", .path.display())]
    #[diagnostic(code(release::event_read))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not parse the event payload at {}: {source}", .path.display())]
    #[diagnostic(
        code(release::event_parse),
        help("The event payload should be the JSON written by GitHub Actions to GITHUB_EVENT_PATH")
    )]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("The event payload at {} does not contain a release", .path.display())]
    #[diagnostic(
        code(release::no_release),
        help(
            "Trigger this workflow on a `release` event, or set `release_tag_name` to fetch a release by its tag"
        )
    )]
    NoRelease { path: PathBuf },
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lookup(#[from] github::Error),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const URL: &str = "https://github.com/owner/repo/releases/tag/v1.0.0";

    fn record(body: Option<&str>) -> ReleaseRecord {
        ReleaseRecord {
            tag_name: "v1.0.0".to_string(),
            body: body.map(String::from),
            html_url: URL.to_string(),
        }
    }

    #[rstest]
    #[case::empty("")]
    #[case::short("## Notes\n\nFixed bug\n")]
    #[case::just_under(&"a".repeat(MAX_BODY_LENGTH - 1))]
    fn short_bodies_are_unchanged(#[case] body: &str) {
        let context = ReleaseContext::from(record(Some(body)));
        assert_eq!(context.body, body);
    }

    #[rstest]
    #[case::exact(MAX_BODY_LENGTH)]
    #[case::one_over(MAX_BODY_LENGTH + 1)]
    #[case::far_over(MAX_BODY_LENGTH * 3)]
    fn long_bodies_are_truncated(#[case] length: usize) {
        let body = "x".repeat(length);
        let context = ReleaseContext::from(record(Some(&body)));
        assert_eq!(
            context.body,
            format!("{} ([...]({URL}))", &body[..MAX_BODY_LENGTH])
        );
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let body = "é".repeat(MAX_BODY_LENGTH + 10);
        let context = ReleaseContext::from(record(Some(&body)));
        let expected: String = "é".repeat(MAX_BODY_LENGTH);
        assert_eq!(context.body, format!("{expected} ([...]({URL}))"));
    }

    #[test]
    fn missing_body_is_empty() {
        let context = ReleaseContext::from(record(None));
        assert_eq!(
            context,
            ReleaseContext {
                body: String::new(),
                version: "v1.0.0".to_string(),
                url: URL.to_string(),
            }
        );
    }

    #[test]
    fn load_release_from_event() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"action": "published", "release": {{"tag_name": "v1.0.0", "body": null, "html_url": "{URL}", "draft": false}}}}"#
        )
        .unwrap();

        let release = load_event(file.path().to_path_buf()).unwrap();

        assert_eq!(release, record(None));
    }

    #[test]
    fn event_without_release() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"action": "opened", "issue": {{}}}}"#).unwrap();

        let err = load_event(file.path().to_path_buf()).unwrap_err();

        assert!(matches!(err, EventError::NoRelease { .. }), "{err:?}");
    }

    #[test]
    fn event_is_not_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "release: v1.0.0").unwrap();

        let err = load_event(file.path().to_path_buf()).unwrap_err();

        assert!(matches!(err, EventError::Parse { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn event_source_needs_no_network() {
        let client = Client::new();
        let context = ReleaseSource::FromEvent(record(Some("## Notes\n")))
            .resolve(&client)
            .await
            .unwrap();
        assert_eq!(context.version, "v1.0.0");
        assert_eq!(context.body, "## Notes\n");
    }
}
