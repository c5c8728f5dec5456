use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};
use miette::Diagnostic;
use thiserror::Error;

use crate::{
    integrations::{
        github::{Repository, DEFAULT_API_URL},
        webhook::{Color, Webhook},
    },
    release::{load_event, EventError, ReleaseSource},
};

const WEBHOOK_URL: &str = "webhook_url";
const COLOR: &str = "color";
const USERNAME: &str = "username";
const AVATAR_URL: &str = "avatar_url";
const RELEASE_TAG_NAME: &str = "release_tag_name";
const GITHUB_TOKEN: &str = "github_token";
const EVENT_PATH: &str = "event_path";
const REPOSITORY: &str = "repository";
const API_URL: &str = "api_url";
const DRY_RUN: &str = "dry_run";

/// Everything one run needs, gathered once at startup.
#[derive(Debug)]
pub(crate) struct Config {
    pub(crate) webhook: Webhook,
    pub(crate) release: ReleaseSource,
    pub(crate) dry_run: bool,
}

/// Each input can be passed as a flag or through the `INPUT_*` variables GitHub Actions sets.
pub(crate) fn command() -> Command {
    clap::command!()
        .arg(
            Arg::new(WEBHOOK_URL)
                .long("webhook-url")
                .env("INPUT_WEBHOOK_URL")
                .hide_env_values(true)
                .help("The webhook to post the release notification to"),
        )
        .arg(
            Arg::new(COLOR)
                .long("color")
                .env("INPUT_COLOR")
                .help("Accent color of the embed, as a decimal or #RRGGBB value"),
        )
        .arg(
            Arg::new(USERNAME)
                .long("username")
                .env("INPUT_USERNAME")
                .help("Override the webhook's display name"),
        )
        .arg(
            Arg::new(AVATAR_URL)
                .long("avatar-url")
                .env("INPUT_AVATAR_URL")
                .help("Override the webhook's avatar"),
        )
        .arg(
            Arg::new(RELEASE_TAG_NAME)
                .long("release-tag-name")
                .env("INPUT_RELEASE_TAG_NAME")
                .help("Fetch the release with this tag instead of using the triggering event"),
        )
        .arg(
            Arg::new(GITHUB_TOKEN)
                .long("github-token")
                .env("INPUT_GITHUB_TOKEN")
                .hide_env_values(true)
                .help("Token used to fetch a release by tag"),
        )
        .arg(
            Arg::new(EVENT_PATH)
                .long("event-path")
                .env("GITHUB_EVENT_PATH")
                .help("The JSON payload of the triggering release event"),
        )
        .arg(
            Arg::new(REPOSITORY)
                .long("repository")
                .env("GITHUB_REPOSITORY")
                .help("The repository to fetch a release from, as owner/repo"),
        )
        .arg(
            Arg::new(API_URL)
                .long("api-url")
                .env("GITHUB_API_URL")
                .help("Base URL of the GitHub API"),
        )
        .arg(
            Arg::new(DRY_RUN)
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Print the notification instead of sending it"),
        )
}

impl Config {
    /// Validate the inputs and load the triggering release, if that's where it comes from.
    ///
    /// ## Errors
    /// 1. `webhook_url` is missing
    /// 2. `release_tag_name` is set without a `github_token`
    /// 3. `release_tag_name` is set but the repository is missing or malformed
    /// 4. No event payload to read the release from
    pub(crate) fn from_matches(matches: &ArgMatches) -> Result<Self, Error> {
        let webhook_url = input(matches, WEBHOOK_URL).ok_or(ConfigError::MissingWebhookUrl)?;
        let webhook = Webhook {
            url: webhook_url,
            color: input(matches, COLOR).as_deref().map(Color::from),
            username: input(matches, USERNAME),
            avatar_url: input(matches, AVATAR_URL),
        };

        let release = if let Some(tag) = input(matches, RELEASE_TAG_NAME) {
            let token = input(matches, GITHUB_TOKEN).ok_or(ConfigError::MissingGitHubToken)?;
            let full_name = input(matches, REPOSITORY).ok_or(ConfigError::MissingRepository)?;
            let api_url = input(matches, API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string());
            let repository = Repository::parse(&api_url, &full_name)
                .ok_or(ConfigError::InvalidRepository(full_name))?;
            ReleaseSource::FromLookup {
                repository,
                tag,
                token,
            }
        } else {
            let path = input(matches, EVENT_PATH).ok_or(ConfigError::MissingEventPath)?;
            ReleaseSource::FromEvent(load_event(PathBuf::from(path))?)
        };

        Ok(Self {
            webhook,
            release,
            dry_run: matches.get_flag(DRY_RUN),
        })
    }
}

/// Actions passes unset inputs as empty strings, so those count as missing.
fn input(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(String::from)
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum ConfigError {
    #[error("webhook_url not set. Please set it.")]
    #[diagnostic(
        code(config::missing_webhook_url),
        help("Pass --webhook-url or set the `webhook_url` input of the action")
    )]
    MissingWebhookUrl,
    #[error(
        "tag_name manually specified but github_token not provided. Token is required to fetch releases manually"
    )]
    #[diagnostic(
        code(config::missing_github_token),
        help("Set the `github_token` input, usually to the workflow's GITHUB_TOKEN secret")
    )]
    MissingGitHubToken,
    #[error("release_tag_name is set but there is no repository to fetch it from")]
    #[diagnostic(
        code(config::missing_repository),
        help("Pass --repository owner/repo or set GITHUB_REPOSITORY")
    )]
    MissingRepository,
    #[error("{0} is not a repository, expected owner/repo")]
    #[diagnostic(code(config::invalid_repository))]
    InvalidRepository(String),
    #[error("No release event to announce")]
    #[diagnostic(
        code(config::missing_event),
        help(
            "Run this from a workflow triggered by a `release` event, or set `release_tag_name` to fetch a release by its tag"
        )
    )]
    MissingEventPath,
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Event(#[from] EventError),
}
