use std::io::Write;

use log::{error, info, warn};
use miette::Diagnostic;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;

use crate::{format::format_description, release::ReleaseContext};

/// When some, the notification is written here instead of being sent.
pub(crate) type DryRun<'a> = &'a mut Option<Box<dyn Write>>;

/// Where and how to post the notification.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Webhook {
    pub(crate) url: String,
    pub(crate) color: Option<Color>,
    pub(crate) username: Option<String>,
    pub(crate) avatar_url: Option<String>,
}

/// The accent color of the embed.
///
/// Chat services want an integer, so anything that reads as one (decimal, `#RRGGBB`, `0xRRGGBB`)
/// is sent as a number. Anything else is passed along untouched.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub(crate) enum Color {
    Integer(u32),
    Raw(String),
}

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        let parsed = if let Some(hex) = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
        {
            u32::from_str_radix(hex, 16).ok()
        } else {
            trimmed.parse().ok()
        };
        parsed.map_or_else(|| Self::Raw(value.to_string()), Self::Integer)
    }
}

#[derive(Debug, Eq, PartialEq, Serialize)]
pub(crate) struct Embed {
    pub(crate) title: String,
    pub(crate) url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) color: Option<Color>,
    pub(crate) description: String,
}

#[derive(Debug, Eq, PartialEq, Serialize)]
pub(crate) struct Payload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) avatar_url: Option<String>,
    pub(crate) embeds: [Embed; 1],
}

impl Payload {
    pub(crate) fn new(release: ReleaseContext, webhook: &Webhook) -> Self {
        let ReleaseContext { body, version, url } = release;
        Self {
            username: webhook.username.clone(),
            avatar_url: webhook.avatar_url.clone(),
            embeds: [Embed {
                title: format!("Release {version}"),
                url,
                color: webhook.color.clone(),
                description: format_description(&body),
            }],
        }
    }
}

/// What came of posting the notification. Only ever logged, never fails the run.
#[derive(Debug)]
pub(crate) enum Delivery {
    Sent(Value),
    DryRun,
    Failed(Error),
}

impl Delivery {
    pub(crate) fn log(&self) {
        match self {
            Self::Sent(response) => info!("{response}"),
            Self::DryRun => {}
            Self::Failed(err @ Error::Rejected { .. }) => warn!("{err}"),
            Self::Failed(err) => error!("{err}"),
        }
    }
}

/// Post the payload to the webhook once, waiting for the message to be created so the response
/// can be logged.
pub(crate) async fn send(
    client: &Client,
    webhook: &Webhook,
    payload: &Payload,
    dry_run: DryRun<'_>,
) -> Delivery {
    match try_send(client, webhook, payload, dry_run).await {
        Ok(Some(response)) => Delivery::Sent(response),
        Ok(None) => Delivery::DryRun,
        Err(err) => Delivery::Failed(err),
    }
}

async fn try_send(
    client: &Client,
    webhook: &Webhook,
    payload: &Payload,
    dry_run: DryRun<'_>,
) -> Result<Option<Value>, Error> {
    let url = endpoint(&webhook.url)?;

    if let Some(stdout) = dry_run {
        let body = serde_json::to_string_pretty(payload).map_err(Error::Serialize)?;
        writeln!(stdout, "Would POST to {url}:\n{body}").map_err(Error::Stdout)?;
        return Ok(None);
    }

    let response = client
        .post(url)
        .json(payload)
        .send()
        .await
        .map_err(Error::Request)?;
    let status = response.status();
    let body = response.text().await.map_err(Error::Request)?;
    if !status.is_success() {
        return Err(Error::Rejected { status, body });
    }
    serde_json::from_str(&body)
        .map(Some)
        .map_err(|source| Error::Response { source, body })
}

fn endpoint(webhook_url: &str) -> Result<Url, Error> {
    let mut url = Url::parse(webhook_url).map_err(|err| Error::InvalidEndpoint(err.to_string()))?;
    url.query_pairs_mut().append_pair("wait", "true");
    Ok(url)
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("The webhook URL is not valid: {0}")]
    InvalidEndpoint(String),
    #[error("Could not encode the notification: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Trouble sending the notification: {0}")]
    Request(#[source] reqwest::Error),
    #[error("The webhook rejected the notification with {status}: {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("The webhook responded with something other than JSON ({source}): {body}")]
    Response {
        source: serde_json::Error,
        body: String,
    },
    #[error("Error writing to stdout: {0}")]
    Stdout(#[source] std::io::Error),
}
