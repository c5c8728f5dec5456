//! Announce a GitHub release on a chat webhook.
//!
//! One run resolves a single release (from the triggering event or by tag), restyles its notes
//! for an embed, and posts it once.

use std::io::{stdout, Write};

use log::info;
use miette::{Diagnostic, Result};
use reqwest::Client;

use crate::{
    config::Config,
    integrations::webhook::{self, Payload},
};

mod config;
mod format;
mod integrations;
mod release;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The main entry point for the application.
///
/// # Errors
///
/// 1. Missing or inconsistent inputs
/// 2. The triggering event doesn't contain a release
/// 3. The release could not be fetched from GitHub
///
/// Failing to deliver the notification is logged but is never an error.
pub async fn run() -> Result<()> {
    let matches = config::command().get_matches();
    let config = Config::from_matches(&matches)?;
    notify(config).await?;
    info!("Completed successfully");
    Ok(())
}

async fn notify(config: Config) -> Result<(), Error> {
    let Config {
        webhook,
        release,
        dry_run,
    } = config;
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(Error::Client)?;

    let release = release.resolve(&client).await?;
    let payload = Payload::new(release, &webhook);

    let mut dry_run_stdout: Option<Box<dyn Write>> = if dry_run {
        Some(Box::new(stdout()))
    } else {
        None
    };
    webhook::send(&client, &webhook, &payload, &mut dry_run_stdout)
        .await
        .log();
    Ok(())
}

#[derive(Debug, Diagnostic, thiserror::Error)]
enum Error {
    #[error("Could not create an HTTP client: {0}")]
    #[diagnostic(code(client))]
    Client(#[source] reqwest::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Release(#[from] release::Error),
}
