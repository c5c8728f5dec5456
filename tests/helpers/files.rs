use std::io::Write;

use serde_json::{json, Value};
use tempfile::NamedTempFile;

/// Write a `release` event payload like the one GitHub Actions puts at `GITHUB_EVENT_PATH`.
pub fn release_event(tag_name: &str, body: Option<&str>, html_url: &str) -> NamedTempFile {
    event_file(&json!({
        "action": "published",
        "release": {
            "tag_name": tag_name,
            "name": tag_name,
            "body": body,
            "html_url": html_url,
            "draft": false,
            "prerelease": false,
        },
        "repository": {
            "full_name": "owner/repo",
        },
    }))
}

pub fn event_file(event: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create event file");
    write!(file, "{event}").expect("failed to write event file");
    file
}
