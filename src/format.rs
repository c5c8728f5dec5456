//! Restyle release-note markdown into what a chat embed renders well.

use std::sync::OnceLock;

use regex::{Captures, Regex};

fn heading_3() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"### (.*?)\n").expect("heading pattern is valid"))
}

fn heading_2() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"## (.*?)\n").expect("heading pattern is valid"))
}

fn blank_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n\s*\n").expect("blank line pattern is valid"))
}

/// Convert a release body into embed style:
///
/// 1. `### Heading` lines become bold and underlined.
/// 2. `## Heading` lines become bold.
/// 3. Blank lines are removed.
///
/// The order matters. Level 3 headings have to be consumed before the level 2 pattern runs,
/// since `## (.*?)\n` would otherwise match the tail of every `### ` line.
pub(crate) fn format_description(body: &str) -> String {
    let body = heading_3().replace_all(body, |captures: &Captures| {
        format!("**__{}__**", strip_line_breaks(&captures[1]))
    });
    let body = heading_2().replace_all(&body, |captures: &Captures| {
        format!("**{}**", strip_line_breaks(&captures[1]))
    });
    blank_line().replace_all(&body, "\n").into_owned()
}

fn strip_line_breaks(text: &str) -> String {
    text.replace(['\r', '\n'], "")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::heading_3("### Title\n", "**__Title__**")]
    #[case::heading_2("## Title\n", "**Title**")]
    #[case::blank_line("a\n\nb", "a\nb")]
    #[case::whitespace_only_line("a\n   \nb", "a\nb")]
    #[case::many_blank_lines("a\n\n \n\t\n\nb", "a\nb")]
    #[case::heading_without_trailing_newline("## Title", "## Title")]
    #[case::level_4_heading("#### Deep\n", "#**__Deep__**")]
    #[case::no_markdown("Just a line\n", "Just a line\n")]
    fn rules(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format_description(input), expected);
    }

    /// Deliberately looser than engines where `.` stops at `\r`: those leave CRLF headings
    /// untouched, this converts them and drops the carriage return.
    #[rstest]
    #[case::heading_2("## Title\r\nNext", "**Title**Next")]
    #[case::heading_3("### Title\r\nNext", "**__Title__**Next")]
    fn crlf_headings_are_converted(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format_description(input), expected);
    }

    #[test]
    fn heading_3_is_not_matched_as_heading_2() {
        assert_eq!(
            format_description("### Features\n- one\n## Other\n- two\n"),
            "**__Features__**- one\n**Other**- two\n"
        );
    }

    #[test]
    fn release_notes() {
        assert_eq!(format_description("## Notes\n\nFixed bug\n"), "**Notes**\nFixed bug\n");
    }

    #[test]
    fn full_changelog_section() {
        const BODY: &str = "## What's Changed\n\n### Features\n\n- Add a thing\n\n### Fixes\n\n- Fix a thing\n\n\n**Full Changelog**: https://example.com/compare/v1...v2";

        assert_eq!(
            format_description(BODY),
            "**What's Changed**\n**__Features__**\n- Add a thing\n**__Fixes__**\n- Fix a thing\n**Full Changelog**: https://example.com/compare/v1...v2"
        );
    }

    #[rstest]
    #[case("a\n\n\nb\n \n c")]
    #[case("line one\r\n\r\nline two")]
    #[case("**Bold**\n\n- item\n\n\n")]
    #[case("")]
    fn idempotent_without_headings(#[case] input: &str) {
        let once = format_description(input);
        assert_eq!(format_description(&once), once);
    }
}
