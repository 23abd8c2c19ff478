//! Markdown rendering of release notes.

use crate::git::CommitEntry;
use chrono::{DateTime, Utc};

/// Everything needed to render one changelog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogParams {
    /// Released version, without prefix
    pub version: String,
    /// Release branch name, also the per-release file stem
    pub file_name: String,
    /// Build timestamp in milliseconds since the epoch
    pub build_timestamp: i64,
    /// Base URL for commit links
    pub commit_url: Option<String>,
    /// Base URL for the release link in the headline
    pub release_url: Option<String>,
    /// Package status shown next to the headline
    pub package_status: Option<String>,
    /// Author shown in the "Created by" line
    pub username: Option<String>,
    /// Keep commits of the same conventional-commit type together
    pub group: bool,
    /// Append the commit author to each line
    pub author: bool,
}

impl Default for ChangelogParams {
    fn default() -> Self {
        Self {
            version: String::new(),
            file_name: String::new(),
            build_timestamp: 0,
            commit_url: None,
            release_url: None,
            package_status: None,
            username: None,
            group: false,
            author: true,
        }
    }
}

/// Format a millisecond timestamp as `YYYY-MM-DD` (UTC)
pub fn format_date(timestamp_millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .unwrap_or_default()
        .format("%Y-%m-%d")
        .to_string()
}

/// Headline of a changelog entry
pub fn render_headline(params: &ChangelogParams) -> String {
    let date = format_date(params.build_timestamp);
    let mut headline = match non_empty(&params.release_url) {
        Some(url) => format!(
            "## {}, [v{}]({}/{})",
            date,
            params.version,
            url.trim_end_matches('/'),
            params.file_name
        ),
        None => format!("## {}, v{}", date, params.version),
    };
    if let Some(status) = non_empty(&params.package_status) {
        headline.push_str(&format!(" **_<small>{}</small>_**", status));
    }
    headline
}

/// Render a full changelog entry for `commits` (newest first)
pub fn render_changelog(params: &ChangelogParams, commits: &[CommitEntry]) -> String {
    let mut out = render_headline(params);
    out.push_str("\n\n");

    if let Some(user) = non_empty(&params.username) {
        out.push_str(&format!("*Created by: {}*\n", user));
    }

    out.push_str("\n### Commits\n");
    let commit_url = non_empty(&params.commit_url);
    let ordered = if params.group {
        group_by_kind(commits)
    } else {
        commits.iter().collect()
    };
    for commit in ordered {
        out.push_str("\n  - ");
        out.push_str(&render_commit(commit, commit_url, params.author));
    }
    if !commits.is_empty() {
        out.push('\n');
    }
    out
}

/// Short release message used as the tag annotation
pub fn render_release_message(commits: &[CommitEntry]) -> String {
    commits
        .iter()
        .map(|commit| format!("- {}", describe(commit, true)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Commits ordered by type in order of first appearance, untyped commits last.
/// Order within a type is kept.
fn group_by_kind(commits: &[CommitEntry]) -> Vec<&CommitEntry> {
    let mut kinds: Vec<&str> = Vec::new();
    for kind in commits.iter().filter_map(|c| c.kind.as_deref()) {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    let mut ordered: Vec<&CommitEntry> = kinds
        .iter()
        .flat_map(|kind| {
            commits
                .iter()
                .filter(move |c| c.kind.as_deref() == Some(*kind))
        })
        .collect();
    ordered.extend(commits.iter().filter(|c| c.kind.is_none()));
    ordered
}

fn render_commit(commit: &CommitEntry, commit_url: Option<&str>, author: bool) -> String {
    match commit_url {
        Some(url) => format!(
            "[`{}`]({}/{}) {}",
            commit.short_hash(),
            url.trim_end_matches('/'),
            commit.hash,
            describe(commit, author)
        ),
        None => describe(commit, author),
    }
}

/// `scope: subject (author)` with the optional parts left out
fn describe(commit: &CommitEntry, author: bool) -> String {
    let mut line = String::new();
    if let Some(scope) = commit.scope.as_deref().filter(|s| !s.is_empty()) {
        line.push_str(scope);
        line.push_str(": ");
    }
    line.push_str(&commit.subject);
    if author && !commit.author.is_empty() {
        line.push_str(&format!(" ({})", commit.author));
    }
    line
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-05T12:00:00Z
    const NOON: i64 = 1_709_640_000_000;

    fn commits() -> Vec<CommitEntry> {
        vec![
            CommitEntry::from_subject("1111111aaaa", "feat(api): add export", "Ana"),
            CommitEntry::from_subject("2222222bbbb", "Fix typo", "Bo"),
        ]
    }

    fn params() -> ChangelogParams {
        ChangelogParams {
            version: "2.1.1".to_string(),
            file_name: "2.1.1".to_string(),
            build_timestamp: NOON,
            ..Default::default()
        }
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(NOON), "2024-03-05");
    }

    #[test]
    fn test_plain_changelog() {
        let text = render_changelog(&params(), &commits());
        assert_eq!(
            text,
            "## 2024-03-05, v2.1.1\n\n\n### Commits\n\n  - api: add export (Ana)\n  - Fix typo (Bo)\n"
        );
    }

    #[test]
    fn test_changelog_with_links_status_and_author() {
        let params = ChangelogParams {
            commit_url: Some("https://git.example.com/commit/".to_string()),
            release_url: Some("https://git.example.com/changelogs".to_string()),
            package_status: Some("beta".to_string()),
            username: Some("Release Bot".to_string()),
            ..params()
        };
        let text = render_changelog(&params, &commits()[..1]);
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(
                "## 2024-03-05, [v2.1.1](https://git.example.com/changelogs/2.1.1) \
                 **_<small>beta</small>_**"
            )
        );
        assert!(text.contains("*Created by: Release Bot*\n"));
        assert!(text.contains(
            "  - [`1111111`](https://git.example.com/commit/1111111aaaa) api: add export (Ana)"
        ));
    }

    #[test]
    fn test_grouped_changelog_keeps_types_together() {
        let commits = vec![
            CommitEntry::from_subject("1111111aaaa", "feat: first feature", "Ana"),
            CommitEntry::from_subject("2222222bbbb", "fix(ui): broken button", "Bo"),
            CommitEntry::from_subject("3333333cccc", "Bump deps", "Bo"),
            CommitEntry::from_subject("4444444dddd", "feat(api): second feature", "Ana"),
        ];
        let params = ChangelogParams {
            group: true,
            author: false,
            ..params()
        };
        let text = render_changelog(&params, &commits);
        assert!(text.ends_with(
            "### Commits\n\n  - first feature\n  - api: second feature\n  - ui: broken button\n  - Bump deps\n"
        ));
    }

    #[test]
    fn test_release_message_lines() {
        assert_eq!(
            render_release_message(&commits()),
            "- api: add export (Ana)\n- Fix typo (Bo)"
        );
        assert_eq!(render_release_message(&[]), "");
    }
}
