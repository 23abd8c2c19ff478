//! Changelog and release message generation.
//!
//! Rendering is pure: it turns [`CommitEntry`](crate::git::CommitEntry) lists
//! into markdown. Writing places the rendered entry either in its own file
//! per release or at the top of one neverending changelog.

mod render;
mod writer;

pub use render::{
    ChangelogParams, format_date, render_changelog, render_headline, render_release_message,
};
pub use writer::{ChangelogTarget, has_entry_for, read_existing, write_changelog};
