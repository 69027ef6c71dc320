//! Append-only note log stored in a single text column.
//!
//! Sales and orders keep operational notes ("ready for pickup", cancellation
//! reasons, transfer confirmations) as an ordered sequence of timestamped
//! entries. The storage representation stays one text column; appending
//! never rewrites earlier entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEntry {
    pub at: DateTime<Utc>,
    pub author: String,
    pub text: String,
}

impl NoteEntry {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            author: author.into(),
            text: text.into(),
        }
    }

    fn render(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.at.format(TIMESTAMP_FORMAT),
            self.author,
            self.text
        )
    }
}

/// Appends an entry to an existing notes column value, preserving whatever
/// was there before verbatim (including free-form text written by older
/// tooling that predates the entry format).
pub fn append(existing: Option<&str>, entry: &NoteEntry) -> String {
    match existing {
        Some(prior) if !prior.trim().is_empty() => {
            format!("{}\n{}", prior.trim_end(), entry.render())
        }
        _ => entry.render(),
    }
}

/// Parses a notes column back into entries. Lines that do not match the
/// entry format are kept as author-less entries so no text is ever lost.
pub fn parse(notes: &str) -> Vec<NoteEntry> {
    notes
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_line(line).unwrap_or_else(|| NoteEntry::new("", line.trim())))
        .collect()
}

fn parse_line(line: &str) -> Option<NoteEntry> {
    let rest = line.strip_prefix('[')?;
    let (stamp, rest) = rest.split_once("] ")?;
    let (author, text) = rest.split_once(": ")?;
    let at = chrono::NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
        .ok()?
        .and_utc();
    Some(NoteEntry {
        at,
        author: author.to_string(),
        text: text.to_string(),
    })
}
