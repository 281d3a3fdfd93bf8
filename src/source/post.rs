//! The output record for a single ranked post.
//!
//! `Post` is built once per selected identifier and never mutated after the
//! reader has collected it.  Every optional field degrades to `None` (JSON
//! `null`) independently of the others.

use serde::Serialize;

/// A single Hacker News post, validated and normalised.
///
/// ## Serialisation
///
/// Field declaration order *is* the output order:
/// `title, uri, author, points, comments, rank`.  The upstream `id` is kept
/// for diagnostics but never serialised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    /// Upstream item identifier.
    #[serde(skip)]
    pub id: u64,

    /// Headline, capped at 256 characters.
    pub title: Option<String>,

    /// External link, or the discussion page for text-only posts.
    pub uri: Option<String>,

    /// Submitter's username, capped at 256 characters.
    pub author: Option<String>,

    /// Score; `None` when absent, non-integer, or negative.
    pub points: Option<u64>,

    /// Comment count.  Always `Some(0)` for job postings.
    pub comments: Option<u64>,

    /// 1-based position in the requested ordering.
    pub rank: usize,
}

impl Post {
    /// A record with only `id` and `rank` set.
    ///
    /// This is both the starting point for the builder and the final result
    /// when the item could not be fetched at all.
    pub fn placeholder(id: u64, rank: usize) -> Self {
        Self {
            id,
            title: None,
            uri: None,
            author: None,
            points: None,
            comments: None,
            rank,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
