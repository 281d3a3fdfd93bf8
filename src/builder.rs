//! Turns one item identifier into a [`Post`].
//!
//! The builder never fails: an unreachable item yields a placeholder, and a
//! document missing an expected key yields whatever was extracted before the
//! missing key was hit.  Extraction order is fixed (title, author, points,
//! comments, uri) and a missing key stops it; later fields stay `None` even
//! if their own keys are present.

use serde_json::Value;
use tracing::{debug, error};

use crate::config::Config;
use crate::source::{JsonSource, Post};
use crate::validate::{validate_int, validate_string, validate_uri};

/// Item type that has no discussion thread.
const JOB_TYPE: &str = "job";

/// A required key was absent from the item document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MissingField(&'static str);

/// Builds [`Post`] records from item documents fetched through a
/// [`JsonSource`].
pub struct PostBuilder<'a> {
    source: &'a dyn JsonSource,
    config: &'a Config,
}

impl<'a> PostBuilder<'a> {
    pub fn new(source: &'a dyn JsonSource, config: &'a Config) -> Self {
        Self { source, config }
    }

    /// Fetch item `id` and build its record at position `rank`.
    pub fn build(&self, id: u64, rank: usize) -> Post {
        debug!(id, rank, "Initialising post");

        let mut post = Post::placeholder(id, rank);

        let raw = match self.source.fetch_json(&self.config.item_url(id)) {
            Ok(raw) => raw,
            Err(e) => {
                error!(id, rank, "Could not retrieve post, emitting empty record: {e}");
                return post;
            }
        };

        if let Err(MissingField(key)) = self.populate(&mut post, &raw) {
            error!(
                id,
                rank,
                field = key,
                raw = %raw,
                "Missing field whilst populating post; keeping partial record"
            );
        }

        post
    }

    fn populate(&self, post: &mut Post, raw: &Value) -> Result<(), MissingField> {
        post.title = validate_string(field(raw, "title")?);
        post.author = validate_string(field(raw, "by")?);
        post.points = validate_int(field(raw, "score")?);

        post.comments = if field(raw, "type")?.as_str() == Some(JOB_TYPE) {
            Some(0)
        } else {
            validate_int(field(raw, "descendants")?)
        };

        post.uri = match raw.get("url") {
            Some(url) => validate_uri(url),
            None => Some(self.config.fallback_url(post.id)),
        };

        Ok(())
    }
}

fn field<'v>(raw: &'v Value, key: &'static str) -> Result<&'v Value, MissingField> {
    raw.get(key).ok_or(MissingField(key))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
