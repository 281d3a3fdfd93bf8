//! Top-level pipeline: fetch the ranked id list, build each post, render.
//!
//! ## For contributors
//!
//! The id list is always fully resolved before any item is fetched.  Item
//! fetches run sequentially by default; with `fetch_workers > 1` the selected
//! ids are split into contiguous chunks, each chunk is built on its own
//! scoped thread, and the chunks are concatenated in order, so the output is
//! identical to the sequential run.  Workers share nothing but the read-only
//! source and config.

use std::io::Write;
use std::thread;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::builder::PostBuilder;
use crate::config::Config;
use crate::source::{FetchError, JsonSource, Post};

/// The failures that leave nothing to build.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("could not retrieve the top post list: {0}")]
    PostList(#[from] FetchError),
    #[error("top post list is not an array of item ids: {0}")]
    MalformedPostList(#[source] serde_json::Error),
}

/// Drives a [`JsonSource`] to produce the top `n` posts in rank order.
pub struct NewsReader<'a> {
    source: &'a dyn JsonSource,
    config: &'a Config,
}

impl<'a> NewsReader<'a> {
    pub fn new(source: &'a dyn JsonSource, config: &'a Config) -> Self {
        Self { source, config }
    }

    /// Build the top `count` posts.
    ///
    /// Returns fewer than `count` posts when the upstream list is shorter.
    /// Per-item failures degrade individual records and never abort the run.
    ///
    /// # Errors
    ///
    /// Fails only when the id list itself cannot be fetched or decoded.
    pub fn read(&self, count: usize) -> Result<Vec<Post>, ReadError> {
        let ids = self.fetch_post_ids(count)?;
        let posts = self.build_posts(&ids);
        info!(count = posts.len(), "Assembled posts");
        Ok(posts)
    }

    fn fetch_post_ids(&self, count: usize) -> Result<Vec<u64>, ReadError> {
        let raw = self.source.fetch_json(&self.config.list_url()).map_err(|e| {
            error!("No post list retrieved: {e}");
            ReadError::from(e)
        })?;

        let mut ids: Vec<u64> = serde_json::from_value(raw).map_err(|e| {
            error!("Post list is not an array of item ids: {e}");
            ReadError::MalformedPostList(e)
        })?;

        let retrieved = ids.len();
        if retrieved < count {
            error!(
                retrieved,
                requested = count,
                "Did not retrieve enough posts; only displaying {retrieved}"
            );
        }
        debug!(retrieved, requested = count, "Retrieved post ids");

        ids.truncate(count);
        Ok(ids)
    }

    fn build_posts(&self, ids: &[u64]) -> Vec<Post> {
        let builder = PostBuilder::new(self.source, self.config);
        let workers = self.config.fetch_workers.max(1);

        if workers == 1 || ids.len() <= 1 {
            return build_chunk(&builder, ids, 0);
        }

        let chunk_size = ids.len().div_ceil(workers);
        debug!(workers, chunk_size, "Fetching posts in parallel");

        thread::scope(|scope| {
            let handles: Vec<_> = ids
                .chunks(chunk_size)
                .enumerate()
                .map(|(index, chunk)| {
                    let builder = &builder;
                    scope.spawn(move || build_chunk(builder, chunk, index * chunk_size))
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(posts) => posts,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

/// Build `ids` in order; `offset` is the 0-based position of `ids[0]` in the
/// full selection.
fn build_chunk(builder: &PostBuilder<'_>, ids: &[u64], offset: usize) -> Vec<Post> {
    ids.iter()
        .enumerate()
        .map(|(i, &id)| builder.build(id, offset + i + 1))
        .collect()
}

/// Write `posts` as a pretty-printed JSON array with 4-space indentation.
pub fn write_posts<W: Write>(writer: W, posts: &[Post]) -> serde_json::Result<()> {
    let mut serializer = Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"    "));
    posts.serialize(&mut serializer)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::MapSource;
    use serde_json::{json, Value};

    fn config(workers: usize) -> Config {
        Config {
            fetch_workers: workers,
            ..Config::for_testing()
        }
    }

    fn item(id: u64) -> Value {
        json!({
            "by": format!("user{id}"),
            "descendants": id % 7,
            "id": id,
            "score": id * 2,
            "title": format!("Post {id}"),
            "type": "story",
            "url": format!("https://example.com/{id}")
        })
    }

    /// A source with an id list and a document for every id in it.
    fn source_with(ids: &[u64]) -> MapSource {
        let cfg = Config::for_testing();
        ids.iter().fold(
            MapSource::new().with(cfg.list_url(), json!(ids)),
            |source, &id| source.with(cfg.item_url(id), item(id)),
        )
    }

    #[test]
    fn selects_first_n_ids_in_order() {
        let source = source_with(&[10, 20, 30]);
        let cfg = config(1);
        let posts = NewsReader::new(&source, &cfg).read(2).unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!((posts[0].id, posts[0].rank), (10, 1));
        assert_eq!((posts[1].id, posts[1].rank), (20, 2));
        assert_eq!(posts[0].title.as_deref(), Some("Post 10"));
        assert!(
            !source.requested().contains(&cfg.item_url(30)),
            "id 30 must never be fetched"
        );
    }

    #[test]
    fn list_is_fetched_before_any_item() {
        let source = source_with(&[1, 2]);
        let cfg = config(1);
        NewsReader::new(&source, &cfg).read(2).unwrap();

        assert_eq!(
            source.requested(),
            vec![cfg.list_url(), cfg.item_url(1), cfg.item_url(2)]
        );
    }

    #[test]
    fn short_list_yields_every_available_post() {
        let source = source_with(&[5, 6, 7]);
        let cfg = config(1);
        let posts = NewsReader::new(&source, &cfg).read(100).unwrap();

        let ranks: Vec<usize> = posts.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn empty_list_yields_no_posts() {
        let source = source_with(&[]);
        let cfg = config(4);
        assert!(NewsReader::new(&source, &cfg).read(10).unwrap().is_empty());
    }

    #[test]
    fn failed_list_fetch_is_fatal() {
        let source = MapSource::new();
        let cfg = config(1);
        let err = NewsReader::new(&source, &cfg).read(5).unwrap_err();

        assert!(matches!(err, ReadError::PostList(_)));
        assert_eq!(source.requested(), vec![cfg.list_url()]);
    }

    #[test]
    fn malformed_list_is_fatal() {
        let cfg = config(1);
        for body in [json!({"ids": [1, 2]}), json!([1, "two", 3]), json!([-1])] {
            let source = MapSource::new().with(cfg.list_url(), body);
            let err = NewsReader::new(&source, &cfg).read(3).unwrap_err();
            assert!(matches!(err, ReadError::MalformedPostList(_)));
        }
    }

    #[test]
    fn failed_item_does_not_stop_later_items() {
        let cfg = config(1);
        let source = MapSource::new()
            .with(cfg.list_url(), json!([1, 2, 3]))
            .with(cfg.item_url(1), item(1))
            .with(cfg.item_url(3), item(3));

        let posts = NewsReader::new(&source, &cfg).read(3).unwrap();

        assert_eq!(posts.len(), 3);
        assert_eq!(posts[1], Post::placeholder(2, 2));
        assert_eq!(posts[2].title.as_deref(), Some("Post 3"));
    }

    #[test]
    fn parallel_output_matches_sequential() {
        let ids: Vec<u64> = (100..137).collect();
        let source = source_with(&ids);

        let sequential = NewsReader::new(&source, &config(1)).read(30).unwrap();
        for workers in [2, 3, 8, 32] {
            let parallel = NewsReader::new(&source, &config(workers)).read(30).unwrap();
            assert_eq!(parallel, sequential, "workers = {workers}");
        }

        let ranks: Vec<usize> = sequential.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, (1..=30).collect::<Vec<_>>());
    }

    #[test]
    fn more_workers_than_posts_is_fine() {
        let source = source_with(&[1, 2, 3]);
        let cfg = config(16);
        let posts = NewsReader::new(&source, &cfg).read(3).unwrap();

        let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    // -- over HTTP -----------------------------------------------------------

    #[tokio::test]
    async fn end_to_end_over_http() {
        use crate::source::HttpSource;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/topstories.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([10, 20, 30])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v0/item/10.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(item(10)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v0/item/20.json"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v0/item/30.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(item(30)))
            .expect(0)
            .mount(&server)
            .await;

        let cfg = Config {
            api_base_url: format!("{}/v0", server.uri()),
            ..Config::for_testing()
        };

        let posts = tokio::task::spawn_blocking(move || {
            let source = HttpSource::new(cfg.request_timeout).unwrap();
            NewsReader::new(&source, &cfg).read(2)
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].uri.as_deref(), Some("https://example.com/10"));
        assert_eq!(posts[0].rank, 1);
        assert_eq!(posts[1], Post::placeholder(20, 2));
    }

    // -- write_posts ---------------------------------------------------------

    #[test]
    fn writes_pretty_json_with_four_space_indent() {
        let posts = vec![Post {
            id: 1,
            title: Some("Hello".to_string()),
            uri: None,
            author: Some("pg".to_string()),
            points: Some(3),
            comments: Some(0),
            rank: 1,
        }];

        let mut out = Vec::new();
        write_posts(&mut out, &posts).unwrap();

        let expected = "[\n    {\n        \"title\": \"Hello\",\n        \"uri\": null,\n        \"author\": \"pg\",\n        \"points\": 3,\n        \"comments\": 0,\n        \"rank\": 1\n    }\n]";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn writes_empty_array() {
        let mut out = Vec::new();
        write_posts(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[]");
    }
}
