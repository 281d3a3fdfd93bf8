//! hackernews-json — print the current top Hacker News posts as JSON.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────┐  ids   ┌────────────┐  id, rank  ┌────────────┐
//! │ source/   │ ─────► │ reader.rs  │ ─────────► │ builder.rs │
//! │ (HTTP)    │ ◄───── │ (pipeline) │ ◄───────── │ (one post) │
//! └───────────┘  item  └────────────┘    Post    └────────────┘
//!                            │                        │
//!                            ▼ write_posts()          ▼
//!                         stdout               validate.rs
//! ```
//!
//! * **`source/`** — the `JsonSource` trait, the HTTP implementation, and
//!   the `Post` output record.
//! * **`validate`** — pure field validators (string, integer, URL).
//! * **`builder`** — fetches one item and turns it into a `Post`.
//! * **`reader`** — fetches the id list, builds the top N posts in order, and
//!   renders them.
//! * **`config`** / **`logging`** — environment configuration and the
//!   append-only diagnostic log.
//! * **`main`** — wires everything together and maps failures to exit codes.

mod builder;
mod config;
mod logging;
mod reader;
mod source;
mod validate;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use thiserror::Error;
use tracing::{debug, error};

use config::Config;
use reader::{NewsReader, ReadError};
use source::{HttpSource, JsonSource};

/// The top post list could not be retrieved; nothing was printed.
const EXIT_NO_POST_LIST: u8 = 1;
/// Configuration, logging, or output failure.
const EXIT_STARTUP: u8 = 3;

/// Read Hacker News in JSON.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// How many posts to print. A positive integer <= 100.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    posts: u8,
}

/// Why the process is exiting unsuccessfully.
#[derive(Debug, Error)]
enum Failure {
    #[error(transparent)]
    Startup(#[from] anyhow::Error),
    #[error(transparent)]
    NoPostList(#[from] ReadError),
}

impl Failure {
    fn exit_status(&self) -> u8 {
        match self {
            Failure::Startup(_) => EXIT_STARTUP,
            Failure::NoPostList(_) => EXIT_NO_POST_LIST,
        }
    }

    fn report(&self) {
        match self {
            Failure::Startup(e) => {
                error!("Fatal error: {e:#}");
                eprintln!("Error: {e:#}");
            }
            Failure::NoPostList(e) => {
                error!("Terminating: {e}");
                eprintln!("Error retrieving top posts from Hacker News.");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    // Invalid arguments print usage and exit with status 2 here.
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            failure.report();
            ExitCode::from(failure.exit_status())
        }
    }
}

fn run(args: &Args) -> Result<(), Failure> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    logging::init(&config)?;
    debug!(posts = args.posts, "Number of posts requested");

    let source = HttpSource::new(config.request_timeout)?;

    print_top_posts(&source, &config, usize::from(args.posts), io::stdout().lock())
}

/// Build the top `count` posts and write them to `out`.  Nothing is written
/// when the post list is unavailable.
fn print_top_posts<W: Write>(
    source: &dyn JsonSource,
    config: &Config,
    count: usize,
    mut out: W,
) -> Result<(), Failure> {
    let posts = NewsReader::new(source, config).read(count)?;

    reader::write_posts(&mut out, &posts).context("Failed to write posts")?;
    writeln!(out).context("Failed to write posts")?;

    Ok(())
}
