//! # Palaver Wiki
//!
//! Wikipedia reference server built on the palaver callback runtime. It
//! exposes search and article tools, and demonstrates every callback the
//! runtime offers: `smart_summarize` samples the client's LLM,
//! `interactive_search` elicits a disambiguation choice from the user, and
//! `get_article_with_progress` streams progress while it fetches.
//!
//! The crate doubles as a library so tests (and other binaries) can register
//! the tool set against any [`WikipediaClient`], including one pointed at a
//! mock server.

pub mod client;
pub mod select;
pub mod text;
pub mod tools;

pub use client::{WikiError, WikiPage, WikipediaClient};
pub use tools::register_tools;
