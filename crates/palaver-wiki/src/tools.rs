//! The Wikipedia tool set.
//!
//! Seven tools over one [`WikipediaClient`]. The first four are plain
//! request/response tools; the last three use the callback channel:
//! `smart_summarize` samples the client's LLM (and degrades gracefully when
//! none is available), `interactive_search` elicits a disambiguation choice
//! from the user, and `get_article_with_progress` reports progress while it
//! works.

use std::sync::Arc;

use serde::Deserialize;

use palaver_protocol::{
    ElicitationRequest, ErrorKind, PalaverError, PalaverResult, SamplingRequest, ToolDescriptor,
    ToolInputSchema, ToolOutput,
};
use palaver_server::registry::tool_with_descriptor;
use palaver_server::ToolRegistry;

use crate::client::WikipediaClient;
use crate::select::resolve_selection;
use crate::text::{limit_sentences, truncate_at_boundary};

/// Character budget for LLM-enhanced summaries.
const SMART_SUMMARY_MAX_CHARS: u32 = 800;
/// Result cap for interactive disambiguation.
const INTERACTIVE_SEARCH_LIMIT: u8 = 8;

fn default_search_limit() -> u8 {
    5
}

fn default_sentences() -> u8 {
    3
}

fn default_max_length() -> usize {
    2000
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default = "default_search_limit")]
    limit: u8,
}

#[derive(Debug, Deserialize)]
struct SummaryArgs {
    title: String,
    #[serde(default = "default_sentences")]
    sentences: u8,
}

#[derive(Debug, Deserialize)]
struct ContentArgs {
    title: String,
    #[serde(default = "default_max_length")]
    max_length: usize,
}

#[derive(Debug, Deserialize)]
struct TitleArgs {
    title: String,
}

#[derive(Debug, Deserialize)]
struct QueryArgs {
    query: String,
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: serde_json::Value) -> PalaverResult<T> {
    serde_json::from_value(arguments)
        .map_err(|err| PalaverError::invalid_input(format!("bad arguments: {err}")))
}

fn require_nonempty(value: &str, what: &str) -> PalaverResult<()> {
    if value.trim().is_empty() {
        Err(PalaverError::invalid_input(format!("{what} cannot be empty")))
    } else {
        Ok(())
    }
}

fn check_limit(limit: u8) -> PalaverResult<()> {
    if (1..=10).contains(&limit) {
        Ok(())
    } else {
        Err(PalaverError::invalid_input("limit must be between 1 and 10"))
    }
}

fn check_sentences(sentences: u8) -> PalaverResult<()> {
    if (1..=10).contains(&sentences) {
        Ok(())
    } else {
        Err(PalaverError::invalid_input(
            "sentences must be between 1 and 10",
        ))
    }
}

fn check_max_length(max_length: usize) -> PalaverResult<()> {
    if (100..=10_000).contains(&max_length) {
        Ok(())
    } else {
        Err(PalaverError::invalid_input(
            "max_length must be between 100 and 10000",
        ))
    }
}

async fn summary_of(wiki: &WikipediaClient, title: &str, sentences: u8) -> PalaverResult<String> {
    let page = wiki.fetch_page(title.trim()).await?;
    let summary = page.summary();
    if summary.is_empty() {
        return Err(PalaverError::not_found(format!(
            "no summary available for article '{title}'"
        )));
    }
    Ok(limit_sentences(summary, usize::from(sentences)))
}

/// Register all Wikipedia tools.
///
/// # Errors
///
/// Propagates duplicate-name registration failures.
pub fn register_tools(registry: &ToolRegistry, wiki: Arc<WikipediaClient>) -> PalaverResult<()> {
    registry.register(search_wikipedia(Arc::clone(&wiki)))?;
    registry.register(get_article_summary(Arc::clone(&wiki)))?;
    registry.register(get_article_content(Arc::clone(&wiki)))?;
    registry.register(get_article_info(Arc::clone(&wiki)))?;
    registry.register(smart_summarize(Arc::clone(&wiki)))?;
    registry.register(interactive_search(Arc::clone(&wiki)))?;
    registry.register(get_article_with_progress(wiki))?;
    Ok(())
}

fn string_schema(description: &str) -> serde_json::Value {
    serde_json::json!({"type": "string", "description": description})
}

fn integer_schema(description: &str) -> serde_json::Value {
    serde_json::json!({"type": "integer", "description": description})
}

/// Search Wikipedia articles by keyword.
pub fn search_wikipedia(wiki: Arc<WikipediaClient>) -> impl palaver_server::ToolHandler {
    let descriptor = ToolDescriptor::new("search_wikipedia", "Search Wikipedia articles by keyword")
        .with_schema(
            ToolInputSchema::object()
                .with_property("query", string_schema("Search query"), true)
                .with_property("limit", integer_schema("Max results, 1-10 (default 5)"), false),
        );
    tool_with_descriptor(descriptor, move |arguments, _ctx| {
        let wiki = Arc::clone(&wiki);
        async move {
            let args: SearchArgs = parse_args(arguments)?;
            require_nonempty(&args.query, "query")?;
            check_limit(args.limit)?;

            let titles = wiki.search(args.query.trim(), args.limit).await
                .map_err(PalaverError::from)?;
            tracing::info!(query = %args.query, results = titles.len(), "search complete");
            Ok(ToolOutput::structured(
                titles.join("\n"),
                serde_json::json!({ "titles": titles }),
            ))
        }
    })
}

/// Get a brief summary of an article.
pub fn get_article_summary(wiki: Arc<WikipediaClient>) -> impl palaver_server::ToolHandler {
    let descriptor =
        ToolDescriptor::new("get_article_summary", "Get a brief summary of a Wikipedia article")
            .with_schema(
                ToolInputSchema::object()
                    .with_property("title", string_schema("Article title"), true)
                    .with_property(
                        "sentences",
                        integer_schema("Sentences in the summary, 1-10 (default 3)"),
                        false,
                    ),
            );
    tool_with_descriptor(descriptor, move |arguments, _ctx| {
        let wiki = Arc::clone(&wiki);
        async move {
            let args: SummaryArgs = parse_args(arguments)?;
            require_nonempty(&args.title, "article title")?;
            check_sentences(args.sentences)?;

            let summary = summary_of(&wiki, &args.title, args.sentences).await?;
            Ok(ToolOutput::text(summary))
        }
    })
}

/// Get full article content, truncated when necessary.
pub fn get_article_content(wiki: Arc<WikipediaClient>) -> impl palaver_server::ToolHandler {
    let descriptor = ToolDescriptor::new(
        "get_article_content",
        "Get the full content of a Wikipedia article (truncated if necessary)",
    )
    .with_schema(
        ToolInputSchema::object()
            .with_property("title", string_schema("Article title"), true)
            .with_property(
                "max_length",
                integer_schema("Max content length in characters, 100-10000 (default 2000)"),
                false,
            ),
    );
    tool_with_descriptor(descriptor, move |arguments, _ctx| {
        let wiki = Arc::clone(&wiki);
        async move {
            let args: ContentArgs = parse_args(arguments)?;
            require_nonempty(&args.title, "article title")?;
            check_max_length(args.max_length)?;

            let page = wiki.fetch_page(args.title.trim()).await
                .map_err(PalaverError::from)?;
            if page.text.is_empty() {
                return Err(PalaverError::not_found(format!(
                    "no content available for article '{}'",
                    args.title
                )));
            }
            Ok(ToolOutput::text(truncate_at_boundary(
                &page.text,
                args.max_length,
            )))
        }
    })
}

/// Get basic metadata about an article.
pub fn get_article_info(wiki: Arc<WikipediaClient>) -> impl palaver_server::ToolHandler {
    let descriptor = ToolDescriptor::new(
        "get_article_info",
        "Get basic information about a Wikipedia article",
    )
    .with_schema(
        ToolInputSchema::object().with_property("title", string_schema("Article title"), true),
    );
    tool_with_descriptor(descriptor, move |arguments, _ctx| {
        let wiki = Arc::clone(&wiki);
        async move {
            let args: TitleArgs = parse_args(arguments)?;
            require_nonempty(&args.title, "article title")?;

            let page = wiki.fetch_page(args.title.trim()).await
                .map_err(PalaverError::from)?;
            let info = serde_json::json!({
                "title": page.title,
                "url": page.url,
                "summaryLength": page.summary().len(),
                "contentLength": page.text.len(),
                "categories": page.categories,
                "linksCount": page.link_count,
            });
            Ok(ToolOutput::structured(
                format!("{} ({} chars)", page.title, page.text.len()),
                info,
            ))
        }
    })
}

/// AI-enhanced article summary via client-side sampling.
///
/// Falls back to the plain summary when the client has no model available.
pub fn smart_summarize(wiki: Arc<WikipediaClient>) -> impl palaver_server::ToolHandler {
    let descriptor = ToolDescriptor::new(
        "smart_summarize",
        "Get an AI-enhanced summary of a Wikipedia article",
    )
    .with_schema(
        ToolInputSchema::object().with_property("title", string_schema("Article title"), true),
    );
    tool_with_descriptor(descriptor, move |arguments, ctx| {
        let wiki = Arc::clone(&wiki);
        async move {
            let args: TitleArgs = parse_args(arguments)?;
            require_nonempty(&args.title, "article title")?;

            ctx.info(format!("creating enhanced summary for: {}", args.title))
                .await;
            let page = wiki.fetch_page(args.title.trim()).await
                .map_err(PalaverError::from)?;

            let prompt = format!(
                "Make this Wikipedia summary more concise and engaging while \
                 preserving key facts:\n\n{}",
                page.summary()
            );
            match ctx
                .sample(SamplingRequest::new(prompt, SMART_SUMMARY_MAX_CHARS))
                .await
            {
                Ok(enhanced) => {
                    ctx.info(format!("enhanced summary created for: {}", page.title))
                        .await;
                    Ok(ToolOutput::text(enhanced.text))
                }
                Err(err) if err.kind == ErrorKind::SamplingUnavailable => {
                    ctx.warning("client LLM unavailable, returning plain summary")
                        .await;
                    Ok(ToolOutput::text(page.summary().to_string()))
                }
                Err(err) => Err(err),
            }
        }
    })
}

/// Search with interactive disambiguation via elicitation.
pub fn interactive_search(wiki: Arc<WikipediaClient>) -> impl palaver_server::ToolHandler {
    let descriptor = ToolDescriptor::new(
        "interactive_search",
        "Search Wikipedia with interactive disambiguation",
    )
    .with_schema(
        ToolInputSchema::object().with_property("query", string_schema("Search query"), true),
    );
    tool_with_descriptor(descriptor, move |arguments, ctx| {
        let wiki = Arc::clone(&wiki);
        async move {
            let args: QueryArgs = parse_args(arguments)?;
            require_nonempty(&args.query, "query")?;

            ctx.info(format!("interactive search for: {}", args.query))
                .await;
            let query = args.query.trim();
            let results = wiki.search(query, INTERACTIVE_SEARCH_LIMIT).await
                .map_err(PalaverError::from)?;

            if results.is_empty() {
                return Ok(ToolOutput::text(format!(
                    "No Wikipedia articles found for '{query}'"
                )));
            }
            if results.len() == 1 {
                ctx.info("only one result found, retrieving summary")
                    .await;
                let summary = summary_of(&wiki, &results[0], default_sentences()).await?;
                return Ok(ToolOutput::text(summary));
            }

            let options_text = results
                .iter()
                .enumerate()
                .map(|(i, title)| format!("{}. {title}", i + 1))
                .collect::<Vec<_>>()
                .join("\n");
            let response = ctx
                .elicit(ElicitationRequest::choice(
                    format!(
                        "Found {} Wikipedia articles for '{query}':\n\n{options_text}\n\n\
                         Which article would you like?",
                        results.len()
                    ),
                    results.clone(),
                ))
                .await?;

            let Some(input) = response.text().map(str::to_string) else {
                // Declined or cancelled: a valid outcome with a defined
                // fallback, not an error.
                return Ok(ToolOutput::text(
                    "Search cancelled; no article selected.".to_string(),
                ));
            };

            let selected = match resolve_selection(&input, &results) {
                Ok(title) => title,
                // Unresolvable input gets the guidance message back as a
                // normal result so the caller can re-ask the user.
                Err(err) if err.kind == ErrorKind::AmbiguousSelection => {
                    return Ok(ToolOutput::text(err.message));
                }
                Err(err) => return Err(err),
            };
            ctx.info(format!("user selected: {selected}")).await;
            let summary = summary_of(&wiki, selected, default_sentences()).await?;
            Ok(ToolOutput::text(summary))
        }
    })
}

/// Article content retrieval with progress reporting.
pub fn get_article_with_progress(wiki: Arc<WikipediaClient>) -> impl palaver_server::ToolHandler {
    let descriptor = ToolDescriptor::new(
        "get_article_with_progress",
        "Get article content with progress reporting",
    )
    .with_schema(
        ToolInputSchema::object()
            .with_property("title", string_schema("Article title"), true)
            .with_property(
                "max_length",
                integer_schema("Max content length in characters, 100-10000 (default 2000)"),
                false,
            ),
    );
    tool_with_descriptor(descriptor, move |arguments, ctx| {
        let wiki = Arc::clone(&wiki);
        async move {
            let args: ContentArgs = parse_args(arguments)?;
            require_nonempty(&args.title, "article title")?;
            check_max_length(args.max_length)?;

            ctx.info(format!("retrieving content for: {}", args.title))
                .await;
            ctx.report_progress(0.0, 100.0).await?;

            let page = wiki.fetch_page(args.title.trim()).await
                .map_err(PalaverError::from)?;
            ctx.report_progress(25.0, 100.0).await?;

            if page.text.is_empty() {
                return Err(PalaverError::not_found(format!(
                    "no content available for article '{}'",
                    args.title
                )));
            }
            ctx.report_progress(50.0, 100.0).await?;

            let char_count = page.text.chars().count();
            let content = if char_count > args.max_length {
                ctx.info(format!(
                    "content is {char_count} chars, truncating to {}",
                    args.max_length
                ))
                .await;
                ctx.report_progress(75.0, 100.0).await?;
                truncate_at_boundary(&page.text, args.max_length)
            } else {
                page.text
            };

            ctx.report_progress(100.0, 100.0).await?;
            ctx.info(format!(
                "retrieved content for: {} ({} chars)",
                page.title,
                content.len()
            ))
            .await;
            Ok(ToolOutput::text(content))
        }
    })
}
