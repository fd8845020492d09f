//! # Palaver Server
//!
//! Server-side runtime for interactive tools: the callback channel a
//! running tool uses to reach back into its invoking client, plus the
//! registry and dispatcher that run tools in the first place.
//!
//! ## The callback pattern
//!
//! A tool executes domain logic and may, mid-execution, suspend to ask the
//! client for help:
//!
//! - [`ToolContext::sample`] - "have your LLM complete this prompt"
//! - [`ToolContext::elicit`] - "ask the user this question"
//! - [`ToolContext::info`] / [`ToolContext::report_progress`] -
//!   fire-and-forget status signals
//!
//! The tool resumes with a typed result and eventually returns its final
//! value. Declined or cancelled elicitations are valid outcomes the tool
//! must handle with a fallback, never errors.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use palaver_protocol::{CallToolRequest, ToolOutput};
//! use palaver_server::{Dispatcher, ToolRegistry, registry::tool, testing::ScriptedClient};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> palaver_protocol::PalaverResult<()> {
//! let registry = Arc::new(ToolRegistry::new());
//! registry.register(tool("shout", "Uppercases the input", |args, ctx| async move {
//!     ctx.info("shouting").await;
//!     let text = args.get("text").and_then(|v| v.as_str()).unwrap_or_default();
//!     Ok(ToolOutput::text(text.to_uppercase()))
//! }))?;
//!
//! let dispatcher = Dispatcher::new(registry, ScriptedClient::shared());
//! let output = dispatcher
//!     .dispatch(CallToolRequest::new("shout", serde_json::json!({"text": "hi"})))
//!     .await?;
//! assert_eq!(output.text, "HI");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod coordinator;
pub mod dispatch;
pub mod endpoint;
pub mod logging;
pub mod registry;
pub mod testing;

pub use config::{CallbackConfig, LoggingConfig, ServerConfig};
pub use context::ToolContext;
pub use coordinator::{CallbackCoordinator, CallbackPayload, CoordinatorEndpoint, OutgoingCallback};
pub use dispatch::Dispatcher;
pub use endpoint::ClientEndpoint;
pub use registry::{ToolHandler, ToolRegistry};

/// Default server name.
pub const SERVER_NAME: &str = "palaver-server";

/// Server version from the crate manifest.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
