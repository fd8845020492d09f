//! Console entry point for the Wikipedia reference server.
//!
//! Tools run against a console-backed [`ClientEndpoint`]: elicitations read
//! a line from stdin, notifications print to stderr, and sampling reports
//! the LLM as unavailable (there is no model attached to a terminal), which
//! exercises every tool's degraded path.

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use palaver_protocol::{
    ElicitationRequest, ElicitationResponse, InvocationId, Notification, PalaverError,
    PalaverResult, SamplingRequest, SamplingResult,
};
use palaver_server::{logging, ClientEndpoint, Dispatcher, LoggingConfig, ToolRegistry};
use palaver_wiki::{register_tools, WikipediaClient};

#[derive(Debug, Parser)]
#[command(name = "palaver-wiki", version, about = "Wikipedia tools with interactive callbacks")]
struct Cli {
    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Seconds to wait for an elicitation answer before treating it as
    /// cancelled.
    #[arg(long, default_value_t = 60)]
    elicit_timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the registered tools.
    List,
    /// Invoke one tool by name.
    Call {
        /// Tool name, e.g. `search_wikipedia`.
        name: String,
        /// Tool arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Run an interactive search end to end.
    Demo {
        /// Search query.
        query: String,
    },
}

/// Client endpoint backed by the terminal.
struct ConsoleClient {
    elicit_timeout: Duration,
}

#[async_trait]
impl ClientEndpoint for ConsoleClient {
    async fn create_message(
        &self,
        _invocation: InvocationId,
        _request: SamplingRequest,
    ) -> PalaverResult<SamplingResult> {
        Err(PalaverError::sampling_unavailable(
            "console client has no LLM attached",
        ))
    }

    async fn elicit(
        &self,
        _invocation: InvocationId,
        request: ElicitationRequest,
    ) -> PalaverResult<ElicitationResponse> {
        eprintln!("\n{}", request.message);
        eprint!("> (empty line declines, waits {}s) ", self.elicit_timeout.as_secs());
        let _ = std::io::stderr().flush();

        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        let read = tokio::time::timeout(self.elicit_timeout, reader.read_line(&mut line)).await;
        match read {
            Err(_) => {
                eprintln!("(timed out)");
                Ok(ElicitationResponse::cancelled())
            }
            // EOF: the user went away.
            Ok(Ok(0)) => Ok(ElicitationResponse::cancelled()),
            Ok(Ok(_)) => {
                let answer = line.trim();
                if answer.is_empty() {
                    Ok(ElicitationResponse::declined())
                } else {
                    Ok(ElicitationResponse::accepted(serde_json::Value::String(
                        answer.to_string(),
                    )))
                }
            }
            Ok(Err(err)) => Err(PalaverError::internal(format!("stdin read failed: {err}"))),
        }
    }

    async fn notify(
        &self,
        _invocation: InvocationId,
        notification: Notification,
    ) -> PalaverResult<()> {
        match notification {
            Notification::Log(log) => eprintln!("[{:?}] {}", log.level, log.message),
            Notification::Progress(progress) => eprintln!(
                "[progress] {:.0}/{:.0} ({:.0}%)",
                progress.current,
                progress.total,
                progress.ratio() * 100.0
            ),
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> PalaverResult<()> {
    let cli = Cli::parse();
    logging::init(&LoggingConfig {
        level: cli.log_level.clone(),
        with_targets: false,
    });
    let registry = Arc::new(ToolRegistry::new());
    register_tools(&registry, Arc::new(WikipediaClient::new()?))?;
    let client = Arc::new(ConsoleClient {
        elicit_timeout: Duration::from_secs(cli.elicit_timeout_secs),
    });
    let dispatcher = Dispatcher::new(registry, client);

    match cli.command {
        Command::List => {
            for descriptor in dispatcher.registry().list() {
                println!(
                    "{:<28} {}",
                    descriptor.name,
                    descriptor.description.unwrap_or_default()
                );
            }
        }
        Command::Call { name, args } => {
            let arguments: serde_json::Value = serde_json::from_str(&args)
                .map_err(|err| PalaverError::invalid_input(format!("--args is not valid JSON: {err}")))?;
            let output = dispatcher
                .dispatch(palaver_protocol::CallToolRequest::new(name, arguments))
                .await?;
            println!("{}", output.text);
            if let Some(structured) = output.structured {
                println!("{}", serde_json::to_string_pretty(&structured)?);
            }
        }
        Command::Demo { query } => {
            let output = dispatcher
                .dispatch(palaver_protocol::CallToolRequest::new(
                    "interactive_search",
                    serde_json::json!({ "query": query }),
                ))
                .await?;
            println!("\n{}", output.text);
        }
    }
    Ok(())
}
