//! End-to-end tests for interactive tool invocations: a dispatcher, a
//! registry of tools that use every callback capability, and a scripted
//! client standing in for the client runtime.

use std::sync::Arc;
use std::time::Duration;

use palaver_protocol::{
    CallToolRequest, ElicitationAction, ElicitationRequest, ElicitationResponse, ErrorKind,
    Notification, PalaverError, SamplingRequest, SamplingResult, ToolOutput,
};
use palaver_server::registry::tool;
use palaver_server::testing::ScriptedClient;
use palaver_server::{
    CallbackConfig, CallbackCoordinator, CoordinatorEndpoint, Dispatcher, ToolRegistry,
};

/// A tool that uses all three capability groups: logs, progress, sampling,
/// and an elicitation with an explicit decline fallback.
fn research_tool() -> impl palaver_server::ToolHandler {
    tool(
        "research",
        "Summarizes a topic with user confirmation",
        |args, ctx| async move {
            let topic = args
                .get("topic")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| PalaverError::invalid_input("missing 'topic'"))?
                .to_string();

            ctx.info(format!("researching {topic}")).await;
            ctx.report_progress(0.0, 100.0).await?;

            let confirmation = ctx
                .elicit(ElicitationRequest::confirm(format!(
                    "Spend LLM budget summarizing '{topic}'?"
                )))
                .await?;
            if !confirmation.is_accepted() {
                // Declining is a valid outcome with a documented fallback.
                return Ok(ToolOutput::text(format!("{topic}: [not summarized]")));
            }

            ctx.report_progress(50.0, 100.0).await?;

            let summary = match ctx
                .sample(SamplingRequest::new(format!("Summarize {topic}"), 800))
                .await
            {
                Ok(result) => result.text,
                Err(err) if err.kind == ErrorKind::SamplingUnavailable => {
                    format!("{topic}: [no model available]")
                }
                Err(err) => return Err(err),
            };

            ctx.report_progress(100.0, 100.0).await?;
            ctx.info("research finished").await;
            Ok(ToolOutput::text(summary))
        },
    )
}

fn research_dispatcher(client: Arc<ScriptedClient>) -> Dispatcher {
    let registry = Arc::new(ToolRegistry::new());
    registry.register(research_tool()).unwrap();
    Dispatcher::new(registry, client)
}

fn call(topic: &str) -> CallToolRequest {
    CallToolRequest::new("research", serde_json::json!({ "topic": topic }))
}

#[tokio::test]
async fn accepted_flow_runs_to_completion_in_order() {
    let client = ScriptedClient::shared();
    client.push_elicitation(ElicitationResponse::accepted(serde_json::json!(true)));
    client.push_sampling(SamplingResult::new("Rust is a systems language."));

    let dispatcher = research_dispatcher(client.clone());
    let output = dispatcher.dispatch(call("Rust")).await.unwrap();
    assert_eq!(output.text, "Rust is a systems language.");

    // The client observes events in the order the tool issued them.
    let kinds: Vec<&str> = client
        .notifications()
        .iter()
        .map(|(_, note)| match note {
            Notification::Log(_) => "log",
            Notification::Progress(_) => "progress",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["log", "progress", "progress", "progress", "log"]
    );

    // Progress is non-decreasing and bounded by total.
    let progress = client.progress_values();
    assert_eq!(progress, vec![0.0, 50.0, 100.0]);
    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn declined_elicitation_falls_back_without_error() {
    let client = ScriptedClient::shared();
    client.push_elicitation(ElicitationResponse::declined());

    let dispatcher = research_dispatcher(client.clone());
    let output = dispatcher.dispatch(call("Ada")).await.unwrap();
    assert_eq!(output.text, "Ada: [not summarized]");

    // The sampling capability was never touched.
    assert!(client.sampling_requests().is_empty());
}

#[tokio::test]
async fn sampling_unavailable_degrades_instead_of_failing() {
    let client = ScriptedClient::shared();
    client.push_elicitation(ElicitationResponse::accepted(serde_json::json!(true)));
    // No sampling reply scripted: the client has no LLM.

    let dispatcher = research_dispatcher(client.clone());
    let output = dispatcher.dispatch(call("Lisp")).await.unwrap();
    assert_eq!(output.text, "Lisp: [no model available]");
}

#[tokio::test]
async fn sampling_output_respects_requested_bound() {
    let client = ScriptedClient::shared();
    client.push_elicitation(ElicitationResponse::accepted(serde_json::json!(true)));
    client.push_sampling(SamplingResult::new("long ".repeat(1000)));

    let dispatcher = research_dispatcher(client.clone());
    let output = dispatcher.dispatch(call("History")).await.unwrap();
    assert!(output.text.chars().count() <= 800);

    let (_, request) = &client.sampling_requests()[0];
    assert_eq!(request.max_output_chars, 800);
}

#[tokio::test]
async fn invocations_are_independent() {
    let client = ScriptedClient::shared();
    client.push_elicitation(ElicitationResponse::declined());
    client.push_elicitation(ElicitationResponse::declined());

    let dispatcher = research_dispatcher(client.clone());
    dispatcher.dispatch(call("One")).await.unwrap();
    dispatcher.dispatch(call("Two")).await.unwrap();

    let requests = client.elicitation_requests();
    assert_eq!(requests.len(), 2);
    assert_ne!(requests[0].0, requests[1].0, "distinct invocation ids");
}

#[tokio::test]
async fn cancellation_interrupts_a_suspended_tool() {
    // A coordinator endpoint with nobody answering: the tool parks inside
    // elicit until the invocation is cancelled.
    let config = CallbackConfig {
        elicit_timeout: Duration::from_secs(300),
        ..CallbackConfig::default()
    };
    let (coordinator, mut outgoing) = CallbackCoordinator::new(config);
    let (endpoint, _notifications) = CoordinatorEndpoint::new(coordinator);

    let registry = Arc::new(ToolRegistry::new());
    registry.register(research_tool()).unwrap();
    let dispatcher = Arc::new(Dispatcher::new(registry, Arc::new(endpoint)));

    let runner = Arc::clone(&dispatcher);
    let handle = tokio::spawn(async move { runner.dispatch(call("Doomed")).await });

    // Wait until the elicitation is actually in flight.
    let request = outgoing.recv().await.expect("tool suspended on elicit");
    assert!(matches!(
        request.payload,
        palaver_server::CallbackPayload::Elicit(_)
    ));

    let in_flight = dispatcher.in_flight();
    assert_eq!(in_flight.len(), 1);
    assert!(dispatcher.cancel(in_flight[0]));

    let err = handle.await.unwrap().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Cancelled);
    assert!(dispatcher.in_flight().is_empty());
}

#[tokio::test]
async fn coordinator_timeout_reaches_the_tool_as_cancelled_outcome() {
    let config = CallbackConfig {
        elicit_timeout: Duration::from_millis(50),
        ..CallbackConfig::default()
    };
    let (coordinator, _outgoing) = CallbackCoordinator::new(config);
    let (endpoint, _notifications) = CoordinatorEndpoint::new(coordinator);

    let registry = Arc::new(ToolRegistry::new());
    registry
        .register(tool("ask", "Asks and reports the outcome", |_args, ctx| {
            async move {
                let response = ctx.elicit(ElicitationRequest::text("anyone there?")).await?;
                Ok(ToolOutput::text(match response.action {
                    ElicitationAction::Accepted => "answered",
                    ElicitationAction::Declined => "declined",
                    ElicitationAction::Cancelled => "nobody home",
                }))
            }
        }))
        .unwrap();

    let dispatcher = Dispatcher::new(registry, Arc::new(endpoint));
    let output = dispatcher
        .dispatch(CallToolRequest::new("ask", serde_json::Value::Null))
        .await
        .unwrap();
    assert_eq!(output.text, "nobody home");
}
