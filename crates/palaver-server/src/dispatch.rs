//! Invocation dispatch.
//!
//! The dispatcher owns the registry and the client endpoint, assigns each
//! call its invocation id and cancellation token, and tracks in-flight
//! invocations so the client can cancel them at any suspension point.

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use palaver_protocol::{
    CallToolRequest, InvocationId, PalaverError, PalaverResult, ToolOutput,
};

use crate::context::ToolContext;
use crate::endpoint::ClientEndpoint;
use crate::registry::ToolRegistry;

/// Routes tool calls to registered handlers.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    client: Arc<dyn ClientEndpoint>,
    in_flight: DashMap<InvocationId, CancellationToken>,
}

impl Dispatcher {
    /// Create a dispatcher over a registry and a client endpoint.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, client: Arc<dyn ClientEndpoint>) -> Self {
        Self {
            registry,
            client,
            in_flight: DashMap::new(),
        }
    }

    /// The registry behind this dispatcher.
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Invoke a tool and wait for its final value.
    ///
    /// Invocations are independent; callers may dispatch concurrently
    /// without cross-invocation serialization.
    ///
    /// # Errors
    ///
    /// `ToolNotFound` for unknown names, `InvalidInput` when validation
    /// rejects the arguments, otherwise whatever the tool propagates.
    pub async fn dispatch(&self, request: CallToolRequest) -> PalaverResult<ToolOutput> {
        let handler = self
            .registry
            .get(&request.name)
            .ok_or_else(|| PalaverError::tool_not_found(&request.name))?;
        handler.validate_input(&request.arguments)?;

        let invocation_id = InvocationId::generate();
        let cancel = CancellationToken::new();
        self.in_flight.insert(invocation_id, cancel.clone());
        // Removes the entry on every exit path, including a panicking
        // handler or this future being dropped mid-await.
        let _guard = InFlightGuard {
            table: &self.in_flight,
            invocation_id,
        };

        tracing::debug!(tool = %request.name, invocation = %invocation_id, "invoking tool");

        let ctx = ToolContext::new(
            invocation_id,
            request.name.clone(),
            Arc::clone(&self.client),
            cancel,
        );
        let result = handler.handle(request.arguments, ctx).await;

        match result {
            Ok(output) => {
                tracing::debug!(tool = %request.name, invocation = %invocation_id, "tool completed");
                Ok(output)
            }
            Err(err) => {
                tracing::warn!(
                    tool = %request.name,
                    invocation = %invocation_id,
                    error = %err,
                    "tool failed"
                );
                if err.operation.is_some() {
                    Err(err)
                } else {
                    Err(err.with_operation(request.name))
                }
            }
        }
    }

    /// Cancel an in-flight invocation.
    ///
    /// Returns `false` when the invocation is unknown or already finished.
    /// The tool observes cancellation at its next suspension point and emits
    /// no further events.
    pub fn cancel(&self, invocation_id: InvocationId) -> bool {
        match self.in_flight.get(&invocation_id) {
            Some(entry) => {
                entry.value().cancel();
                true
            }
            None => false,
        }
    }

    /// Ids of invocations currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> Vec<InvocationId> {
        self.in_flight.iter().map(|entry| *entry.key()).collect()
    }
}

struct InFlightGuard<'a> {
    table: &'a DashMap<InvocationId, CancellationToken>,
    invocation_id: InvocationId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.table.remove(&self.invocation_id);
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("tools", &self.registry.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tool;
    use crate::testing::ScriptedClient;
    use palaver_protocol::ErrorKind;

    fn dispatcher_with(client: Arc<ScriptedClient>) -> Dispatcher {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .register(tool("greet", "Greets by name", |args, _ctx| async move {
                let name = args
                    .get("name")
                    .and_then(serde_json::Value::as_str)
                    .ok_or_else(|| PalaverError::invalid_input("missing 'name'"))?;
                Ok(ToolOutput::text(format!("hello {name}")))
            }))
            .unwrap();
        Dispatcher::new(registry, client)
    }

    #[tokio::test]
    async fn dispatches_to_registered_tool() {
        let dispatcher = dispatcher_with(Arc::new(ScriptedClient::new()));
        let output = dispatcher
            .dispatch(CallToolRequest::new(
                "greet",
                serde_json::json!({"name": "ada"}),
            ))
            .await
            .unwrap();
        assert_eq!(output.text, "hello ada");
        assert!(dispatcher.in_flight().is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_is_a_typed_failure() {
        let dispatcher = dispatcher_with(Arc::new(ScriptedClient::new()));
        let err = dispatcher
            .dispatch(CallToolRequest::new("ghost", serde_json::Value::Null))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ToolNotFound);
    }

    #[tokio::test]
    async fn tool_error_carries_the_tool_name() {
        let dispatcher = dispatcher_with(Arc::new(ScriptedClient::new()));
        let err = dispatcher
            .dispatch(CallToolRequest::new("greet", serde_json::json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert_eq!(err.operation.as_deref(), Some("greet"));
    }

    #[tokio::test]
    async fn panicking_tool_does_not_leak_in_flight_state() {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .register(tool("boom", "Always panics", |_args, _ctx| async move {
                panic!("kaboom")
            }))
            .unwrap();
        let dispatcher = Arc::new(Dispatcher::new(
            registry,
            Arc::new(ScriptedClient::new()),
        ));

        let runner = Arc::clone(&dispatcher);
        let joined = tokio::spawn(async move {
            runner
                .dispatch(CallToolRequest::new("boom", serde_json::Value::Null))
                .await
        })
        .await;
        assert!(joined.is_err(), "panic surfaces as a join error");
        assert!(dispatcher.in_flight().is_empty());
    }

    #[tokio::test]
    async fn cancel_unknown_invocation_is_false() {
        let dispatcher = dispatcher_with(Arc::new(ScriptedClient::new()));
        assert!(!dispatcher.cancel(InvocationId::generate()));
    }
}
