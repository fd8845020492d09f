//! Tool handlers and the name-keyed registry.
//!
//! A tool is a plain async function over whatever capability subset of the
//! [`ToolContext`](crate::ToolContext) it needs; there is no inheritance
//! hierarchy. The registry selects handlers by name and exposes their
//! descriptors for listing.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use palaver_protocol::{PalaverError, PalaverResult, ToolDescriptor, ToolOutput};

use crate::context::ToolContext;

/// Handler for one named tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with parsed arguments and its callback channel.
    async fn handle(
        &self,
        arguments: serde_json::Value,
        ctx: ToolContext,
    ) -> PalaverResult<ToolOutput>;

    /// The tool's descriptor (name, description, input schema).
    fn descriptor(&self) -> ToolDescriptor;

    /// Validate input before invocation (default: allow all).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the arguments are malformed.
    fn validate_input(&self, _arguments: &serde_json::Value) -> PalaverResult<()> {
        Ok(())
    }
}

/// Tool handler built from a closure.
struct FnToolHandler<F> {
    descriptor: ToolDescriptor,
    handler: F,
}

#[async_trait]
impl<F, Fut> ToolHandler for FnToolHandler<F>
where
    F: Fn(serde_json::Value, ToolContext) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = PalaverResult<ToolOutput>> + Send,
{
    async fn handle(
        &self,
        arguments: serde_json::Value,
        ctx: ToolContext,
    ) -> PalaverResult<ToolOutput> {
        (self.handler)(arguments, ctx).await
    }

    fn descriptor(&self) -> ToolDescriptor {
        self.descriptor.clone()
    }
}

/// Create a tool handler from a closure.
///
/// # Examples
///
/// ```rust
/// use palaver_server::registry::tool;
/// use palaver_protocol::ToolOutput;
///
/// let echo = tool("echo", "Echoes back the input", |args, _ctx| async move {
///     Ok(ToolOutput::text(args.to_string()))
/// });
/// ```
pub fn tool<F, Fut>(
    name: impl Into<String>,
    description: impl Into<String>,
    handler: F,
) -> impl ToolHandler
where
    F: Fn(serde_json::Value, ToolContext) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = PalaverResult<ToolOutput>> + Send,
{
    FnToolHandler {
        descriptor: ToolDescriptor::new(name, description),
        handler,
    }
}

/// Create a tool handler from a closure and a full descriptor, for tools
/// that declare an input schema.
pub fn tool_with_descriptor<F, Fut>(descriptor: ToolDescriptor, handler: F) -> impl ToolHandler
where
    F: Fn(serde_json::Value, ToolContext) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = PalaverResult<ToolOutput>> + Send,
{
    FnToolHandler {
        descriptor,
        handler,
    }
}

/// Name-keyed tool registry.
#[derive(Default)]
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its descriptor name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when a tool with the same name is already
    /// registered.
    pub fn register(&self, handler: impl ToolHandler + 'static) -> PalaverResult<()> {
        self.register_arc(Arc::new(handler))
    }

    /// Register an already-shared handler.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` on a duplicate name.
    pub fn register_arc(&self, handler: Arc<dyn ToolHandler>) -> PalaverResult<()> {
        let name = handler.descriptor().name;
        match self.tools.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(PalaverError::invalid_input(
                format!("tool '{name}' is already registered"),
            )),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(handler);
                tracing::debug!(tool = %name, "tool registered");
                Ok(())
            }
        }
    }

    /// Look up a handler by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Descriptors of all registered tools, sorted by name.
    #[must_use]
    pub fn list(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<_> = self
            .tools
            .iter()
            .map(|entry| entry.value().descriptor())
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_protocol::ErrorKind;

    fn noop_tool(name: &str) -> impl ToolHandler + use<'_> {
        tool(name, "does nothing", |_args, _ctx| async move {
            Ok(ToolOutput::text("ok"))
        })
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = ToolRegistry::new();
        registry.register(noop_tool("echo")).unwrap();
        let err = registry.register(noop_tool("echo")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn list_is_sorted_by_name() {
        let registry = ToolRegistry::new();
        registry.register(noop_tool("zeta")).unwrap();
        registry.register(noop_tool("alpha")).unwrap();
        registry.register(noop_tool("mid")).unwrap();

        let names: Vec<_> = registry.list().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn lookup_misses_return_none() {
        let registry = ToolRegistry::new();
        assert!(registry.get("ghost").is_none());
        assert!(registry.is_empty());
    }
}
