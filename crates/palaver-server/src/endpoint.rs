//! The client runtime seam.
//!
//! Tools never talk to an LLM backend or a user interface directly; they go
//! through [`ToolContext`](crate::ToolContext), which forwards to whatever
//! [`ClientEndpoint`] the dispatcher was built with. The endpoint is the only
//! thing a transport, a test harness, or an in-process client has to
//! implement.

use async_trait::async_trait;

use palaver_protocol::{
    ElicitationRequest, ElicitationResponse, InvocationId, Notification, PalaverResult,
    SamplingRequest, SamplingResult,
};

/// Client-side capabilities as seen from a running tool.
///
/// Implementations answer sampling and elicitation requests and sink
/// fire-and-forget notifications. All calls carry the id of the invocation
/// that issued them so the client can correlate and scope them; a request
/// must never outlive its invocation.
#[async_trait]
pub trait ClientEndpoint: Send + Sync {
    /// Produce an LLM completion for a running tool.
    ///
    /// # Errors
    ///
    /// Returns `SamplingUnavailable` when the client declines or its model
    /// call fails.
    async fn create_message(
        &self,
        invocation: InvocationId,
        request: SamplingRequest,
    ) -> PalaverResult<SamplingResult>;

    /// Ask the user for structured input.
    ///
    /// Declining and cancelling are *outcomes*, not errors: implementations
    /// should answer with [`ElicitationResponse::declined`] or
    /// [`ElicitationResponse::cancelled`] rather than failing.
    ///
    /// # Errors
    ///
    /// Returns an error only when the channel to the client itself broke.
    async fn elicit(
        &self,
        invocation: InvocationId,
        request: ElicitationRequest,
    ) -> PalaverResult<ElicitationResponse>;

    /// Deliver a log or progress notification. Best effort; callers ignore
    /// failures.
    ///
    /// # Errors
    ///
    /// Returns an error when delivery failed; the caller treats this as
    /// non-fatal.
    async fn notify(
        &self,
        invocation: InvocationId,
        notification: Notification,
    ) -> PalaverResult<()>;
}
