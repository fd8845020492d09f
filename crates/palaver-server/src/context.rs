//! The callback channel handed to every running tool.
//!
//! A [`ToolContext`] gives a tool a way to call back into its invoking
//! client without knowing transport details:
//!
//! - [`sample`](ToolContext::sample) - suspend until the client's LLM
//!   produces a completion
//! - [`elicit`](ToolContext::elicit) - suspend until the user answers (or
//!   declines, or the client times the request out)
//! - [`info`](ToolContext::info) and friends, and
//!   [`report_progress`](ToolContext::report_progress) - fire-and-forget
//!   signals whose delivery failure never aborts the invocation
//!
//! Each invocation gets its own context; contexts are independent, so
//! concurrent invocations never serialize against each other. Within one
//! invocation the tool awaits each call in turn, which gives the client the
//! per-invocation ordering guarantee for free.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use palaver_protocol::{
    ElicitationRequest, ElicitationResponse, ErrorKind, InvocationId, LogLevel, LogNotification,
    Notification, PalaverError, PalaverResult, ProgressNotification, SamplingRequest,
    SamplingResult,
};

use crate::endpoint::ClientEndpoint;

/// Per-invocation callback channel. Cheap to clone.
#[derive(Clone)]
pub struct ToolContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    invocation_id: InvocationId,
    tool_name: String,
    client: Arc<dyn ClientEndpoint>,
    cancel: CancellationToken,
    /// Last progress value emitted; progress must be non-decreasing.
    last_progress: parking_lot::Mutex<Option<f64>>,
}

impl ToolContext {
    /// Create a context for one invocation.
    #[must_use]
    pub fn new(
        invocation_id: InvocationId,
        tool_name: impl Into<String>,
        client: Arc<dyn ClientEndpoint>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                invocation_id,
                tool_name: tool_name.into(),
                client,
                cancel,
                last_progress: parking_lot::Mutex::new(None),
            }),
        }
    }

    /// Id of the invocation this context belongs to.
    #[must_use]
    pub fn invocation_id(&self) -> InvocationId {
        self.inner.invocation_id
    }

    /// Name of the tool being invoked.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        &self.inner.tool_name
    }

    /// Whether the client has cancelled this invocation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Token that fires when the invocation is cancelled, for tools that
    /// want to react between suspension points.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Request an LLM completion from the client, suspending until it
    /// arrives.
    ///
    /// # Errors
    ///
    /// - `SamplingUnavailable` when the client declines or its model call
    ///   fails; the tool decides whether to propagate or fall back to
    ///   unenhanced behavior
    /// - `Cancelled` when the invocation was cancelled at this suspension
    ///   point
    pub async fn sample(&self, request: SamplingRequest) -> PalaverResult<SamplingResult> {
        if self.is_cancelled() {
            return Err(self.cancelled_error("sample"));
        }

        let fut = self
            .inner
            .client
            .create_message(self.inner.invocation_id, request);
        tokio::select! {
            () = self.inner.cancel.cancelled() => Err(self.cancelled_error("sample")),
            result = fut => result.map_err(|err| match err.kind {
                ErrorKind::SamplingUnavailable | ErrorKind::Cancelled => err,
                _ => PalaverError::sampling_unavailable(err.message).with_operation("sample"),
            }),
        }
    }

    /// Request structured user input, suspending until the user responds or
    /// the client cancels/times out the request.
    ///
    /// A declined or cancelled elicitation is a valid outcome carried in the
    /// returned [`ElicitationResponse`]; tools must branch on it rather than
    /// treat it as a failure. A client-side timeout surfaces as the
    /// `Cancelled` outcome.
    ///
    /// # Errors
    ///
    /// - `Cancelled` when the *invocation itself* was cancelled at this
    ///   suspension point
    /// - transport-level failures from the endpoint
    pub async fn elicit(
        &self,
        request: ElicitationRequest,
    ) -> PalaverResult<ElicitationResponse> {
        if self.is_cancelled() {
            return Err(self.cancelled_error("elicit"));
        }

        let fut = self.inner.client.elicit(self.inner.invocation_id, request);
        tokio::select! {
            () = self.inner.cancel.cancelled() => Err(self.cancelled_error("elicit")),
            result = fut => match result {
                // Timeout is client policy, not a hard termination: the tool
                // gets a Cancelled outcome and a chance to react.
                Err(err) if err.kind == ErrorKind::Timeout => {
                    Ok(ElicitationResponse::cancelled())
                }
                other => other,
            },
        }
    }

    /// Send a debug-level log message to the client. Best effort.
    pub async fn debug(&self, message: impl Into<String> + Send) {
        self.log(LogLevel::Debug, message.into()).await;
    }

    /// Send an info-level log message to the client. Best effort.
    pub async fn info(&self, message: impl Into<String> + Send) {
        self.log(LogLevel::Info, message.into()).await;
    }

    /// Send a warning-level log message to the client. Best effort.
    pub async fn warning(&self, message: impl Into<String> + Send) {
        self.log(LogLevel::Warning, message.into()).await;
    }

    /// Send an error-level log message to the client. Best effort.
    pub async fn error(&self, message: impl Into<String> + Send) {
        self.log(LogLevel::Error, message.into()).await;
    }

    /// Report progress for this invocation.
    ///
    /// Values are validated locally: `0 <= current <= total`, finite, and
    /// non-decreasing across the invocation. Delivery itself is best effort.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the values are out of range or would move
    /// progress backwards.
    pub async fn report_progress(&self, current: f64, total: f64) -> PalaverResult<()> {
        let notification = ProgressNotification::new(current, total)?;

        {
            let mut last = self.inner.last_progress.lock();
            if let Some(prev) = *last {
                if current < prev {
                    return Err(PalaverError::invalid_input(format!(
                        "progress must be non-decreasing, got {current} after {prev}"
                    )));
                }
            }
            *last = Some(current);
        }

        self.send_notification(Notification::Progress(notification))
            .await;
        Ok(())
    }

    async fn log(&self, level: LogLevel, message: String) {
        self.send_notification(Notification::Log(LogNotification::new(level, message)))
            .await;
    }

    async fn send_notification(&self, notification: Notification) {
        // A cancelled invocation must not emit further events.
        if self.is_cancelled() {
            return;
        }
        if let Err(err) = self
            .inner
            .client
            .notify(self.inner.invocation_id, notification)
            .await
        {
            tracing::debug!(
                tool = %self.inner.tool_name,
                invocation = %self.inner.invocation_id,
                error = %err,
                "notification delivery failed"
            );
        }
    }

    fn cancelled_error(&self, operation: &str) -> PalaverError {
        PalaverError::cancelled(format!(
            "invocation {} cancelled",
            self.inner.invocation_id
        ))
        .with_operation(operation)
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("invocation_id", &self.inner.invocation_id)
            .field("tool_name", &self.inner.tool_name)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
