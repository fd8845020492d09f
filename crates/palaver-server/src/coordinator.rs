//! Correlation of callback requests with client replies.
//!
//! When the client sits on the far side of a real transport, a tool's
//! `sample`/`elicit` call has to be matched up with the reply that
//! eventually comes back. The [`CallbackCoordinator`] owns that bookkeeping:
//! outbound requests go to the transport through an mpsc channel, pending
//! requests wait on oneshot reply slots keyed by request id, and the
//! transport feeds replies back through [`submit_sampling_reply`] /
//! [`submit_elicitation_reply`].
//!
//! Timeout policy follows the protocol contract: an expired sampling request
//! fails with `SamplingUnavailable`, an expired elicitation resolves to the
//! `Cancelled` *outcome* (after the configured retries, if any).
//!
//! [`submit_sampling_reply`]: CallbackCoordinator::submit_sampling_reply
//! [`submit_elicitation_reply`]: CallbackCoordinator::submit_elicitation_reply

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc, oneshot};
use uuid::Uuid;

use palaver_protocol::{
    ElicitationRequest, ElicitationResponse, InvocationId, Notification, PalaverError,
    PalaverResult, SamplingRequest, SamplingResult,
};

use crate::config::CallbackConfig;
use crate::endpoint::ClientEndpoint;

/// A callback request on its way out to the transport.
#[derive(Debug, Clone)]
pub struct OutgoingCallback {
    /// Unique request id for reply correlation.
    pub request_id: String,
    /// Invocation that issued the request.
    pub invocation_id: InvocationId,
    /// The request itself.
    pub payload: CallbackPayload,
}

/// The two suspending callback kinds.
#[derive(Debug, Clone)]
pub enum CallbackPayload {
    /// LLM completion request.
    Sample(SamplingRequest),
    /// Structured user input request.
    Elicit(ElicitationRequest),
}

/// Reply delivered by the transport for a pending callback.
#[derive(Debug, Clone)]
enum CallbackReply {
    Sample(PalaverResult<SamplingResult>),
    Elicit(ElicitationResponse),
}

struct PendingCallback {
    reply: oneshot::Sender<CallbackReply>,
    created_at: Instant,
    timeout: Duration,
}

/// Tracks pending callback requests for one server instance.
///
/// Clone-cheap; all clones share the same pending table.
#[derive(Clone)]
pub struct CallbackCoordinator {
    pending: Arc<RwLock<HashMap<String, PendingCallback>>>,
    outgoing: mpsc::UnboundedSender<OutgoingCallback>,
    config: CallbackConfig,
}

impl CallbackCoordinator {
    /// Create a coordinator and the receiver the transport drains.
    #[must_use]
    pub fn new(config: CallbackConfig) -> (Self, mpsc::UnboundedReceiver<OutgoingCallback>) {
        let (outgoing, rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            pending: Arc::new(RwLock::new(HashMap::new())),
            outgoing,
            config,
        };
        coordinator.spawn_sweeper();
        (coordinator, rx)
    }

    /// Send a sampling request and wait for the client's completion.
    ///
    /// # Errors
    ///
    /// `SamplingUnavailable` when the client replies with a failure or the
    /// request expires; `Internal` when the transport side is gone.
    pub async fn sample(
        &self,
        invocation_id: InvocationId,
        request: SamplingRequest,
    ) -> PalaverResult<SamplingResult> {
        let timeout = self.config.sample_timeout;
        let reply = self
            .send_and_wait(invocation_id, CallbackPayload::Sample(request), timeout)
            .await;
        match reply {
            Ok(CallbackReply::Sample(result)) => result,
            Ok(CallbackReply::Elicit(_)) => Err(PalaverError::internal(
                "elicitation reply delivered to a sampling request",
            )),
            Err(WaitError::Expired) => Err(PalaverError::sampling_unavailable(format!(
                "no completion within {}ms",
                timeout.as_millis()
            ))
            .with_operation("sample")),
            Err(WaitError::ChannelClosed) => Err(PalaverError::internal(
                "callback channel closed before a sampling reply arrived",
            )),
        }
    }

    /// Send an elicitation request and wait for the user's answer.
    ///
    /// Expiry resolves to the `Cancelled` outcome once the configured
    /// retries are exhausted.
    ///
    /// # Errors
    ///
    /// `Internal` when the transport side is gone.
    pub async fn elicit(
        &self,
        invocation_id: InvocationId,
        request: ElicitationRequest,
    ) -> PalaverResult<ElicitationResponse> {
        let timeout = self.config.elicit_timeout;
        let mut attempts_left = self.config.max_elicit_retries;

        loop {
            let reply = self
                .send_and_wait(
                    invocation_id,
                    CallbackPayload::Elicit(request.clone()),
                    timeout,
                )
                .await;
            match reply {
                Ok(CallbackReply::Elicit(response)) => return Ok(response),
                Ok(CallbackReply::Sample(_)) => {
                    return Err(PalaverError::internal(
                        "sampling reply delivered to an elicitation request",
                    ));
                }
                Err(WaitError::Expired) => {
                    if attempts_left == 0 {
                        tracing::debug!(
                            invocation = %invocation_id,
                            timeout_ms = timeout.as_millis() as u64,
                            "elicitation expired, resolving as cancelled"
                        );
                        return Ok(ElicitationResponse::cancelled());
                    }
                    attempts_left -= 1;
                }
                Err(WaitError::ChannelClosed) => {
                    return Err(PalaverError::internal(
                        "callback channel closed before an elicitation reply arrived",
                    ));
                }
            }
        }
    }

    /// Deliver the client's reply to a pending sampling request.
    ///
    /// Unknown ids are ignored (the request may have expired already).
    pub async fn submit_sampling_reply(
        &self,
        request_id: &str,
        result: PalaverResult<SamplingResult>,
    ) {
        self.complete(request_id, CallbackReply::Sample(result)).await;
    }

    /// Deliver the user's response to a pending elicitation request.
    ///
    /// Unknown ids are ignored (the request may have expired already).
    pub async fn submit_elicitation_reply(
        &self,
        request_id: &str,
        response: ElicitationResponse,
    ) {
        self.complete(request_id, CallbackReply::Elicit(response))
            .await;
    }

    /// Number of requests currently awaiting a reply.
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }

    async fn send_and_wait(
        &self,
        invocation_id: InvocationId,
        payload: CallbackPayload,
        timeout: Duration,
    ) -> Result<CallbackReply, WaitError> {
        let request_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();

        self.pending.write().await.insert(
            request_id.clone(),
            PendingCallback {
                reply: tx,
                created_at: Instant::now(),
                timeout,
            },
        );

        let outgoing = OutgoingCallback {
            request_id: request_id.clone(),
            invocation_id,
            payload,
        };
        if self.outgoing.send(outgoing).is_err() {
            self.pending.write().await.remove(&request_id);
            return Err(WaitError::ChannelClosed);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => {
                // Sender dropped without replying (sweeper or shutdown).
                self.pending.write().await.remove(&request_id);
                Err(WaitError::Expired)
            }
            Err(_) => {
                self.pending.write().await.remove(&request_id);
                Err(WaitError::Expired)
            }
        }
    }

    async fn complete(&self, request_id: &str, reply: CallbackReply) {
        if let Some(pending) = self.pending.write().await.remove(request_id) {
            let _ = pending.reply.send(reply);
        } else {
            tracing::debug!(request_id, "reply for unknown or expired callback");
        }
    }

    /// Periodically drop pending entries whose waiters are gone, so the
    /// table cannot grow without bound when caller futures are dropped
    /// mid-wait.
    ///
    /// The task holds only a weak reference to the table and exits once the
    /// last coordinator handle is dropped.
    fn spawn_sweeper(&self) {
        let pending = Arc::downgrade(&self.pending);
        let interval = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(pending) = pending.upgrade() else {
                    break;
                };
                let now = Instant::now();
                pending
                    .write()
                    .await
                    .retain(|_, entry| now.duration_since(entry.created_at) <= entry.timeout);
            }
        });
    }
}

impl std::fmt::Debug for CallbackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackCoordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

enum WaitError {
    Expired,
    ChannelClosed,
}

/// [`ClientEndpoint`] backed by a coordinator plus a notification channel.
///
/// This is the bridging endpoint a transport integration uses: suspending
/// calls go through the coordinator, notifications through their own
/// ordered channel.
#[derive(Debug, Clone)]
pub struct CoordinatorEndpoint {
    coordinator: CallbackCoordinator,
    notifications: mpsc::UnboundedSender<(InvocationId, Notification)>,
}

impl CoordinatorEndpoint {
    /// Build an endpoint and the notification receiver the transport drains.
    #[must_use]
    pub fn new(
        coordinator: CallbackCoordinator,
    ) -> (
        Self,
        mpsc::UnboundedReceiver<(InvocationId, Notification)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                coordinator,
                notifications: tx,
            },
            rx,
        )
    }

    /// The coordinator behind this endpoint.
    #[must_use]
    pub fn coordinator(&self) -> &CallbackCoordinator {
        &self.coordinator
    }
}

#[async_trait]
impl ClientEndpoint for CoordinatorEndpoint {
    async fn create_message(
        &self,
        invocation: InvocationId,
        request: SamplingRequest,
    ) -> PalaverResult<SamplingResult> {
        self.coordinator.sample(invocation, request).await
    }

    async fn elicit(
        &self,
        invocation: InvocationId,
        request: ElicitationRequest,
    ) -> PalaverResult<ElicitationResponse> {
        self.coordinator.elicit(invocation, request).await
    }

    async fn notify(
        &self,
        invocation: InvocationId,
        notification: Notification,
    ) -> PalaverResult<()> {
        self.notifications
            .send((invocation, notification))
            .map_err(|_| PalaverError::internal("notification channel closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_protocol::ElicitationAction;

    fn fast_config() -> CallbackConfig {
        CallbackConfig {
            sample_timeout: Duration::from_millis(100),
            elicit_timeout: Duration::from_millis(100),
            max_elicit_retries: 0,
            sweep_interval: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn sampling_reply_round_trip() {
        let (coordinator, mut outgoing) = CallbackCoordinator::new(fast_config());
        let invocation = InvocationId::generate();

        let worker = coordinator.clone();
        let handle = tokio::spawn(async move {
            worker
                .sample(invocation, SamplingRequest::new("summarize", 200))
                .await
        });

        let request = outgoing.recv().await.expect("request reaches transport");
        assert!(matches!(request.payload, CallbackPayload::Sample(_)));
        assert_eq!(request.invocation_id, invocation);

        coordinator
            .submit_sampling_reply(&request.request_id, Ok(SamplingResult::new("short form")))
            .await;

        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.text, "short form");
        assert_eq!(coordinator.pending_count().await, 0);
    }

    #[tokio::test]
    async fn sampling_expiry_is_sampling_unavailable() {
        let (coordinator, _outgoing) = CallbackCoordinator::new(fast_config());
        let err = coordinator
            .sample(InvocationId::generate(), SamplingRequest::new("p", 10))
            .await
            .unwrap_err();
        assert_eq!(err.kind, palaver_protocol::ErrorKind::SamplingUnavailable);
    }

    #[tokio::test]
    async fn elicitation_expiry_resolves_as_cancelled_outcome() {
        let (coordinator, _outgoing) = CallbackCoordinator::new(fast_config());
        let response = coordinator
            .elicit(InvocationId::generate(), ElicitationRequest::text("pick"))
            .await
            .unwrap();
        assert_eq!(response.action, ElicitationAction::Cancelled);
    }

    #[tokio::test]
    async fn elicitation_retries_before_giving_up() {
        let config = CallbackConfig {
            max_elicit_retries: 2,
            ..fast_config()
        };
        let (coordinator, mut outgoing) = CallbackCoordinator::new(config);
        let invocation = InvocationId::generate();

        let worker = coordinator.clone();
        let handle = tokio::spawn(async move {
            worker
                .elicit(invocation, ElicitationRequest::text("retry me"))
                .await
        });

        // First attempt expires; the retry produces a second outgoing
        // request, which we answer.
        let first = outgoing.recv().await.expect("first attempt");
        let second = outgoing.recv().await.expect("second attempt");
        assert_ne!(first.request_id, second.request_id);

        coordinator
            .submit_elicitation_reply(
                &second.request_id,
                ElicitationResponse::accepted(serde_json::json!("3")),
            )
            .await;

        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.action, ElicitationAction::Accepted);
        assert_eq!(response.text(), Some("3"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_evicts_entries_whose_waiters_are_gone() {
        let config = CallbackConfig {
            sample_timeout: Duration::from_secs(5),
            elicit_timeout: Duration::from_secs(5),
            max_elicit_retries: 0,
            sweep_interval: Duration::from_millis(100),
        };
        let (coordinator, mut outgoing) = CallbackCoordinator::new(config);

        let worker = coordinator.clone();
        let handle = tokio::spawn(async move {
            worker
                .sample(InvocationId::generate(), SamplingRequest::new("p", 10))
                .await
        });

        // Once the request is on the wire it is registered; drop the waiter
        // without giving it a chance to clean up after itself.
        let _request = outgoing.recv().await.expect("request registered");
        handle.abort();
        let _ = handle.await;
        assert_eq!(coordinator.pending_count().await, 1);

        // Past the timeout the sweep reclaims the abandoned entry.
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(coordinator.pending_count().await, 0);
    }

    #[tokio::test]
    async fn late_reply_for_expired_request_is_ignored() {
        let (coordinator, mut outgoing) = CallbackCoordinator::new(fast_config());
        let response = coordinator
            .elicit(InvocationId::generate(), ElicitationRequest::text("q"))
            .await
            .unwrap();
        assert_eq!(response.action, ElicitationAction::Cancelled);

        let request = outgoing.recv().await.unwrap();
        // Must not panic or resurrect the request.
        coordinator
            .submit_elicitation_reply(&request.request_id, ElicitationResponse::declined())
            .await;
        assert_eq!(coordinator.pending_count().await, 0);
    }
}
