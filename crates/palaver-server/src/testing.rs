//! Test utilities: a scripted in-process client endpoint.
//!
//! Interactive tools are awkward to test against a real client, so the
//! [`ScriptedClient`] plays the client runtime's role: queued replies answer
//! sampling and elicitation requests in order, and everything the tool sent
//! is recorded for assertions.
//!
//! Like the client runtime it stands in for, it enforces the sampling output
//! bound by truncating scripted completions to the request's
//! `max_output_chars`.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use palaver_protocol::{
    ElicitationRequest, ElicitationResponse, InvocationId, Notification, PalaverError,
    PalaverResult, SamplingRequest, SamplingResult,
};

use crate::endpoint::ClientEndpoint;

/// Scripted [`ClientEndpoint`] for tests.
///
/// With an empty script, sampling fails with `SamplingUnavailable` and
/// elicitation resolves as the cancelled outcome - the same behavior as a
/// client with no LLM and a user who walked away.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    sample_replies: Mutex<VecDeque<PalaverResult<SamplingResult>>>,
    elicit_replies: Mutex<VecDeque<PalaverResult<ElicitationResponse>>>,
    sample_requests: Mutex<Vec<(InvocationId, SamplingRequest)>>,
    elicit_requests: Mutex<Vec<(InvocationId, ElicitationRequest)>>,
    notifications: Mutex<Vec<(InvocationId, Notification)>>,
}

impl ScriptedClient {
    /// Create a client with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle, for handing the same client to a dispatcher and the
    /// test body.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Queue a sampling completion.
    pub fn push_sampling(&self, result: SamplingResult) {
        self.sample_replies.lock().push_back(Ok(result));
    }

    /// Queue a sampling failure.
    pub fn push_sampling_failure(&self, error: PalaverError) {
        self.sample_replies.lock().push_back(Err(error));
    }

    /// Queue an elicitation outcome.
    pub fn push_elicitation(&self, response: ElicitationResponse) {
        self.elicit_replies.lock().push_back(Ok(response));
    }

    /// Queue an elicitation transport failure.
    pub fn push_elicitation_failure(&self, error: PalaverError) {
        self.elicit_replies.lock().push_back(Err(error));
    }

    /// Sampling requests observed so far.
    #[must_use]
    pub fn sampling_requests(&self) -> Vec<(InvocationId, SamplingRequest)> {
        self.sample_requests.lock().clone()
    }

    /// Elicitation requests observed so far.
    #[must_use]
    pub fn elicitation_requests(&self) -> Vec<(InvocationId, ElicitationRequest)> {
        self.elicit_requests.lock().clone()
    }

    /// All notifications observed so far, in delivery order.
    #[must_use]
    pub fn notifications(&self) -> Vec<(InvocationId, Notification)> {
        self.notifications.lock().clone()
    }

    /// The `current` values of all progress notifications, in order.
    #[must_use]
    pub fn progress_values(&self) -> Vec<f64> {
        self.notifications
            .lock()
            .iter()
            .filter_map(|(_, note)| match note {
                Notification::Progress(progress) => Some(progress.current),
                Notification::Log(_) => None,
            })
            .collect()
    }

    /// Log messages observed so far, in order.
    #[must_use]
    pub fn log_messages(&self) -> Vec<String> {
        self.notifications
            .lock()
            .iter()
            .filter_map(|(_, note)| match note {
                Notification::Log(log) => Some(log.message.clone()),
                Notification::Progress(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl ClientEndpoint for ScriptedClient {
    async fn create_message(
        &self,
        invocation: InvocationId,
        request: SamplingRequest,
    ) -> PalaverResult<SamplingResult> {
        let reply = self.sample_replies.lock().pop_front();
        let max_chars = request.max_output_chars as usize;
        self.sample_requests.lock().push((invocation, request));

        match reply {
            Some(Ok(mut result)) => {
                // The client runtime enforces the requested output bound.
                if result.output_chars() > max_chars {
                    result.text = result.text.chars().take(max_chars).collect();
                }
                Ok(result)
            }
            Some(Err(err)) => Err(err),
            None => Err(PalaverError::sampling_unavailable(
                "no scripted sampling reply",
            )),
        }
    }

    async fn elicit(
        &self,
        invocation: InvocationId,
        request: ElicitationRequest,
    ) -> PalaverResult<ElicitationResponse> {
        self.elicit_requests.lock().push((invocation, request));
        match self.elicit_replies.lock().pop_front() {
            Some(reply) => reply,
            None => Ok(ElicitationResponse::cancelled()),
        }
    }

    async fn notify(
        &self,
        invocation: InvocationId,
        notification: Notification,
    ) -> PalaverResult<()> {
        self.notifications.lock().push((invocation, notification));
        Ok(())
    }
}
