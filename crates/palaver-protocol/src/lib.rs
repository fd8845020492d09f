//! # Palaver Protocol
//!
//! Data model for interactive MCP-style tool servers: the request/response
//! types a running tool exchanges with its invoking client over the callback
//! channel.
//!
//! Three concerns live here:
//!
//! - **Sampling** - a tool's mid-execution request for the client's LLM to
//!   generate text ([`SamplingRequest`] / [`SamplingResult`]).
//! - **Elicitation** - a tool's request for structured input from the end
//!   user ([`ElicitationRequest`] / [`ElicitationResponse`]); declining is a
//!   first-class outcome, not an error.
//! - **Progress/logging** - fire-and-forget status signals
//!   ([`ProgressNotification`], [`LogNotification`]).
//!
//! Plus the tool-calling surface ([`ToolDescriptor`], [`CallToolRequest`],
//! [`ToolOutput`]) and the unified [`PalaverError`] type.
//!
//! Transport framing, handshake and capability negotiation are out of scope;
//! whichever runtime carries these types owns those concerns.

pub mod error;
pub mod types;

pub use error::{ErrorKind, PalaverError, PalaverResult};
pub use types::{
    CallToolRequest, ElicitationAction, ElicitationRequest, ElicitationResponse, InvocationId,
    LogLevel, LogNotification, Notification, ProgressNotification, ResponseShape, SamplingRequest,
    SamplingResult, ToolDescriptor, ToolInputSchema, ToolOutput,
};
