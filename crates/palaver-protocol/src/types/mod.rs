//! Protocol data types, grouped by concern.

pub mod elicitation;
pub mod progress;
pub mod sampling;
pub mod tools;

pub use elicitation::{
    ElicitationAction, ElicitationRequest, ElicitationResponse, ResponseShape,
};
pub use progress::{LogLevel, LogNotification, Notification, ProgressNotification};
pub use sampling::{SamplingRequest, SamplingResult};
pub use tools::{CallToolRequest, InvocationId, ToolDescriptor, ToolInputSchema, ToolOutput};
