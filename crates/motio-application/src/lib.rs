//! Application layer for motio.
//!
//! Use cases that coordinate the domain traits from `motio-core` with
//! whatever provider and model implementations the binary wires in.

pub mod feedback;
pub mod prompt_workflow;
pub mod session;

pub use feedback::Flow;
pub use prompt_workflow::PromptWorkflow;
pub use session::{ChangePasswordForm, SessionStore};
