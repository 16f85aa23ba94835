//! Prompt domain module: requests, raw model outputs and media URIs.

mod client;
mod data_uri;
mod model;

pub use client::PromptModel;
pub use data_uri::DataUri;
pub use model::{GenerateAnimationOutput, ImprovePromptOutput, PromptRequest};
