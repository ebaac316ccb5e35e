//! Model adapters used by the chat runtime.
//!
//! The runtime treats text generation as an opaque collaborator described by
//! [`traits::CompletionModel`]. [`echo::EchoModel`] is a provider-free
//! implementation used by the demo and by tests.

#![warn(missing_docs, clippy::pedantic)]

pub mod echo;
pub mod traits;

pub use echo::EchoModel;
pub use traits::{
    AdapterError, AdapterMetadata, AdapterResult, CompletionModel, CompletionRequest,
};
