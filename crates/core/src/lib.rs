//! Headless conversation client for a portal-embedded assistant.
//!
//! The crate wires four collaborators together: a transcript store on the
//! portal's object record API, an NLU intent detection service, a structured
//! content search, and the host's speech capabilities. The
//! [`orchestrator::ConversationOrchestrator`] sequences them for each turn.

pub mod error;
pub mod fulfilment;
pub mod host;
pub mod links;
pub mod nlu;
pub mod orchestrator;
pub mod portal;
pub mod search;
pub mod session;
pub mod speech;
pub mod transcript;

#[cfg(test)]
mod testing;

pub use orchestrator::{ConversationOrchestrator, ConversationState, ConversationView, Submission};
