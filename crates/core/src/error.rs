//! Error taxonomy shared by the portal-facing clients.

/// Failures raised by the portal, NLU and storage plumbing.
///
/// Callers usually see these wrapped in `anyhow::Error`; the orchestrator logs
/// them and drops the affected effect chain instead of propagating.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("client storage unavailable: {0}")]
    Storage(String),
}
