//! Capabilities of the portal that embeds the conversation client.

/// Session and identity primitives provided by the host portal.
pub trait HostEnvironment: Send + Sync {
    fn is_signed_in(&self) -> bool;

    /// Identity the conversation session is derived from (the user's email).
    fn user_identity(&self) -> &str;

    /// Scheme and authority of the portal, e.g. `https://portal.example.com`.
    fn origin(&self) -> &str;

    /// Group id of the current site; used for site-scoped search.
    fn site_group_id(&self) -> Option<&str>;

    /// Token sent as `x-csrf-token` on portal requests.
    fn csrf_token(&self) -> Option<&str>;
}
