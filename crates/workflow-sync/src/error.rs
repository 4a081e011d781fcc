/// Errors produced by the cooperative scheduler's primitives.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CoopError {
    /// The owning context was cancelled while this operation was suspended.
    #[error("operation cancelled")]
    Canceled,
    /// The channel was closed while this operation was suspended.
    #[error("channel closed")]
    Closed,
}
