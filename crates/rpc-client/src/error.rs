/// Errors surfaced by [`crate::RpcClient`] implementations.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The underlying transport failed (connection reset, malformed
    /// response, node error response, ...).
    #[error("rpc transport error: {0}")]
    Transport(String),
    /// The node returned a response this client couldn't decode into the
    /// expected type.
    #[error("failed to decode rpc response: {0}")]
    Decode(String),
    /// A mock client was asked for a response it has no canned answer
    /// for. Never returned by a real client.
    #[error("no mock response configured for this call")]
    Unmocked,
}
