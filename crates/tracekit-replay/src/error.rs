//! Error taxonomy for the replay match service (§7).

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// No recorded entry matched the fingerprint. Also what a timed-out RPC
    /// becomes (§5: "on expiry the mock returns 'no match'").
    #[error("no match found for this call")]
    NoMatch,
    #[error("match service transport error: {0}")]
    Transport(String),
}

pub type ReplayResult<T> = Result<T, ReplayError>;
