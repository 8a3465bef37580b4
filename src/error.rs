/// Errors that can occur when configuring or operating on a ShardMap.
///
/// There is no "unsupported key" variant: keys are bounded at compile time by
/// [`ShardKey`](crate::ShardKey), so an unroutable key never reaches the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The shard count is invalid (must be greater than 0).
    InvalidShardCount,
    /// A fan-out operation observed its cancellation token before finishing.
    Cancelled,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidShardCount => write!(f, "shard count must be greater than 0"),
            Error::Cancelled => write!(f, "operation cancelled before every shard completed"),
        }
    }
}

impl std::error::Error for Error {}
