use crate::utils::CCStr;

/// Why a waiter did not get the data it asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The fetch operation itself failed. The instance is back to unfetched and the next
    /// render or prefetch retries.
    Failed(CCStr),
    /// The fetch this waiter joined was abandoned because the instance moved on to
    /// different data before it settled.
    Superseded,
}

impl core::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Failed(e) => write!(f, "fetch failed: {e}"),
            FetchError::Superseded => f.write_str("fetch superseded by a request for other data"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<CCStr> for FetchError {
    fn from(value: CCStr) -> Self {
        FetchError::Failed(value)
    }
}

/// What every waiter of a fetch is notified with
pub type FetchResult = Result<(), FetchError>;
