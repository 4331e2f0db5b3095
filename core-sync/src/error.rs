use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Lookup of '{title}' in {scope} failed: {source}")]
    Lookup {
        scope: String,
        title: String,
        source: BridgeError,
    },

    #[error("Listing {scope} failed: {source}")]
    Listing { scope: String, source: BridgeError },

    #[error("Creating '{title}' in {scope} failed after {attempts} attempt(s): {source}")]
    Creation {
        scope: String,
        title: String,
        attempts: u32,
        source: BridgeError,
    },

    #[error("Downloading '{title}' failed: {source}")]
    Download { title: String, source: BridgeError },

    #[error("Downloaded content of '{title}' is {actual} bytes but the source reports {expected}")]
    ContentLengthMismatch {
        title: String,
        expected: u64,
        actual: u64,
    },
}

pub type Result<T> = std::result::Result<T, SyncError>;
