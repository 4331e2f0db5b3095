//! Run report.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// A failed item recorded while running with `FailurePolicy::Isolate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Source collection title
    pub collection: String,
    /// Source file title, `None` when the collection itself failed
    pub title: Option<String>,
    pub message: String,
}

/// Outcome of a mirror run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MirrorReport {
    pub run_id: String,
    pub collections_seen: u64,
    pub collections_created: u64,
    pub collections_existing: u64,
    pub files_seen: u64,
    pub files_created: u64,
    pub files_existing: u64,
    /// Non-file items skipped
    pub files_skipped: u64,
    pub bytes_transferred: u64,
    pub failures: Vec<ItemFailure>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl MirrorReport {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Self::default()
        }
    }

    /// True when every eligible item was synchronized.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold the counts and failures of a partial report into this one.
    pub fn absorb(&mut self, other: MirrorReport) {
        self.collections_seen += other.collections_seen;
        self.collections_created += other.collections_created;
        self.collections_existing += other.collections_existing;
        self.files_seen += other.files_seen;
        self.files_created += other.files_created;
        self.files_existing += other.files_existing;
        self.files_skipped += other.files_skipped;
        self.bytes_transferred += other.bytes_transferred;
        self.failures.extend(other.failures);
    }
}

impl fmt::Display for MirrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} folders ({} created, {} existing), {} files ({} created, {} existing, {} skipped), {} bytes, {} failures in {:.1}s",
            self.collections_seen,
            self.collections_created,
            self.collections_existing,
            self.files_seen,
            self.files_created,
            self.files_existing,
            self.files_skipped,
            self.bytes_transferred,
            self.failures.len(),
            self.duration.as_secs_f64()
        )
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
