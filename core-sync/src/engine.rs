//! # Mirror Engine
//!
//! Drives a one-way, non-deleting mirror of a two-level tree from a source
//! account into a destination account.
//!
//! ## Workflow
//!
//! 1. List every top-level collection in the source
//! 2. For each one, resolve or create the destination counterpart by title
//! 3. List the source collection's direct members
//! 4. For each ordinary file, resolve or create the counterpart inside the
//!    destination collection, downloading and uploading content only when
//!    the destination lacks it
//!
//! Existing destination items always win: nothing is overwritten, updated,
//! or removed, so running twice is the same as running once.
//!
//! ## Concurrency
//!
//! Collections and the files inside each collection fan out up to the
//! configured limits. Every lookup-then-create sequence runs under a lock on
//! its destination `(scope, title)` key, so two tasks racing on the same
//! title never both create.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{MirrorConfig, MirrorEngine};
//! use core_runtime::events::TracingEventSink;
//! use std::sync::Arc;
//!
//! let engine = MirrorEngine::new(MirrorConfig::default(), Arc::new(TracingEventSink));
//! let report = engine.run(source.as_ref(), destination.as_ref()).await?;
//! println!("{}", report);
//! ```

use crate::config::{FailurePolicy, MirrorConfig};
use crate::error::{Result, SyncError};
use crate::key_lock::KeyedLocks;
use crate::matcher::{self, MatchKey, MatchScope};
use crate::planner::{self, CollectionPlan, FilePlan};
use crate::report::{ItemFailure, MirrorReport};
use bridge_traits::{
    BridgeError, Collection, CollectionMetadata, FileItem, FileUploadMetadata, StorageProvider,
};
use bytes::Bytes;
use core_runtime::events::{EventSink, MirrorEvent};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

enum CollectionOutcome {
    Existing(Collection),
    Created(Collection),
}

enum FileOutcome {
    SkippedNonFile,
    Existing(FileItem),
    Created(FileItem, u64),
}

/// What a post-failure lookup found under the title being created.
enum Recovery<T> {
    /// The create landed despite the error.
    Adopted(T),
    /// Nothing is there; a retry cannot duplicate.
    Clear,
    /// State unknown; retrying could duplicate.
    Unknown,
}

/// Mirror engine.
pub struct MirrorEngine {
    config: MirrorConfig,
    events: Arc<dyn EventSink>,
    locks: KeyedLocks<MatchKey>,
}

impl MirrorEngine {
    pub fn new(config: MirrorConfig, events: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            events,
            locks: KeyedLocks::new(),
        }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Mirror every collection of `source` and its files into `destination`.
    ///
    /// # Errors
    ///
    /// Under `FailurePolicy::FailFast` the first unrecovered error aborts the
    /// run and is returned; items created before it remain fully created.
    /// Under `FailurePolicy::Isolate` only a failure to list the source root
    /// is returned; item failures are recorded in the report.
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        source: &dyn StorageProvider,
        destination: &dyn StorageProvider,
    ) -> Result<MirrorReport> {
        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        self.events.emit(MirrorEvent::RunStarted {
            run_id: run_id.clone(),
        });

        match self.mirror_all(run_id.clone(), source, destination).await {
            Ok(mut report) => {
                report.duration = started.elapsed();
                self.events.emit(MirrorEvent::RunCompleted {
                    run_id,
                    collections_created: report.collections_created,
                    files_created: report.files_created,
                    failures: report.failures.len() as u64,
                    duration_ms: report.duration.as_millis() as u64,
                });
                Ok(report)
            }
            Err(error) => {
                self.events.emit(MirrorEvent::RunFailed {
                    run_id,
                    message: error.to_string(),
                    duration_ms: started.elapsed().as_millis() as u64,
                });
                Err(error)
            }
        }
    }

    async fn mirror_all(
        &self,
        run_id: String,
        source: &dyn StorageProvider,
        destination: &dyn StorageProvider,
    ) -> Result<MirrorReport> {
        let collections = source
            .list_collections()
            .await
            .map_err(|source| SyncError::Listing {
                scope: MatchScope::Root.to_string(),
                source,
            })?;
        debug!(count = collections.len(), "Listed source collections");

        let mut report = MirrorReport::new(run_id);
        let mut results = stream::iter(collections)
            .map(move |collection| self.mirror_collection(collection, source, destination))
            .buffer_unordered(self.config.max_concurrent_collections.max(1));

        while let Some(result) = results.next().await {
            // Returning drops the stream, cancelling in-flight siblings
            report.absorb(result?);
        }

        Ok(report)
    }

    /// Return the destination collection titled like `source_collection`,
    /// creating it with the source's metadata when absent.
    pub async fn resolve_or_create_collection(
        &self,
        source_collection: &Collection,
        destination: &dyn StorageProvider,
    ) -> Result<Collection> {
        match self.resolve_collection(source_collection, destination).await? {
            CollectionOutcome::Existing(collection) | CollectionOutcome::Created(collection) => {
                Ok(collection)
            }
        }
    }

    /// Return the file titled like `source_file` inside
    /// `destination_collection`, creating it with the source's content and
    /// metadata when absent. Non-file items yield `None` without any I/O.
    pub async fn resolve_or_create_file(
        &self,
        source_file: &FileItem,
        destination_collection: &Collection,
        source: &dyn StorageProvider,
        destination: &dyn StorageProvider,
    ) -> Result<Option<FileItem>> {
        let outcome = self
            .mirror_file(
                source_file,
                &destination_collection.title,
                destination_collection,
                source,
                destination,
            )
            .await?;

        Ok(match outcome {
            FileOutcome::SkippedNonFile => None,
            FileOutcome::Existing(file) | FileOutcome::Created(file, _) => Some(file),
        })
    }

    #[instrument(skip_all, fields(folder = %source_collection.title))]
    async fn mirror_collection(
        &self,
        source_collection: Collection,
        source: &dyn StorageProvider,
        destination: &dyn StorageProvider,
    ) -> Result<MirrorReport> {
        let mut tally = MirrorReport {
            collections_seen: 1,
            ..MirrorReport::default()
        };
        self.events.emit(MirrorEvent::FolderSeen {
            title: source_collection.title.clone(),
        });

        let destination_collection =
            match self.resolve_collection(&source_collection, destination).await {
                Ok(CollectionOutcome::Existing(collection)) => {
                    tally.collections_existing = 1;
                    collection
                }
                Ok(CollectionOutcome::Created(collection)) => {
                    tally.collections_created = 1;
                    collection
                }
                Err(error) => return self.collection_failed(&source_collection, error, tally),
            };

        let files = match source.list_files(&source_collection).await {
            Ok(files) => files,
            Err(source_error) => {
                let error = SyncError::Listing {
                    scope: MatchScope::collection(&source_collection).to_string(),
                    source: source_error,
                };
                return self.collection_failed(&source_collection, error, tally);
            }
        };
        debug!(count = files.len(), "Listed source files");

        let collection_title = &source_collection.title;
        let destination_collection = &destination_collection;
        let mut results = stream::iter(files)
            .map(move |file| async move {
                let outcome = self
                    .mirror_file(
                        &file,
                        collection_title,
                        destination_collection,
                        source,
                        destination,
                    )
                    .await;
                (file, outcome)
            })
            .buffer_unordered(self.config.max_concurrent_files.max(1));

        while let Some((file, outcome)) = results.next().await {
            tally.files_seen += 1;
            match outcome {
                Ok(FileOutcome::SkippedNonFile) => tally.files_skipped += 1,
                Ok(FileOutcome::Existing(_)) => tally.files_existing += 1,
                Ok(FileOutcome::Created(_, bytes)) => {
                    tally.files_created += 1;
                    tally.bytes_transferred += bytes;
                }
                Err(error) => {
                    self.emit_failure(collection_title, Some(&file.title), &error);
                    match self.config.failure_policy {
                        FailurePolicy::FailFast => return Err(error),
                        FailurePolicy::Isolate => tally.failures.push(ItemFailure {
                            collection: collection_title.clone(),
                            title: Some(file.title.clone()),
                            message: error.to_string(),
                        }),
                    }
                }
            }
        }

        Ok(tally)
    }

    fn collection_failed(
        &self,
        source_collection: &Collection,
        error: SyncError,
        mut tally: MirrorReport,
    ) -> Result<MirrorReport> {
        self.emit_failure(&source_collection.title, None, &error);
        match self.config.failure_policy {
            FailurePolicy::FailFast => Err(error),
            FailurePolicy::Isolate => {
                tally.failures.push(ItemFailure {
                    collection: source_collection.title.clone(),
                    title: None,
                    message: error.to_string(),
                });
                Ok(tally)
            }
        }
    }

    fn emit_failure(&self, collection: &str, title: Option<&str>, error: &SyncError) {
        self.events.emit(MirrorEvent::ItemFailed {
            collection: collection.to_string(),
            title: title.map(str::to_string),
            message: error.to_string(),
        });
    }

    async fn resolve_collection(
        &self,
        source_collection: &Collection,
        destination: &dyn StorageProvider,
    ) -> Result<CollectionOutcome> {
        let title = &source_collection.title;
        let _guard = self.locks.lock(&MatchKey::root(title.clone())).await;

        let existing = matcher::find_collection(destination, title)
            .await
            .map_err(|source| SyncError::Lookup {
                scope: MatchScope::Root.to_string(),
                title: title.clone(),
                source,
            })?;

        match planner::plan_collection(source_collection, existing) {
            CollectionPlan::SkipExisting(found) => {
                self.events.emit(MirrorEvent::FolderExists {
                    title: title.clone(),
                    destination_id: found.id.clone(),
                });
                Ok(CollectionOutcome::Existing(found))
            }
            CollectionPlan::Create { title, metadata } => {
                let created = self
                    .create_collection_with_retry(&title, metadata, destination)
                    .await?;
                self.events.emit(MirrorEvent::FolderCreated {
                    title,
                    destination_id: created.id.clone(),
                });
                Ok(CollectionOutcome::Created(created))
            }
        }
    }

    async fn create_collection_with_retry(
        &self,
        title: &str,
        metadata: CollectionMetadata,
        destination: &dyn StorageProvider,
    ) -> Result<Collection> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match destination.create_collection(title, metadata.clone()).await {
                Ok(created) => return Ok(created),
                Err(error) => error,
            };
            warn!(title, attempt, error = %error, "Creating folder failed");

            let recovery = match matcher::find_collection(destination, title).await {
                Ok(Some(found)) => Recovery::Adopted(found),
                Ok(None) => Recovery::Clear,
                Err(lookup_error) => {
                    warn!(title, error = %lookup_error, "Re-checking folder after failed create failed");
                    Recovery::Unknown
                }
            };

            match recovery {
                Recovery::Adopted(found) => {
                    debug!(title, "Folder exists after failed create, adopting it");
                    return Ok(found);
                }
                Recovery::Clear if self.should_retry(attempt, &error) => {
                    tokio::time::sleep(self.config.create_retry.delay_for(attempt)).await;
                }
                Recovery::Clear | Recovery::Unknown => {
                    return Err(SyncError::Creation {
                        scope: MatchScope::Root.to_string(),
                        title: title.to_string(),
                        attempts: attempt,
                        source: error,
                    });
                }
            }
        }
    }

    #[instrument(skip_all, fields(folder = %collection_title, file = %source_file.title))]
    async fn mirror_file(
        &self,
        source_file: &FileItem,
        collection_title: &str,
        destination_collection: &Collection,
        source: &dyn StorageProvider,
        destination: &dyn StorageProvider,
    ) -> Result<FileOutcome> {
        self.events.emit(MirrorEvent::FileSeen {
            collection: collection_title.to_string(),
            title: source_file.title.clone(),
        });

        if !planner::is_transferable(source_file) {
            self.emit_skipped(collection_title, source_file);
            return Ok(FileOutcome::SkippedNonFile);
        }

        let key = MatchKey::in_collection(destination_collection, source_file.title.clone());
        let _guard = self.locks.lock(&key).await;

        let existing = matcher::find_file(destination, destination_collection, &source_file.title)
            .await
            .map_err(|source| SyncError::Lookup {
                scope: key.scope.to_string(),
                title: source_file.title.clone(),
                source,
            })?;

        match planner::plan_file(source_file, destination_collection, existing) {
            FilePlan::SkipNonFile(_) => {
                self.emit_skipped(collection_title, source_file);
                Ok(FileOutcome::SkippedNonFile)
            }
            FilePlan::SkipExisting(found) => {
                self.events.emit(MirrorEvent::FileExists {
                    collection: collection_title.to_string(),
                    title: source_file.title.clone(),
                    destination_id: found.id.clone(),
                });
                Ok(FileOutcome::Existing(found))
            }
            FilePlan::Create(metadata) => {
                let content = self.download(source, source_file).await?;
                let bytes = content.len() as u64;
                let created = self
                    .create_file_with_retry(metadata, content, &key, destination_collection, destination)
                    .await?;

                self.events.emit(MirrorEvent::FileCreated {
                    collection: collection_title.to_string(),
                    title: source_file.title.clone(),
                    destination_id: created.id.clone(),
                    bytes,
                });
                Ok(FileOutcome::Created(created, bytes))
            }
        }
    }

    fn emit_skipped(&self, collection_title: &str, source_file: &FileItem) {
        self.events.emit(MirrorEvent::FileSkippedNonFile {
            collection: collection_title.to_string(),
            title: source_file.title.clone(),
            resource_type: source_file.resource_type.to_string(),
        });
    }

    async fn download(&self, source: &dyn StorageProvider, file: &FileItem) -> Result<Bytes> {
        let content = source
            .download_content(file)
            .await
            .map_err(|source| SyncError::Download {
                title: file.title.clone(),
                source,
            })?;

        if let Some(expected) = file.size {
            let actual = content.len() as u64;
            if actual != expected {
                return Err(SyncError::ContentLengthMismatch {
                    title: file.title.clone(),
                    expected,
                    actual,
                });
            }
        }

        Ok(content)
    }

    async fn create_file_with_retry(
        &self,
        metadata: FileUploadMetadata,
        content: Bytes,
        key: &MatchKey,
        destination_collection: &Collection,
        destination: &dyn StorageProvider,
    ) -> Result<FileItem> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match destination
                .create_file(metadata.clone(), content.clone(), planner::upload_options())
                .await
            {
                Ok(created) => return Ok(created),
                Err(error) => error,
            };
            warn!(title = %key.title, attempt, error = %error, "Creating file failed");

            match self
                .recover_file(destination_collection, &key.title, content.len() as u64, destination)
                .await
            {
                Recovery::Adopted(found) => return Ok(found),
                Recovery::Clear if self.should_retry(attempt, &error) => {
                    tokio::time::sleep(self.config.create_retry.delay_for(attempt)).await;
                }
                Recovery::Clear | Recovery::Unknown => {
                    return Err(SyncError::Creation {
                        scope: key.scope.to_string(),
                        title: key.title.clone(),
                        attempts: attempt,
                        source: error,
                    });
                }
            }
        }
    }

    /// Inspect the destination after a failed file create.
    ///
    /// An item whose size differs from the content is a partial artifact and
    /// is discarded; one that matches (or reports no size) is adopted.
    async fn recover_file(
        &self,
        destination_collection: &Collection,
        title: &str,
        expected_size: u64,
        destination: &dyn StorageProvider,
    ) -> Recovery<FileItem> {
        let found = match matcher::find_file(destination, destination_collection, title).await {
            Ok(Some(found)) => found,
            Ok(None) => return Recovery::Clear,
            Err(error) => {
                warn!(title, error = %error, "Re-checking file after failed create failed");
                return Recovery::Unknown;
            }
        };

        match found.size {
            Some(size) if size != expected_size => {
                warn!(
                    title,
                    size,
                    expected_size,
                    destination_id = %found.id,
                    "Discarding partial upload"
                );
                match destination.discard_file(&found).await {
                    Ok(()) => Recovery::Clear,
                    Err(error) => {
                        warn!(title, error = %error, "Discarding partial upload failed");
                        Recovery::Unknown
                    }
                }
            }
            _ => {
                debug!(title, "File exists after failed create, adopting it");
                Recovery::Adopted(found)
            }
        }
    }

    fn should_retry(&self, attempt: u32, error: &BridgeError) -> bool {
        attempt < self.config.create_retry.max_attempts && error.is_transient()
    }
}
