//! Integration tests for the mirror engine
//!
//! These tests run full mirror passes against in-memory storage accounts and
//! verify:
//! - Idempotence across repeated runs
//! - No overwrite of existing destination items
//! - Non-file exclusion and scope correctness
//! - Content and metadata fidelity
//! - Single creation under concurrent races on one title
//! - Failure isolation, create retries and partial-upload cleanup

use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    Collection, CollectionMetadata, FileItem, FileUploadMetadata, ResourceType, StorageProvider,
    UploadOptions,
};
use bytes::Bytes;
use core_runtime::events::{EventSink, MirrorEvent};
use core_sync::{
    CreateRetryPolicy, FailurePolicy, MirrorConfig, MirrorEngine, SyncError,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// In-memory storage account
// ============================================================================

/// Injected behavior for the next `create_file` of a given title.
#[derive(Debug, Clone, Copy)]
enum CreateFault {
    /// Reject without storing anything
    Reject { transient: bool },
    /// Store the full file, then report an error
    LandThenFail,
    /// Store a truncated file, then report an error
    PartialThenFail,
}

struct StoredCollection {
    collection: Collection,
    files: Vec<(FileItem, Bytes)>,
}

#[derive(Default)]
struct AccountState {
    collections: Vec<StoredCollection>,
    next_id: u64,
    faults: HashMap<String, VecDeque<CreateFault>>,
    upload_options: Vec<UploadOptions>,
}

#[derive(Default)]
struct CallCounts {
    create_collection: usize,
    create_file: usize,
    download: usize,
    discard: usize,
}

struct MemoryAccount {
    name: &'static str,
    state: Mutex<AccountState>,
    calls: Mutex<CallCounts>,
    lookup_delay: Option<Duration>,
}

impl MemoryAccount {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(AccountState::default()),
            calls: Mutex::new(CallCounts::default()),
            lookup_delay: None,
        }
    }

    /// Widen the window between a lookup and the following create.
    fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = Some(delay);
        self
    }

    fn next_id(state: &mut AccountState, prefix: &str, name: &str) -> String {
        state.next_id += 1;
        format!("{}-{}{}", name, prefix, state.next_id)
    }

    fn seed_collection(&self, title: &str, description: Option<&str>) -> Collection {
        let mut state = self.state.lock().unwrap();
        let collection = Collection {
            id: Self::next_id(&mut state, "c", self.name),
            title: title.to_string(),
            created_time: Some("2023-01-01T00:00:00.000Z".to_string()),
            modified_time: Some("2023-06-01T12:30:00.000Z".to_string()),
            description: description.map(str::to_string),
        };
        state.collections.push(StoredCollection {
            collection: collection.clone(),
            files: Vec::new(),
        });
        collection
    }

    fn seed_file(
        &self,
        collection: &Collection,
        title: &str,
        resource_type: ResourceType,
        content: &[u8],
    ) -> FileItem {
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state, "f", self.name);
        let file = FileItem {
            id,
            title: title.to_string(),
            resource_type,
            created_time: Some("2023-03-01T09:00:00.000Z".to_string()),
            modified_time: Some("2023-03-02T09:00:00.000Z".to_string()),
            description: Some(format!("{} description", title)),
            mime_type: Some("application/pdf".to_string()),
            original_filename: Some(format!("original-{}", title)),
            size: Some(content.len() as u64),
        };
        let stored = state
            .collections
            .iter_mut()
            .find(|c| c.collection.id == collection.id)
            .expect("seeded collection exists");
        stored.files.push((file.clone(), Bytes::copy_from_slice(content)));
        file
    }

    fn inject_fault(&self, title: &str, fault: CreateFault) {
        self.state
            .lock()
            .unwrap()
            .faults
            .entry(title.to_string())
            .or_default()
            .push_back(fault);
    }

    fn collections_titled(&self, title: &str) -> Vec<Collection> {
        self.state
            .lock()
            .unwrap()
            .collections
            .iter()
            .filter(|c| c.collection.title == title)
            .map(|c| c.collection.clone())
            .collect()
    }

    fn files_in(&self, collection_title: &str) -> Vec<(FileItem, Bytes)> {
        self.state
            .lock()
            .unwrap()
            .collections
            .iter()
            .filter(|c| c.collection.title == collection_title)
            .flat_map(|c| c.files.clone())
            .collect()
    }

    fn file(&self, collection_title: &str, title: &str) -> Option<(FileItem, Bytes)> {
        self.files_in(collection_title)
            .into_iter()
            .find(|(f, _)| f.title == title)
    }

    fn collection_count(&self) -> usize {
        self.state.lock().unwrap().collections.len()
    }

    fn calls(&self) -> (usize, usize, usize, usize) {
        let calls = self.calls.lock().unwrap();
        (
            calls.create_collection,
            calls.create_file,
            calls.download,
            calls.discard,
        )
    }

    async fn pause(&self) {
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl StorageProvider for MemoryAccount {
    async fn list_collections(&self) -> BridgeResult<Vec<Collection>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .collections
            .iter()
            .map(|c| c.collection.clone())
            .collect())
    }

    async fn find_collection_by_title(&self, title: &str) -> BridgeResult<Option<Collection>> {
        self.pause().await;
        Ok(self.collections_titled(title).into_iter().next())
    }

    async fn create_collection(
        &self,
        title: &str,
        metadata: CollectionMetadata,
    ) -> BridgeResult<Collection> {
        self.calls.lock().unwrap().create_collection += 1;
        let mut state = self.state.lock().unwrap();
        let collection = Collection {
            id: Self::next_id(&mut state, "c", self.name),
            title: title.to_string(),
            created_time: metadata.created_time,
            modified_time: metadata.modified_time,
            description: metadata.description,
        };
        state.collections.push(StoredCollection {
            collection: collection.clone(),
            files: Vec::new(),
        });
        Ok(collection)
    }

    async fn list_files(&self, collection: &Collection) -> BridgeResult<Vec<FileItem>> {
        let state = self.state.lock().unwrap();
        let stored = state
            .collections
            .iter()
            .find(|c| c.collection.id == collection.id)
            .ok_or_else(|| BridgeError::NotFound(collection.id.clone()))?;
        Ok(stored.files.iter().map(|(f, _)| f.clone()).collect())
    }

    async fn find_file_by_title(
        &self,
        collection: &Collection,
        title: &str,
    ) -> BridgeResult<Option<FileItem>> {
        self.pause().await;
        let state = self.state.lock().unwrap();
        Ok(state
            .collections
            .iter()
            .filter(|c| c.collection.id == collection.id)
            .flat_map(|c| c.files.iter())
            .find(|(f, _)| f.title == title)
            .map(|(f, _)| f.clone()))
    }

    async fn download_content(&self, file: &FileItem) -> BridgeResult<Bytes> {
        self.calls.lock().unwrap().download += 1;
        let state = self.state.lock().unwrap();
        state
            .collections
            .iter()
            .flat_map(|c| c.files.iter())
            .find(|(f, _)| f.id == file.id)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| BridgeError::NotFound(file.id.clone()))
    }

    async fn create_file(
        &self,
        metadata: FileUploadMetadata,
        content: Bytes,
        options: UploadOptions,
    ) -> BridgeResult<FileItem> {
        self.calls.lock().unwrap().create_file += 1;
        let mut state = self.state.lock().unwrap();
        state.upload_options.push(options);

        let fault = state
            .faults
            .get_mut(&metadata.name)
            .and_then(|queue| queue.pop_front());

        let stored_content = match fault {
            Some(CreateFault::Reject { transient: true }) => {
                return Err(BridgeError::OperationFailed("HTTP 503".to_string()))
            }
            Some(CreateFault::Reject { transient: false }) => {
                return Err(BridgeError::NotAvailable("quota exceeded".to_string()))
            }
            Some(CreateFault::PartialThenFail) => content.slice(..content.len() / 2),
            Some(CreateFault::LandThenFail) | None => content,
        };

        let parent = metadata
            .parents
            .first()
            .cloned()
            .ok_or_else(|| BridgeError::OperationFailed("no parent".to_string()))?;
        let id = Self::next_id(&mut state, "f", self.name);
        let file = FileItem {
            id,
            title: metadata.name,
            resource_type: ResourceType::File,
            created_time: metadata.created_time,
            modified_time: metadata.modified_time,
            description: metadata.description,
            mime_type: metadata.mime_type,
            original_filename: metadata.original_filename,
            size: Some(stored_content.len() as u64),
        };
        let stored = state
            .collections
            .iter_mut()
            .find(|c| c.collection.id == parent)
            .ok_or_else(|| BridgeError::NotFound(parent.clone()))?;
        stored.files.push((file.clone(), stored_content));

        match fault {
            Some(CreateFault::LandThenFail) | Some(CreateFault::PartialThenFail) => Err(
                BridgeError::OperationFailed("connection reset during upload".to_string()),
            ),
            _ => Ok(file),
        }
    }

    async fn discard_file(&self, file: &FileItem) -> BridgeResult<()> {
        self.calls.lock().unwrap().discard += 1;
        let mut state = self.state.lock().unwrap();
        for stored in state.collections.iter_mut() {
            stored.files.retain(|(f, _)| f.id != file.id);
        }
        Ok(())
    }
}

// ============================================================================
// Event recording
// ============================================================================

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<MirrorEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<MirrorEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: MirrorEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn engine_with(config: MirrorConfig) -> (MirrorEngine, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    (MirrorEngine::new(config, sink.clone()), sink)
}

const PDF_BYTES: &[u8] = &[0x25, 0x50, 0x44];

// ============================================================================
// Reference scenarios
// ============================================================================

#[tokio::test]
async fn test_creates_missing_folder_and_file() {
    let source = MemoryAccount::new("src");
    let reports = source.seed_collection("Reports", Some("Quarterly reports"));
    let q1 = source.seed_file(&reports, "q1.pdf", ResourceType::File, PDF_BYTES);
    let destination = MemoryAccount::new("dst");

    let (engine, sink) = engine_with(MirrorConfig::default());
    let report = engine.run(&source, &destination).await.unwrap();

    let created = destination.collections_titled("Reports");
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].created_time, reports.created_time);
    assert_eq!(created[0].modified_time, reports.modified_time);
    assert_eq!(created[0].description.as_deref(), Some("Quarterly reports"));

    let (file, content) = destination.file("Reports", "q1.pdf").unwrap();
    assert_eq!(&content[..], PDF_BYTES);
    assert_eq!(file.mime_type, q1.mime_type);
    assert_eq!(file.original_filename, q1.original_filename);
    assert_eq!(file.created_time, q1.created_time);
    assert_eq!(file.modified_time, q1.modified_time);
    assert_eq!(file.description, q1.description);

    assert_eq!(report.collections_created, 1);
    assert_eq!(report.files_created, 1);
    assert_eq!(report.bytes_transferred, 3);

    let events = sink.events();
    assert!(events
        .iter()
        .any(|e| matches!(e, MirrorEvent::FolderCreated { title, .. } if title == "Reports")));
    assert!(events
        .iter()
        .any(|e| matches!(e, MirrorEvent::FileCreated { title, bytes: 3, .. } if title == "q1.pdf")));
    assert!(matches!(events.first(), Some(MirrorEvent::RunStarted { .. })));
    assert!(matches!(events.last(), Some(MirrorEvent::RunCompleted { .. })));
}

#[tokio::test]
async fn test_uploads_use_octet_stream_transport() {
    let source = MemoryAccount::new("src");
    let reports = source.seed_collection("Reports", None);
    source.seed_file(&reports, "q1.pdf", ResourceType::File, PDF_BYTES);
    let destination = MemoryAccount::new("dst");

    let (engine, _) = engine_with(MirrorConfig::default());
    engine.run(&source, &destination).await.unwrap();

    let state = destination.state.lock().unwrap();
    assert_eq!(state.upload_options.len(), 1);
    assert_eq!(
        state.upload_options[0].transport_content_type,
        "application/octet-stream"
    );
    assert_eq!(state.upload_options[0].response_fields, "*");
    assert!(state.upload_options[0].supports_all_drives);
}

#[tokio::test]
async fn test_shortcut_is_skipped() {
    let source = MemoryAccount::new("src");
    let reports = source.seed_collection("Reports", None);
    source.seed_file(&reports, "shortcut-to-x", ResourceType::Shortcut, b"");
    let destination = MemoryAccount::new("dst");

    let (engine, sink) = engine_with(MirrorConfig::default());
    let report = engine.run(&source, &destination).await.unwrap();

    assert!(destination.file("Reports", "shortcut-to-x").is_none());
    assert_eq!(report.files_skipped, 1);
    assert_eq!(source.calls().2, 0, "non-files are never downloaded");
    assert!(sink.events().iter().any(|e| matches!(
        e,
        MirrorEvent::FileSkippedNonFile { title, resource_type, .. }
            if title == "shortcut-to-x" && resource_type == "shortcut"
    )));
}

#[tokio::test]
async fn test_existing_folder_is_reused_unchanged() {
    let source = MemoryAccount::new("src");
    let reports = source.seed_collection("Reports", Some("new description"));
    source.seed_file(&reports, "q1.pdf", ResourceType::File, PDF_BYTES);

    let destination = MemoryAccount::new("dst");
    let existing = destination.seed_collection("Reports", Some("old description"));

    let (engine, sink) = engine_with(MirrorConfig::default());
    engine.run(&source, &destination).await.unwrap();

    let collections = destination.collections_titled("Reports");
    assert_eq!(collections, vec![existing.clone()]);
    assert_eq!(
        collections[0].description.as_deref(),
        Some("old description")
    );

    let (file, _) = destination.file("Reports", "q1.pdf").unwrap();
    assert!(destination
        .files_in("Reports")
        .iter()
        .all(|(f, _)| f.id == file.id));
    assert_eq!(destination.calls().0, 0);
    assert!(sink.events().iter().any(|e| matches!(
        e,
        MirrorEvent::FolderExists { destination_id, .. } if *destination_id == existing.id
    )));
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test]
async fn test_second_run_changes_nothing() {
    let source = MemoryAccount::new("src");
    for folder in ["Reports", "Invoices"] {
        let collection = source.seed_collection(folder, None);
        for name in ["a.bin", "b.bin", "c.bin"] {
            source.seed_file(&collection, name, ResourceType::File, name.as_bytes());
        }
    }
    let destination = MemoryAccount::new("dst");

    let (engine, _) = engine_with(MirrorConfig::default());
    let first = engine.run(&source, &destination).await.unwrap();
    let calls_after_first = destination.calls();

    let second = engine.run(&source, &destination).await.unwrap();

    assert_eq!(first.collections_created, 2);
    assert_eq!(first.files_created, 6);
    assert_eq!(second.collections_created, 0);
    assert_eq!(second.files_created, 0);
    assert_eq!(second.collections_existing, 2);
    assert_eq!(second.files_existing, 6);
    assert_eq!(destination.calls(), calls_after_first);
    assert_eq!(destination.collection_count(), 2);
    assert_eq!(destination.files_in("Reports").len(), 3);
}

#[tokio::test]
async fn test_existing_file_is_not_overwritten() {
    let source = MemoryAccount::new("src");
    let reports = source.seed_collection("Reports", None);
    source.seed_file(&reports, "q1.pdf", ResourceType::File, b"new content");

    let destination = MemoryAccount::new("dst");
    let dest_reports = destination.seed_collection("Reports", None);
    destination.seed_file(&dest_reports, "q1.pdf", ResourceType::File, b"old");

    let (engine, _) = engine_with(MirrorConfig::default());
    let report = engine.run(&source, &destination).await.unwrap();

    let (_, content) = destination.file("Reports", "q1.pdf").unwrap();
    assert_eq!(&content[..], b"old");
    assert_eq!(report.files_existing, 1);
    assert_eq!(source.calls().2, 0, "existing files are never downloaded");
}

#[tokio::test]
async fn test_destination_only_items_are_untouched() {
    let source = MemoryAccount::new("src");
    source.seed_collection("Reports", None);

    let destination = MemoryAccount::new("dst");
    let archive = destination.seed_collection("Archive", Some("keep me"));
    destination.seed_file(&archive, "old.zip", ResourceType::File, b"zip");

    let (engine, _) = engine_with(MirrorConfig::default());
    engine.run(&source, &destination).await.unwrap();

    assert_eq!(destination.collections_titled("Archive"), vec![archive]);
    assert_eq!(destination.files_in("Archive").len(), 1);
    assert_eq!(destination.calls().3, 0);
}

#[tokio::test]
async fn test_file_lookup_is_scoped_to_its_collection() {
    let source = MemoryAccount::new("src");
    let a = source.seed_collection("A", None);
    let b = source.seed_collection("B", None);
    source.seed_file(&a, "notes.txt", ResourceType::File, b"from a");
    source.seed_file(&b, "notes.txt", ResourceType::File, b"from b");

    let destination = MemoryAccount::new("dst");
    let dest_a = destination.seed_collection("A", None);
    destination.seed_file(&dest_a, "notes.txt", ResourceType::File, b"kept");

    let (engine, _) = engine_with(MirrorConfig::default());
    engine.run(&source, &destination).await.unwrap();

    let (_, in_a) = destination.file("A", "notes.txt").unwrap();
    let (_, in_b) = destination.file("B", "notes.txt").unwrap();
    assert_eq!(&in_a[..], b"kept");
    assert_eq!(&in_b[..], b"from b");
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_files_with_one_title_create_once() {
    let source = MemoryAccount::new("src");
    let reports = source.seed_collection("Reports", None);
    for _ in 0..10 {
        source.seed_file(&reports, "dup.bin", ResourceType::File, b"same title");
    }
    let destination = MemoryAccount::new("dst").with_lookup_delay(Duration::from_millis(5));

    let config = MirrorConfig {
        max_concurrent_files: 8,
        ..MirrorConfig::default()
    };
    let (engine, _) = engine_with(config);
    let report = engine.run(&source, &destination).await.unwrap();

    assert_eq!(destination.files_in("Reports").len(), 1);
    assert_eq!(report.files_created, 1);
    assert_eq!(report.files_existing, 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_collections_with_one_title_create_once() {
    let source = MemoryAccount::new("src");
    for i in 0..4 {
        let reports = source.seed_collection("Reports", None);
        let name = format!("file-{}.bin", i);
        source.seed_file(&reports, &name, ResourceType::File, name.as_bytes());
    }
    let destination = MemoryAccount::new("dst").with_lookup_delay(Duration::from_millis(5));

    let config = MirrorConfig {
        max_concurrent_collections: 4,
        ..MirrorConfig::default()
    };
    let (engine, _) = engine_with(config);
    engine.run(&source, &destination).await.unwrap();

    assert_eq!(destination.collections_titled("Reports").len(), 1);
    assert_eq!(destination.files_in("Reports").len(), 4);
    assert_eq!(destination.calls().0, 1);
}

#[tokio::test]
async fn test_sequential_config_mirrors_everything() {
    let source = MemoryAccount::new("src");
    let reports = source.seed_collection("Reports", None);
    for i in 0..5 {
        let name = format!("r{}.pdf", i);
        source.seed_file(&reports, &name, ResourceType::File, name.as_bytes());
    }
    let destination = MemoryAccount::new("dst");

    let (engine, _) = engine_with(MirrorConfig::sequential());
    let report = engine.run(&source, &destination).await.unwrap();

    assert_eq!(report.files_created, 5);
    assert!(report.is_clean());
}

// ============================================================================
// Failures, retries and partial uploads
// ============================================================================

#[tokio::test]
async fn test_fail_fast_aborts_on_rejected_create() {
    let source = MemoryAccount::new("src");
    let reports = source.seed_collection("Reports", None);
    source.seed_file(&reports, "bad.pdf", ResourceType::File, b"bad");
    let destination = MemoryAccount::new("dst");
    destination.inject_fault("bad.pdf", CreateFault::Reject { transient: false });

    let (engine, sink) = engine_with(MirrorConfig::sequential());
    let err = engine.run(&source, &destination).await.unwrap_err();

    match err {
        SyncError::Creation { title, attempts, .. } => {
            assert_eq!(title, "bad.pdf");
            assert_eq!(attempts, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Folder created before the failure stays created
    assert_eq!(destination.collections_titled("Reports").len(), 1);
    let events = sink.events();
    assert!(events
        .iter()
        .any(|e| matches!(e, MirrorEvent::ItemFailed { title: Some(t), .. } if t == "bad.pdf")));
    assert!(!events
        .iter()
        .any(|e| matches!(e, MirrorEvent::RunCompleted { .. })));
    match events.last() {
        Some(MirrorEvent::RunFailed { message, .. }) => assert!(message.contains("bad.pdf")),
        other => panic!("unexpected terminal event: {other:?}"),
    }
}

#[tokio::test]
async fn test_isolate_continues_past_failed_file() {
    let source = MemoryAccount::new("src");
    let reports = source.seed_collection("Reports", None);
    source.seed_file(&reports, "bad.pdf", ResourceType::File, b"bad");
    source.seed_file(&reports, "good.pdf", ResourceType::File, b"good");
    let invoices = source.seed_collection("Invoices", None);
    source.seed_file(&invoices, "inv.pdf", ResourceType::File, b"inv");

    let destination = MemoryAccount::new("dst");
    destination.inject_fault("bad.pdf", CreateFault::Reject { transient: false });

    let config = MirrorConfig {
        failure_policy: FailurePolicy::Isolate,
        ..MirrorConfig::default()
    };
    let (engine, _) = engine_with(config);
    let report = engine.run(&source, &destination).await.unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].collection, "Reports");
    assert_eq!(report.failures[0].title.as_deref(), Some("bad.pdf"));
    assert!(destination.file("Reports", "good.pdf").is_some());
    assert!(destination.file("Invoices", "inv.pdf").is_some());
    assert!(destination.file("Reports", "bad.pdf").is_none());

    // A later run picks the failed item up
    let (engine, _) = engine_with(MirrorConfig::default());
    let retry = engine.run(&source, &destination).await.unwrap();
    assert_eq!(retry.files_created, 1);
    assert!(destination.file("Reports", "bad.pdf").is_some());
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let source = MemoryAccount::new("src");
    let reports = source.seed_collection("Reports", None);
    source.seed_file(&reports, "q1.pdf", ResourceType::File, PDF_BYTES);
    let destination = MemoryAccount::new("dst");
    destination.inject_fault("q1.pdf", CreateFault::Reject { transient: true });

    let config = MirrorConfig {
        create_retry: CreateRetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        },
        ..MirrorConfig::default()
    };
    let (engine, _) = engine_with(config);
    let report = engine.run(&source, &destination).await.unwrap();

    assert_eq!(report.files_created, 1);
    assert_eq!(destination.calls().1, 2);
    assert_eq!(destination.files_in("Reports").len(), 1);
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let source = MemoryAccount::new("src");
    let reports = source.seed_collection("Reports", None);
    source.seed_file(&reports, "q1.pdf", ResourceType::File, PDF_BYTES);
    let destination = MemoryAccount::new("dst");
    destination.inject_fault("q1.pdf", CreateFault::Reject { transient: false });

    let config = MirrorConfig {
        create_retry: CreateRetryPolicy::with_attempts(3),
        ..MirrorConfig::default()
    };
    let (engine, _) = engine_with(config);
    assert!(engine.run(&source, &destination).await.is_err());
    assert_eq!(destination.calls().1, 1);
}

#[tokio::test]
async fn test_landed_create_is_adopted_not_duplicated() {
    let source = MemoryAccount::new("src");
    let reports = source.seed_collection("Reports", None);
    source.seed_file(&reports, "q1.pdf", ResourceType::File, PDF_BYTES);
    let destination = MemoryAccount::new("dst");
    destination.inject_fault("q1.pdf", CreateFault::LandThenFail);

    let config = MirrorConfig {
        create_retry: CreateRetryPolicy::with_attempts(3),
        ..MirrorConfig::default()
    };
    let (engine, _) = engine_with(config);
    let report = engine.run(&source, &destination).await.unwrap();

    assert_eq!(report.files_created, 1);
    assert_eq!(destination.calls().1, 1, "re-check found the file, no retry");
    assert_eq!(destination.files_in("Reports").len(), 1);
}

#[tokio::test]
async fn test_partial_upload_is_discarded_and_retried() {
    let source = MemoryAccount::new("src");
    let reports = source.seed_collection("Reports", None);
    source.seed_file(&reports, "big.bin", ResourceType::File, &[7u8; 64]);
    let destination = MemoryAccount::new("dst");
    destination.inject_fault("big.bin", CreateFault::PartialThenFail);

    let config = MirrorConfig {
        create_retry: CreateRetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        },
        ..MirrorConfig::default()
    };
    let (engine, _) = engine_with(config);
    engine.run(&source, &destination).await.unwrap();

    let files = destination.files_in("Reports");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].1.len(), 64);
    assert_eq!(destination.calls().3, 1);
}

#[tokio::test]
async fn test_partial_upload_without_retry_leaves_nothing_behind() {
    let source = MemoryAccount::new("src");
    let reports = source.seed_collection("Reports", None);
    source.seed_file(&reports, "big.bin", ResourceType::File, &[7u8; 64]);
    let destination = MemoryAccount::new("dst");
    destination.inject_fault("big.bin", CreateFault::PartialThenFail);

    let (engine, _) = engine_with(MirrorConfig::default());
    assert!(engine.run(&source, &destination).await.is_err());

    assert!(destination.files_in("Reports").is_empty());
    assert_eq!(destination.calls().3, 1);
}
