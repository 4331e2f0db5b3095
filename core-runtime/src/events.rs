//! # Mirror Events
//!
//! Structured progress events emitted by the mirror engine, and the sinks
//! that receive them.
//!
//! ## Overview
//!
//! The engine never logs through a global logger. It is handed an
//! [`EventSink`] at construction and reports every decision it takes
//! through it:
//!
//! - **Folder events**: `FolderSeen`, `FolderExists`, `FolderCreated`
//! - **File events**: `FileSeen`, `FileSkippedNonFile`, `FileExists`, `FileCreated`
//! - **Run events**: `RunStarted`, `ItemFailed`, `RunCompleted`, `RunFailed`
//!
//! Provided sinks:
//!
//! - [`EventBus`]: `tokio::sync::broadcast` fan-out to any number of subscribers
//! - [`TracingEventSink`]: renders each event as a `tracing` record
//! - [`FanoutSink`]: forwards to several sinks
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::events::{EventBus, EventSink, MirrorEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut subscriber = bus.subscribe();
//!
//! bus.emit(MirrorEvent::FolderSeen { title: "Reports".to_string() });
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Folder seen");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! The bus uses `tokio::sync::broadcast`:
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; it can keep
//!   receiving newer ones.
//! - **`RecvError::Closed`**: every sender is gone; the run is over.
//!
//! Emitting never fails from the engine's point of view: a bus without
//! subscribers simply drops the event.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

pub use tokio::sync::broadcast::error::RecvError;
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall further behind receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

// ============================================================================
// Event Types
// ============================================================================

/// Progress event emitted during a mirror run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum MirrorEvent {
    /// A run began.
    RunStarted {
        /// Identifier of this run.
        run_id: String,
    },
    /// A source collection is about to be resolved.
    FolderSeen {
        /// Collection title.
        title: String,
    },
    /// The destination already had a collection with this title.
    FolderExists {
        title: String,
        /// Destination collection id.
        destination_id: String,
    },
    /// A destination collection was created.
    FolderCreated {
        title: String,
        destination_id: String,
    },
    /// A source file is about to be resolved.
    FileSeen {
        /// Title of the collection holding the file.
        collection: String,
        /// File title.
        title: String,
    },
    /// The source item is not an ordinary file and was skipped.
    FileSkippedNonFile {
        collection: String,
        title: String,
        /// Resource type reported by the source.
        resource_type: String,
    },
    /// The destination collection already had a file with this title.
    FileExists {
        collection: String,
        title: String,
        destination_id: String,
    },
    /// A destination file was created with the source content.
    FileCreated {
        collection: String,
        title: String,
        destination_id: String,
        /// Bytes transferred.
        bytes: u64,
    },
    /// Processing an item failed.
    ItemFailed {
        /// Collection title.
        collection: String,
        /// File title, `None` when the collection itself failed.
        title: Option<String>,
        /// Human-readable error message.
        message: String,
    },
    /// The run finished (successfully or after isolated failures).
    RunCompleted {
        run_id: String,
        collections_created: u64,
        files_created: u64,
        failures: u64,
        /// Wall-clock duration in milliseconds.
        duration_ms: u64,
    },
    /// The run stopped on an error. Always the last event of a failed run.
    RunFailed {
        run_id: String,
        message: String,
        duration_ms: u64,
    },
}

impl MirrorEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            MirrorEvent::RunStarted { .. } => "Mirror run started",
            MirrorEvent::FolderSeen { .. } => "Folder seen",
            MirrorEvent::FolderExists { .. } => "Folder already exists",
            MirrorEvent::FolderCreated { .. } => "Folder created",
            MirrorEvent::FileSeen { .. } => "File seen",
            MirrorEvent::FileSkippedNonFile { .. } => "Skipping non-file",
            MirrorEvent::FileExists { .. } => "File already exists",
            MirrorEvent::FileCreated { .. } => "File created",
            MirrorEvent::ItemFailed { .. } => "Item failed",
            MirrorEvent::RunCompleted { .. } => "Mirror run completed",
            MirrorEvent::RunFailed { .. } => "Mirror run failed",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            MirrorEvent::ItemFailed { .. } | MirrorEvent::RunFailed { .. } => EventSeverity::Error,
            MirrorEvent::FolderSeen { .. } | MirrorEvent::FileSeen { .. } => EventSeverity::Debug,
            _ => EventSeverity::Info,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Sinks
// ============================================================================

/// Receiver of mirror events.
///
/// Implementations must be cheap and non-blocking; the engine calls `emit`
/// inline from its transfer tasks.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: MirrorEvent);
}

/// Broadcast channel for mirror events.
///
/// Cloning an `EventBus` yields another handle to the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MirrorEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event, returning how many subscribers received it.
    pub fn publish(&self, event: MirrorEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new subscriber that receives all future events.
    pub fn subscribe(&self) -> Receiver<MirrorEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: MirrorEvent) {
        self.publish(event);
    }
}

/// Sink that renders events as `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: MirrorEvent) {
        match &event {
            MirrorEvent::RunStarted { run_id } => {
                info!(run_id = %run_id, "Mirror run started");
            }
            MirrorEvent::FolderSeen { title } => {
                info!(folder = %title, "Syncing folder");
            }
            MirrorEvent::FolderExists { title, .. } => {
                info!(folder = %title, "Folder already exists");
            }
            MirrorEvent::FolderCreated {
                title,
                destination_id,
            } => {
                info!(folder = %title, destination_id = %destination_id, "Created folder");
            }
            MirrorEvent::FileSeen { collection, title } => {
                info!(folder = %collection, file = %title, "Syncing file");
            }
            MirrorEvent::FileSkippedNonFile {
                collection,
                title,
                resource_type,
            } => {
                info!(
                    folder = %collection,
                    file = %title,
                    resource_type = %resource_type,
                    "Skipping non-file"
                );
            }
            MirrorEvent::FileExists { collection, title, .. } => {
                info!(folder = %collection, file = %title, "File already exists");
            }
            MirrorEvent::FileCreated {
                collection,
                title,
                destination_id,
                bytes,
            } => {
                info!(
                    folder = %collection,
                    file = %title,
                    destination_id = %destination_id,
                    bytes = bytes,
                    "Created file"
                );
            }
            MirrorEvent::ItemFailed {
                collection,
                title,
                message,
            } => {
                error!(
                    folder = %collection,
                    file = title.as_deref().unwrap_or("-"),
                    error = %message,
                    "Item failed"
                );
            }
            MirrorEvent::RunCompleted {
                run_id,
                collections_created,
                files_created,
                failures,
                duration_ms,
            } => {
                info!(
                    run_id = %run_id,
                    collections_created = collections_created,
                    files_created = files_created,
                    failures = failures,
                    duration_ms = duration_ms,
                    "Mirror run completed"
                );
            }
            MirrorEvent::RunFailed {
                run_id,
                message,
                duration_ms,
            } => {
                error!(
                    run_id = %run_id,
                    error = %message,
                    duration_ms = duration_ms,
                    "Mirror run failed"
                );
            }
        }
        debug!(severity = ?event.severity(), "{}", event.description());
    }
}

/// Sink that forwards every event to each of its children in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: MirrorEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}

impl fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
