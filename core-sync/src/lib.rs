//! # Mirror Sync Module
//!
//! One-way, idempotent, non-deleting mirror of a two-level tree (collections
//! holding files) between two storage accounts.
//!
//! ## Overview
//!
//! Every source collection gets a destination counterpart with the same
//! title, and every ordinary file inside it gets a counterpart in that
//! collection with the same title, content and metadata. Items already
//! present in the destination are left untouched; nothing is ever deleted.
//!
//! ## Components
//!
//! - **Item Matcher** (`matcher`): title equality within a scope
//! - **Transfer Planner** (`planner`): skip-or-create decisions and upload metadata
//! - **Keyed Locks** (`key_lock`): per-`(scope, title)` mutual exclusion
//! - **Mirror Engine** (`engine`): traversal, bounded fan-out, retries, events
//! - **Run Report** (`report`): per-run counts and isolated failures

pub mod config;
pub mod engine;
pub mod error;
pub mod key_lock;
pub mod matcher;
pub mod planner;
pub mod report;

pub use config::{CreateRetryPolicy, FailurePolicy, MirrorConfig};
pub use engine::MirrorEngine;
pub use error::{Result, SyncError};
pub use key_lock::KeyedLocks;
pub use matcher::{MatchKey, MatchScope};
pub use planner::{CollectionPlan, FilePlan};
pub use report::{ItemFailure, MirrorReport};
