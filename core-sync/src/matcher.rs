//! # Item Matcher
//!
//! Decides whether a source item already has a counterpart in the
//! destination. Identity is title equality within a scope: the destination
//! root for collections, the counterpart collection for files.
//!
//! Provider lookups are treated as candidates only; the matcher re-checks
//! exact title equality so a backend with looser query semantics (case or
//! whitespace folding) can never cause a false match.

use bridge_traits::{BridgeError, Collection, FileItem, StorageProvider};
use std::fmt;

/// Where a title is looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchScope {
    /// Top level of the destination account
    Root,
    /// Direct members of one destination collection
    Collection { id: String, title: String },
}

impl MatchScope {
    pub fn collection(collection: &Collection) -> Self {
        MatchScope::Collection {
            id: collection.id.clone(),
            title: collection.title.clone(),
        }
    }
}

impl fmt::Display for MatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchScope::Root => f.write_str("root"),
            MatchScope::Collection { title, .. } => write!(f, "collection '{}'", title),
        }
    }
}

/// The `(scope, title)` identity of a destination item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey {
    pub scope: MatchScope,
    pub title: String,
}

impl MatchKey {
    pub fn root(title: impl Into<String>) -> Self {
        Self {
            scope: MatchScope::Root,
            title: title.into(),
        }
    }

    pub fn in_collection(collection: &Collection, title: impl Into<String>) -> Self {
        Self {
            scope: MatchScope::collection(collection),
            title: title.into(),
        }
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope, self.title)
    }
}

/// Find the destination collection matching `title` at root scope.
pub async fn find_collection(
    destination: &dyn StorageProvider,
    title: &str,
) -> Result<Option<Collection>, BridgeError> {
    let candidate = destination.find_collection_by_title(title).await?;
    Ok(candidate.filter(|c| c.title == title))
}

/// Find the file matching `title` among the direct members of `collection`.
pub async fn find_file(
    destination: &dyn StorageProvider,
    collection: &Collection,
    title: &str,
) -> Result<Option<FileItem>, BridgeError> {
    let candidate = destination.find_file_by_title(collection, title).await?;
    Ok(candidate.filter(|f| f.title == title))
}
