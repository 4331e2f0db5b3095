//! Remote Storage Abstractions
//!
//! Defines the two-level remote storage model (collections holding files) and
//! the `StorageProvider` capability contract implemented once per cloud
//! account. The mirror engine only ever talks to storage through this trait.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Transport content type used when uploading file bodies.
///
/// The real type of the file travels in [`FileUploadMetadata::mime_type`].
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Kind of a remote resource.
///
/// Only [`ResourceType::File`] is transferable; everything else (folders
/// listed inside a collection, shortcuts, provider-native documents) is
/// skipped by the mirror.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    /// Ordinary binary file with downloadable content
    File,
    /// Folder / collection
    Folder,
    /// Pointer to another item
    Shortcut,
    /// Any other provider-specific kind (e.g. native documents)
    Other(String),
}

impl ResourceType {
    pub fn is_file(&self) -> bool {
        matches!(self, ResourceType::File)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::File => "file",
            ResourceType::Folder => "folder",
            ResourceType::Shortcut => "shortcut",
            ResourceType::Other(kind) => kind,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named top-level container (folder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Provider-assigned identifier
    pub id: String,
    /// Title, unique within the root scope
    pub title: String,
    /// Creation time as reported by the provider (RFC 3339, verbatim)
    pub created_time: Option<String>,
    /// Modification time as reported by the provider (RFC 3339, verbatim)
    pub modified_time: Option<String>,
    /// Free-form description
    pub description: Option<String>,
}

impl Collection {
    /// Metadata to copy when creating a counterpart of this collection.
    pub fn metadata(&self) -> CollectionMetadata {
        CollectionMetadata {
            created_time: self.created_time.clone(),
            modified_time: self.modified_time.clone(),
            description: self.description.clone(),
        }
    }
}

/// Metadata carried over when a collection is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub created_time: Option<String>,
    pub modified_time: Option<String>,
    pub description: Option<String>,
}

/// A named resource inside exactly one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    /// Provider-assigned identifier
    pub id: String,
    /// Title, the match key within its collection
    pub title: String,
    /// Resource kind; only `ResourceType::File` is transferable
    pub resource_type: ResourceType,
    pub created_time: Option<String>,
    pub modified_time: Option<String>,
    pub description: Option<String>,
    /// Real content type of the file
    pub mime_type: Option<String>,
    pub original_filename: Option<String>,
    /// Content size in bytes, when the provider reports one
    pub size: Option<u64>,
}

/// Metadata sent with a file upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUploadMetadata {
    /// Identifiers of the parent collections
    pub parents: Vec<String>,
    pub name: String,
    pub created_time: Option<String>,
    pub modified_time: Option<String>,
    pub description: Option<String>,
    pub mime_type: Option<String>,
    pub original_filename: Option<String>,
}

/// Transport options for a file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Content type of the upload envelope (not the file's own type)
    pub transport_content_type: String,
    /// Which fields of the created resource the provider should return
    pub response_fields: String,
    /// Allow the provider to address shared drives
    pub supports_all_drives: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            transport_content_type: OCTET_STREAM.to_string(),
            response_fields: "*".to_string(),
            supports_all_drives: true,
        }
    }
}

/// Remote storage provider capability contract
///
/// One implementation exists per cloud backend; the mirror uses one instance
/// for the source account and another for the destination account. Handles
/// passed in are already authenticated.
///
/// # Atomicity
///
/// `create_file` must be atomic from the caller's point of view: on success
/// the file exists with its full content. If a backend can leave a partial
/// artifact behind on failure, callers can remove it with `discard_file`.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::StorageProvider;
///
/// async fn print_tree(provider: &dyn StorageProvider) -> Result<()> {
///     for collection in provider.list_collections().await? {
///         for file in provider.list_files(&collection).await? {
///             println!("{}/{}", collection.title, file.title);
///         }
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// List every top-level collection (all pages).
    async fn list_collections(&self) -> Result<Vec<Collection>>;

    /// Find a top-level collection by exact title.
    async fn find_collection_by_title(&self, title: &str) -> Result<Option<Collection>>;

    /// Create a top-level collection.
    async fn create_collection(
        &self,
        title: &str,
        metadata: CollectionMetadata,
    ) -> Result<Collection>;

    /// List the direct members of a collection (all pages).
    async fn list_files(&self, collection: &Collection) -> Result<Vec<FileItem>>;

    /// Find a direct member of `collection` by exact title.
    async fn find_file_by_title(
        &self,
        collection: &Collection,
        title: &str,
    ) -> Result<Option<FileItem>>;

    /// Download the full content of a file.
    async fn download_content(&self, file: &FileItem) -> Result<Bytes>;

    /// Create a new file with the given metadata and content.
    async fn create_file(
        &self,
        metadata: FileUploadMetadata,
        content: Bytes,
        options: UploadOptions,
    ) -> Result<FileItem>;

    /// Remove a file left behind by a failed `create_file`.
    async fn discard_file(&self, file: &FileItem) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_sentinel() {
        assert!(ResourceType::File.is_file());
        assert!(!ResourceType::Shortcut.is_file());
        assert!(!ResourceType::Other("document".to_string()).is_file());
        assert_eq!(ResourceType::Other("spreadsheet".to_string()).to_string(), "spreadsheet");
    }

    #[test]
    fn test_collection_metadata_copies_verbatim() {
        let collection = Collection {
            id: "c1".to_string(),
            title: "Reports".to_string(),
            created_time: Some("2023-01-01T00:00:00.000Z".to_string()),
            modified_time: Some("2023-01-02T00:00:00.000Z".to_string()),
            description: Some("Quarterly".to_string()),
        };

        let metadata = collection.metadata();
        assert_eq!(metadata.created_time.as_deref(), Some("2023-01-01T00:00:00.000Z"));
        assert_eq!(metadata.modified_time.as_deref(), Some("2023-01-02T00:00:00.000Z"));
        assert_eq!(metadata.description.as_deref(), Some("Quarterly"));
    }

    #[test]
    fn test_default_upload_options() {
        let options = UploadOptions::default();
        assert_eq!(options.transport_content_type, "application/octet-stream");
        assert_eq!(options.response_fields, "*");
        assert!(options.supports_all_drives);
    }
}
