//! # Transfer Planner
//!
//! Pure decisions: given a source item and what the matcher found in the
//! destination, decide whether to skip or create, and build the metadata a
//! creation carries. No I/O happens here.

use bridge_traits::{
    Collection, CollectionMetadata, FileItem, FileUploadMetadata, ResourceType, UploadOptions,
};

/// Decision for one source collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionPlan {
    /// The destination already has it; leave it untouched.
    SkipExisting(Collection),
    /// Create it with this metadata.
    Create {
        title: String,
        metadata: CollectionMetadata,
    },
}

/// Decision for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePlan {
    /// Not an ordinary file; never transferred.
    SkipNonFile(ResourceType),
    /// The destination collection already has it; leave it untouched.
    SkipExisting(FileItem),
    /// Download the content and upload it with this metadata.
    Create(FileUploadMetadata),
}

pub fn plan_collection(source: &Collection, existing: Option<Collection>) -> CollectionPlan {
    match existing {
        Some(found) => CollectionPlan::SkipExisting(found),
        None => CollectionPlan::Create {
            title: source.title.clone(),
            metadata: source.metadata(),
        },
    }
}

/// Whether a source item can be transferred at all.
pub fn is_transferable(source: &FileItem) -> bool {
    source.resource_type.is_file()
}

pub fn plan_file(
    source: &FileItem,
    destination_collection: &Collection,
    existing: Option<FileItem>,
) -> FilePlan {
    if !is_transferable(source) {
        return FilePlan::SkipNonFile(source.resource_type.clone());
    }
    match existing {
        Some(found) => FilePlan::SkipExisting(found),
        None => FilePlan::Create(upload_metadata(source, destination_collection)),
    }
}

/// Metadata for the destination copy of `source`, parented under
/// `destination_collection`. Every field is copied verbatim.
pub fn upload_metadata(source: &FileItem, destination_collection: &Collection) -> FileUploadMetadata {
    FileUploadMetadata {
        parents: vec![destination_collection.id.clone()],
        name: source.title.clone(),
        created_time: source.created_time.clone(),
        modified_time: source.modified_time.clone(),
        description: source.description.clone(),
        mime_type: source.mime_type.clone(),
        original_filename: source.original_filename.clone(),
    }
}

/// Upload transport options: opaque octet stream, all response fields,
/// shared drives addressable.
pub fn upload_options() -> UploadOptions {
    UploadOptions::default()
}
