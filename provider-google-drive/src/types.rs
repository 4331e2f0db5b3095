//! Google Drive API request and response types
//!
//! Data structures for the Google Drive API v3 `files` resource.

use serde::{Deserialize, Serialize};

/// MIME type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// MIME type Drive uses for shortcuts
pub const SHORTCUT_MIME_TYPE: &str = "application/vnd.google-apps.shortcut";

/// Prefix shared by Drive-native types (Docs, Sheets, ...)
pub const GOOGLE_APPS_PREFIX: &str = "application/vnd.google-apps.";

/// Google Drive API file resource
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID
    pub id: String,

    /// File name
    pub name: String,

    /// MIME type
    pub mime_type: String,

    /// File size in bytes (omitted for folders and native documents)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Creation time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,

    /// Modification time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,

    /// Parent folder IDs
    #[serde(default)]
    pub parents: Vec<String>,

    /// Whether file is trashed
    #[serde(default)]
    pub trashed: bool,
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    /// List of files
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for next page
    #[serde(default)]
    pub next_page_token: Option<String>,

    /// Whether the result may be missing items from some drives
    #[serde(default)]
    pub incomplete_search: bool,
}

/// Metadata body of a files.create request.
///
/// Used for folders (JSON body) and as the metadata part of multipart uploads.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
}

/// Error envelope returned with non-success statuses
///
/// See: https://developers.google.com/drive/api/guides/handle-errors
#[derive(Debug, Default, Deserialize)]
pub struct DriveErrorResponse {
    #[serde(default)]
    pub error: DriveErrorBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct DriveErrorBody {
    #[serde(default)]
    pub code: u16,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub errors: Vec<DriveErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DriveErrorDetail {
    /// Machine-readable cause, e.g. `userRateLimitExceeded`
    #[serde(default)]
    pub reason: String,

    #[serde(default)]
    pub message: String,
}

impl DriveErrorResponse {
    /// First reason reported, if any.
    pub fn reason(&self) -> Option<&str> {
        self.error
            .errors
            .iter()
            .map(|detail| detail.reason.as_str())
            .find(|reason| !reason.is_empty())
    }
}
