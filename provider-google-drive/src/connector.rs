//! Google Drive API connector implementation
//!
//! Implements the `StorageProvider` trait for Google Drive API v3.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::storage::{
    Collection, CollectionMetadata, FileItem, FileUploadMetadata, ResourceType, StorageProvider,
    UploadOptions,
};
use bytes::{BufMut, Bytes, BytesMut};
use core_auth::{AuthError, TokenSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{GoogleDriveError, RATE_LIMIT_REASONS};
use crate::types::{
    CreateFileRequest, DriveErrorResponse, DriveFile, FilesListResponse, FOLDER_MIME_TYPE,
    GOOGLE_APPS_PREFIX, SHORTCUT_MIME_TYPE,
};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Google Drive upload base URL
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Maximum results per page (Google Drive API limit)
const MAX_PAGE_SIZE: u32 = 1000;

/// Attempts for read requests before giving up
const MAX_READ_ATTEMPTS: u32 = 3;

/// Fields to request for file resources
const FILE_FIELDS: &str =
    "id,name,mimeType,size,createdTime,modifiedTime,description,originalFilename,parents,trashed";

/// Folders directly under the account root
const ROOT_FOLDERS_QUERY: &str =
    "mimeType = 'application/vnd.google-apps.folder' and 'root' in parents and trashed = false";

const API_TIMEOUT: Duration = Duration::from_secs(30);
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(300);

/// Google Drive API connector
///
/// Implements `StorageProvider` for Google Drive API v3. One connector is
/// bound to one account through its `TokenSource`.
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::GoogleDriveConnector;
/// use bridge_traits::storage::StorageProvider;
///
/// let connector = GoogleDriveConnector::new(http_client, token_source);
/// let collections = connector.list_collections().await?;
/// ```
pub struct GoogleDriveConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Access tokens for the account
    token_source: Arc<dyn TokenSource>,
}

impl GoogleDriveConnector {
    /// Create a new Google Drive connector
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `token_source` - Access tokens with the `drive` scope
    pub fn new(http_client: Arc<dyn HttpClient>, token_source: Arc<dyn TokenSource>) -> Self {
        Self {
            http_client,
            token_source,
        }
    }

    async fn access_token(&self) -> crate::Result<String> {
        self.token_source.access_token().await.map_err(|e| match e {
            AuthError::NetworkError(msg) => {
                GoogleDriveError::BridgeError(BridgeError::OperationFailed(format!(
                    "Token endpoint unreachable: {}",
                    msg
                )))
            }
            other => GoogleDriveError::AuthenticationFailed(other.to_string()),
        })
    }

    /// Map a Drive MIME type to the resource kind the mirror understands.
    fn resource_type(mime_type: &str) -> ResourceType {
        match mime_type {
            FOLDER_MIME_TYPE => ResourceType::Folder,
            SHORTCUT_MIME_TYPE => ResourceType::Shortcut,
            other => match other.strip_prefix(GOOGLE_APPS_PREFIX) {
                Some(kind) => ResourceType::Other(kind.to_string()),
                None => ResourceType::File,
            },
        }
    }

    fn convert_collection(drive_file: DriveFile) -> Collection {
        Collection {
            id: drive_file.id,
            title: drive_file.name,
            created_time: drive_file.created_time,
            modified_time: drive_file.modified_time,
            description: drive_file.description,
        }
    }

    fn convert_file(drive_file: DriveFile) -> FileItem {
        FileItem {
            resource_type: Self::resource_type(&drive_file.mime_type),
            size: drive_file.size.and_then(|s| s.parse().ok()),
            id: drive_file.id,
            title: drive_file.name,
            created_time: drive_file.created_time,
            modified_time: drive_file.modified_time,
            description: drive_file.description,
            mime_type: Some(drive_file.mime_type),
            original_filename: drive_file.original_filename,
        }
    }

    /// Quote a value for use inside a single-quoted Drive query literal.
    fn escape_query_value(value: &str) -> String {
        value.replace('\\', "\\\\").replace('\'', "\\'")
    }

    fn files_in_query(collection_id: &str) -> String {
        format!(
            "'{}' in parents and trashed = false",
            Self::escape_query_value(collection_id)
        )
    }

    fn with_title(query: &str, title: &str) -> String {
        format!("{} and name = '{}'", query, Self::escape_query_value(title))
    }

    fn list_url(query: &str, page_token: Option<&str>) -> String {
        let fields = format!("nextPageToken,incompleteSearch,files({})", FILE_FIELDS);
        let mut url = format!(
            "{}/files?q={}&pageSize={}&fields={}&supportsAllDrives=true&includeItemsFromAllDrives=true",
            DRIVE_API_BASE,
            urlencoding::encode(query),
            MAX_PAGE_SIZE,
            urlencoding::encode(&fields)
        );
        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }
        url
    }

    fn api_error(response: &HttpResponse) -> GoogleDriveError {
        if response.status == 403 {
            if let Ok(body) = serde_json::from_slice::<DriveErrorResponse>(&response.body) {
                if let Some(reason) = body.reason().filter(|r| RATE_LIMIT_REASONS.contains(r)) {
                    return GoogleDriveError::RateLimited {
                        reason: reason.to_string(),
                        message: body.error.message.clone(),
                    };
                }
            }
        }

        GoogleDriveError::ApiError {
            status_code: response.status,
            message: String::from_utf8_lossy(&response.body).trim().to_string(),
        }
    }

    fn parse<T: serde::de::DeserializeOwned>(response: &HttpResponse, what: &str) -> crate::Result<T> {
        serde_json::from_slice(&response.body)
            .map_err(|e| GoogleDriveError::ParseError(format!("Failed to parse {}: {}", what, e)))
    }

    /// Execute a GET request with retry logic
    ///
    /// Rate limiting, server errors and transient transport failures are
    /// retried with exponential backoff.
    #[instrument(skip(self), fields(url = %url))]
    async fn get_with_retry(&self, url: String, timeout: Duration) -> crate::Result<HttpResponse> {
        let mut attempt = 0;

        loop {
            let request = HttpRequest::new(HttpMethod::Get, url.clone())
                .bearer_token(self.access_token().await?)
                .timeout(timeout);

            let error: GoogleDriveError = match self
                .http_client
                .execute_with_retry(request, RetryPolicy::no_retry())
                .await
            {
                Ok(response) if response.is_success() => {
                    debug!("API request succeeded: status={}", response.status);
                    return Ok(response);
                }
                Ok(response) => {
                    let error = Self::api_error(&response);
                    if !error.is_retryable() {
                        warn!("API request failed: status={}", response.status);
                        return Err(error);
                    }
                    error
                }
                Err(e) if e.is_transient() => e.into(),
                Err(e) => return Err(e.into()),
            };

            attempt += 1;
            if attempt >= MAX_READ_ATTEMPTS {
                warn!("API request failed after {} attempts: {}", attempt, error);
                return Err(error);
            }

            let backoff_ms = 100u64 * 2u64.pow(attempt);
            warn!(
                "API request failed (attempt {}/{}): {}, retrying in {}ms",
                attempt, MAX_READ_ATTEMPTS, error, backoff_ms
            );
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }
    }

    /// Send a request exactly once. Used for writes.
    async fn send_once(&self, request: HttpRequest) -> crate::Result<HttpResponse> {
        let request = request.bearer_token(self.access_token().await?);
        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::no_retry())
            .await?;

        if response.is_success() {
            Ok(response)
        } else {
            warn!("API request failed: status={}", response.status);
            Err(Self::api_error(&response))
        }
    }

    /// Collect every page of a files.list query.
    async fn list_all(&self, query: &str) -> crate::Result<Vec<DriveFile>> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = Self::list_url(query, page_token.as_deref());
            let response = self.get_with_retry(url, API_TIMEOUT).await?;
            let page: FilesListResponse = Self::parse(&response, "files list response")?;

            if page.incomplete_search {
                warn!("Drive reported an incomplete search for query: {}", query);
            }
            files.extend(page.files);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(files)
    }

    /// Build a `multipart/related` body: JSON metadata part, then content.
    fn multipart_body(
        boundary: &str,
        metadata: &[u8],
        content_type: &str,
        content: &Bytes,
    ) -> Bytes {
        let mut body = BytesMut::with_capacity(metadata.len() + content.len() + 256);
        body.put_slice(format!("--{}\r\n", boundary).as_bytes());
        body.put_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.put_slice(metadata);
        body.put_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
        body.put_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.put_slice(content);
        body.put_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        body.freeze()
    }
}

#[async_trait]
impl StorageProvider for GoogleDriveConnector {
    #[instrument(skip(self))]
    async fn list_collections(&self) -> Result<Vec<Collection>> {
        let collections: Vec<Collection> = self
            .list_all(ROOT_FOLDERS_QUERY)
            .await?
            .into_iter()
            .map(Self::convert_collection)
            .collect();

        info!("Listed {} root folders", collections.len());
        Ok(collections)
    }

    #[instrument(skip(self))]
    async fn find_collection_by_title(&self, title: &str) -> Result<Option<Collection>> {
        let query = Self::with_title(ROOT_FOLDERS_QUERY, title);
        Ok(self
            .list_all(&query)
            .await?
            .into_iter()
            .find(|f| f.name == title)
            .map(Self::convert_collection))
    }

    #[instrument(skip(self, metadata))]
    async fn create_collection(
        &self,
        title: &str,
        metadata: CollectionMetadata,
    ) -> Result<Collection> {
        let body = CreateFileRequest {
            name: title.to_string(),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            parents: vec!["root".to_string()],
            created_time: metadata.created_time,
            modified_time: metadata.modified_time,
            description: metadata.description,
            original_filename: None,
        };
        let url = format!(
            "{}/files?fields={}&supportsAllDrives=true",
            DRIVE_API_BASE,
            urlencoding::encode(FILE_FIELDS)
        );
        let request = HttpRequest::new(HttpMethod::Post, url)
            .json(&body)?
            .timeout(API_TIMEOUT);

        let response = self.send_once(request).await?;
        let folder: DriveFile = Self::parse(&response, "created folder")?;

        info!("Created folder '{}' ({})", folder.name, folder.id);
        Ok(Self::convert_collection(folder))
    }

    #[instrument(skip(self, collection), fields(collection = %collection.title))]
    async fn list_files(&self, collection: &Collection) -> Result<Vec<FileItem>> {
        let files: Vec<FileItem> = self
            .list_all(&Self::files_in_query(&collection.id))
            .await?
            .into_iter()
            .map(Self::convert_file)
            .collect();

        info!("Listed {} items in '{}'", files.len(), collection.title);
        Ok(files)
    }

    #[instrument(skip(self, collection), fields(collection = %collection.title))]
    async fn find_file_by_title(
        &self,
        collection: &Collection,
        title: &str,
    ) -> Result<Option<FileItem>> {
        let query = Self::with_title(&Self::files_in_query(&collection.id), title);
        Ok(self
            .list_all(&query)
            .await?
            .into_iter()
            .find(|f| f.name == title)
            .map(Self::convert_file))
    }

    #[instrument(skip(self, file), fields(file_id = %file.id))]
    async fn download_content(&self, file: &FileItem) -> Result<Bytes> {
        let url = format!(
            "{}/files/{}?alt=media&supportsAllDrives=true",
            DRIVE_API_BASE,
            urlencoding::encode(&file.id)
        );

        let response = self.get_with_retry(url, TRANSFER_TIMEOUT).await?;
        debug!("Downloaded {} bytes", response.body.len());
        Ok(response.body)
    }

    #[instrument(skip(self, metadata, content, options), fields(name = %metadata.name, bytes = content.len()))]
    async fn create_file(
        &self,
        metadata: FileUploadMetadata,
        content: Bytes,
        options: UploadOptions,
    ) -> Result<FileItem> {
        let body = CreateFileRequest {
            name: metadata.name,
            mime_type: metadata.mime_type,
            parents: metadata.parents,
            created_time: metadata.created_time,
            modified_time: metadata.modified_time,
            description: metadata.description,
            original_filename: metadata.original_filename,
        };
        let metadata_json = serde_json::to_vec(&body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON serialization failed: {}", e))
        })?;

        let boundary = format!("drive-mirror-{}", Uuid::new_v4().simple());
        let mut url = format!(
            "{}/files?uploadType=multipart&fields={}",
            DRIVE_UPLOAD_BASE,
            urlencoding::encode(&options.response_fields)
        );
        if options.supports_all_drives {
            url.push_str("&supportsAllDrives=true");
        }

        let request = HttpRequest::new(HttpMethod::Post, url)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", boundary),
            )
            .body(Self::multipart_body(
                &boundary,
                &metadata_json,
                &options.transport_content_type,
                &content,
            ))
            .timeout(TRANSFER_TIMEOUT);

        let response = self.send_once(request).await?;
        let created: DriveFile = Self::parse(&response, "uploaded file")?;

        info!("Uploaded '{}' ({}, {} bytes)", created.name, created.id, content.len());
        Ok(Self::convert_file(created))
    }

    #[instrument(skip(self, file), fields(file_id = %file.id))]
    async fn discard_file(&self, file: &FileItem) -> Result<()> {
        let url = format!(
            "{}/files/{}?supportsAllDrives=true",
            DRIVE_API_BASE,
            urlencoding::encode(&file.id)
        );
        let request = HttpRequest::new(HttpMethod::Delete, url).timeout(API_TIMEOUT);

        self.send_once(request).await?;
        info!("Discarded '{}' ({})", file.title, file.id);
        Ok(())
    }
}
