use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::batch::{self, BatchPart, PartResponse};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const DOWNLOAD_URL_PREFIX: &str = "https://drive.google.com/uc?export=download&id=";
const FILE_FIELDS: &str = "id,name,mimeType,trashed";
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType)";

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Upper bound on sub-requests in one batch call.
/// See <https://developers.google.com/drive/api/guides/performance#batch-requests>.
pub const MAX_BATCH_REQUESTS: usize = 100;

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("invalid json payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed batch response: {0}")]
    Batch(String),
    #[error("batch of {0} requests exceeds the limit of {MAX_BATCH_REQUESTS}")]
    BatchTooLarge(usize),
}

#[derive(Clone)]
pub struct DriveClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl DriveClient {
    pub fn new(token: impl Into<String>) -> Result<Self, DriveError> {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: &str, token: impl Into<String>) -> Result<Self, DriveError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
            token: token.into(),
        })
    }

    pub async fn get_file(&self, file_id: &str) -> Result<DriveFile, DriveError> {
        let mut url = self.file_endpoint(&[file_id])?;
        url.query_pairs_mut().append_pair("fields", FILE_FIELDS);
        let response = self
            .http
            .get(url)
            .header("Authorization", self.auth_header_value())
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// One page of the non-trashed direct children of `folder_id`.
    pub async fn list_children(
        &self,
        folder_id: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<FileList, DriveError> {
        let mut url = self.endpoint("/drive/v3/files")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("q", &children_query(folder_id));
            query.append_pair("pageSize", &page_size.max(1).to_string());
            query.append_pair("fields", LIST_FIELDS);
            if let Some(token) = page_token.filter(|t| !t.is_empty()) {
                query.append_pair("pageToken", token);
            }
        }
        let response = self
            .http
            .get(url)
            .header("Authorization", self.auth_header_value())
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn list_children_all(
        &self,
        folder_id: &str,
        page_size: u32,
    ) -> Result<Vec<DriveFile>, DriveError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .list_children(folder_id, page_size, page_token.as_deref())
                .await?;
            tracing::debug!(
                folder_id,
                files = page.files.len(),
                more = page.next_page_token.is_some(),
                "listed children page"
            );
            items.extend(page.files);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(items)
    }

    /// Creates `permission` on every id in one batch round trip.
    ///
    /// Results come back in the order of `file_ids`. A failed sub-request does not fail the
    /// call; it shows up as an `Err` entry so callers can decide how to react.
    pub async fn create_permissions_batch(
        &self,
        file_ids: &[&str],
        permission: &Permission,
    ) -> Result<Vec<Result<Permission, BatchItemError>>, DriveError> {
        if file_ids.is_empty() {
            return Ok(Vec::new());
        }
        if file_ids.len() > MAX_BATCH_REQUESTS {
            return Err(DriveError::BatchTooLarge(file_ids.len()));
        }

        let body = serde_json::to_string(permission)?;
        let parts = file_ids
            .iter()
            .map(|id| {
                Ok(BatchPart {
                    method: "POST",
                    path: self.permissions_path(id)?,
                    body: body.clone(),
                })
            })
            .collect::<Result<Vec<_>, DriveError>>()?;
        tracing::debug!(items = parts.len(), "sending permission batch");

        let url = self.endpoint("/batch/drive/v3")?;
        let response = self
            .http
            .post(url)
            .header("Authorization", self.auth_header_value())
            .header(
                CONTENT_TYPE,
                format!("multipart/mixed; boundary={}", batch::REQUEST_BOUNDARY),
            )
            .body(batch::encode_request(&parts, batch::REQUEST_BOUNDARY))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::Api { status, body });
        }
        let boundary = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(batch::boundary_from_content_type)
            .ok_or_else(|| DriveError::Batch("response has no multipart boundary".to_string()))?;
        let text = response.text().await?;
        let parts = batch::decode_response(&text, &boundary).map_err(DriveError::Batch)?;

        let results = collect_batch_results(parts, file_ids.len())?;
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            tracing::warn!(items = results.len(), failed, "permission batch had failures");
        } else {
            tracing::debug!(items = results.len(), "permission batch answered");
        }
        Ok(results)
    }

    fn auth_header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn endpoint(&self, path: &str) -> Result<Url, DriveError> {
        Ok(self.base_url.join(path)?)
    }

    fn file_endpoint(&self, segments: &[&str]) -> Result<Url, DriveError> {
        let mut url = self.endpoint("/drive/v3/files")?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .extend(segments);
        Ok(url)
    }

    // Sub-request paths use path-segment encoding, same as the direct endpoints.
    fn permissions_path(&self, file_id: &str) -> Result<String, DriveError> {
        Ok(self
            .file_endpoint(&[file_id, "permissions"])?
            .path()
            .to_string())
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DriveError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(DriveError::Api { status, body })
        }
    }
}

fn children_query(folder_id: &str) -> String {
    let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}' in parents and trashed=false")
}

fn collect_batch_results(
    parts: Vec<PartResponse>,
    expected: usize,
) -> Result<Vec<Result<Permission, BatchItemError>>, DriveError> {
    let mut slots: Vec<Option<Result<Permission, BatchItemError>>> =
        (0..expected).map(|_| None).collect();
    for (position, part) in parts.into_iter().enumerate() {
        let index = part.index.unwrap_or(position);
        let slot = slots
            .get_mut(index)
            .ok_or_else(|| DriveError::Batch(format!("response for unknown item {index}")))?;
        *slot = Some(part_result(part)?);
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| DriveError::Batch(format!("missing response for item {index}")))
        })
        .collect()
}

fn part_result(part: PartResponse) -> Result<Result<Permission, BatchItemError>, DriveError> {
    if (200..300).contains(&part.status) {
        return Ok(Ok(serde_json::from_str(&part.body)?));
    }
    let message = serde_json::from_str::<ErrorEnvelope>(&part.body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(part.body);
    Ok(Err(BatchItemError {
        status: part.status,
        message,
    }))
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub trashed: bool,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// Direct download link for a file id. Only usable once the file is publicly readable.
pub fn download_url(file_id: &str) -> String {
    format!("{DOWNLOAD_URL_PREFIX}{file_id}")
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Permission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub grantee: GranteeType,
    pub role: PermissionRole,
}

impl Permission {
    /// "Anyone with the link can view."
    pub fn anyone_reader() -> Self {
        Self {
            id: None,
            grantee: GranteeType::Anyone,
            role: PermissionRole::Reader,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GranteeType {
    User,
    Group,
    Domain,
    Anyone,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PermissionRole {
    Owner,
    Organizer,
    FileOrganizer,
    Writer,
    Commenter,
    Reader,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct BatchItemError {
    pub status: u16,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
