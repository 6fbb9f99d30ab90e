use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::AUTHORIZATION;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

const USER_AGENT: &str = concat!("terracost/", env!("CARGO_PKG_VERSION"));
const FIELD_NAME: &str = "file";
const FILE_MIME: &str = "application/octet-stream";

/// One line item of estimated infrastructure cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostRecord {
    pub address: String,
    pub resource_type: String,
    pub hourly_cost: f64,
    pub monthly_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub filename: String,
    pub size: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub costing: Vec<CostRecord>,
}

/// Go servers encode empty slices and strings as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unauthorized: invalid or missing authorization key")]
    Unauthorized,
    #[error("invalid upload URL '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode response (HTTP {status}): {source}")]
    Decode {
        status: u16,
        source: serde_json::Error,
    },
}

pub struct UploadClient {
    http: Client,
}

impl std::fmt::Debug for UploadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadClient")
            .field("user_agent", &USER_AGENT)
            .finish()
    }
}

impl UploadClient {
    pub fn new() -> Result<Self, UploadError> {
        Self::from_builder(Client::builder())
    }

    pub(crate) fn from_builder(builder: ClientBuilder) -> Result<Self, UploadError> {
        let http = builder.user_agent(USER_AGENT).build()?;
        Ok(Self { http })
    }

    /// POST `file_path` as the multipart field `file` and decode the cost report.
    ///
    /// An empty `credential` sends no `Authorization` header and leaves the
    /// decision to the server.
    pub fn upload(
        &self,
        file_path: &Path,
        endpoint: &str,
        credential: &str,
    ) -> Result<UploadResult, UploadError> {
        let url = parse_endpoint(endpoint)?;
        let part = file_part(file_path)?;
        let form = Form::new().part(FIELD_NAME, part);

        let mut request = self.http.post(url).multipart(form);
        if !credential.is_empty() {
            request = request.header(AUTHORIZATION, credential);
        }

        log::debug!("uploading {} to {endpoint}", file_path.display());
        let resp = request.send()?;
        let status = resp.status();
        log::debug!("upload response: {status}");

        if status == StatusCode::UNAUTHORIZED {
            return Err(UploadError::Unauthorized);
        }
        let body = resp.text()?;
        parse_response(status.as_u16(), &body)
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, UploadError> {
    let invalid = |reason: String| UploadError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// Stream the file from disk; the handle is dropped with the request body.
fn file_part(path: &Path) -> Result<Part, UploadError> {
    let io_err = |source| UploadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    let meta = file.metadata().map_err(io_err)?;
    if !meta.is_file() {
        return Err(io_err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| FIELD_NAME.to_string());
    let part = Part::reader_with_length(file, meta.len())
        .file_name(file_name)
        .mime_str(FILE_MIME)?;
    Ok(part)
}

fn parse_response(status: u16, body: &str) -> Result<UploadResult, UploadError> {
    serde_json::from_str(body).map_err(|source| UploadError::Decode { status, source })
}
