pub mod batch;

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::storage::{BlobBatch, BlobStorageTrait, SubResponse};
use crate::types::Credential;

pub const API_VERSION: &str = "2021-08-06";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_ENDPOINT_SUFFIX: &str = "blob.core.windows.net";

/// Blob service client for one storage account, speaking the Blob Batch API
/// directly over HTTP.
#[derive(Clone)]
pub struct AzureBlobStorage {
    account: String,
    endpoint: Url,
    credential: Credential,
    client: reqwest::Client,
}

impl AzureBlobStorage {
    pub fn new(account: &str, credential: Credential) -> Result<Self> {
        let endpoint = resolve_endpoint(account)?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            account: account.to_string(),
            endpoint,
            credential,
            client,
        })
    }

    /// Build a service URL under the account endpoint, appending the SAS
    /// token's query pairs when a SAS credential is configured.
    fn request_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .endpoint
            .join(path)
            .with_context(|| format!("invalid request path '{path}'"))?;

        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
            if let Credential::Sas(sas) = &self.credential {
                let token = sas.token.trim_start_matches('?');
                for (name, value) in url::form_urlencoded::parse(token.as_bytes()) {
                    pairs.append_pair(&name, &value);
                }
            }
        }

        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credential {
            Credential::Bearer(bearer) => {
                request.header("Authorization", format!("Bearer {}", bearer.token))
            }
            _ => request,
        }
    }

    async fn head(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        let url = self.request_url(path, query)?;
        let request = self
            .client
            .head(url)
            .header("x-ms-version", API_VERSION);
        self.authorize(request)
            .send()
            .await
            .context("HTTP request failed")
    }
}

#[async_trait]
impl BlobStorageTrait for AzureBlobStorage {
    fn account(&self) -> &str {
        &self.account
    }

    async fn delete_batch(&self, batch: BlobBatch) -> Result<Vec<SubResponse>> {
        let boundary = format!("batch_{}", Uuid::new_v4());
        let body = batch::render_batch_body(&batch, &boundary, &self.credential);
        let url = self.request_url("", &[("comp", "batch")])?;

        debug!(
            account = self.account,
            sub_operations = batch.len(),
            "submitting delete batch."
        );

        let request = self
            .client
            .post(url)
            .header(
                "Content-Type",
                format!("multipart/mixed; boundary={boundary}"),
            )
            .header("x-ms-version", API_VERSION)
            .body(body);
        let response = self
            .authorize(request)
            .send()
            .await
            .context("batch request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!(
                "batch request was rejected with status {}: {}",
                status,
                detail.trim()
            );
        }

        let content_type = response
            .headers()
            .get("Content-Type")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .context("batch response has no Content-Type header")?;
        let response_boundary = batch::boundary_from_content_type(&content_type)?;
        let response_body = response
            .text()
            .await
            .context("failed to read batch response body")?;

        batch::parse_batch_response(&response_body, &response_boundary)
    }

    async fn container_exists(&self, container: &str) -> Result<bool> {
        let response = self.head(container, &[("restype", "container")]).await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(anyhow!(
                "container existence check for '{container}' failed with status {status}"
            )),
        }
    }

    async fn blob_exists(&self, container: &str, blob: &str) -> Result<bool> {
        let path = format!("{container}/{}", encode_blob_path(blob));
        let response = self.head(&path, &[]).await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(anyhow!(
                "blob existence check for '{container}/{blob}' failed with status {status}"
            )),
        }
    }

    async fn create_snapshot(&self, container: &str, blob: &str) -> Result<String> {
        let path = format!("{container}/{}", encode_blob_path(blob));
        let url = self.request_url(&path, &[("comp", "snapshot")])?;

        let request = self
            .client
            .put(url)
            .header("x-ms-version", API_VERSION)
            .header("Content-Length", "0");
        let response = self
            .authorize(request)
            .send()
            .await
            .context("snapshot request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!(
                "snapshot of '{container}/{blob}' was rejected with status {}",
                status
            );
        }

        response
            .headers()
            .get("x-ms-snapshot")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .context("snapshot response has no x-ms-snapshot header")
    }
}

/// Resolve the service endpoint for an account identifier.
///
/// A value with a scheme is used verbatim, a dotted hostname gets an
/// `https://` prefix, and a bare account name is expanded to the public
/// blob endpoint of that account.
pub fn resolve_endpoint(account: &str) -> Result<Url> {
    let raw = if account.contains("://") {
        account.to_string()
    } else if account.contains('.') {
        format!("https://{account}")
    } else {
        format!("https://{account}.{DEFAULT_ENDPOINT_SUFFIX}")
    };

    let mut url =
        Url::parse(&raw).with_context(|| format!("invalid storage account '{account}'"))?;
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}

/// Percent-encode each segment of a blob path, preserving `/` separators.
pub(crate) fn encode_blob_path(blob: &str) -> String {
    blob.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
