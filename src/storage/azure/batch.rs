//! Wire codec for the Blob Batch API: renders the `multipart/mixed` request
//! body and parses the multipart response into per-operation sub-responses.

use anyhow::{Context, Result, anyhow};

use crate::storage::{BlobBatch, SubResponse};
use crate::types::Credential;

use super::{API_VERSION, encode_blob_path};

const CRLF: &str = "\r\n";

/// Render the multipart request body for a batch of deletes.
///
/// Each sub-request is an `application/http` part carrying a positional
/// `Content-ID`. Blob path segments are percent-encoded; a SAS credential is
/// appended to each sub-request URL and a bearer credential becomes a
/// per-sub-request `Authorization` header.
pub fn render_batch_body(batch: &BlobBatch, boundary: &str, credential: &Credential) -> String {
    let mut body = String::new();

    for (content_id, op) in batch.ops().iter().enumerate() {
        body.push_str(&format!("--{boundary}{CRLF}"));
        body.push_str(&format!("Content-Type: application/http{CRLF}"));
        body.push_str(&format!("Content-Transfer-Encoding: binary{CRLF}"));
        body.push_str(&format!("Content-ID: {content_id}{CRLF}"));
        body.push_str(CRLF);

        let path = format!("/{}/{}", op.container, encode_blob_path(&op.blob));
        let query = match credential {
            Credential::Sas(sas) => {
                let token = sas.token.trim_start_matches('?');
                format!("?{token}")
            }
            _ => String::new(),
        };

        body.push_str(&format!("DELETE {path}{query} HTTP/1.1{CRLF}"));
        body.push_str(&format!("x-ms-version: {API_VERSION}{CRLF}"));
        body.push_str(&format!("x-ms-delete-snapshots: include{CRLF}"));
        if let Credential::Bearer(bearer) = credential {
            body.push_str(&format!("Authorization: Bearer {}{CRLF}", bearer.token));
        }
        body.push_str(&format!("Content-Length: 0{CRLF}"));
        body.push_str(CRLF);
    }

    body.push_str(&format!("--{boundary}--{CRLF}"));
    body
}

/// Extract the multipart boundary from a response `Content-Type` header.
pub fn boundary_from_content_type(content_type: &str) -> Result<String> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("boundary="))
        .map(|boundary| boundary.trim_matches('"').to_string())
        .with_context(|| format!("no boundary in response Content-Type '{content_type}'"))
}

/// Parse a multipart batch response body into sub-responses, in the order
/// the service returned them.
pub fn parse_batch_response(body: &str, boundary: &str) -> Result<Vec<SubResponse>> {
    let delimiter = format!("--{boundary}");
    let mut sub_responses = Vec::new();

    for part in body.split(delimiter.as_str()).skip(1) {
        let part = part.trim_start_matches(['\r', '\n']);
        if part.starts_with("--") || part.trim().is_empty() {
            // Closing delimiter.
            continue;
        }
        sub_responses.push(parse_sub_response(part)?);
    }

    if sub_responses.is_empty() {
        return Err(anyhow!("batch response contained no sub-responses"));
    }

    Ok(sub_responses)
}

fn parse_sub_response(part: &str) -> Result<SubResponse> {
    let mut status: Option<u16> = None;
    let mut error_code: Option<String> = None;

    for line in part.lines() {
        let line = line.trim();
        if status.is_none() {
            if let Some(rest) = line.strip_prefix("HTTP/1.1 ") {
                let code = rest
                    .split_whitespace()
                    .next()
                    .with_context(|| format!("malformed status line '{line}'"))?;
                status = Some(
                    code.parse::<u16>()
                        .with_context(|| format!("invalid status code '{code}'"))?,
                );
            }
            continue;
        }
        if line.is_empty() {
            // End of the sub-response headers.
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("x-ms-error-code") {
                error_code = Some(value.trim().to_string());
            }
        }
    }

    let status = status.context("sub-response is missing an HTTP status line")?;
    Ok(SubResponse { status, error_code })
}
