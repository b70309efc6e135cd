//! Replayable outbound request model.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use findmypix_core::error::InvalidInputError;
use findmypix_core::{Credential, Result};

/// A fully materialized request body.
///
/// Bodies are encoded once up front so a replay sends the same bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestBody {
    content_type: String,
    bytes: Vec<u8>,
}

impl RequestBody {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBody")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A request to the backend, relative to the configured base URL.
///
/// The `retried` flag is owned by the pipeline: it is set when the request is
/// replayed after a refresh and bounds replays to one per request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<RequestBody>,
    retried: bool,
}

impl OutboundRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a header, replacing any previous value.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| InvalidInputError::Header {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| InvalidInputError::Header {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(value).map_err(|e| InvalidInputError::Payload {
            message: e.to_string(),
        })?;
        self.body = Some(RequestBody::new("application/json", bytes));
        Ok(self)
    }

    /// Use a `multipart/form-data` body with a single file part.
    pub fn multipart_file(
        mut self,
        field: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Self {
        let boundary = format!("findmypix-{}", uuid::Uuid::new_v4().simple());
        let body = encode_multipart_file(&boundary, field, file_name, content_type, bytes);
        self.body = Some(RequestBody::new(
            format!("multipart/form-data; boundary={}", boundary),
            body,
        ));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Returns true if this request is already a replay.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// Returns the replay of this request.
    pub(crate) fn into_retried(mut self) -> Self {
        self.retried = true;
        self
    }

    /// Returns true if an `Authorization` header is present.
    pub fn has_authorization(&self) -> bool {
        self.headers.contains_key(AUTHORIZATION)
    }

    /// Stamp the request with a bearer credential.
    pub(crate) fn set_bearer(&mut self, credential: &Credential) -> Result<()> {
        let mut value =
            HeaderValue::from_str(&credential.bearer_value()).map_err(|e| {
                InvalidInputError::Header {
                    name: AUTHORIZATION.to_string(),
                    reason: e.to_string(),
                }
            })?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Headers to put on the wire, including the body's content type.
    pub(crate) fn wire_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        if let Some(body) = &self.body {
            if !headers.contains_key(CONTENT_TYPE) {
                if let Ok(value) = HeaderValue::from_str(body.content_type()) {
                    headers.insert(CONTENT_TYPE, value);
                }
            }
        }
        headers
    }
}

fn encode_multipart_file(
    boundary: &str,
    field: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> Vec<u8> {
    let file_name = file_name.replace(['"', '\r', '\n'], "_");
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}
