//! HTTP transport implementation using reqwest.
//!
//! Resolves request paths against the configured API root, encodes JSON and
//! multipart bodies, and reports every response as-is whatever its status.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use shortlet_application::ports::{HttpTransport, TransportError};
use shortlet_domain::{ApiRequest, ApiResponse, FormPart, FormValue, HttpMethod, RequestBody};
use tracing::trace;
use url::Url;

use crate::config::ClientConfig;

/// `HttpTransport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self {
            timeout: config.request_timeout,
            ..Self::with_client(client, config.base_url.clone())
        })
    }

    /// Creates a transport around an existing client, without a timeout.
    #[must_use]
    pub const fn with_client(client: Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            timeout: None,
        }
    }

    /// Appends `path` to the API root and encodes `query`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the result does not parse.
    pub fn endpoint(&self, path: &str, query: &[(String, String)]) -> Result<Url, TransportError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{base}/{path}"))
            .map_err(|e| TransportError::InvalidUrl(format!("{e}: {path}")))?;

        if !query.is_empty() {
            let encoded = serde_urlencoded::to_string(query)
                .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
            url.set_query(Some(&encoded));
        }
        Ok(url)
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn prepare(&self, request: &ApiRequest) -> Result<RequestBuilder, TransportError> {
        let url = self.endpoint(&request.path, &request.query)?;
        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        Self::build_body(builder, &request.body)
    }

    fn build_body(
        builder: RequestBuilder,
        body: &RequestBody,
    ) -> Result<RequestBuilder, TransportError> {
        match body {
            RequestBody::Empty => Ok(builder),
            RequestBody::Json(value) => Ok(builder.json(value)),
            RequestBody::Multipart(parts) => Ok(builder.multipart(Self::build_form(parts)?)),
        }
    }

    /// Builds a multipart form; file parts without an explicit content type
    /// get one guessed from the file name.
    fn build_form(parts: &[FormPart]) -> Result<Form, TransportError> {
        let mut form = Form::new();

        for part in parts {
            form = match &part.value {
                FormValue::Text(value) => form.text(part.name.clone(), value.clone()),
                FormValue::File {
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let mime_type = content_type.clone().unwrap_or_else(|| {
                        mime_guess::from_path(file_name)
                            .first()
                            .unwrap_or(mime::APPLICATION_OCTET_STREAM)
                            .to_string()
                    });
                    let file = Part::bytes(bytes.clone())
                        .file_name(file_name.clone())
                        .mime_str(&mime_type)
                        .map_err(|e| {
                            TransportError::InvalidBody(format!("invalid MIME type: {e}"))
                        })?;
                    form.part(part.name.clone(), file)
                }
            };
        }

        Ok(form)
    }

    fn map_error(&self, error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            let timeout_ms = self
                .timeout
                .map_or(0, |t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
            return TransportError::Timeout { timeout_ms };
        }
        if error.is_connect() {
            return TransportError::ConnectionFailed(error.to_string());
        }
        if error.is_builder() {
            return TransportError::InvalidBody(error.to_string());
        }
        TransportError::Other(error.to_string())
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send {
        let prepared = self.prepare(request);
        let id = request.id;
        let method = request.method;
        let path = request.path.clone();

        async move {
            let builder = prepared?;
            let start = Instant::now();

            let response = builder.send().await.map_err(|e| self.map_error(&e))?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Other(format!("failed to read body: {e}")))?;

            let mut api_response = ApiResponse::new(status, body.to_vec());
            api_response.duration = start.elapsed();
            trace!(request_id = %id, %method, %path, status, bytes = body.len(), "exchange complete");
            Ok(api_response)
        }
    }
}
