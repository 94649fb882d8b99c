use crate::error::{Error, ErrorType, Result};
use bytes::Bytes;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use std::{fmt, sync::Arc};
use tracing::{debug, trace};

/// The maximum number of characters of a response body that's attached to an error.
const MAX_BODY_CONTEXT: usize = 4096;

/// A function that's called with every outgoing request right before it's sent.
///
/// Middlewares run in the order they were registered. The first one that returns an error aborts
/// the request and its error is returned to the caller without anything being sent.
pub type Middleware = Arc<dyn Fn(&mut reqwest::Request) -> Result<()> + Send + Sync>;

/// Creates a [Middleware] from a function.
pub fn middleware<F>(func: F) -> Middleware
where
    F: Fn(&mut reqwest::Request) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(func)
}

/// Sends request bodies to a URL and returns the raw response bodies.
#[derive(Clone)]
pub struct NetworkQueryer {
    url: String,
    middlewares: Vec<Middleware>,
    client: reqwest::Client,
}

impl fmt::Debug for NetworkQueryer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkQueryer")
            .field("url", &self.url)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

impl NetworkQueryer {
    pub fn new<S: Into<String>>(url: S) -> Self {
        NetworkQueryer {
            url: url.into(),
            middlewares: Vec::new(),
            client: reqwest::Client::new(),
        }
    }

    /// Replaces the middlewares that are applied to outgoing requests.
    pub fn with_middlewares(mut self, middlewares: Vec<Middleware>) -> Self {
        self.middlewares = middlewares;
        self
    }

    /// Replaces the HTTP client that's used to send requests.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends a JSON payload.
    pub async fn send_query<B: Into<Bytes>>(&self, payload: B) -> Result<Bytes> {
        self.send_request(payload.into(), HeaderValue::from_static("application/json"))
            .await
    }

    /// Sends a `multipart/form-data` payload as created by
    /// [`prepare_multipart`](super::prepare_multipart).
    pub async fn send_multipart<B: Into<Bytes>>(
        &self,
        payload: B,
        content_type: &str,
    ) -> Result<Bytes> {
        let content_type = HeaderValue::from_str(content_type)
            .map_err(|err| Error::transport(format!("invalid content type: {}", err)))?;
        self.send_request(payload.into(), content_type).await
    }

    async fn send_request(&self, payload: Bytes, content_type: HeaderValue) -> Result<Bytes> {
        let mut request = self
            .client
            .post(self.url.as_str())
            .header(CONTENT_TYPE, content_type)
            .body(payload)
            .build()?;

        for middleware in self.middlewares.iter() {
            middleware(&mut request)?;
        }

        debug!(url = %self.url, "sending request");
        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.bytes().await?;
        trace!(url = %self.url, status = status.as_u16(), bytes = body.len(), "received response");

        if !status.is_success() {
            return Err(Error::new_with_context(
                format!(
                    "response was not successful with status code: {}",
                    status.as_u16()
                ),
                body_context(&body),
                ErrorType::Transport {
                    status: Some(status.as_u16()),
                },
            ));
        }

        Ok(body)
    }
}

/// Returns a response body as text, truncated to a size that's reasonable to log.
pub(crate) fn body_context(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.chars().count() > MAX_BODY_CONTEXT {
        text.chars().take(MAX_BODY_CONTEXT).collect()
    } else {
        text.into_owned()
    }
}
