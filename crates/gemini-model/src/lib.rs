//! A model provider for the Gemini `streamGenerateContent` API.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use reqwest::{Client, Response, StatusCode, header};
use vts_chat_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};

pub use config::{GeminiConfig, GeminiConfigBuilder};
use io::{Chunks, Sse};
pub use response::GeminiResponse;

/// Error type for [`GeminiProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Gemini model provider.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` with the given configuration.
    #[inline]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ModelProvider for GeminiProvider {
    type Error = Error;
    type Response = GeminiResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let body = proto::create_request(req);
        let resp_fut = self
            .client
            .post(self.config.stream_url())
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.config.api_key)
            .header(header::ACCEPT, "text/event-stream")
            .json(&body)
            .send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::Other)
            })?;
            let resp = check_status(resp).await?;

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype().as_str() == "event-stream")
                .unwrap_or(false);
            if !is_event_stream {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            debug!("response stream opened");
            let sse = Sse::new(Chunks::from_response(resp));
            Ok(GeminiResponse::from_sse(sse))
        }
    }
}

async fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<proto::ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);
    warn!("request failed with {status}: {message}");
    Err(status_error(status, message))
}

fn status_error(status: StatusCode, message: String) -> Error {
    let kind = if status == StatusCode::TOO_MANY_REQUESTS {
        ErrorKind::RateLimitExceeded
    } else {
        ErrorKind::Other
    };
    Error::new(format!("{status}: {message}"), kind)
}
