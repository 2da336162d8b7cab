use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tracing::Instrument;
use vts_chat_model::{
    ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
    ModelResponseEvent, OpaqueMessage,
};

type ProviderError = Box<dyn ModelProviderError>;
type SendRequestResult = Result<ModelClientResponse, ProviderError>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a model provider that provides a type-erased
/// interface for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    /// Wraps `provider`.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("sending {} messages", req.messages.len());
                    match fut.await {
                        Ok(resp) => Ok(ModelClientResponse {
                            inner: Box::pin(resp),
                        }),
                        Err(err) => {
                            error!("request failed: {err}");
                            Err(Box::new(err) as ProviderError)
                        }
                    }
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and returns the response once the provider
    /// accepted it. The reply is pulled from the returned value.
    #[inline]
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        (self.handler_fn)(req).await
    }
}

/// A response whose events have not been received yet.
pub struct ModelClientResponse {
    inner: Pin<Box<dyn ErasedResponse>>,
}

impl ModelClientResponse {
    /// Waits for the next event. `Ok(None)` means the response has
    /// completed.
    pub async fn next_event(
        &mut self,
    ) -> Result<Option<ModelResponseEvent>, ProviderError> {
        let event = poll_fn(|cx| self.inner.as_mut().poll_next_event(cx)).await;
        if let Ok(Some(event)) = &event {
            trace!("got an event: {event:?}");
        }
        event
    }

    /// The assistant message to keep in the history, available once
    /// all events were received.
    #[inline]
    pub fn opaque_message(&self) -> Option<OpaqueMessage> {
        self.inner.make_opaque_message()
    }
}

trait ErasedResponse: Send {
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, ProviderError>>;

    fn make_opaque_message(&self) -> Option<OpaqueMessage>;
}

impl<R: ModelResponse> ErasedResponse for R {
    #[inline]
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, ProviderError>> {
        ModelResponse::poll_next_event(self, cx)
            .map_err(|err| Box::new(err) as ProviderError)
    }

    #[inline]
    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        ModelResponse::make_opaque_message(self)
    }
}

#[cfg(test)]
mod tests {
    use vts_chat_model::{ErrorKind, ModelMessage, UserContent};
    use vts_chat_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    fn request() -> ModelRequest {
        ModelRequest {
            system_instruction: None,
            messages: vec![ModelMessage::User(UserContent::text("Hi"))],
            generation_config: Default::default(),
            safety_settings: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let model_client = ModelClient::new(TestModelProvider::single_turn(
            PresetResponse::with_fragments(["How ", "are ", "you?"]),
        ));

        for _ in 0..3 {
            let mut resp = model_client.send_request(request()).await.unwrap();
            let mut transcript = String::new();
            while let Some(event) = resp.next_event().await.unwrap() {
                if let ModelResponseEvent::MessageDelta(delta) = event {
                    transcript.push_str(&delta);
                }
            }
            assert_eq!(transcript, "How are you?");
            assert!(resp.opaque_message().is_some());
        }
    }

    #[tokio::test]
    async fn test_error_handling() {
        let model_client = ModelClient::new(TestModelProvider::default());
        let err = model_client.send_request(request()).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }
}
