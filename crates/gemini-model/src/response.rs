use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use vts_chat_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    OpaqueMessage,
};

use crate::Error;
use crate::io::Sse;
use crate::proto::{self, Content, GenerateContentChunk};

static FALLBACK_ID: AtomicU64 = AtomicU64::new(1);

struct PartialState {
    sse: Sse,
    id: Option<String>,
    content: String,
    // Set when a chunk carried a finish reason, cleared once the
    // completed event has been emitted.
    pending_finish_reason: Option<ModelFinishReason>,
    finished: bool,
}

impl PartialState {
    #[inline]
    fn finish(self) -> (String, Content) {
        let id = self.id.unwrap_or_else(|| {
            format!("gemini:{}", FALLBACK_ID.fetch_add(1, Ordering::Relaxed))
        });
        (id, proto::model_content(self.content))
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    /// A streamed `streamGenerateContent` reply.
    pub struct GeminiResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
        full_msg: Option<(String, Content)>,
    }
}

impl GeminiResponse {
    #[inline]
    pub(crate) fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            id: None,
            content: String::new(),
            pending_finish_reason: None,
            finished: false,
        };
        Self {
            next_event_fut: Some(Box::pin(next_event(partial_state))),
            full_msg: None,
        }
    }
}

impl ModelResponse for GeminiResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, partial_state)) => {
                    *this.next_event_fut = None;
                    *this.full_msg = Some(partial_state.finish());
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        *this.next_event_fut = Some(Box::pin(next_event(partial_state)));
        Poll::Ready(Ok(Some(event)))
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        self.full_msg
            .as_ref()
            .map(|(id, content)| OpaqueMessage::new(id, content.clone()))
    }
}

async fn next_event(mut partial_state: PartialState) -> NextEvent {
    // Completion is always the last event, even if the stream had more
    // data after the finish reason.
    if let Some(reason) = partial_state.pending_finish_reason.take() {
        partial_state.finished = true;
        return Ok((Some(ModelResponseEvent::Completed(reason)), partial_state));
    }
    if partial_state.finished {
        return Ok((None, partial_state));
    }

    loop {
        let sse_event = match partial_state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => return Ok((None, partial_state)),
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {sse_event}");

        let chunk = serde_json::from_str::<GenerateContentChunk>(&sse_event)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
        if partial_state.id.is_none() {
            partial_state.id = chunk.response_id.clone();
        }

        if let Some(reason) = chunk
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(Error::new(
                format!("prompt was blocked: {reason}"),
                ErrorKind::Blocked,
            ));
        }

        let Some(candidate) = chunk.candidates.into_iter().next() else {
            continue;
        };
        if let Some(reason) = candidate.finish_reason.as_deref() {
            if proto::is_blocking_finish_reason(reason) {
                return Err(Error::new(
                    format!("response was blocked: {reason}"),
                    ErrorKind::Blocked,
                ));
            }
            partial_state.pending_finish_reason = Some(match reason {
                "MAX_TOKENS" => ModelFinishReason::MaxTokens,
                _ => ModelFinishReason::Stop,
            });
        }

        let text = candidate.text();
        if !text.is_empty() {
            partial_state.content.push_str(&text);
            return Ok((
                Some(ModelResponseEvent::MessageDelta(text)),
                partial_state,
            ));
        }
        if let Some(reason) = partial_state.pending_finish_reason.take() {
            partial_state.finished = true;
            return Ok((
                Some(ModelResponseEvent::Completed(reason)),
                partial_state,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use vts_chat_model::ModelProviderError;

    use super::*;
    use crate::io::Chunks;

    async fn collect(
        fixture: &'static [u8],
    ) -> (Result<Vec<ModelResponseEvent>, Error>, Option<OpaqueMessage>) {
        let chunks =
            Chunks::from_vec_deque(vec![Bytes::from_static(fixture)].into());
        let mut resp = pin!(GeminiResponse::from_sse(Sse::new(chunks)));
        let mut events = vec![];
        loop {
            match poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) => break,
                Err(err) => return (Err(err), resp.make_opaque_message()),
            }
        }
        (Ok(events), resp.make_opaque_message())
    }

    #[tokio::test]
    async fn test_simple_events() {
        let (events, opaque) =
            collect(include_bytes!("../fixtures/stream_response.txt")).await;
        assert_eq!(
            events.unwrap(),
            vec![
                ModelResponseEvent::MessageDelta("The capital".to_owned()),
                ModelResponseEvent::MessageDelta(
                    " of Vietnam is Hanoi.".to_owned()
                ),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
        let opaque = opaque.unwrap();
        assert_eq!(opaque.id(), "resp-42");
        let content: &Content = opaque.to_raw().unwrap();
        assert_eq!(
            content,
            &proto::model_content(
                "The capital of Vietnam is Hanoi.".to_owned()
            )
        );
    }

    #[tokio::test]
    async fn test_max_tokens() {
        let (events, _) = collect(
            b"data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"Hel\"}], \"role\": \"model\"}, \"finishReason\": \"MAX_TOKENS\"}]}\r\n\r\n",
        )
        .await;
        assert_eq!(
            events.unwrap(),
            vec![
                ModelResponseEvent::MessageDelta("Hel".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::MaxTokens),
            ]
        );
    }

    #[tokio::test]
    async fn test_blocked_prompt() {
        let (events, opaque) =
            collect(include_bytes!("../fixtures/blocked_prompt.txt")).await;
        let err = events.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Blocked);
        assert!(err.message().contains("SAFETY"));
        assert!(opaque.is_none());
    }

    #[tokio::test]
    async fn test_blocked_candidate() {
        let (events, _) = collect(
            b"data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"Sure\"}]}}]}\n\ndata: {\"candidates\": [{\"finishReason\": \"SAFETY\"}]}\n\n",
        )
        .await;
        assert_eq!(events.unwrap_err().kind(), ErrorKind::Blocked);
    }

    #[tokio::test]
    async fn test_malformed_chunk() {
        let (events, _) = collect(b"data: {not json}\n\n").await;
        assert_eq!(events.unwrap_err().kind(), ErrorKind::Other);
    }
}
