use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use tokio::time::{Sleep, sleep};
use vts_chat_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
    UserContent,
};

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the last user message word by word.
#[derive(Debug)]
struct EchoResponse {
    words: VecDeque<String>,
    sleep: Option<Pin<Box<Sleep>>>,
    completed: bool,
}

impl EchoResponse {
    fn new(input: &str) -> Self {
        let words = format!("You said {input}")
            .split(' ')
            .map(ToString::to_string)
            .collect();
        Self {
            words,
            sleep: None,
            completed: false,
        }
    }
}

impl ModelResponse for EchoResponse {
    type Error = FakeModelProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        let sleep = this
            .sleep
            .get_or_insert_with(|| Box::pin(sleep(Duration::from_millis(1))));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        if let Some(mut word) = this.words.pop_front() {
            if !this.words.is_empty() {
                word.push(' ');
            }
            return Poll::Ready(Ok(Some(ModelResponseEvent::MessageDelta(
                word,
            ))));
        }
        if !this.completed {
            this.completed = true;
            return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                ModelFinishReason::Stop,
            ))));
        }
        Poll::Ready(Ok(None))
    }
}

struct EchoProvider;

impl ModelProvider for EchoProvider {
    type Error = FakeModelProviderError;
    type Response = EchoResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let last_user = req.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::User(content) => Some(content.text.as_str()),
            _ => None,
        });
        let result = match last_user {
            None => Err(FakeModelProviderError(ErrorKind::Other)),
            Some(text) if text.contains("forbidden") => {
                Err(FakeModelProviderError(ErrorKind::Blocked))
            }
            Some(text) => Ok(EchoResponse::new(text)),
        };
        ready(result)
    }
}

fn request_with(messages: Vec<ModelMessage>) -> ModelRequest {
    ModelRequest {
        system_instruction: Some("Be brief.".to_owned()),
        messages,
        generation_config: Default::default(),
        safety_settings: Default::default(),
    }
}

mod tests {
    use std::future::poll_fn;

    use super::*;

    #[tokio::test]
    async fn test_completion() {
        let req = request_with(vec![ModelMessage::User(UserContent::text(
            "Good morning",
        ))]);
        let mut resp = EchoProvider.send_request(&req).await.unwrap();

        let mut reply = String::new();
        let mut finish_reason = None;
        while let Some(event) =
            poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx))
                .await
                .unwrap()
        {
            match event {
                ModelResponseEvent::MessageDelta(delta) => {
                    reply.push_str(&delta);
                }
                ModelResponseEvent::Completed(reason) => {
                    finish_reason = Some(reason);
                }
            }
        }

        assert_eq!(reply, "You said Good morning");
        assert_eq!(finish_reason, Some(ModelFinishReason::Stop));
        assert!(resp.make_opaque_message().is_none());
    }

    #[tokio::test]
    async fn test_error_kinds() {
        let err = EchoProvider
            .send_request(&request_with(vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);

        let req = request_with(vec![ModelMessage::User(UserContent::text(
            "something forbidden",
        ))]);
        let err = EchoProvider.send_request(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Blocked);
        assert_eq!(err.to_string(), "Blocked prompt");
    }
}
