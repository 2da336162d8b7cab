//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use tokio::time::{Sleep, sleep};
use vts_chat_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent, OpaqueMessage,
};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    response: PresetResponse,
    step_idx: usize,
    delay: Duration,
    event_idx: usize,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        let delay = this.delay;
        let sleep = this
            .sleep
            .get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        if this.response.blocked {
            return Poll::Ready(Err(Error {
                message: "prompt was blocked",
                kind: ErrorKind::Blocked,
            }));
        }

        let events = &this.response.events;
        let event = match events.get(this.event_idx) {
            Some(PresetEvent::MessageDelta(delta)) => {
                ModelResponseEvent::MessageDelta(delta.clone())
            }
            None if this.event_idx == events.len() => {
                ModelResponseEvent::Completed(ModelFinishReason::Stop)
            }
            // In case this method is called after completion.
            None => return Poll::Ready(Ok(None)),
        };
        this.event_idx += 1;
        Poll::Ready(Ok(Some(event)))
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        let id = format!("msg:{}", self.step_idx);
        Some(OpaqueMessage::new(id, self.response.text()))
    }
}

#[derive(Clone)]
enum ConversationStep {
    UserInput,
    AssistantResponse(PresetResponse),
}

#[derive(Default)]
struct Journal {
    requests: Vec<ModelRequest>,
    // Attempts made per script step.
    attempts: Vec<u64>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the conversation script, which
/// is how the model should respond to a request. The added steps will be
/// selected according to the history messages in your request. If there are no
/// enough steps in the script, an error will be returned.
///
/// Every request is recorded and can be inspected with
/// [`TestModelProvider::requests`]; clones share the same record.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    conversation_script: Vec<ConversationStep>,
    delay: Option<Duration>,
    journal: Arc<Mutex<Journal>>,
}

impl TestModelProvider {
    /// Creates a provider answering a single user turn with `response`.
    pub fn single_turn(response: PresetResponse) -> Self {
        let mut provider = Self::default();
        provider.add_user_input_step();
        provider.add_assistant_response_step(response);
        provider
    }

    #[inline]
    pub fn add_assistant_response_step(&mut self, preset: PresetResponse) {
        self.conversation_script
            .push(ConversationStep::AssistantResponse(preset));
    }

    #[inline]
    pub fn add_user_input_step(&mut self) {
        self.conversation_script.push(ConversationStep::UserInput);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.journal
            .lock()
            .map(|journal| journal.requests.clone())
            .unwrap_or_default()
    }

    fn prepare_response(
        &self,
        req: &ModelRequest,
    ) -> Result<TestModelResponse, Error> {
        let Ok(mut journal) = self.journal.lock() else {
            return Err(Error {
                message: "journal poisoned",
                kind: ErrorKind::Other,
            });
        };
        journal.requests.push(req.clone());

        let step_idx = req.messages.len();
        let response = match self.conversation_script.get(step_idx) {
            None => {
                return Err(Error {
                    message: "no enough steps",
                    kind: ErrorKind::RateLimitExceeded,
                });
            }
            Some(ConversationStep::UserInput) => {
                return Err(Error {
                    message: "not an assistant response step",
                    kind: ErrorKind::Other,
                });
            }
            Some(ConversationStep::AssistantResponse(response)) => response,
        };

        if journal.attempts.len() <= step_idx {
            journal.attempts.resize(step_idx + 1, 0);
        }
        journal.attempts[step_idx] += 1;
        let attempt = journal.attempts[step_idx];
        if let Some(failures) = response.failures {
            if failures == 0 || attempt <= failures {
                return Err(Error {
                    message: "scripted failure",
                    kind: ErrorKind::Other,
                });
            }
        }

        Ok(TestModelResponse {
            response: response.clone(),
            step_idx,
            delay: self.delay.unwrap_or(Duration::from_millis(1)),
            event_idx: 0,
            sleep: None,
        })
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        ready(self.prepare_response(req))
    }
}
