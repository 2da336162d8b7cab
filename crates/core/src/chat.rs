//! The conversation with the hosted model.

use async_trait::async_trait;
use vts_chat_model::{
    GenerationConfig, ModelFinishReason, ModelMessage, ModelRequest,
    ModelResponseEvent, SafetySettings, UserContent,
};

use crate::error::Error;
use crate::model_client::{ModelClient, ModelClientResponse};

/// The history the model has seen so far.
///
/// There is exactly one of these per [`ChatSession`]; resetting the
/// session replaces it with a new one that carries a new id.
#[derive(Clone, Debug, Default)]
pub struct RemoteConversation {
    id: u64,
    history: Vec<ModelMessage>,
}

impl RemoteConversation {
    /// Identifies this conversation within its session.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Messages of every completed exchange, oldest first.
    #[inline]
    pub fn history(&self) -> &[ModelMessage] {
        &self.history
    }
}

/// A sequence of reply fragments that is consumed once.
#[async_trait]
pub trait Fragments: Send {
    /// Returns the next fragment, or `None` once the reply is complete.
    async fn next_fragment(&mut self) -> Option<Result<String, Error>>;
}

/// Talks to the model, one exchange at a time.
pub struct ChatSession {
    model_client: ModelClient,
    system_instruction: Option<String>,
    conversation: RemoteConversation,
}

impl ChatSession {
    /// Starts a session with an empty remote conversation.
    pub fn new(
        model_client: ModelClient,
        system_instruction: Option<String>,
    ) -> Self {
        Self {
            model_client,
            system_instruction,
            conversation: RemoteConversation::default(),
        }
    }

    /// The live remote conversation.
    #[inline]
    pub fn conversation(&self) -> &RemoteConversation {
        &self.conversation
    }

    /// Discards the remote conversation and starts a new one.
    pub fn reset(&mut self) {
        let id = self.conversation.id + 1;
        debug!("replacing conversation {} with {id}", self.conversation.id);
        self.conversation = RemoteConversation {
            id,
            history: Vec::new(),
        };
    }

    /// Sends a user turn and returns its reply as a stream of fragments.
    ///
    /// The exchange is recorded in the remote conversation only when the
    /// returned stream has been read to the end without an error. A
    /// blocked or failed send leaves the conversation as it was.
    pub async fn send(
        &mut self,
        content: UserContent,
        generation_config: &GenerationConfig,
        safety_settings: &SafetySettings,
    ) -> Result<ReplyStream<'_>, Error> {
        let user_msg = ModelMessage::User(content);
        let mut messages = self.conversation.history.clone();
        messages.push(user_msg.clone());
        let request = ModelRequest {
            system_instruction: self.system_instruction.clone(),
            messages,
            generation_config: *generation_config,
            safety_settings: *safety_settings,
        };

        let response = self
            .model_client
            .send_request(request)
            .await
            .map_err(|err| Error::from_model(err.as_ref()))?;

        Ok(ReplyStream {
            conversation: &mut self.conversation,
            user_msg: Some(user_msg),
            response,
            text: String::new(),
            done: false,
        })
    }
}

/// The reply to one [`ChatSession::send`].
pub struct ReplyStream<'a> {
    conversation: &'a mut RemoteConversation,
    user_msg: Option<ModelMessage>,
    response: ModelClientResponse,
    text: String,
    done: bool,
}

impl ReplyStream<'_> {
    /// Text received so far.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    fn commit(&mut self) {
        let Some(user_msg) = self.user_msg.take() else {
            return;
        };
        let assistant_msg = match self.response.opaque_message() {
            Some(opaque_msg) => ModelMessage::Opaque(opaque_msg),
            // Downgrade to a text-only message.
            None => ModelMessage::Assistant(self.text.clone()),
        };
        self.conversation.history.push(user_msg);
        self.conversation.history.push(assistant_msg);
    }
}

#[async_trait]
impl Fragments for ReplyStream<'_> {
    async fn next_fragment(&mut self) -> Option<Result<String, Error>> {
        while !self.done {
            match self.response.next_event().await {
                Ok(Some(ModelResponseEvent::MessageDelta(delta))) => {
                    if delta.is_empty() {
                        continue;
                    }
                    self.text.push_str(&delta);
                    return Some(Ok(delta));
                }
                Ok(Some(ModelResponseEvent::Completed(reason))) => {
                    if reason == ModelFinishReason::MaxTokens {
                        warn!("reply was cut at the token limit");
                    }
                }
                Ok(None) => {
                    self.done = true;
                    self.commit();
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(Error::from_model(err.as_ref())));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use vts_chat_test_model::{PresetResponse, TestModelProvider};

    use super::*;
    use crate::error::ErrorKind;

    async fn drain(stream: &mut ReplyStream<'_>) -> Result<String, Error> {
        let mut text = String::new();
        while let Some(fragment) = stream.next_fragment().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }

    #[tokio::test]
    async fn test_exchange_is_recorded() {
        let mut provider = TestModelProvider::single_turn(
            PresetResponse::with_fragments(["Ha", "noi"]),
        );
        provider.add_user_input_step();
        provider
            .add_assistant_response_step(PresetResponse::with_fragments(["2"]));
        let mut session = ChatSession::new(
            ModelClient::new(provider.clone()),
            Some("Be helpful.".to_owned()),
        );
        let config = GenerationConfig::default();
        let safety = SafetySettings::default();

        let mut stream = session
            .send(UserContent::text("Capital of Vietnam?"), &config, &safety)
            .await
            .unwrap();
        assert_eq!(drain(&mut stream).await.unwrap(), "Hanoi");
        assert_eq!(stream.text(), "Hanoi");
        assert_eq!(session.conversation().history().len(), 2);

        let mut stream = session
            .send(UserContent::text("1 + 1?"), &config, &safety)
            .await
            .unwrap();
        assert_eq!(drain(&mut stream).await.unwrap(), "2");

        let requests = provider.requests();
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(
            requests[1].system_instruction.as_deref(),
            Some("Be helpful.")
        );
    }

    #[tokio::test]
    async fn test_blocked_reply_is_not_recorded() {
        let provider =
            TestModelProvider::single_turn(PresetResponse::blocked());
        let mut session = ChatSession::new(ModelClient::new(provider), None);

        let mut stream = session
            .send(
                UserContent::text("something dangerous"),
                &Default::default(),
                &Default::default(),
            )
            .await
            .unwrap();
        let err = drain(&mut stream).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Blocked);
        assert!(stream.next_fragment().await.is_none());
        assert!(session.conversation().history().is_empty());
    }

    #[tokio::test]
    async fn test_reset_starts_new_conversation() {
        let mut provider = TestModelProvider::single_turn(
            PresetResponse::with_fragments(["first"]),
        );
        // After a reset the history is empty again, so the second send
        // hits the same script step as the first.
        provider.add_user_input_step();
        provider.add_assistant_response_step(PresetResponse::blocked());
        let mut session =
            ChatSession::new(ModelClient::new(provider.clone()), None);
        let config = GenerationConfig::default();
        let safety = SafetySettings::default();

        let mut stream = session
            .send(UserContent::text("one"), &config, &safety)
            .await
            .unwrap();
        drain(&mut stream).await.unwrap();
        let old_id = session.conversation().id();

        session.reset();
        assert_ne!(session.conversation().id(), old_id);
        assert!(session.conversation().history().is_empty());

        let mut stream = session
            .send(UserContent::text("two"), &config, &safety)
            .await
            .unwrap();
        assert_eq!(drain(&mut stream).await.unwrap(), "first");
        let requests = provider.requests();
        assert_eq!(
            requests[1].messages,
            vec![ModelMessage::User(UserContent::text("two"))]
        );
    }
}
