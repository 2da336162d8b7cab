use vts_chat_model::{GenerationConfig, SafetySettings};

use crate::chat::ChatSession;
use crate::conversation::Transcript;
use crate::language::{DEFAULT_LANGUAGE, Language};
use crate::model_client::ModelClient;

/// Everything the user can tweak between two sends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionParameters {
    /// Sampling controls.
    pub generation_config: GenerationConfig,
    /// Block thresholds per harm category.
    pub safety_settings: SafetySettings,
    /// Language the reply is shown, saved and spoken in.
    pub language: Language,
}

impl Default for SessionParameters {
    fn default() -> Self {
        Self {
            generation_config: Default::default(),
            safety_settings: Default::default(),
            language: DEFAULT_LANGUAGE,
        }
    }
}

/// The state of one interactive session.
pub struct SessionState {
    pub(crate) transcript: Transcript,
    pub(crate) chat: ChatSession,
    pub(crate) params: SessionParameters,
}

impl SessionState {
    /// Starts a session with a greeting-only transcript and a fresh
    /// remote conversation.
    pub fn new(
        model_client: ModelClient,
        system_instruction: Option<String>,
    ) -> Self {
        Self {
            transcript: Transcript::default(),
            chat: ChatSession::new(model_client, system_instruction),
            params: SessionParameters::default(),
        }
    }

    /// Drops the transcript and the remote conversation. Parameters are
    /// kept.
    pub fn reset(&mut self) {
        self.transcript.reset();
        self.chat.reset();
    }

    /// The visible transcript.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The chat session.
    #[inline]
    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    /// The current parameters.
    #[inline]
    pub fn params(&self) -> &SessionParameters {
        &self.params
    }
}
